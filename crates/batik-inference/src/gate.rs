//! Confidence gate over classifier scores.

use batik_core::{defaults, Error, Result};

/// Outcome of gating one score vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Top class is confident enough to act on.
    Accept {
        ordinate: usize,
        probability: f32,
        /// `probability` as an integer percentage.
        confidence: u8,
    },
    /// Top class fell below the threshold.
    Reject { confidence: u8, threshold: u8 },
}

impl GateDecision {
    pub fn confidence(&self) -> u8 {
        match self {
            GateDecision::Accept { confidence, .. } | GateDecision::Reject { confidence, .. } => {
                *confidence
            }
        }
    }
}

/// Accepts a prediction only when its top probability reaches the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            threshold: defaults::CONFIDENCE_THRESHOLD,
        }
    }
}

impl ConfidenceGate {
    /// Gate with `threshold` in `[0, 1]`.
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::Config(format!(
                "confidence threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Pick the top class and compare it to the threshold.
    ///
    /// Ties go to the lowest ordinate; NaN scores never win.
    pub fn decide(&self, scores: &[f32]) -> Result<GateDecision> {
        let (ordinate, probability) = argmax(scores)
            .ok_or_else(|| Error::Inference("classifier returned no usable scores".to_string()))?;

        let confidence = to_percent(probability);
        if probability >= self.threshold {
            Ok(GateDecision::Accept {
                ordinate,
                probability,
                confidence,
            })
        } else {
            Ok(GateDecision::Reject {
                confidence,
                threshold: to_percent(self.threshold),
            })
        }
    }
}

/// Index and value of the largest non-NaN score, earliest on ties.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, top)) if v <= top => best,
            _ => Some((i, v)),
        })
}

/// Probability to an integer percentage, rounded and clamped to `[0, 100]`.
pub fn to_percent(probability: f32) -> u8 {
    if probability.is_nan() {
        return 0;
    }
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_at_threshold() {
        let gate = ConfidenceGate::new(0.7).unwrap();
        let decision = gate.decide(&[0.1, 0.7, 0.2]).unwrap();
        assert!(matches!(
            decision,
            GateDecision::Accept {
                ordinate: 1,
                confidence: 70,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_below_threshold() {
        let gate = ConfidenceGate::default();
        let decision = gate.decide(&[0.65, 0.35]).unwrap();
        assert_eq!(
            decision,
            GateDecision::Reject {
                confidence: 65,
                threshold: 70
            }
        );
    }

    #[test]
    fn test_tie_goes_to_lowest_ordinate() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some((1, 0.4)));
    }

    #[test]
    fn test_nan_never_wins() {
        assert_eq!(argmax(&[f32::NAN, 0.3, 0.1]), Some((1, 0.3)));
        assert_eq!(argmax(&[f32::NAN]), None);
    }

    #[test]
    fn test_empty_scores_is_inference_error() {
        let err = ConfidenceGate::default().decide(&[]).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_threshold_out_of_range() {
        assert!(matches!(ConfidenceGate::new(1.5), Err(Error::Config(_))));
        assert!(matches!(ConfidenceGate::new(-0.1), Err(Error::Config(_))));
        assert!(ConfidenceGate::new(0.0).is_ok());
    }

    #[test]
    fn test_to_percent() {
        assert_eq!(to_percent(0.956), 96);
        assert_eq!(to_percent(1.2), 100);
        assert_eq!(to_percent(-0.5), 0);
        assert_eq!(to_percent(f32::NAN), 0);
    }

    #[test]
    fn test_decision_confidence() {
        let accept = ConfidenceGate::default().decide(&[0.95]).unwrap();
        assert_eq!(accept.confidence(), 95);
    }
}
