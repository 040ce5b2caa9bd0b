//! Deterministic classifier for tests and offline development.
//!
//! ```rust
//! use std::sync::Arc;
//! use batik_inference::{ClassifierGateway, MockClassifier, MockLoader};
//!
//! let loader = MockLoader::new(MockClassifier::new(vec![0.05, 0.92, 0.03]));
//! let gateway = ClassifierGateway::new(Arc::new(loader), 3);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use batik_core::{Classifier, ClassifierLoader, Error, ImageTensor, Result};

/// Returns the same score vector for every image.
#[derive(Clone)]
pub struct MockClassifier {
    scores: Arc<Mutex<Vec<f32>>>,
    calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    fail: bool,
}

impl MockClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores: Arc::new(Mutex::new(scores)),
            calls: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
            fail: false,
        }
    }

    /// Peaked distribution over `classes` with `probability` at `ordinate`.
    pub fn peaked(classes: usize, ordinate: usize, probability: f32) -> Self {
        let rest = if classes > 1 {
            (1.0 - probability) / (classes - 1) as f32
        } else {
            0.0
        };
        let scores = (0..classes)
            .map(|i| if i == ordinate { probability } else { rest })
            .collect();
        Self::new(scores)
    }

    /// Every score call fails with an inference error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Replace the scores returned from now on.
    pub fn set_scores(&self, scores: Vec<f32>) {
        *self.scores.lock().unwrap_or_else(|e| e.into_inner()) = scores;
    }

    /// Simulate a model server outage after loading.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn score(&self, _tensor: &ImageTensor) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::ServiceUnavailable(
                "mock model server down".to_string(),
            ));
        }
        if self.fail {
            return Err(Error::Inference("mock classifier failure".to_string()));
        }
        Ok(self.scores.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Hands out a [`MockClassifier`], counting loads.
#[derive(Clone)]
pub struct MockLoader {
    classifier: MockClassifier,
    loads: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
    delay: Duration,
}

impl MockLoader {
    pub fn new(classifier: MockClassifier) -> Self {
        Self {
            classifier,
            loads: Arc::new(AtomicUsize::new(0)),
            failures_left: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long inside every load.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the next `n` loads.
    pub fn fail_next_loads(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Number of load attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn classifier(&self) -> &MockClassifier {
        &self.classifier
    }
}

#[async_trait]
impl ClassifierLoader for MockLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::Request("mock model server unreachable".to_string()));
        }
        Ok(Arc::new(self.classifier.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peaked_distribution() {
        let mock = MockClassifier::peaked(4, 2, 0.7);
        let scores = mock.scores.lock().unwrap().clone();
        assert_eq!(scores.len(), 4);
        assert_eq!(scores[2], 0.7);
        assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_loader_fails_then_succeeds() {
        let loader = MockLoader::new(MockClassifier::new(vec![1.0])).fail_next_loads(1);
        assert!(loader.load().await.is_err());
        assert!(loader.load().await.is_ok());
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test]
    async fn test_failing_classifier() {
        let mock = MockClassifier::new(vec![1.0]).failing();
        let tensor = ImageTensor {
            width: 0,
            height: 0,
            channels: 3,
            data: Vec::new(),
        };
        assert!(mock.score(&tensor).await.is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_toggle() {
        let mock = MockClassifier::new(vec![1.0]);
        let tensor = ImageTensor {
            width: 0,
            height: 0,
            channels: 3,
            data: Vec::new(),
        };

        mock.set_unavailable(true);
        assert!(matches!(
            mock.score(&tensor).await,
            Err(Error::ServiceUnavailable(_))
        ));

        mock.set_unavailable(false);
        assert!(mock.score(&tensor).await.is_ok());
    }
}
