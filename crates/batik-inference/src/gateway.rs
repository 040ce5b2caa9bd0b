//! Lazily loaded, shared classifier handle.
//!
//! The first caller starts the load; concurrent callers await the same
//! in-flight attempt. A failed attempt is reported to every waiter and the
//! slot is cleared so the next request tries again.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, info, warn};

use batik_core::{defaults, Classifier, ClassifierLoader, Error, ImageTensor, Result};

type LoadResult = std::result::Result<Arc<dyn Classifier>, String>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Empty,
    Loading(LoadFuture),
    Ready(Arc<dyn Classifier>),
}

/// Single scoring handle shared by all requests.
pub struct ClassifierGateway {
    loader: Arc<dyn ClassifierLoader>,
    slot: Mutex<Slot>,
    expected_classes: usize,
    load_timeout: Duration,
}

impl ClassifierGateway {
    /// Gateway whose classifier must emit `expected_classes` scores.
    pub fn new(loader: Arc<dyn ClassifierLoader>, expected_classes: usize) -> Self {
        Self {
            loader,
            slot: Mutex::new(Slot::Empty),
            expected_classes,
            load_timeout: Duration::from_secs(defaults::MODEL_LOAD_TIMEOUT_SECS),
        }
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn expected_classes(&self) -> usize {
        self.expected_classes
    }

    /// True once a load has succeeded.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), Slot::Ready(_))
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The loaded classifier, loading it if needed.
    pub async fn handle(&self) -> Result<Arc<dyn Classifier>> {
        let pending = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready(classifier) => return Ok(Arc::clone(classifier)),
                Slot::Loading(pending) => pending.clone(),
                Slot::Empty => {
                    let pending = self.start_load();
                    *slot = Slot::Loading(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;

        let mut slot = self.lock();
        let current = matches!(&*slot, Slot::Loading(active) if active.ptr_eq(&pending));
        match outcome {
            Ok(classifier) => {
                if current {
                    *slot = Slot::Ready(Arc::clone(&classifier));
                }
                Ok(classifier)
            }
            Err(message) => {
                if current {
                    *slot = Slot::Empty;
                }
                Err(Error::ServiceUnavailable(message))
            }
        }
    }

    fn start_load(&self) -> LoadFuture {
        let loader = Arc::clone(&self.loader);
        let timeout = self.load_timeout;

        async move {
            let start = Instant::now();
            info!(subsystem = "inference", component = "gateway", op = "load", "Loading classifier");

            let outcome = match tokio::time::timeout(timeout, loader.load()).await {
                Ok(Ok(classifier)) => Ok(classifier),
                Ok(Err(e)) => Err(format!("Model is not available: {}", e)),
                Err(_) => Err(format!(
                    "Model is not available: load timed out after {}s",
                    timeout.as_secs()
                )),
            };

            let duration_ms = start.elapsed().as_millis() as u64;
            match &outcome {
                Ok(classifier) => info!(
                    subsystem = "inference",
                    component = "gateway",
                    op = "load",
                    model = classifier.model_name(),
                    duration_ms,
                    "Classifier loaded"
                ),
                Err(error) => warn!(
                    subsystem = "inference",
                    component = "gateway",
                    op = "load",
                    duration_ms,
                    error = %error,
                    "Classifier load failed"
                ),
            }
            outcome
        }
        .boxed()
        .shared()
    }

    /// Score `tensor`, checking the vector length against the class mapping.
    pub async fn score(&self, tensor: &ImageTensor) -> Result<Vec<f32>> {
        let classifier = self.handle().await?;
        let start = Instant::now();
        let scores = classifier.score(tensor).await?;

        if scores.len() != self.expected_classes {
            return Err(Error::Inference(format!(
                "classifier returned {} scores, expected {}",
                scores.len(),
                self.expected_classes
            )));
        }

        debug!(
            subsystem = "inference",
            component = "gateway",
            op = "score",
            model = classifier.model_name(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Image scored"
        );
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClassifier, MockLoader};

    fn tensor() -> ImageTensor {
        ImageTensor {
            width: 1,
            height: 1,
            channels: 3,
            data: vec![0.0; 3],
        }
    }

    #[tokio::test]
    async fn test_loads_once_and_reuses() {
        let loader = MockLoader::new(MockClassifier::new(vec![0.1, 0.9]));
        let gateway = ClassifierGateway::new(Arc::new(loader.clone()), 2);

        assert!(!gateway.is_loaded());
        gateway.score(&tensor()).await.unwrap();
        gateway.score(&tensor()).await.unwrap();

        assert!(gateway.is_loaded());
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test]
    async fn test_length_mismatch_is_inference_error() {
        let loader = MockLoader::new(MockClassifier::new(vec![0.1, 0.9]));
        let gateway = ClassifierGateway::new(Arc::new(loader), 3);

        let err = gateway.score(&tensor()).await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[tokio::test]
    async fn test_failed_load_is_unavailable_then_retried() {
        let loader = MockLoader::new(MockClassifier::new(vec![1.0])).fail_next_loads(1);
        let gateway = ClassifierGateway::new(Arc::new(loader.clone()), 1);

        let err = gateway.score(&tensor()).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
        assert!(!gateway.is_loaded());

        gateway.score(&tensor()).await.unwrap();
        assert_eq!(loader.load_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_is_unavailable() {
        let loader = MockLoader::new(MockClassifier::new(vec![1.0]))
            .with_load_delay(Duration::from_secs(60));
        let gateway = ClassifierGateway::new(Arc::new(loader), 1)
            .with_load_timeout(Duration::from_secs(1));

        let err = gateway.handle().await.err().unwrap();
        assert!(err.to_string().contains("timed out"));
    }
}
