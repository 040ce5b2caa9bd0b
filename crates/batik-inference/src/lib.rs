//! # batik-inference
//!
//! Classification pipeline pieces for batik-scan.
//!
//! This crate provides:
//! - Image normalization into the classifier's input tensor
//! - A lazily loaded, single-flight classifier gateway
//! - A TensorFlow Serving REST classifier
//! - The confidence gate deciding whether a prediction is kept
//! - A deterministic mock classifier for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use batik_inference::{normalize, ClassifierGateway, ConfidenceGate, TfServingConfig, TfServingLoader};
//!
//! # async fn run(bytes: Vec<u8>) -> batik_core::Result<()> {
//! let gateway = ClassifierGateway::new(Arc::new(TfServingLoader::new(TfServingConfig::default())), 10);
//! let tensor = normalize(bytes).await?;
//! let scores = gateway.score(&tensor).await?;
//! let decision = ConfidenceGate::default().decide(&scores)?;
//! # Ok(())
//! # }
//! ```

pub mod gate;
pub mod gateway;
pub mod mock;
pub mod normalize;
pub mod tf_serving;

pub use gate::{ConfidenceGate, GateDecision};
pub use gateway::ClassifierGateway;
pub use mock::{MockClassifier, MockLoader};
pub use normalize::{normalize, normalize_image};
pub use tf_serving::{TfServingClassifier, TfServingConfig, TfServingLoader};
