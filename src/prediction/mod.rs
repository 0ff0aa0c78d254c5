//! Failure prediction subsystem.
//!
//! # Data Flow
//! ```text
//! Request outcome (route manager)
//!     → engine.rs record_metric
//!     → window.rs (append, evict oldest beyond 1000)
//!     → model.rs (one SGD pass over the last N minutes, if ≥ 10 points)
//!
//! Scheduler tick
//!     → engine.rs predict_failure
//!     → PredictionResult (risk in [0,1], action required above threshold)
//! ```
//!
//! # Design Decisions
//! - Ingestion and training are coupled; there is no offline phase
//! - State is in-memory only and lost on restart

pub mod engine;
pub mod model;
pub mod window;

pub use engine::FailurePredictionEngine;
pub use model::{PredictionModel, PredictionResult};
pub use window::{MetricPoint, ServiceMetrics};
