//! Namespace clients
//!
//! Each namespace maps onto one group of REST endpoints. They borrow the
//! [`Client`](crate::Client) and hold no state of their own.

pub mod account;
pub mod collections;
pub mod hardware;
pub mod models;
pub mod predictions;
pub mod trainings;

// Re-export key types for convenience
pub use account::AccountClient;
pub use collections::CollectionsClient;
pub use hardware::HardwareClient;
pub use models::{CreateModel, ModelPredictionsClient, ModelVersionsClient, ModelsClient};
pub use predictions::{CreatePrediction, PredictionOptions, PredictionsClient};
pub use trainings::{CreateTraining, TrainingsClient};

use crate::errors::{Result, VaikerError};

/// Validate a single URL path segment supplied by the caller
pub(crate) fn path_segment<'s>(kind: &str, value: &'s str) -> Result<&'s str> {
    if value.is_empty() || value.contains('/') || value.contains('?') || value.contains('#') {
        return Err(VaikerError::Validation(format!("invalid {} '{}'", kind, value)));
    }
    Ok(value)
}
