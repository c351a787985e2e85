//! Resource records parsed from API responses

pub mod model;
pub mod page;
pub mod prediction;

// Re-export commonly used types
pub use model::{Account, AccountType, Collection, Hardware, Model, Version, Visibility};
pub use page::Page;
pub use prediction::{Job, JobUrls, Outcome, Prediction, PredictionStatus, Training, WebhookEvent};
