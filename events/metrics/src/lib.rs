pub mod idempotency;
pub mod publisher;
pub mod types;

pub use idempotency::{derive_key, metrics_job_key, IdempotencyKey};
pub use publisher::MetricsEventPublisher;
pub use types::*;
