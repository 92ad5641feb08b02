pub mod eligibility;
pub mod enqueuer;
pub mod types;

pub use eligibility::{is_eligible_application, resolve_event_type};
pub use enqueuer::{EnqueueError, RewardEventEnqueuer};
pub use types::*;
