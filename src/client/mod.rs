pub mod backend;
pub mod coordinator;

pub use backend::{HttpBackend, RetryPolicy, SchedulerBackend};
pub use coordinator::{Coordinator, Effect, Event, ProposalOrigin};
