pub mod api;
pub mod event;
pub mod intent;
pub mod session;
pub mod slot;
pub mod user;

pub use api::{ConfirmRequest, ConfirmResponse, ProposeRequest, ProposeResponse};
pub use event::{CalendarEvent, CreatedEvent, OAuthCredentials};
pub use intent::ExtractedIntent;
pub use session::{ChatMessage, ConfirmationState, Phase, Role};
pub use slot::{ProposalResult, Slot};
pub use user::{Meeting, User};
