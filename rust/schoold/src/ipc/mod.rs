mod error;
mod events;
mod handlers;
mod router;
mod types;

pub use error::bad_json;
pub use events::apply_completion;
pub use router::handle_request;
pub use types::{AppState, Request};
