mod error;
mod handlers;
mod router;
mod types;

pub use error::ApiError;
pub use router::create_router;
pub use types::AppState;
