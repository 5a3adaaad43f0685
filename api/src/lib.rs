pub mod auth;
pub mod contracts;
pub mod error;
pub mod payments;
pub mod router;
pub mod sheets;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
