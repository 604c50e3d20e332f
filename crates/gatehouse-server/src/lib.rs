//! # gatehouse-server
//!
//! HTTP surface for the gateway. Authentication happens upstream; the
//! verified caller arrives in the `x-user-id` header.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use extract::{USER_ID_HEADER, UserId};
pub use routes::create_router;
pub use state::AppState;
