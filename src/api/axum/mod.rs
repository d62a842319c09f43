mod error;
mod handlers;
mod middleware;
mod routes;
mod session_layer;

pub use error::{AppError, VERIFICATION_NOTICE_PATH};
pub use routes::{AppState, auth_routes, private_routes, public_routes, router};
pub use session_layer::session_layer;
