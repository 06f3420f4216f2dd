pub mod error;
pub mod launcher;
pub mod routes;

pub use crate::error::{ApiError, ApiResult};
pub use crate::launcher::{LaunchError, PgRunLauncher, RunLauncher};
pub use crate::routes::{build_router, ApiState};
