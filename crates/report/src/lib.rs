pub mod aggregate;
pub mod render;
pub mod webhook;

pub use crate::aggregate::{aggregate, sla_breached, TeamSummary, WeeklyReport};
pub use crate::render::render_message;
pub use crate::webhook::post_message;
