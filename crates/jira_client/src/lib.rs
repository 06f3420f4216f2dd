pub mod backoff;
pub mod client;
pub mod error;
pub mod pagination;

pub use crate::client::{CursorPage, HttpJiraClient, JiraClient, OffsetPage};
pub use crate::error::JiraApiError;
pub use crate::pagination::{fetch_all, CursorPager, OffsetPager, PageState, Pager, SearchQuery};
