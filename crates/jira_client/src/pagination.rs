use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::client::JiraClient;

/// A single search expression plus the field selection and page size it is
/// executed with. Strategies never rewrite the query between pages.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub jql: String,
    pub fields: Vec<&'static str>,
    pub page_size: u32,
}

/// Position inside a paged result set. The two variants belong to the two
/// pagination protocols the API family exposes and are never mixed within one
/// call sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Offset { start_at: u32 },
    Cursor { token: Option<String> },
}

/// Polymorphic pagination capability: one call yields a batch of raw issues
/// and either the state for the next page or `None` when exhausted.
#[async_trait]
pub trait Pager: Send + Sync {
    fn initial_state(&self) -> PageState;

    async fn next_page(
        &self,
        client: &dyn JiraClient,
        query: &SearchQuery,
        state: PageState,
    ) -> Result<(Vec<Value>, Option<PageState>)>;
}

/// Offset/total protocol: each response declares its offset, page size and the
/// total match count; the walk ends once `offset + page_size >= total`.
pub struct OffsetPager;

#[async_trait]
impl Pager for OffsetPager {
    fn initial_state(&self) -> PageState {
        PageState::Offset { start_at: 0 }
    }

    async fn next_page(
        &self,
        client: &dyn JiraClient,
        query: &SearchQuery,
        state: PageState,
    ) -> Result<(Vec<Value>, Option<PageState>)> {
        let PageState::Offset { start_at } = state else {
            bail!("offset pager driven with cursor state");
        };
        let page = client
            .search_offset(&query.jql, &query.fields, start_at, query.page_size)
            .await?;
        debug!(
            start_at = page.start_at,
            page_size = page.max_results,
            total = page.total,
            "fetched offset page"
        );
        let next = if page.start_at + page.max_results >= page.total {
            None
        } else if page.max_results == 0 {
            // A zero page size with results outstanding would request the
            // same offset forever.
            bail!(
                "offset page at {} declared a zero page size with {} results outstanding",
                page.start_at,
                page.total
            );
        } else {
            Some(PageState::Offset {
                start_at: page.start_at + page.max_results,
            })
        };
        Ok((page.issues, next))
    }
}

/// Continuation-token protocol: follow `nextPageToken` until the response
/// stops handing one back.
pub struct CursorPager;

#[async_trait]
impl Pager for CursorPager {
    fn initial_state(&self) -> PageState {
        PageState::Cursor { token: None }
    }

    async fn next_page(
        &self,
        client: &dyn JiraClient,
        query: &SearchQuery,
        state: PageState,
    ) -> Result<(Vec<Value>, Option<PageState>)> {
        let PageState::Cursor { token } = state else {
            bail!("cursor pager driven with offset state");
        };
        let page = client
            .search_cursor(&query.jql, &query.fields, token.as_deref(), query.page_size)
            .await?;
        let next = page
            .next_page_token
            .map(|token| PageState::Cursor { token: Some(token) });
        Ok((page.issues, next))
    }
}

/// Drives a pager to exhaustion, strictly sequentially. Any page failure
/// aborts the whole walk; accumulated pages are discarded with it.
pub async fn fetch_all(
    pager: &dyn Pager,
    client: &dyn JiraClient,
    query: &SearchQuery,
) -> Result<Vec<Value>> {
    let mut issues = Vec::new();
    let mut state = Some(pager.initial_state());
    while let Some(current) = state.take() {
        let (batch, next) = pager.next_page(client, query, current).await?;
        issues.extend(batch);
        state = next;
    }
    Ok(issues)
}
