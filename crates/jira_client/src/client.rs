use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::backoff::RetryPolicy;
use crate::error::JiraApiError;

/// One page of the offset/total pagination variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffsetPage {
    #[serde(default)]
    pub issues: Vec<Value>,
    pub start_at: u32,
    pub max_results: u32,
    pub total: u32,
}

/// One page of the continuation-token pagination variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage {
    #[serde(default)]
    pub issues: Vec<Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait JiraClient: Send + Sync {
    async fn search_offset(
        &self,
        jql: &str,
        fields: &[&str],
        start_at: u32,
        max_results: u32,
    ) -> Result<OffsetPage>;

    async fn search_cursor(
        &self,
        jql: &str,
        fields: &[&str],
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<CursorPage>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OffsetSearchBody<'a> {
    jql: &'a str,
    fields: &'a [&'a str],
    start_at: u32,
    max_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CursorSearchBody<'a> {
    jql: &'a str,
    fields: &'a [&'a str],
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_token: Option<&'a str>,
}

pub struct HttpJiraClient {
    http: reqwest::Client,
    base: Url,
    email: String,
    api_token: String,
    retry: RetryPolicy,
}

impl HttpJiraClient {
    pub fn new(
        base_url: &str,
        email: impl Into<String>,
        api_token: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            http,
            base: Url::parse(base_url)?,
            email: email.into(),
            api_token: api_token.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.base.join(path)?;
        let endpoint = url.path().to_string();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(endpoint = %endpoint, attempt, "dispatching search request");
            let response = self
                .http
                .post(url.clone())
                .basic_auth(&self.email, Some(&self.api_token))
                .header(http::header::ACCEPT, "application/json")
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                return Ok(response.json().await?);
            }

            let body_text = response.text().await.unwrap_or_default();
            let err = JiraApiError::new(status, endpoint.clone(), body_text);
            match self.retry.next_delay(attempt, &err) {
                Some(delay) => {
                    warn!(
                        endpoint = %endpoint,
                        status = %status,
                        attempt,
                        wait_ms = delay.as_millis(),
                        "transient search failure; retrying"
                    );
                    sleep(delay).await;
                }
                None => return Err(err.into()),
            }
        }
    }
}

#[async_trait]
impl JiraClient for HttpJiraClient {
    async fn search_offset(
        &self,
        jql: &str,
        fields: &[&str],
        start_at: u32,
        max_results: u32,
    ) -> Result<OffsetPage> {
        let body = OffsetSearchBody {
            jql,
            fields,
            start_at,
            max_results,
        };
        let value = self.post_json("rest/api/3/search", &body).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn search_cursor(
        &self,
        jql: &str,
        fields: &[&str],
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<CursorPage> {
        let body = CursorSearchBody {
            jql,
            fields,
            max_results,
            next_page_token: page_token,
        };
        let value = self.post_json("rest/api/3/search/jql", &body).await?;
        Ok(serde_json::from_value(value)?)
    }
}
