use anyhow::{bail, Result};
use serde_json::json;
use tracing::info;

pub async fn post_message(http: &reqwest::Client, webhook_url: &str, text: &str) -> Result<()> {
    let response = http
        .post(webhook_url)
        .json(&json!({ "text": text }))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("webhook rejected report: {status}: {body}");
    }
    info!("weekly report delivered");
    Ok(())
}
