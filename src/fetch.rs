use std::time::Duration;

use anyhow::{Context, Result};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Fetch the raw source document. Any transport or HTTP failure is fatal
/// to the run; there is nothing to parse without the document.
pub async fn fetch_document(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .context("building HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching {url}"))?
        .error_for_status()
        .with_context(|| format!("fetching {url}"))?;

    response.text().await.context("reading response body")
}
