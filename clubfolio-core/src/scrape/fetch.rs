use std::time::Duration;

use super::ScrapeError;
use crate::config::SourceConfig;

/// Download the holdings page.
pub fn fetch_page(source: &SourceConfig) -> Result<String, ScrapeError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(source.timeout_secs))
        .user_agent(source.user_agent.as_str())
        .build()?;

    log::info!("fetching {}", source.url);
    let response = client.get(&source.url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Http {
            url: source.url.clone(),
            status: status.as_u16(),
        });
    }
    let body = response.text()?;
    log::debug!("received {} bytes", body.len());
    Ok(body)
}
