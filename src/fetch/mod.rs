mod basic;
mod client;
pub mod auth;
pub mod positions;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("API returned status {}: {}", status, body);
    }
    Ok(resp.bytes().await?.to_vec())
}
