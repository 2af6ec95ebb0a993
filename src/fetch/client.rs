use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam between the collector and the network, so request decorators such as
/// [`UrlParam`](super::auth::UrlParam) can be stacked on any transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
