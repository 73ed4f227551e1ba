use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request; the seam between downloads and the transport.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
