use crate::transport::TransportError;
use async_trait::async_trait;
use std::env;
use std::time::Duration;
use url::Url;

/// Outcome of checking whether an image URL can be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCheck {
    Loadable,
    /// The server answered, but not with a displayable image.
    NotLoadable(String),
    /// The request itself failed (connection, DNS, timeout). Worth retrying.
    Unreachable(String),
}

impl ImageCheck {
    pub fn is_loadable(&self) -> bool {
        matches!(self, ImageCheck::Loadable)
    }
}

/// Checks that an image URL resolves to something the UI can display.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> ImageCheck;
}

/// Probe backed by a plain reqwest GET.
pub struct HttpImageProbe {
    client: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new() -> Result<Self, TransportError> {
        let timeout_secs = env::var("FRONTEND_TOOLS_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn probe(&self, url: &Url) -> ImageCheck {
        let response = match self.client.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "image fetch failed");
                return ImageCheck::Unreachable(format!("request failed: {}", e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return ImageCheck::NotLoadable(format!("HTTP {}", status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        match content_type {
            Some(ct) if !ct.starts_with("image/") => {
                ImageCheck::NotLoadable(format!("unexpected content type '{}'", ct))
            }
            _ => ImageCheck::Loadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_accepts_image_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/widget.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89, b'P', b'N', b'G'])
            .create_async()
            .await;

        let probe = HttpImageProbe::new().unwrap();
        let url = Url::parse(&format!("{}/widget.png", server.url())).unwrap();
        assert_eq!(probe.probe(&url).await, ImageCheck::Loadable);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_probe_rejects_missing_image() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.png")
            .with_status(404)
            .create_async()
            .await;

        let probe = HttpImageProbe::new().unwrap();
        let url = Url::parse(&format!("{}/missing.png", server.url())).unwrap();
        assert_eq!(
            probe.probe(&url).await,
            ImageCheck::NotLoadable("HTTP 404".to_string())
        );
    }

    #[tokio::test]
    async fn test_image_host_unreachable() {
        // Bind then drop to get a local port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let probe = HttpImageProbe::new().unwrap();
        let url = Url::parse(&format!("http://127.0.0.1:{}/widget.png", port)).unwrap();
        assert!(matches!(probe.probe(&url).await, ImageCheck::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_probe_rejects_html_page() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/product")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html></html>")
            .create_async()
            .await;

        let probe = HttpImageProbe::new().unwrap();
        let url = Url::parse(&format!("{}/product", server.url())).unwrap();
        assert!(!probe.probe(&url).await.is_loadable());
    }
}
