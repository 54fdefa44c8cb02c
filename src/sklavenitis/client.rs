//! HTTP transport for direct page fetches using wreq for TLS fingerprint emulation.

use crate::config::Config;
use crate::error::ScrapeError;
use crate::identity::Identity;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};
use wreq::Client;

/// Direct HTTP fetcher dressed per request in a generated browser identity.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Creates a fetcher from the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self { client })
    }

    /// Performs a GET request wearing the given identity's fingerprint,
    /// headers, and session cookies.
    pub async fn fetch(&self, url: &str, identity: &Identity) -> Result<String, ScrapeError> {
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .emulation(identity.emulation())
            .header("User-Agent", &identity.user_agent)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", "el-GR,el;q=0.9,en;q=0.8")
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cookie", &identity.cookies)
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1");

        for (header, value) in &identity.headers {
            request = request.header(header, value);
        }

        let response = request.send().await?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            if status == 503 {
                warn!("Rate limited (503). Consider using a proxy or a longer pacing interval.");
            }
            return Err(ScrapeError::Status { status: status.as_u16(), url: url.to_string() });
        }

        response.text().await.map_err(ScrapeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityPool;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_test_config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;

        let html = r#"
            <html><body>
                <h1 class="product-title">Γάλα Φρέσκο 1L</h1>
                <span class="price" data-price="1,58">1,58 €</span>
            </body></html>
        "#;

        Mock::given(method("GET"))
            .and(path("/p/galaktomika/gala-fresko"))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let identity = IdentityPool::seeded(7).generate();

        let url = format!("{}/p/galaktomika/gala-fresko", mock_server.uri());
        let body = fetcher.fetch(&url, &identity).await.unwrap();

        assert!(body.contains("Γάλα Φρέσκο 1L"));
        assert!(body.contains("1,58"));
    }

    #[tokio::test]
    async fn test_identity_headers_are_sent() {
        let mock_server = MockServer::start().await;
        let identity = IdentityPool::seeded(7).generate();

        Mock::given(method("GET"))
            .and(path("/p/test"))
            .and(header("User-Agent", identity.user_agent.as_str()))
            .and(header("Accept-Language", "el-GR,el;q=0.9,en;q=0.8"))
            .and(header_exists("Sec-Ch-Ua"))
            .and(header_exists("Sec-Ch-Ua-Platform"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let url = format!("{}/p/test", mock_server.uri());

        fetcher.fetch(&url, &identity).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_cookies_are_sent() {
        let mock_server = MockServer::start().await;
        let identity = IdentityPool::seeded(7).generate();
        assert!(identity.cookies.contains("sklv_store=046"));

        Mock::given(method("GET"))
            .and(path("/p/test"))
            .and(header("Cookie", identity.cookies.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let url = format!("{}/p/test", mock_server.uri());

        fetcher.fetch(&url, &identity).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_becomes_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/p/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let identity = IdentityPool::seeded(7).generate();
        let url = format!("{}/p/missing", mock_server.uri());

        let err = fetcher.fetch(&url, &identity).await.unwrap_err();
        match err {
            ScrapeError::Status { status, url: reported } => {
                assert_eq!(status, 404);
                assert_eq!(reported, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_503_is_transient() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/p/test"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let identity = IdentityPool::seeded(7).generate();
        let url = format!("{}/p/test", mock_server.uri());

        let err = fetcher.fetch(&url, &identity).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_empty_response_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/p/test"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new(&make_test_config()).unwrap();
        let identity = IdentityPool::seeded(7).generate();
        let url = format!("{}/p/test", mock_server.uri());

        let body = fetcher.fetch(&url, &identity).await.unwrap();
        assert!(body.is_empty());
    }
}
