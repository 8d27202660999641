use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{check_state_index, state_name_from_options, FetchResult, ReportSource};
use crate::config::{render_url, JobConfig};
use crate::error::FetchError;

/// Fetches report pages with a single POST per (year, state).
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    url_template: String,
}

impl HttpSource {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url_template = url_template.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Transport {
                url: url_template.clone(),
                source,
            })?;
        Ok(Self {
            client,
            url_template,
        })
    }

    pub fn from_config(cfg: &JobConfig) -> Result<Self, FetchError> {
        Self::new(cfg.url.clone(), cfg.timeout)
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: err,
        }
    }
}

#[async_trait]
impl ReportSource for HttpSource {
    async fn fetch(&self, year: u32, state_index: u32) -> Result<FetchResult, FetchError> {
        check_state_index(state_index)?;
        let url = render_url(&self.url_template, year);
        debug!(%url, state_index, "posting");

        let resp = self
            .client
            .post(&url)
            .query(&[("s", state_index)])
            .send()
            .await
            .map_err(|e| classify(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| classify(&url, e))?;
        let state_name = state_name_from_options(&body, state_index)?;
        info!(year, state = %state_name, "url fetched");

        Ok(FetchResult {
            year,
            state_index,
            state_name,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::options_page;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2016State/StateReport.aspx"))
            .and(query_param("s", "9"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    fn source(server: &MockServer, timeout: Duration) -> HttpSource {
        let template = format!("{}/{{year}}State/StateReport.aspx", server.uri());
        HttpSource::new(template, timeout).unwrap()
    }

    #[tokio::test]
    async fn posts_state_index_and_resolves_name() {
        let server =
            server_with(ResponseTemplate::new(200).set_body_string(options_page("<table></table>")))
                .await;
        let got = source(&server, Duration::from_secs(5))
            .fetch(2016, 9)
            .await
            .unwrap();
        assert_eq!(got.state_name, "Florida");
        assert_eq!(got.year, 2016);
        assert_eq!(got.state_index, 9);
        assert!(got.body.contains("<table>"));
    }

    #[tokio::test]
    async fn slow_response_is_a_timeout() {
        let server = server_with(
            ResponseTemplate::new(200)
                .set_body_string(options_page(""))
                .set_delay(Duration::from_millis(500)),
        )
        .await;
        let err = source(&server, Duration::from_millis(50))
            .fetch(2016, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let server = server_with(ResponseTemplate::new(503)).await;
        let err = source(&server, Duration::from_secs(5))
            .fetch(2016, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // bind then release a port so nothing is listening on it
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let template = format!("http://127.0.0.1:{port}/{{year}}State/StateReport.aspx");
        let err = HttpSource::new(template, Duration::from_secs(5))
            .unwrap()
            .fetch(2016, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "got {err:?}");
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn out_of_range_index_sends_nothing() {
        let server = MockServer::start().await;
        let err = source(&server, Duration::from_secs(5))
            .fetch(2016, 57)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidStateIndex(57)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
