use async_trait::async_trait;
use reqwest::Client;
use tunesearch_core::{NetworkError, NetworkResult, SearchConfig, SearchResponse, SearchService};
use url::Url;

const USER_AGENT: &str = concat!("tunesearch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct ItunesConfig {
    pub endpoint: String,
}

impl From<&SearchConfig> for ItunesConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
        }
    }
}

/// Search client for the iTunes Search API (or anything answering in its
/// shape).
///
/// One `GET <endpoint>?term=<query>` per call, no retries and no timeout
/// beyond the transport defaults.
#[derive(Debug, Clone)]
pub struct ItunesClient {
    id: String,
    client: Client,
    endpoint: Url,
}

impl ItunesClient {
    pub fn new(config: ItunesConfig) -> NetworkResult<Self> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|e| NetworkError::Transport {
            message: format!("invalid endpoint {}: {e}", config.endpoint),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(NetworkError::Transport {
                message: format!("unsupported endpoint scheme: {}", endpoint.scheme()),
            });
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            id: "itunes".into(),
            client,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Appends `term` to whatever query the configured endpoint already has.
    fn search_url(&self, term: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("term", term);
        url
    }
}

#[async_trait]
impl SearchService for ItunesClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search(&self, term: &str) -> NetworkResult<SearchResponse> {
        let url = self.search_url(term);
        tracing::debug!(provider = %self.id, %url, "sending search request");

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(provider = %self.id, status = status.as_u16(), "search request rejected");
            return Err(NetworkError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        // The API labels its JSON as text/javascript, so decode the raw bytes.
        let body = resp.bytes().await.map_err(transport)?;
        let response: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| NetworkError::Transport {
                message: format!("malformed response body: {e}"),
            })?;
        tracing::debug!(
            provider = %self.id,
            results = response.results.len(),
            "search request completed"
        );
        Ok(response)
    }
}

fn transport(err: reqwest::Error) -> NetworkError {
    NetworkError::Transport {
        message: err.to_string(),
    }
}
