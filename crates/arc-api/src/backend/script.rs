// Script endpoint HTTP backend
//
// Posts the argument list as a JSON array to the deployed script web app
// and parses the `{ error, val, message }` envelope from the body.

use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use super::Backend;
use crate::envelope::ServerResponse;
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// HTTP client for the deployed script web app.
pub struct ScriptBackend {
    http: reqwest::Client,
    url: Url,
}

impl ScriptBackend {
    /// Create a backend for the web-app `url` from a `TransportConfig`.
    pub fn new(url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, url })
    }

    /// Create a backend with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    /// The web-app URL every call is posted to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn post(&self, args: &[Value]) -> Result<ServerResponse, Error> {
        debug!("POST {}", self.url);

        let resp = self
            .http
            .post(self.url.clone())
            .json(args)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_response(resp).await
    }

    /// Map HTTP status and body into an envelope.
    ///
    /// Non-success statuses become `Error::Http`; the body of a success
    /// response must be a (possibly string-encoded) envelope.
    async fn parse_response(resp: reqwest::Response) -> Result<ServerResponse, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                preview: preview(&body),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(len = body.len(), "script response body");
        ServerResponse::parse(&body)
    }
}

impl Backend for ScriptBackend {
    fn call<'a>(&'a self, args: &'a [Value]) -> BoxFuture<'a, Result<ServerResponse, Error>> {
        Box::pin(self.post(args))
    }

    fn kind(&self) -> &'static str {
        "script"
    }
}
