//! Blocking executor for requests built by [`BrightcoveClient`].
//!
//! # Design
//! `BrightcoveApi` pairs the stateless request builder with a `ureq` agent
//! configured once from [`ClientConfig`]. Non-2xx responses are returned as
//! data by the agent and turned into `ApiError::HttpError` by the builder's
//! parsers, so status interpretation stays in one place.
//!
//! File uploads come in two flavours that share the same multipart framing:
//! [`BrightcoveApi::post_file`] reads the whole file into memory and sends a
//! sized body, while the `*_streaming` variants pipe the file through the
//! payload reader with chunked transfer encoding.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use ureq::http::Response;
use ureq::{Agent, Body, SendBody};

use crate::client::BrightcoveClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartRequest};
use crate::multipart::guess_content_type;
use crate::params::IntoParams;
use crate::types::ReadOutput;

/// Filename sent for uploads that come from a reader rather than a path.
const READER_FILENAME: &str = "file";

/// Blocking client for the Brightcove read and write APIs.
#[derive(Clone)]
pub struct BrightcoveApi {
    client: BrightcoveClient,
    agent: Agent,
}

impl fmt::Debug for BrightcoveApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrightcoveApi").field("client", &self.client).finish_non_exhaustive()
    }
}

impl BrightcoveApi {
    /// Client for the public endpoints.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(token))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(config.connect_timeout)
            .timeout_recv_response(config.read_timeout)
            .timeout_recv_body(config.read_timeout)
            .build()
            .into();

        Self {
            client: BrightcoveClient::with_config(config),
            agent,
        }
    }

    /// The request builder used by this client.
    pub fn client(&self) -> &BrightcoveClient {
        &self.client
    }

    /// Call a read API method. `options` may be key/value pairs or a
    /// URL-encoded query string.
    pub fn get(&self, method: &str, options: impl IntoParams) -> Result<ReadOutput> {
        let req = self.client.build_query(method, options)?;
        let format = req.response_format;
        tracing::debug!(command = method, url = %self.client.config().read_api_url, "read request");
        let response = self.execute(req)?;
        self.client.parse_read(format, response)
    }

    /// Call a write API method with a JSON body.
    pub fn post(&self, method: &str, parameters: impl Serialize) -> Result<Value> {
        let req = self.client.build_post(method, parameters)?;
        tracing::debug!(method, url = %req.url, "write request");
        let response = self.execute(req)?;
        self.client.parse_write(response)
    }

    /// Upload the file at `path` together with a write call, buffering the
    /// whole file in memory. The content type is guessed from the extension.
    pub fn post_file(&self, method: &str, path: impl AsRef<Path>, parameters: impl Serialize) -> Result<Value> {
        let path = path.as_ref();
        let filename = file_name(path);
        let req = self
            .client
            .build_multipart(method, parameters, &filename, guess_content_type(&filename))?;
        let content = std::fs::read(path)?;
        tracing::debug!(method, url = %req.url, bytes = content.len(), "buffered upload");

        let body = req.payload.encode(&content);
        let response = self.send_multipart(&req, body.as_slice())?;
        self.client.parse_write(response)
    }

    /// Upload the file at `path` without loading it into memory.
    pub fn post_file_streaming(
        &self,
        method: &str,
        path: impl AsRef<Path>,
        content_type: &str,
        parameters: impl Serialize,
    ) -> Result<Value> {
        let path = path.as_ref();
        let req = self
            .client
            .build_multipart(method, parameters, &file_name(path), content_type)?;
        let file = File::open(path)?;
        tracing::debug!(method, url = %req.url, path = %path.display(), "streaming upload");

        let mut reader = req.payload.reader(file);
        let response = self.send_multipart(&req, SendBody::from_reader(&mut reader))?;
        self.client.parse_write(response)
    }

    /// Upload the content of `source` without loading it into memory.
    pub fn post_io_streaming<R: Read>(
        &self,
        method: &str,
        source: R,
        content_type: &str,
        parameters: impl Serialize,
    ) -> Result<Value> {
        let req = self
            .client
            .build_multipart(method, parameters, READER_FILENAME, content_type)?;
        tracing::debug!(method, url = %req.url, "streaming upload");

        let mut reader = req.payload.reader(source);
        let response = self.send_multipart(&req, SendBody::from_reader(&mut reader))?;
        self.client.parse_write(response)
    }

    /// Execute a plain request built by [`BrightcoveClient`].
    pub fn execute(&self, req: HttpRequest) -> Result<HttpResponse> {
        let response = match (req.method, req.body) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&req.url);
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                builder.call()?
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&req.url);
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                let body = body.unwrap_or_default();
                builder.send(body.as_bytes())?
            }
        };
        into_http_response(response)
    }

    fn send_multipart(&self, req: &MultipartRequest, body: impl ureq::AsSendBody) -> Result<HttpResponse> {
        let mut builder = self.agent.post(&req.url);
        for (name, value) in req.all_headers() {
            builder = builder.header(name, value);
        }
        into_http_response(builder.send(body)?)
    }
}

fn into_http_response(mut response: Response<Body>) -> Result<HttpResponse> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response.body_mut().read_to_string()?;
    tracing::trace!(status, "response received");

    Ok(HttpResponse { status, headers, body })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| READER_FILENAME.to_string())
}
