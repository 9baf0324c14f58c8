//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! request builder produces `HttpRequest` / `MultipartRequest` values and
//! parses `HttpResponse` values without touching the network. The blocking
//! transport in [`crate::transport`] is one executor of these values; any
//! other HTTP client can execute them just as well.

use crate::multipart::MultipartPayload;

/// HTTP method for a request. The service only uses GET for reads and POST
/// for writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Serialization the read API was asked to respond with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

/// An HTTP request described as plain data.
///
/// For GET requests `url` already carries the encoded query string.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub response_format: ResponseFormat,
}

/// A multipart POST: the JSON control part is encoded up front, the file
/// content is supplied when the request is executed.
#[derive(Debug, Clone)]
pub struct MultipartRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub payload: MultipartPayload,
}

impl MultipartRequest {
    /// Headers including the `content-type` carrying the payload boundary.
    pub fn all_headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        headers.push(("content-type".to_string(), self.payload.content_type()));
        headers
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
