//! Stateless request builder and response parser for the Brightcove APIs.
//!
//! # Design
//! `BrightcoveClient` holds only its [`ClientConfig`] and carries no mutable
//! state between calls. Each API call is split into a `build_*` method that
//! produces an `HttpRequest` (or `MultipartRequest`) and a `parse_*` method
//! that consumes an `HttpResponse`. The caller executes the HTTP round-trip,
//! either through [`crate::BrightcoveApi`] or with any other HTTP client.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartRequest, ResponseFormat};
use crate::multipart::{FilePart, MultipartPayload, Part};
use crate::params::{normalize, IntoParams, ParamValue, Params};
use crate::types::{ReadOutput, WriteEnvelope};

/// Multipart field carrying the JSON envelope. Must be the first part.
pub const JSON_PART: &str = "json";

/// Multipart field carrying the uploaded file. Always the last part.
pub const FILE_PART: &str = "file";

/// Synchronous, stateless client for the Brightcove read and write APIs.
#[derive(Debug, Clone)]
pub struct BrightcoveClient {
    config: ClientConfig,
}

impl BrightcoveClient {
    /// Client for the public endpoints.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(token))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Normalized read parameters for `method`.
    ///
    /// `command` and `token` are always set from the arguments, replacing
    /// any caller-supplied values. `output=mrss` forces `format=xml`.
    pub fn query(&self, method: &str, options: impl IntoParams) -> Result<Params> {
        let mut params = normalize(options)?;
        params.insert("command", method);
        params.insert("token", &self.config.token);
        if params.get("output").and_then(ParamValue::as_str) == Some("mrss") {
            params.insert("format", "xml");
        }
        Ok(params)
    }

    pub fn build_query(&self, method: &str, options: impl IntoParams) -> Result<HttpRequest> {
        let params = self.query(method, options)?;
        let response_format = match params.get("format").and_then(ParamValue::as_str) {
            Some("xml") => ResponseFormat::Xml,
            _ => ResponseFormat::Json,
        };
        let query = params.to_query_string()?;

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}?{query}", self.config.read_api_url),
            headers: self.config.request_headers(),
            body: None,
            response_format,
        })
    }

    /// Wrap `parameters` and the token as a write envelope.
    ///
    /// `parameters` must serialize to a JSON object (or to `null`, meaning
    /// no parameters).
    pub fn write_envelope(&self, method: &str, parameters: impl Serialize) -> Result<WriteEnvelope> {
        let value = serde_json::to_value(parameters).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut params = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ApiError::InvalidParameters(format!(
                    "write parameters must be an object, got {other}"
                )))
            }
        };
        params.insert("token".to_string(), Value::String(self.config.token.clone()));

        Ok(WriteEnvelope {
            method: method.to_string(),
            params,
        })
    }

    /// Serialized write envelope, as sent in the POST body or `json` part.
    pub fn post_body(&self, method: &str, parameters: impl Serialize) -> Result<String> {
        let envelope = self.write_envelope(method, parameters)?;
        serde_json::to_string(&envelope).map_err(|e| ApiError::SerializationError(e.to_string()))
    }

    pub fn build_post(&self, method: &str, parameters: impl Serialize) -> Result<HttpRequest> {
        let body = self.post_body(method, parameters)?;
        let mut headers = self.config.request_headers();
        headers.push(("content-type".to_string(), "application/json".to_string()));
        headers.push(("accept".to_string(), "application/json".to_string()));

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.config.write_api_url.clone(),
            headers,
            body: Some(body),
            response_format: ResponseFormat::Json,
        })
    }

    /// Multipart write request: the `json` envelope part, then a `file` part
    /// named `filename` with `content_type`.
    pub fn build_multipart(
        &self,
        method: &str,
        parameters: impl Serialize,
        filename: &str,
        content_type: &str,
    ) -> Result<MultipartRequest> {
        let body = self.post_body(method, parameters)?;
        let payload = MultipartPayload::new(
            vec![Part::json(JSON_PART, body)],
            FilePart {
                name: FILE_PART.to_string(),
                filename: filename.to_string(),
                content_type: content_type.to_string(),
            },
        );
        let mut headers = self.config.request_headers();
        headers.push(("accept".to_string(), "application/json".to_string()));

        Ok(MultipartRequest {
            url: self.config.write_api_url.clone(),
            headers,
            payload,
        })
    }

    pub fn parse_read(&self, format: ResponseFormat, response: HttpResponse) -> Result<ReadOutput> {
        check_status(&response)?;
        match format {
            ResponseFormat::Json => parse_json(&response.body).map(ReadOutput::Json),
            ResponseFormat::Xml => Ok(ReadOutput::Xml(response.body)),
        }
    }

    pub fn parse_write(&self, response: HttpResponse) -> Result<Value> {
        check_status(&response)?;
        parse_json(&response.body)
    }
}

/// Map non-2xx status codes to `ApiError::HttpError`.
fn check_status(response: &HttpResponse) -> Result<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

// The service labels JSON responses as text/html, so the content type is
// not consulted.
fn parse_json(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::USER_AGENT;

    const TOKEN: &str = "0Z2dtxTdJAxtbZ-d0U7Bhio2V1Rhr5Iafl5FFtDPY8E.";

    fn client() -> BrightcoveClient {
        BrightcoveClient::with_config(
            ClientConfig::builder(TOKEN)
                .read_api_url("http://localhost:3000/services/library")
                .write_api_url("http://localhost:3000/services/post")
                .build(),
        )
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn query_injects_command_and_token() {
        let params = client().query("find_all_videos", [("page_size", 5)]).unwrap();
        assert_eq!(
            params.to_pairs(),
            vec![("page_size", "5"), ("command", "find_all_videos"), ("token", TOKEN)]
        );
    }

    #[test]
    fn query_overrides_caller_command_and_token() {
        let params = client()
            .query("search_videos", "command=delete_video&token=stolen&any=tag:foo")
            .unwrap();
        assert_eq!(params.get("command").and_then(ParamValue::as_str), Some("search_videos"));
        assert_eq!(params.get("token").and_then(ParamValue::as_str), Some(TOKEN));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn query_from_string_keeps_repeated_keys() {
        let params = client().query("search_videos", "any=tag:bar&any=tag:foo").unwrap();
        assert_eq!(params.get("any").unwrap().values(), ["tag:bar", "tag:foo"]);
    }

    #[test]
    fn mrss_output_forces_xml_format() {
        let params = client().query("search_videos", [("output", "mrss")]).unwrap();
        assert_eq!(params.get("format").and_then(ParamValue::as_str), Some("xml"));

        let req = client().build_query("search_videos", [("output", "mrss"), ("format", "json")]).unwrap();
        assert_eq!(req.response_format, ResponseFormat::Xml);
        assert!(req.url.contains("format=xml"));
        assert!(!req.url.contains("format=json"));
    }

    #[test]
    fn non_mrss_output_leaves_format_alone() {
        let params = client().query("find_all_videos", [("output", "json")]).unwrap();
        assert!(!params.contains_key("format"));
    }

    #[test]
    fn build_query_produces_get_with_repeated_keys() {
        let req = client()
            .build_query(
                "search_videos",
                vec![
                    ("any", ParamValue::from(["tag:foo", "tag:bar"])),
                    ("all", ParamValue::from("search_text:foo")),
                ],
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            format!(
                "http://localhost:3000/services/library?any=tag%3Afoo&any=tag%3Abar&all=search_text%3Afoo\
                 &command=search_videos&token={TOKEN}"
            )
        );
        assert!(req.body.is_none());
        assert_eq!(req.response_format, ResponseFormat::Json);
        assert_eq!(req.headers, vec![("user-agent".to_string(), USER_AGENT.to_string())]);
    }

    #[test]
    fn build_query_rejects_malformed_options() {
        let err = client().build_query("find_all_videos", json!(null)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameters(_)));
    }

    #[test]
    fn post_body_matches_wire_format() {
        let body = client()
            .post_body("delete_video", json!({"video_id": "595153261337"}))
            .unwrap();
        assert_eq!(
            body,
            format!(r#"{{"method":"delete_video","params":{{"video_id":"595153261337","token":"{TOKEN}"}}}}"#)
        );
    }

    #[test]
    fn post_body_round_trips() {
        let params = json!({"video": {"name": "Video", "shortDescription": "Short Description"}});
        let body = client().post_body("create_video", &params).unwrap();
        let decoded: WriteEnvelope = serde_json::from_str(&body).unwrap();

        assert_eq!(decoded.method, "create_video");
        assert_eq!(decoded.params["video"], params["video"]);
        assert_eq!(decoded.params["token"], TOKEN);
        assert_eq!(decoded.params.len(), 2);
    }

    #[test]
    fn post_body_token_overrides_caller_token() {
        let envelope = client()
            .write_envelope("delete_video", json!({"token": "other", "video_id": 1}))
            .unwrap();
        assert_eq!(envelope.params["token"], TOKEN);
    }

    #[test]
    fn post_body_accepts_serializable_structs() {
        #[derive(Serialize)]
        struct Delete {
            video_id: u64,
            cascade: bool,
        }
        let body = client()
            .post_body("delete_video", Delete { video_id: 42, cascade: true })
            .unwrap();
        assert_eq!(
            body,
            format!(r#"{{"method":"delete_video","params":{{"video_id":42,"cascade":true,"token":"{TOKEN}"}}}}"#)
        );
    }

    #[test]
    fn post_body_rejects_non_object_params() {
        let err = client().post_body("delete_video", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameters(_)));
    }

    #[test]
    fn build_post_produces_json_request() {
        let req = client().build_post("delete_video", json!({"video_id": "1"})).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/services/post");
        assert!(req
            .headers
            .contains(&("content-type".to_string(), "application/json".to_string())));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["method"], "delete_video");
        assert_eq!(body["params"]["video_id"], "1");
    }

    #[test]
    fn build_multipart_puts_json_part_first() {
        let req = client()
            .build_multipart(
                "create_video",
                json!({"video": {"name": "Video"}}),
                "movie.mov",
                "video/quicktime",
            )
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/services/post");
        assert_eq!(req.payload.part_names(), [JSON_PART, FILE_PART]);

        let json_part = &req.payload.parts()[0];
        let envelope: WriteEnvelope = serde_json::from_slice(json_part.data()).unwrap();
        assert_eq!(envelope.method, "create_video");
        assert_eq!(envelope.params["token"], TOKEN);

        assert_eq!(req.payload.file().filename, "movie.mov");
        assert_eq!(req.payload.file().content_type, "video/quicktime");

        let content_type = req
            .all_headers()
            .into_iter()
            .find(|(k, _)| k == "content-type")
            .map(|(_, v)| v)
            .unwrap();
        assert_eq!(content_type, req.payload.content_type());
    }

    #[test]
    fn parse_read_json() {
        let out = client()
            .parse_read(ResponseFormat::Json, ok(r#"{"items":[],"page_number":0}"#))
            .unwrap();
        assert_eq!(out.as_json().unwrap()["page_number"], 0);
    }

    #[test]
    fn parse_read_xml_passes_body_through() {
        let doc = r#"<?xml version="1.0"?><rss version="2.0"><channel/></rss>"#;
        let out = client().parse_read(ResponseFormat::Xml, ok(doc)).unwrap();
        assert_eq!(out.as_xml(), Some(doc));
    }

    #[test]
    fn parse_read_bad_json() {
        let err = client().parse_read(ResponseFormat::Json, ok("not json")).unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn parse_write_keeps_service_errors() {
        let value = client()
            .parse_write(ok(r#"{"result":null,"error":{"name":"InvalidTokenError","code":210},"id":null}"#))
            .unwrap();
        assert_eq!(value["error"]["code"], 210);
    }

    #[test]
    fn parse_write_wrong_status() {
        let response = HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "internal error".to_string(),
        };
        let err = client().parse_write(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, ref body } if body == "internal error"));
    }
}
