//! Blocking client for the Brightcove Media read and write APIs.
//!
//! # Overview
//! Reads are `GET` requests against the library endpoint with `command` and
//! `token` query parameters. Writes are `POST` requests against the post
//! endpoint carrying a `{"method": ..., "params": {...}}` envelope, either as
//! a JSON body or as the first part of a multipart upload followed by the
//! file.
//!
//! # Design
//! - `BrightcoveClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern).
//! - `BrightcoveApi` executes those requests with a blocking `ureq` agent
//!   and adds the file-upload conveniences.
//! - Parameters for reads are normalized into `Params`, an ordered
//!   multi-map, whether they start out as pairs, JSON or a query string.
//! - Multipart payloads keep an explicit part order: `json` first, `file`
//!   last.
//!
//! ```no_run
//! use brightcove_api::BrightcoveApi;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), brightcove_api::ApiError> {
//! let api = BrightcoveApi::new("my-token");
//! let videos = api.get("find_all_videos", [("page_size", 5)])?;
//! let tagged = api.get("search_videos", "any=tag:foo&any=tag:bar")?;
//! let deleted = api.post("delete_video", json!({"video_id": "595153261337"}))?;
//! # let _ = (videos, tagged, deleted);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod multipart;
pub mod params;
pub mod transport;
pub mod types;

pub use client::BrightcoveClient;
pub use config::{ClientConfig, ClientConfigBuilder, READ_API_URL, USER_AGENT, WRITE_API_URL};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartRequest, ResponseFormat};
pub use multipart::{FilePart, MultipartPayload, Part};
pub use params::{normalize, IntoParams, ParamValue, Params};
pub use transport::BrightcoveApi;
pub use types::{ReadOutput, WriteEnvelope};
