//! In-memory fake of the Brightcove read and write endpoints.
//!
//! Service-level failures (bad token, unknown command, missing video) are
//! reported the way the real service does: HTTP 200 with a populated
//! `error` object. Only malformed requests get a 4xx status.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const READ_PATH: &str = "/services/library";
pub const WRITE_PATH: &str = "/services/post";

const FIRST_VIDEO_ID: u64 = 653155417001;
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: u64,
}

#[derive(Debug)]
pub struct Store {
    videos: BTreeMap<u64, Video>,
    next_id: u64,
}

impl Store {
    fn with_videos(videos: Vec<Video>) -> Self {
        let next_id = videos.iter().map(|v| v.id + 1).max().unwrap_or(FIRST_VIDEO_ID).max(FIRST_VIDEO_ID);
        Self {
            videos: videos.into_iter().map(|v| (v.id, v)).collect(),
            next_id,
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Router with an empty video library.
pub fn app() -> Router {
    app_with(Vec::new())
}

/// Router whose library starts with `videos`.
pub fn app_with(videos: Vec<Video>) -> Router {
    let db: Db = Arc::new(RwLock::new(Store::with_videos(videos)));
    Router::new()
        .route(READ_PATH, get(library))
        .route(WRITE_PATH, post(write))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Read endpoint
// ---------------------------------------------------------------------------

struct ReadQuery(Vec<(String, String)>);

impl ReadQuery {
    fn first(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn all(&self, key: &str) -> Vec<&str> {
        self.0.iter().filter(|(k, _)| k == key).map(|(_, v)| v.as_str()).collect()
    }

    fn number(&self, key: &str, default: usize) -> usize {
        self.first(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }
}

async fn library(State(db): State<Db>, Query(pairs): Query<Vec<(String, String)>>) -> Response {
    let query = ReadQuery(pairs);
    if query.first("token").map_or(true, str::is_empty) {
        return service_error("InvalidTokenError", "a valid token is required", 210);
    }

    let command = query.first("command").unwrap_or_default();
    tracing::debug!(command, "read request");
    let store = db.read().await;

    match command {
        "find_all_videos" => {
            let videos: Vec<&Video> = store.videos.values().collect();
            page(&query, command, videos)
        }
        "search_videos" => {
            let any = query.all("any");
            let all = query.all("all");
            let videos: Vec<&Video> = store
                .videos
                .values()
                .filter(|v| any.is_empty() || any.iter().any(|term| matches_term(v, term)))
                .filter(|v| all.iter().all(|term| matches_term(v, term)))
                .collect();
            page(&query, command, videos)
        }
        "find_video_by_id" => {
            let video = query
                .first("video_id")
                .and_then(|id| id.parse::<u64>().ok())
                .and_then(|id| store.videos.get(&id));
            Json(json!(video)).into_response()
        }
        "" => service_error("MissingRequiredParameterError", "command is required", 301),
        other => service_error("UnknownCommandError", &format!("unknown command {other}"), 302),
    }
}

fn page(query: &ReadQuery, command: &str, videos: Vec<&Video>) -> Response {
    let page_size = query.number("page_size", DEFAULT_PAGE_SIZE);
    let page_number = query.number("page_number", 0);
    let total_count = match query.first("get_item_count") {
        Some("true") => videos.len() as i64,
        _ => -1,
    };
    let items: Vec<&Video> = videos
        .into_iter()
        .skip(page_size.saturating_mul(page_number))
        .take(page_size)
        .collect();

    if query.first("output") == Some("mrss") {
        return mrss(command, &items);
    }

    Json(json!({
        "items": items,
        "page_number": page_number,
        "page_size": page_size,
        "total_count": total_count,
    }))
    .into_response()
}

fn matches_term(video: &Video, term: &str) -> bool {
    let term = term.to_lowercase();
    if let Some(tag) = term.strip_prefix("tag:") {
        return video.tags.iter().any(|t| t.to_lowercase() == tag);
    }
    let text = term.strip_prefix("search_text:").unwrap_or(&term);
    video.name.to_lowercase().contains(text) || video.short_description.to_lowercase().contains(text)
}

fn mrss(command: &str, items: &[&Video]) -> Response {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:media=\"http://search.yahoo.com/mrss/\">\n<channel>\n",
    );
    doc.push_str(&format!("<title>{}</title>\n", escape_xml(command)));
    for video in items {
        doc.push_str(&format!(
            "<item><guid>{}</guid><title>{}</title><description>{}</description></item>\n",
            video.id,
            escape_xml(&video.name),
            escape_xml(&video.short_description),
        ));
    }
    doc.push_str("</channel>\n</rss>\n");
    ([(header::CONTENT_TYPE, "application/xml")], doc).into_response()
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Write endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    params: Map<String, Value>,
}

#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    size: u64,
}

async fn write(State(db): State<Db>, request: Request) -> Response {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let parsed = if is_multipart {
        read_multipart(request).await
    } else {
        read_json(request).await
    };
    let (envelope, upload) = match parsed {
        Ok(parsed) => parsed,
        Err(rejection) => return rejection,
    };

    if envelope.params.get("token").and_then(Value::as_str).map_or(true, str::is_empty) {
        return service_error("InvalidTokenError", "a valid token is required", 210);
    }
    tracing::debug!(method = %envelope.method, upload = upload.is_some(), "write request");

    let mut store = db.write().await;
    match envelope.method.as_str() {
        "create_video" => create_video(&mut store, &envelope.params, upload),
        "update_video" => update_video(&mut store, &envelope.params),
        "delete_video" => delete_video(&mut store, &envelope.params),
        other => service_error("UnknownMethodError", &format!("unknown method {other}"), 302),
    }
}

async fn read_json(request: Request) -> Result<(Envelope, Option<Upload>), Response> {
    let bytes = Bytes::from_request(request, &()).await.map_err(IntoResponse::into_response)?;
    let envelope = serde_json::from_slice(&bytes).map_err(|e| bad_request(&e.to_string()))?;
    Ok((envelope, None))
}

/// Parts are read positionally: `json` must come before `file`.
async fn read_multipart(request: Request) -> Result<(Envelope, Option<Upload>), Response> {
    let mut multipart = Multipart::from_request(request, &()).await.map_err(IntoResponse::into_response)?;
    let mut envelope: Option<Envelope> = None;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(IntoResponse::into_response)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "json" => {
                let text = field.text().await.map_err(IntoResponse::into_response)?;
                envelope = Some(serde_json::from_str(&text).map_err(|e| bad_request(&e.to_string()))?);
            }
            "file" => {
                if envelope.is_none() {
                    return Err(bad_request("the json part must precede the file part"));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(IntoResponse::into_response)?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    size: data.len() as u64,
                });
            }
            other => return Err(bad_request(&format!("unexpected part {other:?}"))),
        }
    }

    let envelope = envelope.ok_or_else(|| bad_request("missing json part"))?;
    Ok((envelope, upload))
}

fn create_video(store: &mut Store, params: &Map<String, Value>, upload: Option<Upload>) -> Response {
    let Some(upload) = upload else {
        return service_error("MissingFileError", "create_video requires a file part", 304);
    };
    let Some(fields) = params.get("video").and_then(Value::as_object) else {
        return service_error("MissingRequiredParameterError", "video is required", 301);
    };
    let Some(name) = fields.get("name").and_then(Value::as_str) else {
        return service_error("MissingRequiredParameterError", "video.name is required", 301);
    };

    let id = store.next_id;
    store.next_id += 1;
    let video = Video {
        id,
        name: name.to_string(),
        short_description: string_field(fields, "shortDescription").unwrap_or_default(),
        tags: tags_field(fields).unwrap_or_default(),
        file_name: upload.file_name,
        content_type: upload.content_type,
        file_size: upload.size,
    };
    store.videos.insert(id, video);
    ok(json!(id))
}

fn update_video(store: &mut Store, params: &Map<String, Value>) -> Response {
    let Some(fields) = params.get("video").and_then(Value::as_object) else {
        return service_error("MissingRequiredParameterError", "video is required", 301);
    };
    let Some(video) = fields.get("id").and_then(id_value).and_then(|id| store.videos.get_mut(&id)) else {
        return service_error("NotFoundError", "no video with that id", 404);
    };

    if let Some(name) = string_field(fields, "name") {
        video.name = name;
    }
    if let Some(description) = string_field(fields, "shortDescription") {
        video.short_description = description;
    }
    if let Some(tags) = tags_field(fields) {
        video.tags = tags;
    }
    ok(json!(video))
}

fn delete_video(store: &mut Store, params: &Map<String, Value>) -> Response {
    match params.get("video_id").and_then(id_value).and_then(|id| store.videos.remove(&id)) {
        Some(_) => ok(json!({})),
        None => service_error("NotFoundError", "no video with that id", 404),
    }
}

/// Ids arrive as numbers or as numeric strings.
fn id_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn tags_field(fields: &Map<String, Value>) -> Option<Vec<String>> {
    let tags = fields.get("tags")?.as_array()?;
    Some(tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
}

fn ok(result: Value) -> Response {
    Json(json!({"result": result, "error": null, "id": null})).into_response()
}

fn service_error(name: &str, message: &str, code: u32) -> Response {
    Json(json!({
        "result": null,
        "error": {"name": name, "message": message, "code": code},
        "id": null,
    }))
    .into_response()
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, message.to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: u64, name: &str, tags: &[&str]) -> Video {
        Video {
            id,
            name: name.to_string(),
            short_description: format!("{name} description"),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            file_name: None,
            content_type: None,
            file_size: 0,
        }
    }

    #[test]
    fn video_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(video(1, "Test", &["a"])).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["shortDescription"], "Test description");
        assert_eq!(json["tags"][0], "a");
    }

    #[test]
    fn tag_terms_match_tags_case_insensitively() {
        let v = video(1, "Chicago Football", &["Color"]);
        assert!(matches_term(&v, "tag:color"));
        assert!(!matches_term(&v, "tag:technicolor"));
    }

    #[test]
    fn text_terms_match_name_and_description() {
        let v = video(1, "Chicago Football", &[]);
        assert!(matches_term(&v, "football"));
        assert!(matches_term(&v, "search_text:chicago"));
        assert!(matches_term(&v, "description"));
        assert!(!matches_term(&v, "baseball"));
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        assert_eq!(id_value(&json!(595153261337u64)), Some(595153261337));
        assert_eq!(id_value(&json!("595153261337")), Some(595153261337));
        assert_eq!(id_value(&json!("abc")), None);
    }

    #[test]
    fn store_ids_continue_after_seeded_videos() {
        let store = Store::with_videos(vec![video(FIRST_VIDEO_ID + 10, "x", &[])]);
        assert_eq!(store.next_id, FIRST_VIDEO_ID + 11);
        assert_eq!(Store::with_videos(Vec::new()).next_id, FIRST_VIDEO_ID);
    }

    #[test]
    fn xml_escaping() {
        assert_eq!(escape_xml("a<b & c>"), "a&lt;b &amp; c&gt;");
    }
}
