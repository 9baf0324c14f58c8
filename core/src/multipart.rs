//! Ordered multipart/form-data payloads for file uploads.
//!
//! The write API parses multipart bodies positionally: the `json` control
//! part must arrive before the `file` part. [`MultipartPayload`] keeps its
//! leading parts in an explicit `Vec` and always places the file part last,
//! so the ordering never depends on map iteration order.
//!
//! The non-file bytes are produced once by [`MultipartPayload::head`] and
//! [`MultipartPayload::tail`]; the buffered ([`MultipartPayload::encode`]) and
//! streaming ([`MultipartPayload::reader`]) variants both wrap the file
//! content in exactly those bytes.

use std::io::{Cursor, Read};

use uuid::Uuid;

/// A part whose content is known when the payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl Part {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// A part holding a JSON document.
    pub fn json(name: impl Into<String>, json: impl Into<String>) -> Self {
        Self::new(name, json.into()).with_content_type("application/json")
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Header of the trailing part whose content is streamed in at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub name: String,
    pub filename: String,
    pub content_type: String,
}

/// An ordered multipart body: leading inline parts, then one file part.
#[derive(Debug, Clone)]
pub struct MultipartPayload {
    boundary: String,
    parts: Vec<Part>,
    file: FilePart,
}

impl MultipartPayload {
    /// Create a payload with a random boundary.
    pub fn new(parts: Vec<Part>, file: FilePart) -> Self {
        Self::with_boundary(generate_boundary(), parts, file)
    }

    /// Create a payload with a fixed boundary. The boundary must not occur in
    /// any part content.
    pub fn with_boundary(boundary: impl Into<String>, parts: Vec<Part>, file: FilePart) -> Self {
        Self {
            boundary: boundary.into(),
            parts,
            file,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn file(&self) -> &FilePart {
        &self.file
    }

    /// Part names in wire order. The file part is always last.
    pub fn part_names(&self) -> Vec<&str> {
        self.parts
            .iter()
            .map(Part::name)
            .chain(std::iter::once(self.file.name.as_str()))
            .collect()
    }

    /// `Content-Type` header value for this payload.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Every leading part, then the file part's headers, up to where the
    /// file content starts.
    pub fn head(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for part in &self.parts {
            self.write_part_header(&mut buf, &part.name, part.filename.as_deref(), part.content_type.as_deref());
            buf.extend_from_slice(&part.data);
            buf.extend_from_slice(b"\r\n");
        }
        self.write_part_header(
            &mut buf,
            &self.file.name,
            Some(&self.file.filename),
            Some(&self.file.content_type),
        );
        buf
    }

    /// Everything after the file content: the closing boundary.
    pub fn tail(&self) -> Vec<u8> {
        format!("\r\n--{}--\r\n", self.boundary).into_bytes()
    }

    /// Total body length for a file of `file_len` bytes.
    pub fn content_length(&self, file_len: u64) -> u64 {
        self.head().len() as u64 + file_len + self.tail().len() as u64
    }

    /// Buffered body with the file content inlined.
    pub fn encode(&self, file: &[u8]) -> Vec<u8> {
        let mut body = self.head();
        body.extend_from_slice(file);
        body.extend_from_slice(&self.tail());
        body
    }

    /// Streaming body: the head, then `file` as it is read, then the tail.
    pub fn reader<R: Read>(&self, file: R) -> impl Read {
        Cursor::new(self.head()).chain(file).chain(Cursor::new(self.tail()))
    }

    fn write_part_header(&self, buf: &mut Vec<u8>, name: &str, filename: Option<&str>, content_type: Option<&str>) {
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(self.boundary.as_bytes());
        buf.extend_from_slice(b"\r\n");

        buf.extend_from_slice(b"Content-Disposition: form-data; name=\"");
        buf.extend_from_slice(escape_quoted(name).as_bytes());
        buf.extend_from_slice(b"\"");
        if let Some(filename) = filename {
            buf.extend_from_slice(b"; filename=\"");
            buf.extend_from_slice(escape_quoted(filename).as_bytes());
            buf.extend_from_slice(b"\"");
        }
        buf.extend_from_slice(b"\r\n");

        if let Some(content_type) = content_type {
            buf.extend_from_slice(b"Content-Type: ");
            buf.extend_from_slice(content_type.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace(['\r', '\n'], " ")
}

fn generate_boundary() -> String {
    format!("----BrightcoveBoundary{}", Uuid::new_v4().simple())
}

/// Guess a content type for an upload from its file extension.
pub fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mov" | "qt" => "video/quicktime",
        "mp4" | "m4v" => "video/mp4",
        "flv" => "video/x-flv",
        "f4v" => "video/mp4",
        "avi" => "video/x-msvideo",
        "wmv" => "video/x-ms-wmv",
        "mpg" | "mpeg" => "video/mpeg",
        "3gp" => "video/3gpp",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "json" => "application/json",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> MultipartPayload {
        MultipartPayload::with_boundary(
            "XyZ",
            vec![Part::json("json", r#"{"method":"create_video"}"#)],
            FilePart {
                name: "file".to_string(),
                filename: "movie.mov".to_string(),
                content_type: "video/quicktime".to_string(),
            },
        )
    }

    #[test]
    fn encode_produces_expected_wire_format() {
        let body = payload().encode(b"MOVIE");
        let expected = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"json\"\r\n",
            "Content-Type: application/json\r\n",
            "\r\n",
            "{\"method\":\"create_video\"}\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"file\"; filename=\"movie.mov\"\r\n",
            "Content-Type: video/quicktime\r\n",
            "\r\n",
            "MOVIE\r\n",
            "--XyZ--\r\n",
        );
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn json_part_precedes_file_part() {
        let p = payload();
        assert_eq!(p.part_names(), ["json", "file"]);

        let body = String::from_utf8(p.encode(b"data")).unwrap();
        let json_at = body.find("name=\"json\"").unwrap();
        let file_at = body.find("name=\"file\"").unwrap();
        assert!(json_at < file_at);
    }

    #[test]
    fn streaming_reader_matches_buffered_encoding() {
        let p = payload();
        let file = vec![7u8; 64 * 1024];

        let mut streamed = Vec::new();
        p.reader(file.as_slice()).read_to_end(&mut streamed).unwrap();

        assert_eq!(streamed, p.encode(&file));
        assert_eq!(p.content_length(file.len() as u64), streamed.len() as u64);
    }

    #[test]
    fn random_boundaries_differ() {
        let file = payload().file().clone();
        let a = MultipartPayload::new(Vec::new(), file.clone());
        let b = MultipartPayload::new(Vec::new(), file);
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.content_type().starts_with("multipart/form-data; boundary=----BrightcoveBoundary"));
    }

    #[test]
    fn quotes_in_filenames_are_escaped() {
        let p = MultipartPayload::with_boundary(
            "b",
            Vec::new(),
            FilePart {
                name: "file".to_string(),
                filename: "my \"best\" take.mov".to_string(),
                content_type: "video/quicktime".to_string(),
            },
        );
        let head = String::from_utf8(p.head()).unwrap();
        assert!(head.contains(r#"filename="my \"best\" take.mov""#));
    }

    #[test]
    fn content_type_guessing() {
        assert_eq!(guess_content_type("movie.mov"), "video/quicktime");
        assert_eq!(guess_content_type("CLIP.MP4"), "video/mp4");
        assert_eq!(guess_content_type("noextension"), "application/octet-stream");
    }
}
