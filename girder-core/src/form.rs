//! Form bodies and uploaded files

use crate::Error;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

pub use tempfile::TempPath;

/// Readable upload content handed to handlers.
pub type InputStream = Box<dyn Read + Send>;

/// Parse URL-encoded form data
pub fn parse_form<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))
}

/// Parse URL-encoded form data into ordered pairs, keeping repeated names
pub fn parse_form_pairs(body: &[u8]) -> Result<Vec<(String, String)>, Error> {
    parse_form(body)
}

/// An uploaded file.
///
/// Content is held in memory; `path` is set once the upload has been
/// written to disk by the request producer. [`FileItem::spill`] writes an
/// in-memory item to a temporary file.
#[derive(Debug, Clone)]
pub struct FileItem {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
    pub path: Option<PathBuf>,
}

impl FileItem {
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
            path: None,
        }
    }

    /// Mark the item as already stored at `path`.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name).extension().and_then(|e| e.to_str())
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    /// Open the content for reading. Reads from disk when a path is known.
    pub fn open(&self) -> Result<InputStream, Error> {
        match self.path {
            Some(ref path) => Ok(Box::new(std::fs::File::open(path)?)),
            None => Ok(Box::new(Cursor::new(self.data.clone()))),
        }
    }

    /// Write the content to a new temporary file in `dir`.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped.
    pub fn spill(&self, dir: &Path) -> Result<TempPath, Error> {
        let suffix = self
            .extension()
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("girder-upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(&self.data)?;
        Ok(file.into_temp_path())
    }
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text { name: String, value: String },
    File(FileItem),
}

/// Multipart form data parser
pub struct MultipartParser {
    boundary: String,
}

impl MultipartParser {
    /// Create a new multipart parser from Content-Type header
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                part.trim()
                    .strip_prefix("boundary=")
                    .map(|b| b.trim_matches('"').to_string())
            })
            .filter(|b| !b.is_empty())
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Ok(Self { boundary })
    }

    /// Split the body into parts. File content is kept byte-exact.
    pub fn parse(&self, body: &[u8]) -> Result<Vec<FormPart>, Error> {
        let delimiter = format!("--{}", self.boundary).into_bytes();
        let mut parts = Vec::new();

        let mut rest = match find(body, &delimiter) {
            Some(start) => &body[start + delimiter.len()..],
            None => return Err(Error::BadRequest("Multipart boundary not found".to_string())),
        };

        loop {
            if rest.starts_with(b"--") {
                break;
            }
            rest = rest.strip_prefix(b"\r\n").unwrap_or(rest);

            let end = find(rest, &delimiter)
                .ok_or_else(|| Error::BadRequest("Unterminated multipart body".to_string()))?;
            let mut segment = &rest[..end];
            segment = segment.strip_suffix(b"\r\n").unwrap_or(segment);
            parts.push(Self::parse_part(segment)?);
            rest = &rest[end + delimiter.len()..];
        }

        Ok(parts)
    }

    fn parse_part(segment: &[u8]) -> Result<FormPart, Error> {
        let split = find(segment, b"\r\n\r\n")
            .ok_or_else(|| Error::BadRequest("Malformed multipart part".to_string()))?;
        let head = std::str::from_utf8(&segment[..split])
            .map_err(|_| Error::BadRequest("Multipart headers are not UTF-8".to_string()))?;
        let content = &segment[split + 4..];

        let mut name = None;
        let mut file_name = None;
        let mut content_type = None;

        for line in head.lines() {
            let Some((header, value)) = line.split_once(':') else {
                continue;
            };
            if header.trim().eq_ignore_ascii_case("content-disposition") {
                for attr in value.split(';').map(str::trim) {
                    if let Some(v) = attr.strip_prefix("name=") {
                        name = Some(v.trim_matches('"').to_string());
                    } else if let Some(v) = attr.strip_prefix("filename=") {
                        file_name = Some(v.trim_matches('"').to_string());
                    }
                }
            } else if header.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }

        let name = name.ok_or_else(|| Error::BadRequest("Missing field name".to_string()))?;

        Ok(match file_name {
            Some(file_name) => FormPart::File(FileItem::new(
                name,
                file_name,
                content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
                Bytes::copy_from_slice(content),
            )),
            None => FormPart::Text {
                name,
                value: String::from_utf8_lossy(content).into_owned(),
            },
        })
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
