//! Network primitives handed to the client library
//!
//! These are plain data types; the host supplies the only moving part,
//! a [`Fetch`] implementation that turns a [`Request`] into a [`Response`].

use crate::error::{HostkitError, HostkitResult};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Streaming body chunks
pub type ByteStream = BoxStream<'static, HostkitResult<Vec<u8>>>;

/// Ordered, case-insensitive header multimap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, keeping existing ones with the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every value for `name` with `value`
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.delete(&name);
        self.entries.push((name, value.into()));
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn delete(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// In-memory file representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A single form field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(File),
}

/// Form-encoded body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_file(&mut self, name: impl Into<String>, file: File) {
        self.fields.push((name.into(), FormValue::File(file)));
    }

    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, FormValue)] {
        &self.fields
    }

    /// Encode as `application/x-www-form-urlencoded`
    ///
    /// Fails on file fields, which need a multipart encoder.
    pub fn to_urlencoded(&self) -> HostkitResult<String> {
        let pairs = self
            .fields
            .iter()
            .map(|(name, value)| match value {
                FormValue::Text(text) => Ok((name.as_str(), text.as_str())),
                FormValue::File(_) => Err(HostkitError::FormFileField {
                    field: name.clone(),
                }),
            })
            .collect::<HostkitResult<Vec<_>>>()?;
        Ok(serde_urlencoded::to_string(pairs)?)
    }
}

/// Request or response body
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    Form(FormData),
    Stream(ByteStream),
}

impl Body {
    /// Wrap an in-memory list of chunks as a stream body
    pub fn from_chunks(chunks: Vec<Vec<u8>>) -> Self {
        Self::Stream(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    /// Collect the whole body into memory
    ///
    /// Text-only forms are url-encoded; forms carrying files are an error.
    pub async fn bytes(self) -> HostkitResult<Vec<u8>> {
        match self {
            Self::Empty => Ok(Vec::new()),
            Self::Form(form) => Ok(form.to_urlencoded()?.into_bytes()),
            Self::Bytes(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut out = Vec::new();
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(out)
            }
        }
    }

    pub async fn text(self) -> HostkitResult<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Self::Form(form) => write!(f, "Form({} fields)", form.fields().len()),
            Self::Stream(_) => write!(f, "Stream"),
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Bytes(text.into_bytes())
    }
}

impl From<FormData> for Body {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

/// Outgoing HTTP request
#[derive(Debug)]
pub struct Request {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Body,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Body>) -> Self {
        Self::new("POST", url).with_body(body)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// Incoming HTTP response
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub async fn json<T: serde::de::DeserializeOwned>(self) -> HostkitResult<T> {
        let bytes = self.body.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Named event with a JSON payload, used for progress and auth notifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub kind: String,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl CustomEvent {
    pub fn new(kind: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            detail,
        }
    }
}

/// Host network entry point
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: Request) -> HostkitResult<Response>;
}
