//! The response sink handlers write into.

use bytes::{Bytes, BytesMut};
use futures_util::FutureExt;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body_util::{BodyExt, Full};

/// Records what a handler writes: status, headers and body.
///
/// The first status written wins. Writing body bytes without a status
/// implies `200 OK`, and so does a handler that writes nothing at all.
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

impl ResponseRecorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the status line. Later calls are ignored.
    pub fn write_status(&mut self, status: StatusCode) {
        if let Some(existing) = self.status {
            tracing::debug!(%existing, ignored = %status, "status already written");
            return;
        }
        self.status = Some(status);
    }

    /// Returns the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Sets a header, replacing any previous values.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Appends body bytes.
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes.as_ref());
    }

    /// Copies a complete response into the recorder.
    pub fn record(&mut self, response: http::Response<Full<Bytes>>) {
        let (parts, body) = response.into_parts();
        self.write_status(parts.status);
        for (name, value) in &parts.headers {
            self.headers.append(name, value.clone());
        }
        match body.collect().now_or_never() {
            Some(Ok(collected)) => self.write(collected.to_bytes()),
            Some(Err(never)) => match never {},
            None => tracing::warn!("response body was not ready; recorded without body"),
        }
    }

    /// Returns the recorded status, `200 OK` if none was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Returns true if a status was written explicitly or implied by a body write.
    pub fn status_written(&self) -> bool {
        self.status.is_some()
    }

    /// Returns the recorded headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the recorded body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl std::io::Write for ResponseRecorder {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        ResponseRecorder::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
