use crate::ids::RequestId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Response bodies longer than this are cut in traces.
pub const MAX_TRACE_BODY_BYTES: usize = 4096;

/// Placeholder written in place of credential header values.
pub const REDACTED: &str = "<redacted>";

/// Request payload as it appears in a trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceBody {
    Empty,
    Json { json: serde_json::Value },
    Form { fields: Vec<(String, String)> },
    Multipart { fields: Vec<String>, file: String, bytes: usize },
}

/// One request/response exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub sequence: u64,
    pub request_id: RequestId,
    pub method: String,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    pub request_body: TraceBody,
    pub status: Option<u16>,
    pub response_body: Option<String>,
    pub elapsed_ms: u64,
    pub error: Option<String>,
}

/// Shared, append-only transcript of an attempt's exchanges.
///
/// Clones share the same buffer, so a client handed to a lease keeps
/// writing into the attempt's trace.
#[derive(Debug, Clone, Default)]
pub struct TraceRecorder {
    entries: Arc<Mutex<Vec<TraceEntry>>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.entries
            .lock()
            .map_or(0, |entries| entries.len() as u64 + 1)
    }

    pub(crate) fn push(&self, entry: TraceEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    /// Snapshot of the entries recorded so far.
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries
            .lock()
            .map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the trace as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(&self.entries()).map_err(std::io::Error::other)?;
        std::fs::write(path, bytes)
    }
}

/// Cut `body` to at most [`MAX_TRACE_BODY_BYTES`] on a char boundary.
pub(crate) fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_TRACE_BODY_BYTES {
        return text.into_owned();
    }
    let mut cut = MAX_TRACE_BODY_BYTES;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [{} bytes truncated]", &text[..cut], text.len() - cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence: u64) -> TraceEntry {
        TraceEntry {
            sequence,
            request_id: RequestId::new(),
            method: "GET".into(),
            url: "http://localhost/v2/pet/1".into(),
            request_headers: vec![("api_key".into(), REDACTED.into())],
            request_body: TraceBody::Empty,
            status: Some(200),
            response_body: Some("{}".into()),
            elapsed_ms: 3,
            error: None,
        }
    }

    #[test]
    fn clones_share_the_buffer() {
        let recorder = TraceRecorder::new();
        let clone = recorder.clone();
        clone.push(entry(1));
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.next_sequence(), 2);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(MAX_TRACE_BODY_BYTES);
        let cut = truncate_body(body.as_bytes());
        assert!(cut.len() < body.len());
        assert!(cut.ends_with("bytes truncated]"));
        assert_eq!(truncate_body(b"short"), "short");
    }

    #[test]
    fn write_to_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces").join("1001-attempt1.json");
        let recorder = TraceRecorder::new();
        recorder.push(entry(1));
        recorder.write_to(&path).unwrap();
        let read: Vec<TraceEntry> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].request_headers[0].1, REDACTED);
    }
}
