//! Typed API address: fixed path, encoded path segments, query pairs.

use std::fmt;

/// Relative API endpoint. Segments are percent-encoded by the HTTP adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Appends one path segment (e.g. a group code or an id).
    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Path with segments appended, no query.
    pub fn full_path(&self) -> String {
        let mut out = self.path.trim_end_matches('/').to_string();
        for s in &self.segments {
            out.push('/');
            out.push_str(s);
        }
        out
    }
}

/// Unencoded `path/segments?k=v&...` form, used in logs and by the mock API.
impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, k, v)?;
        }
        Ok(())
    }
}
