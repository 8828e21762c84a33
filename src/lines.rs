//! In-memory copy of a line-oriented configuration file.
//!
//! Lines are kept as raw bytes and in file order, so text that is not valid
//! UTF-8 is written back unchanged.  Blocks are edited by position;
//! positions go stale after any insert or remove, so callers look them up
//! again after every structural edit.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::Path;

use crate::error::Result;

/// Ordered list of configuration lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStore {
    lines: Vec<OsString>,
}

impl LineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `path` line by line.  `\n` and `\r\n` terminators are stripped.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        let mut store = Self::new();
        store.load(split_lines(&content).map(|l| OsString::from_vec(l.to_vec())));
        Ok(store)
    }

    /// Replace the contents with `lines`, keeping their order.
    pub fn load<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.lines = lines.into_iter().map(Into::into).collect();
    }

    pub fn lines(&self) -> &[OsString] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&OsStr> {
        self.lines.get(index).map(OsString::as_os_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first line at or after `from` matching `pred`.
    pub fn find<P>(&self, from: usize, pred: P) -> Option<usize>
    where
        P: Fn(&OsStr) -> bool,
    {
        self.lines
            .get(from..)?
            .iter()
            .position(|l| pred(l))
            .map(|i| from + i)
    }

    /// Index of the last line matching `pred`.
    pub fn rfind<P>(&self, pred: P) -> Option<usize>
    where
        P: Fn(&OsStr) -> bool,
    {
        self.lines.iter().rposition(|l| pred(l))
    }

    /// Insert a header and its three data lines starting at `at`.
    /// `at == len()` appends.
    ///
    /// Panics if `at > len()`.
    pub fn insert_block(&mut self, at: usize, header: String, addr: String, router: String, dns: String) {
        self.lines.splice(at..at, [header, addr, router, dns].map(OsString::from));
    }

    /// Overwrite the three lines after the header at `header`.  The header
    /// line itself is left alone.  Data lines missing at the end of the
    /// store are appended.
    ///
    /// Panics if `header >= len()`.
    pub fn replace_block(&mut self, header: usize, addr: String, router: String, dns: String) {
        assert!(header < self.lines.len(), "block header {header} out of range");
        for (offset, line) in [addr, router, dns].into_iter().enumerate() {
            let idx = header + 1 + offset;
            match self.lines.get_mut(idx) {
                Some(slot) => *slot = line.into(),
                None => self.lines.push(line.into()),
            }
        }
    }

    /// Delete the four lines starting at `header` (fewer if the store ends
    /// first).
    ///
    /// Panics if `header >= len()`.
    pub fn remove_block(&mut self, header: usize) {
        assert!(header < self.lines.len(), "block header {header} out of range");
        let end = (header + 4).min(self.lines.len());
        self.lines.drain(header..end);
    }

    /// File content: every line followed by a newline.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out
    }
}

/// Split `content` into lines the way `BufRead::lines` does, on bytes.
fn split_lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = content.strip_suffix(b"\n").unwrap_or(content);
    let mut lines = body.split(|&b| b == b'\n');
    if content.is_empty() {
        // `split` yields one empty piece for empty input.
        lines.next();
    }
    lines.map(|l| l.strip_suffix(b"\r").unwrap_or(l))
}
