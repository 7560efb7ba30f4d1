//! Framing state machine.
//!
//! # States
//! - Header: buffering bytes until the header terminator appears
//! - Body: counting body bytes under the chosen [`BodyMode`]
//! - Complete: message length known and reached
//! - Stalled: the end can never be found (oversized header, unreadable chunk line)
//!
//! # State Transitions
//! ```text
//! Header → Body:      terminator found, body mode chosen from header fields
//! Header → Complete:  terminator found, no length signal (zero-length body)
//! Header → Stalled:   header_max exceeded without terminator
//! Body → Complete:    Fixed length reached, or terminal zero chunk seen
//! Body → Stalled:     chunk control line unreadable
//! ```
//!
//! Transitions only move forward. Once complete, every later feed reports the
//! same completion offset.

use crate::framing::chunked::{ChunkedScanner, ChunkedStep};
use crate::framing::header;

/// How the response body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No length signal seen (yet).
    Unknown,
    /// `Content-Length` body of this many bytes.
    Fixed(usize),
    /// Chunked transfer encoding.
    Chunked,
}

/// Observable framing progress for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramingState {
    pub header_complete: bool,
    /// Header length including the terminator (0 until found).
    pub header_len: usize,
    pub body_mode: BodyMode,
    /// Total bytes fed so far.
    pub consumed: usize,
    /// Total message length, once it is known.
    pub total_needed: Option<usize>,
}

impl Default for FramingState {
    fn default() -> Self {
        Self {
            header_complete: false,
            header_len: 0,
            body_mode: BodyMode::Unknown,
            consumed: 0,
            total_needed: None,
        }
    }
}

impl FramingState {
    /// Message length, if it is known and every byte of it has been fed.
    pub fn complete_at(&self) -> Option<usize> {
        self.total_needed.filter(|total| self.consumed >= *total)
    }
}

/// Answer to "has the response ended?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Incomplete,
    /// The message ends `at` bytes after the first response byte.
    Complete { at: usize },
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        matches!(self, Progress::Complete { .. })
    }
}

/// Incremental detector for the end of an HTTP/1.x response.
#[derive(Debug, Clone)]
pub struct FramingReconstructor {
    state: FramingState,
    header_buf: Vec<u8>,
    max_header_bytes: usize,
    chunked: ChunkedScanner,
    stalled: bool,
}

impl FramingReconstructor {
    pub const DEFAULT_MAX_HEADER_BYTES: usize = 64 * 1024;

    pub fn new(max_header_bytes: usize) -> Self {
        Self {
            state: FramingState::default(),
            header_buf: Vec::new(),
            max_header_bytes,
            chunked: ChunkedScanner::new(),
            stalled: false,
        }
    }

    /// Evaluate a whole buffer from a fresh state.
    pub fn scan(buf: &[u8]) -> Progress {
        Self::new(Self::DEFAULT_MAX_HEADER_BYTES).feed(buf)
    }

    pub fn state(&self) -> &FramingState {
        &self.state
    }

    /// True when no amount of further input can complete the message.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Feed the next bytes received from the backend.
    pub fn feed(&mut self, bytes: &[u8]) -> Progress {
        if let Some(at) = self.state.complete_at() {
            return Progress::Complete { at };
        }

        let start = self.state.consumed;
        self.state.consumed += bytes.len();

        if self.stalled {
            return Progress::Incomplete;
        }

        if self.state.header_complete {
            self.feed_body(bytes, start);
        } else {
            self.feed_header(bytes);
        }

        self.progress()
    }

    fn progress(&self) -> Progress {
        match self.state.complete_at() {
            Some(at) => Progress::Complete { at },
            None => Progress::Incomplete,
        }
    }

    fn feed_header(&mut self, bytes: &[u8]) {
        // The terminator may straddle the previous feed.
        let search_from = self.header_buf.len().saturating_sub(header::TERMINATOR.len() - 1);
        self.header_buf.extend_from_slice(bytes);

        let Some(pos) = header::find_terminator(&self.header_buf[search_from..]) else {
            if self.header_buf.len() > self.max_header_bytes {
                tracing::debug!(
                    buffered = self.header_buf.len(),
                    limit = self.max_header_bytes,
                    "Header terminator not found within limit"
                );
                self.stalled = true;
                self.header_buf = Vec::new();
            }
            return;
        };

        let header_len = search_from + pos + header::TERMINATOR.len();
        let body = self.header_buf.split_off(header_len);
        let header_region = std::mem::take(&mut self.header_buf);

        self.state.header_complete = true;
        self.state.header_len = header_len;

        if let Some(len) = header::content_length(&header_region) {
            self.state.body_mode = BodyMode::Fixed(len);
            self.state.total_needed = Some(header_len.saturating_add(len));
        } else if header::is_chunked(&header_region) {
            self.state.body_mode = BodyMode::Chunked;
            self.feed_body(&body, header_len);
        } else {
            // No length signal: the body is taken to be empty.
            self.state.total_needed = Some(header_len);
        }

        tracing::trace!(
            header_len,
            body_mode = ?self.state.body_mode,
            "Response header complete"
        );
    }

    /// `offset` is the stream position of `body[0]`.
    fn feed_body(&mut self, body: &[u8], offset: usize) {
        if self.state.body_mode != BodyMode::Chunked {
            return;
        }
        match self.chunked.advance(body) {
            ChunkedStep::NeedMore => {}
            ChunkedStep::Done { used } => {
                self.state.total_needed = Some(offset + used);
            }
            ChunkedStep::Invalid => {
                tracing::debug!(offset, "Unreadable chunk line in response body");
                self.stalled = true;
            }
        }
    }
}

impl Default for FramingReconstructor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_HEADER_BYTES)
    }
}
