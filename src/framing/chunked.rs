//! Incremental chunked transfer-encoding scanner.
//!
//! Walks the body one slice at a time without retaining chunk data. Only the
//! current control line (size line, data terminator, trailer line) is buffered.
//!
//! ```text
//! SizeLine ──size>0──▶ Data ──▶ DataEnd ──▶ SizeLine
//!     │
//!     └──size=0──▶ Trailer ──empty line──▶ Done
//! ```

/// Longest control line accepted before the body is declared unreadable.
const MAX_LINE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    SizeLine,
    Data { remaining: usize },
    DataEnd,
    Trailer,
    Done,
    Invalid,
}

/// Result of advancing the scanner over one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkedStep {
    /// The body continues past this slice.
    NeedMore,
    /// The body ended after `used` bytes of this slice.
    Done { used: usize },
    /// A control line could not be read; the end can never be found.
    Invalid,
}

#[derive(Debug, Clone)]
pub struct ChunkedScanner {
    phase: Phase,
    line: Vec<u8>,
    body_len: usize,
    chunks: usize,
}

impl Default for ChunkedScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedScanner {
    pub fn new() -> Self {
        Self {
            phase: Phase::SizeLine,
            line: Vec::new(),
            body_len: 0,
            chunks: 0,
        }
    }

    /// Body bytes scanned so far, framing included.
    pub fn body_len(&self) -> usize {
        self.body_len
    }

    /// Data chunks resolved so far (the terminal zero chunk excluded).
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn advance(&mut self, input: &[u8]) -> ChunkedStep {
        let mut pos = 0;
        loop {
            match self.phase {
                Phase::Done => {
                    self.body_len += pos;
                    return ChunkedStep::Done { used: pos };
                }
                Phase::Invalid => return ChunkedStep::Invalid,
                _ if pos == input.len() => {
                    self.body_len += pos;
                    return ChunkedStep::NeedMore;
                }
                Phase::Data { remaining } => {
                    let take = remaining.min(input.len() - pos);
                    pos += take;
                    self.phase = match remaining - take {
                        0 => Phase::DataEnd,
                        left => Phase::Data { remaining: left },
                    };
                }
                Phase::SizeLine | Phase::DataEnd | Phase::Trailer => {
                    let rest = &input[pos..];
                    match rest.iter().position(|&b| b == b'\n') {
                        Some(i) => {
                            self.line.extend_from_slice(&rest[..i]);
                            pos += i + 1;
                            let line = std::mem::take(&mut self.line);
                            self.phase = self.on_line(strip_cr(&line));
                        }
                        None => {
                            if self.line.len() + rest.len() > MAX_LINE {
                                self.phase = Phase::Invalid;
                                continue;
                            }
                            self.line.extend_from_slice(rest);
                            pos = input.len();
                        }
                    }
                }
            }
        }
    }

    fn on_line(&mut self, line: &[u8]) -> Phase {
        match self.phase {
            Phase::SizeLine => match parse_size(line) {
                Some(0) => Phase::Trailer,
                Some(size) => {
                    self.chunks += 1;
                    Phase::Data { remaining: size }
                }
                None => Phase::Invalid,
            },
            Phase::DataEnd if line.is_empty() => Phase::SizeLine,
            Phase::DataEnd => Phase::Invalid,
            Phase::Trailer if line.is_empty() => Phase::Done,
            Phase::Trailer => Phase::Trailer,
            other => other,
        }
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Hexadecimal chunk size; extensions after `;` are ignored.
fn parse_size(line: &[u8]) -> Option<usize> {
    let digits = line.split(|&b| b == b';').next()?.trim_ascii();
    if digits.is_empty() {
        return None;
    }
    usize::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}
