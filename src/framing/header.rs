//! Header-region scanning.
//!
//! Only the two fields that decide where a message ends are looked at.
//! Field names are matched case-sensitively, exactly as the backends emit them.

/// The blank line that ends an HTTP/1.x header block.
pub const TERMINATOR: &[u8] = b"\r\n\r\n";

const CONTENT_LENGTH: &[u8] = b"Content-Length";
const TRANSFER_ENCODING: &[u8] = b"Transfer-Encoding";

/// Offset of the first header terminator in `buf`.
pub fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len()).position(|w| w == TERMINATOR)
}

/// Value of the first field called `name`, with surrounding whitespace removed.
///
/// The start line is skipped.
pub fn field_value<'a>(header: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
    header
        .split(|&b| b == b'\n')
        .skip(1)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find_map(|line| {
            line.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix(b":"))
                .map(<[u8]>::trim_ascii)
        })
}

/// Declared body length, if present and a non-negative integer.
pub fn content_length(header: &[u8]) -> Option<usize> {
    let value = field_value(header, CONTENT_LENGTH)?;
    std::str::from_utf8(value).ok()?.parse().ok()
}

/// Whether the header announces chunked transfer encoding.
pub fn is_chunked(header: &[u8]) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    field_value(header, TRANSFER_ENCODING)
        .map(|value| {
            value
                .windows(CHUNKED.len())
                .any(|w| w.eq_ignore_ascii_case(CHUNKED))
        })
        .unwrap_or(false)
}
