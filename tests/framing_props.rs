//! Property tests for response framing.

use proptest::prelude::*;
use topic_proxy::framing::{FramingReconstructor, Progress};

fn content_length_message(body: &[u8]) -> Vec<u8> {
    let mut message = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
    message.extend_from_slice(body);
    message
}

fn chunked_message(chunks: &[Vec<u8>]) -> Vec<u8> {
    let mut message = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for chunk in chunks.iter().filter(|c| !c.is_empty()) {
        message.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        message.extend_from_slice(chunk);
        message.extend_from_slice(b"\r\n");
    }
    message.extend_from_slice(b"0\r\n\r\n");
    message
}

/// Feed `message` split at `cuts`, returning the progress after each piece.
fn feed_split(message: &[u8], cuts: &[usize]) -> Vec<Progress> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (message.len() + 1)).collect();
    points.push(0);
    points.push(message.len());
    points.sort_unstable();
    points.dedup();

    let mut framer = FramingReconstructor::new(FramingReconstructor::DEFAULT_MAX_HEADER_BYTES);
    points
        .windows(2)
        .map(|w| framer.feed(&message[w[0]..w[1]]))
        .collect()
}

fn assert_frames(message: &[u8], cuts: &[usize]) -> Result<(), TestCaseError> {
    let progress = feed_split(message, cuts);
    let last = progress.last().copied().unwrap_or(Progress::Incomplete);
    prop_assert_eq!(last, Progress::Complete { at: message.len() });
    // Completion is only reported on the final piece.
    for p in &progress[..progress.len() - 1] {
        prop_assert!(!p.is_complete());
    }
    Ok(())
}

proptest! {
    #[test]
    fn content_length_completes_regardless_of_split(
        body in proptest::collection::vec(any::<u8>(), 0..512),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        assert_frames(&content_length_message(&body), &cuts)?;
    }

    #[test]
    fn chunked_completes_regardless_of_split(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..6),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        assert_frames(&chunked_message(&chunks), &cuts)?;
    }

    #[test]
    fn strict_prefix_is_incomplete(
        body in proptest::collection::vec(any::<u8>(), 1..256),
        cut in any::<usize>(),
    ) {
        let message = content_length_message(&body);
        let prefix = &message[..cut % message.len()];
        prop_assert_eq!(FramingReconstructor::scan(prefix), Progress::Incomplete);
    }
}
