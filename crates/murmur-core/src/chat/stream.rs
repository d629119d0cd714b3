//! Incremental decoding of a chat turn body into display text.
//!
//! Raw byte chunks are decoded as UTF-8 (a code point split across two
//! chunks is carried over to the next one), appended to a cumulative
//! buffer, and the marker parser is re-run over the whole buffer after each
//! chunk. The resulting [`StreamUpdate`]s are consumed by the conversation,
//! which applies them to its assistant placeholder.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use murmur_types::error::ApiError;

use crate::api::ChunkStream;
use crate::marker::{self, Stripped};

/// Streaming UTF-8 decoder that tolerates code points split across chunks.
///
/// Invalid sequences are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as possible.
    ///
    /// A trailing incomplete sequence is kept for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = rest.to_vec();
        out
    }

    /// Flush whatever is left at end of stream.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let out = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        out
    }
}

/// Progress of a single streamed reply.
#[derive(Debug)]
pub enum StreamUpdate {
    /// The cumulative display text grew. Markers are already stripped.
    Partial(String),
    /// The body ended normally; `stripped` is the final pass over the whole buffer.
    Completed(Stripped),
    /// The body failed mid-way. `display_text` is what had been shown so far.
    Failed {
        display_text: String,
        error: ApiError,
    },
}

/// Turn a chunk stream into display updates.
///
/// Emits one `Partial` per chunk that adds text, then exactly one terminal
/// `Completed` or `Failed`.
pub fn consume(
    chunks: ChunkStream,
) -> Pin<Box<dyn Stream<Item = StreamUpdate> + Send + 'static>> {
    Box::pin(async_stream::stream! {
        let mut chunks = chunks;
        let mut decoder = Utf8ChunkDecoder::new();
        let mut raw = String::new();
        let mut shown = String::new();
        let mut chunk_count: usize = 0;

        while let Some(next) = chunks.next().await {
            let bytes = match next {
                Ok(bytes) => bytes,
                Err(error) => {
                    warn!(error = %error, chunks = chunk_count, "Reply stream ended early");
                    yield StreamUpdate::Failed { display_text: shown, error };
                    return;
                }
            };
            chunk_count += 1;

            let text = decoder.decode(&bytes);
            if text.is_empty() {
                continue;
            }
            raw.push_str(&text);
            shown = marker::strip(&raw).display_text;
            yield StreamUpdate::Partial(shown.clone());
        }

        raw.push_str(&decoder.finish());
        let stripped = marker::strip(&raw);
        debug!(
            chunks = chunk_count,
            bytes = raw.len(),
            references = stripped.reference_ids.len(),
            "Reply stream complete"
        );
        yield StreamUpdate::Completed(stripped);
    })
}
