//! Server-Sent Events decoding for upstream responses.

use futures_util::{Stream, StreamExt};
use tandem_error::{ProviderError, ProviderErrorKind};

/// Incremental SSE decoder yielding the `data` payload of each event.
///
/// Bytes may be fed in arbitrary slices; an event is emitted once its
/// terminating blank line has arrived. Multiple `data:` lines in one event are
/// joined with `\n`. Comments and non-data fields are ignored.
///
/// # Examples
///
/// ```
/// use tandem_models::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.feed(b"data: {\"a\"").unwrap().is_empty());
/// assert_eq!(decoder.feed(b":1}\n\n").unwrap(), vec!["{\"a\":1}".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed raw bytes, returning every event completed by them.
    ///
    /// # Errors
    ///
    /// Returns a stream error if a complete line is not valid UTF-8.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.buffer.extend_from_slice(bytes);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = std::str::from_utf8(&raw).map_err(|e| {
                ProviderError::new(ProviderErrorKind::Stream(format!("Invalid UTF-8: {}", e)))
            })?;
            let line = line.trim_end_matches(['\r', '\n']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }

        Ok(events)
    }

    /// Flush an event left open when the body ended without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if let Ok(line) = std::str::from_utf8(&self.buffer) {
            let line = line.trim_end_matches('\r');
            if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
            }
        }
        self.buffer.clear();

        if self.data.is_empty() {
            None
        } else {
            let event = self.data.join("\n");
            self.data.clear();
            Some(event)
        }
    }
}

/// Turn a streaming HTTP response into its SSE `data` payloads.
pub(crate) fn data_frames(
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, ProviderError>> + Send {
    async_stream::try_stream! {
        let mut decoder = SseDecoder::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                ProviderError::new(ProviderErrorKind::Stream(e.to_string()))
            })?;
            for frame in decoder.feed(&chunk)? {
                yield frame;
            }
        }

        if let Some(frame) = decoder.finish() {
            yield frame;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_events_in_one_feed() {
        let mut decoder = SseDecoder::default();
        let events = decoder
            .feed(b"data: one\n\ndata: two\n\ndata: thr")
            .expect("valid utf-8");
        assert_eq!(events, vec!["one", "two"]);
        assert_eq!(decoder.feed(b"ee\n\n").expect("valid utf-8"), vec!["three"]);
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut decoder = SseDecoder::default();
        let events = decoder
            .feed(b": keep-alive\r\nevent: message\r\ndata: hi\r\n\r\n")
            .expect("valid utf-8");
        assert_eq!(events, vec!["hi"]);
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut decoder = SseDecoder::default();
        let events = decoder
            .feed(b"data: a\ndata: b\n\n")
            .expect("valid utf-8");
        assert_eq!(events, vec!["a\nb"]);
    }

    #[test]
    fn test_utf8_split_across_feeds() {
        let bytes = "data: héllo\n\n".as_bytes();
        let split = bytes.iter().position(|b| *b == 0xC3).expect("multibyte char") + 1;
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(&bytes[..split]).expect("no full line").is_empty());
        assert_eq!(decoder.feed(&bytes[split..]).expect("valid utf-8"), vec!["héllo"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b"data: last").expect("valid utf-8").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("last"));
        assert_eq!(decoder.finish(), None);
    }
}
