//! Line-oriented SSE decoder
//!
//! Each `data:` line is one frame. Providers differ in whether they separate
//! frames with blank lines, so frame boundaries are never inferred from them;
//! a blank line only clears the current `event:` name.

/// One `data:` line, with the `event:` name in effect when it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event: None,
            data: data.into(),
        }
    }

    pub fn with_event(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            data: data.into(),
        }
    }
}

/// Buffered decoder that handles lines and UTF-8 sequences split across
/// network chunks
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    /// Text after the last complete line
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence
    incomplete_utf8: Vec<u8>,
    event: Option<String>,
}

impl SseLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the frames completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        let bytes = if self.incomplete_utf8.is_empty() {
            chunk.to_vec()
        } else {
            let mut combined = std::mem::take(&mut self.incomplete_utf8);
            combined.extend_from_slice(chunk);
            combined
        };

        let (text, remainder) = decode_utf8_with_remainder(&bytes);
        self.incomplete_utf8 = remainder;
        self.buffer.push_str(&text);

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            self.process_line(line.trim_end_matches(['\n', '\r']), &mut frames);
        }
        frames
    }

    /// Flush a final line that had no trailing newline
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        if !self.incomplete_utf8.is_empty() {
            let tail = std::mem::take(&mut self.incomplete_utf8);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let rest = std::mem::take(&mut self.buffer);
        for line in rest.lines() {
            self.process_line(line.trim_end_matches('\r'), &mut frames);
        }
        frames
    }

    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty() || !self.incomplete_utf8.is_empty()
    }

    fn process_line(&mut self, line: &str, frames: &mut Vec<SseFrame>) {
        if line.is_empty() {
            self.event = None;
            return;
        }
        if line.starts_with(':') {
            return;
        }
        if let Some(value) = line.strip_prefix("data:") {
            let data = value.strip_prefix(' ').unwrap_or(value);
            frames.push(SseFrame {
                event: self.event.clone(),
                data: data.to_string(),
            });
        } else if let Some(value) = line.strip_prefix("event:") {
            self.event = Some(value.trim().to_string());
        }
        // id:, retry: and unprefixed lines carry nothing we use
    }
}

/// Decode bytes as UTF-8, returning the valid text and any trailing bytes of
/// an incomplete character
fn decode_utf8_with_remainder(bytes: &[u8]) -> (String, Vec<u8>) {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return (s.to_string(), Vec::new());
    }

    let mut valid_end = bytes.len();
    for i in 1..=4.min(bytes.len()) {
        let pos = bytes.len() - i;
        let byte = bytes[pos];
        if !is_continuation_byte(byte) {
            if bytes.len() - pos < utf8_char_len(byte) {
                valid_end = pos;
            }
            break;
        }
    }

    match std::str::from_utf8(&bytes[..valid_end]) {
        Ok(s) => (s.to_string(), bytes[valid_end..].to_vec()),
        Err(e) => {
            // Invalid bytes in the middle of the chunk: keep what decodes and
            // replace the rest rather than stalling the stream
            let valid_up_to = e.valid_up_to();
            tracing::warn!(
                valid_up_to,
                "invalid UTF-8 in stream chunk, replacing {} bytes",
                valid_end - valid_up_to
            );
            let lossy = String::from_utf8_lossy(&bytes[..valid_end]).into_owned();
            (lossy, bytes[valid_end..].to_vec())
        }
    }
}

#[inline]
fn is_continuation_byte(byte: u8) -> bool {
    (byte & 0b1100_0000) == 0b1000_0000
}

#[inline]
fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte & 0b1000_0000 == 0 {
        1
    } else if first_byte & 0b1110_0000 == 0b1100_0000 {
        2
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        3
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        4
    } else {
        1
    }
}
