//! Readable image sources

use crate::error::{LlmuxError, LlmuxResult};
use parking_lot::Mutex;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

enum ReaderState {
    Unread(Box<dyn Read + Send>),
    Read(Arc<[u8]>),
}

/// A caller-supplied reader that yields image bytes
///
/// The reader is drained at most once. Its bytes are cached so the same part
/// can be encoded again, for example when a conversation is resent.
#[derive(Clone)]
pub struct ImageReader {
    state: Arc<Mutex<ReaderState>>,
}

impl ImageReader {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(ReaderState::Unread(Box::new(reader)))),
        }
    }

    /// Read the remaining bytes, or return the cached bytes of an earlier read
    pub fn read_all(&self) -> LlmuxResult<Arc<[u8]>> {
        let mut state = self.state.lock();
        if let ReaderState::Unread(reader) = &mut *state {
            let mut buf = Vec::new();
            reader
                .read_to_end(&mut buf)
                .map_err(|e| LlmuxError::io(format!("Failed to read image stream: {}", e)))?;
            *state = ReaderState::Read(buf.into());
        }
        match &*state {
            ReaderState::Read(bytes) => Ok(Arc::clone(bytes)),
            ReaderState::Unread(_) => Err(LlmuxError::io("Image stream was not read")),
        }
    }

    /// Whether the underlying reader has already been drained
    pub fn is_consumed(&self) -> bool {
        matches!(&*self.state.lock(), ReaderState::Read(_))
    }
}

impl PartialEq for ImageReader {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for ImageReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageReader")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}
