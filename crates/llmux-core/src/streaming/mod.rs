//! Server-push stream decoding
//!
//! Raw response bytes pass through three layers:
//! - [`SseLineDecoder`] splits bytes into `data:` frames
//! - a [`FrameParser`] turns one frame into text fragments and usage updates
//! - [`decode_stream`] drives both lazily, pulling the next chunk only when
//!   the consumer asks for the next item
//!
//! [`ResponseStream`] wraps the result for callers.

mod decode;
mod frames;
mod response_stream;
mod sse;

pub use decode::{FrameStream, StreamItem, decode_stream};
pub use frames::{AnthropicFrames, FrameAction, FrameParser, GoogleFrames, OpenAiFrames};
pub use response_stream::{ResponseStream, StreamEvent};
pub use sse::{SseFrame, SseLineDecoder};
