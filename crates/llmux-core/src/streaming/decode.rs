//! Lazy decoding of a response byte stream

use super::frames::{FrameAction, FrameParser};
use super::sse::{SseFrame, SseLineDecoder};
use crate::error::{LlmuxError, LlmuxResult};
use crate::pricing::UsageInfo;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// One decoded element of a provider stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// A text fragment, in arrival order
    Text(String),
    /// A usage report; several may arrive and are merged by the consumer
    Usage(UsageInfo),
}

/// Decoded provider stream
pub type FrameStream = Pin<Box<dyn Stream<Item = LlmuxResult<StreamItem>> + Send>>;

struct Decoding<B, P> {
    bytes: BoxStream<'static, Result<B, LlmuxError>>,
    lines: SseLineDecoder,
    parser: P,
    pending: VecDeque<LlmuxResult<StreamItem>>,
    provider: String,
    /// No more bytes will be read
    exhausted: bool,
}

enum DecodeState<B, P> {
    Streaming(Decoding<B, P>),
    Finished,
}

impl<B, P: FrameParser> Decoding<B, P> {
    fn handle(&mut self, frames: Vec<SseFrame>) {
        for frame in frames {
            match self.parser.parse(&frame) {
                FrameAction::Emit(items) => self.pending.extend(items.into_iter().map(Ok)),
                FrameAction::Skip => {}
                FrameAction::Malformed(reason) => {
                    tracing::warn!(
                        provider = %self.provider,
                        reason = %reason,
                        "skipping malformed stream frame"
                    );
                }
                FrameAction::Done => {
                    self.exhausted = true;
                    return;
                }
                FrameAction::Fail(err) => {
                    self.pending.push_back(Err(err));
                    self.exhausted = true;
                    return;
                }
            }
        }
    }
}

fn attribute(err: LlmuxError, provider: &str) -> LlmuxError {
    match err {
        LlmuxError::Transport {
            message,
            provider: None,
        } => LlmuxError::transport_with_provider(message, provider),
        other => other,
    }
}

/// Decode a server-push byte stream with the given frame parser
///
/// Nothing is read until the returned stream is polled, and each poll reads
/// at most as many chunks as it takes to produce one item. Malformed frames
/// are skipped; a transport error or an in-band failure ends the stream
/// after being yielded once.
pub fn decode_stream<S, B, E, P>(bytes: S, parser: P, provider: impl Into<String>) -> FrameStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<LlmuxError> + 'static,
    P: FrameParser,
{
    let decoding = Decoding {
        bytes: bytes.map(|chunk| chunk.map_err(Into::into)).boxed(),
        lines: SseLineDecoder::new(),
        parser,
        pending: VecDeque::new(),
        provider: provider.into(),
        exhausted: false,
    };

    let stream = stream::unfold(DecodeState::Streaming(decoding), |state| async move {
        let DecodeState::Streaming(mut decoding) = state else {
            return None;
        };

        loop {
            if let Some(item) = decoding.pending.pop_front() {
                let next = if item.is_err() {
                    DecodeState::Finished
                } else {
                    DecodeState::Streaming(decoding)
                };
                return Some((item, next));
            }
            if decoding.exhausted {
                return None;
            }

            match decoding.bytes.next().await {
                Some(Ok(chunk)) => {
                    let frames = decoding.lines.feed(chunk.as_ref());
                    decoding.handle(frames);
                }
                Some(Err(err)) => {
                    let err = attribute(err, &decoding.provider);
                    return Some((Err(err), DecodeState::Finished));
                }
                None => {
                    let frames = decoding.lines.finish();
                    decoding.handle(frames);
                    decoding.exhausted = true;
                }
            }
        }
    });

    Box::pin(stream)
}
