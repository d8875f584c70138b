//! Caller-facing stream of text fragments

use super::decode::{FrameStream, StreamItem};
use crate::error::LlmuxResult;
use crate::pricing::UsageInfo;
use crate::response::Response;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// One text fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub text: String,
}

/// A finite, forward-only stream of [`StreamEvent`]s
///
/// Usage reports interleaved with the text are absorbed and merged, and the
/// text is accumulated so the stream can be turned into a [`Response`] once
/// drained. Dropping the stream releases the connection.
pub struct ResponseStream {
    inner: FrameStream,
    text: String,
    usage: Option<UsageInfo>,
    model: String,
    provider: String,
    prompt_chars: u64,
    finished: bool,
}

impl ResponseStream {
    pub fn new(
        inner: FrameStream,
        model: impl Into<String>,
        provider: impl Into<String>,
        prompt_chars: u64,
    ) -> Self {
        Self {
            inner,
            text: String::new(),
            usage: None,
            model: model.into(),
            provider: provider.into(),
            prompt_chars,
            finished: false,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Usage reported so far
    pub fn usage(&self) -> Option<&UsageInfo> {
        self.usage.as_ref()
    }

    /// Whether the underlying stream has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drain the remaining fragments and return the full response
    pub async fn finalize(mut self) -> LlmuxResult<Response> {
        while let Some(event) = self.next().await {
            event?;
        }
        Ok(self.into_response())
    }

    /// Convert what has been received so far into a response
    pub fn into_response(self) -> Response {
        Response {
            text: self.text,
            usage: self.usage,
            model: self.model,
            provider: self.provider,
            prompt_chars: self.prompt_chars,
        }
    }
}

impl Stream for ResponseStream {
    type Item = LlmuxResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        loop {
            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(StreamItem::Text(text)))) => {
                    this.text.push_str(&text);
                    return Poll::Ready(Some(Ok(StreamEvent { text })));
                }
                Poll::Ready(Some(Ok(StreamItem::Usage(usage)))) => {
                    this.usage.get_or_insert_with(UsageInfo::default).merge(usage);
                }
                Poll::Ready(Some(Err(err))) => return Poll::Ready(Some(Err(err))),
                Poll::Ready(None) => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl std::fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseStream")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("received_chars", &self.text.len())
            .field("finished", &self.finished)
            .finish()
    }
}
