//! llmux core library
//!
//! One call shape for Anthropic, Google Gemini, OpenAI and OpenAI-compatible
//! chat APIs. Caller input is normalized into canonical [`Message`]s, the
//! [`ProviderRegistry`] picks an adapter from the model name, and the reply
//! comes back as a [`Response`] or a lazily decoded [`ResponseStream`].
//! Every response can be priced with the built-in [`pricing`] catalog.
//!
//! # Examples
//!
//! ```no_run
//! use llmux_core::{ChatRequest, Llmux, image};
//!
//! # async fn example() -> llmux_core::LlmuxResult<()> {
//! let client = Llmux::from_env()?;
//!
//! let reply = client.prompt("Write a haiku about Rust").await?;
//! println!("{reply}");
//!
//! let request = ChatRequest::new()
//!     .with_model("gemini-2.5-flash")
//!     .with_content(vec![
//!         llmux_core::text("What is in this picture?"),
//!         image("photo.jpg", None, None)?,
//!     ]);
//! let reply = client.chat(request).await?;
//! if let Some(cost) = reply.cost() {
//!     println!("{} (${cost:.6})", reply.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod message;
pub mod options;
pub mod pricing;
pub mod provider;
pub mod registry;
pub mod response;
pub mod streaming;

pub use client::{CallOutput, ChatRequest, Llmux};
pub use config::{ClientConfig, EnvSource, MapEnv, ProcessEnv, TimeoutConfig};
pub use content::{
    Content, ContentItem, ContentPart, ImageInput, ImagePart, ImageReader, ImageSource,
    SourceKind, image, normalize_to_parts, text,
};
pub use error::{LlmuxError, LlmuxResult};
pub use message::{ImageEntry, Message, MessageInput, NormalizeInput, Role, normalize_messages};
pub use options::{CallOptions, GenerationOptions};
pub use pricing::{CostEstimate, PricingSource, UsageInfo, estimate_cost, lookup_pricing};
pub use provider::{Provider, ProviderContext, ProviderRequest, ProviderResponse};
pub use registry::ProviderRegistry;
pub use response::Response;
pub use streaming::{ResponseStream, StreamEvent};
