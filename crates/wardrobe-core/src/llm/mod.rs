//! Vision-language requests against OpenAI-compatible endpoints.

mod client;
mod request;
pub mod retry;
mod transport;

pub(crate) use client::excerpt;
pub use client::{VisionClient, VisionOptions};
pub use request::{
    normalize_api_base, parse_chat_reply, ChatContent, ChatMessage, ChatRequest, ImageInput,
    ImageUrl,
};
pub use transport::{ChatTransport, HttpReply, HttpTransport};
