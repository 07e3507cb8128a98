//! Network-facing capabilities: the chat proxy, the health pinger and the upstream model router.

mod chat_proxy;
mod health_pinger;
mod model_router;

#[cfg(test)]
mod test_support;

pub use chat_proxy::{ChatProxy, ChatTransport, HttpChatTransport, UpstreamError, MAX_ATTEMPTS};
pub use health_pinger::{HealthPinger, PingerHandle};
pub use model_router::{LlmMode, ModelError, ModelRouter};
