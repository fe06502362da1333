//! Overlay relay: the per-site runtime bridging page observation and the
//! translation channel.
mod adapter;
mod relay;

pub use adapter::{MarkerSiteAdapter, SiteChatAdapter};
pub use relay::SiteTranslatorRelay;
