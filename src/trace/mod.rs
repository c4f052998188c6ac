//! Span decoration and `tracing` subscriber wiring.
//!
//! - [`default_tags`]: Processor that stamps default tags onto starting spans
//! - [`subscriber`]: fmt, OpenTelemetry and log-bridge layers

pub mod default_tags;
pub mod subscriber;

pub use default_tags::{
    add_default_tags, add_default_tags_from_config, DefaultTagsProcessor, SpanPredicate, SpanStart,
    DEFAULT_TAGS_SECTION,
};
pub use subscriber::init_subscriber;
