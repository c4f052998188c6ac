use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{Span as _, SpanContext, SpanKind, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{Span, SpanData, SpanProcessor};
use tracing::debug;

use crate::config::ConfigSection;
use crate::otlp::TracePipeline;

/// Default configuration section for default span tags.
pub const DEFAULT_TAGS_SECTION: &str = "OpenTelemetry:Traces:DefaultTags";

/// What a predicate gets to see of a span that is starting.
#[derive(Debug)]
pub struct SpanStart<'a> {
    name: &'a str,
    kind: &'a SpanKind,
    parent: &'a SpanContext,
}

impl SpanStart<'_> {
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn kind(&self) -> &SpanKind {
        self.kind
    }

    pub fn parent_span_context(&self) -> &SpanContext {
        self.parent
    }

    /// Whether the span's parent lives in this process.
    pub fn has_local_parent(&self) -> bool {
        self.parent.is_valid() && !self.parent.is_remote()
    }

    /// A span without a local parent, i.e. the first span of this process
    /// for its trace.
    pub fn is_root(&self) -> bool {
        !self.has_local_parent()
    }
}

pub type SpanPredicate = Arc<dyn Fn(&SpanStart<'_>) -> bool + Send + Sync>;

fn root_spans_only() -> SpanPredicate {
    Arc::new(|span: &SpanStart<'_>| span.is_root())
}

/// Span processor that stamps a fixed set of tags onto starting spans.
///
/// By default only root spans are tagged, so each tag appears once per
/// trace rather than on every nested span. Any number of these processors
/// can be attached to one pipeline, each with its own predicate.
#[derive(Clone)]
pub struct DefaultTagsProcessor {
    tags: Arc<[KeyValue]>,
    should_add: SpanPredicate,
}

impl DefaultTagsProcessor {
    /// Tag root spans with `tags`.
    pub fn new<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        Self::with_optional_predicate(tags, None)
    }

    /// Tag spans for which `should_add` returns true.
    pub fn with_predicate<I, F>(tags: I, should_add: F) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
        F: Fn(&SpanStart<'_>) -> bool + Send + Sync + 'static,
    {
        let should_add: SpanPredicate = Arc::new(should_add);
        Self::with_optional_predicate(tags, Some(should_add))
    }

    /// `None` falls back to tagging root spans.
    pub fn with_optional_predicate<I>(tags: I, should_add: Option<SpanPredicate>) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        Self {
            tags: tags.into_iter().collect(),
            should_add: should_add.unwrap_or_else(root_spans_only),
        }
    }

    pub fn tags(&self) -> &[KeyValue] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl fmt::Debug for DefaultTagsProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultTagsProcessor")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

impl SpanProcessor for DefaultTagsProcessor {
    fn on_start(&self, span: &mut Span, cx: &Context) {
        if self.tags.is_empty() {
            return;
        }

        // Non-recording spans have nothing to tag.
        let Some(data) = span.exported_data() else {
            return;
        };

        let parent = cx.span();
        let start = SpanStart {
            name: data.name.as_ref(),
            kind: &data.span_kind,
            parent: parent.span_context(),
        };

        if !(self.should_add)(&start) {
            return;
        }

        for tag in self.tags.iter() {
            span.set_attribute(tag.clone());
        }
    }

    fn on_end(&self, _span: SpanData) {}

    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
        Ok(())
    }
}

/// Attach a processor that adds `tags` to spans matching `predicate` (root
/// spans when `None`). An empty tag list attaches nothing.
pub fn add_default_tags<I>(
    pipeline: &mut dyn TracePipeline,
    predicate: Option<SpanPredicate>,
    tags: I,
) where
    I: IntoIterator<Item = KeyValue>,
{
    let processor = DefaultTagsProcessor::with_optional_predicate(tags, predicate);
    if processor.is_empty() {
        debug!("No default span tags to add");
        return;
    }

    debug!(tag_count = processor.tags().len(), "Adding default span tags");
    pipeline.add_default_tags_processor(processor);
}

/// Read default tags from configuration: every child of the section that
/// has a value becomes one string tag.
///
/// `section_name` defaults to [`DEFAULT_TAGS_SECTION`]; `Some("")` reads the
/// root of `config`.
pub fn add_default_tags_from_config(
    pipeline: &mut dyn TracePipeline,
    config: &ConfigSection,
    section_name: Option<&str>,
    predicate: Option<SpanPredicate>,
) {
    let section = config.section_or_root(Some(section_name.unwrap_or(DEFAULT_TAGS_SECTION)));

    let tags: Vec<KeyValue> = section
        .children()
        .filter_map(|child| {
            child
                .value()
                .map(|value| KeyValue::new(child.key().to_string(), value.to_string()))
        })
        .collect();

    add_default_tags(pipeline, predicate, tags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{
        SpanId, TraceFlags, TraceId, TraceState, Tracer, TracerProvider as _,
    };
    use opentelemetry_sdk::trace::{
        InMemorySpanExporter, InMemorySpanExporterBuilder, SdkTracerProvider,
    };

    use crate::testing::RecordingPipeline;

    fn provider_with(processors: Vec<DefaultTagsProcessor>) -> (SdkTracerProvider, InMemorySpanExporter) {
        let exporter = InMemorySpanExporterBuilder::new().build();
        let mut builder = SdkTracerProvider::builder();
        for processor in processors {
            builder = builder.with_span_processor(processor);
        }
        let provider = builder.with_simple_exporter(exporter.clone()).build();
        (provider, exporter)
    }

    fn tag(span: &SpanData, key: &str) -> Option<String> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    fn finished(exporter: &InMemorySpanExporter, name: &str) -> SpanData {
        exporter
            .get_finished_spans()
            .unwrap()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap()
    }

    fn tags() -> Vec<KeyValue> {
        vec![
            KeyValue::new("unit-tests.tag1", "value1"),
            KeyValue::new("unit-tests.tag2", "value2"),
        ]
    }

    #[test]
    fn tags_root_span() {
        let (provider, exporter) = provider_with(vec![DefaultTagsProcessor::new(tags())]);
        let tracer = provider.tracer("default-tags");

        drop(tracer.start("root"));

        let span = finished(&exporter, "root");
        assert_eq!(tag(&span, "unit-tests.tag1").as_deref(), Some("value1"));
        assert_eq!(tag(&span, "unit-tests.tag2").as_deref(), Some("value2"));
    }

    #[test]
    fn does_not_tag_child_span() {
        let (provider, exporter) = provider_with(vec![DefaultTagsProcessor::new(tags())]);
        let tracer = provider.tracer("default-tags");

        tracer.in_span("parent", |cx| {
            drop(tracer.start_with_context("child", &cx));
        });

        let parent = finished(&exporter, "parent");
        let child = finished(&exporter, "child");
        assert_eq!(tag(&parent, "unit-tests.tag1").as_deref(), Some("value1"));
        assert!(child.attributes.is_empty());
    }

    #[test]
    fn span_with_remote_parent_counts_as_root() {
        let (provider, exporter) = provider_with(vec![DefaultTagsProcessor::new(tags())]);
        let tracer = provider.tracer("default-tags");
        let remote = SpanContext::new(
            TraceId::from_bytes([1; 16]),
            SpanId::from_bytes([2; 8]),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(remote);

        drop(tracer.start_with_context("server", &cx));

        let span = finished(&exporter, "server");
        assert_eq!(tag(&span, "unit-tests.tag1").as_deref(), Some("value1"));
    }

    #[test]
    fn predicates_select_matching_kinds_only() {
        let client = DefaultTagsProcessor::with_predicate(
            [KeyValue::new("unit-tests.tag1", "value1")],
            |span| *span.kind() == SpanKind::Client,
        );
        let consumer = DefaultTagsProcessor::with_predicate(
            [KeyValue::new("unit-tests.tag2", "value2")],
            |span| *span.kind() == SpanKind::Consumer,
        );
        let (provider, exporter) = provider_with(vec![client, consumer]);
        let tracer = provider.tracer("default-tags");

        for (name, kind) in [
            ("client", SpanKind::Client),
            ("consumer", SpanKind::Consumer),
            ("server", SpanKind::Server),
        ] {
            drop(tracer.span_builder(name).with_kind(kind).start(&tracer));
        }

        let client = finished(&exporter, "client");
        assert_eq!(tag(&client, "unit-tests.tag1").as_deref(), Some("value1"));
        assert_eq!(tag(&client, "unit-tests.tag2"), None);

        let consumer = finished(&exporter, "consumer");
        assert_eq!(tag(&consumer, "unit-tests.tag2").as_deref(), Some("value2"));
        assert_eq!(tag(&consumer, "unit-tests.tag1"), None);

        let server = finished(&exporter, "server");
        assert!(server.attributes.is_empty());
    }

    #[test]
    fn typed_values_are_kept() {
        let processor = DefaultTagsProcessor::new([
            KeyValue::new("deployment.replica", 3_i64),
            KeyValue::new("deployment.canary", true),
        ]);
        let (provider, exporter) = provider_with(vec![processor]);
        let tracer = provider.tracer("default-tags");

        drop(tracer.start("root"));

        let span = finished(&exporter, "root");
        let replica = span
            .attributes
            .iter()
            .find(|kv| kv.key.as_str() == "deployment.replica")
            .unwrap();
        assert_eq!(replica.value, opentelemetry::Value::I64(3));
    }

    #[test]
    fn tags_concurrently_started_spans() {
        let (provider, exporter) = provider_with(vec![DefaultTagsProcessor::new(tags())]);
        let tracer = provider.tracer("default-tags");

        std::thread::scope(|scope| {
            for i in 0..8 {
                let tracer = &tracer;
                scope.spawn(move || drop(tracer.start(format!("root-{i}"))));
            }
        });

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 8);
        assert!(spans
            .iter()
            .all(|span| tag(span, "unit-tests.tag2").as_deref() == Some("value2")));
    }

    #[test]
    fn from_config_reads_default_section() {
        let config = ConfigSection::from_pairs([
            ("OpenTelemetry:Traces:DefaultTags:unit-tests.tag1", "value1"),
            ("OpenTelemetry:Traces:DefaultTags:unit-tests.tag2", "value2"),
        ]);
        let mut pipeline = RecordingPipeline::default();

        add_default_tags_from_config(&mut pipeline, &config, None, None);

        assert_eq!(pipeline.processors.len(), 1);
        assert_eq!(pipeline.processors[0].tags(), tags().as_slice());
    }

    #[test]
    fn from_config_reads_custom_and_root_sections() {
        let custom = ConfigSection::from_pairs([("MyTags:unit-tests.tag1", "value1")]);
        let root = ConfigSection::from_pairs([("unit-tests.tag2", "value2")]);
        let mut pipeline = RecordingPipeline::default();

        add_default_tags_from_config(&mut pipeline, &custom, Some("MyTags"), None);
        add_default_tags_from_config(&mut pipeline, &root, Some(""), None);

        assert_eq!(pipeline.processors.len(), 2);
        assert_eq!(
            pipeline.processors[0].tags(),
            &[KeyValue::new("unit-tests.tag1", "value1")]
        );
        assert_eq!(
            pipeline.processors[1].tags(),
            &[KeyValue::new("unit-tests.tag2", "value2")]
        );
    }

    #[test]
    fn empty_tag_set_attaches_nothing() {
        let mut pipeline = RecordingPipeline::default();

        add_default_tags(&mut pipeline, None, Vec::new());
        add_default_tags_from_config(&mut pipeline, &ConfigSection::empty(), None, None);

        assert!(pipeline.processors.is_empty());
    }
}
