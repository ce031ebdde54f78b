//! Request-scoped correlation data.
//!
//! A [`LogContext`] is attached by the host request pipeline (for axum,
//! as a request extension) and read by the logger. Trace and span ids are
//! OpenTelemetry's own types; spans are produced elsewhere.

use opentelemetry::trace::TraceContextExt;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};

/// Correlation data for one logical request or operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    span: Option<SpanContext>,
    user_id: Option<String>,
    scope: Option<String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the span this context logs under, overriding whatever span is
    /// active when the record is written.
    pub fn with_span(mut self, span: SpanContext) -> Self {
        self.span = Some(span);
        self
    }

    /// Pin the active span of an OpenTelemetry context. A context with no
    /// valid span leaves `self` unchanged.
    pub fn with_otel_context(self, cx: &opentelemetry::Context) -> Self {
        let span = cx.span().span_context().clone();
        if span.is_valid() {
            self.with_span(span)
        } else {
            self
        }
    }

    /// Pin a sampled remote parent, e.g. ids taken from a `traceparent`
    /// header.
    pub fn with_trace_ids(self, trace_id: TraceId, span_id: SpanId) -> Self {
        self.with_span(SpanContext::new(
            trace_id,
            span_id,
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        ))
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn span(&self) -> Option<&SpanContext> {
        self.span.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}

/// Source of the active trace and span for a context.
///
/// Implementations must not fail; with no active span they return
/// [`SpanContext::empty_context`], whose ids render as zeros.
pub trait TraceProvider: Send + Sync {
    fn span_context(&self, ctx: &LogContext) -> SpanContext;
}

/// Default provider. Looks in order at:
///
/// 1. the span pinned on the [`LogContext`]
/// 2. the current `tracing` span, when an `OpenTelemetryLayer` is installed
/// 3. the current [`opentelemetry::Context`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextTraceProvider;

impl TraceProvider for ContextTraceProvider {
    fn span_context(&self, ctx: &LogContext) -> SpanContext {
        if let Some(span) = ctx.span() {
            return span.clone();
        }

        let from_tracing = tracing::Span::current().context();
        let span = from_tracing.span().span_context().clone();
        if span.is_valid() {
            return span;
        }

        let current = opentelemetry::Context::current();
        let span = current.span().span_context().clone();
        if span.is_valid() {
            span
        } else {
            SpanContext::empty_context()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(trace: &str, span: &str) -> SpanContext {
        SpanContext::new(
            TraceId::from_hex(trace).unwrap(),
            SpanId::from_hex(span).unwrap(),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        )
    }

    #[test]
    fn invalid_ids_render_as_fixed_width_zeros() {
        let empty = SpanContext::empty_context();
        assert_eq!(empty.trace_id().to_string(), "0".repeat(32));
        assert_eq!(empty.span_id().to_string(), "0".repeat(16));
    }

    #[test]
    fn provider_falls_back_to_empty_span() {
        let provider = ContextTraceProvider;
        let span = provider.span_context(&LogContext::new());
        assert!(!span.is_valid());
        assert_eq!(span.trace_id(), TraceId::INVALID);
    }

    #[test]
    fn pinned_span_wins() {
        let span = remote("4bf92f3577b34da6a3ce929d0e0e4736", "00f067aa0ba902b7");
        let ctx = LogContext::new().with_span(span.clone());
        assert_eq!(ContextTraceProvider.span_context(&ctx), span);
    }

    #[test]
    fn reads_the_attached_otel_context() {
        let span = remote("0af7651916cd43dd8448eb211c80319c", "b7ad6b7169203331");
        let cx = opentelemetry::Context::new().with_remote_span_context(span.clone());

        let _guard = cx.attach();
        assert_eq!(ContextTraceProvider.span_context(&LogContext::new()), span);
    }

    #[test]
    fn otel_context_without_span_is_ignored() {
        let ctx = LogContext::new().with_otel_context(&opentelemetry::Context::new());
        assert!(ctx.span().is_none());

        let span = remote("0af7651916cd43dd8448eb211c80319c", "b7ad6b7169203331");
        let cx = opentelemetry::Context::new().with_remote_span_context(span.clone());
        let ctx = LogContext::new().with_otel_context(&cx);
        assert_eq!(ctx.span(), Some(&span));
    }
}
