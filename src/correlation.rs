use crate::context::{LogContext, TraceProvider};
use std::sync::Arc;

/// Identifiers pulled out of a [`LogContext`].
///
/// `trace_id` and `span_id` are always present, all zeros when no span is
/// active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub trace_id: String,
    pub span_id: String,
    pub user_id: Option<String>,
    pub scope: Option<String>,
}

/// Read-only view over the correlation data of a context.
#[derive(Clone)]
pub struct CorrelationExtractor {
    provider: Arc<dyn TraceProvider>,
}

impl CorrelationExtractor {
    pub fn new(provider: Arc<dyn TraceProvider>) -> Self {
        Self { provider }
    }

    pub fn extract(&self, ctx: &LogContext) -> Correlation {
        let span = self.provider.span_context(ctx);
        Correlation {
            trace_id: span.trace_id().to_string(),
            span_id: span.span_id().to_string(),
            user_id: ctx.user_id().map(str::to_string),
            scope: ctx.scope().map(str::to_string),
        }
    }
}

impl std::fmt::Debug for CorrelationExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationExtractor").finish_non_exhaustive()
    }
}
