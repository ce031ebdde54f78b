mod common;

use common::harness;
use ctxlog::context::{SpanId, TraceId};
use ctxlog::record::{SOURCE_LOCATION_KEY, SPAN_ID_KEY, TRACE_KEY};
use ctxlog::{kv, Field, Level, LogContext, LoggerConfig, Value};
use opentelemetry::trace::{
    SpanContext, TraceContextExt, TraceFlags, TraceState, TracerProvider as _,
};
use std::io;
use std::sync::atomic::Ordering;
use std::thread;

#[test]
fn filtered_calls_skip_correlation_and_sink() {
    let h = harness(LoggerConfig {
        level: Level::Error,
        ..LoggerConfig::default()
    });
    let ctx = LogContext::new().with_user_id("u1");

    h.logger.warn(&ctx, format_args!("below threshold"));
    h.logger.info(&ctx, format_args!("below threshold"));
    h.logger.debugw(&ctx, "below threshold", kv!["k" => "v"]);

    assert_eq!(h.sink.len(), 0);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);

    h.logger.error(&ctx, format_args!("at threshold"));
    assert_eq!(h.sink.len(), 1);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn critical_writes_flushes_once_and_terminates() {
    let h = harness(LoggerConfig::default());

    h.logger.critical(&LogContext::new(), format_args!("db gone: {}", 503));

    let records = h.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, Level::Critical);
    assert_eq!(records[0].message, "db gone: 503");
    assert_eq!(h.sink.flushes.load(Ordering::SeqCst), 1);
    assert_eq!(h.fatal_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn non_critical_levels_never_terminate() {
    let h = harness(LoggerConfig::default());
    let ctx = LogContext::new();

    h.logger.error(&ctx, format_args!("e"));
    h.logger.warn(&ctx, format_args!("w"));
    h.logger.info(&ctx, format_args!("i"));
    h.logger.debug(&ctx, format_args!("d"));

    assert_eq!(h.sink.len(), 4);
    assert_eq!(h.sink.flushes.load(Ordering::SeqCst), 0);
    assert_eq!(h.fatal_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn errorw_renders_error_under_configured_key() {
    let h = harness(LoggerConfig {
        key_error: "error_message".into(),
        ..LoggerConfig::default()
    });
    let err = io::Error::new(io::ErrorKind::NotFound, "no such order");

    h.logger.errorw(
        &LogContext::new(),
        "lookup failed",
        kv!["error" => Value::error(err), "order" => 17i64, "error" => "not an error"],
    );

    let records = h.sink.records();
    let extra: Vec<(&str, Option<&str>)> = records[0]
        .fields
        .iter()
        .skip(2)
        .filter(|f| f.key != "stacktrace")
        .map(|f| (f.key.as_str(), f.as_str()))
        .collect();
    assert_eq!(
        extra,
        vec![("error_message", Some("no such order")), ("order", Some("17"))]
    );
}

#[test]
fn cloud_mode_record_serializes_with_trace_context() {
    let h = harness(LoggerConfig {
        project_id: "acme-prod".into(),
        ..LoggerConfig::default()
    });
    let trace = TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap();
    let span = SpanId::from_hex("00f067aa0ba902b7").unwrap();
    let ctx = LogContext::new()
        .with_trace_ids(trace, span)
        .with_scope("billing");

    h.logger.infow(&ctx, "invoice sent", kv!["invoice" => "inv-9"]);

    let records = h.sink.records();
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["severity"], "INFO");
    assert_eq!(json["message"], "invoice sent");
    assert_eq!(json["request_id"], "4bf92f3577b34da6a3ce929d0e0e4736");
    assert_eq!(
        json[TRACE_KEY],
        "projects/acme-prod/traces/4bf92f3577b34da6a3ce929d0e0e4736"
    );
    assert_eq!(json[SPAN_ID_KEY], "00f067aa0ba902b7");
    assert_eq!(json["scope"], "billing");
    assert_eq!(json["invoice"], "inv-9");
    assert!(json[SOURCE_LOCATION_KEY]["file"]
        .as_str()
        .unwrap()
        .ends_with("pipeline.rs"));
}

#[test]
fn concurrent_callers_share_one_logger() {
    let h = harness(LoggerConfig::default());

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let logger = h.logger.clone();
            thread::spawn(move || {
                let ctx = LogContext::new().with_user_id(format!("user-{worker}"));
                for i in 0..50 {
                    logger.info(&ctx, format_args!("tick {i}"));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let records = h.sink.records();
    assert_eq!(records.len(), 400);
    assert!(records
        .iter()
        .all(|r| r.field("user_id").and_then(Field::as_str).is_some()));
}

#[test]
fn attached_otel_context_supplies_trace_ids() {
    let h = harness(LoggerConfig::default());
    let span = SpanContext::new(
        TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
        SpanId::from_hex("b7ad6b7169203331").unwrap(),
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    );
    let _guard = opentelemetry::Context::new()
        .with_remote_span_context(span)
        .attach();

    h.logger.info(&LogContext::new(), format_args!("inside remote parent"));

    let records = h.sink.records();
    assert_eq!(
        records[0].field("request_id").and_then(Field::as_str),
        Some("0af7651916cd43dd8448eb211c80319c")
    );
}

#[test]
fn tracing_span_with_otel_layer_supplies_trace_ids() {
    use tracing_opentelemetry::OpenTelemetrySpanExt;
    use tracing_subscriber::layer::SubscriberExt;

    let provider = opentelemetry_sdk::trace::TracerProvider::builder().build();
    let subscriber = tracing_subscriber::registry()
        .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("ctxlog-test")));
    let h = harness(LoggerConfig::default());

    let expected = tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("checkout");
        let _entered = span.enter();
        h.logger.info(&LogContext::new(), format_args!("paying"));
        span.context().span().span_context().trace_id().to_string()
    });

    assert_ne!(expected, "0".repeat(32));
    let records = h.sink.records();
    assert_eq!(
        records[0].field("request_id").and_then(Field::as_str),
        Some(expected.as_str())
    );
}
