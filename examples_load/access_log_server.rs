use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Extension, Router};
use ctxlog::init::{finalize, init};
use ctxlog::middleware::{access_log, AccessLog};
use ctxlog::{kv, LogContext, LoggerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // CTXLOG_PROJECT_ID=my-project switches to Cloud Logging JSON.
    let logger = init(Some(LoggerConfig::from_env()?))?;

    let handler_logger = logger.clone();
    let app = Router::new()
        .route(
            "/users/{id}",
            get(move |Path(id): Path<String>| {
                let logger = handler_logger.clone();
                async move {
                    let ctx = LogContext::new().with_user_id(id.clone());
                    logger.infow(&ctx, "user fetched", kv!["user" => id.as_str()]);
                    (Extension(ctx), format!("hello {id}"))
                }
            }),
        )
        .route("/healthz", get(|| async { "ok" }))
        .layer(from_fn_with_state(
            AccessLog::new(Arc::clone(&logger), ["/healthz"]),
            access_log,
        ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    logger.info(&LogContext::new(), format_args!("listening on {}", listener.local_addr()?));

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    finalize();
    Ok(())
}
