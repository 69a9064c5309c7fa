use std::{env, sync::Arc};

use anyhow::Result;
use csv_retention::{
    config::Config,
    event::S3Event,
    handler::{Handler, Response},
    store::S3Store,
};
use lambda_runtime::{run, service_fn, LambdaEvent};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .with_ansi(false)
        .without_time()
        .init();

    // ─── 2) config + one storage client for the life of the process ─
    let config = Config::from_env()?;
    info!(?config, "starting retention handler");
    let store = Arc::new(S3Store::from_env().await);
    let handler = Handler::new(store, config);

    // ─── 3) serve invocations ───────────────────────────────────────
    run(service_fn(|event: LambdaEvent<S3Event>| {
        let handler = &handler;
        async move { invoke(handler, event).await }
    }))
    .await
}

async fn invoke(
    handler: &Handler,
    event: LambdaEvent<S3Event>,
) -> Result<Response, lambda_runtime::Error> {
    info!(request_id = %event.context.request_id, "invocation start");
    let resp = handler.handle(&event.payload).await?;
    Ok(resp)
}
