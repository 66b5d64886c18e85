//! `nlq serve`: runs the HTTP front end exposing `answer()` as a JSON API.

use crate::cli::{GlobalArgs, ServeArgs};
use crate::http::build_router;
use crate::wiring::Wiring;
use anyhow::{Context, Result};
use nlq_core::config::NlqConfig;
use std::path::Path;

pub async fn execute(args: &ServeArgs, global: &GlobalArgs) -> Result<()> {
    let config = match &global.config {
        Some(path) => NlqConfig::load(Path::new(path))?,
        None => NlqConfig::load_from_dir_or_default(Path::new("."))?,
    };

    let wiring = Wiring::build(config).await?;
    let router = build_router(wiring);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;
    log::info!("listening on {}", args.addr);
    axum::serve(listener, router).await.context("HTTP server exited unexpectedly")?;
    Ok(())
}
