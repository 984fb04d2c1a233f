mod api;
mod config;
mod entities;
mod form;
mod ipc;
mod session;
mod store;
mod views;
mod wizard;

use std::future;

use anyhow::Context;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

async fn write_line(stdout: &mut Stdout, v: &Value) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(v).context("encode reply")?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await.context("write reply")?;
    stdout.flush().await.context("flush reply")?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // stdout carries the IPC protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("schoold=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::from_env();
    info!(api_url = %config.api_url, session_dir = ?config.session_dir, "schoold starting");

    let (tx, mut completions) = mpsc::unbounded_channel();
    let mut state = ipc::AppState::new(config, tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let deadline = state.next_autosave();
        let autosave = async move {
            match deadline {
                Some(at) => sleep_until(Instant::from_std(at)).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(v)) => v,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin closed with error");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let resp = match serde_json::from_str::<ipc::Request>(&line) {
                    Ok(req) => {
                        debug!(id = %req.id, method = %req.method, "request");
                        ipc::handle_request(&mut state, req)
                    }
                    Err(e) => ipc::bad_json(e.to_string()),
                };
                write_line(&mut stdout, &resp).await?;
            }
            Some(done) = completions.recv() => {
                if let Some(ev) = ipc::apply_completion(&mut state, done) {
                    write_line(&mut stdout, &ev).await?;
                }
            }
            _ = autosave => {
                state.flush_due(std::time::Instant::now());
            }
        }
    }

    let saved = state.flush_all();
    info!(saved, "stdin closed; shutting down");
    Ok(())
}
