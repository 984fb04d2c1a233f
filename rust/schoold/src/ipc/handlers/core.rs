use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::SqliteStore;
use crate::views::DatasetKind;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "apiUrl": state.session.api_url,
            "openWizards": state.wizards.keys().map(|k| k.as_str()).collect::<Vec<_>>(),
            "datasets": DatasetKind::ALL
                .iter()
                .map(|&k| (k.as_str().to_string(), json!(state.datasets.len(k))))
                .collect::<serde_json::Map<_, _>>(),
        }),
    )
}

/// Moves the session store to `<path>/session.sqlite3`. Open wizards are
/// flushed to the old store and closed; the shell reopens them against the
/// new one.
fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    if state.wizards.values().any(|w| w.is_submitting()) {
        return err(
            &req.id,
            "submit_pending",
            "wait for the wizard submission to finish",
            None,
        );
    }

    match SqliteStore::open(&path) {
        Ok(store) => {
            let flushed = state.flush_all();
            state.wizards.clear();
            state.store = Box::new(store);
            state.workspace = Some(path.clone());
            info!(path = %path.display(), flushed, "workspace selected");
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "store_open_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
