use serde_json::{json, Value};
use uuid::Uuid;

use super::required_str;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Completion, Request};
use crate::views::{DatasetKind, ViewError};

fn dataset_kind(req: &Request) -> Result<DatasetKind, Value> {
    let name = required_str(req, "dataset")?;
    DatasetKind::parse(&name)
        .ok_or_else(|| err(&req.id, "unknown_dataset", format!("unknown dataset: {name}"), None))
}

fn view_err(req: &Request, e: ViewError) -> Value {
    let ViewError::MalformedRow { index, .. } = &e;
    err(&req.id, "invalid", e.to_string(), Some(json!({ "index": index })))
}

fn handle_load(state: &mut AppState, req: &Request) -> Value {
    let kind = match dataset_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(rows) = req.params.get("rows").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing rows", None);
    };
    match state.datasets.load(kind, rows.clone()) {
        Ok(count) => ok(&req.id, json!({ "dataset": kind.as_str(), "count": count })),
        Err(e) => view_err(req, e),
    }
}

fn handle_fetch(state: &mut AppState, req: &Request) -> Value {
    let kind = match dataset_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(path) = kind.endpoint() else {
        return err(
            &req.id,
            "bad_params",
            format!("{} are not served by the backend; use data.load", kind.as_str()),
            None,
        );
    };
    let id = Uuid::new_v4();
    let spawned = state.spawn_call(
        move |api| async move { api.get_json(path).await },
        move |result| Completion::Fetch { kind, id, result },
    );
    if !spawned {
        return err(&req.id, "api_unavailable", "API client is not configured", None);
    }
    // A newer fetch of the same dataset supersedes the older one.
    state.pending_fetches.insert(kind, id);
    ok(&req.id, json!({ "requestId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "data.load" => Some(handle_load(state, req)),
        "data.fetch" => Some(handle_fetch(state, req)),
        _ => None,
    }
}
