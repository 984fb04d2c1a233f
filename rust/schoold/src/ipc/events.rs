use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::event;
use super::types::{AppState, Completion};
use crate::api::types::{decode, ProfileResponse};
use crate::api::ApiError;
use crate::entities::FormKind;
use crate::views::DatasetKind;
use crate::wizard::{SubmitOutcome, WizardKind};

/// Applies a finished HTTP request to the state and returns the event line
/// to emit, or `None` when the completion no longer matters.
pub fn apply_completion(state: &mut AppState, done: Completion) -> Option<Value> {
    match done {
        Completion::Wizard { kind, id, result } => wizard_submitted(state, kind, id, result),
        Completion::Form { kind, id, result } => form_submitted(state, kind, id, result),
        Completion::Fetch { kind, id, result } => data_fetched(state, kind, id, result),
        Completion::Auth { id, result } => auth_checked(state, id, result),
    }
}

fn wizard_submitted(
    state: &mut AppState,
    kind: WizardKind,
    id: Uuid,
    result: Result<Value, ApiError>,
) -> Option<Value> {
    let Some(w) = state.wizards.get_mut(&kind) else {
        debug!(wizard = kind.as_str(), %id, "completion for a closed wizard");
        return None;
    };
    let mut payload = json!({
        "wizard": kind.as_str(),
        "submissionId": id,
    });
    match w.finish_submit(id, result, state.store.as_mut()) {
        SubmitOutcome::Stale => return None,
        SubmitOutcome::Succeeded { message } => {
            info!(wizard = kind.as_str(), %id, "wizard submission accepted");
            payload["ok"] = json!(true);
            payload["message"] = json!(message);
        }
        SubmitOutcome::Failed { messages } => {
            payload["ok"] = json!(false);
            payload["messages"] = json!(messages);
        }
    }
    payload["state"] = w.view();
    Some(event("wizard.submitted", payload))
}

fn form_submitted(
    state: &mut AppState,
    kind: FormKind,
    id: Uuid,
    result: Result<Value, ApiError>,
) -> Option<Value> {
    if state.pending_forms.get(&kind) != Some(&id) {
        debug!(form = kind.as_str(), %id, "ignoring stale form completion");
        return None;
    }
    state.pending_forms.remove(&kind);

    let payload = match result {
        Ok(body) => {
            if kind == FormKind::Login {
                signed_in(state, &body);
            }
            info!(form = kind.as_str(), %id, "form submission accepted");
            json!({
                "form": kind.as_str(),
                "submissionId": id,
                "ok": true,
                "message": kind.success_message(),
            })
        }
        Err(e) => {
            warn!(form = kind.as_str(), error = %e, "form submission failed");
            json!({
                "form": kind.as_str(),
                "submissionId": id,
                "ok": false,
                "messages": kind.failure_messages(&e),
            })
        }
    };
    Some(event("forms.submitted", payload))
}

/// A bearer token in the login response, if any, is used for later calls.
fn signed_in(state: &mut AppState, body: &Value) {
    state.session.authenticated = true;
    let token = ["token", "accessToken"]
        .iter()
        .find_map(|k| body.get(*k).and_then(|v| v.as_str()));
    if let Some(token) = token {
        state.session.auth_token = Some(token.to_string());
        state.rebuild_client();
    }
}

fn data_fetched(
    state: &mut AppState,
    kind: DatasetKind,
    id: Uuid,
    result: Result<Value, ApiError>,
) -> Option<Value> {
    if state.pending_fetches.get(&kind) != Some(&id) {
        debug!(dataset = kind.as_str(), %id, "ignoring superseded fetch");
        return None;
    }
    state.pending_fetches.remove(&kind);

    let loaded = result
        .and_then(|body| kind.rows_from_response(body))
        .map_err(|e| e.user_messages())
        .and_then(|rows| {
            state
                .datasets
                .load(kind, rows)
                .map_err(|e| vec![e.to_string()])
        });
    let payload = match loaded {
        Ok(count) => json!({
            "dataset": kind.as_str(),
            "requestId": id,
            "ok": true,
            "count": count,
        }),
        Err(messages) => {
            warn!(dataset = kind.as_str(), ?messages, "dataset fetch failed");
            json!({
                "dataset": kind.as_str(),
                "requestId": id,
                "ok": false,
                "messages": messages,
            })
        }
    };
    Some(event("data.fetched", payload))
}

fn auth_checked(state: &mut AppState, id: Uuid, result: Result<Value, ApiError>) -> Option<Value> {
    if state.pending_auth != Some(id) {
        return None;
    }
    state.pending_auth = None;
    let verified = match result.and_then(decode::<ProfileResponse>) {
        Ok(p) => p.verified,
        Err(e) => {
            debug!(error = %e, "profile check failed");
            false
        }
    };
    state.session.authenticated = verified;
    Some(event(
        "auth.checked",
        json!({ "requestId": id, "authenticated": verified }),
    ))
}
