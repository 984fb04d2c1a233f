use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::paths::PROFILE;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Completion, Request};

fn session_view(state: &AppState) -> serde_json::Value {
    json!({
        "session": state.session,
        "hasToken": state.session.auth_token.is_some(),
        "config": state.config,
    })
}

fn handle_session_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, session_view(state))
}

/// `apiUrl` replaces the backend base URL and drops the authenticated flag;
/// `authToken` sets the bearer token, `null` clears it.
fn handle_session_configure(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Some(v) = req.params.get("apiUrl") {
        let Some(url) = v.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return err(&req.id, "bad_params", "apiUrl must be a non-empty string", None);
        };
        if url != state.session.api_url {
            state.session.api_url = url.to_string();
            state.session.authenticated = false;
        }
    }
    match req.params.get("authToken") {
        None => {}
        Some(serde_json::Value::Null) => state.session.auth_token = None,
        Some(serde_json::Value::String(t)) => state.session.auth_token = Some(t.clone()),
        Some(_) => {
            return err(&req.id, "bad_params", "authToken must be a string or null", None);
        }
    }
    state.rebuild_client();
    info!(api_url = %state.session.api_url, "session configured");
    ok(&req.id, session_view(state))
}

fn handle_auth_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let id = Uuid::new_v4();
    let spawned = state.spawn_call(
        |api| async move { api.get_json(PROFILE).await },
        move |result| Completion::Auth { id, result },
    );
    if !spawned {
        return err(&req.id, "api_unavailable", "API client is not configured", None);
    }
    state.pending_auth = Some(id);
    ok(&req.id, json!({ "requestId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.get" => Some(handle_session_get(state, req)),
        "session.configure" => Some(handle_session_configure(state, req)),
        "auth.check" => Some(handle_auth_check(state, req)),
        _ => None,
    }
}
