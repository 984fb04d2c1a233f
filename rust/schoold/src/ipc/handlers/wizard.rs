use serde_json::{json, Value};
use tracing::{info, warn};

use super::required_str;
use crate::api::ApiError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Completion, Request};
use crate::store::TransientStore;
use crate::wizard::{
    self, JumpOutcome, Restore, SubmitRejection, WizardError, WizardKind, WizardOps,
};

fn wizard_kind(req: &Request) -> Result<WizardKind, Value> {
    let name = required_str(req, "wizard")?;
    WizardKind::parse(&name)
        .ok_or_else(|| err(&req.id, "bad_params", format!("unknown wizard: {name}"), None))
}

fn wizard_err(req: &Request, e: WizardError) -> Value {
    err(&req.id, "bad_params", e.to_string(), None)
}

/// Runs `f` against an open wizard and the session store.
fn with_wizard(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&mut dyn WizardOps, &mut dyn TransientStore) -> Value,
) -> Value {
    let kind = match wizard_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(w) = state.wizards.get_mut(&kind) else {
        return err(
            &req.id,
            "wizard_not_open",
            format!("{} wizard is not open", kind.as_str()),
            None,
        );
    };
    f(w.as_mut(), state.store.as_mut())
}

fn handle_open(state: &mut AppState, req: &Request) -> Value {
    let kind = match wizard_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    if let Some(w) = state.wizards.get(&kind) {
        return ok(&req.id, json!({ "restored": false, "state": w.view() }));
    }
    let (w, restore) = wizard::open(
        kind,
        &state.config.schedule_days,
        state.store.as_ref(),
        state.config.autosave_debounce,
    );
    let view = w.view();
    let restored = matches!(restore, Restore::Restored { .. });
    info!(wizard = kind.as_str(), restored, step = w.current_step(), "wizard opened");
    state.wizards.insert(kind, w);
    ok(&req.id, json!({ "restored": restored, "state": view }))
}

fn handle_state(state: &mut AppState, req: &Request) -> Value {
    with_wizard(state, req, |w, _| ok(&req.id, w.view()))
}

fn handle_set_field(state: &mut AppState, req: &Request) -> Value {
    let path = match required_str(req, "path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let value = req.params.get("value").cloned().unwrap_or(Value::Null);
    with_wizard(state, req, |w, _| match w.set_field(&path, &value) {
        Ok(()) => ok(&req.id, w.view()),
        Err(e) => wizard_err(req, e),
    })
}

fn handle_toggle(state: &mut AppState, req: &Request) -> Value {
    let path = match required_str(req, "path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    let item = match required_str(req, "item") {
        Ok(i) => i,
        Err(e) => return e,
    };
    with_wizard(state, req, |w, _| match w.toggle(&path, &item) {
        Ok(selected) => ok(&req.id, json!({ "selected": selected, "state": w.view() })),
        Err(e) => wizard_err(req, e),
    })
}

fn handle_next(state: &mut AppState, req: &Request) -> Value {
    with_wizard(state, req, |w, store| {
        let moved = w.advance(store);
        ok(&req.id, json!({ "moved": moved, "state": w.view() }))
    })
}

fn handle_back(state: &mut AppState, req: &Request) -> Value {
    with_wizard(state, req, |w, store| {
        let moved = w.retreat(store);
        ok(&req.id, json!({ "moved": moved, "state": w.view() }))
    })
}

fn handle_go_to(state: &mut AppState, req: &Request) -> Value {
    let Some(step) = req.params.get("step").and_then(|v| v.as_u64()) else {
        return err(&req.id, "bad_params", "missing step", None);
    };
    with_wizard(state, req, |w, store| match w.jump_to(step as usize, store) {
        Ok(JumpOutcome::Moved) => ok(&req.id, json!({ "moved": true, "state": w.view() })),
        Ok(JumpOutcome::Blocked { step }) => ok(
            &req.id,
            json!({ "moved": false, "blockedAt": step, "state": w.view() }),
        ),
        Err(e) => wizard_err(req, e),
    })
}

fn handle_submit(state: &mut AppState, req: &Request) -> Value {
    let kind = match wizard_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(w) = state.wizards.get_mut(&kind) else {
        return err(&req.id, "wizard_not_open", format!("{} wizard is not open", kind.as_str()), None);
    };

    let prepared = match w.begin_submit() {
        Ok(p) => p,
        Err(SubmitRejection::Pending) => {
            return err(&req.id, "submit_pending", "a submission is already in flight", None);
        }
        Err(SubmitRejection::NotAtFinalStep { current, last }) => {
            return err(
                &req.id,
                "not_final_step",
                format!("submit is only available on step {last}"),
                Some(json!({ "currentStep": current, "totalSteps": last })),
            );
        }
        Err(SubmitRejection::Invalid { step }) => {
            return err(
                &req.id,
                "invalid",
                format!("step {step} has errors"),
                Some(json!({ "step": step, "state": w.view() })),
            );
        }
        Err(SubmitRejection::Unassemblable(reason)) => {
            return err(&req.id, "invalid", reason, Some(json!({ "state": w.view() })));
        }
    };

    let id = prepared.id;
    let endpoint = prepared.endpoint;
    let payload = prepared.payload;
    let spawned = state.spawn_call(
        move |api| async move { api.post_json(endpoint, &payload).await },
        move |result| Completion::Wizard { kind, id, result },
    );
    if !spawned {
        warn!(wizard = kind.as_str(), "no API client; submission abandoned");
        if let Some(w) = state.wizards.get_mut(&kind) {
            w.finish_submit(
                id,
                Err(ApiError::Unsent("API client is not configured".into())),
                state.store.as_mut(),
            );
        }
        return err(&req.id, "api_unavailable", "API client is not configured", None);
    }

    let view = state.wizards.get(&kind).map(|w| w.view()).unwrap_or(Value::Null);
    ok(&req.id, json!({ "submissionId": id, "state": view }))
}

fn handle_reset(state: &mut AppState, req: &Request) -> Value {
    with_wizard(state, req, |w, store| {
        w.reset(store);
        ok(&req.id, w.view())
    })
}

fn handle_flush(state: &mut AppState, req: &Request) -> Value {
    with_wizard(state, req, |w, store| {
        let saved = w.flush(store);
        let view = w.view();
        ok(&req.id, json!({ "saved": saved, "lastSavedAt": view["lastSavedAt"] }))
    })
}

fn handle_close(state: &mut AppState, req: &Request) -> Value {
    let kind = match wizard_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let Some(w) = state.wizards.get_mut(&kind) else {
        return ok(&req.id, json!({ "closed": false, "saved": false }));
    };
    if w.is_submitting() {
        return err(&req.id, "submit_pending", "wait for the submission to finish", None);
    }
    let saved = w.flush(state.store.as_mut());
    state.wizards.remove(&kind);
    info!(wizard = kind.as_str(), saved, "wizard closed");
    ok(&req.id, json!({ "closed": true, "saved": saved }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "wizard.open" => Some(handle_open(state, req)),
        "wizard.state" => Some(handle_state(state, req)),
        "wizard.setField" => Some(handle_set_field(state, req)),
        "wizard.toggle" => Some(handle_toggle(state, req)),
        "wizard.next" => Some(handle_next(state, req)),
        "wizard.back" => Some(handle_back(state, req)),
        "wizard.goTo" => Some(handle_go_to(state, req)),
        "wizard.submit" => Some(handle_submit(state, req)),
        "wizard.reset" => Some(handle_reset(state, req)),
        "wizard.flush" => Some(handle_flush(state, req)),
        "wizard.close" => Some(handle_close(state, req)),
        _ => None,
    }
}
