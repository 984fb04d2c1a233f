use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::required_str;
use crate::entities::{FilledForm, FormError, FormKind};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Completion, Request};

fn form_kind(req: &Request) -> Result<FormKind, Value> {
    let name = required_str(req, "form")?;
    FormKind::parse(&name)
        .ok_or_else(|| err(&req.id, "unknown_form", format!("unknown form: {name}"), None))
}

fn touched_paths(req: &Request) -> Result<Option<Vec<String>>, Value> {
    match req.params.get("touched") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|_| err(&req.id, "bad_params", "touched must be a list of paths", None)),
    }
}

fn fill(req: &Request, kind: FormKind, touched: Option<Vec<String>>) -> Result<FilledForm, Value> {
    let values = req.params.get("values").cloned().unwrap_or_else(|| json!({}));
    FilledForm::new(kind, &values, touched).map_err(|e| form_err(req, e, None))
}

fn form_err(req: &Request, e: FormError, form: Option<&FilledForm>) -> Value {
    match e {
        FormError::NotAnObject => err(&req.id, "bad_params", e.to_string(), None),
        FormError::Invalid(_) => {
            let details = form.map(|f| json!({ "errors": f.evaluate().errors }));
            err(&req.id, "invalid", e.to_string(), details)
        }
        FormError::Attachment { .. } | FormError::Payload(_) => {
            err(&req.id, "invalid", e.to_string(), None)
        }
    }
}

fn handle_validate(_state: &mut AppState, req: &Request) -> Value {
    let result = form_kind(req)
        .and_then(|kind| Ok((kind, touched_paths(req)?)))
        .and_then(|(kind, touched)| fill(req, kind, touched));
    match result {
        Ok(form) => ok(&req.id, json!(form.evaluate())),
        Err(e) => e,
    }
}

fn handle_template(_state: &mut AppState, req: &Request) -> Value {
    match form_kind(req) {
        Ok(kind) => ok(&req.id, json!({ "form": kind.as_str(), "values": kind.template() })),
        Err(e) => e,
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> Value {
    let form = match form_kind(req).and_then(|kind| fill(req, kind, None)) {
        Ok(f) => f,
        Err(e) => return e,
    };
    let kind = form.kind();
    if state.pending_forms.contains_key(&kind) {
        return err(
            &req.id,
            "submit_pending",
            format!("a {} submission is already in flight", kind.as_str()),
            None,
        );
    }
    let submission = match form.submission() {
        Ok(s) => s,
        Err(e) => return form_err(req, e, Some(&form)),
    };

    let id = Uuid::new_v4();
    let spawned = state.spawn_call(
        move |api| async move { api.submit(submission).await },
        move |result| Completion::Form { kind, id, result },
    );
    if !spawned {
        return err(&req.id, "api_unavailable", "API client is not configured", None);
    }
    state.pending_forms.insert(kind, id);
    info!(form = kind.as_str(), %id, "submitting form");
    ok(&req.id, json!({ "submissionId": id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "forms.validate" => Some(handle_validate(state, req)),
        "forms.template" => Some(handle_template(state, req)),
        "forms.submit" => Some(handle_submit(state, req)),
        _ => None,
    }
}
