//! Multi-step form sequencer.
//!
//! A [`Wizard`] drives a fixed, ordered list of [`FieldGroup`]s (one per step),
//! gates forward navigation on per-step validity, autosaves a snapshot of every
//! group plus the current step to the transient store, restores that snapshot
//! when reopened, and turns the completed groups into a single payload for the
//! create-entity API. What the steps contain is supplied by a
//! [`WizardDefinition`]; see [`class::ClassWizard`] and
//! [`teacher::TeacherWizard`].

pub mod autosave;
pub mod class;
pub mod teacher;

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::types::decode;
use crate::api::{ApiError, GENERIC_FAILURE};
use crate::form::{FieldGroup, FieldValue};
use crate::store::TransientStore;

pub use autosave::{Autosave, DEFAULT_DEBOUNCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WizardKind {
    Class,
    Teacher,
}

impl WizardKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(Self::Class),
            "teacher" => Some(Self::Teacher),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Teacher => "teacher",
        }
    }
}

/// A cross-field problem that keeps a step from being complete even though
/// every field in it passes its own validators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepIssue {
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

pub trait WizardDefinition {
    type Payload: Serialize;
    type Response: DeserializeOwned;

    fn kind(&self) -> WizardKind;
    fn store_key(&self) -> &'static str;
    fn endpoint(&self) -> &'static str;
    fn step_labels(&self) -> &'static [&'static str];

    /// One group per step, in step order. Steps without inputs get an empty group.
    fn build_groups(&self) -> Vec<FieldGroup>;

    /// Cross-field constraints for the 0-based `step`.
    fn step_issues(&self, _step: usize, _groups: &[FieldGroup]) -> Vec<StepIssue> {
        Vec::new()
    }

    /// Canonical form of an item toggled into the list at `path`.
    fn normalize_item(&self, _path: &str, item: &str) -> Result<String, String> {
        let item = item.trim();
        if item.is_empty() {
            return Err("item must not be empty".into());
        }
        Ok(item.to_string())
    }

    fn assemble(&self, groups: &[FieldGroup]) -> Result<Self::Payload, String>;

    fn confirmed(&self, response: &Self::Response) -> bool;

    fn success_message(&self) -> &'static str;

    /// Static choice lists the UI renders for this wizard.
    fn options(&self) -> Value {
        Value::Null
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("unknown field: {0}")]
    UnknownField(String),
    #[error("field {0} does not hold a list")]
    NotAList(String),
    #[error("invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },
    #[error("step {step} is outside 1..={last}")]
    StepOutOfRange { step: usize, last: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRejection {
    /// A previous submission has not resolved yet.
    Pending,
    NotAtFinalStep { current: usize, last: usize },
    /// Validation failed; the wizard went back to step 1.
    Invalid { step: usize },
    Unassemblable(String),
}

#[derive(Debug, Clone)]
pub struct PreparedSubmission {
    pub id: Uuid,
    pub endpoint: &'static str,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded { message: &'static str },
    Failed { messages: Vec<String> },
    /// The completion does not belong to the in-flight submission.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    Moved,
    Blocked { step: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    Fresh,
    Restored { step: usize },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    form_value: Value,
    #[serde(default)]
    current_step: usize,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

pub struct Wizard<D: WizardDefinition> {
    def: D,
    groups: Vec<FieldGroup>,
    current: usize,
    last_saved_at: Option<DateTime<Utc>>,
    autosave: Autosave,
    pending: Option<Uuid>,
}

/// Object-safe surface used by the IPC layer, which holds wizards of
/// different definitions side by side.
pub trait WizardOps {
    fn kind(&self) -> WizardKind;
    fn view(&self) -> Value;
    fn current_step(&self) -> usize;
    fn can_advance(&self, step: usize) -> bool;
    fn set_field(&mut self, path: &str, raw: &Value) -> Result<(), WizardError>;
    fn toggle(&mut self, path: &str, item: &str) -> Result<bool, WizardError>;
    fn advance(&mut self, store: &mut dyn TransientStore) -> bool;
    fn retreat(&mut self, store: &mut dyn TransientStore) -> bool;
    fn jump_to(
        &mut self,
        step: usize,
        store: &mut dyn TransientStore,
    ) -> Result<JumpOutcome, WizardError>;
    fn begin_submit(&mut self) -> Result<PreparedSubmission, SubmitRejection>;
    fn finish_submit(
        &mut self,
        id: Uuid,
        result: Result<Value, ApiError>,
        store: &mut dyn TransientStore,
    ) -> SubmitOutcome;
    fn is_submitting(&self) -> bool;
    fn reset(&mut self, store: &mut dyn TransientStore);
    fn flush(&mut self, store: &mut dyn TransientStore) -> bool;
    fn flush_due(&mut self, store: &mut dyn TransientStore, now: Instant) -> bool;
    fn autosave_deadline(&self) -> Option<Instant>;
}

impl<D: WizardDefinition> Wizard<D> {
    pub fn new(def: D, debounce: Duration) -> Self {
        let groups = def.build_groups();
        debug_assert_eq!(groups.len(), def.step_labels().len());
        Self {
            def,
            groups,
            current: 0,
            last_saved_at: None,
            autosave: Autosave::new(debounce),
            pending: None,
        }
    }

    pub fn restore(&mut self, store: &dyn TransientStore) -> Restore {
        let key = self.def.store_key();
        let raw = match store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Restore::Fresh,
            Err(e) => {
                warn!(key, error = %e, "could not read saved wizard state");
                return Restore::Fresh;
            }
        };
        let snapshot: Snapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable wizard snapshot");
                return Restore::Fresh;
            }
        };

        for g in &mut self.groups {
            if let Some(v) = snapshot.form_value.get(g.name()) {
                g.patch_json(v);
            }
        }
        let step = snapshot.current_step.clamp(1, self.groups.len());
        self.current = step - 1;
        self.last_saved_at = snapshot.timestamp;
        info!(key, step, "restored wizard snapshot");
        Restore::Restored { step }
    }

    pub fn persist(&mut self, store: &mut dyn TransientStore) {
        self.autosave.clear();
        let key = self.def.store_key();
        let snapshot = Snapshot {
            form_value: self.form_value(),
            current_step: self.current + 1,
            timestamp: Some(Utc::now()),
        };
        let raw = match serde_json::to_string(&snapshot) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "could not serialize wizard snapshot");
                return;
            }
        };
        match store.write(key, &raw) {
            Ok(()) => {
                self.last_saved_at = snapshot.timestamp;
                debug!(key, step = snapshot.current_step, "saved wizard snapshot");
            }
            Err(e) => warn!(key, error = %e, "could not save wizard snapshot"),
        }
    }

    fn form_value(&self) -> Value {
        let mut out = Map::new();
        for g in self.groups.iter().filter(|g| !g.is_empty()) {
            out.insert(g.name().to_string(), g.to_json());
        }
        Value::Object(out)
    }

    fn step_complete(&self, idx: usize) -> bool {
        self.groups[idx].is_valid() && self.def.step_issues(idx, &self.groups).is_empty()
    }

    fn locate_mut(&mut self, path: &str) -> Result<&mut crate::form::Field, WizardError> {
        let unknown = || WizardError::UnknownField(path.to_string());
        let (group, rest) = path.split_once('.').ok_or_else(unknown)?;
        self.groups
            .iter_mut()
            .find(|g| g.name() == group)
            .and_then(|g| g.field_mut(rest))
            .ok_or_else(unknown)
    }

    fn mark_all_touched(&mut self) {
        for g in &mut self.groups {
            g.mark_all_touched();
        }
    }

    fn clear_saved(&mut self, store: &mut dyn TransientStore) {
        self.autosave.clear();
        let key = self.def.store_key();
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "could not clear wizard snapshot");
        }
        self.last_saved_at = None;
    }
}

#[cfg(test)]
impl<D: WizardDefinition> Wizard<D> {
    /// Fresh wizard rehydrated from the store when a usable snapshot exists.
    pub fn open(def: D, store: &dyn TransientStore, debounce: Duration) -> Self {
        let mut w = Self::new(def, debounce);
        w.restore(store);
        w
    }

    pub fn definition(&self) -> &D {
        &self.def
    }

    pub fn groups(&self) -> &[FieldGroup] {
        &self.groups
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn value_of(&self, path: &str) -> Option<&FieldValue> {
        let (group, rest) = path.split_once('.')?;
        self.groups
            .iter()
            .find(|g| g.name() == group)?
            .value_of(rest)
    }
}

impl<D: WizardDefinition> WizardOps for Wizard<D> {
    fn kind(&self) -> WizardKind {
        self.def.kind()
    }

    fn view(&self) -> Value {
        let labels = self.def.step_labels();
        let steps: Vec<Value> = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| {
                let issues = self.def.step_issues(idx, &self.groups);
                json!({
                    "step": idx + 1,
                    "label": label,
                    "group": self.groups[idx].name(),
                    "complete": self.groups[idx].is_valid() && issues.is_empty(),
                    "issues": issues,
                })
            })
            .collect();

        let errors: Vec<Value> = self
            .groups
            .iter()
            .flat_map(|g| {
                g.errors(true).into_iter().map(move |(path, e)| {
                    json!({
                        "path": format!("{}.{}", g.name(), path),
                        "code": e.code,
                        "message": e.message,
                    })
                })
            })
            .collect();

        let last = self.groups.len();
        json!({
            "wizard": self.def.kind().as_str(),
            "currentStep": self.current + 1,
            "totalSteps": last,
            "steps": steps,
            "values": self.form_value(),
            "errors": errors,
            "canAdvance": self.can_advance(self.current + 1),
            "canSubmit": self.current + 1 == last && self.pending.is_none(),
            "submitting": self.pending.is_some(),
            "lastSavedAt": self.last_saved_at.map(|t| t.to_rfc3339()),
            "options": self.def.options(),
        })
    }

    fn current_step(&self) -> usize {
        self.current + 1
    }

    fn can_advance(&self, step: usize) -> bool {
        if step == 0 || step > self.groups.len() {
            return false;
        }
        self.step_complete(step - 1)
    }

    fn set_field(&mut self, path: &str, raw: &Value) -> Result<(), WizardError> {
        let value = FieldValue::from_json(raw).map_err(|reason| WizardError::InvalidValue {
            path: path.to_string(),
            reason,
        })?;
        let field = self.locate_mut(path)?;
        match value {
            Some(v) if !field.accepts(&v) => {
                return Err(WizardError::InvalidValue {
                    path: path.to_string(),
                    reason: "value does not match the field's shape".into(),
                });
            }
            Some(v) => field.set(v),
            None => field.clear(),
        }
        field.mark_touched();
        self.autosave.touch(Instant::now());
        Ok(())
    }

    fn toggle(&mut self, path: &str, item: &str) -> Result<bool, WizardError> {
        let item = self
            .def
            .normalize_item(path, item)
            .map_err(|reason| WizardError::InvalidValue {
                path: path.to_string(),
                reason,
            })?;
        let field = self.locate_mut(path)?;
        if !matches!(field.value(), FieldValue::List(_)) && !field.value().is_empty() {
            return Err(WizardError::NotAList(path.to_string()));
        }
        let selected = field.toggle(&item);
        self.autosave.touch(Instant::now());
        Ok(selected)
    }

    fn advance(&mut self, store: &mut dyn TransientStore) -> bool {
        if !self.step_complete(self.current) {
            self.groups[self.current].mark_all_touched();
            return false;
        }
        if self.current + 1 >= self.groups.len() {
            return false;
        }
        self.current += 1;
        self.persist(store);
        true
    }

    fn retreat(&mut self, store: &mut dyn TransientStore) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.persist(store);
        true
    }

    fn jump_to(
        &mut self,
        step: usize,
        store: &mut dyn TransientStore,
    ) -> Result<JumpOutcome, WizardError> {
        let last = self.groups.len();
        if step == 0 || step > last {
            return Err(WizardError::StepOutOfRange { step, last });
        }
        let target = step - 1;
        if target > self.current {
            if let Some(blocking) = (0..target).find(|&i| !self.step_complete(i)) {
                self.mark_all_touched();
                return Ok(JumpOutcome::Blocked { step: blocking + 1 });
            }
        }
        if target != self.current {
            self.current = target;
            self.persist(store);
        }
        Ok(JumpOutcome::Moved)
    }

    fn begin_submit(&mut self) -> Result<PreparedSubmission, SubmitRejection> {
        if self.pending.is_some() {
            return Err(SubmitRejection::Pending);
        }
        let last = self.groups.len();
        if self.current + 1 != last {
            return Err(SubmitRejection::NotAtFinalStep {
                current: self.current + 1,
                last,
            });
        }

        self.mark_all_touched();
        if let Some(idx) = (0..last).find(|&i| !self.step_complete(i)) {
            self.current = 0;
            self.autosave.touch(Instant::now());
            return Err(SubmitRejection::Invalid { step: idx + 1 });
        }

        let payload = self
            .def
            .assemble(&self.groups)
            .map_err(SubmitRejection::Unassemblable)?;
        let payload = serde_json::to_value(&payload)
            .map_err(|e| SubmitRejection::Unassemblable(e.to_string()))?;

        let id = Uuid::new_v4();
        self.pending = Some(id);
        info!(wizard = self.def.kind().as_str(), %id, "submitting wizard");
        Ok(PreparedSubmission {
            id,
            endpoint: self.def.endpoint(),
            payload,
        })
    }

    fn finish_submit(
        &mut self,
        id: Uuid,
        result: Result<Value, ApiError>,
        store: &mut dyn TransientStore,
    ) -> SubmitOutcome {
        if self.pending != Some(id) {
            debug!(%id, "ignoring completion for a submission that is not in flight");
            return SubmitOutcome::Stale;
        }
        self.pending = None;

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                warn!(wizard = self.def.kind().as_str(), error = %e, "wizard submission failed");
                return SubmitOutcome::Failed {
                    messages: e.user_messages(),
                };
            }
        };
        let response: D::Response = match decode(body) {
            Ok(r) => r,
            Err(e) => {
                warn!(wizard = self.def.kind().as_str(), error = %e, "unexpected submission response");
                return SubmitOutcome::Failed {
                    messages: e.user_messages(),
                };
            }
        };
        if !self.def.confirmed(&response) {
            return SubmitOutcome::Failed {
                messages: vec![GENERIC_FAILURE.to_string()],
            };
        }

        self.reset(store);
        SubmitOutcome::Succeeded {
            message: self.def.success_message(),
        }
    }

    fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    fn reset(&mut self, store: &mut dyn TransientStore) {
        self.groups = self.def.build_groups();
        self.current = 0;
        self.clear_saved(store);
    }

    fn flush(&mut self, store: &mut dyn TransientStore) -> bool {
        if !self.autosave.is_dirty() {
            return false;
        }
        self.persist(store);
        true
    }

    fn flush_due(&mut self, store: &mut dyn TransientStore, now: Instant) -> bool {
        if !self.autosave.due(now) {
            return false;
        }
        self.persist(store);
        true
    }

    fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }
}

/// Builds the wizard for `kind`, restoring any saved snapshot.
pub fn open(
    kind: WizardKind,
    schedule_days: &[String],
    store: &dyn TransientStore,
    debounce: Duration,
) -> (Box<dyn WizardOps>, Restore) {
    fn boxed<D: WizardDefinition + 'static>(
        def: D,
        store: &dyn TransientStore,
        debounce: Duration,
    ) -> (Box<dyn WizardOps>, Restore) {
        let mut w = Wizard::new(def, debounce);
        let restored = w.restore(store);
        (Box::new(w), restored)
    }
    match kind {
        WizardKind::Class => boxed(
            class::ClassWizard::new(schedule_days.to_vec()),
            store,
            debounce,
        ),
        WizardKind::Teacher => boxed(teacher::TeacherWizard, store, debounce),
    }
}
