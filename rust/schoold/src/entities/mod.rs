//! Single-page entity forms (student, exam, announcement, fee plan, login).
//!
//! These are stateless: every call rebuilds the form from the values the UI
//! sends, validates it, and derives display values. Submission turns a valid
//! form into a request body for the backend.

pub mod announcement;
pub mod exam;
pub mod fee_plan;
pub mod login;
pub mod student;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::api::ApiError;
use crate::form::{FieldError, FieldGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    Student,
    Exam,
    Announcement,
    FeePlan,
    Login,
}

impl FormKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "exam" => Some(Self::Exam),
            "announcement" => Some(Self::Announcement),
            "feePlan" => Some(Self::FeePlan),
            "login" => Some(Self::Login),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Exam => "exam",
            Self::Announcement => "announcement",
            Self::FeePlan => "feePlan",
            Self::Login => "login",
        }
    }

    pub fn endpoint(self) -> &'static str {
        use crate::api::paths::*;
        match self {
            Self::Student => CREATE_STUDENT,
            Self::Exam => CREATE_EXAM,
            Self::Announcement => CREATE_ANNOUNCEMENT,
            Self::FeePlan => CREATE_FEE_PLAN,
            Self::Login => LOGIN,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::Student => "Student has been added successfully",
            Self::Exam => "Exam has been added successfully",
            Self::Announcement => "Your announcement has been added successfully",
            Self::FeePlan => "Fee structure has been submitted successfully",
            Self::Login => "Logged in",
        }
    }

    /// Messages shown when the backend rejects a submission of this form.
    pub fn failure_messages(self, err: &ApiError) -> Vec<String> {
        match (self, err.status()) {
            (Self::Login, Some(401)) => vec![login::INVALID_CREDENTIALS.to_string()],
            _ => err.user_messages(),
        }
    }

    /// Initial values the UI should start from, if the form has any beyond
    /// empty fields.
    pub fn template(self) -> Value {
        match self {
            Self::FeePlan => fee_plan::template(),
            Self::Announcement => json!({ "is_active": false }),
            _ => json!({}),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("values must be a JSON object")]
    NotAnObject,
    #[error("form has {0} invalid field(s)")]
    Invalid(usize),
    #[error("could not read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not build request: {0}")]
    Payload(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub path: String,
    pub code: &'static str,
    pub message: String,
}

impl FieldIssue {
    fn from_pair((path, e): (String, FieldError)) -> Self {
        Self {
            path,
            code: e.code,
            message: e.message,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub valid: bool,
    pub errors: Vec<FieldIssue>,
    pub derived: Value,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Body {
    Json(Value),
    Multipart {
        fields: Vec<(&'static str, String)>,
        file: Attachment,
    },
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub endpoint: &'static str,
    pub body: Body,
}

/// A form rebuilt from UI values.
pub struct FilledForm {
    kind: FormKind,
    group: FieldGroup,
    touched: Option<Vec<String>>,
}

impl FilledForm {
    /// `touched` limits reported errors to those paths (and their
    /// descendants); `None` reports every error.
    pub fn new(kind: FormKind, values: &Value, touched: Option<Vec<String>>) -> Result<Self, FormError> {
        if !values.is_object() {
            return Err(FormError::NotAnObject);
        }
        let mut group = match kind {
            FormKind::Student => student::group(),
            FormKind::Exam => exam::group(),
            FormKind::Announcement => announcement::group(),
            FormKind::FeePlan => fee_plan::group(values),
            FormKind::Login => login::group(),
        };
        group.patch_json(&index_arrays(values));
        match &touched {
            None => group.mark_all_touched(),
            Some(paths) => {
                for path in paths {
                    if let Some(f) = group.field_mut(path) {
                        f.mark_touched();
                    }
                }
            }
        }
        Ok(Self {
            kind,
            group,
            touched,
        })
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    fn cross_errors(&self) -> Vec<(String, FieldError)> {
        match self.kind {
            FormKind::Exam => exam::cross_errors(&self.group),
            FormKind::FeePlan => fee_plan::cross_errors(&self.group),
            _ => Vec::new(),
        }
    }

    fn all_errors(&self) -> Vec<(String, FieldError)> {
        let mut errors = self.group.errors(false);
        errors.extend(self.cross_errors());
        errors
    }

    fn is_reported(&self, path: &str) -> bool {
        match &self.touched {
            None => true,
            Some(paths) => paths
                .iter()
                .any(|t| path == t || path.starts_with(&format!("{t}."))),
        }
    }

    pub fn evaluate(&self) -> Evaluation {
        let errors = self.all_errors();
        let valid = errors.is_empty();
        let errors = errors
            .into_iter()
            .filter(|(path, _)| self.is_reported(path))
            .map(FieldIssue::from_pair)
            .collect();
        let derived = match self.kind {
            FormKind::Student => student::derived(&self.group),
            FormKind::Exam => exam::derived(&self.group),
            FormKind::Announcement => announcement::derived(&self.group),
            FormKind::FeePlan => fee_plan::derived(&self.group),
            FormKind::Login => Value::Object(Map::new()),
        };
        Evaluation {
            valid,
            errors,
            derived,
        }
    }

    pub fn submission(&self) -> Result<Submission, FormError> {
        let errors = self.all_errors();
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors.len()));
        }
        let body = match self.kind {
            FormKind::Student => Body::Json(to_json(student::payload(&self.group)?)?),
            FormKind::Exam => exam::body(&self.group)?,
            FormKind::Announcement => Body::Json(to_json(announcement::payload(&self.group))?),
            FormKind::FeePlan => Body::Json(to_json(fee_plan::payload(&self.group)?)?),
            FormKind::Login => Body::Json(to_json(login::payload(&self.group))?),
        };
        Ok(Submission {
            endpoint: self.kind.endpoint(),
            body,
        })
    }
}

fn to_json<T: Serialize>(payload: T) -> Result<Value, FormError> {
    serde_json::to_value(payload).map_err(|e| FormError::Payload(e.to_string()))
}

/// Rewrites arrays of objects into objects keyed by index so that repeated
/// sub-forms line up with groups named `"0"`, `"1"`, ...
fn index_arrays(v: &Value) -> Value {
    match v {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), index_arrays(v)))
                .collect(),
        ),
        Value::Array(items) if items.iter().any(Value::is_object) => Value::Object(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), index_arrays(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
