//! In-memory datasets behind the list pages, and the filter, sort and
//! summary queries over them.
//!
//! Rows arrive either from the shell (`data.load`) or from the backend
//! (`data.fetch`). Either way they are decoded into typed rows up front; a
//! single malformed row rejects the whole batch so a page never renders
//! half a dataset.

pub mod announcements;
pub mod classes;
pub mod dashboard;
pub mod exams;
pub mod fees;
pub mod students;
pub mod teachers;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::info;

use crate::api::paths::{GET_ALL_CLASSES, GET_ALL_EXAMS, GET_ALL_TEACHERS};
use crate::api::types::{decode, ExamListResponse, ListResponse};
use crate::api::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    Students,
    Teachers,
    Classes,
    Exams,
    Announcements,
    Fees,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        Self::Students,
        Self::Teachers,
        Self::Classes,
        Self::Exams,
        Self::Announcements,
        Self::Fees,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "students" => Some(Self::Students),
            "teachers" => Some(Self::Teachers),
            "classes" => Some(Self::Classes),
            "exams" => Some(Self::Exams),
            "announcements" => Some(Self::Announcements),
            "fees" => Some(Self::Fees),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Teachers => "teachers",
            Self::Classes => "classes",
            Self::Exams => "exams",
            Self::Announcements => "announcements",
            Self::Fees => "fees",
        }
    }

    /// Backend list endpoint, for the kinds the backend serves.
    pub fn endpoint(self) -> Option<&'static str> {
        match self {
            Self::Classes => Some(GET_ALL_CLASSES),
            Self::Teachers => Some(GET_ALL_TEACHERS),
            Self::Exams => Some(GET_ALL_EXAMS),
            _ => None,
        }
    }

    /// Pulls the row array out of a list endpoint's response body.
    pub fn rows_from_response(self, body: Value) -> Result<Vec<Value>, ApiError> {
        match self {
            Self::Exams => {
                let resp: ExamListResponse = decode(body)?;
                Ok(if resp.founded { resp.exams } else { Vec::new() })
            }
            _ => Ok(decode::<ListResponse>(body)?.data),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("{kind} row {index} is malformed: {reason}")]
    MalformedRow {
        kind: &'static str,
        index: usize,
        reason: String,
    },
}

#[derive(Debug, Default)]
pub struct Datasets {
    pub students: Vec<students::StudentRow>,
    pub teachers: Vec<teachers::TeacherRow>,
    pub classes: Vec<classes::ClassRow>,
    pub exams: Vec<exams::ExamRow>,
    pub announcements: Vec<announcements::AnnouncementRow>,
    pub fees: Vec<fees::FeeRow>,
}

impl Datasets {
    /// Replaces the rows of `kind`. Nothing changes if any row is malformed.
    pub fn load(&mut self, kind: DatasetKind, rows: Vec<Value>) -> Result<usize, ViewError> {
        let n = rows.len();
        match kind {
            DatasetKind::Students => self.students = decode_rows(kind, rows)?,
            DatasetKind::Teachers => {
                let rows = rows.into_iter().map(teachers::lift_nested).collect();
                self.teachers = decode_rows(kind, rows)?;
            }
            DatasetKind::Classes => self.classes = decode_rows(kind, rows)?,
            DatasetKind::Exams => self.exams = decode_rows(kind, rows)?,
            DatasetKind::Announcements => self.announcements = decode_rows(kind, rows)?,
            DatasetKind::Fees => self.fees = decode_rows(kind, rows)?,
        }
        info!(dataset = kind.as_str(), rows = n, "dataset loaded");
        Ok(n)
    }

    pub fn len(&self, kind: DatasetKind) -> usize {
        match kind {
            DatasetKind::Students => self.students.len(),
            DatasetKind::Teachers => self.teachers.len(),
            DatasetKind::Classes => self.classes.len(),
            DatasetKind::Exams => self.exams.len(),
            DatasetKind::Announcements => self.announcements.len(),
            DatasetKind::Fees => self.fees.len(),
        }
    }
}

fn decode_rows<T: DeserializeOwned>(kind: DatasetKind, rows: Vec<Value>) -> Result<Vec<T>, ViewError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| ViewError::MalformedRow {
                kind: kind.as_str(),
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Case-insensitive substring match. An empty needle matches everything.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// `"all"` (or nothing) disables a filter.
pub(crate) fn filter_matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || filter == "all" || filter == value
}

/// Accepts `"5"` or `5`.
pub(crate) fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
