//! Request and response shapes exchanged with the backend. Responses are
//! decoded here so that malformed payloads never reach the wizards or views.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    message: Option<MessageField>,
}

impl ErrorBody {
    pub fn into_messages(self) -> Vec<String> {
        match self.message {
            Some(MessageField::One(m)) if !m.trim().is_empty() => vec![m],
            Some(MessageField::Many(list)) => {
                list.into_iter().filter(|m| !m.trim().is_empty()).collect()
            }
            _ => Vec::new(),
        }
    }
}

pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub grade: i64,
    pub section: String,
    pub room: i64,
    pub teacher: String,
    pub subjects: Vec<String>,
    pub weekly_schedule: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassResponse {
    pub data: Map<String, Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub title: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalInfo {
    pub subject: String,
    pub department: String,
    pub qualification_degree: String,
    pub qualification_subject: String,
    pub experience: i64,
    pub joining_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeachingClass {
    pub grade: i64,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherRequest {
    pub personal_info: PersonalInfo,
    pub professional_info: ProfessionalInfo,
    pub teaching_classes: Vec<TeachingClass>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeacherResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub name: String,
    pub age: i64,
    pub roll_no: String,
    pub grade: i64,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAnnouncementRequest {
    pub title: String,
    pub description: String,
    pub to_whom: String,
    pub priority: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeComponent {
    pub name: String,
    pub amount: f64,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeDiscount {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeePlanRequest {
    pub title: String,
    pub components: Vec<FeeComponent>,
    pub admission_fee: f64,
    pub security_deposit: f64,
    pub discounts: Vec<FeeDiscount>,
    pub class: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub verified: bool,
}

/// `GET /exam/getAll` answers `{ founded, exams }`.
#[derive(Debug, Deserialize)]
pub struct ExamListResponse {
    pub founded: bool,
    #[serde(default)]
    pub exams: Vec<Value>,
}

/// Other list endpoints answer `{ data: [...] }`.
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub data: Vec<Value>,
}
