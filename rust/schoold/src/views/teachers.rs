use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::contains_ci;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherRow {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub department: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TeacherQuery {
    pub search: String,
}

/// Teachers created through the wizard come back from the backend with
/// `personalInfo` / `professionalInfo` sections; lift the fields the list
/// needs to the top level.
pub(crate) fn lift_nested(mut row: Value) -> Value {
    if let Some(obj) = row.as_object_mut() {
        let pick = |obj: &Map<String, Value>, section: &str, key: &str| {
            obj.get(section).and_then(|s| s.get(key)).cloned()
        };
        if !obj.contains_key("name") {
            if let Some(v) = pick(obj, "personalInfo", "fullName") {
                obj.insert("name".into(), v);
            }
        }
        for key in ["subject", "department"] {
            if !obj.contains_key(key) {
                if let Some(v) = pick(obj, "professionalInfo", key) {
                    obj.insert(key.into(), v);
                }
            }
        }
    }
    row
}

pub fn query(rows: &[TeacherRow], q: &TeacherQuery) -> Value {
    let filtered: Vec<&TeacherRow> = rows
        .iter()
        .filter(|t| {
            contains_ci(&t.name, &q.search)
                || contains_ci(&t.subject, &q.search)
                || contains_ci(&t.department, &q.search)
        })
        .collect();
    json!({ "rows": filtered, "total": rows.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{DatasetKind, Datasets};

    #[test]
    fn search_covers_name_subject_and_department() {
        let mut ds = Datasets::default();
        ds.load(
            DatasetKind::Teachers,
            vec![
                json!({ "name": "Ms. Ayesha", "subject": "Physics", "department": "Science" }),
                json!({ "name": "Mr. Hamid", "subject": "History", "department": "Humanities" }),
                json!({
                    "_id": "t3",
                    "personalInfo": { "fullName": "Ms. Fatima" },
                    "professionalInfo": { "subject": "Biology", "department": "Science" }
                }),
            ],
        )
        .unwrap();
        let q = |s: &str| TeacherQuery { search: s.into() };
        assert_eq!(query(&ds.teachers, &q("science"))["rows"].as_array().unwrap().len(), 2);
        assert_eq!(query(&ds.teachers, &q("hist"))["rows"][0]["name"], json!("Mr. Hamid"));
        assert_eq!(query(&ds.teachers, &q("fatima"))["rows"][0]["_id"], json!("t3"));
        assert_eq!(query(&ds.teachers, &q(""))["rows"].as_array().unwrap().len(), 3);
    }
}
