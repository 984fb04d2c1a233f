use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{contains_ci, filter_matches};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    pub name: String,
    pub roll_no: String,
    pub class: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentQuery {
    pub search: String,
    pub class: String,
}

impl StudentRow {
    fn matches(&self, q: &StudentQuery) -> bool {
        let search = contains_ci(&self.name, &q.search) || self.roll_no.contains(&q.search);
        search && filter_matches(&q.class, &self.class)
    }
}

/// Classes in first-seen order.
pub fn unique_classes(rows: &[StudentRow]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for r in rows {
        if !out.contains(&r.class.as_str()) {
            out.push(&r.class);
        }
    }
    out
}

pub fn query(rows: &[StudentRow], q: &StudentQuery) -> Value {
    let filtered: Vec<&StudentRow> = rows.iter().filter(|r| r.matches(q)).collect();
    json!({
        "rows": filtered,
        "total": rows.len(),
        "classes": unique_classes(rows),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<StudentRow> {
        serde_json::from_value(json!([
            { "id": 1, "name": "Ayesha Noor", "rollNo": "S101", "class": "5A", "status": "Active" },
            { "id": 2, "name": "Bilal Khan", "rollNo": "S202", "class": "6B", "status": "Inactive" },
            { "id": 3, "name": "Sana Ali", "rollNo": "S103", "class": "5A", "status": "Active" }
        ]))
        .unwrap()
    }

    #[test]
    fn search_matches_name_or_roll_number() {
        let rows = rows();
        let q = StudentQuery {
            search: "ALI".into(),
            class: "all".into(),
        };
        let out = query(&rows, &q);
        assert_eq!(out["rows"].as_array().unwrap().len(), 1);
        assert_eq!(out["rows"][0]["id"], json!(3));

        let q = StudentQuery {
            search: "S10".into(),
            class: "5A".into(),
        };
        assert_eq!(query(&rows, &q)["rows"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn class_list_keeps_first_seen_order() {
        assert_eq!(unique_classes(&rows()), vec!["5A", "6B"]);
    }
}
