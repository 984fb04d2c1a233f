use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::text_or_number;

pub const WEEKDAYS: &[&str] = &["monday", "tuesday", "wednesday", "thursday", "friday"];

/// Accepts both the seeded list shape (`classTeacher`, `schedule`) and the
/// backend's create shape (`teacher`, `weeklySchedule`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRow {
    #[serde(deserialize_with = "text_or_number")]
    pub grade: String,
    #[serde(deserialize_with = "text_or_number")]
    pub section: String,
    #[serde(default, alias = "teacher")]
    pub class_teacher: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default, alias = "weeklySchedule")]
    pub schedule: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClassQuery {
    /// Index of the class whose weekday timetable to expand.
    pub selected: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleRow<'a> {
    pub day: &'static str,
    pub subjects: &'a [String],
}

impl ClassRow {
    pub fn weekday_rows(&self) -> Vec<ScheduleRow<'_>> {
        WEEKDAYS
            .iter()
            .map(|&day| ScheduleRow {
                day,
                subjects: self.schedule.get(day).map(Vec::as_slice).unwrap_or(&[]),
            })
            .collect()
    }
}

pub fn query(rows: &[ClassRow], q: &ClassQuery) -> Value {
    let selected = q.selected.and_then(|i| rows.get(i)).map(|c| {
        json!({
            "class": c,
            "schedule": c.weekday_rows(),
        })
    });
    json!({
        "rows": rows,
        "total": rows.len(),
        "days": WEEKDAYS,
        "selected": selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_and_seed_shapes_both_decode() {
        let rows: Vec<ClassRow> = serde_json::from_value(json!([
            {
                "id": 1, "name": "Grade 5 - A", "grade": "5", "section": "A",
                "classTeacher": "Ms. Ayesha", "totalStudents": 30, "subjects": ["English"],
                "room": "12", "schedule": { "monday": ["English"] }
            },
            {
                "_id": "c2", "grade": 6, "section": "B", "room": 4, "teacher": "Mr. Ali",
                "subjects": ["Physics"], "weeklySchedule": { "friday": ["Physics"] }
            }
        ]))
        .unwrap();
        assert_eq!(rows[1].grade, "6");
        assert_eq!(rows[1].class_teacher, "Mr. Ali");

        let out = query(&rows, &ClassQuery { selected: Some(1) });
        let schedule = out["selected"]["schedule"].as_array().unwrap();
        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule[0], json!({ "day": "monday", "subjects": [] }));
        assert_eq!(schedule[4], json!({ "day": "friday", "subjects": ["Physics"] }));
        assert_eq!(out["rows"][0]["totalStudents"], json!(30));
    }

    #[test]
    fn out_of_range_selection_is_null() {
        let out = query(&[], &ClassQuery { selected: Some(3) });
        assert!(out["selected"].is_null());
    }
}
