use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{contains_ci, filter_matches};
use crate::entities::exam::parse_moment;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamRow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub class_from: i64,
    pub class_to: i64,
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExamQuery {
    pub search: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExamView<'a> {
    #[serde(flatten)]
    row: &'a ExamRow,
    class_range: String,
    duration: String,
    display_status: String,
}

impl ExamRow {
    pub fn class_range(&self) -> String {
        if self.class_from == self.class_to {
            format!("Class {}", self.class_from)
        } else {
            format!("Class {}-{}", self.class_from, self.class_to)
        }
    }

    /// Whole days between start and end, rounded up.
    pub fn duration(&self) -> String {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        let (Some(start), Some(end)) = (parse_moment(&self.start_date), parse_moment(&self.end_date))
        else {
            return String::new();
        };
        let ms = (end - start).num_milliseconds().abs();
        let days = ms / DAY_MS + i64::from(ms % DAY_MS != 0);
        if days == 1 {
            "1 day".to_string()
        } else {
            format!("{days} days")
        }
    }

    fn matches(&self, q: &ExamQuery) -> bool {
        let search = contains_ci(&self.name, &q.search)
            || contains_ci(&self.description, &q.search)
            || contains_ci(&self.class_range(), &q.search);
        search && filter_matches(&q.status, &self.status)
    }
}

pub fn display_status(status: &str) -> String {
    match status {
        "UPCOMING" => "Upcoming".into(),
        "ONGOING" => "Ongoing".into(),
        "COMPLETED" => "Completed".into(),
        other => other.to_string(),
    }
}

fn by_start(a: &ExamRow, b: &ExamRow) -> Ordering {
    match (parse_moment(&a.start_date), parse_moment(&b.start_date)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn query(rows: &[ExamRow], q: &ExamQuery) -> Value {
    let count = |status: &str| rows.iter().filter(|e| e.status == status).count();
    let mut filtered: Vec<&ExamRow> = rows.iter().filter(|e| e.matches(q)).collect();
    filtered.sort_by(|a, b| by_start(a, b));
    let views: Vec<ExamView> = filtered
        .into_iter()
        .map(|row| ExamView {
            row,
            class_range: row.class_range(),
            duration: row.duration(),
            display_status: display_status(&row.status),
        })
        .collect();
    json!({
        "rows": views,
        "stats": {
            "total": rows.len(),
            "upcoming": count("UPCOMING"),
            "ongoing": count("ONGOING"),
            "completed": count("COMPLETED"),
        },
    })
}
