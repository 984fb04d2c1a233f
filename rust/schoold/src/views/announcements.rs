use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{contains_ci, filter_matches};
use crate::entities::exam::parse_moment;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRow {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub date: String,
    #[serde(default)]
    pub author: String,
    pub priority: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnnouncementQuery {
    pub search: String,
    pub priority: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnouncementView<'a> {
    #[serde(flatten)]
    row: &'a AnnouncementRow,
    relative_time: String,
}

impl AnnouncementRow {
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        parse_moment(&self.date)
    }

    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }

    fn matches(&self, q: &AnnouncementQuery) -> bool {
        let search = contains_ci(&self.title, &q.search)
            || contains_ci(&self.content, &q.search)
            || contains_ci(&self.author, &q.search);
        search && filter_matches(&q.priority, &self.priority)
    }
}

/// `Yesterday`, `N days ago`, `N weeks ago`, or the date itself beyond a month.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let ms = (now - at).num_milliseconds().abs();
    let days = ms / DAY_MS + i64::from(ms % DAY_MS != 0);
    match days {
        1 => "Yesterday".to_string(),
        d if d <= 7 => format!("{d} days ago"),
        d if d <= 30 => format!("{} weeks ago", (d + 6) / 7),
        _ => at.format("%a, %b %-d, %Y").to_string(),
    }
}

/// Newest first; rows without a readable date sink to the end.
pub fn newest_first(rows: &mut [&AnnouncementRow]) {
    rows.sort_by(|a, b| b.posted_at().cmp(&a.posted_at()));
}

pub fn query(rows: &[AnnouncementRow], q: &AnnouncementQuery, now: DateTime<Utc>) -> Value {
    let week_ago = now - Duration::days(7);
    let this_week = rows
        .iter()
        .filter(|a| a.posted_at().is_some_and(|t| t >= week_ago))
        .count();

    let mut filtered: Vec<&AnnouncementRow> = rows.iter().filter(|a| a.matches(q)).collect();
    newest_first(&mut filtered);
    let views: Vec<AnnouncementView> = filtered
        .into_iter()
        .map(|row| AnnouncementView {
            row,
            relative_time: row
                .posted_at()
                .map(|t| relative_time(t, now))
                .unwrap_or_default(),
        })
        .collect();

    json!({
        "rows": views,
        "stats": {
            "total": rows.len(),
            "active": rows.iter().filter(|a| a.is_active()).count(),
            "highPriority": rows.iter().filter(|a| a.priority == "High").count(),
            "thisWeek": this_week,
        },
    })
}
