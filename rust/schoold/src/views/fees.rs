use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{contains_ci, filter_matches};
use crate::entities::exam::parse_moment;

const RECENT_PAYMENTS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRow {
    pub student_name: String,
    pub class: String,
    pub roll_no: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
    pub payment_status: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeeQuery {
    pub search: String,
    pub status: String,
}

impl FeeRow {
    fn matches(&self, q: &FeeQuery) -> bool {
        let search = contains_ci(&self.student_name, &q.search)
            || self.roll_no.contains(&q.search)
            || contains_ci(&self.class, &q.search);
        search && filter_matches(&q.status, &self.payment_status)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTotals {
    pub total_amount: f64,
    pub paid_amount: f64,
    pub due_amount: f64,
    pub paid_count: usize,
    pub due_count: usize,
    pub partial_count: usize,
    /// Percentage of billed fees collected; 0 when nothing is billed.
    pub collection_rate: f64,
}

pub fn totals(rows: &[FeeRow]) -> FeeTotals {
    let mut t = FeeTotals::default();
    for r in rows {
        t.total_amount += r.total_amount;
        t.paid_amount += r.paid_amount;
        t.due_amount += r.due_amount;
        match r.payment_status.as_str() {
            "Paid" => t.paid_count += 1,
            "Due" => t.due_count += 1,
            "Partial" => t.partial_count += 1,
            _ => {}
        }
    }
    if t.total_amount > 0.0 {
        t.collection_rate = t.paid_amount / t.total_amount * 100.0;
    }
    t
}

pub fn recent_payments(rows: &[FeeRow]) -> Vec<&FeeRow> {
    let mut paid: Vec<(&FeeRow, _)> = rows
        .iter()
        .filter_map(|r| {
            let at = parse_moment(r.payment_date.as_deref()?)?;
            Some((r, at))
        })
        .collect();
    paid.sort_by(|a, b| b.1.cmp(&a.1));
    paid.into_iter().take(RECENT_PAYMENTS).map(|(r, _)| r).collect()
}

pub fn query(rows: &[FeeRow], q: &FeeQuery) -> Value {
    let filtered: Vec<&FeeRow> = rows.iter().filter(|r| r.matches(q)).collect();
    json!({
        "rows": filtered,
        "stats": totals(rows),
        "recentPayments": recent_payments(rows),
    })
}
