use serde_json::{json, Value};

use super::announcements::{newest_first, AnnouncementRow};
use super::fees::totals;
use super::Datasets;

const RECENT_ANNOUNCEMENTS: usize = 3;

pub fn summary(ds: &Datasets) -> Value {
    let mut active: Vec<&AnnouncementRow> =
        ds.announcements.iter().filter(|a| a.is_active()).collect();
    newest_first(&mut active);
    active.truncate(RECENT_ANNOUNCEMENTS);

    json!({
        "totalStudents": ds.students.len(),
        "activeStudents": ds.students.iter().filter(|s| s.status == "Active").count(),
        "totalTeachers": ds.teachers.len(),
        "totalPendingFees": totals(&ds.fees).due_amount,
        "recentAnnouncements": active,
    })
}
