use chrono::Utc;
use serde_json::Value;

use super::params_as;
use crate::entities::exam::parse_moment;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::views::{announcements, classes, dashboard, exams, fees, students, teachers};

fn handle_announcements(state: &mut AppState, req: &Request) -> Value {
    let q: announcements::AnnouncementQuery = match params_as(req) {
        Ok(q) => q,
        Err(e) => return e,
    };
    // `now` pins relative times; defaults to the current clock.
    let now = match req.params.get("now").and_then(|v| v.as_str()) {
        None => Utc::now(),
        Some(s) => match parse_moment(s) {
            Some(t) => t,
            None => return err(&req.id, "bad_params", format!("invalid now: {s}"), None),
        },
    };
    ok(
        &req.id,
        announcements::query(&state.datasets.announcements, &q, now),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let ds = &state.datasets;
    let result = match req.method.as_str() {
        "students.query" => params_as(req).map(|q: students::StudentQuery| students::query(&ds.students, &q)),
        "teachers.query" => params_as(req).map(|q: teachers::TeacherQuery| teachers::query(&ds.teachers, &q)),
        "classes.query" => params_as(req).map(|q: classes::ClassQuery| classes::query(&ds.classes, &q)),
        "exams.query" => params_as(req).map(|q: exams::ExamQuery| exams::query(&ds.exams, &q)),
        "fees.query" => params_as(req).map(|q: fees::FeeQuery| fees::query(&ds.fees, &q)),
        "dashboard.summary" => Ok(dashboard::summary(ds)),
        "announcements.query" => return Some(handle_announcements(state, req)),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e,
    })
}
