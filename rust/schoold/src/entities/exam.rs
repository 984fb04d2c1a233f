//! Exam creation form. The date-sheet image is referenced by a local path
//! and uploaded as multipart alongside the other fields.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::{Attachment, Body, FormError};
use crate::form::{Field, FieldError, FieldGroup, Validator};

pub const STATUSES: &[&str] = &["UPCOMING", "ONGOING", "COMPLETED", "CANCELLED"];
pub const MAX_CLASS: i64 = 12;
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const IMAGE_FIELD: &str = "date_sheet_image";

pub fn group() -> FieldGroup {
    let class = || {
        Field::text()
            .required()
            .with(Validator::Min(1.0))
            .with(Validator::Max(MAX_CLASS as f64))
    };
    FieldGroup::new("exam")
        .field("name", Field::text().required().with(Validator::MinLength(3)))
        .field("description", Field::text())
        .field("start_date", Field::text().required())
        .field("end_date", Field::text().required())
        .field("class_from", class())
        .field("class_to", class())
        .field(IMAGE_FIELD, Field::text().required())
        .field("status", Field::text().required().with(Validator::OneOf(STATUSES)))
}

/// Accepts RFC 3339, `datetime-local` style (`2025-03-01T09:00`) and plain
/// dates. Naive values are taken as UTC.
pub fn parse_moment(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// `"N hours"` when the span rounds up to a single day, else `"N days"`.
pub fn duration_label(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const HOUR_MS: i64 = 60 * 60 * 1000;
    let ms = (end - start).num_milliseconds();
    let days = ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0);
    if days == 1 {
        format!("{} hours", ms.div_euclid(HOUR_MS))
    } else {
        format!("{days} days")
    }
}

fn class_bound(g: &FieldGroup, path: &str) -> Option<i64> {
    g.integer_of(path).filter(|n| (1..=MAX_CLASS).contains(n))
}

fn image_mime(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

pub fn cross_errors(g: &FieldGroup) -> Vec<(String, FieldError)> {
    let mut out = Vec::new();

    let start_raw = g.text_of("start_date");
    let end_raw = g.text_of("end_date");
    let start = parse_moment(&start_raw);
    let end = parse_moment(&end_raw);
    if !start_raw.is_empty() && start.is_none() {
        out.push(("start_date".into(), FieldError::new("date", "enter a valid date")));
    }
    if !end_raw.is_empty() && end.is_none() {
        out.push(("end_date".into(), FieldError::new("date", "enter a valid date")));
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end <= start {
            out.push((
                "end_date".into(),
                FieldError::new("endDateInvalid", "end date must be after the start date"),
            ));
        }
    }

    if let (Some(from), Some(to)) = (class_bound(g, "class_from"), class_bound(g, "class_to")) {
        if to < from {
            out.push((
                "class_to".into(),
                FieldError::new("classRangeInvalid", "last class must not precede the first"),
            ));
        }
    }

    let image = g.text_of(IMAGE_FIELD);
    if !image.is_empty() {
        if image_mime(&image).is_none() {
            out.push((
                IMAGE_FIELD.into(),
                FieldError::new("fileType", "select a PNG, JPG or JPEG image"),
            ));
        } else {
            match std::fs::metadata(&image) {
                Ok(meta) if meta.len() > MAX_IMAGE_BYTES => out.push((
                    IMAGE_FIELD.into(),
                    FieldError::new("fileSize", "file size must be less than 5MB"),
                )),
                Ok(_) => {}
                Err(_) => out.push((
                    IMAGE_FIELD.into(),
                    FieldError::new("fileMissing", "the selected file cannot be read"),
                )),
            }
        }
    }
    out
}

pub fn derived(g: &FieldGroup) -> Value {
    let from = class_bound(g, "class_from");
    let to = class_bound(g, "class_to");
    let available: Vec<i64> = (from.unwrap_or(1)..=MAX_CLASS).collect();
    let class_count = match (from, to) {
        (Some(from), Some(to)) => (to - from + 1).max(0),
        _ => 0,
    };
    let duration = match (
        parse_moment(&g.text_of("start_date")),
        parse_moment(&g.text_of("end_date")),
    ) {
        (Some(start), Some(end)) => duration_label(start, end),
        _ => String::new(),
    };
    json!({
        "availableToClasses": available,
        "duration": duration,
        "classCount": class_count,
    })
}

fn iso(g: &FieldGroup, path: &str) -> Result<String, FormError> {
    parse_moment(&g.text_of(path))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| FormError::Payload(format!("{path} is not a date")))
}

pub fn body(g: &FieldGroup) -> Result<Body, FormError> {
    let path = g.text_of(IMAGE_FIELD);
    let mime = image_mime(&path).ok_or_else(|| FormError::Payload("unsupported image type".into()))?;
    let bytes = std::fs::read(&path).map_err(|source| FormError::Attachment {
        path: path.clone(),
        source,
    })?;
    let file_name = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(IMAGE_FIELD)
        .to_string();

    let fields = vec![
        ("name", g.text_of("name")),
        ("description", g.text_of("description")),
        ("start_date", iso(g, "start_date")?),
        ("end_date", iso(g, "end_date")?),
        ("class_from", g.text_of("class_from")),
        ("class_to", g.text_of("class_to")),
        ("status", g.text_of("status")),
    ];
    Ok(Body::Multipart {
        fields,
        file: Attachment {
            field: IMAGE_FIELD,
            file_name,
            mime,
            bytes,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FilledForm, FormKind};
    use chrono::TimeZone;

    fn temp_image(name: &str, len: usize) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("schoold-exam-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        std::fs::write(&p, vec![0u8; len]).unwrap();
        p
    }

    fn exam_values(image: &str) -> Value {
        json!({
            "name": "Midterms",
            "description": "",
            "start_date": "2025-03-01T09:00",
            "end_date": "2025-03-05T12:00",
            "class_from": "3",
            "class_to": "5",
            "date_sheet_image": image,
            "status": "UPCOMING"
        })
    }

    #[test]
    fn duration_switches_to_hours_within_a_day() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(
            duration_label(start, Utc.with_ymd_and_hms(2025, 3, 1, 15, 0, 0).unwrap()),
            "6 hours"
        );
        assert_eq!(
            duration_label(start, Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap()),
            "24 hours"
        );
        assert_eq!(
            duration_label(start, Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap()),
            "2 days"
        );
    }

    #[test]
    fn cross_field_errors_land_on_dependent_fields() {
        let mut v = exam_values("sheet.gif");
        v["end_date"] = json!("2025-02-27");
        v["class_from"] = json!(6);
        v["class_to"] = json!(4);
        let form = FilledForm::new(FormKind::Exam, &v, None).unwrap();
        let errors: Vec<(String, &str)> = form
            .evaluate()
            .errors
            .into_iter()
            .map(|e| (e.path, e.code))
            .collect();
        assert!(errors.contains(&("end_date".to_string(), "endDateInvalid")));
        assert!(errors.contains(&("class_to".to_string(), "classRangeInvalid")));
        assert!(errors.contains(&("date_sheet_image".to_string(), "fileType")));
    }

    #[test]
    fn derived_values_describe_the_range() {
        let form = FilledForm::new(FormKind::Exam, &exam_values(""), None).unwrap();
        let d = form.evaluate().derived;
        assert_eq!(d["availableToClasses"], json!([3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
        assert_eq!(d["classCount"], json!(3));
        assert_eq!(d["duration"], json!("5 days"));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let big = temp_image("sheet.png", (MAX_IMAGE_BYTES + 1) as usize);
        let form =
            FilledForm::new(FormKind::Exam, &exam_values(big.to_str().unwrap()), None).unwrap();
        let eval = form.evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.errors[0].code, "fileSize");
    }

    #[test]
    fn valid_exam_becomes_multipart_with_iso_dates() {
        let img = temp_image("sheet.JPG", 64);
        let form =
            FilledForm::new(FormKind::Exam, &exam_values(img.to_str().unwrap()), None).unwrap();
        let sub = form.submission().unwrap();
        assert_eq!(sub.endpoint, "/exam/create");
        let Body::Multipart { fields, file } = sub.body else {
            panic!("expected multipart body");
        };
        assert!(fields.contains(&("start_date", "2025-03-01T09:00:00.000Z".to_string())));
        assert!(fields.contains(&("class_to", "5".to_string())));
        assert_eq!(file.file_name, "sheet.JPG");
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.bytes.len(), 64);
    }
}
