use serde_json::{json, Value};

use crate::api::types::CreateAnnouncementRequest;
use crate::form::{Field, FieldGroup, Validator};

pub const AUDIENCES: &[&str] = &["parent", "teacher", "student", "all"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high"];
pub const DESCRIPTION_MAX: usize = 500;

pub fn audience_label(value: &str) -> &'static str {
    match value {
        "parent" => "Parents",
        "teacher" => "Teachers",
        "student" => "Students",
        "all" => "Everyone",
        _ => "",
    }
}

pub fn group() -> FieldGroup {
    FieldGroup::new("announcement")
        .field(
            "title",
            Field::text()
                .required()
                .with(Validator::MinLength(3))
                .with(Validator::MaxLength(100)),
        )
        .field(
            "description",
            Field::text()
                .required()
                .with(Validator::MinLength(10))
                .with(Validator::MaxLength(DESCRIPTION_MAX)),
        )
        .field("to_whom", Field::text().required().with(Validator::OneOf(AUDIENCES)))
        .field("priority", Field::text().required().with(Validator::OneOf(PRIORITIES)))
        .field("is_active", Field::flag(false))
}

pub fn derived(g: &FieldGroup) -> Value {
    json!({
        "descriptionLength": g.text_of("description").chars().count(),
        "descriptionMax": DESCRIPTION_MAX,
        "audienceLabel": audience_label(&g.text_of("to_whom")),
    })
}

pub fn payload(g: &FieldGroup) -> CreateAnnouncementRequest {
    CreateAnnouncementRequest {
        title: g.text_of("title"),
        description: g.text_of("description"),
        to_whom: g.text_of("to_whom"),
        priority: g.text_of("priority"),
        is_active: g.value_of("is_active").is_some_and(|v| v.as_flag()),
    }
}
