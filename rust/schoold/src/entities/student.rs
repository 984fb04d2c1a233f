use serde_json::{json, Value};

use super::FormError;
use crate::api::types::CreateStudentRequest;
use crate::form::{Field, FieldGroup, PatternKind, Validator};

pub const SECTIONS: &[&str] = &["Green", "Blue", "Red"];

pub fn group() -> FieldGroup {
    FieldGroup::new("student")
        .field("name", Field::text().required().with(Validator::MinLength(2)))
        .field(
            "age",
            Field::text()
                .required()
                .with(Validator::Integer)
                .with(Validator::Min(5.0))
                .with(Validator::Max(20.0)),
        )
        .field(
            "rollNo",
            Field::text()
                .required()
                .with(Validator::Pattern(PatternKind::Alphanumeric)),
        )
        .field(
            "grade",
            Field::text()
                .required()
                .with(Validator::Integer)
                .with(Validator::Min(1.0))
                .with(Validator::Max(12.0)),
        )
        .field("section", Field::text().required().with(Validator::OneOf(SECTIONS)))
}

pub fn derived(g: &FieldGroup) -> Value {
    let grade = g.text_of("grade");
    let section = g.text_of("section");
    let grade_section = if grade.is_empty() || section.is_empty() {
        String::new()
    } else {
        format!("Grade {grade}, Section {section}")
    };
    json!({
        "gradeSection": grade_section,
        "showSections": !grade.is_empty(),
    })
}

pub fn payload(g: &FieldGroup) -> Result<CreateStudentRequest, FormError> {
    let number = |path: &str| {
        g.integer_of(path)
            .ok_or_else(|| FormError::Payload(format!("{path} must be a whole number")))
    };
    Ok(CreateStudentRequest {
        name: g.text_of("name").trim().to_string(),
        age: number("age")?,
        roll_no: g.text_of("rollNo"),
        grade: number("grade")?,
        section: g.text_of("section"),
    })
}
