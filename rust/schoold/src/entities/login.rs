use crate::api::types::LoginRequest;
use crate::form::{Field, FieldGroup, PatternKind, Validator};

pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub fn group() -> FieldGroup {
    FieldGroup::new("login")
        .field(
            "email",
            Field::text()
                .required()
                .with(Validator::Pattern(PatternKind::Email)),
        )
        .field("password", Field::text().required().with(Validator::MinLength(6)))
}

pub fn payload(g: &FieldGroup) -> LoginRequest {
    LoginRequest {
        email: g.text_of("email").trim().to_string(),
        password: g.text_of("password"),
    }
}
