//! Field values, validators and the FieldGroup tree shared by the wizards
//! and the single-page entity forms.

mod group;
mod validate;
mod value;

pub use group::{CollectErrors, Field, FieldGroup, FormNode, FormVisitor, FormVisitorMut, MarkTouched};
pub use validate::{FieldError, PatternKind, Validator};
pub use value::FieldValue;

/// Joins a dotted path prefix with a child name.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
