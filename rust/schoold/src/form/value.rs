use serde::{Deserialize, Serialize};

// 2^53
const MAX_WHOLE: f64 = 9_007_199_254_740_992.0;

/// Current value of a single form control.
///
/// Select and text inputs both arrive as `Text`; numeric inputs may arrive as
/// either `Number` or numeric `Text`, so numeric validators go through
/// [`FieldValue::as_number`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn empty_text() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn empty_list() -> Self {
        FieldValue::List(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::List(v) => v.is_empty(),
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Number without a fractional part, within the range f64 holds exactly.
    pub fn as_whole(&self) -> Option<i64> {
        self.as_number()
            .filter(|n| n.fract() == 0.0 && n.abs() <= MAX_WHOLE)
            .map(|n| n as i64)
    }

    pub fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Text(s) => s == "true",
            _ => false,
        }
    }

    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::List(v) => v,
            _ => &[],
        }
    }

    /// Display text of a scalar value. Whole numbers render without a fraction.
    pub fn text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::List(v) => v.join(", "),
        }
    }

    /// Decodes a value sent by the UI. `Ok(None)` means "clear the field".
    pub fn from_json(raw: &serde_json::Value) -> Result<Option<FieldValue>, String> {
        if raw.is_null() {
            return Ok(None);
        }
        serde_json::from_value::<FieldValue>(raw.clone())
            .map(Some)
            .map_err(|_| format!("unsupported field value: {raw}"))
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_ui_values_by_shape() {
        assert_eq!(
            FieldValue::from_json(&json!(5)).unwrap(),
            Some(FieldValue::Number(5.0))
        );
        assert_eq!(
            FieldValue::from_json(&json!("A")).unwrap(),
            Some(FieldValue::Text("A".into()))
        );
        assert_eq!(
            FieldValue::from_json(&json!(["Physics"])).unwrap(),
            Some(FieldValue::List(vec!["Physics".into()]))
        );
        assert_eq!(FieldValue::from_json(&json!(null)).unwrap(), None);
        assert!(FieldValue::from_json(&json!({ "a": 1 })).is_err());
    }

    #[test]
    fn numeric_text_reads_as_number() {
        assert_eq!(FieldValue::Text(" 12 ".into()).as_number(), Some(12.0));
        assert_eq!(FieldValue::Text("twelve".into()).as_number(), None);
        assert_eq!(FieldValue::Number(12.0).text(), "12");
        assert_eq!(FieldValue::Number(2.5).text(), "2.5");
    }
}
