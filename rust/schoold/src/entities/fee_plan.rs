use serde_json::{json, Value};

use super::FormError;
use crate::api::types::{CreateFeePlanRequest, FeeComponent, FeeDiscount};
use crate::form::{Field, FieldError, FieldGroup, FieldValue, FormNode, Validator};

pub const FREQUENCIES: &[&str] = &["monthly", "quarterly", "yearly", "one-time"];

fn component(name: String) -> FieldGroup {
    FieldGroup::new(name)
        .field("name", Field::text().required().with(Validator::MinLength(2)))
        .field("amount", Field::text().required().with(Validator::Min(1.0)))
        .field(
            "frequency",
            Field::new(FieldValue::Text("monthly".into()))
                .required()
                .with(Validator::OneOf(FREQUENCIES)),
        )
}

fn discount(name: String) -> FieldGroup {
    FieldGroup::new(name)
        .field("description", Field::text().required().with(Validator::MinLength(3)))
        .field("amount", Field::text().required().with(Validator::Min(1.0)))
}

fn repeated(name: &str, count: usize, make: fn(String) -> FieldGroup) -> FieldGroup {
    (0..count).fold(FieldGroup::new(name), |g, i| g.group(make(i.to_string())))
}

fn count(values: &Value, key: &str) -> usize {
    values
        .get(key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

/// The plan's shape depends on how many components and discounts the UI
/// currently shows.
pub fn group(values: &Value) -> FieldGroup {
    FieldGroup::new("feePlan")
        .field("title", Field::text().required().with(Validator::MinLength(5)))
        .group(repeated("components", count(values, "components"), component))
        .field("admissionFee", Field::text().required().with(Validator::Min(0.0)))
        .field("securityDeposit", Field::text().required().with(Validator::Min(0.0)))
        .group(repeated("discounts", count(values, "discounts"), discount))
        .field("class", Field::text().required())
        .field("isActive", Field::flag(true))
}

/// Default plan offered when the form opens.
pub fn template() -> Value {
    json!({
        "title": "",
        "components": [
            { "name": "Tuition Fee", "amount": 5000, "frequency": "monthly" },
            { "name": "Transport Fee", "amount": 2000, "frequency": "monthly" },
            { "name": "Lab Fee", "amount": 3000, "frequency": "yearly" }
        ],
        "admissionFee": "",
        "securityDeposit": "",
        "discounts": [
            { "description": "Sibling Discount", "amount": 2000 },
            { "description": "Scholarship", "amount": 5000 }
        ],
        "class": "",
        "isActive": true
    })
}

fn items<'a>(g: &'a FieldGroup, name: &str) -> Vec<&'a FieldGroup> {
    g.subgroup(name)
        .map(|list| {
            list.children()
                .filter_map(|(_, node)| match node {
                    FormNode::Group(item) => Some(item),
                    FormNode::Field(_) => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn amount(g: &FieldGroup, path: &str) -> f64 {
    g.number_of(path).unwrap_or(0.0)
}

pub fn cross_errors(g: &FieldGroup) -> Vec<(String, FieldError)> {
    if items(g, "components").is_empty() {
        return vec![(
            "components".into(),
            FieldError::new("arrayMinLength", "at least one fee component is required"),
        )];
    }
    Vec::new()
}

pub fn derived(g: &FieldGroup) -> Value {
    let components: f64 = items(g, "components").iter().map(|c| amount(c, "amount")).sum();
    let total_fees = components + amount(g, "admissionFee") + amount(g, "securityDeposit");
    let total_discounts: f64 = items(g, "discounts").iter().map(|d| amount(d, "amount")).sum();
    json!({
        "totalFees": total_fees,
        "totalDiscounts": total_discounts,
        "componentCount": items(g, "components").len(),
    })
}

pub fn payload(g: &FieldGroup) -> Result<CreateFeePlanRequest, FormError> {
    let number = |g: &FieldGroup, path: &str| {
        g.number_of(path)
            .ok_or_else(|| FormError::Payload(format!("{path} must be a number")))
    };
    let components = items(g, "components")
        .into_iter()
        .map(|c| {
            Ok(FeeComponent {
                name: c.text_of("name"),
                amount: number(c, "amount")?,
                frequency: c.text_of("frequency"),
            })
        })
        .collect::<Result<Vec<_>, FormError>>()?;
    let discounts = items(g, "discounts")
        .into_iter()
        .map(|d| {
            Ok(FeeDiscount {
                description: d.text_of("description"),
                amount: number(d, "amount")?,
            })
        })
        .collect::<Result<Vec<_>, FormError>>()?;

    Ok(CreateFeePlanRequest {
        title: g.text_of("title"),
        components,
        admission_fee: number(g, "admissionFee")?,
        security_deposit: number(g, "securityDeposit")?,
        discounts,
        class: g.text_of("class"),
        is_active: g.value_of("isActive").is_some_and(FieldValue::as_flag),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Body, FilledForm, FormKind};

    fn filled() -> Value {
        let mut v = template();
        v["title"] = json!("Primary 2025");
        v["admissionFee"] = json!(1000);
        v["securityDeposit"] = json!("500");
        v["class"] = json!("64f0c2");
        v
    }

    #[test]
    fn template_totals_match_defaults() {
        let form = FilledForm::new(FormKind::FeePlan, &template(), None).unwrap();
        let eval = form.evaluate();
        assert_eq!(eval.derived["totalFees"], json!(10000.0));
        assert_eq!(eval.derived["totalDiscounts"], json!(7000.0));
        assert_eq!(eval.derived["componentCount"], json!(3));
        assert!(!eval.valid);
    }

    #[test]
    fn component_errors_are_indexed() {
        let mut v = filled();
        v["components"][1]["amount"] = json!(0);
        v["components"][2]["frequency"] = json!("weekly");
        let form = FilledForm::new(FormKind::FeePlan, &v, None).unwrap();
        let paths: Vec<String> = form.evaluate().errors.into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec!["components.1.amount".to_string(), "components.2.frequency".to_string()]
        );
    }

    #[test]
    fn plan_without_components_is_invalid() {
        let mut v = filled();
        v["components"] = json!([]);
        let form = FilledForm::new(FormKind::FeePlan, &v, None).unwrap();
        let eval = form.evaluate();
        assert!(!eval.valid);
        assert_eq!(eval.errors[0].path, "components");
    }

    #[test]
    fn payload_converts_amounts_to_numbers() {
        let form = FilledForm::new(FormKind::FeePlan, &filled(), None).unwrap();
        let Body::Json(body) = form.submission().unwrap().body else {
            panic!("expected json body");
        };
        assert_eq!(body["securityDeposit"], json!(500.0));
        assert_eq!(body["components"][2]["frequency"], json!("yearly"));
        assert_eq!(body["discounts"][0]["amount"], json!(2000.0));
        assert_eq!(body["isActive"], json!(true));
    }
}
