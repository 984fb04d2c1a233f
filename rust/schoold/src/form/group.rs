use serde_json::{Map, Value};

use super::join_path;
use super::validate::{FieldError, Validator};
use super::value::FieldValue;

#[derive(Debug, Clone)]
pub struct Field {
    value: FieldValue,
    initial: FieldValue,
    validators: Vec<Validator>,
    touched: bool,
}

impl Field {
    pub fn new(initial: FieldValue) -> Self {
        Self {
            value: initial.clone(),
            initial,
            validators: Vec::new(),
            touched: false,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldValue::empty_text())
    }

    pub fn list() -> Self {
        Self::new(FieldValue::empty_list())
    }

    pub fn flag(initial: bool) -> Self {
        Self::new(FieldValue::Flag(initial))
    }

    pub fn with(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn required(self) -> Self {
        self.with(Validator::Required)
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Whether `value` has the same shape (list or scalar) as the field.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(self.initial, FieldValue::List(_)) == matches!(value, FieldValue::List(_))
    }

    pub fn set(&mut self, value: FieldValue) {
        self.value = value;
    }

    pub fn clear(&mut self) {
        self.value = self.initial.clone();
    }

    /// Restores the initial value and forgets the touched state.
    pub fn reset(&mut self) {
        self.clear();
        self.touched = false;
    }

    pub fn touched(&self) -> bool {
        self.touched
    }

    pub fn mark_touched(&mut self) {
        self.touched = true;
    }

    pub fn errors(&self) -> Vec<FieldError> {
        self.validators
            .iter()
            .filter_map(|v| v.check(&self.value))
            .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validators.iter().all(|v| v.check(&self.value).is_none())
    }

    /// Adds `item` when absent, removes it when present. Returns whether the
    /// item is selected afterwards. A non-list value is treated as empty.
    pub fn toggle(&mut self, item: &str) -> bool {
        let mut items = self.value.as_list().to_vec();
        let selected = match items.iter().position(|v| v == item) {
            Some(idx) => {
                items.remove(idx);
                false
            }
            None => {
                items.push(item.to_string());
                true
            }
        };
        self.value = FieldValue::List(items);
        self.touched = true;
        selected
    }
}

#[derive(Debug, Clone)]
pub enum FormNode {
    Field(Field),
    Group(FieldGroup),
}

/// Ordered tree of named fields and nested groups.
#[derive(Debug, Clone, Default)]
pub struct FieldGroup {
    name: String,
    children: Vec<(String, FormNode)>,
}

pub trait FormVisitor {
    fn visit_field(&mut self, path: &str, field: &Field);

    fn enter_group(&mut self, _path: &str, _group: &FieldGroup) {}
}

pub trait FormVisitorMut {
    fn visit_field(&mut self, path: &str, field: &mut Field);
}

pub struct MarkTouched;

impl FormVisitorMut for MarkTouched {
    fn visit_field(&mut self, _path: &str, field: &mut Field) {
        field.mark_touched();
    }
}

/// Gathers validator errors keyed by dotted path.
#[derive(Default)]
pub struct CollectErrors {
    pub only_touched: bool,
    pub errors: Vec<(String, FieldError)>,
}

impl FormVisitor for CollectErrors {
    fn visit_field(&mut self, path: &str, field: &Field) {
        if self.only_touched && !field.touched() {
            return;
        }
        for e in field.errors() {
            self.errors.push((path.to_string(), e));
        }
    }
}

impl FieldGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.children.push((name.into(), FormNode::Field(field)));
        self
    }

    pub fn group(mut self, group: FieldGroup) -> Self {
        self.children
            .push((group.name.clone(), FormNode::Group(group)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&FormNode> {
        let (head, rest) = split_path(path);
        let node = self
            .children
            .iter()
            .find(|(name, _)| name == head)
            .map(|(_, n)| n)?;
        match (rest, node) {
            (None, n) => Some(n),
            (Some(rest), FormNode::Group(g)) => g.get(rest),
            (Some(_), FormNode::Field(_)) => None,
        }
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FormNode> {
        let (head, rest) = split_path(path);
        let node = self
            .children
            .iter_mut()
            .find(|(name, _)| name == head)
            .map(|(_, n)| n)?;
        match (rest, node) {
            (None, n) => Some(n),
            (Some(rest), FormNode::Group(g)) => g.get_mut(rest),
            (Some(_), FormNode::Field(_)) => None,
        }
    }

    pub fn field_ref(&self, path: &str) -> Option<&Field> {
        match self.get(path)? {
            FormNode::Field(f) => Some(f),
            FormNode::Group(_) => None,
        }
    }

    pub fn field_mut(&mut self, path: &str) -> Option<&mut Field> {
        match self.get_mut(path)? {
            FormNode::Field(f) => Some(f),
            FormNode::Group(_) => None,
        }
    }

    pub fn subgroup(&self, path: &str) -> Option<&FieldGroup> {
        match self.get(path)? {
            FormNode::Group(g) => Some(g),
            FormNode::Field(_) => None,
        }
    }

    pub fn value_of(&self, path: &str) -> Option<&FieldValue> {
        self.field_ref(path).map(Field::value)
    }

    /// Text of a scalar field, empty when missing.
    pub fn text_of(&self, path: &str) -> String {
        self.value_of(path).map(FieldValue::text).unwrap_or_default()
    }

    pub fn number_of(&self, path: &str) -> Option<f64> {
        self.value_of(path).and_then(FieldValue::as_number)
    }

    pub fn integer_of(&self, path: &str) -> Option<i64> {
        self.value_of(path).and_then(FieldValue::as_whole)
    }

    pub fn list_of(&self, path: &str) -> Vec<String> {
        self.value_of(path)
            .map(|v| v.as_list().to_vec())
            .unwrap_or_default()
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &FormNode)> {
        self.children.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn walk(&self, visitor: &mut dyn FormVisitor) {
        self.walk_inner("", visitor);
    }

    fn walk_inner(&self, prefix: &str, visitor: &mut dyn FormVisitor) {
        for (name, node) in &self.children {
            let path = join_path(prefix, name);
            match node {
                FormNode::Field(f) => visitor.visit_field(&path, f),
                FormNode::Group(g) => {
                    visitor.enter_group(&path, g);
                    g.walk_inner(&path, visitor);
                }
            }
        }
    }

    pub fn walk_mut(&mut self, visitor: &mut dyn FormVisitorMut) {
        self.walk_mut_inner("", visitor);
    }

    fn walk_mut_inner(&mut self, prefix: &str, visitor: &mut dyn FormVisitorMut) {
        for (name, node) in &mut self.children {
            let path = join_path(prefix, name);
            match node {
                FormNode::Field(f) => visitor.visit_field(&path, f),
                FormNode::Group(g) => g.walk_mut_inner(&path, visitor),
            }
        }
    }

    pub fn mark_all_touched(&mut self) {
        self.walk_mut(&mut MarkTouched);
    }

    pub fn errors(&self, only_touched: bool) -> Vec<(String, FieldError)> {
        let mut collect = CollectErrors {
            only_touched,
            errors: Vec::new(),
        };
        self.walk(&mut collect);
        collect.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors(false).is_empty()
    }

    pub fn reset(&mut self) {
        struct Reset;
        impl FormVisitorMut for Reset {
            fn visit_field(&mut self, _path: &str, field: &mut Field) {
                field.reset();
            }
        }
        self.walk_mut(&mut Reset);
    }

    /// Current values as a JSON object mirroring the tree.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (name, node) in &self.children {
            let v = match node {
                FormNode::Field(f) => serde_json::to_value(f.value()).unwrap_or(Value::Null),
                FormNode::Group(g) => g.to_json(),
            };
            out.insert(name.clone(), v);
        }
        Value::Object(out)
    }

    /// Applies values from `raw` onto matching fields. Unknown keys,
    /// undecodable values and values of the wrong shape are skipped; fields
    /// absent from `raw` keep their current value.
    pub fn patch_json(&mut self, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            return;
        };
        for (name, node) in &mut self.children {
            let Some(v) = obj.get(name.as_str()) else {
                continue;
            };
            match node {
                FormNode::Field(f) => match FieldValue::from_json(v) {
                    Ok(Some(value)) if f.accepts(&value) => f.set(value),
                    Ok(Some(_)) => {}
                    Ok(None) => f.clear(),
                    Err(_) => {}
                },
                FormNode::Group(g) => g.patch_json(v),
            }
        }
    }
}

fn split_path(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}
