//! Graph store result rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value of one field in a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A relation (edge) object; carries its relation-type labels.
    Relation { types: Vec<String> },
    /// Anything else the store returns.
    Scalar(Value),
}

impl FieldValue {
    pub fn relation<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Relation {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Text substituted into an answer pattern.
    ///
    /// Relations render as their first type label. Strings render without
    /// quotes, null as nothing, arrays as their rendered items joined by
    /// `、`.
    pub fn as_answer_text(&self) -> String {
        match self {
            Self::Relation { types } => types.first().cloned().unwrap_or_default(),
            Self::Scalar(value) => render_scalar(value),
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join("、"),
        other => other.to_string(),
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

/// One matched pattern returned by the graph store: field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRow {
    fields: BTreeMap<String, FieldValue>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_answer_text() {
        assert_eq!(FieldValue::from(json!("摩羯座")).as_answer_text(), "摩羯座");
        assert_eq!(FieldValue::from(json!(175)).as_answer_text(), "175");
        assert_eq!(FieldValue::from(Value::Null).as_answer_text(), "");
        assert_eq!(
            FieldValue::from(json!(["发如雪", "青花瓷"])).as_answer_text(),
            "发如雪、青花瓷"
        );
        assert_eq!(
            FieldValue::relation(["毕业院校", "校友"]).as_answer_text(),
            "毕业院校"
        );
        assert_eq!(FieldValue::relation(Vec::<String>::new()).as_answer_text(), "");
    }

    #[test]
    fn test_row_deserializes_relation_objects() {
        let row: ResultRow =
            serde_json::from_value(json!({"REL": {"types": ["毕业院校"]}, "%ANS%": "x"}))
                .unwrap();
        assert_eq!(row.get("REL"), Some(&FieldValue::relation(["毕业院校"])));
        assert_eq!(row.get("%ANS%"), Some(&FieldValue::from(json!("x"))));
    }
}
