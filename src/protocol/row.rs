use super::host_value::HostValue;
use serde::Serialize;
use std::collections::HashMap;

/// One fetched record: either position-keyed (1-based, sequential) or
/// keyed by lower-cased column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    Indexed(Vec<HostValue>),
    Named(HashMap<String, HostValue>),
}

impl Row {
    /// Positional lookup, 1-based. Returns `None` for index 0, out of
    /// range, or a name-keyed row.
    pub fn get(&self, index: usize) -> Option<&HostValue> {
        match self {
            Row::Indexed(values) => index.checked_sub(1).and_then(|i| values.get(i)),
            Row::Named(_) => None,
        }
    }

    /// Name lookup; keys are lower-cased column names.
    pub fn get_named(&self, name: &str) -> Option<&HostValue> {
        match self {
            Row::Indexed(_) => None,
            Row::Named(values) => values.get(name),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Row::Indexed(values) => values.len(),
            Row::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Row::Named(_))
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_get_is_one_based() {
        let row = Row::Indexed(vec![HostValue::Integer(42), HostValue::from("zaphod")]);
        assert_eq!(row.get(1), Some(&HostValue::Integer(42)));
        assert_eq!(row.get(2), Some(&HostValue::from("zaphod")));
        assert_eq!(row.get(0), None);
        assert_eq!(row.get(3), None);
        assert_eq!(row.get_named("id"), None);
    }

    #[test]
    fn test_named_get() {
        let mut values = HashMap::new();
        values.insert("id".to_string(), HostValue::Integer(42));
        let row = Row::Named(values);
        assert!(row.is_named());
        assert_eq!(row.get_named("id"), Some(&HostValue::Integer(42)));
        assert_eq!(row.get_named("ID"), None);
        assert_eq!(row.get(1), None);
    }

    #[test]
    fn test_len_and_is_empty() {
        assert!(Row::Indexed(vec![]).is_empty());
        assert_eq!(Row::Indexed(vec![HostValue::Null]).len(), 1);
    }

    #[test]
    fn test_to_json_shapes() {
        let row = Row::Indexed(vec![HostValue::Integer(1), HostValue::Null]);
        assert_eq!(row.to_json(), serde_json::json!([1, null]));

        let mut values = HashMap::new();
        values.insert("name".to_string(), HostValue::from("ford"));
        let row = Row::Named(values);
        assert_eq!(row.to_json(), serde_json::json!({"name": "ford"}));
    }
}
