//! Native type to host kind mapping and fetch-time text conversion.
//!
//! All columns are received as text; the pairing of the server type
//! code and the fetched length decides what host value the text becomes.

use super::host_value::HostValue;
use super::row::Row;
use crate::client::{Column, TypeCode, NULL_DATA};
use std::collections::HashMap;

/// The host-side kind a fetched column converts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Nil,
    Integer,
    Number,
    Boolean,
    String,
}

/// Total mapping from `(server type code, fetched length)` to host
/// kind. The null length sentinel wins over the type rule. No server
/// code currently maps to `Boolean`; the kind (and its conversion
/// handler below) exists for clients whose mapping includes one.
pub fn host_kind(type_code: TypeCode, len: isize) -> HostKind {
    if len == NULL_DATA {
        return HostKind::Nil;
    }
    match type_code {
        TypeCode::SmallInt | TypeCode::Integer => HostKind::Integer,
        TypeCode::Decimal | TypeCode::Numeric => HostKind::Number,
        _ => HostKind::String,
    }
}

/// Converts one fetched column into a host value. Numeric kinds parse
/// the received text; text that does not parse degrades to the raw
/// string value rather than erroring.
pub fn column_value(column: &Column) -> HostValue {
    let kind = host_kind(column.descriptor.type_code, column.slot.len());
    let text =
        String::from_utf8_lossy(column.slot.text_bytes().unwrap_or_default()).into_owned();
    value_from_text(kind, text)
}

/// The per-kind conversion handler behind [`column_value`].
pub fn value_from_text(kind: HostKind, text: String) -> HostValue {
    match kind {
        HostKind::Nil => HostValue::Null,
        HostKind::Integer => match text.trim().parse::<i64>() {
            Ok(n) => HostValue::Integer(n),
            Err(_) => HostValue::Text(text),
        },
        HostKind::Number => match text.trim().parse::<f64>() {
            Ok(n) => HostValue::Number(n),
            Err(_) => HostValue::Text(text),
        },
        HostKind::Boolean => {
            let truth = text.trim().parse::<i64>().map(|n| n != 0).unwrap_or(false);
            HostValue::Bool(truth)
        }
        HostKind::String => HostValue::Text(text),
    }
}

/// Builds one row from the fetched slots: 1-based positional values, or
/// lower-cased name keys when `named` is set. Duplicate names are not
/// deduplicated; the last column with a given name wins.
pub fn build_row(columns: &[Column], named: bool) -> Row {
    if named {
        let mut values = HashMap::with_capacity(columns.len());
        for column in columns {
            values.insert(column.descriptor.name.to_lowercase(), column_value(column));
        }
        Row::Named(values)
    } else {
        Row::Indexed(columns.iter().map(column_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{BindSlot, ColumnDescriptor};

    fn column(name: &str, type_code: TypeCode, text: Option<&str>) -> Column {
        let descriptor = ColumnDescriptor::new(name, type_code, 32, 0);
        let mut slot = BindSlot::new(33);
        slot.write(text.map(str::as_bytes));
        Column { descriptor, slot }
    }

    #[test]
    fn test_host_kind_null_sentinel_overrides_type_rule() {
        assert_eq!(host_kind(TypeCode::Integer, NULL_DATA), HostKind::Nil);
        assert_eq!(host_kind(TypeCode::Varchar, NULL_DATA), HostKind::Nil);
        assert_eq!(host_kind(TypeCode::Decimal, NULL_DATA), HostKind::Nil);
    }

    #[test]
    fn test_host_kind_integer_codes() {
        assert_eq!(host_kind(TypeCode::SmallInt, 2), HostKind::Integer);
        assert_eq!(host_kind(TypeCode::Integer, 2), HostKind::Integer);
    }

    #[test]
    fn test_host_kind_fixed_point_codes() {
        assert_eq!(host_kind(TypeCode::Decimal, 4), HostKind::Number);
        assert_eq!(host_kind(TypeCode::Numeric, 4), HostKind::Number);
    }

    #[test]
    fn test_host_kind_everything_else_is_string() {
        for t in [
            TypeCode::Char,
            TypeCode::Varchar,
            TypeCode::BigInt,
            TypeCode::Double,
            TypeCode::Float,
            TypeCode::Real,
            TypeCode::Date,
            TypeCode::Time,
            TypeCode::Timestamp,
            TypeCode::Binary,
            TypeCode::Other(999),
        ] {
            assert_eq!(host_kind(t, 1), HostKind::String);
        }
    }

    #[test]
    fn test_column_value_integer_parses_text() {
        let c = column("ID", TypeCode::Integer, Some("42"));
        assert_eq!(column_value(&c), HostValue::Integer(42));
    }

    #[test]
    fn test_column_value_decimal_parses_as_number() {
        let c = column("PRICE", TypeCode::Decimal, Some("19.25"));
        assert_eq!(column_value(&c), HostValue::Number(19.25));
    }

    #[test]
    fn test_column_value_null_wins_over_type() {
        let c = column("ID", TypeCode::Integer, None);
        assert_eq!(column_value(&c), HostValue::Null);
    }

    #[test]
    fn test_column_value_malformed_numeric_degrades_to_text() {
        let c = column("ID", TypeCode::Integer, Some("forty-two"));
        assert_eq!(column_value(&c), HostValue::Text("forty-two".to_string()));

        let c = column("PRICE", TypeCode::Decimal, Some("1.2.3"));
        assert_eq!(column_value(&c), HostValue::Text("1.2.3".to_string()));
    }

    #[test]
    fn test_column_value_other_types_pass_text_through() {
        let c = column("STAMP", TypeCode::Timestamp, Some("2024-01-01 00:00:00"));
        assert_eq!(
            column_value(&c),
            HostValue::Text("2024-01-01 00:00:00".to_string())
        );
    }

    #[test]
    fn test_boolean_handler_reads_integer_text() {
        // No server code maps to Boolean; exercise the handler directly.
        assert_eq!(
            value_from_text(HostKind::Boolean, "1".to_string()),
            HostValue::Bool(true)
        );
        assert_eq!(
            value_from_text(HostKind::Boolean, "0".to_string()),
            HostValue::Bool(false)
        );
        assert_eq!(
            value_from_text(HostKind::Boolean, "yes".to_string()),
            HostValue::Bool(false)
        );
    }

    #[test]
    fn test_build_row_indexed_keeps_order() {
        let columns = vec![
            column("ID", TypeCode::Integer, Some("1")),
            column("NAME", TypeCode::Varchar, Some("ford")),
        ];
        let row = build_row(&columns, false);
        assert_eq!(row.get(1), Some(&HostValue::Integer(1)));
        assert_eq!(row.get(2), Some(&HostValue::from("ford")));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_build_row_named_lowercases_names() {
        let columns = vec![column("CUSTOMER_ID", TypeCode::Integer, Some("7"))];
        let row = build_row(&columns, true);
        assert_eq!(row.get_named("customer_id"), Some(&HostValue::Integer(7)));
        assert_eq!(row.get_named("CUSTOMER_ID"), None);
    }

    #[test]
    fn test_build_row_duplicate_names_last_write_wins() {
        let columns = vec![
            column("N", TypeCode::Integer, Some("1")),
            column("N", TypeCode::Integer, Some("2")),
        ];
        let row = build_row(&columns, true);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get_named("n"), Some(&HostValue::Integer(2)));
    }
}
