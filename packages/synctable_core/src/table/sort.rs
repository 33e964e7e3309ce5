//! Type-aware snapshot ordering
//!
//! A snapshot is always produced in key order first; a sort directive then
//! re-sorts it stably by one column, so rows that compare equal keep their
//! key order.

use super::field::{FieldType, TableField};
use super::Row;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Date formats accepted for `DATE` columns, editor format first
const DATE_FORMATS: [&str; 2] = ["%b %d %Y", "%Y-%m-%d"];

/// Which column a snapshot is sorted by, and in which direction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
    pub field_id: String,
    #[serde(default)]
    pub reverse: bool,
}

impl SortOrder {
    pub fn ascending(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            reverse: false,
        }
    }

    pub fn descending(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            reverse: true,
        }
    }

    /// The directive after clicking a column header:
    /// unsorted -> ascending -> descending -> unsorted.
    pub fn cycle(current: Option<&SortOrder>, field_id: &str) -> Option<SortOrder> {
        match current {
            Some(order) if order.field_id == field_id && order.reverse => None,
            Some(order) if order.field_id == field_id => Some(Self::descending(field_id)),
            _ => Some(Self::ascending(field_id)),
        }
    }
}

fn as_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn as_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}

fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| as_text(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn as_date(value: Option<&Value>) -> Option<NaiveDate> {
    let text = match value {
        Some(Value::String(s)) => s.trim(),
        _ => return None,
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Compare two cell values of a column of type `field_type`
pub fn compare_values(field_type: FieldType, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match field_type {
        FieldType::TextSingleLine
        | FieldType::TextMultiLine
        | FieldType::Url
        | FieldType::Email
        | FieldType::SelectSingle
        | FieldType::SelectMultiple => as_text(a).cmp(&as_text(b)),
        FieldType::Number | FieldType::Currency | FieldType::Vote => {
            as_number(a).total_cmp(&as_number(b))
        }
        FieldType::Checkbox => as_bool(a).cmp(&as_bool(b)),
        FieldType::Date => as_date(a)
            .cmp(&as_date(b))
            .then_with(|| as_text(a).cmp(&as_text(b))),
    }
}

/// Stably re-sort a key-ordered snapshot by `order`.
///
/// A directive naming a column that is not in `schema` leaves the rows in
/// key order.
pub fn sort_rows(rows: &mut [Row], schema: &[TableField], order: &SortOrder) {
    let Some(field) = schema.iter().find(|f| f.field_id == order.field_id) else {
        log::debug!("Sort column {:?} is not in the schema", order.field_id);
        return;
    };
    let field_type = field.field_type();
    let field_id = field.field_id.as_str();

    rows.sort_by(|a, b| {
        let ordering = compare_values(
            field_type,
            a.row_data.get(field_id),
            b.row_data.get(field_id),
        );
        if order.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
}
