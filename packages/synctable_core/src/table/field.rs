//! Schema columns
//!
//! A field's type is a closed tagged union: the wire form carries a
//! `fieldType` tag next to the type-specific attributes, e.g.
//!
//! ```json
//! { "fieldId": "price", "fieldName": "Price", "fieldType": "CURRENCY",
//!   "fieldCurrencySymbol": "$", "fieldCurrencyPosition": "PREFIX" }
//! ```

use serde::{Deserialize, Serialize};

/// Stable column identity, independent of the display name
pub type FieldId = String;

/// Where a currency symbol is rendered relative to the amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CurrencyPosition {
    #[default]
    Prefix,
    Suffix,
}

/// A field type together with its type-specific attributes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fieldType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    TextSingleLine,
    TextMultiLine,
    Checkbox,
    SelectSingle {
        #[serde(rename = "fieldOptions", default)]
        options: Vec<String>,
    },
    SelectMultiple {
        #[serde(rename = "fieldOptions", default)]
        options: Vec<String>,
    },
    Url,
    Email,
    Number {
        #[serde(rename = "fieldPrefix", default)]
        prefix: String,
        #[serde(rename = "fieldSuffix", default)]
        suffix: String,
    },
    Currency {
        #[serde(rename = "fieldCurrencySymbol", default)]
        symbol: String,
        #[serde(rename = "fieldCurrencyPosition", default)]
        position: CurrencyPosition,
    },
    Date,
    Vote,
}

/// The bare field type tag, without attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    TextSingleLine,
    TextMultiLine,
    Checkbox,
    SelectSingle,
    SelectMultiple,
    Url,
    Email,
    Number,
    Currency,
    Date,
    Vote,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::TextSingleLine,
        FieldType::TextMultiLine,
        FieldType::Checkbox,
        FieldType::SelectSingle,
        FieldType::SelectMultiple,
        FieldType::Url,
        FieldType::Email,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Date,
        FieldType::Vote,
    ];

    /// Vote columns hold a derived aggregate and never accept row content
    pub fn is_derived(self) -> bool {
        matches!(self, FieldType::Vote)
    }

    /// A kind with empty attributes
    pub fn default_kind(self) -> FieldKind {
        match self {
            FieldType::TextSingleLine => FieldKind::TextSingleLine,
            FieldType::TextMultiLine => FieldKind::TextMultiLine,
            FieldType::Checkbox => FieldKind::Checkbox,
            FieldType::SelectSingle => FieldKind::SelectSingle {
                options: Vec::new(),
            },
            FieldType::SelectMultiple => FieldKind::SelectMultiple {
                options: Vec::new(),
            },
            FieldType::Url => FieldKind::Url,
            FieldType::Email => FieldKind::Email,
            FieldType::Number => FieldKind::Number {
                prefix: String::new(),
                suffix: String::new(),
            },
            FieldType::Currency => FieldKind::Currency {
                symbol: String::new(),
                position: CurrencyPosition::default(),
            },
            FieldType::Date => FieldKind::Date,
            FieldType::Vote => FieldKind::Vote,
        }
    }
}

impl FieldKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldKind::TextSingleLine => FieldType::TextSingleLine,
            FieldKind::TextMultiLine => FieldType::TextMultiLine,
            FieldKind::Checkbox => FieldType::Checkbox,
            FieldKind::SelectSingle { .. } => FieldType::SelectSingle,
            FieldKind::SelectMultiple { .. } => FieldType::SelectMultiple,
            FieldKind::Url => FieldType::Url,
            FieldKind::Email => FieldType::Email,
            FieldKind::Number { .. } => FieldType::Number,
            FieldKind::Currency { .. } => FieldType::Currency,
            FieldKind::Date => FieldType::Date,
            FieldKind::Vote => FieldType::Vote,
        }
    }
}

/// One schema column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableField {
    #[serde(rename = "fieldId")]
    pub field_id: FieldId,
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl TableField {
    pub fn new(field_id: impl Into<FieldId>, field_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            field_id: field_id.into(),
            field_name: field_name.into(),
            kind,
        }
    }

    pub fn text(field_id: impl Into<FieldId>, field_name: impl Into<String>) -> Self {
        Self::new(field_id, field_name, FieldKind::TextSingleLine)
    }

    pub fn multiline(field_id: impl Into<FieldId>, field_name: impl Into<String>) -> Self {
        Self::new(field_id, field_name, FieldKind::TextMultiLine)
    }

    pub fn checkbox(field_id: impl Into<FieldId>, field_name: impl Into<String>) -> Self {
        Self::new(field_id, field_name, FieldKind::Checkbox)
    }

    pub fn number(field_id: impl Into<FieldId>, field_name: impl Into<String>) -> Self {
        Self::new(field_id, field_name, FieldType::Number.default_kind())
    }

    pub fn vote(field_id: impl Into<FieldId>, field_name: impl Into<String>) -> Self {
        Self::new(field_id, field_name, FieldKind::Vote)
    }

    pub fn field_type(&self) -> FieldType {
        self.kind.field_type()
    }

    pub fn is_vote(&self) -> bool {
        self.field_type().is_derived()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let field = TableField::new(
            "price",
            "Price",
            FieldKind::Currency {
                symbol: "€".into(),
                position: CurrencyPosition::Suffix,
            },
        );
        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(
            value,
            json!({
                "fieldId": "price",
                "fieldName": "Price",
                "fieldType": "CURRENCY",
                "fieldCurrencySymbol": "€",
                "fieldCurrencyPosition": "SUFFIX",
            })
        );
    }

    #[test]
    fn test_parse_with_missing_attributes() {
        let field: TableField = serde_json::from_value(json!({
            "fieldId": "qty",
            "fieldName": "Quantity",
            "fieldType": "NUMBER",
        }))
        .unwrap();
        assert_eq!(field.field_type(), FieldType::Number);
        assert_eq!(field.kind, FieldType::Number.default_kind());

        let field: TableField = serde_json::from_value(json!({
            "fieldId": "status",
            "fieldName": "Status",
            "fieldType": "SELECT_SINGLE",
            "fieldOptions": ["todo", "done"],
        }))
        .unwrap();
        assert_eq!(
            field.kind,
            FieldKind::SelectSingle {
                options: vec!["todo".into(), "done".into()]
            }
        );
    }

    #[test]
    fn test_unknown_type_rejected() {
        let parsed: Result<TableField, _> = serde_json::from_value(json!({
            "fieldId": "x",
            "fieldName": "X",
            "fieldType": "HOLOGRAM",
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_only_vote_is_derived() {
        for ty in FieldType::ALL {
            assert_eq!(ty.is_derived(), ty == FieldType::Vote);
            assert_eq!(ty.default_kind().field_type(), ty);
        }
    }
}
