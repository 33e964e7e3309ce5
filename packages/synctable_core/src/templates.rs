//! Starter schemas and bulk import
//!
//! A fresh table starts either from one of the built-in templates or from
//! a batch of notes (sticky notes on the canvas), imported one row each.

use crate::order_key::OrderKey;
use crate::substrate::SyncedMap;
use crate::table::{
    CurrencyPosition, FieldKind, FieldType, RowData, TableError, TableField, TableStore,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Title given to a table built from imported notes
pub const NOTES_TITLE: &str = "Stickies";

/// The schema a brand-new table is created with
pub fn default_schema() -> Vec<TableField> {
    vec![
        TableField::text("title", "Title"),
        TableField::multiline("desc", "Description"),
        TableField::checkbox("completed", "Completed"),
    ]
}

/// The schema for imported notes, with an author column only when asked
pub fn notes_schema(with_author: bool) -> Vec<TableField> {
    let mut schema = vec![TableField::multiline("text", "Sticky Text")];
    if with_author {
        schema.push(TableField::text("author", "Author"));
    }
    schema
}

/// A named starting point for a new table
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub schema: Vec<TableField>,
}

fn select(field_id: &str, field_name: &str, options: &[&str]) -> TableField {
    TableField::new(
        field_id,
        field_name,
        FieldKind::SelectSingle {
            options: options.iter().map(|o| o.to_string()).collect(),
        },
    )
}

/// All built-in templates
pub fn templates() -> Vec<Template> {
    vec![
        Template {
            slug: "tasks",
            title: "Task Management",
            description: "Tasks, priorities and completion status",
            schema: vec![
                TableField::text("title", "Title"),
                TableField::multiline("desc", "Description"),
                select("priority", "Priority", &["High", "Medium", "Low"]),
                TableField::checkbox("completed", "Completed"),
            ],
        },
        Template {
            slug: "poll",
            title: "Poll / Voting",
            description: "Collect +1s on each row, great for Q&A and ad-hoc polls",
            schema: vec![
                TableField::text("option", "Option"),
                TableField::vote("votes", "Votes"),
            ],
        },
        Template {
            slug: "inventory",
            title: "Inventory List",
            description: "Item, description, quantity & price",
            schema: vec![
                TableField::text("item", "Item"),
                TableField::multiline("desc", "Description"),
                TableField::number("quantity", "Quantity"),
                TableField::new(
                    "price",
                    "Price",
                    FieldKind::Currency {
                        symbol: "$".into(),
                        position: CurrencyPosition::Prefix,
                    },
                ),
            ],
        },
        Template {
            slug: "crm",
            title: "CRM",
            description: "Contact name, pronouns, company, email & notes",
            schema: vec![
                TableField::text("name", "Name"),
                TableField::text("pronouns", "Pronouns"),
                TableField::text("company", "Company"),
                TableField::new("email", "Email", FieldType::Email.default_kind()),
                TableField::multiline("notes", "Notes"),
            ],
        },
    ]
}

pub fn template(slug: &str) -> Option<Template> {
    templates().into_iter().find(|t| t.slug == slug)
}

/// Start a table from a template: schema and title
pub fn apply_template<R, M, V>(
    store: &mut TableStore<R, M, V>,
    template: &Template,
) -> Result<(), TableError>
where
    R: SyncedMap<RowData>,
    M: SyncedMap<Value>,
    V: SyncedMap<bool>,
{
    store.set_schema(template.schema.clone())?;
    store.set_title(template.title);
    Ok(())
}

/// A note to import; `author` is `None` when the author is hidden
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
}

/// Replace the schema with the notes schema and append one row per note.
///
/// The author column is only created when at least one note shows its
/// author. Importing nothing leaves the table untouched.
pub fn import_notes<R, M, V>(
    store: &mut TableStore<R, M, V>,
    notes: &[Note],
) -> Result<Vec<OrderKey>, TableError>
where
    R: SyncedMap<RowData>,
    M: SyncedMap<Value>,
    V: SyncedMap<bool>,
{
    if notes.is_empty() {
        log::warn!("No notes to import");
        return Ok(Vec::new());
    }

    let with_author = notes.iter().any(|n| n.author.is_some());
    store.set_schema(notes_schema(with_author))?;
    store.set_title(NOTES_TITLE);

    notes
        .iter()
        .map(|note| {
            let mut row = RowData::new();
            row.insert("text".into(), Value::from(note.text.as_str()));
            row.insert(
                "author".into(),
                Value::from(note.author.as_deref().unwrap_or_default()),
            );
            store.append_row(row)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_template_ids_are_unique() {
        for template in templates() {
            let ids: HashSet<_> = template.schema.iter().map(|f| &f.field_id).collect();
            assert_eq!(ids.len(), template.schema.len(), "{}", template.slug);
        }
        assert!(template("poll").is_some());
        assert!(template("nope").is_none());
    }

    #[test]
    fn test_default_schema_is_plain_task_list() {
        let schema = default_schema();
        assert_eq!(schema.len(), 3);
        assert!(schema.iter().all(|f| !f.is_vote()));
        assert_eq!(schema[2].field_type(), FieldType::Checkbox);
    }

    #[test]
    fn test_apply_template() {
        let mut store = TableStore::in_memory();
        apply_template(&mut store, &template("poll").unwrap()).unwrap();
        assert_eq!(store.title(), "Poll / Voting");
        assert!(store.schema().iter().any(|f| f.is_vote()));
    }

    #[test]
    fn test_import_notes_without_authors() {
        let mut store = TableStore::in_memory();
        let notes = vec![
            Note {
                text: "first".into(),
                author: None,
            },
            Note {
                text: "second".into(),
                author: None,
            },
        ];
        let ids = import_notes(&mut store, &notes).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(store.title(), NOTES_TITLE);
        assert_eq!(store.schema(), notes_schema(false));
        let rows = store.snapshot();
        assert_eq!(rows[0].row_data.get("text"), Some(&json!("first")));
        assert!(!rows[0].row_data.contains_key("author"));
    }

    #[test]
    fn test_import_notes_with_authors() {
        let mut store = TableStore::in_memory();
        let notes = vec![
            Note {
                text: "hi".into(),
                author: Some("Robin".into()),
            },
            Note {
                text: "anon".into(),
                author: None,
            },
        ];
        import_notes(&mut store, &notes).unwrap();

        let rows = store.snapshot();
        assert_eq!(rows[0].row_data.get("author"), Some(&json!("Robin")));
        assert_eq!(rows[1].row_data.get("author"), Some(&json!("")));
    }

    #[test]
    fn test_import_nothing() {
        let mut store = TableStore::in_memory();
        assert!(import_notes(&mut store, &[]).unwrap().is_empty());
        assert!(store.schema().is_empty());
        assert_eq!(store.versions().schema, 0);
    }
}
