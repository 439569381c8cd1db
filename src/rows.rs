//! Flattens extracted tables into rows for loading into a database.

use serde::Serialize;

use crate::value::{Table, Value};
use crate::Result;

/// One extracted entity. A few common fields are pulled out, and the whole
/// entry is kept as JSON in `raw`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EntityRow {
    pub entity_type: String,
    pub external_key: String,
    pub name: Option<String>,
    pub quality: Option<String>,
    pub raw: String,
}

/// Builds a row for each entry of `tables` whose value is a table.
///
/// `name` comes from the `Name` field, or `name` if `Name` is missing or
/// empty. `quality` is found the same way.
pub fn entity_rows(entity_type: &str, tables: &Table) -> Result<Vec<EntityRow>> {
    let mut rows = Vec::with_capacity(tables.len());
    for (key, value) in tables {
        let Value::Table(entry) = value else {
            continue;
        };
        rows.push(EntityRow {
            entity_type: entity_type.to_owned(),
            external_key: key.to_string(),
            name: common_field(entry, "Name", "name"),
            quality: common_field(entry, "Quality", "quality"),
            raw: serde_json::to_string(entry)?,
        });
    }
    Ok(rows)
}

fn common_field(entry: &Table, primary: &str, fallback: &str) -> Option<String> {
    let value = [primary, fallback]
        .into_iter()
        .filter_map(|key| entry.get_str(key))
        .find(|value| !is_empty(value))?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Table(_) | Value::Opaque(_) => None,
    }
}

/// Empty strings, zero and empty tables count as a missing field.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Number(n) => *n == 0.0,
        Value::Table(t) => t.is_empty(),
        Value::Opaque(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_tables;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rows() {
        let text = r#"
            guns["Magnum"] = { Name = "Magnum", Quality = "C", Damage = 14 }
            guns["Old Gun"] = { name = "Old Gun", quality = 4 }
            guns["Thing"] = { Name = "", name = "thing", Quality = f() }
        "#;
        let rows = entity_rows("guns", &extract_tables(text)).unwrap();
        let expected = vec![
            EntityRow {
                entity_type: "guns".into(),
                external_key: "Magnum".into(),
                name: Some("Magnum".into()),
                quality: Some("C".into()),
                raw: r#"{"Name":"Magnum","Quality":"C","Damage":14}"#.into(),
            },
            EntityRow {
                entity_type: "guns".into(),
                external_key: "Old Gun".into(),
                name: Some("Old Gun".into()),
                quality: Some("4".into()),
                raw: r#"{"name":"Old Gun","quality":4}"#.into(),
            },
            EntityRow {
                entity_type: "guns".into(),
                external_key: "Thing".into(),
                name: Some("thing".into()),
                quality: None,
                raw: r#"{"Name":"","name":"thing","Quality":"f()"}"#.into(),
            },
        ];
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_missing_fields() {
        let mut tables = Table::new();
        tables.insert("a".into(), Table::new().into());
        tables.insert("b".into(), "not a table".into());
        let rows = entity_rows("items", &tables).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, None);
        assert_eq!(rows[0].quality, None);
        assert_eq!(rows[0].raw, "{}");
    }
}
