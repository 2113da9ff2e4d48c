use crate::kgqa::domain::result::{FieldValue, ResultRow};
use crate::kgqa::persistence::GraphStore;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use tracing::info;

/// Graph store backed by SurrealDB. Templates for this provider are written
/// in SurrealQL; graph edges are relation-table records.
#[derive(Debug)]
pub struct SurrealGraphStore {
    db: Surreal<Any>,
}

impl SurrealGraphStore {
    pub async fn new(connection_string: &str, namespace: &str, database: &str) -> Result<Self> {
        let db = connect(connection_string).await?;
        db.use_ns(namespace).use_db(database).await?;

        Ok(Self { db })
    }

    /// Run a SurrealQL script (e.g. `data/seed.surql`), failing on the
    /// first statement error.
    pub async fn import(&self, script: &str) -> Result<()> {
        self.db.query(script).await?.check()?;
        info!(name: "store.imported", bytes = script.len(), "SurrealQL script imported");
        Ok(())
    }
}

#[async_trait]
impl GraphStore for SurrealGraphStore {
    async fn run(&self, query: &str) -> Result<Vec<ResultRow>> {
        // Templates hold one statement; only its result is read.
        let mut response = self.db.query(query).await?.check()?;
        let value: surrealdb::Value = response.take(0)?;

        // The SDK value serializes in its tagged form ({"Strand": ..},
        // {"Thing": ..}); flatten it to plain JSON before building rows.
        let tagged = serde_json::to_value(&value)?;
        let rows = match untag(tagged) {
            Value::Array(items) => items.into_iter().map(row_from_json).collect(),
            Value::Null => Vec::new(),
            other => vec![row_from_json(other)],
        };
        Ok(rows)
    }

    fn name(&self) -> &'static str {
        "surrealdb"
    }
}

/// Flatten SurrealDB's externally tagged value encoding into plain JSON.
/// Record ids become `table:key` strings; `None` and `Null` become null.
pub fn untag(value: Value) -> Value {
    match value {
        Value::String(s) if s == "None" || s == "Null" => Value::Null,
        Value::Object(map) if map.len() == 1 => {
            let Some((tag, inner)) = map.into_iter().next() else {
                return Value::Object(Map::new());
            };
            match tag.as_str() {
                "Array" => match inner {
                    Value::Array(items) => Value::Array(items.into_iter().map(untag).collect()),
                    other => untag(other),
                },
                "Object" => match inner {
                    Value::Object(fields) => Value::Object(
                        fields.into_iter().map(|(k, v)| (k, untag(v))).collect(),
                    ),
                    other => untag(other),
                },
                "Number" => match inner {
                    Value::Object(number) => number.into_iter().next().map_or(Value::Null, |(_, n)| n),
                    other => other,
                },
                "Thing" => thing_to_string(inner),
                "Strand" | "String" | "Bool" | "Datetime" | "Uuid" | "Duration" => inner,
                // A user object that happens to have a single field.
                _ => {
                    let mut fields = Map::new();
                    fields.insert(tag, untag(inner));
                    Value::Object(fields)
                }
            }
        }
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, untag(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(untag).collect()),
        other => other,
    }
}

fn thing_to_string(thing: Value) -> Value {
    let Value::Object(mut thing) = thing else {
        return thing;
    };
    let table = thing.remove("tb").and_then(|tb| tb.as_str().map(str::to_string));
    let key = thing.remove("id").map(untag);
    match (table, key) {
        (Some(table), Some(Value::String(key))) => Value::String(format!("{table}:{key}")),
        (Some(table), Some(Value::Number(key))) => Value::String(format!("{table}:{key}")),
        (Some(table), Some(other)) => Value::String(format!("{table}:{other}")),
        (table, key) => {
            let mut fields = Map::new();
            if let Some(table) = table {
                fields.insert("tb".to_string(), Value::String(table));
            }
            if let Some(key) = key {
                fields.insert("id".to_string(), key);
            }
            Value::Object(fields)
        }
    }
}

/// Convert one SurrealDB result object into a row. Non-object results
/// (e.g. `SELECT VALUE ...`) become a single field named `value`.
pub fn row_from_json(value: Value) -> ResultRow {
    match value {
        Value::Object(fields) => {
            let mut row = ResultRow::new();
            for (name, field) in fields {
                row.insert(name, field_from_json(field));
            }
            row
        }
        other => ResultRow::new().with("value", field_from_json(other)),
    }
}

/// Edge records (objects with `id`, `in` and `out`) become relations
/// labelled with their table name; everything else stays a scalar.
fn field_from_json(value: Value) -> FieldValue {
    if let Value::Object(map) = &value {
        if map.contains_key("in") && map.contains_key("out") {
            if let Some(table) = map.get("id").and_then(record_table) {
                return FieldValue::relation([table]);
            }
        }
    }
    FieldValue::Scalar(value)
}

/// Table part of a record id, given as `table:key` or `{"tb": ..., "id": ...}`.
fn record_table(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => s
            .split_once(':')
            .map(|(table, _)| table.trim_matches(|c| c == '`' || c == '⟨' || c == '⟩').to_string()),
        Value::Object(map) => map.get("tb").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
