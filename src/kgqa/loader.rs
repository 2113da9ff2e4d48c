//! Catalog Loading
//!
//! Reads the schema term sets and the template table from disk and builds
//! a validated [`QaCatalog`]. An invalid template row fails the whole load.
//!
//! Template rows carry `question`, `query` (or `cypher`), `check` and
//! `answer`. `check` may be a mapping or a string holding a JSON object,
//! as spreadsheet exports store it; its key order is kept.

use crate::kgqa::domain::{
    catalog::QaCatalog,
    schema::SchemaTermSets,
    template::{SlotRequirements, Template, TemplateError},
};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unsupported template table format: {} (expected .json, .yaml or .yml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("template row {row} is invalid: {source}")]
    Definition {
        /// 1-based row number in the table.
        row: usize,
        #[source]
        source: TemplateError,
    },
}

// =============================================================================
// Table Rows
// =============================================================================

/// One row of the template table as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRow {
    pub question: String,
    #[serde(alias = "cypher")]
    pub query: String,
    #[serde(default)]
    pub check: CheckSpec,
    pub answer: String,
}

/// Raw slot requirements: `(token, count)` pairs in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSpec(pub Vec<(String, u64)>);

impl<'de> Deserialize<'de> for CheckSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CheckVisitor;

        impl<'de> Visitor<'de> for CheckVisitor {
            type Value = CheckSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of slot tokens to counts, or a JSON string of one")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::new();
                while let Some((token, count)) = map.next_entry::<String, u64>()? {
                    pairs.push((token, count));
                }
                Ok(CheckSpec(pairs))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v.trim().is_empty() {
                    return Ok(CheckSpec::default());
                }
                serde_json::from_str(v).map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(CheckSpec::default())
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(CheckSpec::default())
            }
        }

        deserializer.deserialize_any(CheckVisitor)
    }
}

impl TemplateRow {
    pub fn into_template(self) -> Result<Template, TemplateError> {
        let requirements = SlotRequirements::from_pairs(self.check.0)?;
        Template::new(self.question, self.query, requirements, self.answer)
    }
}

/// Validate rows into templates, keeping table order.
pub fn build_templates(rows: Vec<TemplateRow>) -> Result<Vec<Template>, CatalogError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            row.into_template()
                .map_err(|source| CatalogError::Definition { row: i + 1, source })
        })
        .collect()
}

// =============================================================================
// Loading
// =============================================================================

async fn read(path: &Path) -> Result<String, CatalogError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Load the schema term sets from a JSON file.
pub async fn load_schema(path: impl AsRef<Path>) -> Result<SchemaTermSets, CatalogError> {
    let path = path.as_ref();
    let content = read(path).await?;
    let schema: SchemaTermSets =
        serde_json::from_str(&content).map_err(|source| CatalogError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(schema.normalized())
}

/// Load and validate the template table (JSON array or YAML sequence).
pub async fn load_templates(path: impl AsRef<Path>) -> Result<Vec<Template>, CatalogError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let rows: Vec<TemplateRow> = match extension.as_deref() {
        Some("json") => {
            let content = read(path).await?;
            serde_json::from_str(&content).map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
        Some("yaml" | "yml") => {
            let content = read(path).await?;
            serde_yaml::from_str(&content).map_err(|source| CatalogError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => return Err(CatalogError::UnsupportedFormat(path.to_path_buf())),
    };

    build_templates(rows)
}

/// Load schema and templates into one catalog.
pub async fn load_catalog(
    schema_path: impl AsRef<Path>,
    templates_path: impl AsRef<Path>,
) -> Result<QaCatalog, CatalogError> {
    let schema = load_schema(schema_path.as_ref()).await?;
    let templates = load_templates(templates_path.as_ref()).await?;

    info!(
        name: "catalog.loaded",
        entities = schema.entities.len(),
        relations = schema.relations.len(),
        attributes = schema.attributes.len(),
        labels = schema.labels.len(),
        templates = templates.len(),
        "Question answering catalog loaded"
    );
    Ok(QaCatalog::new(schema, templates))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kgqa::domain::schema::SlotCategory;

    #[test]
    fn test_check_as_json_string_keeps_order() {
        let row: TemplateRow = serde_json::from_str(
            r#"{"question": "%REL%%ENT%", "cypher": "q", "check": "{\"%REL%\": 1, \"%ENT%\": 1}", "answer": ""}"#,
        )
        .unwrap();
        assert_eq!(
            row.check.0,
            vec![("%REL%".to_string(), 1), ("%ENT%".to_string(), 1)]
        );

        let template = row.into_template().unwrap();
        let order: Vec<_> = template.requirements().iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec![SlotCategory::Relation, SlotCategory::Entity]);
    }

    #[test]
    fn test_yaml_rows() {
        let rows: Vec<TemplateRow> = serde_yaml::from_str(
            r#"
- question: "%ENT0%和%ENT1%是什么关系"
  query: "q"
  check: { "%ENT%": 2 }
  answer: "REL"
- question: "有哪些歌曲"
  query: "q2"
  answer: "%ANS%"
"#,
        )
        .unwrap();
        let templates = build_templates(rows).unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].requirements().count(SlotCategory::Entity), Some(2));
        assert!(templates[1].requirements().is_empty());
    }

    #[test]
    fn test_invalid_row_is_reported_with_row_number() {
        let rows: Vec<TemplateRow> = serde_json::from_str(
            r#"[
                {"question": "%ENT%", "query": "q", "check": {"%ENT%": 1}, "answer": ""},
                {"question": "%ENT%的%ATT%", "query": "q", "check": {"%ENT%": 1}, "answer": ""}
            ]"#,
        )
        .unwrap();
        let err = build_templates(rows).unwrap_err();
        assert!(matches!(err, CatalogError::Definition { row: 2, .. }));
    }

    #[test]
    fn test_malformed_check_string_is_a_parse_error() {
        let parsed: Result<TemplateRow, _> = serde_json::from_str(
            r#"{"question": "x", "query": "q", "check": "{not json", "answer": ""}"#,
        );
        assert!(parsed.is_err());
    }
}
