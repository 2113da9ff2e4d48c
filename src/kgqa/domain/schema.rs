//! Knowledge Graph Schema Terms
//!
//! The four term dictionaries mention extraction looks up, and the slot
//! categories templates are written against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// =============================================================================
// Slot Category
// =============================================================================

/// Category of a template slot. Each category is filled from one schema
/// term set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    /// `%ENT%` - a graph entity (node name)
    Entity,
    /// `%REL%` - a relation (edge type)
    Relation,
    /// `%ATT%` - an entity attribute (property key)
    Attribute,
    /// `%LAB%` - a node label
    Label,
}

impl SlotCategory {
    /// All categories in mention-table order.
    pub const ALL: [SlotCategory; 4] = [
        SlotCategory::Entity,
        SlotCategory::Relation,
        SlotCategory::Attribute,
        SlotCategory::Label,
    ];

    /// Short code used inside slot tokens.
    pub fn code(self) -> &'static str {
        match self {
            Self::Entity => "ENT",
            Self::Relation => "REL",
            Self::Attribute => "ATT",
            Self::Label => "LAB",
        }
    }

    /// Bare slot token, e.g. `%ENT%`.
    pub fn token(self) -> &'static str {
        match self {
            Self::Entity => "%ENT%",
            Self::Relation => "%REL%",
            Self::Attribute => "%ATT%",
            Self::Label => "%LAB%",
        }
    }

    /// Indexed slot token, e.g. `%ENT1%`.
    pub fn indexed_token(self, index: usize) -> String {
        format!("%{}{}%", self.code(), index)
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Parse a bare category token such as `%REL%`.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.token() == token)
    }
}

impl fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// =============================================================================
// Schema Term Sets
// =============================================================================

/// Term dictionaries loaded from the knowledge graph schema.
///
/// The on-disk form uses the key `entitys` for entities; `entities` is
/// accepted as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTermSets {
    #[serde(default, alias = "entitys")]
    pub entities: BTreeSet<String>,
    #[serde(default)]
    pub relations: BTreeSet<String>,
    #[serde(default)]
    pub attributes: BTreeSet<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl SchemaTermSets {
    pub fn new<I, S>(entities: I, relations: I, attributes: I, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entities: collect_terms(entities),
            relations: collect_terms(relations),
            attributes: collect_terms(attributes),
            labels: collect_terms(labels),
        }
    }

    /// Terms of one category.
    pub fn terms(&self, category: SlotCategory) -> &BTreeSet<String> {
        match category {
            SlotCategory::Entity => &self.entities,
            SlotCategory::Relation => &self.relations,
            SlotCategory::Attribute => &self.attributes,
            SlotCategory::Label => &self.labels,
        }
    }

    /// Drop empty terms. An empty term would match at every position.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for set in [
            &mut self.entities,
            &mut self.relations,
            &mut self.attributes,
            &mut self.labels,
        ] {
            set.retain(|t| !t.is_empty());
        }
        self
    }

    pub fn len(&self) -> usize {
        SlotCategory::ALL
            .into_iter()
            .map(|c| self.terms(c).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect_terms<I, S>(terms: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    terms
        .into_iter()
        .map(Into::into)
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for category in SlotCategory::ALL {
            assert_eq!(SlotCategory::from_token(category.token()), Some(category));
            assert_eq!(SlotCategory::from_code(category.code()), Some(category));
        }
        assert_eq!(SlotCategory::Entity.indexed_token(2), "%ENT2%");
        assert_eq!(SlotCategory::from_token("%ANS%"), None);
    }

    #[test]
    fn test_schema_accepts_legacy_entity_key() {
        let schema: SchemaTermSets = serde_json::from_str(
            r#"{"entitys": ["周杰伦", ""], "relations": ["作曲"], "attributes": [], "labels": []}"#,
        )
        .unwrap();
        let schema = schema.normalized();

        assert_eq!(schema.entities.len(), 1);
        assert!(schema.terms(SlotCategory::Relation).contains("作曲"));
        assert_eq!(schema.len(), 2);
    }
}
