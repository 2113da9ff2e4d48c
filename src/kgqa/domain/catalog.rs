use super::schema::SchemaTermSets;
use super::template::Template;

/// Everything an engine needs to know about one knowledge graph: the term
/// dictionaries and the ordered template library. Built once, never
/// mutated; several engines can each hold their own.
#[derive(Debug, Clone, Default)]
pub struct QaCatalog {
    schema: SchemaTermSets,
    templates: Vec<Template>,
}

impl QaCatalog {
    pub fn new(schema: SchemaTermSets, templates: Vec<Template>) -> Self {
        Self {
            schema: schema.normalized(),
            templates,
        }
    }

    pub fn schema(&self) -> &SchemaTermSets {
        &self.schema
    }

    /// Templates in catalog order. Ranking ties fall back to this order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }
}
