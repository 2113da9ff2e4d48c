//! Mention tables, slot bindings and expanded query candidates.

use super::schema::SlotCategory;
use super::template::SlotToken;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Mention Table
// =============================================================================

/// Mentions found in one sentence, per slot category, in order of
/// appearance. Repeated terms appear once per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MentionTable {
    mentions: BTreeMap<SlotCategory, Vec<String>>,
}

impl MentionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used mostly by tests.
    #[must_use]
    pub fn with<I, S>(mut self, category: SlotCategory, mentions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(category, mentions.into_iter().map(Into::into).collect());
        self
    }

    pub fn insert(&mut self, category: SlotCategory, mentions: Vec<String>) {
        self.mentions.insert(category, mentions);
    }

    /// Mentions of a category; empty when none were found.
    pub fn get(&self, category: SlotCategory) -> &[String] {
        self.mentions.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.values().all(Vec::is_empty)
    }
}

// =============================================================================
// Slot Binding
// =============================================================================

/// One mention chosen for every slot token a template needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotBinding(HashMap<SlotToken, String>);

impl SlotBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a category's chosen mentions: a single mention goes to the bare
    /// token, several go to `%CAT0%`, `%CAT1%`, ... in order.
    pub fn bind(&mut self, category: SlotCategory, chosen: &[&str]) {
        if let [single] = chosen {
            self.0
                .insert(SlotToken::bare(category), (*single).to_string());
        } else {
            for (i, mention) in chosen.iter().enumerate() {
                self.0
                    .insert(SlotToken::indexed(category, i), (*mention).to_string());
            }
        }
    }

    pub fn get(&self, token: SlotToken) -> Option<&str> {
        self.0.get(&token).map(String::as_str)
    }

    /// Bound tokens in token order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotToken, &str)> {
        let mut entries: Vec<_> = self.0.iter().map(|(t, m)| (*t, m.as_str())).collect();
        entries.sort_by_key(|(t, _)| *t);
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Answer Pattern
// =============================================================================

/// A template's answer pattern together with the mentions bound to its slot
/// tokens.
///
/// Slots and result fields are filled in one left-to-right pass over the
/// template text, so neither a spliced mention nor a field value is ever
/// scanned for names again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerPattern {
    template: String,
    slots: Vec<(String, String)>,
}

impl AnswerPattern {
    pub fn new(template: impl Into<String>, binding: &SlotBinding) -> Self {
        Self {
            template: template.into(),
            slots: binding
                .iter()
                .map(|(token, mention)| (token.to_string(), mention.to_string()))
                .collect(),
        }
    }

    /// A pattern with no slots.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            template: text.into(),
            slots: Vec::new(),
        }
    }

    /// The pattern with its slots filled and result fields left as written.
    pub fn resolved(&self) -> String {
        self.fill(std::iter::empty::<(&str, String)>())
    }

    /// Fill slots and the given fields. At each position the longest
    /// matching name wins; a slot token wins a tie with a field name.
    pub fn fill<'a, I>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut names: Vec<(&str, String)> = self
            .slots
            .iter()
            .map(|(token, mention)| (token.as_str(), mention.clone()))
            .collect();
        for (name, value) in fields {
            if !name.is_empty() {
                names.push((name, value));
            }
        }
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        'scan: while let Some(c) = rest.chars().next() {
            for (name, value) in &names {
                if let Some(after) = rest.strip_prefix(name) {
                    out.push_str(value);
                    rest = after;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

impl Serialize for AnswerPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.resolved())
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// A template expanded against one slot binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Position of the source template in the catalog.
    pub template_index: usize,
    /// Resolved question text, compared against the user's sentence.
    pub question: String,
    /// Resolved query text, run against the graph store.
    pub query: String,
    /// Answer pattern; result fields are filled once rows arrive.
    pub answer: AnswerPattern,
    /// Similarity to the user's sentence (0.0 until ranked).
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_table_defaults_to_empty() {
        let table = MentionTable::new().with(SlotCategory::Entity, ["周杰伦", "方文山"]);
        assert_eq!(table.get(SlotCategory::Entity).len(), 2);
        assert!(table.get(SlotCategory::Label).is_empty());
        assert!(!table.is_empty());
        assert!(MentionTable::new().with(SlotCategory::Relation, Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_binding_bare_and_indexed() {
        let mut binding = SlotBinding::new();
        binding.bind(SlotCategory::Relation, &["作曲"]);
        binding.bind(SlotCategory::Entity, &["周杰伦", "方文山"]);

        assert_eq!(binding.get(SlotToken::bare(SlotCategory::Relation)), Some("作曲"));
        assert_eq!(
            binding.get(SlotToken::indexed(SlotCategory::Entity, 1)),
            Some("方文山")
        );
        assert_eq!(binding.get(SlotToken::bare(SlotCategory::Entity)), None);
        assert_eq!(binding.len(), 3);

        let tokens: Vec<_> = binding.iter().map(|(t, _)| t.to_string()).collect();
        assert_eq!(tokens, vec!["%ENT0%", "%ENT1%", "%REL%"]);
    }

    #[test]
    fn test_answer_pattern_does_not_rescan_mentions() {
        let mut binding = SlotBinding::new();
        binding.bind(SlotCategory::Entity, &["TRANSFORMERS"]);
        let pattern = AnswerPattern::new("%ENT%的导演是ANS", &binding);

        assert_eq!(pattern.resolved(), "TRANSFORMERS的导演是ANS");
        assert_eq!(
            pattern.fill([("ANS", "迈克尔·贝".to_string())]),
            "TRANSFORMERS的导演是迈克尔·贝"
        );
    }

    #[test]
    fn test_answer_pattern_does_not_rescan_values() {
        let pattern = AnswerPattern::literal("ANS2/ANS");
        let filled = pattern.fill([("ANS", "x".to_string()), ("ANS2", "ANS".to_string())]);
        assert_eq!(filled, "ANS/x");
    }
}
