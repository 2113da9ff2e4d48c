//! Question Templates
//!
//! A template is three parallel patterns (question, query, answer) sharing
//! one slot-token vocabulary, plus the number of mentions each slot
//! category needs. Templates are validated when they are built so that
//! expansion can never leave a slot token behind.

use super::schema::SlotCategory;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Matches every slot token: `%ENT%`, `%REL0%`, `%LAB12%`, ...
static SLOT_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%(ENT|REL|ATT|LAB)(\d*)%").expect("slot token pattern is valid")
});

// =============================================================================
// Errors
// =============================================================================

/// Which of a template's three patterns an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Question,
    Query,
    Answer,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Question => "question",
            Self::Query => "query",
            Self::Answer => "answer",
        })
    }
}

/// A template whose slot tokens disagree with its slot requirements.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown slot category `{0}`")]
    UnknownCategory(String),

    #[error("slot category {0} requires at least one mention")]
    ZeroCount(SlotCategory),

    #[error("slot category {0} is declared more than once")]
    DuplicateCategory(SlotCategory),

    #[error("{pattern} pattern contains `{token}` which the slot requirements cannot fill")]
    UnresolvedToken { pattern: PatternKind, token: String },
}

// =============================================================================
// Slot Tokens
// =============================================================================

/// A parsed slot token. `index` is `None` for the bare form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotToken {
    pub category: SlotCategory,
    pub index: Option<usize>,
}

impl SlotToken {
    pub fn bare(category: SlotCategory) -> Self {
        Self {
            category,
            index: None,
        }
    }

    pub fn indexed(category: SlotCategory, index: usize) -> Self {
        Self {
            category,
            index: Some(index),
        }
    }
}

impl fmt::Display for SlotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            None => f.write_str(self.category.token()),
            Some(i) => f.write_str(&self.category.indexed_token(i)),
        }
    }
}

/// One slot token occurrence found in a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch<'a> {
    /// The literal text, e.g. `%ENT0%`.
    pub text: &'a str,
    /// `None` when the index has a leading zero or does not fit in `usize`.
    pub token: Option<SlotToken>,
}

/// Scan a pattern for slot tokens, left to right.
pub fn slot_tokens(pattern: &str) -> impl Iterator<Item = TokenMatch<'_>> {
    SLOT_TOKEN.captures_iter(pattern).map(|caps| {
        let text = caps.get(0).map_or("", |m| m.as_str());
        let category = caps.get(1).and_then(|m| SlotCategory::from_code(m.as_str()));
        let digits = caps.get(2).map_or("", |m| m.as_str());
        let token = category.and_then(|category| {
            if digits.is_empty() {
                Some(SlotToken::bare(category))
            } else if digits.len() > 1 && digits.starts_with('0') {
                None
            } else {
                digits
                    .parse()
                    .ok()
                    .map(|index| SlotToken::indexed(category, index))
            }
        });
        TokenMatch { text, token }
    })
}

/// Replace every slot token in `pattern` using `lookup`, in a single pass.
///
/// Substituted values are never rescanned. The first token `lookup` cannot
/// fill is returned as the error.
pub fn substitute_slots<'a, F>(pattern: &str, mut lookup: F) -> Result<String, String>
where
    F: FnMut(SlotToken) -> Option<&'a str>,
{
    let mut unresolved: Option<String> = None;
    let replaced = SLOT_TOKEN.replace_all(pattern, |caps: &regex::Captures<'_>| {
        let text = caps.get(0).map_or("", |m| m.as_str());
        let value = slot_tokens(text)
            .next()
            .and_then(|m| m.token)
            .and_then(&mut lookup);
        match value {
            Some(v) => v.to_string(),
            None => {
                unresolved.get_or_insert_with(|| text.to_string());
                text.to_string()
            }
        }
    });

    match unresolved {
        Some(token) => Err(token),
        None => Ok(replaced.into_owned()),
    }
}

// =============================================================================
// Slot Requirements
// =============================================================================

/// How many mentions of each category a template needs, in declaration
/// order. Declaration order fixes the order candidates are generated in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRequirements(Vec<(SlotCategory, usize)>);

impl SlotRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(token, count)` pairs such as `("%ENT%", 2)`.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut requirements = Self::new();
        for (token, count) in pairs {
            let token = token.as_ref();
            let category = SlotCategory::from_token(token)
                .ok_or_else(|| TemplateError::UnknownCategory(token.to_string()))?;
            let count = usize::try_from(count).unwrap_or(usize::MAX);
            requirements = requirements.with(category, count)?;
        }
        Ok(requirements)
    }

    /// Add one category requirement.
    pub fn with(mut self, category: SlotCategory, count: usize) -> Result<Self, TemplateError> {
        if count == 0 {
            return Err(TemplateError::ZeroCount(category));
        }
        if self.count(category).is_some() {
            return Err(TemplateError::DuplicateCategory(category));
        }
        self.0.push((category, count));
        Ok(self)
    }

    pub fn count(&self, category: SlotCategory) -> Option<usize> {
        self.0
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotCategory, usize)> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether a token can be bound under these requirements: the bare
    /// token when the count is 1, `%CAT{i}%` with `i < count` otherwise.
    pub fn resolves(&self, token: SlotToken) -> bool {
        match (self.count(token.category), token.index) {
            (Some(1), None) => true,
            (Some(count), Some(i)) if count > 1 => i < count,
            _ => false,
        }
    }
}

impl Serialize for SlotRequirements {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, count) in &self.0 {
            map.serialize_entry(category.token(), count)?;
        }
        map.end()
    }
}

// =============================================================================
// Template
// =============================================================================

/// A validated question template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    question: String,
    query: String,
    requirements: SlotRequirements,
    answer: String,
}

impl Template {
    /// Build a template, rejecting any slot token the requirements
    /// cannot fill.
    pub fn new(
        question: impl Into<String>,
        query: impl Into<String>,
        requirements: SlotRequirements,
        answer: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let template = Self {
            question: question.into(),
            query: query.into(),
            requirements,
            answer: answer.into(),
        };
        template.validate()?;
        Ok(template)
    }

    fn validate(&self) -> Result<(), TemplateError> {
        for (kind, pattern) in self.patterns() {
            for m in slot_tokens(pattern) {
                let resolvable = m.token.is_some_and(|t| self.requirements.resolves(t));
                if !resolvable {
                    return Err(TemplateError::UnresolvedToken {
                        pattern: kind,
                        token: m.text.to_string(),
                    });
                }
            }
        }

        for (category, _) in self.requirements.iter() {
            let used = self
                .patterns()
                .any(|(_, p)| slot_tokens(p).any(|m| m.token.is_some_and(|t| t.category == category)));
            if !used {
                tracing::warn!(
                    question = %self.question,
                    category = %category,
                    "Template requires a slot category none of its patterns use"
                );
            }
        }
        Ok(())
    }

    fn patterns(&self) -> impl Iterator<Item = (PatternKind, &str)> {
        [
            (PatternKind::Question, self.question.as_str()),
            (PatternKind::Query, self.query.as_str()),
            (PatternKind::Answer, self.answer.as_str()),
        ]
        .into_iter()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn requirements(&self) -> &SlotRequirements {
        &self.requirements
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reqs(pairs: &[(&str, u64)]) -> SlotRequirements {
        SlotRequirements::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_slot_tokens_scan() {
        let found: Vec<_> = slot_tokens("%ENT0%和%ENT1%是%REL%吗, 100%ANS%")
            .map(|m| m.token)
            .collect();
        assert_eq!(
            found,
            vec![
                Some(SlotToken::indexed(SlotCategory::Entity, 0)),
                Some(SlotToken::indexed(SlotCategory::Entity, 1)),
                Some(SlotToken::bare(SlotCategory::Relation)),
            ]
        );
    }

    #[test]
    fn test_requirements_keep_declaration_order() {
        let r = reqs(&[("%REL%", 1), ("%ENT%", 2)]);
        let order: Vec<_> = r.iter().collect();
        assert_eq!(
            order,
            vec![(SlotCategory::Relation, 1), (SlotCategory::Entity, 2)]
        );
    }

    #[test]
    fn test_requirements_reject_bad_entries() {
        assert_eq!(
            SlotRequirements::from_pairs([("%FOO%", 1)]),
            Err(TemplateError::UnknownCategory("%FOO%".to_string()))
        );
        assert_eq!(
            SlotRequirements::from_pairs([("%ENT%", 0)]),
            Err(TemplateError::ZeroCount(SlotCategory::Entity))
        );
        assert_eq!(
            SlotRequirements::from_pairs([("%ENT%", 1), ("%ENT%", 2)]),
            Err(TemplateError::DuplicateCategory(SlotCategory::Entity))
        );
    }

    #[test]
    fn test_template_accepts_consistent_tokens() {
        let template = Template::new(
            "%ENT0%和%ENT1%是什么关系",
            "MATCH (a)-[r]-(b) WHERE a.NAME='%ENT0%' AND b.NAME='%ENT1%' RETURN r AS REL",
            reqs(&[("%ENT%", 2)]),
            "%ENT0%和%ENT1%的关系是REL",
        );
        assert!(template.is_ok());
    }

    #[test]
    fn test_template_rejects_bare_token_when_count_is_two() {
        let err = Template::new("%ENT%是谁", "q", reqs(&[("%ENT%", 2)]), "a").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnresolvedToken {
                pattern: PatternKind::Question,
                token: "%ENT%".to_string()
            }
        );
    }

    #[test]
    fn test_template_rejects_out_of_range_index() {
        let err = Template::new("%ENT0%", "%ENT2%", reqs(&[("%ENT%", 2)]), "").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnresolvedToken {
                pattern: PatternKind::Query,
                ..
            }
        ));
    }

    #[test]
    fn test_leading_zero_index_is_not_a_token() {
        let found: Vec<_> = slot_tokens("%ENT01%").map(|m| m.token).collect();
        assert_eq!(found, vec![None]);

        let err = Template::new("%ENT0%和%ENT01%", "q", reqs(&[("%ENT%", 2)]), "").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnresolvedToken {
                pattern: PatternKind::Question,
                token: "%ENT01%".to_string(),
            }
        );
    }

    #[test]
    fn test_template_rejects_undeclared_category() {
        let err = Template::new("%ENT%的%ATT%", "q", reqs(&[("%ENT%", 1)]), "a").unwrap_err();
        assert!(matches!(err, TemplateError::UnresolvedToken { .. }));
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let out = substitute_slots("%ENT%-%REL%", |t| match t.category {
            SlotCategory::Entity => Some("%REL%"),
            _ => Some("x"),
        })
        .unwrap();
        assert_eq!(out, "%REL%-x");
    }

    #[test]
    fn test_substitute_reports_first_unresolved() {
        let err = substitute_slots("%ENT%的%ATT%", |t| {
            (t.category == SlotCategory::Entity).then_some("周杰伦")
        })
        .unwrap_err();
        assert_eq!(err, "%ATT%");
    }
}
