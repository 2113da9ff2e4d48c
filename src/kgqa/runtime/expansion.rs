//! Template Expansion
//!
//! Turns each eligible template into one candidate per slot assignment.
//! For a category needing `k` of `n` mentions every order-preserving
//! `k`-combination is used (`C(n, k)` of them); assignments across the
//! template's categories are the Cartesian product, in declaration order
//! with the last category varying fastest.

use crate::kgqa::domain::{
    candidate::{AnswerPattern, Candidate, MentionTable, SlotBinding},
    schema::SlotCategory,
    template::{PatternKind, Template, TemplateError, substitute_slots},
};

/// A template is eligible only if every category it needs has enough
/// mentions.
pub fn is_eligible(template: &Template, mentions: &MentionTable) -> bool {
    template
        .requirements()
        .iter()
        .all(|(category, count)| mentions.get(category).len() >= count)
}

/// All order-preserving `k`-combinations of the indices `0..n`, in
/// lexicographic order.
pub fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    if k > n {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        out.push(indices.clone());

        // Rightmost position that can still move right.
        let mut i = k;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

/// Every slot binding a template admits against a mention table.
///
/// Returns nothing for an ineligible template, and a single empty binding
/// for a template without slots. Stops after `limit` bindings.
fn bindings(template: &Template, mentions: &MentionTable, limit: usize) -> Vec<SlotBinding> {
    if limit == 0 || !is_eligible(template, mentions) {
        return Vec::new();
    }

    let per_category: Vec<(SlotCategory, &[String], Vec<Vec<usize>>)> = template
        .requirements()
        .iter()
        .map(|(category, count)| {
            let available = mentions.get(category);
            (category, available, combinations(available.len(), count))
        })
        .collect();

    let mut out = Vec::new();
    let mut cursor = vec![0usize; per_category.len()];
    loop {
        let mut binding = SlotBinding::new();
        for ((category, available, combos), &at) in per_category.iter().zip(&cursor) {
            let chosen: Vec<&str> = combos[at]
                .iter()
                .map(|&i| available[i].as_str())
                .collect();
            binding.bind(*category, &chosen);
        }
        out.push(binding);
        if out.len() >= limit {
            return out;
        }

        // Odometer step, last category fastest.
        let mut pos = cursor.len();
        loop {
            if pos == 0 {
                return out;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < per_category[pos].2.len() {
                break;
            }
            cursor[pos] = 0;
        }
    }
}

/// Expand one template into unscored candidates.
pub fn expand(
    template_index: usize,
    template: &Template,
    mentions: &MentionTable,
) -> Result<Vec<Candidate>, TemplateError> {
    expand_bounded(template_index, template, mentions, usize::MAX)
}

/// [`expand`], producing at most `limit` candidates.
pub fn expand_bounded(
    template_index: usize,
    template: &Template,
    mentions: &MentionTable,
    limit: usize,
) -> Result<Vec<Candidate>, TemplateError> {
    bindings(template, mentions, limit)
        .iter()
        .map(|binding| {
            let fill = |kind: PatternKind, pattern: &str| {
                substitute_slots(pattern, |token| binding.get(token)).map_err(|token| {
                    TemplateError::UnresolvedToken {
                        pattern: kind,
                        token,
                    }
                })
            };
            // Answer slots are filled together with result fields; check
            // here that every one of them is bound.
            fill(PatternKind::Answer, template.answer())?;
            Ok(Candidate {
                template_index,
                question: fill(PatternKind::Question, template.question())?,
                query: fill(PatternKind::Query, template.query())?,
                answer: AnswerPattern::new(template.answer(), binding),
                score: 0.0,
            })
        })
        .collect()
}

/// Expand a whole template library, in library order.
///
/// With a `limit`, expansion stops once that many candidates exist; later
/// templates and combinations are dropped. The error carries the index of
/// the offending template.
pub fn expand_all(
    templates: &[Template],
    mentions: &MentionTable,
    limit: Option<usize>,
) -> Result<Vec<Candidate>, (usize, TemplateError)> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut candidates = Vec::new();
    for (index, template) in templates.iter().enumerate() {
        if !is_eligible(template, mentions) {
            continue;
        }
        let remaining = limit - candidates.len();
        if remaining == 0 {
            tracing::warn!(limit, "Candidate limit reached, skipping remaining templates");
            break;
        }
        let expanded =
            expand_bounded(index, template, mentions, remaining).map_err(|e| (index, e))?;
        tracing::debug!(
            template = index,
            question = template.question(),
            candidates = expanded.len(),
            "Expanded template"
        );
        candidates.extend(expanded);
    }
    Ok(candidates)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kgqa::domain::template::SlotRequirements;

    fn template(question: &str, reqs: &[(&str, u64)], answer: &str) -> Template {
        Template::new(
            question,
            format!("QUERY {question}"),
            SlotRequirements::from_pairs(reqs.iter().copied()).unwrap(),
            answer,
        )
        .unwrap()
    }

    fn binomial(n: usize, k: usize) -> usize {
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn test_combinations_preserve_order() {
        assert_eq!(
            combinations(3, 2),
            vec![vec![0, 1], vec![0, 2], vec![1, 2]]
        );
        assert_eq!(combinations(2, 3), Vec::<Vec<usize>>::new());
        assert_eq!(combinations(4, 0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_combination_counts_are_binomial() {
        for n in 0..7 {
            for k in 1..=n {
                assert_eq!(combinations(n, k).len(), binomial(n, k), "C({n}, {k})");
            }
        }
    }

    #[test]
    fn test_ineligible_template_is_skipped() {
        let t = template("%ENT0%和%ENT1%", &[("%ENT%", 2)], "");
        let mentions = MentionTable::new().with(SlotCategory::Entity, ["周杰伦"]);
        assert!(!is_eligible(&t, &mentions));
        assert!(expand(0, &t, &mentions).unwrap().is_empty());
    }

    #[test]
    fn test_pair_template_counts() {
        let t = template("%ENT0%和%ENT1%是什么关系", &[("%ENT%", 2)], "%ENT0%-%ENT1%");

        let two = MentionTable::new().with(SlotCategory::Entity, ["周杰伦", "淡江中学"]);
        assert_eq!(expand(0, &t, &two).unwrap().len(), 1);

        let three = MentionTable::new().with(SlotCategory::Entity, ["A", "B", "C"]);
        let questions: Vec<String> = expand(0, &t, &three)
            .unwrap()
            .into_iter()
            .map(|c| c.question)
            .collect();
        assert_eq!(
            questions,
            vec!["A和B是什么关系", "A和C是什么关系", "B和C是什么关系"]
        );
    }

    #[test]
    fn test_product_across_categories() {
        let t = template("%ENT%的%REL0%和%REL1%", &[("%ENT%", 1), ("%REL%", 2)], "");
        let mentions = MentionTable::new()
            .with(SlotCategory::Entity, ["E1", "E2"])
            .with(SlotCategory::Relation, ["R1", "R2", "R3"]);

        let questions: Vec<String> = expand(0, &t, &mentions)
            .unwrap()
            .into_iter()
            .map(|c| c.question)
            .collect();

        // 2 * C(3, 2); the relation category (declared last) varies fastest.
        assert_eq!(questions.len(), 6);
        assert_eq!(questions[0], "E1的R1和R2");
        assert_eq!(questions[1], "E1的R1和R3");
        assert_eq!(questions[2], "E1的R2和R3");
        assert_eq!(questions[3], "E2的R1和R2");
    }

    #[test]
    fn test_substitution_covers_all_patterns() {
        let t = template("%ENT%的%ATT%是什么", &[("%ENT%", 1), ("%ATT%", 1)], "%ENT%的%ATT%是%ANS%");
        let mentions = MentionTable::new()
            .with(SlotCategory::Entity, ["周杰伦"])
            .with(SlotCategory::Attribute, ["血型"]);

        let candidates = expand(3, &t, &mentions).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.template_index, 3);
        assert_eq!(c.question, "周杰伦的血型是什么");
        assert_eq!(c.query, "QUERY 周杰伦的血型是什么");
        let answer = c.answer.resolved();
        assert_eq!(answer, "周杰伦的血型是%ANS%");
        for text in [&c.question, &c.query, &answer] {
            assert!(crate::kgqa::domain::template::slot_tokens(text).next().is_none());
        }
    }

    #[test]
    fn test_slotless_template_expands_verbatim() {
        let t = template("有哪些歌曲", &[], "歌曲有%ANS%");
        let candidates = expand(0, &t, &MentionTable::new()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].question, "有哪些歌曲");
        assert_eq!(candidates[0].answer.resolved(), "歌曲有%ANS%");
    }

    #[test]
    fn test_expand_all_keeps_library_order() {
        let templates = vec![
            template("%ENT%的作曲是谁", &[("%ENT%", 1)], ""),
            template("%ENT0%和%ENT1%", &[("%ENT%", 2)], ""),
            template("%LAB%", &[("%LAB%", 1)], ""),
        ];
        let mentions = MentionTable::new().with(SlotCategory::Entity, ["A", "B"]);

        let candidates = expand_all(&templates, &mentions, None).unwrap();
        let origin: Vec<usize> = candidates.iter().map(|c| c.template_index).collect();
        assert_eq!(origin, vec![0, 0, 1]);
    }

    #[test]
    fn test_expand_all_stops_at_limit() {
        let templates = vec![
            template("%ENT0%和%ENT1%", &[("%ENT%", 2)], ""),
            template("%ENT%的作曲是谁", &[("%ENT%", 1)], ""),
        ];
        let repeated = vec!["周杰伦"; 20];
        let mentions = MentionTable::new().with(SlotCategory::Entity, repeated);

        // C(20, 2) = 190 pairs without a limit
        assert_eq!(expand_all(&templates, &mentions, None).unwrap().len(), 190 + 20);

        let bounded = expand_all(&templates, &mentions, Some(25)).unwrap();
        assert_eq!(bounded.len(), 25);
        assert!(bounded.iter().all(|c| c.template_index == 0));
        assert!(expand_all(&templates, &mentions, Some(0)).unwrap().is_empty());
    }
}
