use crate::catalog::Catalog;
use crate::missed::{is_missed, MissedQuestion};
use crate::question::Question;
use crate::stats::Statistics;
use log::{debug, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How many questions a session asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionCount {
    #[default]
    All,
    Limit(usize),
}

impl QuestionCount {
    /// Adaptive sessions need a concrete number; "all" means this many
    pub const ADAPTIVE_DEFAULT: usize = 100;

    pub fn limit_or(&self, all: usize) -> usize {
        match self {
            QuestionCount::All => all,
            QuestionCount::Limit(n) => *n,
        }
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionCount::All => write!(f, "all"),
            QuestionCount::Limit(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for QuestionCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "" => Ok(QuestionCount::All),
            n => n
                .parse::<usize>()
                .map(QuestionCount::Limit)
                .map_err(|_| format!("expected \"all\" or a number, got {n:?}")),
        }
    }
}

impl Serialize for QuestionCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuestionCount::All => serializer.serialize_str("all"),
            QuestionCount::Limit(n) => serializer.serialize_u64(*n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for QuestionCount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(usize),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(QuestionCount::Limit(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Tuning constants for the weakness score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaknessConfig {
    /// Subtracted from a question's score when it is in the missed ledger
    pub missed_penalty: f64,
    /// Score of a chapter with no recorded answers. At 100 such chapters
    /// sort last.
    pub default_accuracy: f64,
}

impl Default for WeaknessConfig {
    fn default() -> Self {
        Self {
            missed_penalty: 30.0,
            default_accuracy: 100.0,
        }
    }
}

/// Everything a selector may draw on besides the catalog
pub struct SelectionContext<'a> {
    pub catalog: &'a Catalog,
    pub statistics: &'a Statistics,
    pub missed: &'a [MissedQuestion],
    pub weakness: WeaknessConfig,
}

/// Strategy for building a session's question list
pub trait QuestionSelector {
    fn select_questions(
        &self,
        ctx: &SelectionContext<'_>,
        chapter_ids: &[String],
        count: QuestionCount,
    ) -> Vec<Question>;
}

/// Shuffled union of the selected chapters
pub struct StandardSelector;

impl QuestionSelector for StandardSelector {
    fn select_questions(
        &self,
        ctx: &SelectionContext<'_>,
        chapter_ids: &[String],
        count: QuestionCount,
    ) -> Vec<Question> {
        let mut questions = ctx.catalog.questions_for(chapter_ids);
        questions.shuffle(&mut rand::thread_rng());
        questions.truncate(count.limit_or(questions.len()));
        questions
    }
}

/// Worst-performing questions first
pub struct WeaknessSelector;

impl QuestionSelector for WeaknessSelector {
    fn select_questions(
        &self,
        ctx: &SelectionContext<'_>,
        chapter_ids: &[String],
        count: QuestionCount,
    ) -> Vec<Question> {
        let pool = ctx.catalog.questions_for(chapter_ids);
        weakness_questions(
            pool,
            ctx.statistics,
            ctx.missed,
            ctx.weakness,
            count.limit_or(QuestionCount::ADAPTIVE_DEFAULT),
        )
    }
}

/// Previously missed questions from the selected chapters, in the order of
/// `SelectionContext::missed` (most recent miss first when built by the
/// engine). Review sessions always cover every matching miss.
pub struct ReviewSelector;

impl QuestionSelector for ReviewSelector {
    fn select_questions(
        &self,
        ctx: &SelectionContext<'_>,
        chapter_ids: &[String],
        _count: QuestionCount,
    ) -> Vec<Question> {
        ctx.missed
            .iter()
            .filter(|m| {
                let id = m
                    .question
                    .chapter_id
                    .as_deref()
                    .or_else(|| ctx.catalog.id_for_title(&m.question.chapter));
                match id {
                    Some(id) => chapter_ids.iter().any(|sel| sel == id),
                    None => {
                        warn!(
                            "missed question from unknown chapter {:?} skipped",
                            m.question.chapter
                        );
                        false
                    }
                }
            })
            .map(|m| m.clone().into_question())
            .collect()
    }
}

/// Score each question by its chapter's accuracy, less a penalty for
/// questions already missed, and return the `count` lowest.
///
/// The sort is stable, so equal scores keep pool order.
pub fn weakness_questions(
    pool: Vec<Question>,
    statistics: &Statistics,
    missed: &[MissedQuestion],
    config: WeaknessConfig,
    count: usize,
) -> Vec<Question> {
    let mut chapter_scores: HashMap<String, f64> = HashMap::new();

    let mut scored: Vec<(Question, f64)> = pool
        .into_iter()
        .map(|q| {
            let chapter_score = *chapter_scores.entry(q.chapter.clone()).or_insert_with(|| {
                statistics
                    .chapter_accuracy(&q.chapter)
                    .unwrap_or(config.default_accuracy)
            });
            let score = if is_missed(missed, &q) {
                chapter_score - config.missed_penalty
            } else {
                chapter_score
            };
            (q, score)
        })
        .collect();

    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    debug!(
        "weakness scores: {:?}",
        scored.iter().take(count).map(|(_, s)| *s).collect::<Vec<_>>()
    );

    scored.into_iter().take(count).map(|(q, _)| q).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Chapter;
    use crate::question::fixtures::question;
    use crate::stats::ChapterPerformance;

    fn chapter(id: &str, title: &str, n: usize) -> Chapter {
        Chapter {
            id: id.into(),
            title: title.into(),
            enabled: true,
            questions: (0..n).map(|i| question(title, &format!("{id}{i}"), 0)).collect(),
        }
    }

    fn stats_with(entries: &[(&str, u64, u64)]) -> Statistics {
        let mut stats = Statistics::default();
        for (chapter, total, correct) in entries {
            stats.chapter_performance.insert(
                chapter.to_string(),
                ChapterPerformance {
                    total: *total,
                    correct: *correct,
                },
            );
        }
        stats
    }

    fn missed(q: &Question) -> MissedQuestion {
        MissedQuestion {
            question: q.clone(),
            user_answer: None,
            timestamp: 0,
            count: 1,
        }
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn question_count_parsing() {
        assert_eq!("all".parse::<QuestionCount>(), Ok(QuestionCount::All));
        assert_eq!("15".parse::<QuestionCount>(), Ok(QuestionCount::Limit(15)));
        assert!("lots".parse::<QuestionCount>().is_err());
        assert_eq!(QuestionCount::Limit(3).to_string(), "3");
    }

    #[test]
    fn question_count_serde_accepts_both_shapes() {
        let all: QuestionCount = serde_json::from_str("\"all\"").unwrap();
        let ten: QuestionCount = serde_json::from_str("10").unwrap();
        let text_ten: QuestionCount = serde_json::from_str("\"10\"").unwrap();
        assert_eq!(all, QuestionCount::All);
        assert_eq!(ten, QuestionCount::Limit(10));
        assert_eq!(text_ten, QuestionCount::Limit(10));
        assert_eq!(serde_json::to_string(&QuestionCount::All).unwrap(), "\"all\"");
    }

    #[test]
    fn lower_accuracy_chapter_comes_first() {
        let catalog = Catalog::new(vec![chapter("b", "B", 3), chapter("a", "A", 3)]);
        let stats = stats_with(&[("A", 10, 4), ("B", 10, 9)]);

        let picked = weakness_questions(
            catalog.questions_for(&ids(&["b", "a"])),
            &stats,
            &[],
            WeaknessConfig::default(),
            4,
        );

        let chapters: Vec<_> = picked.iter().map(|q| q.chapter.as_str()).collect();
        assert_eq!(chapters, vec!["A", "A", "A", "B"]);
    }

    #[test]
    fn chapters_without_data_are_deprioritized() {
        let catalog = Catalog::new(vec![chapter("new", "New", 2), chapter("old", "Old", 2)]);
        let stats = stats_with(&[("Old", 10, 9)]);

        let picked = weakness_questions(
            catalog.questions_for(&ids(&["new", "old"])),
            &stats,
            &[],
            WeaknessConfig::default(),
            2,
        );
        assert!(picked.iter().all(|q| q.chapter == "Old"));
    }

    #[test]
    fn missed_penalty_promotes_question() {
        let catalog = Catalog::new(vec![chapter("a", "A", 3), chapter("b", "B", 3)]);
        let stats = stats_with(&[("A", 10, 5), ("B", 10, 7)]);
        let pool = catalog.questions_for(&ids(&["a", "b"]));
        let ledger = vec![missed(&pool[4])];

        let picked = weakness_questions(pool.clone(), &stats, &ledger, WeaknessConfig::default(), 6);

        // B at 70 - 30 = 40 beats A at 50
        assert_eq!(picked[0], pool[4]);
        assert_eq!(&picked[1..4], &pool[0..3]);
    }

    #[test]
    fn ties_keep_pool_order() {
        let catalog = Catalog::new(vec![chapter("a", "A", 5)]);
        let pool = catalog.questions_for(&ids(&["a"]));
        let picked = weakness_questions(
            pool.clone(),
            &Statistics::default(),
            &[],
            WeaknessConfig::default(),
            5,
        );
        assert_eq!(picked, pool);
    }

    #[test]
    fn undersupply_returns_whole_pool() {
        let catalog = Catalog::new(vec![chapter("a", "A", 7), chapter("b", "B", 5)]);
        let ctx = SelectionContext {
            catalog: &catalog,
            statistics: &Statistics::default(),
            missed: &[],
            weakness: WeaknessConfig::default(),
        };
        let picked = WeaknessSelector.select_questions(&ctx, &ids(&["a", "b"]), QuestionCount::Limit(50));
        assert_eq!(picked.len(), 12);
    }

    #[test]
    fn custom_weights_are_honoured() {
        let catalog = Catalog::new(vec![chapter("a", "A", 1), chapter("b", "B", 1)]);
        let stats = stats_with(&[("A", 10, 2)]);
        let config = WeaknessConfig {
            missed_penalty: 30.0,
            default_accuracy: 0.0,
        };
        let picked = weakness_questions(
            catalog.questions_for(&ids(&["a", "b"])),
            &stats,
            &[],
            config,
            1,
        );
        assert_eq!(picked[0].chapter, "B");
    }

    #[test]
    fn standard_truncates_and_draws_from_selection() {
        let catalog = Catalog::new(vec![chapter("a", "A", 6), chapter("b", "B", 6)]);
        let ctx = SelectionContext {
            catalog: &catalog,
            statistics: &Statistics::default(),
            missed: &[],
            weakness: WeaknessConfig::default(),
        };

        let picked = StandardSelector.select_questions(&ctx, &ids(&["a"]), QuestionCount::Limit(4));
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|q| q.chapter == "A"));

        let all = StandardSelector.select_questions(&ctx, &ids(&["a", "b"]), QuestionCount::All);
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn review_joins_by_id_then_title() {
        let catalog = Catalog::new(vec![chapter("a", "A", 2), chapter("b", "B", 2)]);
        let pool = catalog.questions_for(&ids(&["a", "b"]));

        let mut legacy = pool[2].clone();
        legacy.chapter_id = None;
        let mut orphan = question("Gone", "orphan", 0);
        orphan.chapter_id = None;
        let ledger = vec![missed(&pool[0]), missed(&legacy), missed(&orphan)];

        let ctx = SelectionContext {
            catalog: &catalog,
            statistics: &Statistics::default(),
            missed: &ledger,
            weakness: WeaknessConfig::default(),
        };

        let only_b = ReviewSelector.select_questions(&ctx, &ids(&["b"]), QuestionCount::All);
        assert_eq!(only_b.len(), 1);
        assert_eq!(only_b[0].question, legacy.question);

        let both = ReviewSelector.select_questions(&ctx, &ids(&["a", "b"]), QuestionCount::All);
        assert_eq!(both.len(), 2);
    }
}
