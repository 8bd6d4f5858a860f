use crate::question::QuizResult;
use crate::store::{keys, KeyValue};
use crate::util::percent;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for a single chapter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPerformance {
    pub total: u64,
    pub correct: u64,
}

impl ChapterPerformance {
    pub fn accuracy(&self) -> Option<f64> {
        percent(self.correct, self.total)
    }
}

/// Aggregate counters across every completed quiz
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub total_quizzes: u64,
    pub total_questions: u64,
    pub correct_answers: u64,
    /// Keyed by chapter title
    pub chapter_performance: BTreeMap<String, ChapterPerformance>,
}

/// One row of the per-chapter summary table
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterSummary {
    pub chapter: String,
    pub total: u64,
    pub correct: u64,
    pub accuracy: f64,
}

impl Statistics {
    /// Fold a completed quiz into the counters
    pub fn record(&mut self, result: &QuizResult) {
        self.total_quizzes += 1;
        self.total_questions += result.questions.len() as u64;
        self.correct_answers += result.correct_count as u64;

        for (i, question) in result.questions.iter().enumerate() {
            let answer = result.user_answers.get(i).copied().flatten();
            let entry = self
                .chapter_performance
                .entry(question.chapter.clone())
                .or_default();
            entry.total += 1;
            if question.is_correct(answer) {
                entry.correct += 1;
            }
        }
    }

    pub fn overall_accuracy(&self) -> Option<f64> {
        percent(self.correct_answers, self.total_questions)
    }

    pub fn chapter_accuracy(&self, chapter: &str) -> Option<f64> {
        self.chapter_performance
            .get(chapter)
            .and_then(ChapterPerformance::accuracy)
    }

    /// Chapters ordered weakest first; ties keep alphabetical order
    pub fn chapter_summary(&self) -> Vec<ChapterSummary> {
        self.chapter_performance
            .iter()
            .filter_map(|(chapter, perf)| {
                perf.accuracy().map(|accuracy| ChapterSummary {
                    chapter: chapter.clone(),
                    total: perf.total,
                    correct: perf.correct,
                    accuracy,
                })
            })
            .sorted_by(|a, b| {
                a.accuracy
                    .partial_cmp(&b.accuracy)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .collect()
    }
}

pub fn load_statistics<K: KeyValue>(store: &K) -> Statistics {
    store.get(keys::STATS, Statistics::default())
}

/// Load, update and write back the statistics for a completed quiz.
/// Returns whether the write succeeded.
pub fn update_statistics<K: KeyValue>(store: &K, result: &QuizResult) -> bool {
    let mut stats = load_statistics(store);
    stats.record(result);
    debug!(
        "statistics now {} quizzes, {}/{} correct",
        stats.total_quizzes, stats.correct_answers, stats.total_questions
    );
    store.save(keys::STATS, &stats)
}

pub fn clear_statistics<K: KeyValue>(store: &K) -> bool {
    store.remove(keys::STATS)
}
