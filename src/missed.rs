use crate::question::Question;
use crate::store::{keys, KeyValue};
use crate::util::{days_ago_ms, epoch_ms};
use chrono::{DateTime, Local};
use log::debug;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A question the user got wrong, with the most recent miss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedQuestion {
    #[serde(flatten)]
    pub question: Question,
    /// `None` when the question timed out unanswered
    pub user_answer: Option<usize>,
    pub timestamp: i64,
    #[serde(default)]
    pub count: u32,
}

impl MissedQuestion {
    pub fn into_question(self) -> Question {
        self.question
    }
}

/// How far back to look when listing missed questions
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimeWindow {
    #[strum(serialize = "week")]
    Week,
    #[strum(serialize = "month")]
    Month,
    #[strum(serialize = "three_months")]
    ThreeMonths,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 3] = [TimeWindow::Week, TimeWindow::Month, TimeWindow::ThreeMonths];

    pub fn days(&self) -> i64 {
        match self {
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::ThreeMonths => 90,
        }
    }
}

impl FromStr for TimeWindow {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            "three_months" => Ok(TimeWindow::ThreeMonths),
            _ => Err(()),
        }
    }
}

pub fn all_missed_questions<K: KeyValue>(store: &K) -> Vec<MissedQuestion> {
    store.get(keys::MISSED_QUESTIONS, Vec::new())
}

/// Record a miss, merging with an earlier miss of the same question
pub fn save_missed_question<K: KeyValue>(
    store: &K,
    question: &Question,
    user_answer: Option<usize>,
    now: DateTime<Local>,
) -> bool {
    let mut missed = all_missed_questions(store);
    let timestamp = epoch_ms(now);

    match missed
        .iter_mut()
        .find(|m| m.question.same_identity(question))
    {
        Some(existing) => {
            existing.count += 1;
            existing.user_answer = user_answer;
            existing.timestamp = timestamp;
            if existing.question.chapter_id.is_none() {
                existing.question.chapter_id = question.chapter_id.clone();
            }
            debug!("missed again ({}x): {}", existing.count, question.question);
        }
        None => {
            missed.push(MissedQuestion {
                question: question.clone(),
                user_answer,
                timestamp,
                count: 1,
            });
            debug!("first miss: {}", question.question);
        }
    }

    store.save(keys::MISSED_QUESTIONS, &missed)
}

/// Missed questions filtered by chapter title and age, most recent first.
///
/// `chapter` of `None` or `"all"` matches every chapter; a time filter that
/// is `None` or not a known window matches every age.
pub fn get_missed_questions<K: KeyValue>(
    store: &K,
    chapter: Option<&str>,
    time_filter: Option<&str>,
    now: DateTime<Local>,
) -> Vec<MissedQuestion> {
    filter_missed(&all_missed_questions(store), chapter, time_filter, now)
}

/// [`get_missed_questions`] over an already loaded ledger
pub fn filter_missed(
    missed: &[MissedQuestion],
    chapter: Option<&str>,
    time_filter: Option<&str>,
    now: DateTime<Local>,
) -> Vec<MissedQuestion> {
    let window = time_filter.and_then(|t| t.parse::<TimeWindow>().ok());
    let cutoff = window.map(|w| days_ago_ms(now, w.days()));
    let chapter = chapter.filter(|c| *c != "all");

    let mut filtered: Vec<_> = missed
        .iter()
        .filter(|m| chapter.map_or(true, |c| m.question.chapter == c))
        .filter(|m| cutoff.map_or(true, |cut| m.timestamp >= cut))
        .cloned()
        .collect();
    filtered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    filtered
}

/// All-time membership test by question identity
pub fn is_missed(missed: &[MissedQuestion], question: &Question) -> bool {
    missed.iter().any(|m| m.question.same_identity(question))
}

pub fn clear_missed_questions<K: KeyValue>(store: &K) -> bool {
    store.remove(keys::MISSED_QUESTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::fixtures::question;
    use crate::store::Store;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn fresh_store_has_no_missed_questions() {
        let store = Store::open_in_memory().unwrap();
        assert!(get_missed_questions(&store, None, None, now()).is_empty());
    }

    #[test]
    fn repeat_miss_is_deduplicated() {
        let store = Store::open_in_memory().unwrap();
        let q = question("Enums", "What is an enum?", 0);

        save_missed_question(&store, &q, Some(1), now() - Duration::hours(1));
        save_missed_question(&store, &q, Some(2), now());

        let missed = all_missed_questions(&store);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].count, 2);
        assert_eq!(missed[0].user_answer, Some(2));
        assert_eq!(missed[0].timestamp, epoch_ms(now()));
    }

    #[test]
    fn same_text_in_other_chapter_is_distinct() {
        let store = Store::open_in_memory().unwrap();
        save_missed_question(&store, &question("A", "same?", 0), None, now());
        save_missed_question(&store, &question("B", "same?", 0), None, now());
        assert_eq!(all_missed_questions(&store).len(), 2);
    }

    #[test]
    fn legacy_entry_without_count_starts_from_zero() {
        let store = Store::open_in_memory().unwrap();
        let raw = serde_json::json!([{
            "question": "old?",
            "options": ["a", "b", "c", "d"],
            "correctAnswer": 0,
            "explanation": "",
            "chapter": "Enums",
            "userAnswer": 3,
            "timestamp": 1
        }]);
        store.save(keys::MISSED_QUESTIONS, &raw);

        save_missed_question(&store, &question("Enums", "old?", 0), Some(1), now());

        let missed = all_missed_questions(&store);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].count, 1);
    }

    #[test]
    fn filters_by_chapter_and_window_newest_first() {
        let store = Store::open_in_memory().unwrap();
        save_missed_question(&store, &question("A", "old", 0), None, now() - Duration::days(40));
        save_missed_question(&store, &question("A", "recent", 0), None, now() - Duration::days(2));
        save_missed_question(&store, &question("B", "newest", 0), None, now());
        save_missed_question(&store, &question("A", "month", 0), None, now() - Duration::days(20));

        let texts = |v: Vec<MissedQuestion>| -> Vec<String> {
            v.into_iter().map(|m| m.question.question).collect()
        };

        assert_eq!(
            texts(get_missed_questions(&store, None, None, now())),
            vec!["newest", "recent", "month", "old"]
        );
        assert_eq!(
            texts(get_missed_questions(&store, Some("all"), Some("week"), now())),
            vec!["newest", "recent"]
        );
        assert_eq!(
            texts(get_missed_questions(&store, Some("A"), Some("month"), now())),
            vec!["recent", "month"]
        );
        assert_eq!(
            texts(get_missed_questions(&store, Some("A"), Some("three_months"), now())),
            vec!["recent", "month", "old"]
        );
        assert_eq!(
            texts(get_missed_questions(&store, Some("A"), Some("forever"), now())).len(),
            3
        );
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let store = Store::open_in_memory().unwrap();
        save_missed_question(&store, &question("A", "edge", 0), None, now() - Duration::days(7));
        assert_eq!(get_missed_questions(&store, None, Some("week"), now()).len(), 1);
    }

    #[test]
    fn membership_and_clear() {
        let store = Store::open_in_memory().unwrap();
        let q = question("A", "q", 0);
        save_missed_question(&store, &q, None, now());

        assert!(is_missed(&all_missed_questions(&store), &q));
        assert!(!is_missed(&all_missed_questions(&store), &question("A", "other", 0)));

        assert!(clear_missed_questions(&store));
        assert!(all_missed_questions(&store).is_empty());
    }

    #[test]
    fn time_window_names() {
        for window in TimeWindow::ALL {
            assert_eq!(window.to_string().parse::<TimeWindow>(), Ok(window));
        }
    }
}
