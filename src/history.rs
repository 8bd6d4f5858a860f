use crate::question::QuizResult;
use crate::store::{keys, KeyValue};
use chrono::{Local, TimeZone};
use std::io::Write;

pub fn quiz_history<K: KeyValue>(store: &K) -> Vec<QuizResult> {
    store.get(keys::QUIZ_HISTORY, Vec::new())
}

pub fn append_result<K: KeyValue>(store: &K, result: &QuizResult) -> bool {
    let mut history = quiz_history(store);
    history.push(result.clone());
    store.save(keys::QUIZ_HISTORY, &history)
}

/// Up to `n` results, newest first
pub fn recent_results<K: KeyValue>(store: &K, n: usize) -> Vec<QuizResult> {
    let mut history = quiz_history(store);
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history.truncate(n);
    history
}

pub fn clear_history<K: KeyValue>(store: &K) -> bool {
    store.remove(keys::QUIZ_HISTORY)
}

/// Write the history as CSV, one row per quiz in stored order
pub fn export_csv<W: Write>(history: &[QuizResult], out: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["date", "questions", "correct", "accuracy", "time_spent_secs"])?;

    for result in history {
        let date = Local
            .timestamp_millis_opt(result.timestamp)
            .single()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        writer.write_record([
            date,
            result.questions.len().to_string(),
            result.correct_count.to_string(),
            format!("{:.1}", result.accuracy()),
            result.time_spent.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
