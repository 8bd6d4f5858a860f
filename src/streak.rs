use crate::store::{keys, KeyValue};
use crate::util::{format_day, parse_day};
use chrono::NaiveDate;
use log::debug;

/// Streak after a quiz completed on `today`, given the previous streak and
/// the day of the previous quiz.
pub fn next_streak(previous: u32, last_quiz_day: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_quiz_day {
        None => 1,
        Some(last) if last == today => previous,
        Some(last) if today.pred_opt() == Some(last) => previous + 1,
        Some(_) => 1,
    }
}

pub fn current_streak<K: KeyValue>(store: &K) -> u32 {
    store.get(keys::STREAK, 0)
}

pub fn last_quiz_day<K: KeyValue>(store: &K) -> Option<NaiveDate> {
    store
        .get::<Option<String>>(keys::LAST_QUIZ_DATE, None)
        .as_deref()
        .and_then(parse_day)
}

/// Record quiz activity on `today` and return the new streak, or `None`
/// when either slot could not be written
pub fn update_streak<K: KeyValue>(store: &K, today: NaiveDate) -> Option<u32> {
    let previous = current_streak(store);
    let last_raw: Option<String> = store.get(keys::LAST_QUIZ_DATE, None);
    // A date we cannot read counts as a gap rather than "never"
    let last = last_raw.as_deref().map(|raw| parse_day(raw).unwrap_or(NaiveDate::MIN));

    let streak = next_streak(previous, last, today);
    debug!("streak {previous} -> {streak} (last quiz {last_raw:?})");

    let saved = store.save(keys::STREAK, &streak)
        & store.save(keys::LAST_QUIZ_DATE, &format_day(today));
    saved.then_some(streak)
}

/// Streak as it should be displayed on `today`: a streak whose last quiz is
/// older than yesterday has already lapsed.
pub fn displayed_streak<K: KeyValue>(store: &K, today: NaiveDate) -> u32 {
    match last_quiz_day(store) {
        Some(last) if last == today || today.pred_opt() == Some(last) => current_streak(store),
        _ => 0,
    }
}
