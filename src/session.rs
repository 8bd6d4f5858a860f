use crate::question::{Question, QuizResult};
use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a session's question list is built
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuizMode {
    #[default]
    Standard,
    Adaptive,
    Review,
}

impl QuizMode {
    pub const ALL: [QuizMode; 3] = [QuizMode::Standard, QuizMode::Adaptive, QuizMode::Review];

    pub fn next(self) -> Self {
        match self {
            QuizMode::Standard => QuizMode::Adaptive,
            QuizMode::Adaptive => QuizMode::Review,
            QuizMode::Review => QuizMode::Standard,
        }
    }
}

/// Logical screens the engine moves between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    ChapterSelection,
    Question(usize),
    Results,
    ReviewMistakes,
    Statistics,
}

/// Countdown for the question currently on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuestionTimer {
    pub limit: Duration,
    pub remaining: Duration,
}

impl QuestionTimer {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            remaining: limit,
        }
    }

    /// Count down by `elapsed`; true once time is up
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        self.remaining = self.remaining.saturating_sub(elapsed);
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }
}

/// What a tick did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No timer, or time remains
    Running,
    /// The timer ran out and the session should advance
    Expired,
}

/// What advancing did to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Question(usize),
    Finished,
}

/// In-memory state of one run through a question list
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub mode: QuizMode,
    pub chapter_ids: Vec<String>,
    pub questions: Vec<Question>,
    pub current_index: usize,
    pub user_answers: Vec<Option<usize>>,
    /// 0 means not rated, otherwise 1 (guess) to 3 (sure)
    pub confidence: Vec<u8>,
    pub started_at: DateTime<Local>,
    timer_limit: Option<Duration>,
    timer: Option<QuestionTimer>,
    finished: bool,
}

impl QuizSession {
    /// `timer_secs` of 0 disables the per-question countdown
    pub fn new(
        mode: QuizMode,
        chapter_ids: Vec<String>,
        questions: Vec<Question>,
        timer_secs: u64,
        started_at: DateTime<Local>,
    ) -> Self {
        let timer_limit = (timer_secs > 0).then(|| Duration::from_secs(timer_secs));
        let len = questions.len();
        let mut session = Self {
            mode,
            chapter_ids,
            questions,
            current_index: 0,
            user_answers: vec![None; len],
            confidence: vec![0; len],
            started_at,
            timer_limit,
            timer: None,
            finished: false,
        };
        session.begin_question();
        session
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.finished {
            return None;
        }
        self.questions.get(self.current_index)
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.user_answers.get(self.current_index).copied().flatten()
    }

    /// `(current_index + 1, total)`
    pub fn progress(&self) -> (usize, usize) {
        ((self.current_index + 1).min(self.len()), self.len())
    }

    pub fn timer(&self) -> Option<&QuestionTimer> {
        self.timer.as_ref()
    }

    /// Replace any running timer with a fresh one for the current question
    fn begin_question(&mut self) {
        self.timer = self.timer_limit.map(QuestionTimer::new);
    }

    /// Drop the timer so nothing fires after leaving the question screens
    pub fn cancel_timer(&mut self) {
        self.timer = None;
    }

    /// Record an answer for the current question. Out-of-range options are
    /// ignored. Returns whether the answer was recorded.
    pub fn select_answer(&mut self, option: usize) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        if option >= question.options.len() {
            return false;
        }
        self.user_answers[self.current_index] = Some(option);
        true
    }

    pub fn rate_confidence(&mut self, level: u8) -> bool {
        if self.finished || !(1..=3).contains(&level) {
            return false;
        }
        match self.confidence.get_mut(self.current_index) {
            Some(slot) => {
                *slot = level;
                true
            }
            None => false,
        }
    }

    /// Move past the current question
    pub fn advance(&mut self) -> Advance {
        if self.finished {
            return Advance::Finished;
        }
        if self.current_index + 1 >= self.len() {
            self.finished = true;
            self.cancel_timer();
            Advance::Finished
        } else {
            self.current_index += 1;
            self.begin_question();
            Advance::Question(self.current_index)
        }
    }

    pub fn on_tick(&mut self, elapsed: Duration) -> TickOutcome {
        if self.finished {
            return TickOutcome::Running;
        }
        match self.timer.as_mut().map(|timer| timer.tick(elapsed)) {
            Some(true) => TickOutcome::Expired,
            _ => TickOutcome::Running,
        }
    }

    pub fn correct_count(&self) -> usize {
        QuizResult::score(&self.questions, &self.user_answers)
    }

    /// Build the result record for a finished run
    pub fn to_result(&self, finished_at: DateTime<Local>) -> QuizResult {
        let time_spent = (finished_at - self.started_at).num_seconds().max(0) as u64;
        QuizResult {
            questions: self.questions.clone(),
            user_answers: self.user_answers.clone(),
            user_confidence_ratings: self.confidence.clone(),
            timestamp: finished_at.timestamp_millis(),
            time_spent,
            correct_count: self.correct_count(),
        }
    }

    /// Same questions in a new order, answers cleared, clock restarted
    pub fn restart(&mut self, started_at: DateTime<Local>) {
        self.questions.shuffle(&mut rand::thread_rng());
        let len = self.len();
        self.current_index = 0;
        self.user_answers = vec![None; len];
        self.confidence = vec![0; len];
        self.started_at = started_at;
        self.finished = false;
        self.begin_question();
    }
}
