use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::QuizError;
use crate::history::{append_result, recent_results};
use crate::missed::{
    all_missed_questions, clear_missed_questions, filter_missed, save_missed_question,
    MissedQuestion,
};
use crate::question::{Question, QuizResult};
use crate::runtime::{Clock, SystemClock};
use crate::selector::{
    weakness_questions, QuestionCount, QuestionSelector, ReviewSelector, SelectionContext,
    StandardSelector, WeaknessSelector,
};
use crate::session::{Advance, QuizMode, QuizSession, Screen, TickOutcome};
use crate::stats::{load_statistics, update_statistics, Statistics};
use crate::store::{ensure_written, Store};
use crate::streak::{displayed_streak, update_streak};
use chrono::{DateTime, Local};
use log::{debug, error, info};
use std::time::Duration;

const SAVE_FAILED: &str = "Your results could not be saved; this quiz was not recorded";

/// Drives a quiz from chapter selection to results and owns the ledgers
pub struct QuizEngine {
    store: Store,
    catalog: Catalog,
    config: Config,
    clock: Box<dyn Clock>,
    screen: Screen,
    session: Option<QuizSession>,
    last_result: Option<QuizResult>,
    notice: Option<String>,
    // Ledger snapshots for rendering, reloaded after writes and on screen entry
    statistics: Statistics,
    streak: u32,
    missed: Vec<MissedQuestion>,
}

impl QuizEngine {
    pub fn new(store: Store, catalog: Catalog, config: Config) -> Self {
        let mut engine = Self {
            store,
            catalog,
            config,
            clock: Box::new(SystemClock),
            screen: Screen::Welcome,
            session: None,
            last_result: None,
            notice: None,
            statistics: Statistics::default(),
            streak: 0,
            missed: Vec::new(),
        };
        engine.reload();
        engine
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.set_clock(clock);
        self
    }

    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
        self.reload();
    }

    /// Re-read the ledgers the screens display
    pub fn reload(&mut self) {
        self.statistics = load_statistics(&self.store);
        self.streak = displayed_streak(&self.store, self.clock.now().date_naive());
        self.missed = all_missed_questions(&self.store);
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn last_result(&self) -> Option<&QuizResult> {
        self.last_result.as_ref()
    }

    /// Message for the user about a failure they did not cause directly
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn show_screen(&mut self, screen: Screen) {
        if !matches!(screen, Screen::Question(_)) {
            if let Some(session) = self.session.as_mut() {
                session.cancel_timer();
            }
        }
        if matches!(screen, Screen::Welcome | Screen::Statistics) {
            self.reload();
        }
        debug!("screen {:?} -> {:?}", self.screen, screen);
        self.screen = screen;
    }

    pub fn open_chapter_selection(&mut self) {
        self.show_screen(Screen::ChapterSelection);
    }

    pub fn go_home(&mut self) {
        self.show_screen(Screen::Welcome);
    }

    pub fn show_statistics(&mut self) {
        self.show_screen(Screen::Statistics);
    }

    /// Build the question list for a prospective session without starting it
    pub fn build_questions(
        &self,
        chapter_ids: &[String],
        mode: QuizMode,
        count: QuestionCount,
    ) -> Vec<Question> {
        let missed = filter_missed(&self.missed, None, None, self.clock.now());
        let ctx = SelectionContext {
            catalog: &self.catalog,
            statistics: &self.statistics,
            missed: &missed,
            weakness: self.config.weakness(),
        };

        let selector: Box<dyn QuestionSelector> = match mode {
            QuizMode::Standard => Box::new(StandardSelector),
            QuizMode::Adaptive => Box::new(WeaknessSelector),
            QuizMode::Review => Box::new(ReviewSelector),
        };
        selector.select_questions(&ctx, chapter_ids, count)
    }

    /// The `count` weakest questions from the given chapters
    pub fn weakness_questions(&self, count: usize, chapter_ids: &[String]) -> Vec<Question> {
        weakness_questions(
            self.catalog.questions_for(chapter_ids),
            &self.statistics,
            &self.missed,
            self.config.weakness(),
            count,
        )
    }

    /// Start a session; on error the screen does not change
    pub fn start_quiz(
        &mut self,
        chapter_ids: &[String],
        mode: QuizMode,
        count: QuestionCount,
    ) -> Result<usize, QuizError> {
        if chapter_ids.is_empty() {
            return Err(QuizError::NoChapterSelected);
        }
        if let Some(unknown) = chapter_ids.iter().find(|id| self.catalog.chapter(id).is_none()) {
            return Err(QuizError::UnknownChapter(unknown.clone()));
        }

        let questions = self.build_questions(chapter_ids, mode, count);
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        info!(
            "starting {mode} quiz with {} questions from {:?}",
            questions.len(),
            chapter_ids
        );
        let len = questions.len();
        self.session = Some(QuizSession::new(
            mode,
            chapter_ids.to_vec(),
            questions,
            self.config.timer_secs,
            self.clock.now(),
        ));
        self.config.last_chapters = chapter_ids.to_vec();
        self.config.mode = mode;
        self.show_screen(Screen::Question(0));
        Ok(len)
    }

    fn active_session(&mut self) -> Option<&mut QuizSession> {
        match self.screen {
            Screen::Question(_) => self.session.as_mut(),
            _ => None,
        }
    }

    pub fn select_answer(&mut self, option: usize) -> bool {
        self.active_session()
            .is_some_and(|session| session.select_answer(option))
    }

    pub fn rate_confidence(&mut self, level: u8) -> bool {
        self.active_session()
            .is_some_and(|session| session.rate_confidence(level))
    }

    /// Move on from the current question, finishing the quiz after the last
    pub fn next_question(&mut self) -> Result<Screen, QuizError> {
        let session = self.active_session().ok_or(QuizError::NoActiveSession)?;
        match session.advance() {
            Advance::Question(i) => self.show_screen(Screen::Question(i)),
            Advance::Finished => self.complete(),
        }
        Ok(self.screen)
    }

    /// Feed elapsed time to the question timer; returns true when the timer
    /// ran out and the quiz moved on
    pub fn on_tick(&mut self, elapsed: Duration) -> bool {
        let expired = self
            .active_session()
            .is_some_and(|session| session.on_tick(elapsed) == TickOutcome::Expired);
        if expired {
            debug!("question timer expired");
            // cannot fail: active_session was Some above
            let _ = self.next_question();
        }
        expired
    }

    /// Score the session, write every ledger in one transaction, show results
    fn complete(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let now = self.clock.now();
        let result = session.to_result(now);
        let today = now.date_naive();

        // All or nothing: any failed write rolls back the others
        let saved = self.store.transaction(|tx| {
            for (question, answer) in result.mistakes() {
                ensure_written(
                    save_missed_question(tx, question, answer, now),
                    "missed questions",
                )?;
            }
            ensure_written(append_result(tx, &result), "quiz history")?;
            ensure_written(update_streak(tx, today).is_some(), "streak")?;
            ensure_written(update_statistics(tx, &result), "statistics")
        });

        if let Err(e) = saved {
            error!("failed to commit quiz results: {e}");
            self.notice = Some(SAVE_FAILED.to_string());
        }
        self.reload();

        info!(
            "quiz finished: {}/{} correct in {}s",
            result.correct_count,
            result.questions.len(),
            result.time_spent
        );
        self.last_result = Some(result);
        self.show_screen(Screen::Results);
    }

    /// Run the same questions again in a new order
    pub fn restart(&mut self) -> Result<(), QuizError> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(QuizError::NoActiveSession)?;
        session.restart(now);
        self.show_screen(Screen::Question(0));
        Ok(())
    }

    /// Leave the current quiz and pick chapters again
    pub fn new_quiz(&mut self) {
        self.show_screen(Screen::ChapterSelection);
    }

    /// Drop an unfinished session without recording anything
    pub fn abandon(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cancel_timer();
            debug!("abandoned quiz at question {}", session.current_index + 1);
        }
        self.show_screen(Screen::ChapterSelection);
    }

    pub fn review_mistakes(&mut self) -> Result<(), QuizError> {
        if self.last_result.is_none() {
            return Err(QuizError::NoActiveSession);
        }
        self.show_screen(Screen::ReviewMistakes);
        Ok(())
    }

    pub fn back_to_results(&mut self) {
        if self.last_result.is_some() {
            self.show_screen(Screen::Results);
        }
    }

    /// Wrong or unanswered questions of the last finished quiz
    pub fn mistakes(&self) -> Vec<(Question, Option<usize>)> {
        self.last_result
            .as_ref()
            .map(|r| r.mistakes().map(|(q, a)| (q.clone(), a)).collect())
            .unwrap_or_default()
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Displayed streak: 0 once a day has been skipped
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn missed_questions(
        &self,
        chapter: Option<&str>,
        time_filter: Option<&str>,
    ) -> Vec<MissedQuestion> {
        filter_missed(&self.missed, chapter, time_filter, self.clock.now())
    }

    pub fn recent_results(&self, n: usize) -> Vec<QuizResult> {
        recent_results(&self.store, n)
    }

    pub fn clear_missed_questions(&mut self) -> bool {
        let cleared = clear_missed_questions(&self.store);
        self.reload();
        cleared
    }
}
