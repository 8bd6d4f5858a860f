use std::sync::mpsc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quizzer::{
    runtime::{FixedClock, FixedTicker, QuizEvent, Runner, TestEventSource},
    Catalog, Chapter, Question, QuestionCount, QuizEngine, QuizMode, Screen, Store,
};

fn enumerations() -> Chapter {
    Chapter {
        id: "enumerations".into(),
        title: "Enumerations".into(),
        enabled: true,
        questions: (0..10)
            .map(|i| Question {
                question: format!("enum question {i}"),
                options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
                correct_answer: i % 4,
                explanation: format!("because {i}"),
                chapter: String::new(),
                chapter_id: None,
            })
            .collect(),
    }
}

fn key(c: char) -> QuizEvent {
    QuizEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + engine without a TTY.
// 'c' answers the current question correctly, 'w' answers it wrongly and
// the final question is left to time out.
#[test]
fn headless_quiz_flow_records_every_ledger() {
    let at = Local.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
    let mut engine = QuizEngine::new(
        Store::open_in_memory().unwrap(),
        Catalog::new(vec![enumerations()]),
        Default::default(),
    )
    .with_clock(FixedClock(at));
    engine.config_mut().timer_secs = 2;

    let started = engine
        .start_quiz(
            &["enumerations".to_string()],
            QuizMode::Standard,
            QuestionCount::Limit(10),
        )
        .unwrap();
    assert_eq!(started, 10);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // 7 right, 2 wrong, 1 timeout
    for c in "cccccccww".chars() {
        tx.send(key(c)).unwrap();
        tx.send(QuizEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)))
            .unwrap();
    }

    for _ in 0..1000u32 {
        match runner.step() {
            // pretend a quarter second passed per tick
            QuizEvent::Tick => {
                engine.on_tick(Duration::from_millis(250));
            }
            QuizEvent::Resize => {}
            QuizEvent::Key(key) => match key.code {
                KeyCode::Char(c) => {
                    let question = engine.session().unwrap().current_question().unwrap();
                    let correct = question.correct_answer;
                    let answer = if c == 'c' { correct } else { (correct + 1) % 4 };
                    assert!(engine.select_answer(answer));
                }
                KeyCode::Enter => {
                    engine.next_question().unwrap();
                }
                _ => {}
            },
        }
        if engine.screen() == Screen::Results {
            break;
        }
    }

    assert_eq!(engine.screen(), Screen::Results);
    let result = engine.last_result().unwrap();
    assert_eq!(result.correct_count, 7);
    assert_eq!(result.user_answers.iter().filter(|a| a.is_none()).count(), 1);
    assert!((result.accuracy() - 70.0).abs() < f64::EPSILON);

    let stats = engine.statistics();
    assert_eq!(stats.total_quizzes, 1);
    assert_eq!(stats.total_questions, 10);
    assert_eq!(stats.correct_answers, 7);
    let perf = stats.chapter_performance["Enumerations"];
    assert_eq!((perf.total, perf.correct), (10, 7));

    let missed = engine.missed_questions(None, None);
    assert_eq!(missed.len(), 3);
    assert_eq!(missed.iter().filter(|m| m.user_answer.is_none()).count(), 1);
    assert!(missed
        .iter()
        .all(|m| m.question.chapter_id.as_deref() == Some("enumerations")));

    assert_eq!(engine.streak(), 1);
    assert_eq!(engine.recent_results(10).len(), 1);
    assert_eq!(engine.mistakes().len(), 3);
}

#[test]
fn unanswered_questions_never_block_the_timer() {
    let at = Local.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
    let mut engine = QuizEngine::new(
        Store::open_in_memory().unwrap(),
        Catalog::new(vec![enumerations()]),
        Default::default(),
    )
    .with_clock(FixedClock(at));
    engine.config_mut().timer_secs = 1;
    engine
        .start_quiz(
            &["enumerations".to_string()],
            QuizMode::Standard,
            QuestionCount::Limit(3),
        )
        .unwrap();

    let (_tx, rx) = mpsc::channel::<QuizEvent>();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut steps = 0;
    while engine.screen() != Screen::Results && steps < 100 {
        if let QuizEvent::Tick = runner.step() {
            engine.on_tick(Duration::from_millis(500));
        }
        steps += 1;
    }

    // two ticks per question
    assert_eq!(steps, 6);
    let result = engine.last_result().unwrap();
    assert_eq!(result.correct_count, 0);
    assert_eq!(result.user_answers, vec![None, None, None]);
}
