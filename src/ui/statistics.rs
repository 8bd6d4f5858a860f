use quizzer::{missed::TimeWindow, stats::ChapterSummary, QuizResult};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::App;

const RECENT_QUIZZES: usize = 5;

fn accuracy_color(accuracy: f64) -> Color {
    if accuracy >= 80.0 {
        Color::Green
    } else if accuracy >= 50.0 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Pure presenter for a single chapter performance row
pub fn present_row(data: &ChapterSummary, missed: usize) -> Row<'static> {
    let missed_style = if missed == 0 {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(data.chapter.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format!("{:.1}", data.accuracy))
            .style(Style::default().fg(accuracy_color(data.accuracy))),
        Cell::from(format!("{}/{}", data.correct, data.total)),
        Cell::from(missed.to_string()).style(missed_style),
    ])
}

/// "3 hours ago" style age of a quiz
pub fn quiz_age(timestamp_ms: i64, now_ms: i64) -> String {
    let secs = (now_ms - timestamp_ms).max(0) as u64 / 1000;
    if secs < 60 {
        return "just now".to_string();
    }
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Rough, Tense::Past)
}

/// Pure presenter for a recent quiz row
pub fn present_quiz(result: &QuizResult, now_ms: i64) -> Row<'static> {
    let accuracy = result.accuracy();
    Row::new(vec![
        Cell::from(quiz_age(result.timestamp, now_ms)),
        Cell::from(format!("{}/{}", result.correct_count, result.questions.len())),
        Cell::from(format!("{accuracy:.0}%"))
            .style(Style::default().fg(accuracy_color(accuracy))),
        Cell::from(format!("{}s", result.time_spent)),
    ])
}

/// Render the statistics screen
pub fn render_statistics(app: &mut App, f: &mut Frame) {
    let area = f.area();
    let stats = app.engine.statistics();
    let streak = app.engine.streak();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),                           // Title
            Constraint::Min(5),                              // Chapter table
            Constraint::Length(3),                           // Missed questions
            Constraint::Length(RECENT_QUIZZES as u16 + 3),   // Recent quizzes
            Constraint::Length(2),                           // Instructions
        ])
        .split(area);

    let title_text = match stats.overall_accuracy() {
        Some(accuracy) => format!(
            "{} quizzes  {}/{} correct ({accuracy:.1}%)  {streak} day streak",
            stats.total_quizzes, stats.correct_answers, stats.total_questions
        ),
        None => "No quizzes taken yet".to_string(),
    };
    let title = Paragraph::new(title_text)
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    // Missed column honours the selected window
    let window = app.stats_view.window;
    let filter = window.map(|w| w.to_string());
    let missed = app.engine.missed_questions(None, filter.as_deref());

    let summary = stats.chapter_summary();
    if summary.is_empty() {
        let no_data = Paragraph::new("No chapter statistics yet. Finish a quiz to collect data.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Gray));
        f.render_widget(no_data, chunks[1]);
    } else {
        let table_height = chunks[1].height.saturating_sub(3) as usize; // borders + header
        let max_scroll = summary.len().saturating_sub(table_height);
        if app.stats_view.scroll_offset > max_scroll {
            app.stats_view.scroll_offset = max_scroll;
        }

        let header = Row::new(vec![
            Cell::from("Chapter"),
            Cell::from("Accuracy (%) ↑"),
            Cell::from("Correct"),
            Cell::from("Missed"),
        ])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = summary
            .iter()
            .skip(app.stats_view.scroll_offset)
            .take(table_height)
            .map(|row| {
                let missed_here = missed.iter().filter(|m| m.question.chapter == row.chapter).count();
                present_row(row, missed_here)
            })
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(8),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Chapters, weakest first"),
            )
            .column_spacing(2);
        f.render_widget(table, chunks[1]);
    }

    let window_counts: Vec<Span> = TimeWindow::ALL
        .iter()
        .flat_map(|w| {
            let n = app.engine.missed_questions(None, Some(w.to_string().as_str())).len();
            let style = if window == Some(*w) {
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            } else {
                Style::default()
            };
            [Span::styled(format!("{w}: {n}"), style), Span::raw("   ")]
        })
        .collect();
    let all_style = if window.is_none() {
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default()
    };
    let mut spans = window_counts;
    spans.push(Span::styled(
        format!("all: {}", app.engine.missed_questions(None, None).len()),
        all_style,
    ));
    let missed_panel = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Missed questions"))
        .alignment(Alignment::Center);
    f.render_widget(missed_panel, chunks[2]);

    let now_ms = app.engine.now().timestamp_millis();
    let recent = app.engine.recent_results(RECENT_QUIZZES);
    let recent_rows: Vec<Row> = recent.iter().map(|r| present_quiz(r, now_ms)).collect();
    let recent_table = Table::new(
        recent_rows,
        [
            Constraint::Min(16),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["When", "Score", "Accuracy", "Time"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(Block::default().borders(Borders::ALL).title("Recent quizzes"))
    .column_spacing(2);
    f.render_widget(recent_table, chunks[3]);

    let instructions = Paragraph::new(
        "(↑/↓) scroll  (w)indow  (C)lear missed  (b/backspace) back  (q)uit",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[4]);
}
