pub mod chapter_select;
pub mod screen;
pub mod statistics;

use quizzer::{Question, Screen};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

const CONFIDENCE_LABELS: [&str; 4] = ["unrated", "guess", "unsure", "sure"];

/// Draw whatever the engine's current screen is
pub fn draw(app: &mut App, f: &mut Frame) {
    screen::current_view(app.engine.screen()).render(app, f);
}

/// Letter shown next to option `i`
pub fn option_label(i: usize) -> char {
    (b'a' + i as u8) as char
}

/// Lines a piece of text needs when wrapped to `width` columns
fn wrapped_lines(text: &str, width: u16) -> u16 {
    let width = width.max(1) as f64;
    ((text.width() as f64 / width).ceil() as u16).max(1)
}

fn legend(text: &str) -> Paragraph<'_> {
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
}

fn notice_line(app: &App) -> Option<Paragraph<'_>> {
    app.engine.notice().map(|notice| {
        Paragraph::new(Span::styled(
            notice,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
    })
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.engine.screen() {
            Screen::Welcome => render_welcome(self, area, buf),
            Screen::Question(_) => render_question(self, area, buf),
            Screen::Results => render_results(self, area, buf),
            Screen::ReviewMistakes => render_review(self, area, buf),
            // rendered by their own views
            Screen::ChapterSelection | Screen::Statistics => {}
        }
    }
}

fn render_welcome(app: &App, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);

    let stats = app.engine.statistics();
    let streak = app.engine.streak();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Percentage(35),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(Span::styled(
        "quizzer",
        Style::default().fg(Color::Cyan).patch(bold_style),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let summary = if stats.total_quizzes == 0 {
        Line::from(Span::styled("no quizzes taken yet", dim_bold_style))
    } else {
        let accuracy = stats.overall_accuracy().unwrap_or(0.0);
        Line::from(vec![
            Span::styled(format!("{} quizzes", stats.total_quizzes), bold_style),
            Span::styled(" / ", dim_bold_style),
            Span::styled(format!("{accuracy:.0}% correct"), bold_style),
            Span::styled(" / ", dim_bold_style),
            Span::styled(
                format!("{streak} day streak"),
                if streak > 0 {
                    Style::default().patch(bold_style).fg(Color::Green)
                } else {
                    dim_bold_style
                },
            ),
        ])
    };
    Paragraph::new(summary)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    if let Some(notice) = notice_line(app) {
        notice.render(chunks[3], buf);
    }

    legend("(enter) start / (s)tats / (esc)ape").render(chunks[4], buf);
}

fn render_question(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(session) = app.engine.session() else {
        return;
    };
    let Some(question) = session.current_question() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2);
    let question_lines = wrapped_lines(&question.question, max_chars_per_line);
    let option_lines: u16 = question
        .options
        .iter()
        .map(|o| wrapped_lines(o, max_chars_per_line.saturating_sub(4)))
        .sum();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(question_lines + 1),
                Constraint::Length(option_lines + 1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    // progress on the left, countdown on the right
    let (current, total) = session.progress();
    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[0]);
    Paragraph::new(Span::styled(
        format!("{current}/{total}  {}", session.mode),
        dim_bold_style,
    ))
    .render(header[0], buf);
    if let Some(timer) = session.timer() {
        let secs = timer.remaining.as_secs_f64().ceil() as u64;
        let style = if secs <= 5 {
            red_bold_style
        } else {
            bold_style
        };
        Paragraph::new(Span::styled(format!("{secs}s"), style))
            .alignment(Alignment::Right)
            .render(header[1], buf);
    }

    Paragraph::new(Span::styled(
        question.chapter.as_str(),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(question.question.as_str(), bold_style))
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    let selected = session.current_answer();
    let options: Vec<Line> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let style = if selected == Some(i) {
                green_bold_style
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("({}) ", option_label(i)), dim_bold_style),
                Span::styled(option.as_str(), style),
            ])
        })
        .collect();
    Paragraph::new(options)
        .wrap(Wrap { trim: false })
        .render(chunks[4], buf);

    let rating = session
        .confidence
        .get(session.current_index)
        .copied()
        .unwrap_or(0);
    Paragraph::new(Span::styled(
        format!(
            "confidence: {}",
            CONFIDENCE_LABELS[usize::from(rating).min(CONFIDENCE_LABELS.len() - 1)]
        ),
        dim_bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[6], buf);

    let last = current == total;
    let legend_text = match (selected.is_some(), last) {
        (false, _) => "(a-d) answer / (1-3) confidence / (esc)ape",
        (true, false) => "(a-d) answer / (1-3) confidence / (enter) next / (esc)ape",
        (true, true) => "(a-d) answer / (1-3) confidence / (enter) finish / (esc)ape",
    };
    legend(legend_text).render(chunks[7], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.engine.last_result() else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Percentage(30),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    let total = result.questions.len();
    let accuracy = result.accuracy();
    let score_style = if accuracy >= 70.0 {
        green_bold_style
    } else {
        red_bold_style
    };

    Paragraph::new(Line::from(vec![
        Span::styled(format!("{}/{}", result.correct_count, total), score_style),
        Span::styled(" correct  ", dim_bold_style),
        Span::styled(format!("{accuracy:.0}%"), score_style),
    ]))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let minutes = result.time_spent / 60;
    let seconds = result.time_spent % 60;
    let unanswered = result.user_answers.iter().filter(|a| a.is_none()).count();
    let mut details = vec![Span::styled(
        format!("time {minutes}:{seconds:02}"),
        bold_style,
    )];
    if unanswered > 0 {
        details.push(Span::styled(
            format!("  {unanswered} unanswered"),
            dim_bold_style,
        ));
    }
    Paragraph::new(Line::from(details))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        format!("{} day streak", app.engine.streak()),
        dim_bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    if let Some(notice) = notice_line(app) {
        notice.render(chunks[4], buf);
    }

    let legend_text = if result.mistakes().next().is_some() {
        "(r)etry / (n)ew / (m)istakes / (s)tats / (esc)ape"
    } else {
        "(r)etry / (n)ew / (s)tats / (esc)ape"
    };
    legend(legend_text).render(chunks[5], buf);
}

fn mistake_lines(question: &Question, answer: Option<usize>) -> Vec<Line<'_>> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines = vec![
        Line::from(Span::styled(question.chapter.as_str(), italic_style)),
        Line::from(Span::styled(question.question.as_str(), bold_style)),
        Line::default(),
    ];

    let yours = match answer.and_then(|a| question.options.get(a).map(|o| (a, o))) {
        Some((a, option)) => format!("({}) {option}", option_label(a)),
        None => "no answer".to_string(),
    };
    lines.push(Line::from(vec![
        Span::raw("your answer: "),
        Span::styled(yours, red_bold_style),
    ]));
    if let Some(correct) = question.correct_option() {
        lines.push(Line::from(vec![
            Span::raw("correct:     "),
            Span::styled(
                format!("({}) {correct}", option_label(question.correct_answer)),
                green_bold_style,
            ),
        ]));
    }
    if !question.explanation.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            question.explanation.as_str(),
            italic_style,
        )));
    }
    lines
}

fn render_review(app: &App, area: Rect, buf: &mut Buffer) {
    let mistakes = app.engine.mistakes();
    let dim_bold_style = Style::default()
        .add_modifier(Modifier::BOLD)
        .add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    if mistakes.is_empty() {
        Paragraph::new(Span::styled("no mistakes, nothing to review", dim_bold_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
    } else {
        let index = app.review_offset.min(mistakes.len() - 1);
        Paragraph::new(Span::styled(
            format!("mistake {}/{}", index + 1, mistakes.len()),
            dim_bold_style,
        ))
        .render(chunks[0], buf);

        let (question, answer) = &mistakes[index];
        Paragraph::new(mistake_lines(question, *answer))
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);
    }

    legend("(j/k) next/previous / (b)ack / (q)uit").render(chunks[2], buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_labels_are_letters() {
        assert_eq!(option_label(0), 'a');
        assert_eq!(option_label(3), 'd');
    }

    #[test]
    fn wrapping_counts_at_least_one_line() {
        assert_eq!(wrapped_lines("", 10), 1);
        assert_eq!(wrapped_lines("0123456789", 10), 1);
        assert_eq!(wrapped_lines("0123456789a", 10), 2);
        assert_eq!(wrapped_lines("abc", 0), 3);
    }
}
