use quizzer::QuizMode;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::App;

/// One line of the chapter list
pub struct ChapterRowData<'a> {
    pub title: &'a str,
    pub questions: usize,
    pub checked: bool,
    pub highlighted: bool,
    pub accuracy: Option<f64>,
}

/// Pure presenter for a chapter list entry
pub fn present_chapter(data: &ChapterRowData) -> ListItem<'static> {
    let style = if data.highlighted {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default()
    };

    let accuracy = match data.accuracy {
        Some(a) if a >= 80.0 => Span::styled(format!("{a:>4.0}%"), style.fg(Color::Green)),
        Some(a) if a >= 50.0 => Span::styled(format!("{a:>4.0}%"), style.fg(Color::Yellow)),
        Some(a) => Span::styled(format!("{a:>4.0}%"), style.fg(Color::Red)),
        None => Span::styled("    -", style.fg(Color::Gray)),
    };

    ListItem::new(Line::from(vec![
        Span::styled(if data.checked { "[x] " } else { "[ ] " }, style),
        Span::styled(
            data.title.to_string(),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {} questions ", data.questions), style.fg(Color::Gray)),
        accuracy,
    ]))
    .style(style)
}

fn mode_hint(mode: QuizMode) -> &'static str {
    match mode {
        QuizMode::Standard => "random questions from the selected chapters",
        QuizMode::Adaptive => "weakest chapters and previously missed questions first",
        QuizMode::Review => "only questions you have missed before",
    }
}

/// Render the chapter selection screen
pub fn render_chapter_selection(app: &mut App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Chapters
            Constraint::Length(3), // Session settings
            Constraint::Length(1), // Errors
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let title = Paragraph::new("Choose chapters")
        .block(Block::default().borders(Borders::ALL).title("New quiz"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let stats = app.engine.statistics();
    let list_height = chunks[1].height.saturating_sub(2) as usize;
    let chapters: Vec<_> = app.engine.catalog().enabled_chapters().collect();

    // Keep the cursor row visible
    let first = app.selection.cursor.saturating_sub(list_height.saturating_sub(1));
    let items: Vec<ListItem> = chapters
        .iter()
        .enumerate()
        .skip(first)
        .take(list_height)
        .map(|(i, chapter)| {
            present_chapter(&ChapterRowData {
                title: &chapter.title,
                questions: chapter.questions.len(),
                checked: app.selection.checked.contains(&chapter.id),
                highlighted: i == app.selection.cursor,
                accuracy: stats.chapter_accuracy(&chapter.title),
            })
        })
        .collect();

    let selected = chapters
        .iter()
        .filter(|c| app.selection.checked.contains(&c.id))
        .count();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Chapters ({selected}/{})", chapters.len()))
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(list, chunks[1]);

    let config = app.engine.config();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let timer = if config.timer_secs == 0 {
        "off".to_string()
    } else {
        format!("{}s", config.timer_secs)
    };
    let settings = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("mode "),
            Span::styled(config.mode.to_string(), bold.fg(Color::Magenta)),
            Span::raw("   questions "),
            Span::styled(config.question_count.to_string(), bold),
            Span::raw("   timer "),
            Span::styled(timer, bold),
        ]),
        Line::from(Span::styled(
            mode_hint(config.mode),
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(settings, chunks[2]);

    if let Some(error) = &app.selection.error {
        let error = Paragraph::new(Span::styled(
            error.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        f.render_widget(error, chunks[3]);
    }

    let instructions = Paragraph::new(
        "(↑/↓) move  (space) toggle  (a)ll  (m)ode  (+/-) questions  (t)imer  (enter) start  (s)tats  (esc) back",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(instructions, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_hints_differ() {
        assert_ne!(mode_hint(QuizMode::Standard), mode_hint(QuizMode::Review));
    }

    #[test]
    fn present_chapter_builds_item() {
        let item = present_chapter(&ChapterRowData {
            title: "Traits",
            questions: 6,
            checked: true,
            highlighted: false,
            accuracy: Some(42.0),
        });
        assert_eq!(item.height(), 1);
    }
}
