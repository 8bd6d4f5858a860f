use quizzer::Screen;
use ratatui::Frame;

use crate::{
    ui::{chapter_select::render_chapter_selection, statistics::render_statistics},
    App,
};

/// A UI boundary: one per engine screen
pub trait View {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Screens drawn by the App widget itself
pub struct WidgetView;

impl View for WidgetView {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ChapterSelectionView;

impl View for ChapterSelectionView {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_chapter_selection(app, f);
    }
}

pub struct StatisticsView;

impl View for StatisticsView {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_statistics(app, f);
    }
}

/// Helper to construct the appropriate view for the current screen
pub fn current_view(screen: Screen) -> Box<dyn View> {
    match screen {
        Screen::ChapterSelection => Box::new(ChapterSelectionView),
        Screen::Statistics => Box::new(StatisticsView),
        Screen::Welcome | Screen::Question(_) | Screen::Results | Screen::ReviewMistakes => {
            Box::new(WidgetView)
        }
    }
}
