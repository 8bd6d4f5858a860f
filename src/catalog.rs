use crate::question::Question;
use crate::store::{keys, KeyValue};
use include_dir::{include_dir, Dir};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

static CHAPTER_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/resources/chapters");

/// A named group of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
}

fn enabled_by_default() -> bool {
    true
}

/// A quiz authored by the user, stored in the `saved_quizzes` and
/// `temp_quizzes` ledgers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    chapters: Vec<Chapter>,
}

/// Ordered chapter registry and question provider
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    chapters: Vec<Chapter>,
}

impl Catalog {
    pub fn new(chapters: Vec<Chapter>) -> Self {
        let mut catalog = Catalog::default();
        for chapter in chapters {
            catalog.push(chapter);
        }
        catalog
    }

    /// Chapters shipped with the binary
    pub fn builtin() -> Self {
        let mut files: Vec<_> = CHAPTER_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        let chapters = files
            .into_iter()
            .filter_map(|f| {
                let parsed = f
                    .contents_utf8()
                    .map(serde_json::from_str::<Chapter>)
                    .transpose();
                match parsed {
                    Ok(chapter) => chapter,
                    Err(e) => {
                        warn!("skipping builtin chapter {}: {e}", f.path().display());
                        None
                    }
                }
            })
            .collect();
        Self::new(chapters)
    }

    /// Load a catalog file of the form `{"chapters": [...]}`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let bytes = std::fs::read(path.as_ref())?;
        let file: CatalogFile = serde_json::from_slice(&bytes)?;
        info!(
            "loaded {} chapters from {}",
            file.chapters.len(),
            path.as_ref().display()
        );
        Ok(Self::new(file.chapters))
    }

    /// Add a chapter, stamping its title and ID onto every question.
    /// A chapter whose ID is already registered replaces the earlier one.
    pub fn push(&mut self, mut chapter: Chapter) {
        for q in &mut chapter.questions {
            q.chapter = chapter.title.clone();
            q.chapter_id = Some(chapter.id.clone());
        }
        if let Some(existing) = self.chapters.iter_mut().find(|c| c.id == chapter.id) {
            debug!("replacing chapter {}", chapter.id);
            *existing = chapter;
        } else {
            self.chapters.push(chapter);
        }
    }

    /// Append saved and temp quizzes from the store as extra chapters
    pub fn merge_user_quizzes<K: KeyValue>(&mut self, store: &K) {
        for quiz in load_saved_quizzes(store) {
            self.push(quiz.into_chapter("saved"));
        }
        for quiz in load_temp_quizzes(store) {
            self.push(quiz.into_chapter("temp"));
        }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn enabled_chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.chapters.iter().filter(|c| c.enabled)
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn title_for(&self, id: &str) -> Option<&str> {
        self.chapter(id).map(|c| c.title.as_str())
    }

    /// First chapter with this title. Titles are not guaranteed unique.
    pub fn id_for_title(&self, title: &str) -> Option<&str> {
        self.chapters
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.id.as_str())
    }

    /// Union of the questions of the given chapters, in chapter order.
    /// Unknown IDs contribute nothing.
    pub fn questions_for(&self, ids: &[String]) -> Vec<Question> {
        ids.iter()
            .filter_map(|id| self.chapter(id))
            .flat_map(|c| c.questions.iter().cloned())
            .collect()
    }
}

impl SavedQuiz {
    fn into_chapter(self, prefix: &str) -> Chapter {
        Chapter {
            id: format!("{prefix}-{}", self.id),
            title: self.title,
            enabled: true,
            questions: self.questions,
        }
    }
}

pub fn load_saved_quizzes<K: KeyValue>(store: &K) -> Vec<SavedQuiz> {
    store.get(keys::SAVED_QUIZZES, Vec::new())
}

/// Add or replace (by ID) a saved quiz
pub fn save_quiz<K: KeyValue>(store: &K, quiz: SavedQuiz) -> bool {
    let mut quizzes = load_saved_quizzes(store);
    match quizzes.iter_mut().find(|q| q.id == quiz.id) {
        Some(existing) => *existing = quiz,
        None => quizzes.push(quiz),
    }
    store.save(keys::SAVED_QUIZZES, &quizzes)
}

/// Temp quizzes, migrating the legacy single-object slot on first read.
///
/// The legacy `temp_quiz` slot is converted into a one-element
/// `temp_quizzes` collection, written back, and removed, so later reads only
/// ever see the new shape.
pub fn load_temp_quizzes<K: KeyValue>(store: &K) -> Vec<SavedQuiz> {
    let quizzes: Vec<SavedQuiz> = store.get(keys::TEMP_QUIZZES, Vec::new());
    if !quizzes.is_empty() || !store.contains(keys::LEGACY_TEMP_QUIZ) {
        return quizzes;
    }

    match store.get::<Option<SavedQuiz>>(keys::LEGACY_TEMP_QUIZ, None) {
        Some(legacy) => {
            let migrated = vec![legacy];
            if store.save(keys::TEMP_QUIZZES, &migrated) {
                store.remove(keys::LEGACY_TEMP_QUIZ);
                info!("migrated legacy temp quiz into {}", keys::TEMP_QUIZZES);
            }
            migrated
        }
        None => Vec::new(),
    }
}

pub fn save_temp_quizzes<K: KeyValue>(store: &K, quizzes: &[SavedQuiz]) -> bool {
    store.save(keys::TEMP_QUIZZES, quizzes)
}
