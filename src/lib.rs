// Quiz engine, persistence and question selection. The TUI lives in main.rs.
pub mod app_dirs;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod missed;
pub mod question;
pub mod runtime;
pub mod selector;
pub mod session;
pub mod stats;
pub mod store;
pub mod streak;
pub mod util;

pub use catalog::{Catalog, Chapter, SavedQuiz};
pub use engine::QuizEngine;
pub use error::{QuizError, StoreError};
pub use question::{Question, QuizResult};
pub use selector::QuestionCount;
pub use session::{QuizMode, Screen};
pub use store::{KeyValue, Store};
