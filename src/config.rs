use crate::selector::{QuestionCount, WeaknessConfig};
use crate::session::QuizMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub question_count: QuestionCount,
    /// Per-question countdown; 0 disables the timer
    pub timer_secs: u64,
    pub mode: QuizMode,
    pub missed_penalty: f64,
    pub default_accuracy: f64,
    /// Chapters ticked when the selection screen opens
    pub last_chapters: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let weakness = WeaknessConfig::default();
        Self {
            question_count: QuestionCount::Limit(10),
            timer_secs: 0,
            mode: QuizMode::Standard,
            missed_penalty: weakness.missed_penalty,
            default_accuracy: weakness.default_accuracy,
            last_chapters: Vec::new(),
        }
    }
}

impl Config {
    pub fn weakness(&self) -> WeaknessConfig {
        WeaknessConfig {
            missed_penalty: self.missed_penalty,
            default_accuracy: self.default_accuracy,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "quizzer") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quizzer_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring unreadable config {}: {e}", self.path.display()),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
