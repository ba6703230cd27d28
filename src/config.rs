// ⚙️ Configuration - sheet/column names, matcher vocabularies, report titles
//
// Every field has a default, so an empty TOML file (or no file at all)
// reproduces the stock roster/posts workbook layout.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// TOP-LEVEL CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workbook: WorkbookConfig,
    pub matcher: MatcherConfig,
    pub report: ReportConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| IngestError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `path` when given, otherwise use built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

// ============================================================================
// WORKBOOK LAYOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    pub roster_sheet: String,
    pub posts_sheet: String,

    // Roster columns
    pub full_name_column: String,
    pub aka_column: String,
    pub id_column: String,
    pub owner_events_column: String,
    pub owner_media_column: String,

    // Posts columns
    pub annotation_column: String,
    pub post_link_column: String,
    pub group_link_column: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        WorkbookConfig {
            roster_sheet: "для ВПР".to_string(),
            posts_sheet: "vk".to_string(),
            full_name_column: "Полное имя".to_string(),
            aka_column: "Also known as (AKA)".to_string(),
            id_column: "#".to_string(),
            owner_events_column: "Ответственный ДК".to_string(),
            owner_media_column: "Ответственный Media".to_string(),
            annotation_column: "GPT".to_string(),
            post_link_column: "Пост".to_string(),
            group_link_column: "Группа".to_string(),
        }
    }
}

// ============================================================================
// MATCHER VOCABULARIES
// ============================================================================

/// Immutable word lists injected into the matcher and the alias index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Corporate-form tokens stripped before the second alias lookup
    pub legal_forms: Vec<String>,

    /// Organizational boilerplate never accepted as a free company name
    pub stop_words: Vec<String>,

    /// Tokens that are never a company (free or alias)
    pub noise_tokens: Vec<String>,

    /// Alias strings always pruned from the index
    pub invalid_aliases: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            legal_forms: owned(&[
                "ооо", "ао", "пао", "зао", "ao", "pjsc", "llc", "inc", "co", "corp", "gmbh",
            ]),
            stop_words: owned(&[
                "стажировка", "вакансия", "практика", "кафедра", "факультет", "центр",
                "департамент", "управление", "гк", "ооо", "зао", "пао", "ао", "ao", "pjsc",
                "llc", "inc", "corp", "co", "gmbh", "компания", "университет", "институт",
                "колледж", "академия", "лаборатория", "школа", "обучение", "работа", "карьера",
                "команда", "проект", "приглашает", "ищет", "набор",
            ]),
            noise_tokens: owned(&["vk", "вк", "vk.com"]),
            invalid_aliases: owned(&[",", ".", "-", "–", "—", "/", "|", "vk", "вк"]),
        }
    }
}

// ============================================================================
// REPORT TITLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Worksheet name of the xlsx report
    pub sheet_name: String,
    pub id_title: String,
    pub company_title: String,
    pub count_title: String,
    pub links_title: String,
    pub owner_events_title: String,
    pub owner_media_title: String,
    pub known_title: String,
    pub yes_label: String,
    pub no_label: String,
}

impl ReportConfig {
    /// Header row in the fixed column order
    pub fn headers(&self) -> [&str; 7] {
        [
            self.id_title.as_str(),
            self.company_title.as_str(),
            self.count_title.as_str(),
            self.links_title.as_str(),
            self.owner_events_title.as_str(),
            self.owner_media_title.as_str(),
            self.known_title.as_str(),
        ]
    }

    pub fn known_label(&self, known: bool) -> &str {
        if known {
            self.yes_label.as_str()
        } else {
            self.no_label.as_str()
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            sheet_name: "Обработанные данные".to_string(),
            id_title: "#".to_string(),
            company_title: "Компания".to_string(),
            count_title: "Количество упоминаний".to_string(),
            links_title: "Ссылки на посты".to_string(),
            owner_events_title: "Ответственный Ивенты".to_string(),
            owner_media_title: "Ответственный Медиа".to_string(),
            known_title: "Есть в СРМ".to_string(),
            yes_label: "Да".to_string(),
            no_label: "Нет".to_string(),
        }
    }
}

// ============================================================================
// UPLOAD SERVER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub data_dir: String,
}

impl ServerConfig {
    /// Case-insensitive extension check on an uploaded file name
    pub fn accepts_filename(&self, filename: &str) -> bool {
        let extension = match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => return false,
        };
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&extension))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            allowed_extensions: owned(&["xlsx", "xlsm", "xls", "ods"]),
            data_dir: "data".to_string(),
        }
    }
}
