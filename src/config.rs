use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::filter::Stopwords;
use crate::posting::SearchQuery;

pub const HOURS_OLD: u32 = 7 * 24;
pub const RESULTS_WANTED: usize = 100;
/// Worldwide searches ask for this many times more results.
const WORLDWIDE_FACTOR: usize = 10;

pub const QUERIES: &[&str] = &[
    "devops",
    "devops engineer",
    "infrastructure engineer",
    "platform engineer",
    "cto OR chief technology officer",
    "head of engineering",
];

pub const SOURCES: &[&str] = &["linkedin", "indeed"];

/// (country, language filter)
pub const COUNTRIES: &[(&str, bool)] = &[
    ("Ukraine", false),
    ("Latvia", true),
    ("Lithuania", true),
    ("Cyprus", true),
];

pub const COMPANY_STOPWORDS: &[&str] = &[
    "Київстар",
    "AllStars-IT",
    "Capgemini",
    "Enavate",
    "Binotel",
    "Creatio",
    "Dripify.io",
    "GoReel",
    "Grid Dynamics",
    "Pragmatike",
    "Sii Poland",
    "Skylum",
    "SupportYourApp",
    "Intellias",
    "EPAM Systems",
    "DraftKings",
    "Deel",
    "Automat-it",
    "Wix.com, Inc.",
    "n8n",
    "eduki",
    "PayAdmit",
    "Competera",
];

pub const TITLE_STOPWORDS: &[&str] = &[
    "Intern", "Junior", "Middle", "Python", "Java", "Full Stack", "Full-Stack", ".Net", "C++",
    "Angular", "React", "node.js", "WordPress", "Product Manager", "Data", "Backend", "QA",
    "Manager", "Frontend", "Administrator", "Front-end", "Software", "Security", "Testing",
    "Azure", "part-time", "Designer", "Product", "Test", "Quality", "Developer", "Development",
    "Analyst", "Owner", "Artist",
];

pub const DESCRIPTION_STOPWORDS: &[&str] = &["Pre-Intermediate", "Fluent", "iGaming"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set to a non-empty path")]
    MissingDir(&'static str),
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("failed to read stopwords file {path:?}: {source}")]
    StopwordsRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stopwords file {path:?} has an empty {field} stopword, which would match everything")]
    EmptyStopword { path: PathBuf, field: &'static str },
    #[error("invalid stopwords file {path:?}: {source}")]
    StopwordsParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Which searches to run. Enumeration order is phrase, then source, then
/// country, with worldwide searches (if enabled) last per (phrase, source).
#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub queries: Vec<String>,
    pub sources: Vec<String>,
    pub countries: Vec<(String, bool)>,
    pub worldwide: bool,
    pub results_wanted: usize,
}

impl Default for SearchPlan {
    fn default() -> Self {
        SearchPlan {
            queries: QUERIES.iter().map(|s| s.to_string()).collect(),
            sources: SOURCES.iter().map(|s| s.to_string()).collect(),
            countries: COUNTRIES
                .iter()
                .map(|(c, filter)| (c.to_string(), *filter))
                .collect(),
            worldwide: false,
            results_wanted: RESULTS_WANTED,
        }
    }
}

impl SearchPlan {
    pub fn expand(&self) -> Vec<SearchQuery> {
        let mut out = Vec::new();
        for term in &self.queries {
            for source in &self.sources {
                for (country, filter_language) in &self.countries {
                    out.push(SearchQuery {
                        index: out.len(),
                        term: term.clone(),
                        source: source.clone(),
                        location: Some(country.clone()),
                        filter_language: *filter_language,
                        results_wanted: self.results_wanted,
                    });
                }
                if self.worldwide {
                    out.push(SearchQuery {
                        index: out.len(),
                        term: term.clone(),
                        source: source.clone(),
                        location: None,
                        filter_language: true,
                        results_wanted: self.results_wanted * WORLDWIDE_FACTOR,
                    });
                }
            }
        }
        out
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StopwordsFile {
    #[serde(default)]
    company: Vec<String>,
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    description: Vec<String>,
}

pub fn default_stopwords() -> Stopwords {
    Stopwords::new(COMPANY_STOPWORDS, TITLE_STOPWORDS, DESCRIPTION_STOPWORDS)
}

/// Load stopword lists from a JSON file with `company`, `title` and
/// `description` arrays. Missing keys mean an empty list; blank entries
/// are rejected.
pub fn load_stopwords(path: &Path) -> Result<Stopwords, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::StopwordsRead {
        path: path.to_path_buf(),
        source,
    })?;
    let file: StopwordsFile =
        serde_json::from_str(&raw).map_err(|source| ConfigError::StopwordsParse {
            path: path.to_path_buf(),
            source,
        })?;
    for (field, words) in [
        ("company", &file.company),
        ("title", &file.title),
        ("description", &file.description),
    ] {
        if words.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::EmptyStopword {
                path: path.to_path_buf(),
                field,
            });
        }
    }
    Ok(Stopwords::new(
        file.company.as_slice(),
        file.title.as_slice(),
        file.description.as_slice(),
    ))
}

/// Everything a run needs, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub vacancy_dir: PathBuf,
    pub skip_dir: PathBuf,
    pub current_dir: Option<PathBuf>,
    pub plan: SearchPlan,
    pub stopwords: Stopwords,
    pub concurrency: usize,
}

impl Config {
    pub fn new(
        vacancy_dir: Option<PathBuf>,
        skip_dir: Option<PathBuf>,
        current_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |p: Option<PathBuf>| p.filter(|p| !p.as_os_str().is_empty());
        let vacancy_dir = non_empty(vacancy_dir).ok_or(ConfigError::MissingDir("VACANCY_DIR"))?;
        let skip_dir = non_empty(skip_dir).ok_or(ConfigError::MissingDir("SKIP_DIR"))?;

        Ok(Config {
            vacancy_dir,
            skip_dir,
            current_dir: non_empty(current_dir),
            plan: SearchPlan::default(),
            stopwords: default_stopwords(),
            concurrency: 1,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.concurrency = concurrency;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_has_48_searches_in_order() {
        let queries = SearchPlan::default().expand();
        assert_eq!(queries.len(), 48);
        assert!(queries.iter().enumerate().all(|(i, q)| q.index == i));

        let first = &queries[0];
        assert_eq!(first.term, "devops");
        assert_eq!(first.source, "linkedin");
        assert_eq!(first.location.as_deref(), Some("Ukraine"));
        assert!(!first.filter_language);

        assert_eq!(queries[1].location.as_deref(), Some("Latvia"));
        assert!(queries[1].filter_language);
        assert_eq!(queries[4].source, "indeed");
        assert_eq!(queries[8].term, "devops engineer");
        assert_eq!(queries[47].term, "head of engineering");
        assert_eq!(queries[47].location.as_deref(), Some("Cyprus"));
    }

    #[test]
    fn worldwide_searches_follow_countries() {
        let plan = SearchPlan {
            worldwide: true,
            ..SearchPlan::default()
        };
        let queries = plan.expand();
        assert_eq!(queries.len(), 60);
        let ww = &queries[4];
        assert!(ww.location.is_none());
        assert!(ww.filter_language);
        assert_eq!(ww.results_wanted, RESULTS_WANTED * 10);
        assert_eq!(queries[5].source, "indeed");
    }

    #[test]
    fn missing_dirs_are_rejected() {
        assert!(matches!(
            Config::new(None, Some("skip".into()), None),
            Err(ConfigError::MissingDir("VACANCY_DIR"))
        ));
        assert!(matches!(
            Config::new(Some("inbox".into()), Some("".into()), None),
            Err(ConfigError::MissingDir("SKIP_DIR"))
        ));

        let cfg = Config::new(Some("inbox".into()), Some("skip".into()), Some("".into())).unwrap();
        assert!(cfg.current_dir.is_none());
        assert_eq!(cfg.concurrency, 1);
        assert!(cfg.with_concurrency(0).is_err());
    }

    #[test]
    fn stopwords_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stopwords.json");
        fs::write(&path, r#"{ "title": ["Sales"] }"#).unwrap();

        let sw = load_stopwords(&path).unwrap();
        assert_eq!(sw.len(), 1);

        fs::write(&path, r#"{ "company": ["Acme"], "title": ["Sales", "  "] }"#).unwrap();
        assert!(matches!(
            load_stopwords(&path),
            Err(ConfigError::EmptyStopword { field: "title", .. })
        ));

        fs::write(&path, r#"{ "titles": [] }"#).unwrap();
        assert!(matches!(
            load_stopwords(&path),
            Err(ConfigError::StopwordsParse { .. })
        ));
        assert!(matches!(
            load_stopwords(&dir.path().join("missing.json")),
            Err(ConfigError::StopwordsRead { .. })
        ));
    }
}
