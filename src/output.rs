use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::posting::Posting;
use crate::render;

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

/// `"{company} - {title} - {site}.md"` with characters illegal on common
/// filesystems removed. Doubles as the identity checked against the skip
/// and current directories.
pub fn filename(posting: &Posting) -> String {
    let site = if posting.site.is_empty() {
        "Unknown"
    } else {
        posting.site.as_str()
    };
    let raw = format!(
        "{} - {} - {}",
        posting.company.as_deref().unwrap_or("Unknown"),
        posting.title.as_deref().unwrap_or("Unknown"),
        site,
    );
    let stripped = ILLEGAL_CHARS_RE.replace_all(&raw, "");
    format!("{}.md", stripped.replace('\n', " ").replace('\r', "").trim())
}

/// Create the output and skip directories, then delete every regular file
/// directly inside the output directory. Returns how many were removed.
pub fn prepare_dirs(vacancy_dir: &Path, skip_dir: &Path) -> Result<usize> {
    fs::create_dir_all(vacancy_dir)
        .with_context(|| format!("Failed to create {:?}", vacancy_dir))?;
    fs::create_dir_all(skip_dir).with_context(|| format!("Failed to create {:?}", skip_dir))?;

    let mut removed = 0;
    for entry in fs::read_dir(vacancy_dir)
        .with_context(|| format!("Failed to read {:?}", vacancy_dir))?
    {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Names of the regular files directly inside `dir`.
pub fn file_names(dir: &Path) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
        let entry = entry?;
        if entry.path().is_file() {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Written(PathBuf),
    InSkip,
    InCurrent,
    /// Same name already written earlier in this run.
    Exists,
}

/// Snapshot of already handled vacancies, taken once before any write.
pub struct WriteGate {
    vacancy_dir: PathBuf,
    skip: HashSet<String>,
    current: HashSet<String>,
}

impl WriteGate {
    pub fn open(vacancy_dir: &Path, skip_dir: &Path, current_dir: Option<&Path>) -> Result<Self> {
        let skip = file_names(skip_dir)?;
        let current = match current_dir {
            Some(dir) if dir.is_dir() => file_names(dir)?,
            _ => HashSet::new(),
        };
        info!(
            "Loaded {} skipped and {} current vacancy names",
            skip.len(),
            current.len()
        );
        Ok(WriteGate {
            vacancy_dir: vacancy_dir.to_path_buf(),
            skip,
            current,
        })
    }

    pub fn offer(&self, posting: &Posting, today: NaiveDate) -> Result<Decision> {
        let name = filename(posting);
        if self.skip.contains(&name) {
            info!("SKIP (already in skip): {}", name);
            return Ok(Decision::InSkip);
        }
        if self.current.contains(&name) {
            info!("SKIP (already in current): {}", name);
            return Ok(Decision::InCurrent);
        }

        let path = self.vacancy_dir.join(&name);
        if path.exists() {
            info!("SKIP (already written this run): {}", name);
            return Ok(Decision::Exists);
        }
        fs::write(&path, render::to_markdown(posting, today))
            .with_context(|| format!("Failed to write {:?}", path))?;
        Ok(Decision::Written(path))
    }
}
