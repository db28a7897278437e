use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use crate::posting::Posting;

static CYRILLIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[а-яёіїєґъь]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Company,
    Title,
    Description,
}

impl Field {
    fn as_str(self) -> &'static str {
        match self {
            Field::Company => "company",
            Field::Title => "title",
            Field::Description => "description",
        }
    }
}

/// Case-insensitive literal substrings that disqualify a posting, one list
/// per field. Stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    company: Vec<String>,
    title: Vec<String>,
    description: Vec<String>,
}

impl Stopwords {
    pub fn new<S: AsRef<str>>(company: &[S], title: &[S], description: &[S]) -> Self {
        let lower = |words: &[S]| -> Vec<String> {
            words
                .iter()
                .map(|w| w.as_ref().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Stopwords {
            company: lower(company),
            title: lower(title),
            description: lower(description),
        }
    }

    /// First (field, stopword) that hits, checking company, title, then
    /// description.
    pub fn find(&self, posting: &Posting) -> Option<(Field, &str)> {
        [
            (Field::Company, posting.company_or_empty(), &self.company),
            (Field::Title, posting.title_or_empty(), &self.title),
            (Field::Description, posting.description_or_empty(), &self.description),
        ]
        .into_iter()
        .find_map(|(field, text, words)| find_stopword(text, words).map(|w| (field, w)))
    }

    pub fn len(&self) -> usize {
        self.company.len() + self.title.len() + self.description.len()
    }
}

/// Plain substring containment after lowercasing, not word-boundary aware.
fn find_stopword<'a>(text: &str, stopwords: &'a [String]) -> Option<&'a str> {
    if text.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    stopwords
        .iter()
        .find(|w| lower.contains(w.as_str()))
        .map(String::as_str)
}

/// True when company, title or description carries a Russian/Ukrainian letter.
pub fn has_cyrillic(posting: &Posting) -> bool {
    let combined = format!(
        "{} {} {}",
        posting.company_or_empty(),
        posting.title_or_empty(),
        posting.description_or_empty()
    )
    .to_lowercase();
    CYRILLIC_RE.is_match(&combined)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterCounts {
    pub stopword: usize,
    pub language: usize,
    pub duplicates: usize,
}

/// Why a posting was dropped before reaching the write gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    Stopword { field: Field, word: String },
    Language,
    Duplicate,
}

impl Discard {
    pub fn reason(&self) -> String {
        match self {
            Discard::Stopword { field, word } => {
                format!("{} stopword '{}'", field.as_str(), word)
            }
            Discard::Language => "no RU/UA text".to_string(),
            Discard::Duplicate => "duplicate company and title".to_string(),
        }
    }
}

/// Stopwords first, then the language heuristic when asked.
pub fn check(posting: &Posting, stopwords: &Stopwords, filter_language: bool) -> Option<Discard> {
    if let Some((field, word)) = stopwords.find(posting) {
        return Some(Discard::Stopword {
            field,
            word: word.to_string(),
        });
    }
    if filter_language && !has_cyrillic(posting) {
        return Some(Discard::Language);
    }
    None
}

fn log_discard(posting: &Posting, discard: &Discard) {
    info!(
        "DISCARD ({}): {} / {}: {}",
        discard.reason(),
        posting.company_or_empty(),
        posting.title_or_empty(),
        posting.job_url
    );
}

/// Apply stopwords and, when asked, the language heuristic to one batch.
pub fn filter_batch(
    batch: Vec<Posting>,
    stopwords: &Stopwords,
    filter_language: bool,
    counts: &mut FilterCounts,
) -> Vec<Posting> {
    let mut kept = Vec::with_capacity(batch.len());

    for posting in batch {
        match check(&posting, stopwords, filter_language) {
            Some(discard) => {
                log_discard(&posting, &discard);
                match discard {
                    Discard::Stopword { .. } => counts.stopword += 1,
                    Discard::Language => counts.language += 1,
                    Discard::Duplicate => counts.duplicates += 1,
                }
            }
            None => {
                info!(
                    "KEEP: {} / {}: {}",
                    posting.company_or_empty(),
                    posting.title_or_empty(),
                    posting.job_url
                );
                kept.push(posting);
            }
        }
    }

    kept
}

/// Keep the first posting for each exact (company, title) pair.
pub fn dedup(postings: Vec<Posting>, counts: &mut FilterCounts) -> Vec<Posting> {
    let mut seen: HashSet<(Option<String>, Option<String>)> = HashSet::new();
    let mut unique = Vec::with_capacity(postings.len());

    for posting in postings {
        if seen.insert((posting.company.clone(), posting.title.clone())) {
            unique.push(posting);
        } else {
            log_discard(&posting, &Discard::Duplicate);
            counts.duplicates += 1;
        }
    }

    unique
}
