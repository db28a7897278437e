use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::info;

use crate::config::Config;
use crate::filter::{self, FilterCounts};
use crate::output::{self, Decision, WriteGate};
use crate::scraper::{self, JobScraper};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub searches: usize,
    pub failed_searches: usize,
    pub fetched: usize,
    pub filtered: FilterCounts,
    pub unique: usize,
    pub skipped: usize,
    pub current: usize,
    pub written: usize,
    /// Distinct postings whose file names collided after sanitizing.
    pub name_clashes: usize,
    pub stale_removed: usize,
}

impl RunSummary {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!(
                "Searches: {} ({} failed), fetched {} postings",
                self.searches, self.failed_searches, self.fetched
            ),
            format!(
                "Discarded {} by stopwords, {} by language, {} duplicates",
                self.filtered.stopword, self.filtered.language, self.filtered.duplicates
            ),
            format!(
                "Found {} unique jobs: {} written, {} in skip, {} in current, {} file name clashes",
                self.unique, self.written, self.skipped, self.current, self.name_clashes
            ),
            format!(
                "Removed {} stale files from the output directory",
                self.stale_removed
            ),
        ]
    }

    pub fn print(&self) {
        for line in self.lines() {
            println!("{}", line);
        }
    }
}

/// Reset the output directory, collect and filter postings, then write the
/// ones not handled before.
///
/// The skip/current snapshot is taken after the reset and before any
/// search runs, so nothing written by this run can hide another posting.
pub async fn run<S: JobScraper>(
    config: &Config,
    scraper: Arc<S>,
    today: NaiveDate,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        stale_removed: output::prepare_dirs(&config.vacancy_dir, &config.skip_dir)?,
        ..Default::default()
    };
    info!(
        "Cleared {} stale files from {:?}",
        summary.stale_removed, config.vacancy_dir
    );
    let gate = WriteGate::open(
        &config.vacancy_dir,
        &config.skip_dir,
        config.current_dir.as_deref(),
    )?;

    info!("Starting to scrape...");
    let queries = config.plan.expand();
    let (batches, stats) = scraper::acquire_all(scraper, queries, config.concurrency).await;
    summary.searches = stats.total;
    summary.failed_searches = stats.errors;
    summary.fetched = stats.postings;

    let mut merged = Vec::new();
    for batch in batches {
        let Ok(postings) = batch.postings else {
            continue;
        };
        let kept = filter::filter_batch(
            postings,
            &config.stopwords,
            batch.query.filter_language,
            &mut summary.filtered,
        );
        if batch.query.filter_language {
            info!("After language filtering: {} jobs remain", kept.len());
        }
        merged.extend(kept);
    }

    let unique = filter::dedup(merged, &mut summary.filtered);
    summary.unique = unique.len();
    info!("Found {} unique jobs", unique.len());

    for posting in &unique {
        match gate.offer(posting, today)? {
            Decision::Written(path) => {
                info!("Saved {}", path.display());
                summary.written += 1;
            }
            Decision::InSkip => summary.skipped += 1,
            Decision::InCurrent => summary.current += 1,
            Decision::Exists => summary.name_clashes += 1,
        }
    }

    Ok(summary)
}
