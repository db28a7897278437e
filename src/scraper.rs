use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::posting::{Posting, SearchQuery};

pub const DEFAULT_SCRAPER_URL: &str = "http://localhost:8000";
const SEARCH_PATH: &str = "/api/v1/search_jobs";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Anything that can turn one search into postings.
pub trait JobScraper: Send + Sync + 'static {
    fn scrape(&self, query: &SearchQuery) -> impl Future<Output = Result<Vec<Posting>>> + Send;
}

/// Client for a JobSpy search service (`GET /api/v1/search_jobs`).
pub struct JobSpyClient {
    client: reqwest::Client,
    base_url: String,
    hours_old: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    jobs: Vec<Posting>,
}

impl JobSpyClient {
    pub fn new(base_url: &str, hours_old: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(JobSpyClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hours_old,
        })
    }

    fn params(&self, query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("site_name", query.source.clone()),
            ("search_term", query.term.clone()),
            ("hours_old", self.hours_old.to_string()),
            ("results_wanted", query.results_wanted.to_string()),
            ("is_remote", "true".to_string()),
            ("linkedin_fetch_description", "true".to_string()),
        ];
        if let Some(country) = &query.location {
            params.push(("location", country.clone()));
            params.push(("country_indeed", country.clone()));
        }
        params
    }
}

impl JobScraper for JobSpyClient {
    async fn scrape(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let response = self
            .client
            .get(&url)
            .query(&self.params(query))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()?;
        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to decode search response")?;
        Ok(body.jobs)
    }
}

/// Outcome of one search, postings already tagged with provenance.
pub struct Batch {
    pub query: SearchQuery,
    pub postings: Result<Vec<Posting>>,
}

pub struct AcquireStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub postings: usize,
}

/// Run every search and return the batches in plan order.
///
/// A failing search is logged and kept as an error batch; it never aborts
/// the others. With `concurrency > 1` searches run as bounded tasks, and the
/// batches are re-sorted by query index afterwards.
pub async fn acquire_all<S: JobScraper>(
    scraper: Arc<S>,
    queries: Vec<SearchQuery>,
    concurrency: usize,
) -> (Vec<Batch>, AcquireStats) {
    let total = queries.len();
    let pb = ProgressBar::new(total as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} searches ({eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let batches = if concurrency <= 1 {
        let mut batches = Vec::with_capacity(total);
        for query in queries {
            batches.push(acquire_one(scraper.as_ref(), query).await);
            pb.inc(1);
        }
        batches
    } else {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, mut rx) = tokio::sync::mpsc::channel::<Batch>(concurrency * 2);

        for query in queries {
            let scraper = Arc::clone(&scraper);
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return;
                };
                let batch = acquire_one(scraper.as_ref(), query).await;
                let _ = tx.send(batch).await;
            });
        }
        // rx closes once every task has dropped its sender
        drop(tx);

        let mut batches = Vec::with_capacity(total);
        while let Some(batch) = rx.recv().await {
            batches.push(batch);
            pb.inc(1);
        }
        batches.sort_by_key(|b| b.query.index);
        batches
    };
    pb.finish_and_clear();

    if batches.len() < total {
        warn!("{} searches did not report back", total - batches.len());
    }

    let errors = batches.iter().filter(|b| b.postings.is_err()).count();
    let postings = batches
        .iter()
        .filter_map(|b| b.postings.as_ref().ok())
        .map(Vec::len)
        .sum();
    let stats = AcquireStats {
        total,
        ok: batches.len() - errors,
        errors,
        postings,
    };
    info!(
        "Ran {} searches ({} ok, {} errors), {} postings",
        stats.total, stats.ok, stats.errors, stats.postings
    );
    (batches, stats)
}

async fn acquire_one<S: JobScraper>(scraper: &S, query: SearchQuery) -> Batch {
    info!("Scraping {}...", query.describe());
    let start = Instant::now();
    let postings = match scraper.scrape(&query).await {
        Ok(postings) => {
            info!(
                "Found {} '{}' jobs on {} in {:.2}s",
                postings.len(),
                query.term,
                query.source,
                start.elapsed().as_secs_f64()
            );
            Ok(postings.into_iter().map(|p| p.tagged(&query)).collect())
        }
        Err(e) => {
            warn!("Search {} failed: {:#}", query.describe(), e);
            Err(e)
        }
    };
    Batch { query, postings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchPlan;

    /// Returns one posting per search, titled after the query index; fails
    /// for the indexes listed in `fail`.
    struct Echo {
        fail: Vec<usize>,
    }

    impl JobScraper for Echo {
        async fn scrape(&self, query: &SearchQuery) -> Result<Vec<Posting>> {
            if self.fail.contains(&query.index) {
                anyhow::bail!("boom");
            }
            // later indexes finish first under concurrency
            tokio::time::sleep(Duration::from_millis((50 - query.index as u64 % 50) / 10)).await;
            Ok(vec![Posting {
                site: query.source.clone(),
                title: Some(format!("job {}", query.index)),
                ..Default::default()
            }])
        }
    }

    fn queries() -> Vec<SearchQuery> {
        SearchPlan::default().expand().into_iter().take(12).collect()
    }

    #[tokio::test]
    async fn sequential_isolates_failures() {
        let scraper = Arc::new(Echo { fail: vec![3] });
        let (batches, stats) = acquire_all(scraper, queries(), 1).await;
        assert_eq!(batches.len(), 12);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.ok, 11);
        assert_eq!(stats.postings, 11);
        assert!(batches[3].postings.is_err());

        let tagged = &batches[1].postings.as_ref().unwrap()[0];
        assert_eq!(tagged.search_info, batches[1].query.provenance());
    }

    #[tokio::test]
    async fn concurrent_keeps_plan_order() {
        let scraper = Arc::new(Echo { fail: vec![] });
        let (batches, stats) = acquire_all(scraper, queries(), 4).await;
        assert_eq!(stats.ok, 12);
        let order: Vec<usize> = batches.iter().map(|b| b.query.index).collect();
        assert_eq!(order, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn null_urls_keep_the_rest_of_the_response() {
        let body = r#"{"count": 2, "jobs": [
            {"site": "linkedin", "company": "Acme", "title": "SRE", "job_url": "https://example.com/1"},
            {"site": "indeed", "company": "Beta", "title": "CTO", "job_url": null}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.jobs.len(), 2);
        assert_eq!(response.jobs[0].company.as_deref(), Some("Acme"));
        assert_eq!(response.jobs[1].job_url, "");
    }

    #[test]
    fn country_params_include_location() {
        let client = JobSpyClient::new("http://localhost:8000/", 168).unwrap();
        assert_eq!(client.base_url, "http://localhost:8000");

        let queries = SearchPlan::default().expand();
        let params = client.params(&queries[1]);
        assert!(params.contains(&("location", "Latvia".to_string())));
        assert!(params.contains(&("country_indeed", "Latvia".to_string())));
        assert!(params.contains(&("hours_old", "168".to_string())));

        let worldwide = SearchQuery {
            location: None,
            ..queries[0].clone()
        };
        assert!(!client.params(&worldwide).iter().any(|(k, _)| *k == "location"));
    }
}
