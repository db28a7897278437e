mod config;
mod filter;
mod output;
mod pipeline;
mod posting;
mod render;
mod scraper;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use config::{Config, SearchPlan};
use scraper::JobSpyClient;

#[derive(Parser)]
#[command(
    name = "vacancy_collector",
    about = "Collect remote job vacancies into a folder of markdown notes"
)]
struct Cli {
    /// Output directory, cleared of files at the start of every run
    #[arg(long, env = "VACANCY_DIR")]
    vacancy_dir: Option<PathBuf>,
    /// Vacancies already rejected; same-named postings are never written
    #[arg(long, env = "SKIP_DIR")]
    skip_dir: Option<PathBuf>,
    /// Vacancies in progress; same-named postings are never written
    #[arg(long, env = "CURRENT_DIR")]
    current_dir: Option<PathBuf>,
    /// Base URL of the JobSpy search service
    #[arg(long, env = "SCRAPER_URL", default_value = scraper::DEFAULT_SCRAPER_URL)]
    scraper_url: String,
    /// Only postings newer than this many hours
    #[arg(long, default_value_t = config::HOURS_OLD)]
    hours_old: u32,
    /// Results requested per search
    #[arg(long, default_value_t = config::RESULTS_WANTED)]
    results_wanted: usize,
    /// Searches running at once
    #[arg(short = 'j', long, default_value_t = 1)]
    concurrency: usize,
    /// Also search without a location (language filter applied)
    #[arg(long)]
    worldwide: bool,
    /// JSON file with "company", "title" and "description" stopword lists
    #[arg(long)]
    stopwords: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = Config::new(
        cli.vacancy_dir.clone(),
        cli.skip_dir.clone(),
        cli.current_dir.clone(),
    )?
    .with_concurrency(cli.concurrency)?;
    cfg.plan = SearchPlan {
        worldwide: cli.worldwide,
        results_wanted: cli.results_wanted,
        ..SearchPlan::default()
    };
    if let Some(path) = &cli.stopwords {
        cfg.stopwords = config::load_stopwords(path)?;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    info!(
        vacancy_dir = ?cfg.vacancy_dir,
        skip_dir = ?cfg.skip_dir,
        current_dir = ?cfg.current_dir,
        stopwords = cfg.stopwords.len(),
        "Starting vacancy collection"
    );

    let client = Arc::new(JobSpyClient::new(&cli.scraper_url, cli.hours_old)?);
    let today = chrono::Local::now().date_naive();
    let summary = pipeline::run(&cfg, client, today).await?;
    summary.print();

    println!("\nTotal execution time: {}", format_duration(t0.elapsed()));
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.2}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn cli_flags_reach_config() {
        let cli = Cli::try_parse_from([
            "vacancy_collector",
            "--vacancy-dir",
            "/tmp/inbox",
            "--skip-dir",
            "/tmp/skip",
            "--worldwide",
            "-j",
            "4",
            "--results-wanted",
            "20",
        ])
        .unwrap();
        let cfg = build_config(&cli).unwrap();
        assert_eq!(cfg.vacancy_dir, PathBuf::from("/tmp/inbox"));
        assert_eq!(cfg.concurrency, 4);
        assert!(cfg.plan.worldwide);
        assert_eq!(cfg.plan.expand().len(), 60);
        assert_eq!(cfg.plan.results_wanted, 20);
    }
}
