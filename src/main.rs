mod analyzer;
mod api;
mod cli;
mod config;
mod mailbox;
mod matcher;
mod model;
mod normalizer;
mod notifier;
mod parser;
mod report;
mod scrape;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use futures::future::join_all;
use tokio::time::sleep;
use tracing::{error, info, warn};

use analyzer::{Analyzer, AnalyzerImpl};
use api::StoreApi;
use cli::{Cli, Command};
use config::{AppConfig, WatchItem, load_config};
use model::Offer;
use notifier::EmailNotifier;
use scrape::{PageFetcher, PageFetcherImpl};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {panic_info:?}");
    }));

    let cli = Cli::parse();

    // Load configuration from file
    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {e}");
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Command::Check { no_email, watch } => run_check(&config, no_email, watch).await,
        Command::Scrape { test } => run_scrape(&config, test).await,
        Command::Mail { days } => run_mail(&config, days),
        Command::Pdf { path } => run_pdf(&config, &path),
        Command::Probe { store, keyword } => run_probe(&config, &store, &keyword).await,
    };

    if let Err(e) = outcome {
        error!("{e}");
        std::process::exit(1);
    }
}

/// API pipeline: search the store price APIs for every watch item and report.
async fn run_check(config: &AppConfig, no_email: bool, watch: bool) -> Result<(), Box<dyn Error>> {
    let key = config.api.resolve_key()?;
    let api = StoreApi::new(
        key,
        config.api.page_size,
        Duration::from_secs(config.request_timeout_seconds),
    )?;

    loop {
        check_once(config, &api, no_email).await;
        if !watch {
            break;
        }
        info!(
            "Waiting {}s until the next check...",
            config.check_interval_seconds
        );
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
    }
    Ok(())
}

async fn check_once(config: &AppConfig, api: &StoreApi, no_email: bool) {
    info!("Watch items to process: {}", config.watchlist.len());

    // Process all watch items concurrently
    let tasks: Vec<_> = config
        .watchlist
        .iter()
        .map(|item| process_watch_item(api, item))
        .collect();
    let sections: Vec<(String, Vec<Offer>)> = join_all(tasks).await;

    let report_text = report::build_offer_report(&sections);
    println!("{report_text}");

    if let Some(path) = &config.report_log {
        report::append_to_log(path, &report_text);
    }

    let total: usize = sections.iter().map(|(_, offers)| offers.len()).sum();
    if total == 0 {
        info!("No matching offers found; skipping email.");
        return;
    }
    if no_email {
        return;
    }
    match &config.email_report {
        Some(email_cfg) => {
            let notifier = EmailNotifier::new(email_cfg.clone());
            if let Err(e) = notifier.notify_report("Weekly grocery specials report", &report_text)
            {
                warn!("Email send error: {e}");
            }
        }
        None => info!("Email reporting is not configured; skipping email."),
    }
}

async fn process_watch_item(api: &StoreApi, item: &WatchItem) -> (String, Vec<Offer>) {
    info!("Processing watch item: {}", item.name);
    let offers = api.find_offers(item).await;

    match AnalyzerImpl::new().calculate_stats(&offers) {
        Some(stats) => info!(
            "{}: {} offer(s), avg = {:.2}, std_dev = {:.2} | updated {}",
            item.name,
            offers.len(),
            stats.avg_price,
            stats.std_dev,
            stats.last_updated
        ),
        None => info!("{}: no offers found", item.name),
    }

    (item.name.clone(), offers)
}

/// Scrape pipeline: fetch each store's specials page and match tile text.
async fn run_scrape(config: &AppConfig, test_mode: bool) -> Result<(), Box<dyn Error>> {
    let fetcher = PageFetcherImpl::new(Duration::from_secs(config.request_timeout_seconds))?;
    let log_path = config.report_log.as_deref();

    if test_mode {
        info!("Scrape test mode enabled - no emails will be sent");
        if let Some(path) = log_path {
            report::append_to_log(path, "=== SCRAPE TEST SESSION STARTED ===");
        }
    }

    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    for store in &config.stores {
        info!("Fetching: {} ...", store.name);
        let html = match fetcher.fetch_page(&store.url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Fetch error for {}: {e}", store.name);
                sections.push((store.name.clone(), Vec::new()));
                continue;
            }
        };

        let items = match parser::page::extract_items(&html, &store.product_selector) {
            Ok(items) => items,
            Err(e) => {
                warn!("Parse error for {}: {e}", store.name);
                Vec::new()
            }
        };
        if items.is_empty() {
            log_and_save_html(&html, &store.name);
        }

        if test_mode {
            info!("Total items scraped from {}: {}", store.name, items.len());
            if let Some(path) = log_path {
                log_scraped_items(path, &store.name, &items);
            }
        }

        let matches = matcher::find_matches(&items, &config.watchlist);
        info!("Found {} matches for {}.", matches.len(), store.name);
        sections.push((store.name.clone(), matches));

        scrape::polite_pause().await;
    }

    deliver_match_report(config, &sections, "Coles/Woolworths sale alert", test_mode);

    if test_mode {
        if let Some(path) = log_path {
            report::append_to_log(path, "=== SCRAPE TEST SESSION COMPLETED ===");
        }
    }
    Ok(())
}

/// Mail pipeline: pull recent store newsletters and match their offer lines.
fn run_mail(config: &AppConfig, days_override: Option<u32>) -> Result<(), Box<dyn Error>> {
    let Some(mail_cfg) = &config.mail else {
        return Err("no `mail` section in the config".into());
    };
    let days = days_override.unwrap_or(mail_cfg.days);

    info!("Checking email newsletters from the last {days} day(s)...");
    let newsletters = mailbox::fetch_recent(mail_cfg, days)?;
    info!("Fetched {} newsletter(s)", newsletters.len());

    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    for newsletter in &newsletters {
        let products = parser::newsletter::extract_products(&newsletter.html);
        info!(
            "{} – {}: {} product line(s)",
            newsletter.store,
            newsletter.subject,
            products.len()
        );

        let matches = matcher::find_matches(&products, &config.watchlist);
        if matches.is_empty() {
            continue;
        }
        let subject_prefix: String = newsletter.subject.chars().take(30).collect();
        sections.push((
            format!("{} – {}", newsletter.store, subject_prefix),
            matches,
        ));
    }

    deliver_match_report(config, &sections, "Store newsletter matches", false);
    Ok(())
}

/// PDF pipeline: parse one catalogue, or every catalogue in a directory.
fn run_pdf(config: &AppConfig, path: &Path) -> Result<(), Box<dyn Error>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(format!("no PDF files found in {}", path.display()).into());
        }
        info!("Found {} PDF file(s)", files.len());
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut sections: Vec<(String, Vec<String>)> = Vec::new();
    for file in &files {
        info!("Processing {}", file.display());
        let products = match parser::pdf::parse_catalogue(file) {
            Ok(products) => products,
            Err(e) => {
                warn!("Error parsing {}: {e}", file.display());
                continue;
            }
        };
        info!("Found {} product(s) with prices", products.len());

        let matches = parser::pdf::match_catalogue(&products, &config.watchlist);
        let name = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        info!("{name}: {} matching item(s)", matches.len());

        sections.push((
            name,
            matches
                .iter()
                .map(|product| report::format_catalogue_product(product))
                .collect(),
        ));
    }

    println!("Processed {} catalogue(s)", files.len());
    println!("Total matches: {}", report::total_matches(&sections));
    for (name, items) in &sections {
        if items.is_empty() {
            continue;
        }
        println!("{name}:");
        for item in items.iter().take(5) {
            println!("  - {item}");
        }
        if items.len() > 5 {
            println!("  ... and {} more", items.len() - 5);
        }
    }

    if let Some(log) = &config.report_log {
        let body = report::build_match_report(&sections);
        if !body.is_empty() {
            report::append_to_log(log, &body);
        }
    }
    Ok(())
}

/// Probe mode: dump one raw API response so the field maps can be checked
/// against what the upstream currently returns.
async fn run_probe(config: &AppConfig, store: &str, keyword: &str) -> Result<(), Box<dyn Error>> {
    let Some(endpoint) = api::endpoint_for(store) else {
        let known: Vec<&str> = api::ENDPOINTS.iter().map(|e| e.store).collect();
        return Err(format!(
            "unknown store '{store}' (expected one of: {})",
            known.join(", ")
        )
        .into());
    };

    println!("[TEST] {} search for: {keyword:?}", endpoint.store);
    let key = config.api.resolve_key()?;
    let api = StoreApi::new(
        key,
        config.api.page_size,
        Duration::from_secs(config.request_timeout_seconds),
    )?;
    let data = api.search(endpoint, keyword).await?;
    api::print_sample(&data, 3);
    Ok(())
}

/// Prints the match report and pushes it to the configured sinks. Email is
/// skipped when nothing matched or when the run suppresses it.
fn deliver_match_report(
    config: &AppConfig,
    sections: &[(String, Vec<String>)],
    subject: &str,
    suppress_email: bool,
) {
    let total = report::total_matches(sections);
    if total == 0 {
        println!("No matches found; no email sent.");
        return;
    }

    let body = report::build_match_report(sections);
    println!("{body}");
    if let Some(path) = &config.report_log {
        report::append_to_log(path, &body);
    }

    if suppress_email {
        info!("Would have sent email with {total} match(es).");
        return;
    }
    match &config.email_report {
        Some(email_cfg) => match EmailNotifier::new(email_cfg.clone()).notify_report(subject, &body)
        {
            Ok(()) => info!("Sent email with {total} match(es)."),
            Err(e) => warn!("Email send error: {e}"),
        },
        None => info!("Email reporting is not configured; skipping email."),
    }
}

fn log_scraped_items(path: &Path, store: &str, items: &[String]) {
    let mut lines = vec![format!("--- {store}: {} scraped item(s) ---", items.len())];
    for (idx, item) in items.iter().take(50).enumerate() {
        lines.push(format!("  {}. {item}", idx + 1));
    }
    if items.len() > 50 {
        lines.push(format!("  ... and {} more items", items.len() - 50));
    }
    report::append_to_log(path, &lines.join("\n"));
}

/// Saves the fetched HTML for selector debugging when extraction found
/// nothing on a page.
fn log_and_save_html(html: &str, store: &str) {
    let folder = Path::new("logs/html");
    if let Err(e) = fs::create_dir_all(folder) {
        warn!("Failed to create debug folder: {e}");
        return;
    }
    let filename = folder.join(format!(
        "debug-{}.html",
        store.to_lowercase().replace(' ', "_")
    ));
    if let Err(e) = fs::write(&filename, html) {
        warn!("Failed to write debug HTML: {e}");
    } else {
        info!("Saved debug HTML: {}", filename.display());
    }
}
