use std::fs;
use std::future::Future;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use monitor_core::{ContentItem, ListingParser, RunStatus};
use monitor_engine::{
    decode_utf8, ensure_parent_dir, load_credentials, ContentMonitor, DedupStore, MonitorSetup,
    RunReport, Scheduler, TriggerOutcome,
};
use monitor_logging::{monitor_error, monitor_info};

use crate::cli::Commands;
use crate::config::MonitorConfig;

pub fn execute(command: Commands, config: &MonitorConfig) -> Result<ExitCode> {
    match command {
        Commands::Parse { file } => parse_saved_page(config, &file),
        Commands::Watch => block_on(watch(config)),
        Commands::Check => block_on(check(config)),
        Commands::Event { text } => block_on(event(config, &text.join(" "))),
    }
}

fn block_on<F>(future: F) -> Result<ExitCode>
where
    F: Future<Output = Result<ExitCode>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(future)
}

fn build_scheduler(config: &MonitorConfig) -> Result<Scheduler> {
    let credential = load_credentials(&config.credentials_path)?;
    ensure_parent_dir(&config.known_items_path)?;
    let store = DedupStore::load(&config.known_items_path)?;
    let targets = config.targets();
    if targets.is_empty() {
        monitor_info!("No notification targets configured; new items are only logged");
    }

    let monitor = ContentMonitor::new(MonitorSetup {
        site: config.site_settings()?,
        fetch: config.fetch_settings(),
        credential,
        store,
        notifier: Arc::new(config.notifier()),
        targets,
    });
    Ok(Scheduler::new(
        monitor,
        config.daily_schedule()?,
        config.trigger(),
    ))
}

async fn watch(config: &MonitorConfig) -> Result<ExitCode> {
    let scheduler = build_scheduler(config)?;
    monitor_info!("Watching; checks at {:?}", config.schedule);
    scheduler
        .run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                monitor_error!("Cannot listen for Ctrl-C: {}", err);
            }
        })
        .await;
    Ok(ExitCode::SUCCESS)
}

async fn check(config: &MonitorConfig) -> Result<ExitCode> {
    let scheduler = build_scheduler(config)?;
    match scheduler.trigger_now().await {
        TriggerOutcome::Completed(report) => {
            print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        TriggerOutcome::Failed(err) => {
            println!("status: {}", RunStatus::Failed);
            Err(err.into())
        }
        TriggerOutcome::Skipped => Ok(ExitCode::SUCCESS),
    }
}

async fn event(config: &MonitorConfig, text: &str) -> Result<ExitCode> {
    let scheduler = build_scheduler(config)?;
    let handled = scheduler.handle_event(text).await;
    println!("handled: {handled}");
    Ok(if handled {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn parse_saved_page(config: &MonitorConfig, file: &Path) -> Result<ExitCode> {
    let bytes = fs::read(file).with_context(|| format!("cannot read {}", file.display()))?;
    let page = decode_utf8(&bytes);
    let parser = ListingParser::new(config.site_settings()?.base_url);
    let parsed = parser.parse(&page.html);

    println!("tier: {}", parsed.tier);
    println!("degraded: {}", parsed.is_degraded() || page.had_errors);
    println!("items: {}", parsed.items.len());
    for item in &parsed.items {
        print_item(item);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &RunReport) {
    println!("status: {}", report.status);
    println!("tier: {}", report.tier);
    println!("new items: {}", report.delta.len());
    for item in &report.delta.new_items {
        print_item(item);
    }
    for delivery in &report.deliveries {
        match &delivery.error {
            None => println!("notified {}", delivery.target),
            Some(err) => println!("notify {} failed: {}", delivery.target, err),
        }
    }
    if let Some(err) = &report.persist_error {
        println!("known items not saved: {err}");
    }
}

fn print_item(item: &ContentItem) {
    println!("  [{}] {} ({})", item.id, item.title, item.publish_time);
    println!("      {}", item.url);
}
