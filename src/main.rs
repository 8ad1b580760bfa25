//! Clipsift - AI-powered clipboard capture and analysis
//!
//! Run `clipsift add "some text"` to capture and analyze a snippet,
//! `clipsift list` to browse the history, and `clipsift export` to write
//! it out. See `clipsift --help` for the full command set.

use anyhow::Context;
use clap::Parser;
use clipsift::analyze::Provider;
use clipsift::cli::{Cli, Commands, SubscriptionAction};
use clipsift::config::{load_config, Settings};
use clipsift::history::export::{
    default_file_name, export_items_to_file, ExportFormat, ExportOptions,
};
use clipsift::history::storage::SqliteItemStore;
use clipsift::history::store::HistoryStore;
use clipsift::history::{ClipboardItem, ItemId, ItemStatus};
use clipsift::subscription::{BillingConfig, SubscriptionGate, TomlStateStore};
use std::io::Read;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("clipsift={},warn", log_level))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut settings = load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(provider) = cli.provider {
        settings.provider = provider;
    }

    Settings::ensure_directories().context("Failed to create application directories")?;

    // Service objects, constructed once and passed by reference
    let history = HistoryStore::new(Box::new(SqliteItemStore::open(
        &settings.resolve_history_path(),
    )?))?;
    let gate = SubscriptionGate::new(
        Box::new(TomlStateStore::new(Settings::subscription_state_path())),
        BillingConfig::default(),
    );

    match cli.command.unwrap_or(Commands::List { status: None }) {
        Commands::Add { text, no_process } => cmd_add(&history, &gate, &settings, text, no_process),
        Commands::List { status } => cmd_list(&history, status),
        Commands::Show { id } => cmd_show(&history, &id),
        Commands::Retry { id } => cmd_retry(&history, &gate, &settings, &id),
        Commands::Remove { id } => {
            history.remove_item(parse_id(&id)?)?;
            println!("Removed {}", id);
            Ok(())
        }
        Commands::Clear => {
            history.clear()?;
            println!("History cleared");
            Ok(())
        }
        Commands::Stats => cmd_stats(&history, &gate),
        Commands::Export { format, output } => cmd_export(&history, &gate, &format, output),
        Commands::Subscription { action } => cmd_subscription(&gate, action),
        Commands::Config => cmd_config(&settings, cli.config.as_deref()),
    }
}

fn parse_id(id: &str) -> anyhow::Result<ItemId> {
    ItemId::parse(id).with_context(|| format!("'{}' is not a valid item id", id))
}

fn cmd_add(
    history: &HistoryStore,
    gate: &SubscriptionGate,
    settings: &Settings,
    text: Option<String>,
    no_process: bool,
) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        anyhow::bail!("Nothing to capture: the text is empty");
    }

    let process = settings.processing.enabled && !no_process;

    // Pre-flight checks happen before any item exists, so a denial never
    // produces a failed item
    if process {
        gate.require_processing()?;
        gate.require_model(settings.active_model())?;
    }

    let item = history.add_item(text, settings)?;
    println!("Captured {} ({})", item.id, item.status);

    if process {
        let updated = history.process_item(item.id, settings)?;
        gate.increment_processing_count();
        print_outcome(&updated, gate);
    }

    Ok(())
}

fn cmd_retry(
    history: &HistoryStore,
    gate: &SubscriptionGate,
    settings: &Settings,
    id: &str,
) -> anyhow::Result<()> {
    let id = parse_id(id)?;

    gate.require_processing()?;
    gate.require_model(settings.active_model())?;

    let updated = history.retry_item(id, settings)?;
    gate.increment_processing_count();
    print_outcome(&updated, gate);

    Ok(())
}

fn print_outcome(item: &ClipboardItem, gate: &SubscriptionGate) {
    match item.status {
        ItemStatus::Processed => {
            if let Some(ref data) = item.processed_data {
                println!("Processed with {}", item.ai_provider);
                println!("  Topic:      {}", data.topic);
                println!("  Intent:     {}", data.intent);
                if !data.entities.is_empty() {
                    println!("  Entities:   {}", data.entities.join(", "));
                }
                println!("  Categories: {}", data.categories.join(", "));
                println!("  Actions:    {}", data.action_items.join(", "));
            }
        }
        ItemStatus::Failed => {
            println!(
                "Analysis failed: {}",
                item.error.as_deref().unwrap_or("unknown error")
            );
            println!("Retry with: clipsift retry {}", item.id);
        }
        _ => {}
    }

    if let Some(remaining) = gate.remaining_today() {
        println!("{} analyses left today", remaining);
    }
}

fn cmd_list(history: &HistoryStore, status: Option<String>) -> anyhow::Result<()> {
    let filter = match status.as_deref() {
        Some(s) => Some(
            ItemStatus::parse(s)
                .with_context(|| format!("Unknown status '{}'", s))?,
        ),
        None => None,
    };

    let items = history.items();
    let mut shown = 0;

    for item in &items {
        if let Some(filter) = filter {
            if item.status != filter {
                continue;
            }
        }
        shown += 1;

        let topic = item
            .processed_data
            .as_ref()
            .map(|d| d.topic.as_str())
            .unwrap_or(&item.original_text);
        println!(
            "{}  [{:>9}]  {}",
            item.id,
            item.status,
            preview(topic, 60)
        );
    }

    if shown == 0 {
        println!("No items. Capture one with: clipsift add \"some text\"");
    }

    Ok(())
}

fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        flat
    } else {
        let head: String = flat.chars().take(max).collect();
        format!("{}...", head)
    }
}

fn cmd_show(history: &HistoryStore, id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let item = history
        .get(id)
        .with_context(|| format!("No item with id {}", id))?;

    println!("Id:          {}", item.id);
    println!("Captured:    {}", item.timestamp);
    println!("Status:      {}", item.status);
    println!("AI Provider: {}", item.ai_provider);
    println!();
    println!("{}", item.original_text);

    if let Some(ref data) = item.processed_data {
        println!();
        println!("Topic:      {}", data.topic);
        println!("Intent:     {}", data.intent);
        println!("Entities:   {}", data.entities.join(", "));
        println!("Categories: {}", data.categories.join(", "));
        println!("Actions:");
        for action in &data.action_items {
            println!("  - {}", action);
        }
    }

    if let Some(ref error) = item.error {
        println!();
        println!("Last error: {}", error);
    }

    Ok(())
}

fn cmd_stats(history: &HistoryStore, gate: &SubscriptionGate) -> anyhow::Result<()> {
    let stats = history.stats();
    println!("Items:           {}", history.len());
    println!("Processed today: {}", stats.processed_today);
    println!("Success rate:    {}%", stats.success_rate);

    match gate.remaining_today() {
        Some(remaining) => println!("Quota left:      {}", remaining),
        None => println!("Quota left:      unlimited"),
    }

    Ok(())
}

fn cmd_export(
    history: &HistoryStore,
    gate: &SubscriptionGate,
    format: &str,
    output: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let format = ExportFormat::parse(format).with_context(|| {
        format!(
            "Unknown format '{}'. Supported: {}",
            format,
            ExportFormat::all_names().join(", ")
        )
    })?;

    // Format permission is a pre-flight check, not an exporter concern
    gate.require_format(format)?;

    let options = ExportOptions {
        watermark: gate.limits().watermark,
    };
    let path = output.unwrap_or_else(|| default_file_name(format).into());

    let items = history.items();
    export_items_to_file(&items, format, &options, &path)?;

    println!("Exported {} items to {}", items.len(), path.display());
    Ok(())
}

fn cmd_subscription(gate: &SubscriptionGate, action: SubscriptionAction) -> anyhow::Result<()> {
    match action {
        SubscriptionAction::Status => {
            let state = gate.state();
            println!("Tier:    {}", state.tier);
            if let Some(expires) = state.expires_at {
                println!("Expires: {}", expires);
            }
            match gate.remaining_today() {
                Some(remaining) => println!("Quota:   {} analyses left today", remaining),
                None => println!("Quota:   unlimited"),
            }
            let limits = gate.limits();
            println!("Models:  {}", limits.allowed_models.join(", "));
            println!(
                "Formats: {}",
                limits
                    .download_formats
                    .iter()
                    .map(|f| f.extension())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        SubscriptionAction::Purchase => {
            if gate.purchase_subscription() {
                println!("Welcome to premium! Unlimited processing, all export formats.");
            } else {
                println!("Purchase failed. Please try again.");
            }
        }
        SubscriptionAction::Cancel => {
            if gate.cancel_subscription() {
                println!("Subscription cancelled. You are back on the free tier.");
            } else {
                println!("Cancellation failed. Please try again.");
            }
        }
        SubscriptionAction::Restore => {
            if gate.restore_purchases() {
                println!("Subscription restored.");
            } else {
                println!("No previous purchase found.");
            }
        }
    }

    Ok(())
}

fn cmd_config(settings: &Settings, config_path: Option<&std::path::Path>) -> anyhow::Result<()> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .or_else(Settings::default_path);
    if let Some(path) = path {
        println!("Config file: {}", path.display());
    }
    println!("History db:  {}", settings.resolve_history_path().display());
    println!();
    println!("Provider:     {}", Provider::parse(&settings.provider));
    println!("OpenAI model: {}", settings.openai.model);
    println!(
        "OpenAI key:   {}",
        redact(&settings.openai.api_key)
    );
    println!("Gemini model: {}", settings.gemini.model);
    println!(
        "Gemini key:   {}",
        redact(&settings.gemini.api_key)
    );
    println!(
        "Auto-process: {}",
        if settings.processing.enabled { "on" } else { "off" }
    );
    Ok(())
}

fn redact(key: &str) -> String {
    if key.trim().is_empty() {
        "(not set)".to_string()
    } else {
        format!("{}...", key.chars().take(6).collect::<String>())
    }
}
