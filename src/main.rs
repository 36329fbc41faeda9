//! deskflow - Desktop Activity Recorder
//!
//! Records desktop interaction sessions and turns them into workflow
//! summaries and automation suggestions.

use deskflow::analyzer::session::ActivityAnalyzer;
use deskflow::analyzer::PatternFinding;
use deskflow::app::cli::{Cli, Commands, ConfigAction};
use deskflow::app::config::Config;
use deskflow::capture::screen::ScreenRecorder;
use deskflow::capture::tracker::{EventTracker, TrackerConfig};
use deskflow::llm::OllamaClient;
use deskflow::store::DataStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    let store = DataStore::new(config.data_root());

    match cli.command {
        Commands::Record {
            duration,
            session,
            fresh,
            no_llm,
        } => {
            run_record(duration, session, fresh, no_llm, &store, &config)?;
        }
        Commands::Analyze { session } => {
            run_analyze(session.as_deref(), &store, &config)?;
        }
        Commands::Suggest { session } => {
            run_suggest(session.as_deref(), &store, &config)?;
        }
        Commands::List { detailed } => {
            run_list(detailed, &store)?;
        }
        Commands::Clean { force } => {
            run_clean(force, &store)?;
        }
        Commands::Init { force } => {
            run_init(force, &store, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_record(
    duration: u64,
    session: Option<String>,
    fresh: bool,
    no_llm: bool,
    store: &DataStore,
    config: &Config,
) -> anyhow::Result<()> {
    if fresh {
        let deleted = store.clear_all()?;
        info!("Cleared previous data ({} loose files)", deleted);
    }
    store.ensure_dirs()?;

    let session_id = session.unwrap_or_else(DataStore::new_session_id);
    info!("Recording session {}", session_id);

    let mut screen = ScreenRecorder::new(
        store.screenshots_dir(),
        std::time::Duration::from_secs(config.capture.screenshot_interval_secs),
    );
    screen.start()?;

    let mut tracker = EventTracker::new(
        store.event_store(&session_id),
        TrackerConfig {
            ring_capacity: config.capture.ring_buffer_size,
            flush_every_events: config.capture.flush_every_events,
        },
    );
    tracker.start()?;

    if duration > 0 {
        info!("Recording for {} seconds (Ctrl+C to stop early)", duration);
    } else {
        info!("Recording until Ctrl+C");
    }

    let stop_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, std::sync::atomic::Ordering::SeqCst);
    })?;

    let start_time = std::time::Instant::now();
    loop {
        if stop_flag.load(std::sync::atomic::Ordering::SeqCst) {
            break;
        }
        if duration > 0 && start_time.elapsed().as_secs() >= duration {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    tracker.stop();
    let screenshots = screen.stop();

    info!(
        "Recording stopped after {:.1}s ({} events, {} screenshots)",
        start_time.elapsed().as_secs_f64(),
        tracker.events_written(),
        screenshots
    );

    analyze_and_report(&session_id, store, config, !no_llm)
}

fn run_analyze(session: Option<&str>, store: &DataStore, config: &Config) -> anyhow::Result<()> {
    let session_id = resolve_session(session, store)?;
    analyze_and_report(&session_id, store, config, false)
}

fn run_suggest(session: Option<&str>, store: &DataStore, config: &Config) -> anyhow::Result<()> {
    let session_id = resolve_session(session, store)?;
    analyze_and_report(&session_id, store, config, true)
}

/// Run the analysis pipeline for one session: snapshot, pattern findings,
/// and (optionally) LLM suggestions, each persisted next to the session
/// data.
fn analyze_and_report(
    session_id: &str,
    store: &DataStore,
    config: &Config,
    with_llm: bool,
) -> anyhow::Result<()> {
    let analyzer = ActivityAnalyzer::new(store.clone())
        .with_segmenter(config.analysis.segmenter())
        .with_patterns(config.analysis.patterns());

    let summary = analyzer.generate(Some(session_id))?;
    let workflow_path = store.workflow_path(session_id);
    summary.save(&workflow_path)?;
    info!("Workflow saved to {}", workflow_path.display());

    println!("Session {}", session_id);
    println!("  Events:      {}", summary.summary.total_events);
    println!("  Screenshots: {}", summary.summary.total_screenshots);
    println!("  Transcripts: {}", summary.summary.total_transcripts);
    println!("  Steps:       {}", summary.workflow_steps.len());

    let findings = analyzer.findings(&summary.events);
    if findings.is_empty() {
        println!("No patterns detected.");
    } else {
        println!("Patterns:");
        for finding in &findings {
            println!("  - {finding}");
        }
    }

    if !with_llm {
        return Ok(());
    }

    println!("Generating automation suggestions (this may take 30-60 seconds)...");
    let client = OllamaClient::from_config(&config.llm)?;

    let timeline_path = store.timeline_path(session_id);
    std::fs::write(&timeline_path, client.build_prompt(&summary))?;
    info!("Timeline saved to {}", timeline_path.display());

    let runtime = tokio::runtime::Runtime::new()?;
    let suggestions = match runtime.block_on(client.generate_suggestions(&summary)) {
        Ok(text) => text,
        Err(e) => {
            warn!("{e}");
            format!("Error connecting to Ollama: {e}")
        }
    };

    let suggestions_path = store.suggestions_path(session_id);
    std::fs::write(
        &suggestions_path,
        render_suggestions_report(&suggestions, &findings),
    )?;
    info!("Suggestions saved to {}", suggestions_path.display());

    println!("{}", "=".repeat(60));
    println!("AUTOMATION SUGGESTIONS:");
    println!("{}", "=".repeat(60));
    println!("{suggestions}");

    Ok(())
}

/// Side-by-side report of LLM suggestions and rule-based pattern findings.
fn render_suggestions_report(suggestions: &str, findings: &[PatternFinding]) -> String {
    let bar = "=".repeat(60);
    let rule = "-".repeat(60);
    let patterns = if findings.is_empty() {
        "No patterns detected.".to_string()
    } else {
        findings
            .iter()
            .map(PatternFinding::render)
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{bar}\nAUTOMATION SUGGESTIONS - COMPARISON\n{bar}\n\n\
         LLM-BASED SUGGESTIONS:\n{rule}\n{suggestions}\n\n{bar}\n\n\
         HYBRID PATTERN DETECTION:\n{rule}\n{patterns}\n\n{bar}\n"
    )
}

fn resolve_session(session: Option<&str>, store: &DataStore) -> anyhow::Result<String> {
    match session {
        Some(id) => Ok(id.to_string()),
        None => store
            .latest_session()?
            .ok_or_else(|| anyhow::anyhow!("No recorded sessions. Run 'deskflow record' first.")),
    }
}

fn run_list(detailed: bool, store: &DataStore) -> anyhow::Result<()> {
    let sessions = store.list_sessions()?;

    if sessions.is_empty() {
        println!("No sessions found in {}", store.root().display());
        println!("Start a recording with: deskflow record");
        return Ok(());
    }

    println!("Sessions in {}:", store.root().display());
    for session in &sessions {
        if detailed {
            let events = store.event_store(session).load().unwrap_or_default();
            let analyzed = store.workflow_path(session).exists();
            println!(
                "  {}  ({} events{})",
                session,
                events.len(),
                if analyzed { ", analyzed" } else { "" }
            );
        } else {
            println!("  {session}");
        }
    }

    Ok(())
}

fn run_clean(force: bool, store: &DataStore) -> anyhow::Result<()> {
    let sessions = store.list_sessions()?;
    let screenshots = store.screenshots()?;

    if !force {
        println!(
            "Will delete {} session(s), {} screenshot(s), and all analysis output in {}",
            sessions.len(),
            screenshots.len(),
            store.root().display()
        );
        println!("Re-run with --force to delete");
        return Ok(());
    }

    let deleted = store.clear_all()?;
    println!(
        "Deleted {} session(s), {} screenshot(s), {} analysis file(s)",
        sessions.len(),
        screenshots.len(),
        deleted
    );

    Ok(())
}

fn run_init(force: bool, store: &DataStore, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    store.ensure_dirs()?;
    println!("Created data directories under {}", store.root().display());

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = config.to_toml()?;
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", toml_str);
        }
        ConfigAction::Get { key } => {
            let table: toml::Table = config.to_toml()?.parse()?;
            match find_toml_value(&table, &key) {
                Some(v) => println!("{} = {}", key, v),
                None => {
                    anyhow::bail!("Configuration key '{}' not found", key);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let config_path = Config::default_path();
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'deskflow init' first.");
            }

            let mut table: toml::Table = std::fs::read_to_string(&config_path)?.parse()?;
            if !set_toml_value(&mut table, &key, &value) {
                anyhow::bail!(
                    "Failed to set '{}'. Key may not exist, or the value has the wrong type.",
                    key
                );
            }

            // Round-trip through Config so a value that parses as TOML but
            // fails validation never reaches the file
            let rendered = toml::to_string(&table)?;
            let updated: Config = toml::from_str(&rendered)?;
            updated.validate()?;

            std::fs::write(&config_path, rendered)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            let default_config = Config::default();
            default_config.save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}

/// Look up a dotted key (`llm.model`, `analysis.repeat_threshold`) in a
/// parsed TOML document.
fn find_toml_value<'a>(table: &'a toml::Table, key: &str) -> Option<&'a toml::Value> {
    let mut current: Option<&toml::Value> = None;
    for part in key.split('.') {
        current = Some(match current {
            None => table.get(part)?,
            Some(value) => value.as_table()?.get(part)?,
        });
    }
    current
}

/// Set a dotted key in a parsed TOML document, coercing the raw string to
/// the type of the value already there.
///
/// Only existing keys can be set, so a typo never grows the config.
/// Returns false when the key is missing or the value does not parse as
/// the expected type.
fn set_toml_value(table: &mut toml::Table, key: &str, raw: &str) -> bool {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        return false;
    };

    let mut current = table;
    for part in sections {
        match current.get_mut(*part).and_then(toml::Value::as_table_mut) {
            Some(nested) => current = nested,
            None => return false,
        }
    }

    let Some(slot) = current.get_mut(*leaf) else {
        return false;
    };
    match coerce_toml_value(raw, slot) {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Parse `raw` as the same scalar type as `like`.
fn coerce_toml_value(raw: &str, like: &toml::Value) -> Option<toml::Value> {
    use toml::Value;
    match like {
        Value::String(_) => Some(Value::String(raw.to_string())),
        Value::Integer(_) => raw.parse().ok().map(Value::Integer),
        Value::Float(_) => raw.parse().ok().map(Value::Float),
        Value::Boolean(_) => raw.parse().ok().map(Value::Boolean),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_table() -> toml::Table {
        Config::default().to_toml().unwrap().parse().unwrap()
    }

    #[test]
    fn test_find_toml_value_nested_key() {
        let table = config_table();
        let value = find_toml_value(&table, "llm.model").unwrap();
        assert_eq!(value.as_str(), Some("tinyllama"));

        let value = find_toml_value(&table, "analysis.repeat_threshold").unwrap();
        assert_eq!(value.as_integer(), Some(3));
    }

    #[test]
    fn test_find_toml_value_missing_key() {
        let table = config_table();
        assert!(find_toml_value(&table, "llm.nonexistent").is_none());
        assert!(find_toml_value(&table, "nonexistent.model").is_none());
    }

    #[test]
    fn test_set_toml_value_string_stays_valid_toml() {
        // string values must come back quoted, otherwise the rewritten
        // file no longer parses and every later command fails at startup
        let mut table = config_table();
        assert!(set_toml_value(&mut table, "llm.model", "llama3"));

        let rendered = toml::to_string(&table).unwrap();
        let reloaded: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded.llm.model, "llama3");
        assert!(reloaded.validate().is_ok());
    }

    #[test]
    fn test_set_toml_value_integer_coerced() {
        let mut table = config_table();
        assert!(set_toml_value(&mut table, "analysis.repeat_threshold", "5"));

        let rendered = toml::to_string(&table).unwrap();
        let reloaded: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded.analysis.repeat_threshold, 5);
    }

    #[test]
    fn test_set_toml_value_rejects_wrong_type() {
        let mut table = config_table();
        assert!(!set_toml_value(
            &mut table,
            "analysis.repeat_threshold",
            "lots"
        ));
    }

    #[test]
    fn test_set_toml_value_rejects_unknown_key() {
        let mut table = config_table();
        assert!(!set_toml_value(&mut table, "llm.temperature", "0.7"));
        assert!(!set_toml_value(&mut table, "nonsense.model", "llama3"));
    }
}
