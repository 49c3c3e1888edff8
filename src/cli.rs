// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - config --show|--path|--reset: configuration management
// - render <tag>: mount a view against the API and print its markup
// - list <resource>: print records of one collection
// - health: query the API health endpoint
// - serve: static server for component assets (the default)
// - components: list registered component tags

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::sync::Arc;

use crate::api::agents::Agent;
use crate::api::knowledge_base::KnowledgeBase;
use crate::api::llm::LlmConfig;
use crate::api::tools::Tool;
use crate::api::{chat, health, resource, ApiClient, ClientConfig, RequestOptions};
use crate::config::{Config, VERSION};
use crate::lifecycle::ComponentLoader;
use crate::registry::{AppContext, ComponentRegistry};
use crate::report::{ErrorReporter, RecordingReporter, TracingReporter};
use crate::resource::{FileFetcher, HttpFetcher, ResourceFetcher, ResourcePaths};

/// viki-ui - component runtime and admin console for the Viki agent service
#[derive(Parser)]
#[command(name = "viki-ui")]
#[command(version = VERSION)]
#[command(about = "Component runtime and admin console for the Viki agent service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
    /// Mount a component and print its rendered markup
    Render {
        /// Component tag, e.g. viki-llm-canvas
        tag: String,
    },
    /// List records of a collection
    List {
        #[arg(value_enum)]
        resource: Collection,
    },
    /// Check the API health endpoint
    Health,
    /// Serve component assets over HTTP
    Serve,
    /// List registered component tags
    Components,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Collection {
    Llm,
    Tools,
    KnowledgeBases,
    Agents,
    Sessions,
}

/// Handle `config` without loading the configuration first.
/// Returns true if the command was handled (exit after).
pub fn handle_config_command(command: &Option<Commands>) -> bool {
    let Some(Commands::Config { show, reset, path }) = command else {
        return false;
    };
    if *path {
        handle_config_path();
    } else if *show {
        handle_config_show();
    } else if *reset {
        handle_config_reset();
    } else {
        println!("Usage: viki-ui config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    true
}

/// Run every command other than `config`; no subcommand serves assets
pub async fn run(command: Option<Commands>, config: Config) -> Result<()> {
    match command.unwrap_or(Commands::Serve) {
        Commands::Config { .. } => Ok(()),
        Commands::Render { tag } => render(&config, &tag).await,
        Commands::List { resource } => list(&config, resource).await,
        Commands::Health => check_health(&config).await,
        Commands::Serve => {
            crate::serve::run(
                config.serve.bind_addr,
                config.app_root.clone(),
                &ComponentRegistry::with_defaults(),
                shutdown_signal(),
            )
            .await
        }
        Commands::Components => {
            for tag in ComponentRegistry::with_defaults().tags() {
                println!("{}", tag);
            }
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Application bootstrap
// ─────────────────────────────────────────────────────────────────────────────

pub fn api_client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(ClientConfig::new(&config.api_url).with_timeout(config.http.timeout()))
        .context("Failed to build API client")
}

/// Wire fetcher, loader and API client from the configuration
pub fn app_context(config: &Config, reporter: Arc<dyn ErrorReporter>) -> Result<AppContext> {
    let fetcher: Arc<dyn ResourceFetcher> = match &config.asset_url {
        Some(url) => Arc::new(
            HttpFetcher::new(url.as_str(), config.http.timeout())
                .context("Failed to build asset client")?,
        ),
        None => Arc::new(FileFetcher::new(&config.app_root)),
    };
    tracing::debug!(fetcher = %fetcher.describe(), "Component assets");

    let loader = ComponentLoader::new(fetcher, ResourcePaths::default(), reporter);
    Ok(AppContext::new(
        loader,
        api_client(config)?,
        config.lifecycle.init_options(),
    ))
}

async fn render(config: &Config, tag: &str) -> Result<()> {
    let reports = RecordingReporter::forwarding(Arc::new(TracingReporter));
    let ctx = app_context(config, Arc::new(reports.clone()))?;
    let view = ComponentRegistry::with_defaults().create(tag, &ctx)?;

    let mounted = view.mount().await;
    for report in reports.reports() {
        eprintln!("[{}] {}: {}", report.kind, report.component, report.message);
    }
    mounted.with_context(|| format!("Failed to render {}", tag))?;

    println!("{}", view.html());
    view.unmount();
    Ok(())
}

fn print_rows(rows: impl IntoIterator<Item = (String, String)>) {
    let mut count = 0;
    for (key, label) in rows {
        println!("{}\t{}", key, label);
        count += 1;
    }
    if count == 0 {
        eprintln!("(none)");
    }
}

async fn list(config: &Config, collection: Collection) -> Result<()> {
    let api = api_client(config)?;
    let all = RequestOptions::new;
    let context = || format!("Failed to list {:?}", collection);

    match collection {
        Collection::Llm => {
            let rows = resource::list::<LlmConfig>(&api, all()).await.with_context(context)?;
            print_rows(rows.into_iter().map(|c| {
                let label = format!("{} {}", c.llc_provider_type_cd, c.llc_model_cd);
                (c.llc_id, label)
            }));
        }
        Collection::Tools => {
            let rows = resource::list::<Tool>(&api, all()).await.with_context(context)?;
            print_rows(rows.into_iter().map(|t| (t.tol_id, t.tol_name)));
        }
        Collection::KnowledgeBases => {
            let rows = resource::list::<KnowledgeBase>(&api, all())
                .await
                .with_context(context)?;
            print_rows(rows.into_iter().map(|k| (k.knb_id, k.knb_name)));
        }
        Collection::Agents => {
            let rows = resource::list::<Agent>(&api, all()).await.with_context(context)?;
            print_rows(rows.into_iter().map(|a| (a.agt_id, a.agt_name)));
        }
        Collection::Sessions => {
            let rows = chat::sessions(&api, None, 0, 100).await.with_context(context)?;
            print_rows(
                rows.into_iter()
                    .map(|s| (s.cht_id, format!("{} ({})", s.cht_name, s.cht_agt_id))),
            );
        }
    }
    Ok(())
}

async fn check_health(config: &Config) -> Result<()> {
    let api = api_client(config)?;
    let status = health::check(&api)
        .await
        .with_context(|| format!("API unreachable at {}", config.api_url))?;
    println!(
        "{} {}",
        status.status,
        status.version.as_deref().unwrap_or("(no version)")
    );
    if !status.is_healthy() {
        anyhow::bail!("API reports status {}", status.status);
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────────────────

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err() || !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return;
        }
    }

    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        }
    }

    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::testing::Harness;

    #[test]
    fn test_parses_subcommands() {
        let cli = Cli::try_parse_from(["viki-ui", "list", "knowledge-bases"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::List {
                resource: Collection::KnowledgeBases
            })
        ));

        let cli = Cli::try_parse_from(["viki-ui", "render", "viki-chat-canvas"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Render { tag }) if tag == "viki-chat-canvas"));

        assert!(Cli::try_parse_from(["viki-ui", "list", "users"]).is_err());
        assert!(Cli::try_parse_from(["viki-ui"]).unwrap().command.is_none());
    }

    #[test]
    fn test_config_command_is_only_handled_for_config() {
        assert!(!handle_config_command(&None));
        assert!(!handle_config_command(&Some(Commands::Components)));
    }

    #[tokio::test]
    async fn test_app_context_reads_components_from_app_root() {
        let h = Harness::new().await;
        h.seed_tool("fs", "Filesystem");

        let mut config = Config::default();
        config.app_root = env!("CARGO_MANIFEST_DIR").into();
        config.api_url = h.backend.client().config().base_url.clone();

        let reporter = RecordingReporter::new();
        let ctx = app_context(&config, Arc::new(reporter.clone())).unwrap();
        let view = ComponentRegistry::with_defaults()
            .create("viki-tools-canvas", &ctx)
            .unwrap();
        view.mount().await.unwrap();

        assert!(view.html().contains("Filesystem"));
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_api() {
        let mut config = Config::default();
        config.api_url = "http://127.0.0.1:9".to_string();
        config.http.timeout_secs = 1;
        let err = check_health(&config).await.unwrap_err();
        assert!(err.to_string().starts_with("API unreachable"));
    }
}
