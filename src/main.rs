mod cli;
mod commands;

use vidcue::{
    config,
    report::{self, ClassifyReport, PlanReport},
};

use anyhow::Result;
use clap::Parser;
use cli::{AnimeCommands, Cli, Commands, TaskCommands};
use vc_client::ApiClient;
use vc_resolver::{ContentTypeProber, HeadProber, MediaLocator};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vidcue=debug,vc_resolver=debug,vc_client=debug,vc_core=debug".to_string()
        } else {
            "vidcue=info,vc_resolver=warn,vc_client=info,vc_core=info".to_string()
        }
    });

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.as_deref().or(cli.config.as_deref());
            return validate_config(path);
        }
        Commands::Version => {
            println!("vidcue {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    let mut config = config::load_config_or_default(cli.config.as_deref())?;
    config::apply_overrides(&mut config, cli.server.as_deref());
    let json = cli.json;

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Classify {
            url,
            probe,
            content_type,
        } => rt.block_on(classify_url(&url, &config, probe, content_type, json)),
        Commands::Plan {
            url,
            no_engine,
            native_adaptive,
            content_type,
        } => {
            if no_engine {
                config.playback.engine_available = false;
            }
            if native_adaptive {
                config.playback.native_adaptive = true;
            }
            plan_url(&url, &config, content_type.as_deref(), json)
        }
        Commands::Anime { command } => {
            let client = ApiClient::from_config(&config.api);
            rt.block_on(async {
                match command {
                    AnimeCommands::List { page } => commands::anime_list(&client, page, json).await,
                    AnimeCommands::Search { query } => {
                        commands::anime_search(&client, &query, json).await
                    }
                    AnimeCommands::Detail { id } => commands::anime_detail(&client, &id, json).await,
                }
            })
        }
        Commands::Tasks { command } => {
            let client = ApiClient::from_config(&config.api);
            rt.block_on(async {
                match command {
                    TaskCommands::List => commands::task_list(&client, json).await,
                    TaskCommands::Show { id } => commands::task_show(&client, id, json).await,
                    TaskCommands::Create {
                        anime_id,
                        title,
                        start,
                        end,
                        periodic,
                        at,
                    } => {
                        commands::task_create(&client, anime_id, title, start, end, periodic, at, json)
                            .await
                    }
                    TaskCommands::Execute { id } => commands::task_execute(&client, id).await,
                    TaskCommands::Delete { id } => commands::task_delete(&client, id).await,
                    TaskCommands::Results { id } => commands::task_results(&client, id, json).await,
                }
            })
        }
        Commands::Cached { anime_id, episode } => {
            let client = ApiClient::from_config(&config.api);
            rt.block_on(commands::cached(&client, anime_id.as_deref(), episode, json))
        }
        Commands::Refresh {
            anime_id,
            episode_id,
        } => {
            let client = ApiClient::from_config(&config.api);
            rt.block_on(commands::refresh(&client, &anime_id, &episode_id, json))
        }
        Commands::Validate { .. } | Commands::Version => Ok(()),
    }
}

async fn classify_url(
    url: &str,
    config: &config::Config,
    probe: bool,
    content_type: Option<String>,
    json: bool,
) -> Result<()> {
    let locator = MediaLocator::parse(url)?;

    let content_type = match content_type {
        Some(content_type) => Some(content_type),
        None if probe => {
            let prober = HeadProber::from_config(&config.api, &config.probe)?;
            match prober.probe(&locator).await {
                Ok(hint) => hint.map(|h| h.as_str().to_string()),
                Err(e) => {
                    tracing::warn!("Content-type probe failed, using URL only: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let report = ClassifyReport::new(locator, content_type.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let classification = &report.classification;
        println!("Locator: {}", report.locator);
        println!("Container: {}", classification.container());
        println!("MIME type: {}", classification.mime_type());
        println!("Adaptive streaming: {}", classification.is_adaptive_streaming());
        println!("Transport stream: {}", classification.is_transport_stream());
        if let Some(ref content_type) = report.content_type {
            println!("Content-Type: {}", content_type);
        } else if report.needs_probe {
            println!("Probe: recommended (use --probe to ask the server)");
        }
    }

    Ok(())
}

fn plan_url(url: &str, config: &config::Config, content_type: Option<&str>, json: bool) -> Result<()> {
    let locator = MediaLocator::parse(url)?;
    let report = report::plan(locator, config, content_type);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_plan(&report);
    }

    Ok(())
}

fn print_plan(report: &PlanReport) {
    println!("Locator: {}", report.locator);
    println!(
        "Environment: engine {}, native HLS {}",
        if report.environment.engine_usable() {
            "usable"
        } else {
            "unavailable"
        },
        if report.environment.native_adaptive {
            "yes"
        } else {
            "no"
        }
    );
    if let Some(ref content_type) = report.content_type {
        println!("Content-Type: {}", content_type);
    }

    println!("\nAttempts: {}", report.steps.len());
    for step in &report.steps {
        println!("  {}. {} as {}", step.attempt, step.strategy, step.classification);
        match step.target {
            report::AttemptTarget::Native { ref sources } => {
                println!(
                    "      <source src={} type={}>",
                    sources.primary.url, sources.primary.mime_type
                );
                for alternate in &sources.alternates {
                    println!("      <source src={} type={}>", alternate.url, alternate.mime_type);
                }
            }
            report::AttemptTarget::Engine {
                ref url,
                mime_type,
            } => {
                println!("      engine load {} ({})", url, mime_type);
            }
        }
    }

    if let Some(ref message) = report.exhausted_message {
        println!("\nIf every attempt fails: {}", message);
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  API: {} (timeout {}s)", config.api.base_url, config.api.timeout_secs);
    println!(
        "  Probe: {} (timeout {}s)",
        if config.probe.enabled { "enabled" } else { "disabled" },
        config.probe.timeout_secs
    );
    println!(
        "  Engine: available={} supported={}",
        config.playback.engine_available, config.playback.engine_supported
    );
    println!("  Native HLS: {}", config.playback.native_adaptive);
    println!("  Speculative alternates: {}", config.playback.speculative_alternates);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("  Warnings: {}", warnings.len());
        for warning in &warnings {
            println!("    - {}", warning);
        }
    }

    Ok(())
}
