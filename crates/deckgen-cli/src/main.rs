use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use deckgen_contracts::sizing::{size_for, supported_pairs, DEFAULT_ASPECT_RATIO, DEFAULT_RESOLUTION};
use deckgen_contracts::styles::StyleCatalog;
use deckgen_engine::config::{deadline_from_secs, parse_provider_order};
use deckgen_engine::http::HttpTransport;
use deckgen_engine::job::{DEFAULT_DECK_STYLE, DEFAULT_PAGE_COUNT};
use deckgen_engine::providers::provider_statuses;
use deckgen_engine::{DeckJob, DeckRequest, EngineConfig};
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_PARTIAL: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "deckgen",
    version,
    about = "Generate slide decks from a content brief with ordered image-provider fallback"
)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plan, render and save a deck.
    Generate(GenerateArgs),
    /// Show the provider priority order and which providers have credentials.
    Providers(ProvidersArgs),
    /// List style definitions.
    Styles(StylesArgs),
    /// Print the pixel size for an aspect ratio and resolution tier.
    Size(SizeArgs),
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long, required_unless_present = "content_file", conflicts_with = "content_file")]
    content: Option<String>,
    /// Read the brief from a file instead.
    #[arg(long)]
    content_file: Option<PathBuf>,
    #[arg(long, default_value_t = DEFAULT_PAGE_COUNT)]
    pages: usize,
    #[arg(long, default_value = DEFAULT_DECK_STYLE)]
    style: String,
    #[arg(long, default_value = DEFAULT_RESOLUTION)]
    resolution: String,
    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    aspect_ratio: String,
    /// Defaults to outputs/<timestamp>.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    events: Option<PathBuf>,
    /// Comma-separated priority order, e.g. glm,gemini,openrouter.
    #[arg(long)]
    providers: Option<String>,
    #[arg(long)]
    max_attempts: Option<usize>,
    /// Run deadline in seconds.
    #[arg(long)]
    deadline: Option<f64>,
    #[arg(long)]
    styles_dir: Option<PathBuf>,
    #[arg(long)]
    no_transitions: bool,
    /// Have GLM rewrite the brief into concise points before planning.
    #[arg(long)]
    optimize_content: bool,
}

#[derive(Debug, Parser)]
struct ProvidersArgs {
    #[arg(long)]
    providers: Option<String>,
}

#[derive(Debug, Parser)]
struct StylesArgs {
    #[arg(long)]
    styles_dir: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct SizeArgs {
    #[arg(long, default_value = DEFAULT_ASPECT_RATIO)]
    aspect_ratio: String,
    #[arg(long, default_value = DEFAULT_RESOLUTION)]
    resolution: String,
    /// Print the whole table instead.
    #[arg(long)]
    all: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("deckgen error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Providers(args) => run_providers(args),
        Command::Styles(args) => run_styles(args),
        Command::Size(args) => {
            run_size(&args);
            Ok(0)
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let content = match (&args.content, &args.content_file) {
        (Some(content), _) => content.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?,
        (None, None) => bail!("--content or --content-file is required"),
    };
    if content.trim().is_empty() {
        bail!("content brief is empty");
    }

    let mut config = EngineConfig::from_env()?;
    apply_overrides(&mut config, &args)?;

    let out_dir = args.out.clone().unwrap_or_else(|| {
        PathBuf::from("outputs").join(chrono::Local::now().format("%Y%m%d_%H%M%S").to_string())
    });
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| out_dir.join("events.jsonl"));

    let mut job = DeckJob::new(&out_dir, &events_path, config)?;
    if job.provider_names().is_empty() {
        tracing::warn!("no image provider has credentials; every slide will be missing");
    }
    let request = DeckRequest {
        content,
        page_count: args.pages,
        style: args.style.clone(),
        resolution: args.resolution.clone(),
        aspect_ratio: args.aspect_ratio.clone(),
        transitions: !args.no_transitions,
        optimize_content: args.optimize_content,
    };
    let outcome = job.generate(&request)?;

    println!("Output:  {}", outcome.out_dir.display());
    println!("Viewer:  {}", outcome.viewer_path.display());
    println!(
        "Slides:  {} saved, {} missing (providers: {})",
        outcome.saved_count(),
        outcome.missing_count(),
        if outcome.providers.is_empty() {
            "none".to_string()
        } else {
            outcome.providers.join(" -> ")
        }
    );
    if outcome.is_complete() {
        Ok(0)
    } else {
        let missing = outcome
            .missing_slides
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("Missing: {missing}");
        Ok(EXIT_PARTIAL)
    }
}

fn apply_overrides(config: &mut EngineConfig, args: &GenerateArgs) -> Result<()> {
    if let Some(raw) = args.providers.as_deref() {
        config.provider_order = parse_provider_order(raw)?;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts_per_item = Some(max_attempts.max(1));
    }
    if let Some(seconds) = args.deadline {
        config.deadline = Some(deadline_from_secs(seconds).context("invalid --deadline")?);
    }
    if let Some(dir) = args.styles_dir.clone() {
        config.styles_dir = dir;
    }
    Ok(())
}

fn run_providers(args: ProvidersArgs) -> Result<i32> {
    let mut config = EngineConfig::from_env()?;
    if let Some(raw) = args.providers.as_deref() {
        config.provider_order = parse_provider_order(raw)?;
    }
    let http = HttpTransport::new(&config.http)?;
    for (rank, status) in provider_statuses(&config, &http).iter().enumerate() {
        println!(
            "{}. {:<11} {}",
            rank + 1,
            status.kind.as_str(),
            if status.available {
                "available"
            } else {
                "missing credentials"
            }
        );
    }
    Ok(0)
}

fn run_styles(args: StylesArgs) -> Result<i32> {
    let config = EngineConfig::from_env()?;
    let dir = args.styles_dir.unwrap_or(config.styles_dir);
    let mut catalog = StyleCatalog::new(dir);
    for name in catalog.list() {
        let style = catalog.load(&name);
        if style.description.is_empty() {
            println!("{name}");
        } else {
            println!("{name:<20} {}", style.description);
        }
    }
    Ok(0)
}

fn run_size(args: &SizeArgs) {
    if args.all {
        for (aspect, tier, size) in supported_pairs() {
            println!("{aspect:<6} {tier:<6} {size}");
        }
        return;
    }
    println!("{}", size_for(&args.aspect_ratio, &args.resolution));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use clap::Parser;
    use deckgen_engine::{EngineConfig, ProviderKind};

    use super::{apply_overrides, Cli, Command};

    fn parse(args: &[&str]) -> anyhow::Result<Cli> {
        Ok(Cli::try_parse_from(args.iter().copied())?)
    }

    #[test]
    fn generate_defaults() -> anyhow::Result<()> {
        let cli = parse(&["deckgen", "generate", "--content", "Solar power"])?;
        let Command::Generate(args) = cli.command else {
            anyhow::bail!("expected generate");
        };
        assert_eq!(args.content.as_deref(), Some("Solar power"));
        assert_eq!(args.pages, 5);
        assert_eq!(args.style, "gradient-glass");
        assert_eq!(args.resolution, "2K");
        assert_eq!(args.aspect_ratio, "16:9");
        assert!(!args.no_transitions);
        assert!(!args.optimize_content);
        Ok(())
    }

    #[test]
    fn content_is_required_and_exclusive() {
        assert!(parse(&["deckgen", "generate"]).is_err());
        assert!(parse(&[
            "deckgen",
            "generate",
            "--content",
            "x",
            "--content-file",
            "brief.md"
        ])
        .is_err());
        assert!(parse(&["deckgen", "generate", "--content-file", "brief.md"]).is_ok());
    }

    #[test]
    fn overrides_replace_environment_settings() -> anyhow::Result<()> {
        let cli = parse(&[
            "deckgen",
            "generate",
            "--content",
            "x",
            "--providers",
            "gemini,dryrun",
            "--max-attempts",
            "0",
            "--deadline",
            "2.5",
            "--styles-dir",
            "/tmp/styles",
        ])?;
        let Command::Generate(args) = cli.command else {
            anyhow::bail!("expected generate");
        };
        let vars: HashMap<String, String> = HashMap::new();
        let mut config = EngineConfig::from_lookup(|key| vars.get(key).cloned())?;
        apply_overrides(&mut config, &args)?;
        assert_eq!(
            config.provider_order,
            vec![ProviderKind::Gemini, ProviderKind::Dryrun]
        );
        assert_eq!(config.max_attempts_per_item, Some(1));
        assert_eq!(config.deadline, Some(Duration::from_millis(2500)));
        assert_eq!(config.styles_dir, std::path::PathBuf::from("/tmp/styles"));
        Ok(())
    }

    #[test]
    fn bad_deadline_is_rejected() -> anyhow::Result<()> {
        let cli = parse(&["deckgen", "generate", "--content", "x", "--deadline", "0"])?;
        let Command::Generate(args) = cli.command else {
            anyhow::bail!("expected generate");
        };
        let vars: HashMap<String, String> = HashMap::new();
        let mut config = EngineConfig::from_lookup(|key| vars.get(key).cloned())?;
        assert!(apply_overrides(&mut config, &args).is_err());
        Ok(())
    }

    #[test]
    fn huge_deadline_is_clamped_instead_of_overflowing() -> anyhow::Result<()> {
        let cli = parse(&["deckgen", "generate", "--content", "x", "--deadline", "1e30"])?;
        let Command::Generate(args) = cli.command else {
            anyhow::bail!("expected generate");
        };
        let vars: HashMap<String, String> = HashMap::new();
        let mut config = EngineConfig::from_lookup(|key| vars.get(key).cloned())?;
        apply_overrides(&mut config, &args)?;
        assert_eq!(config.deadline, Some(Duration::from_secs(86_400)));
        Ok(())
    }
}
