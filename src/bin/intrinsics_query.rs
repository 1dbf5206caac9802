//! Query the intrinsic catalog from the command line.
//!
//! Usage:
//!   intrinsics-query lookup _mm512_mask_add_epi32
//!   intrinsics-query --target "sse sse2 avx" complete _mm256_add
//!   intrinsics-query info __m512i
//!   intrinsics-query signature _mm512_mask_add_epi32 --arg 1
//!   intrinsics-query --json list --category add
//!   intrinsics-query diagnostics
//!
//! Settings come from the `INTRINSICS_*` environment variables; flags win.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use intrinsics_dude::config::{ENV_COMPLETION_WIDTH, ENV_TOOLTIP_WIDTH, parse_width};
use intrinsics_dude::{Catalog, ConflictPolicy, EngineConfig, TargetFeatures, TokenClass};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "intrinsics-query")]
#[command(about = "Look up SIMD intrinsics, their descriptions and required CPU features")]
struct Cli {
    /// Definitions file (JSON document or summary listing) instead of the bundled set.
    #[arg(long)]
    definitions: Option<PathBuf>,
    /// Conflict policy for duplicate names: first_wins, last_wins or by_priority.
    #[arg(long, value_parser = clap::value_parser!(ConflictPolicy))]
    policy: Option<ConflictPolicy>,
    /// Enabled target features (comma/space list, or "all").
    #[arg(long)]
    target: Option<String>,
    #[arg(long)]
    tooltip_width: Option<String>,
    #[arg(long)]
    completion_width: Option<String>,
    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify a token and print its catalog entry.
    Lookup { token: String },
    /// Complete a partial identifier for the configured target.
    Complete { prefix: String },
    /// Print tooltip text for a token.
    Info { token: String },
    /// Print parameter help for a call to an intrinsic.
    Signature {
        token: String,
        /// Zero-based index of the argument being typed.
        #[arg(long, default_value_t = 0)]
        arg: usize,
    },
    /// List catalogued intrinsics.
    List {
        /// Only entries whose operation word matches, e.g. "add" or "cmplt".
        #[arg(long)]
        category: Option<String>,
        /// Only entries requiring this feature flag.
        #[arg(long)]
        feature: Option<String>,
    },
    /// Print diagnostics produced while loading the definitions.
    Diagnostics,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    let catalog = config.load_catalog().context("loading intrinsic definitions")?;

    match &cli.command {
        Command::Lookup { token } => lookup(&catalog, &config, token, cli.json),
        Command::Complete { prefix } => complete(&catalog, &config, prefix, cli.json),
        Command::Info { token } => info(&catalog, &config, token, cli.json),
        Command::Signature { token, arg } => signature(&catalog, token, *arg, cli.json),
        Command::List { category, feature } => {
            list(&catalog, category.as_deref(), feature.as_deref(), cli.json)
        }
        Command::Diagnostics => diagnostics(&catalog, cli.json),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .try_init();
}

fn resolve_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = &cli.definitions {
        config.definitions = Some(path.clone());
    }
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if let Some(raw) = &cli.target {
        let (target, issues) = TargetFeatures::from_list(raw);
        for issue in issues {
            tracing::warn!(flag = "--target", "{issue}");
        }
        config.target = target;
    }
    if let Some(raw) = &cli.tooltip_width {
        config.tooltip_width = parse_width(ENV_TOOLTIP_WIDTH, raw)?;
    }
    if let Some(raw) = &cli.completion_width {
        config.completion_width = parse_width(ENV_COMPLETION_WIDTH, raw)?;
    }
    Ok(config)
}

fn lookup(catalog: &Catalog, config: &EngineConfig, token: &str, as_json: bool) -> Result<()> {
    match catalog.classify_token(token) {
        Some(TokenClass::Intrinsic(entry)) => {
            let missing = entry.requirement.missing_from(&config.target);
            if as_json {
                let value = json!({
                    "class": "intrinsic",
                    "entry": entry,
                    "missing_features": missing,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{}", entry.signature());
                println!("{}", entry.description);
                if !missing.is_empty() {
                    println!("missing for target: {missing}");
                }
            }
        }
        Some(TokenClass::Register(ty)) => {
            if as_json {
                let value = json!({
                    "class": "register",
                    "register": ty,
                    "bits": ty.bits(),
                    "introduced_by": ty.introduced_by().as_str(),
                    "available": ty.is_available(&config.target),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{ty} ({}-bit, {})", ty.bits(), ty.introduced_by().as_str());
            }
        }
        None => bail!("'{token}' is not a known intrinsic or register type"),
    }
    Ok(())
}

fn complete(catalog: &Catalog, config: &EngineConfig, prefix: &str, as_json: bool) -> Result<()> {
    let items = catalog.complete(prefix, &config.target, config.completion_width);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            println!("{}", item.display);
        }
    }
    Ok(())
}

fn info(catalog: &Catalog, config: &EngineConfig, token: &str, as_json: bool) -> Result<()> {
    let Some(text) = catalog.quick_info(token, config.tooltip_width) else {
        bail!("'{token}' is not a known intrinsic or register type");
    };
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "token": token, "info": text }))?);
    } else {
        println!("{text}");
    }
    Ok(())
}

fn signature(catalog: &Catalog, token: &str, arg: usize, as_json: bool) -> Result<()> {
    let Some(help) = catalog.signature_help(token, arg) else {
        bail!("no prototype known for '{token}'");
    };
    if as_json {
        println!("{}", serde_json::to_string_pretty(&help)?);
        return Ok(());
    }
    println!("{}", help.label);
    match help.active_parameter.and_then(|i| help.parameters.get(i)) {
        Some(param) => println!(
            "{}{}",
            " ".repeat(help.label[..param.start].chars().count()),
            "^".repeat(param.label.chars().count())
        ),
        None => println!("(no parameter {arg}; {} expected)", help.parameters.len()),
    }
    println!("{}", help.documentation);
    Ok(())
}

fn list(
    catalog: &Catalog,
    category: Option<&str>,
    feature: Option<&str>,
    as_json: bool,
) -> Result<()> {
    let entries: Vec<_> = catalog
        .entries()
        .iter()
        .filter(|entry| {
            category.is_none_or(|op| entry.category.operation.eq_ignore_ascii_case(op))
        })
        .filter(|entry| feature.is_none_or(|flag| entry.requirement.requires(flag)))
        .collect();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in entries {
            println!("{}", entry.signature());
        }
    }
    Ok(())
}

fn diagnostics(catalog: &Catalog, as_json: bool) -> Result<()> {
    if as_json {
        let value = json!({
            "source": catalog.source(),
            "entries": catalog.len(),
            "diagnostics": catalog.diagnostics(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let source = catalog.source();
        println!(
            "{}: {} records, {} entries, {} diagnostics",
            source.origin,
            source.records,
            catalog.len(),
            catalog.diagnostics().len()
        );
        for diagnostic in catalog.diagnostics() {
            println!("{diagnostic}");
        }
    }
    Ok(())
}
