//! Validate an intrinsic definitions document and report loader diagnostics.
//!
//! Usage:
//!   definitions-validate --file data/intrinsics_v1.json
//!   definitions-validate --schema my.schema.json < definitions.json
//!   definitions-validate --deny-warnings --file definitions.json
//!
//! Schema violations are fatal. Loader diagnostics (name conflicts, malformed
//! feature annotations) are printed and only fail the run with
//! `--deny-warnings`.

use anyhow::{Context, Result, bail};
use clap::Parser;
use intrinsics_dude::schema::DefinitionSchema;
use intrinsics_dude::{CatalogBuilder, ConflictPolicy, DefinitionSet, Severity};
use serde_json::Value;
use std::fs::File;
use std::io::{Read, stdin};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "definitions-validate")]
#[command(about = "Validate intrinsic definitions against the bundled JSON Schema")]
struct Cli {
    /// Optional input file; reads stdin when omitted.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Schema to validate against instead of the bundled one.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Conflict policy used when reporting duplicate names.
    #[arg(long, default_value_t = ConflictPolicy::FirstWins)]
    policy: ConflictPolicy,
    /// Exit non-zero when the loader reports any warning.
    #[arg(long)]
    deny_warnings: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<(String, String)> {
    let mut buf = String::new();
    let origin = if let Some(path) = file {
        File::open(path)
            .with_context(|| format!("opening input file {}", path.display()))?
            .read_to_string(&mut buf)
            .with_context(|| format!("reading input file {}", path.display()))?;
        path.display().to_string()
    } else {
        stdin()
            .read_to_string(&mut buf)
            .context("reading stdin for definitions JSON")?;
        "<stdin>".to_string()
    };
    Ok((buf, origin))
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::ERROR)
        .try_init();

    let (text, origin) = read_input(cli.file.as_ref())?;
    let document: Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {origin} as JSON"))?;

    let schema = match &cli.schema {
        Some(path) => DefinitionSchema::from_path(path)?,
        None => DefinitionSchema::bundled()?,
    };
    if let Err(errors) = schema.validate(&document) {
        bail!(
            "{origin} failed schema validation ({}):\n{}",
            schema.schema_version(),
            errors.join("\n")
        );
    }

    let set = DefinitionSet::from_json_str(&text, &origin)?;
    let catalog = CatalogBuilder::new().policy(cli.policy).build(&set);
    println!(
        "{origin}: {} records, {} entries, {} diagnostics",
        set.len(),
        catalog.len(),
        catalog.diagnostics().len()
    );
    for diagnostic in catalog.diagnostics() {
        println!("{diagnostic}");
    }

    let warnings = catalog.diagnostics().count(Severity::Warning);
    if cli.deny_warnings && warnings > 0 {
        bail!("{warnings} warning(s) reported for {origin}");
    }
    Ok(())
}
