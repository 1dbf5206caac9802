//! Environment-driven engine settings.
//!
//! | variable                      | meaning                                        |
//! |-------------------------------|------------------------------------------------|
//! | `INTRINSICS_TARGET_FEATURES`  | comma/space list of enabled flags, or `all`    |
//! | `INTRINSICS_TOOLTIP_WIDTH`    | wrap width for quick info                      |
//! | `INTRINSICS_COMPLETION_WIDTH` | crop width for completion display text         |
//! | `INTRINSICS_CONFLICT_POLICY`  | `first_wins`, `last_wins` or `by_priority`     |
//! | `INTRINSICS_DEFINITIONS`      | definitions file to use instead of the bundle  |
//!
//! When `INTRINSICS_DEFINITIONS` is unset, a path baked in at build time via
//! `INTRINSICS_DEFINITIONS_HINT` is used if it exists.

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::feature::TargetFeatures;
use crate::loader::ConflictPolicy;
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

pub const ENV_TARGET_FEATURES: &str = "INTRINSICS_TARGET_FEATURES";
pub const ENV_TOOLTIP_WIDTH: &str = "INTRINSICS_TOOLTIP_WIDTH";
pub const ENV_COMPLETION_WIDTH: &str = "INTRINSICS_COMPLETION_WIDTH";
pub const ENV_CONFLICT_POLICY: &str = "INTRINSICS_CONFLICT_POLICY";
pub const ENV_DEFINITIONS: &str = "INTRINSICS_DEFINITIONS";

pub const DEFAULT_TOOLTIP_WIDTH: usize = 150;
pub const DEFAULT_COMPLETION_WIDTH: usize = 150;
const MIN_WIDTH: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub target: TargetFeatures,
    pub tooltip_width: usize,
    pub completion_width: usize,
    pub policy: ConflictPolicy,
    pub definitions: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target: TargetFeatures::All,
            tooltip_width: DEFAULT_TOOLTIP_WIDTH,
            completion_width: DEFAULT_COMPLETION_WIDTH,
            policy: ConflictPolicy::default(),
            definitions: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or blank values keep
    /// their defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_TARGET_FEATURES) {
            let (target, issues) = TargetFeatures::from_list(&raw);
            for issue in issues {
                tracing::warn!(variable = ENV_TARGET_FEATURES, "{issue}");
            }
            config.target = target;
        }
        if let Some(raw) = get(ENV_TOOLTIP_WIDTH) {
            config.tooltip_width = parse_width(ENV_TOOLTIP_WIDTH, &raw)?;
        }
        if let Some(raw) = get(ENV_COMPLETION_WIDTH) {
            config.completion_width = parse_width(ENV_COMPLETION_WIDTH, &raw)?;
        }
        if let Some(raw) = get(ENV_CONFLICT_POLICY) {
            config.policy = raw
                .parse::<ConflictPolicy>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("parsing {ENV_CONFLICT_POLICY}"))?;
        }
        config.definitions = get(ENV_DEFINITIONS)
            .map(PathBuf::from)
            .or_else(definitions_hint);

        Ok(config)
    }

    /// Load the catalog this configuration points at.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        let catalog = match &self.definitions {
            Some(path) => Catalog::from_path(path, self.policy)?,
            None => Catalog::builtin(self.policy)?,
        };
        catalog.diagnostics().emit();
        Ok(catalog)
    }
}

pub fn parse_width(variable: &str, raw: &str) -> Result<usize> {
    let width: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{variable} must be a positive integer, got '{raw}'"))?;
    if width < MIN_WIDTH {
        bail!("{variable} must be at least {MIN_WIDTH}, got {width}");
    }
    Ok(width)
}

fn definitions_hint() -> Option<PathBuf> {
    let hint = option_env!("INTRINSICS_DEFINITIONS_HINT")?;
    let path = PathBuf::from(hint);
    path.is_file().then_some(path)
}
