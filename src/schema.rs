//! JSON Schema validation for definition documents.
//!
//! The bundled schema (`schema/intrinsic_definitions.schema.json`) is compiled
//! into the library. A schema on disk can be used instead; its
//! `schema_version` const must still be in the allowed set.

use crate::source::validate_schema_version;
use anyhow::{Context, Result, anyhow};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs::File;
use std::path::Path;

const BUNDLED_SCHEMA: &str = include_str!("../schema/intrinsic_definitions.schema.json");
const VERSION_POINTER: &str = "/properties/schema_version/const";

/// A compiled definitions schema.
pub struct DefinitionSchema {
    compiled: JSONSchema,
    schema_version: String,
}

impl DefinitionSchema {
    pub fn bundled() -> Result<Self> {
        let value: Value = serde_json::from_str(BUNDLED_SCHEMA).context("parsing bundled schema")?;
        Self::compile(&value, "bundled schema")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let value: Value = serde_json::from_reader(
            File::open(path).with_context(|| format!("opening schema {}", path.display()))?,
        )
        .with_context(|| format!("parsing schema {}", path.display()))?;
        Self::compile(&value, &path.display().to_string())
    }

    fn compile(value: &Value, origin: &str) -> Result<Self> {
        let schema_version = declared_version(value)
            .ok_or_else(|| anyhow!("{origin} missing schema_version const"))?;
        validate_schema_version(schema_version).with_context(|| format!("checking {origin}"))?;
        let compiled = JSONSchema::compile(value)
            .map_err(|err| anyhow!("compiling {origin}: {err}"))?;
        Ok(Self {
            compiled,
            schema_version: schema_version.to_string(),
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Validate `document`; on failure, one message per violation.
    pub fn validate(&self, document: &Value) -> Result<(), Vec<String>> {
        match self.compiled.validate(document) {
            Ok(()) => Ok(()),
            Err(errors) => Err(errors
                .map(|err| {
                    let path = err.instance_path.to_string();
                    if path.is_empty() {
                        err.to_string()
                    } else {
                        format!("{path}: {err}")
                    }
                })
                .collect()),
        }
    }
}

/// The version a schema pins documents to through its `schema_version` const.
fn declared_version(schema: &Value) -> Option<&str> {
    schema.pointer(VERSION_POINTER).and_then(Value::as_str)
}
