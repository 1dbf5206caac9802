#![allow(dead_code)]

use anyhow::{Context, Result};
use intrinsics_dude::{DefinitionSet, RawDefinition};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

pub const CMPLT_SUMMARY: &str = "Compare packed signed 32-bit integers in a and b for less-than, and store the results in mask vector k.";

/// The shipped shadowing case: an AVX512F record re-declared for Knights Corner.
pub fn cmplt_records() -> Vec<RawDefinition> {
    vec![
        RawDefinition::new(
            "_mm512_cmplt_epi32_mask",
            format!("{CMPLT_SUMMARY} (AVX512F)"),
        ),
        RawDefinition::new(
            "_mm512_add_epi32",
            "Add packed 32-bit integers in a and b, and store the results in dst. (AVX512F)",
        ),
        RawDefinition::new(
            "_mm512_cmplt_epi32_mask",
            format!("{CMPLT_SUMMARY} (KNCNI)"),
        ),
    ]
}

pub fn cmplt_set() -> DefinitionSet {
    DefinitionSet::from_records("fixture", cmplt_records())
}

pub fn definitions_document(records: &[RawDefinition]) -> Value {
    json!({
        "schema_version": "intrinsic_definitions_v1",
        "version": "fixture",
        "definitions": records,
    })
}

pub fn write_definitions(dir: &Path, file_name: &str, records: &[RawDefinition]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(&definitions_document(records))?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn write_text(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
