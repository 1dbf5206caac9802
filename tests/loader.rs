// Loading definition sets from disk and resolving conflicts between records.
mod support;
#[path = "support/common.rs"]
mod common;

use anyhow::Result;
use intrinsics_dude::{
    Catalog, CatalogError, ConflictPolicy, DefinitionSet, DiagnosticKind, EngineConfig,
    RawDefinition, Severity,
};
use tempfile::TempDir;

use common::{CMPLT_SUMMARY, cmplt_records, write_definitions, write_text};

#[test]
fn json_file_round_trips_through_catalog() -> Result<()> {
    support::init_tracing();
    let dir = TempDir::new()?;
    let path = write_definitions(dir.path(), "defs.json", &cmplt_records())?;

    let catalog = Catalog::from_path(&path, ConflictPolicy::FirstWins)?;
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.source().records, 3);
    assert_eq!(catalog.source().version.as_deref(), Some("fixture"));
    assert_eq!(
        catalog.describe("_mm512_cmplt_epi32_mask"),
        Some(CMPLT_SUMMARY)
    );
    Ok(())
}

#[test]
fn priority_policy_prefers_higher_priority() -> Result<()> {
    let dir = TempDir::new()?;
    let records = vec![
        RawDefinition::new("_mm512_cmplt_epi32_mask", format!("{CMPLT_SUMMARY} (AVX512F)")),
        RawDefinition::new("_mm512_cmplt_epi32_mask", format!("{CMPLT_SUMMARY} (KNCNI)"))
            .with_priority(5),
        RawDefinition::new("_mm512_cmplt_epi32_mask", format!("{CMPLT_SUMMARY} (AVX512BW)"))
            .with_priority(5),
    ];
    let path = write_definitions(dir.path(), "defs.json", &records)?;

    let catalog = Catalog::from_path(&path, ConflictPolicy::ByPriority)?;
    let features = catalog
        .required_features("_mm512_cmplt_epi32_mask")
        .expect("present");
    assert_eq!(features.to_string(), "KNCNI");

    let kinds: Vec<_> = catalog.diagnostics().conflicts().map(|d| d.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::DefinitionConflict { kept: 1, discarded: 0 },
            DiagnosticKind::DefinitionConflict { kept: 1, discarded: 2 },
        ]
    );
    Ok(())
}

// Listing files carry commented-out records; they must reach the conflict
// policy instead of being skipped by the parser.
#[test]
fn listing_file_reports_commented_duplicates() -> Result<()> {
    let dir = TempDir::new()?;
    let listing = format!(
        "\
public enum Intrinsic {{
    ///<summary>{CMPLT_SUMMARY} (AVX512F)</summary>
    _MM512_CMPLT_EPI32_MASK,
    ///<summary>Reverse the byte order of 32-bit integer a. ()</summary>
    _BSWAP,
    //    ///<summary>{CMPLT_SUMMARY} (KNCNI)</summary>
    //    _MM512_CMPLT_EPI32_MASK,
}}
"
    );
    let path = write_text(dir.path(), "Intrinsic.cs", &listing)?;

    let catalog = Catalog::from_path(&path, ConflictPolicy::FirstWins)?;
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.source().schema_version, "summary_listing");
    assert!(catalog.required_features("_bswap").expect("present").is_empty());
    assert_eq!(catalog.diagnostics().conflicts().count(), 1);
    Ok(())
}

#[test]
fn malformed_annotations_are_admitted_best_effort() -> Result<()> {
    let set = DefinitionSet::from_records(
        "inline",
        vec![
            RawDefinition::new("_mm256_fmadd_ps", "Fused multiply-add. (AVX2 FMA)"),
            RawDefinition::new("_mm_crc32_u8", "Accumulate a CRC32 value. (sse4_2)"),
            RawDefinition::new("_mm_future_op", "Something new. (AVX10_2, AVX512F)"),
        ],
    );
    let catalog = intrinsics_dude::CatalogBuilder::new().build(&set);
    assert_eq!(catalog.len(), 3);

    assert!(catalog.required_features("_mm256_fmadd_ps").expect("present").is_empty());
    assert!(
        catalog
            .required_features("_mm_crc32_u8")
            .expect("present")
            .requires("SSE4.2")
    );
    let future = catalog.required_features("_mm_future_op").expect("present");
    assert_eq!(future.len(), 2);

    let labels: Vec<&str> = catalog.diagnostics().iter().map(|d| d.kind.label()).collect();
    assert_eq!(labels, vec!["malformed_annotation", "unknown_feature"]);
    assert_eq!(catalog.diagnostics().count(Severity::Info), 1);
    Ok(())
}

// One unreadable record must not take the rest of the file down with it.
#[test]
fn unreadable_records_do_not_sink_the_catalog() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_text(
        dir.path(),
        "partial.json",
        r#"{
  "schema_version": "intrinsic_definitions_v1",
  "definitions": [
    {"name": "_mm_add_ps", "summary": "Add packed single-precision elements. (SSE)"},
    {"name": "_mm_sub_ps"},
    {"name": "_mm_mul_ps", "summary": "Multiply. (SSE)", "priority": 4000000000},
    {"name": ["_mm_div_ps"], "summary": "Divide. (SSE)"}
  ]
}"#,
    )?;

    let catalog = Catalog::from_path(&path, ConflictPolicy::FirstWins)?;
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.source().records, 4);
    assert!(catalog.required_features("_mm_add_ps").expect("present").requires("SSE"));

    let reported: Vec<(usize, &str, &str)> = catalog
        .diagnostics()
        .iter()
        .map(|d| (d.record, d.name.as_str(), d.kind.label()))
        .collect();
    assert_eq!(
        reported,
        vec![
            (1, "_mm_sub_ps", "malformed_record"),
            (2, "_mm_mul_ps", "malformed_record"),
            (3, "", "malformed_record"),
        ]
    );
    assert_eq!(catalog.diagnostics().count(Severity::Warning), 3);
    Ok(())
}

#[test]
fn unavailable_sources_are_hard_errors() -> Result<()> {
    let dir = TempDir::new()?;

    let missing = Catalog::from_path(&dir.path().join("nope.json"), ConflictPolicy::FirstWins);
    assert!(matches!(missing, Err(CatalogError::Io { .. })));

    let corrupt = write_text(dir.path(), "corrupt.json", "{\"schema_version\": [")?;
    assert!(matches!(
        Catalog::from_path(&corrupt, ConflictPolicy::FirstWins),
        Err(CatalogError::Parse { .. })
    ));

    let future = write_text(
        dir.path(),
        "future.json",
        r#"{"schema_version": "intrinsic_definitions_v2", "definitions": [{"name": "_x", "summary": "x"}]}"#,
    )?;
    let err = Catalog::from_path(&future, ConflictPolicy::FirstWins).unwrap_err();
    assert!(err.to_string().contains("intrinsic_definitions_v2"));

    let empty = write_definitions(dir.path(), "empty.json", &[])?;
    assert!(matches!(
        Catalog::from_path(&empty, ConflictPolicy::FirstWins),
        Err(CatalogError::Empty(_))
    ));

    let no_records = write_text(dir.path(), "listing.txt", "nothing to see here\n")?;
    assert!(matches!(
        Catalog::from_path(&no_records, ConflictPolicy::FirstWins),
        Err(CatalogError::Empty(_))
    ));
    Ok(())
}

#[test]
fn engine_config_loads_configured_definitions() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_definitions(dir.path(), "defs.json", &cmplt_records())?;
    let path_text = path.display().to_string();

    let config = EngineConfig::from_vars(|key: &str| match key {
        "INTRINSICS_DEFINITIONS" => Some(path_text.clone()),
        "INTRINSICS_CONFLICT_POLICY" => Some("last_wins".to_string()),
        _ => None,
    })?;
    let catalog = config.load_catalog()?;
    assert_eq!(catalog.source().origin, path_text);
    assert!(
        catalog
            .required_features("_mm512_cmplt_epi32_mask")
            .expect("present")
            .requires("KNCNI")
    );
    Ok(())
}
