#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::{Command, Output};

const ENGINE_VARS: [&str; 6] = [
    "INTRINSICS_TARGET_FEATURES",
    "INTRINSICS_TOOLTIP_WIDTH",
    "INTRINSICS_COMPLETION_WIDTH",
    "INTRINSICS_CONFLICT_POLICY",
    "INTRINSICS_DEFINITIONS",
    "INTRINSICS_ALLOWED_SCHEMAS",
];

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn bundled_definitions() -> PathBuf {
    repo_root().join("data/intrinsics_v1.json")
}

/// `intrinsics-query` with the engine's environment cleared.
pub fn query_command() -> Command {
    isolated(env!("CARGO_BIN_EXE_intrinsics-query"))
}

/// `definitions-validate` with the engine's environment cleared.
pub fn validate_command() -> Command {
    isolated(env!("CARGO_BIN_EXE_definitions-validate"))
}

fn isolated(path: &str) -> Command {
    let mut cmd = Command::new(path);
    for var in ENGINE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

pub fn run_command(cmd: &mut Command) -> Result<Output> {
    cmd.output()
        .with_context(|| format!("failed to spawn {:?}", cmd.get_program()))
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
