use std::env;
use std::path::Path;

const HINT_VAR: &str = "INTRINSICS_DEFINITIONS_HINT";
const BUNDLED_INPUTS: [&str; 2] = [
    "data/intrinsics_v1.json",
    "schema/intrinsic_definitions.schema.json",
];

fn main() {
    println!("cargo:rerun-if-env-changed={HINT_VAR}");
    for input in BUNDLED_INPUTS {
        println!("cargo:rerun-if-changed={input}");
    }

    let Ok(raw_hint) = env::var(HINT_VAR) else {
        return;
    };
    let hint = Path::new(raw_hint.trim());
    match hint.canonicalize() {
        Ok(path) if path.is_file() => {
            println!("cargo:rerun-if-changed={}", path.display());
            println!("cargo:rustc-env={HINT_VAR}={}", path.display());
        }
        _ => println!(
            "cargo:warning={HINT_VAR}={} is not a definitions file; using the bundled set",
            hint.display()
        ),
    }
}
