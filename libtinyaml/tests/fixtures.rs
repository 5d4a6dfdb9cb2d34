//! Test harness for the loader and writer against fixture files.
//!
//! Every test/yaml/*.yaml file must load to the value in the matching
//! test/json/*.json file (key order included), must load to the same value
//! under serde_yaml, and must survive a dump and reload unchanged. Every
//! test/nay/*.yaml file must fail with the message in its .error file.

use std::fs;
use std::path::{Path, PathBuf};

use libtinyaml::{dumps, Document};

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("libtinyaml=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("test")
}

/// All files matching `pattern` under a subdirectory of test/, sorted.
fn fixture_files(subdir: &str, pattern: &str) -> Vec<PathBuf> {
    let pattern = test_root().join(subdir).join(pattern);
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .expect("valid glob pattern")
        .flatten()
        .collect();
    files.sort();
    files
}

fn sibling(path: &Path, subdir: &str, ext: &str) -> PathBuf {
    let stem = path.file_stem().unwrap().to_string_lossy();
    test_root().join(subdir).join(format!("{}.{}", stem, ext))
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

/// Run a single test/yaml file (expected to succeed).
fn run_yaml_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    let actual: serde_json::Value = libtinyaml::loads(&content)
        .map_err(|e| format!("{}: Unexpected error: {}", filename, e))?;
    let actual_json = serde_json::to_string(&actual).unwrap();

    // Expected value, order-sensitive through preserve_order
    let json_path = sibling(path, "json", "json");
    match fs::read_to_string(&json_path) {
        Ok(expected) => {
            let expected: serde_json::Value = serde_json::from_str(&expected)
                .map_err(|e| format!("{}: bad expected JSON: {}", filename, e))?;
            let expected_json = serde_json::to_string(&expected).unwrap();
            if actual_json != expected_json {
                return Err(format!(
                    "{}: Output mismatch\n    expected: {}\n    actual:   {}",
                    filename, expected_json, actual_json
                ));
            }
        }
        Err(_) => println!("  {} => {} (no expected output)", filename, actual_json),
    }

    // Cross-library parity
    let reference: serde_json::Value = serde_yaml::from_str(&content)
        .map_err(|e| format!("{}: serde_yaml rejected fixture: {}", filename, e))?;
    if reference != actual {
        return Err(format!(
            "{}: Differs from serde_yaml\n    serde_yaml: {}\n    tinyaml:    {}",
            filename, reference, actual_json
        ));
    }

    // Writer output reloads to the same tree
    let doc = Document::loads(&content).map_err(|e| format!("{}: {}", filename, e))?;
    let text = dumps(&doc).map_err(|e| format!("{}: dump failed: {}", filename, e))?;
    let reloaded = Document::loads(&text)
        .map_err(|e| format!("{}: reload failed: {}\n{}", filename, e, text))?;
    if reloaded.root() != doc.root() {
        return Err(format!(
            "{}: Round trip mismatch\n    dumped: {:?}\n    before: {:?}\n    after:  {:?}",
            filename,
            text,
            doc.root(),
            reloaded.root()
        ));
    }

    println!("  {} => {}", filename, actual_json);
    Ok(())
}

/// Run a single test/nay file (expected to fail with a specific error).
fn run_nay_test(path: &Path) -> Result<(), String> {
    let filename = file_name(path);
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {}", filename, e))?;

    match Document::from_slice(&bytes) {
        Ok(doc) => Err(format!(
            "{}: Expected an error, but got success: {:?}",
            filename,
            doc.root()
        )),
        Err(e) => {
            let actual_error = e.to_string();
            match fs::read_to_string(sibling(path, "nay", "error")) {
                Ok(expected) if expected.trim() == actual_error => {
                    println!("  {} => error (as expected)", filename);
                    Ok(())
                }
                Ok(expected) => Err(format!(
                    "{}: Error mismatch\n    expected: {}\n    actual:   {}",
                    filename,
                    expected.trim(),
                    actual_error
                )),
                Err(_) => {
                    println!(
                        "  {} => error: {} (no .error file to compare)",
                        filename, actual_error
                    );
                    Ok(())
                }
            }
        }
    }
}

fn run_all(kind: &str, files: &[PathBuf], run: fn(&Path) -> Result<(), String>) {
    assert!(!files.is_empty(), "no {} fixtures found", kind);
    println!("\nRunning {} {} fixtures:", files.len(), kind);

    let mut errors: Vec<String> = Vec::new();
    for file in files {
        if let Err(e) = run(file) {
            errors.push(e);
        }
    }

    println!(
        "\nResults: {} passed, {} failed",
        files.len() - errors.len(),
        errors.len()
    );
    if !errors.is_empty() {
        println!("\nErrors:");
        for error in &errors {
            println!("  - {}", error);
        }
    }
    assert!(errors.is_empty(), "{} {} fixtures failed", errors.len(), kind);
}

#[test]
fn test_all_yaml_fixtures() {
    run_all("yaml", &fixture_files("yaml", "*.yaml"), run_yaml_test);
}

#[test]
fn test_all_nay_fixtures() {
    run_all("nay", &fixture_files("nay", "*.yaml"), run_nay_test);
}

#[test]
fn test_every_yaml_fixture_has_expected_json() {
    for path in fixture_files("yaml", "*.yaml") {
        assert!(
            sibling(&path, "json", "json").exists(),
            "{} has no expected JSON",
            file_name(&path)
        );
    }
}

#[test]
fn test_every_nay_fixture_has_expected_error() {
    for path in fixture_files("nay", "*.yaml") {
        assert!(
            sibling(&path, "nay", "error").exists(),
            "{} has no .error file",
            file_name(&path)
        );
    }
}
