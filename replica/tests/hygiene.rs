//! Hygiene: source-level budgets for the replica and the wire crate.
//!
//! The replica runs inside a participant's UI loop, so a panic takes the
//! whole stage down with it. These tests scan production sources (sidecar
//! `*_test.rs` files and inline `mod tests` blocks excluded) and fail when a
//! budget is exceeded. Budgets only go down.

use std::fs;
use std::path::{Path, PathBuf};

struct Budget {
    pattern: &'static str,
    max: usize,
}

const PANICS: &[Budget] = &[
    Budget { pattern: ".unwrap()", max: 0 },
    Budget { pattern: ".expect(", max: 0 },
    Budget { pattern: "panic!(", max: 0 },
    Budget { pattern: "unreachable!(", max: 0 },
    Budget { pattern: "todo!(", max: 0 },
    Budget { pattern: "unimplemented!(", max: 0 },
];

const SILENT_LOSS: &[Budget] =
    &[Budget { pattern: "let _ =", max: 0 }, Budget { pattern: ".ok()", max: 0 }];

const STRUCTURE: &[Budget] = &[Budget { pattern: "#[allow(dead_code)]", max: 0 }];

/// Source roots, relative to the replica package directory.
const ROOTS: &[&str] = &["src", "../events/src"];

struct SourceFile {
    path: PathBuf,
    production: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut out = Vec::new();
    for root in ROOTS {
        collect(Path::new(root), &mut out);
    }
    out
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|e| e == "rs");
        let is_sidecar = path.to_string_lossy().ends_with("_test.rs");
        if !is_rs || is_sidecar {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { production: strip_inline_tests(&content), path });
        }
    }
}

/// Drop everything from an inline `#[cfg(test)] mod tests {` onward. Inline
/// test modules sit at the end of a file by convention.
fn strip_inline_tests(content: &str) -> String {
    let mut kept = Vec::new();
    let mut lines = content.lines().peekable();
    while let Some(line) = lines.next() {
        let opens_tests =
            lines.peek().is_some_and(|next| next.trim_start().starts_with("mod tests {"));
        if line.trim() == "#[cfg(test)]" && opens_tests {
            break;
        }
        kept.push(line);
    }
    kept.join("\n")
}

fn check(budgets: &[Budget]) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the replica package directory");

    let mut failures = Vec::new();
    for budget in budgets {
        let hits: Vec<(String, usize)> = files
            .iter()
            .filter_map(|file| {
                let count = file
                    .production
                    .lines()
                    .filter(|line| line.contains(budget.pattern))
                    .count();
                (count > 0).then(|| (file.path.display().to_string(), count))
            })
            .collect();
        let total: usize = hits.iter().map(|(_, c)| c).sum();
        if total > budget.max {
            let detail: Vec<String> = hits.iter().map(|(p, c)| format!("  {p}: {c}")).collect();
            failures.push(format!(
                "`{}` budget exceeded: found {total}, max {}\n{}",
                budget.pattern,
                budget.max,
                detail.join("\n")
            ));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn panic_budgets() {
    check(PANICS);
}

#[test]
fn silent_loss_budgets() {
    check(SILENT_LOSS);
}

#[test]
fn structure_budgets() {
    check(STRUCTURE);
}

#[test]
fn inline_test_modules_are_excluded() {
    let src = "fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() { x.unwrap(); }\n}\n";
    assert_eq!(strip_inline_tests(src), "fn a() {}");
}
