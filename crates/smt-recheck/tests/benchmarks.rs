// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use std::path::Path;

/// Reads the `; expect: <verdict>` header of a benchmark.
fn expectation(path: &Path) -> String {
    let content = std::fs::read_to_string(path).unwrap();
    content
        .lines()
        .find_map(|l| l.strip_prefix("; expect:"))
        .unwrap_or_else(|| panic!("{} has no `; expect:` header", path.display()))
        .trim()
        .to_string()
}

#[test]
fn run_benchmarks() {
    let mut count = 0;
    for entry in glob::glob("tests/inputs/*.smt2").expect("Invalid glob pattern") {
        let path = entry.expect("Failed to read file path");
        let expected = expectation(&path);
        let output = Command::cargo_bin("smt-recheck")
            .unwrap()
            .arg(&path)
            .output()
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let code = match expected.as_str() {
            "sat" => 1,
            "unsat" => 0,
            "unknown" | "error" => 255,
            other => panic!("unexpected expectation `{other}`"),
        };
        assert_eq!(
            output.status.code(),
            Some(code),
            "{}: stdout `{stdout}`, stderr `{stderr}`",
            path.display()
        );
        if expected == "error" {
            assert!(stdout.trim().is_empty(), "{}: {stdout}", path.display());
        } else {
            assert_eq!(stdout.trim(), expected, "{}", path.display());
            assert!(!stderr.contains("verdict mismatch"), "{}", path.display());
        }
        count += 1;
    }
    assert!(count > 0, "no benchmarks found");
}
