//! Integration tests for the engine's diagnostics using the fixture format.

use wacc_diag_testutil::fixture::{parse_fixtures, run_fixtures};

const BLOCKS_TEST: &str = include_str!("../../../tests/diagnostics/blocks.test");
const IDENTIFIERS_TEST: &str = include_str!("../../../tests/diagnostics/identifiers.test");
const EXTERNAL_TEST: &str = include_str!("../../../tests/diagnostics/external.test");

fn run(name: &str, content: &str) {
    let cases = parse_fixtures(content).unwrap_or_else(|e| panic!("{name}: {e}"));
    assert!(!cases.is_empty(), "{name}: no cases");

    let summary = run_fixtures(&cases);
    println!("{name}{summary}");
    assert!(summary.all_passed(), "{name}{summary}");
}

#[test]
fn block_fixtures() {
    run("blocks.test", BLOCKS_TEST);
}

#[test]
fn identifier_fixtures() {
    run("identifiers.test", IDENTIFIERS_TEST);
}

#[test]
fn external_fixtures() {
    run("external.test", EXTERNAL_TEST);
}

#[test]
fn case_names_are_unique() {
    let mut names = std::collections::HashSet::new();
    for content in [BLOCKS_TEST, IDENTIFIERS_TEST, EXTERNAL_TEST] {
        for case in parse_fixtures(content).unwrap() {
            assert!(names.insert(case.name.clone()), "duplicate case {}", case.name);
        }
    }
}
