#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration tests for the `validate` command.
//!
//! Validation loads and resolves the declaration file without touching any
//! destination, so these tests also assert that nothing is written.

mod common;

use common::FixtureBuilder;
use dotlink::commands;
use dotlink::logging::Logger;

#[test]
fn lists_actions_in_declaration_order() {
    let fx = FixtureBuilder::new()
        .with_source("bashrc", "x\n")
        .with_config(
            "- create:\n    - {src: bashrc, dest: '{home}/.bashrc'}\n\
             - filecontent:\n    - {dest: '{home}/.profile', content: 'umask 022'}\n",
        )
        .build();
    let mut out = Vec::new();

    let setup = commands::validate::run(&fx.global(), &Logger::new("test"), &mut out).unwrap();

    assert_eq!(setup.actions.len(), 2);
    assert!(setup.warnings.is_empty());
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.first().unwrap().starts_with("  1. "));
    assert!(lines.first().unwrap().ends_with(".bashrc"));
    assert!(lines.get(1).unwrap().contains("\"umask 022\""));
    assert!(!fx.dest(".bashrc").exists());
}

#[test]
fn missing_sources_and_overlaps_are_warnings() {
    let fx = FixtureBuilder::new()
        .with_config(
            "- create:\n    - {src: nowhere, dest: '{home}/.a'}\n    - {url: 'https://example.com/a', dest: '{home}/.a'}\n",
        )
        .build();

    let setup =
        commands::validate::run(&fx.global(), &Logger::new("test"), &mut Vec::new()).unwrap();

    assert_eq!(setup.warnings.len(), 2);
    let rendered: Vec<String> = setup.warnings.iter().map(ToString::to_string).collect();
    assert!(rendered.iter().any(|w| w.contains("nowhere")));
    assert!(rendered.iter().any(|w| w.starts_with("action #2")));
}

#[test]
fn invalid_regex_is_an_error() {
    let fx = FixtureBuilder::new()
        .with_config("- filecontent:\n    - {dest: '{home}/.a', content: x, regex: '('}\n")
        .build();

    let err =
        commands::validate::run(&fx.global(), &Logger::new("test"), &mut Vec::new()).unwrap_err();

    assert!(err.to_string().contains("invalid regex regex '('"));
}

#[test]
fn url_with_link_type_is_an_error() {
    let fx = FixtureBuilder::new()
        .with_config(
            "- create:\n    - {url: 'https://example.com/a', dest: '{home}/.a', type: link}\n",
        )
        .build();

    let err =
        commands::validate::run(&fx.global(), &Logger::new("test"), &mut Vec::new()).unwrap_err();

    assert!(err.to_string().contains("cannot link to a URL source"));
}
