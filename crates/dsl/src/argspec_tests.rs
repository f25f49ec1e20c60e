// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn words(input: &str) -> Vec<String> {
    crate::tokenizer::split_words(input).unwrap()
}

fn run_spec() -> ArgSpec {
    ArgSpec::new().greedy("command").with_common_options()
}

#[test]
fn greedy_positional_joins_remaining_words() {
    let vars = run_spec().bind(&words("echo hello world")).unwrap();
    assert_eq!(vars["command"], json!("echo hello world"));
}

#[test]
fn options_mix_with_greedy_positional() {
    let vars = run_spec().bind(&words("--run-once --timeout-seconds 30 echo hi")).unwrap();
    assert_eq!(vars["run_once"], json!(true));
    assert_eq!(vars["timeout_seconds"], json!(30));
    assert_eq!(vars["command"], json!("echo hi"));
}

#[test]
fn equals_form_binds_like_the_spaced_form() {
    let a = run_spec().bind(&words("--timeout-seconds=30 true")).unwrap();
    let b = run_spec().bind(&words("--timeout-seconds 30 true")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn option_names_accept_hyphens_or_underscores() {
    let vars = run_spec().bind(&words("--stdout_arg result echo hi")).unwrap();
    assert_eq!(vars["stdout_arg"], json!("result"));
}

#[test]
fn plain_positionals_bind_in_order() {
    let spec = ArgSpec::new().positional("key").greedy("value").with_common_options();
    let vars = spec.bind(&words("region us-east-1")).unwrap();
    assert_eq!(vars["key"], json!("region"));
    assert_eq!(vars["value"], json!("us-east-1"));
}

#[test]
fn optional_positional_may_be_absent() {
    let spec = ArgSpec::new().positional("tag").optional("scope");
    let vars = spec.bind(&words("jobs")).unwrap();
    assert_eq!(vars["tag"], json!("jobs"));
    assert!(!vars.contains_key("scope"));
}

#[test]
fn unknown_option_is_rejected() {
    let err = run_spec().bind(&words("--bogus echo hi")).unwrap_err();
    assert_eq!(err, BindError::UnknownOption("bogus".to_string()));
}

#[test]
fn missing_option_value_is_rejected() {
    let err = run_spec().bind(&words("echo hi --timeout-seconds")).unwrap_err();
    assert_eq!(err, BindError::MissingValue("timeout-seconds".to_string()));
}

#[test]
fn missing_required_positional_is_rejected() {
    let err = run_spec().bind(&words("--run-once")).unwrap_err();
    assert_eq!(err, BindError::MissingPositional("command".to_string()));
}

#[test]
fn extra_arguments_are_rejected() {
    let spec = ArgSpec::new().positional("key");
    let err = spec.bind(&words("a b c")).unwrap_err();
    assert_eq!(err, BindError::ExtraArguments("b c".to_string()));
}

#[test]
fn boolean_and_numeric_values_coerce() {
    let spec = ArgSpec::new().positional("key").positional("value");
    let vars = spec.bind(&words("enabled true")).unwrap();
    assert_eq!(vars["value"], json!(true));

    let vars = spec.bind(&words("count 12")).unwrap();
    assert_eq!(vars["value"], json!(12));
}
