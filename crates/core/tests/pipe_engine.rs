//! Integration tests for the pipe engine.
//!
//! These tests verify that execution:
//! - Skips steps whose condition or dependencies do not hold
//! - Runs composite children in order and flattens their results
//! - Converts step failures into failed results but propagates
//!   configuration errors

mod common;

use common::*;
use conduit_core::engine::{run_pipeline, PipeContext};
use conduit_core::factory::ConfigurationError;
use conduit_protocol::{Condition, PipeConfig, PipeResult};
use serde_json::{json, Map};

#[tokio::test]
async fn test_missing_dependency_leaves_context_unchanged() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = count("report").depends_on("fetch");

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.was_skipped);
    assert!(!result.has_failed());
    assert!(context.pipe_results().is_empty());
    assert_eq!(probe.runs(), 0);
}

#[tokio::test]
async fn test_condition_false_child_is_absent() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite("triage", vec![count("a"), disabled(count("b")), count("c")]);

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.succeeded);
    assert!(context.has_succeeded("a"));
    assert!(context.has_succeeded("c"));
    assert!(context.result("b").is_none());
    assert!(context.has_succeeded("triage"));
    assert_eq!(probe.order(), vec!["a".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn test_composite_fails_when_a_child_fails() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite("triage", vec![count("a"), failing_count("b"), count("c")]);

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert_eq!(result.message, "b gave up");
    // a failed result is data, later siblings still run
    assert!(context.has_succeeded("c"));
    assert!(context.result("b").is_some_and(PipeResult::has_failed));
    assert!(context.result("triage").is_some_and(PipeResult::has_failed));
}

#[tokio::test]
async fn test_dependency_on_failed_sibling_is_skipped() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![failing_count("fetch"), count("classify").depends_on("fetch")],
    );

    let (context, _) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(context.result("classify").is_none());
    assert_eq!(probe.order(), vec!["fetch".to_string()]);
}

#[tokio::test]
async fn test_skipped_step_params_are_never_rendered() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    // `raise` only decodes once `fetch` has produced a boolean flag
    let config = composite(
        "triage",
        vec![
            PipeConfig::new("fetch", "fail"),
            PipeConfig::new("report", "fail")
                .depends_on("fetch")
                .with_param("raise", "{{ pipe_results.fetch.data.flag }}"),
        ],
    );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert!(context.result("fetch").is_some_and(PipeResult::has_failed));
    assert!(context.result("report").is_none());
    assert!(context.result("triage").is_some_and(PipeResult::has_failed));
}

#[tokio::test]
async fn test_condition_false_step_with_invalid_params_is_skipped() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![
            count("a"),
            count("heavy")
                .with_param("weight", 500)
                .with_condition(Condition::Template("{{ params.enabled }}".into())),
            count("c"),
        ],
    );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.succeeded);
    assert!(context.result("heavy").is_none());
    assert_eq!(probe.order(), vec!["a".to_string(), "c".to_string()]);
    assert_eq!(probe.constructed(), 2);
}

#[tokio::test]
async fn test_dependency_gated_step_is_not_constructed() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = count("report").depends_on("fetch");

    let instance = factory.build_pipe(&config, &PipeContext::new()).unwrap();

    assert!(!instance.should_run(&PipeContext::new()));
    assert_eq!(probe.constructed(), 0);
}

#[tokio::test]
async fn test_empty_composite_writes_only_its_own_entry() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let seed = PipeContext::new().with_pipe_result("earlier", PipeResult::success());

    let (context, result) = run_pipeline(&factory, &composite("noop", vec![]), seed.clone())
        .await
        .unwrap();

    assert_eq!(result, PipeResult::success());
    assert_eq!(result.data, json!({}));
    assert_eq!(context.pipe_results().len(), seed.pipe_results().len() + 1);
    assert!(context.has_succeeded("noop"));
}

#[tokio::test]
async fn test_nested_results_are_flattened() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "outer",
        vec![
            composite("inner", vec![count("x")]),
            count("y").depends_on("x"),
        ],
    );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.succeeded);
    for id in ["x", "inner", "y", "outer"] {
        assert!(context.has_succeeded(id), "{id} should be recorded");
    }
    assert_eq!(probe.order(), vec!["x".to_string(), "y".to_string()]);
}

#[tokio::test]
async fn test_later_steps_render_earlier_results_and_parent_params() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);

    let mut ambient = Map::new();
    ambient.insert("team".into(), json!("ops"));

    let config = PipeConfig::new("report", "composite")
        .with_param("project", "OPS")
        .with_step(
            PipeConfig::new("fetch", "emit")
                .with_param("data", json!({"tickets": ["OPS-1", "OPS-2"], "count": 2})),
        )
        .with_step(
            PipeConfig::new("summary", "log")
                .depends_on("fetch")
                .with_param(
                    "message",
                    "{{ pipe_results.fetch.data.count }} tickets in {{ params.project }} for {{ parent.params.team }}",
                ),
        )
        .with_step(
            PipeConfig::new("copy", "emit").with_param(
                "data",
                json!({"tickets": "{{ pipe_results.fetch.data.tickets }}"}),
            ),
        );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::with_params(ambient))
        .await
        .unwrap();

    assert!(result.succeeded);
    assert_eq!(
        context.result("summary").map(|r| r.message.as_str()),
        Some("2 tickets in OPS for ops")
    );
    // a single expression keeps its JSON shape
    assert_eq!(
        context.result("copy").map(|r| r.data.clone()),
        Some(json!({"tickets": ["OPS-1", "OPS-2"]}))
    );
}

#[tokio::test]
async fn test_templated_condition_reads_earlier_result() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![
            failing_count("fetch"),
            count("on-success")
                .with_condition(Condition::Template("{{ pipe_results.fetch.succeeded }}".into())),
            count("always"),
        ],
    );

    let (context, _) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(context.result("on-success").is_none());
    assert!(context.has_succeeded("always"));
}

#[tokio::test]
async fn test_union_of_children_joins_messages_and_data() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = PipeConfig::new("both", "composite")
        .with_step(
            PipeConfig::new("first", "emit")
                .with_param("message", "first")
                .with_param("data", json!({"a": 1, "shared": "first"})),
        )
        .with_step(
            PipeConfig::new("second", "emit")
                .with_param("message", "second")
                .with_param("data", json!({"b": 2, "shared": "second"})),
        );

    let (_, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert_eq!(result.message, "first\nsecond");
    assert_eq!(result.data, json!({"a": 1, "b": 2, "shared": "second"}));
}

#[tokio::test]
async fn test_raised_step_error_keeps_partial_progress() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![
            count("a"),
            PipeConfig::new("boom", "fail")
                .with_param("raise", true)
                .with_param("message", "upstream unavailable"),
            count("c"),
        ],
    );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert!(result.message.contains("'boom'"));
    assert!(result.message.contains("upstream unavailable"));
    assert!(context.has_succeeded("a"));
    assert!(context.result("c").is_none());
    assert!(context.result("triage").is_some_and(PipeResult::has_failed));
}

#[tokio::test]
async fn test_render_error_is_a_step_failure() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![
            count("a"),
            PipeConfig::new("broken", "log").with_param("message", "{{#if}}"),
        ],
    );

    let (context, result) = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap();

    assert!(result.has_failed());
    assert!(result.message.contains("{{#if}}"));
    assert!(context.has_succeeded("a"));
}

#[tokio::test]
async fn test_invalid_params_propagate_through_composite() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![count("a"), count("heavy").with_param("weight", 500)],
    );

    let error = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap_err();

    match error {
        ConfigurationError::InvalidParams { step_id, fields, .. } => {
            assert_eq!(step_id, "heavy");
            assert_eq!(fields, vec!["weight".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    // only `a` was ever constructed
    assert_eq!(probe.constructed(), 1);
}

#[tokio::test]
async fn test_duplicate_ids_are_rejected_before_running() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite(
        "triage",
        vec![count("a"), composite("inner", vec![count("a")])],
    );

    let error = run_pipeline(&factory, &config, PipeContext::new())
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ConfigurationError::DuplicateId {
            step_id: "a".to_string()
        }
    );
    assert_eq!(probe.runs(), 0);
}

#[tokio::test]
async fn test_each_execution_builds_fresh_instances() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = composite("triage", vec![count("a")]);

    for _ in 0..3 {
        run_pipeline(&factory, &config, PipeContext::new()).await.unwrap();
    }

    assert_eq!(probe.constructed(), 3);
    assert_eq!(probe.runs(), 3);
}
