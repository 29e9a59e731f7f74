//! Integration tests for the renderable factory.
//!
//! These tests verify that building a step:
//! - Resolves injected services by id, failing before any constructor runs
//! - Validates rendered params before construction
//! - Detects injection cycles instead of recursing forever

mod common;

use common::*;
use conduit_core::engine::{PipeContext, PipeError};
use conduit_core::factory::{ConfigurationError, RenderableKind};
use conduit_protocol::{PipeConfig, ServiceDefinition, TriggerDefinition};
use serde_json::{json, Map};

fn ticket_step() -> PipeConfig {
    PipeConfig::new("classify", "ticket-count").with_inject("ticket_system", "svc1")
}

#[tokio::test]
async fn test_missing_service_is_named_before_any_constructor_runs() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);

    let error = factory
        .build_pipe(&ticket_step(), &PipeContext::new())
        .unwrap_err();

    match error {
        PipeError::Configuration(error @ ConfigurationError::MissingService { .. }) => {
            assert!(error.to_string().contains("svc1"));
            assert_eq!(error.step_id(), "classify");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(probe.constructed(), 0);
}

#[tokio::test]
async fn test_injected_service_is_built_against_the_same_context() {
    let probe = Probe::new();
    let factory = factory_with_probe(
        &probe,
        [ServiceDefinition::new("svc1", "ticket-client").with_param("base_url", "{{ params.url }}")],
    );

    let mut params = Map::new();
    params.insert("url".into(), json!("https://tickets.example.com"));
    let context = PipeContext::with_params(params);

    let step = factory.build_pipe(&ticket_step(), &context).unwrap();
    let result = step.process(&context).await.unwrap();

    assert!(result.succeeded);
    assert_eq!(result.data["base_url"], "https://tickets.example.com");
    // the service and the pipe
    assert_eq!(probe.constructed(), 2);
}

#[tokio::test]
async fn test_services_are_not_cached() {
    let probe = Probe::new();
    let factory = factory_with_probe(
        &probe,
        [ServiceDefinition::new("svc1", "ticket-client").with_param("base_url", "https://a")],
    );

    factory.build_pipe(&ticket_step(), &PipeContext::new()).unwrap();
    factory.build_pipe(&ticket_step(), &PipeContext::new()).unwrap();

    assert_eq!(probe.constructed(), 4);
}

#[test]
fn test_injection_cycle_is_reported_with_its_chain() {
    let probe = Probe::new();
    let factory = factory_with_probe(
        &probe,
        [
            ServiceDefinition::new("svc1", "ticket-client")
                .with_param("base_url", "https://a")
                .with_inject("upstream", "svc2"),
            ServiceDefinition::new("svc2", "ticket-client")
                .with_param("base_url", "https://b")
                .with_inject("upstream", "svc1"),
        ],
    );

    let error = factory
        .build_pipe(&ticket_step(), &PipeContext::new())
        .unwrap_err();

    match error {
        PipeError::Configuration(ConfigurationError::CyclicInjection { step_id, chain }) => {
            assert_eq!(step_id, "svc2");
            assert_eq!(chain, vec!["svc1", "svc2", "svc1"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(probe.constructed(), 0);

    assert!(matches!(
        factory.validate(&ticket_step()),
        Err(ConfigurationError::CyclicInjection { .. })
    ));
    assert!(matches!(
        factory.validate_services(),
        Err(ConfigurationError::CyclicInjection { .. })
    ));
}

#[test]
fn test_invalid_params_fail_before_construction() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);
    let config = PipeConfig::new("heavy", "count")
        .with_param("weight", 101)
        .with_param("succeed", "sometimes");

    let error = factory.build_pipe(&config, &PipeContext::new()).unwrap_err();

    assert!(error.is_fatal());
    assert!(error.to_string().contains("heavy"));
    assert_eq!(probe.constructed(), 0);
}

#[test]
fn test_every_invalid_field_is_listed() {
    let probe = Probe::new();
    let factory = factory_with_probe(
        &probe,
        [ServiceDefinition::new("svc1", "ticket-client").with_param("base_url", "")],
    );

    let error = factory
        .build_service("svc1", &PipeContext::new())
        .unwrap_err();

    match error {
        PipeError::Configuration(ConfigurationError::InvalidParams { step_id, fields, reason }) => {
            assert_eq!(step_id, "svc1");
            assert_eq!(fields, vec!["base_url".to_string()]);
            assert!(reason.contains("base_url"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unknown_use_is_fatal() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);

    let error = factory
        .build_pipe(&PipeConfig::new("x", "does-not-exist"), &PipeContext::new())
        .unwrap_err();

    match error {
        PipeError::Configuration(ConfigurationError::UnknownType { step_id, kind, uses }) => {
            assert_eq!(step_id, "x");
            assert_eq!(kind, RenderableKind::Pipe);
            assert_eq!(uses, "does-not-exist");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_interval_trigger_params_are_validated() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);

    let zero = TriggerDefinition::new("never", "interval");
    assert!(matches!(
        factory.build_trigger(&zero, &PipeContext::new()),
        Err(PipeError::Configuration(ConfigurationError::InvalidParams { .. }))
    ));

    let typo = TriggerDefinition::new("typo", "interval").with_param("secnds", 5);
    assert!(factory.build_trigger(&typo, &PipeContext::new()).is_err());

    let ok = TriggerDefinition::new("ok", "interval").with_param("seconds", 5);
    let trigger = factory.build_trigger(&ok, &PipeContext::new()).unwrap();
    assert_eq!(trigger.id(), "ok");
    assert!(!trigger.is_running());
}

#[test]
fn test_params_schema_is_exposed() {
    let probe = Probe::new();
    let factory = factory_with_probe(&probe, []);

    let schema = factory.registry().params_schema("count").unwrap();
    let schema = serde_json::to_value(schema).unwrap();

    assert!(schema["properties"]["weight"].is_object());
    assert!(schema["properties"]["succeed"].is_object());
}
