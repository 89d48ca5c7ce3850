//! Behavioral Contract Test: Settings Reconciliation
//!
//! Constraints verified:
//! - Exactly one outcome per directive, in directive order
//! - A rejected directive never stops the batch
//! - The cache purge runs after every directive, whatever their outcomes
//! - Structured values go out as a single PATCH

mod common;

use common::*;
use edgefix_core::engine::{PURGE_ENDPOINT, SettingDirective, SettingsEngine, recommended_profile};
use edgefix_core::traits::Method;
use serde_json::json;
use std::sync::Arc;

fn scenario_profile() -> Vec<SettingDirective> {
    vec![
        SettingDirective::new("ssl", "full"),
        SettingDirective::new("tls_1_3", "on"),
        SettingDirective::new("minify", json!({ "html": "on", "css": "on", "js": "on" })),
    ]
}

#[tokio::test]
async fn rejected_middle_directive_yields_applied_failed_applied() {
    let plane = FakeControlPlane::new().rejecting("settings/tls_1_3");
    let engine = SettingsEngine::new(Arc::new(plane.clone()));

    let report = engine.reconcile(&scenario_profile(), &token_ctx()).await;

    let keys: Vec<_> = report.outcomes.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, vec!["ssl", "tls_1_3", "minify"]);

    let applied: Vec<_> = report.outcomes.iter().map(|o| o.applied).collect();
    assert_eq!(applied, vec![true, false, true]);

    let errors = report.outcomes[1].errors.as_ref().expect("failure carries messages");
    assert!(errors[0].contains("rejected"));
    assert!(report.outcomes[0].errors.is_none());

    assert!(report.purge.applied);
    assert!(!report.is_clean());
    assert_eq!(report.applied_count(), 2);
}

#[tokio::test]
async fn purge_runs_last_even_when_everything_fails() {
    let plane = FakeControlPlane::new()
        .dropping("settings/ssl")
        .rejecting("settings/tls_1_3")
        .rejecting("settings/minify");
    let engine = SettingsEngine::new(Arc::new(plane.clone()));

    let report = engine.reconcile(&scenario_profile(), &token_ctx()).await;

    assert!(report.outcomes.iter().all(|o| !o.applied));
    assert!(report.outcomes[0].errors.as_ref().unwrap()[0].starts_with("transport failure"));

    let calls = plane.calls();
    assert_eq!(calls.len(), 4);
    let last = calls.last().unwrap();
    assert_eq!(last.method, Method::Post);
    assert_eq!(last.endpoint, PURGE_ENDPOINT);
    assert_eq!(last.body, Some(json!({ "purge_everything": true })));
    assert!(report.purge.applied);
    assert!(report.started_at <= report.finished_at);
}

#[tokio::test]
async fn failed_purge_is_reported_separately() {
    let plane = FakeControlPlane::new().rejecting(PURGE_ENDPOINT);
    let engine = SettingsEngine::new(Arc::new(plane));

    let report = engine.reconcile(&scenario_profile(), &token_ctx()).await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.outcomes.iter().all(|o| o.applied));
    assert!(!report.purge.applied);
    assert_eq!(report.purge.key, PURGE_ENDPOINT);
}

#[tokio::test]
async fn structured_value_is_one_patch() {
    let plane = FakeControlPlane::new();
    let engine = SettingsEngine::new(Arc::new(plane.clone()));

    engine.reconcile(&scenario_profile(), &token_ctx()).await;

    let minify_calls: Vec<_> = plane
        .calls()
        .into_iter()
        .filter(|c| c.endpoint == "settings/minify")
        .collect();
    assert_eq!(minify_calls.len(), 1);
    assert_eq!(minify_calls[0].method, Method::Patch);
    assert_eq!(
        minify_calls[0].body,
        Some(json!({ "value": { "html": "on", "css": "on", "js": "on" } }))
    );
    assert_eq!(plane.setting("minify").unwrap()["js"], "on");
}

#[tokio::test]
async fn recommended_profile_applies_in_declared_order() {
    let plane = FakeControlPlane::new();
    let engine = SettingsEngine::new(Arc::new(plane.clone()));
    let profile = recommended_profile();

    let report = engine.reconcile(&profile, &token_ctx()).await;

    assert_eq!(report.outcomes.len(), profile.len());
    assert!(report.is_clean());

    let patched: Vec<_> = plane
        .calls()
        .into_iter()
        .filter(|c| c.method == Method::Patch)
        .map(|c| c.endpoint)
        .collect();
    let expected: Vec<_> = profile.iter().map(|d| d.endpoint()).collect();
    assert_eq!(patched, expected);
}

#[tokio::test]
async fn current_value_reads_setting() {
    let plane = FakeControlPlane::new();
    plane.set_setting("ssl", json!("flexible"));
    let engine = SettingsEngine::new(Arc::new(plane.clone()));

    let value = engine.current_value("ssl", &token_ctx()).await.unwrap();
    assert_eq!(value, json!("flexible"));

    let outcome = engine
        .apply(&SettingDirective::new("ssl", "full"), &token_ctx())
        .await;
    assert!(outcome.applied);
    assert_eq!(engine.current_value("ssl", &token_ctx()).await.unwrap(), json!("full"));

    // single apply never purges
    assert!(plane.calls().iter().all(|c| c.endpoint != PURGE_ENDPOINT));
}

#[tokio::test]
async fn current_value_of_unknown_setting_is_an_error() {
    let engine = SettingsEngine::new(Arc::new(FakeControlPlane::new()));
    assert!(engine.current_value("ssl", &token_ctx()).await.is_err());
}
