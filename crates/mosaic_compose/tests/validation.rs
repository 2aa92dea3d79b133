//! Integration tests for verify-phase validation: contracts, cycles, missing
//! dependencies, duplicate kinds, and structural checks. Every failure here
//! must leave the subsystem untouched.


use std::sync::Arc;

use mosaic_compose::subsystem::Subsystem;
use mosaic_facet::contract::Contract;
use mosaic_facet::error::{BuildError, FacetError};
use mosaic_facet::facet::{Facet, FacetRef};
use mosaic_facet::hook::Hook;
use serde_json::json;
use test_utils::{FacetSpec, Recorder};

// ─────────────────────────────────────────────────────────────────────────────
// Contracts
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn contract_gate_rejects_before_any_init() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    subsystem
        .contracts_mut()
        .register(Contract::new("key-value").require_methods(["get", "put"]));

    let err = subsystem
        .use_hook(FacetSpec::new("healthy").hook(&recorder))
        .use_hook(
            FacetSpec::new("store")
                .contract("key-value")
                .methods(&["get"]) // "put" is missing
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::ContractViolation {
            contract, kind, reason,
        } => {
            assert_eq!(contract, "key-value");
            assert_eq!(kind, "store");
            assert!(reason.contains("put"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Zero side effects: nothing initialized, nothing attached.
    assert!(recorder.events().is_empty());
    assert!(subsystem.facets().is_empty());
}

#[tokio::test]
async fn conforming_facets_pass_their_contract() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    subsystem.contracts_mut().register(
        Contract::new("key-value")
            .require_methods(["get", "put"])
            .require_properties(["capacity"]),
    );

    subsystem
        .use_hook(
            FacetSpec::new("store")
                .contract("key-value")
                .methods(&["get", "put"])
                .prop("capacity", json!(512))
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap();

    assert!(subsystem.find("store").is_some());
}

#[tokio::test]
async fn unregistered_contract_names_the_facet_and_source() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(
            FacetSpec::new("store")
                .contract("ghost")
                .source("tests::store-hook")
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::UnknownContract {
            contract,
            kind,
            source,
        } => {
            assert_eq!(contract, "ghost");
            assert_eq!(kind, "store");
            assert_eq!(source, "tests::store-hook");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn hook_declared_contracts_are_enforced_too() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    subsystem
        .contracts_mut()
        .register(Contract::new("loggable").require_methods(["log"]));

    // The contract comes from the hook metadata; the facet declares none.
    let err = subsystem
        .use_hook(FacetSpec::new("quiet").hook(&recorder).with_contract("loggable"))
        .build()
        .await
        .unwrap_err();

    assert!(matches!(err, BuildError::ContractViolation { .. }));
}

#[tokio::test]
async fn custom_validator_failures_carry_contract_context() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    subsystem.contracts_mut().register(
        Contract::new("bounded").with_validator(|ctx, facet| {
            let limit = ctx
                .get("limits.capacity")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            let declared = facet
                .property("capacity")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            if declared > limit {
                return Err(FacetError::msg(format!(
                    "capacity {declared} exceeds limit {limit}"
                )));
            }
            Ok(())
        }),
    );

    let err = subsystem
        .with_ctx(mosaic_facet::ctx::Ctx::from_json(json!({"limits": {"capacity": 100}})).unwrap())
        .use_hook(
            FacetSpec::new("store")
                .contract("bounded")
                .prop("capacity", json!(512))
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("bounded"));
    assert!(text.contains("exceeds limit 100"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Cycles
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn hook_requirement_cycles_name_hook_identities() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(FacetSpec::new("a").requires(&["b"]).hook(&recorder))
        .use_hook(FacetSpec::new("b").requires(&["a"]).hook(&recorder))
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::Cycle(cycle) => {
            assert!(cycle.kinds.contains(&"a:0".to_string()));
            assert!(cycle.kinds.contains(&"b:0".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(subsystem.facets().is_empty());
}

#[tokio::test]
async fn facet_dependency_cycles_name_the_kinds() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(FacetSpec::new("a").facet_requires(&["b"]).hook(&recorder))
        .use_hook(FacetSpec::new("b").facet_requires(&["a"]).hook(&recorder))
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::Cycle(cycle) => {
            assert!(cycle.kinds.contains(&"a".to_string()));
            assert!(cycle.kinds.contains(&"b".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dependencies and duplicates
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_dependency_reports_kind_source_and_name() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(
            FacetSpec::new("consumer")
                .requires(&["absent"])
                .source("tests::consumer-hook")
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::MissingDependency {
            kind,
            source,
            missing,
        } => {
            assert_eq!(kind, "consumer");
            assert_eq!(source, "tests::consumer-hook");
            assert_eq!(missing, "absent");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn duplicate_kind_without_overwrite_is_rejected() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(FacetSpec::new("k").source("tests::first").hook(&recorder))
        .use_hook(FacetSpec::new("k").source("tests::second").hook(&recorder))
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::DuplicateKind {
            kind,
            first_source,
            second_source,
        } => {
            assert_eq!(kind, "k");
            assert_eq!(first_source, "tests::first");
            assert_eq!(second_source, "tests::second");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn overwrite_head_requiring_its_own_kind_is_rejected() {
    let recorder = Recorder::new();
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(
            FacetSpec::new("k")
                .overwrite()
                .requires(&["k"])
                .source("tests::head")
                .hook(&recorder),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::OverwriteWithoutPredecessor { kind, source } => {
            assert_eq!(kind, "k");
            assert_eq!(source, "tests::head");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structural checks
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_hook_kind_is_rejected() {
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(Hook::from_fn("", |_| Ok(None)).with_source("tests::nameless"))
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::MissingKind { index, source } => {
            assert_eq!(index, 0);
            assert_eq!(source, "tests::nameless");
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct Mislabelled;

impl Facet for Mislabelled {
    fn kind(&self) -> &str {
        "unexpected"
    }
}

#[tokio::test]
async fn facet_kind_mismatch_is_rejected() {
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(
            Hook::from_fn("expected", |_| Ok(Some(Arc::new(Mislabelled) as FacetRef)))
                .with_source("tests::mismatch"),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::KindMismatch {
            hook_kind,
            facet_kind,
            source,
        } => {
            assert_eq!(hook_kind, "expected");
            assert_eq!(facet_kind, "unexpected");
            assert_eq!(source, "tests::mismatch");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn factory_errors_abort_the_build_with_context() {
    let mut subsystem = Subsystem::new();
    let err = subsystem
        .use_hook(
            Hook::from_fn("db", |_| Err(FacetError::msg("connection refused")))
                .with_source("tests::db"),
        )
        .build()
        .await
        .unwrap_err();

    match err {
        BuildError::Factory { kind, source, error } => {
            assert_eq!(kind, "db");
            assert_eq!(source, "tests::db");
            assert_eq!(error.message(), "connection refused");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(subsystem.facets().is_empty());
}
