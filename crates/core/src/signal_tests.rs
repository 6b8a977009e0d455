// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn kind_roundtrip_known() {
    for (kind, text) in [
        (SignalKind::Starting, "\"starting\""),
        (SignalKind::Working, "\"working\""),
        (SignalKind::Review, "\"review\""),
        (SignalKind::Reply, "\"reply\""),
        (SignalKind::Completing, "\"completing\""),
        (SignalKind::Complete, "\"complete\""),
        (SignalKind::Paused, "\"paused\""),
        (SignalKind::Dead, "\"dead\""),
    ] {
        assert_eq!(serde_json::to_string(&kind).unwrap(), text);
        let back: SignalKind = serde_json::from_str(text).unwrap();
        assert_eq!(back, kind);
    }
}

#[test]
fn kind_unknown_preserved() {
    let back: SignalKind = serde_json::from_str("\"telemetry\"").unwrap();
    assert_eq!(back, SignalKind::Unknown("telemetry".into()));
    assert_eq!(serde_json::to_string(&back).unwrap(), "\"telemetry\"");
}

#[test]
fn decode_starting_payload() {
    let payload = json!({
        "agent": "AlphaGlade",
        "task": "demo-abc",
        "project": "demo",
        "model": "opus",
        "tools": ["bash", "edit"],
        "gitBranch": "feat/x",
    });
    let decoded = SignalPayload::decode(&SignalKind::Starting, payload).unwrap();
    match &decoded {
        SignalPayload::Starting(p) => {
            assert_eq!(p.agent, "AlphaGlade");
            assert_eq!(p.task, "demo-abc");
            assert_eq!(p.tools, vec!["bash", "edit"]);
            assert_eq!(p.git_branch, "feat/x");
        }
        other => panic!("wrong variant: {other:?}"),
    }
    assert_eq!(decoded.task().map(|t| t.as_str()), Some("demo-abc"));
}

#[test]
fn decode_preserves_extra_fields() {
    let payload = json!({
        "task": "demo-abc",
        "title": "t",
        "approach": "a",
        "vendorHint": {"nested": true},
    });
    let decoded = SignalPayload::decode(&SignalKind::Working, payload).unwrap();
    let encoded = serde_json::to_value(&decoded).unwrap();
    assert_eq!(encoded["vendorHint"], json!({"nested": true}));
}

#[test]
fn decode_rejects_malformed_known_kind() {
    let payload = json!({"task": "demo-abc"}); // missing title/approach
    assert!(SignalPayload::decode(&SignalKind::Working, payload).is_err());
}

#[test]
fn decode_unknown_kind_is_opaque() {
    let payload = json!({"whatever": 1});
    let decoded =
        SignalPayload::decode(&SignalKind::Unknown("telemetry".into()), payload.clone()).unwrap();
    assert_eq!(decoded, SignalPayload::Opaque(payload));
}

#[test]
fn decode_complete_payload_modes() {
    let payload = json!({
        "taskId": "demo-abc.2",
        "summary": "done",
        "humanActions": ["deploy"],
        "suggestedTasks": [],
        "completionMode": "auto_proceed",
        "nextTaskId": "demo-abc.3",
    });
    match SignalPayload::decode(&SignalKind::Complete, payload).unwrap() {
        SignalPayload::Complete(p) => {
            assert_eq!(p.completion_mode, CompletionMode::AutoProceed);
            assert_eq!(p.next_task_id.as_ref().map(|t| t.as_str()), Some("demo-abc.3"));
        }
        other => panic!("wrong variant: {other:?}"),
    }
}

#[test]
fn decode_completing_steps() {
    for (step, name) in [
        (CompletingStep::Verifying, "verifying"),
        (CompletingStep::Committing, "committing"),
        (CompletingStep::Closing, "closing"),
        (CompletingStep::Releasing, "releasing"),
        (CompletingStep::Complete, "complete"),
    ] {
        let payload = json!({"step": name, "percent": 40});
        match SignalPayload::decode(&SignalKind::Completing, payload).unwrap() {
            SignalPayload::Completing(p) => assert_eq!(p.step, step),
            other => panic!("wrong variant: {other:?}"),
        }
    }
}

#[test]
fn content_hash_tracks_payload_changes() {
    let a = SignalPayload::decode(
        &SignalKind::Working,
        json!({"task": "demo-abc", "title": "t", "approach": "one"}),
    )
    .unwrap();
    let b = SignalPayload::decode(
        &SignalKind::Working,
        json!({"task": "demo-abc", "title": "t", "approach": "two"}),
    )
    .unwrap();
    assert_eq!(a.content_hash(), a.clone().content_hash());
    assert_ne!(a.content_hash(), b.content_hash());
}

#[test]
fn envelope_decodes_with_defaulted_payload() {
    let envelope: SignalEnvelope = serde_json::from_value(json!({"kind": "dead"})).unwrap();
    assert_eq!(envelope.kind, SignalKind::Dead);
    assert!(envelope.payload.is_null());
}
