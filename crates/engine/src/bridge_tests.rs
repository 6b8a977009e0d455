// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{BusConfig, SignalBus, SpawnMode, SpawnRequest};
use serde_json::json;
use squad_adapters::{FakeChannel, FakeNotifyAdapter, FakeTerminalAdapter};
use squad_core::{
    CoreConfig, FakeClock, SeqNameGen, SessionName, SignalEnvelope, SignalKind, TaskStatus,
};
use std::time::Duration;

type TestSupervisor =
    Supervisor<FakeTerminalAdapter, FakeNotifyAdapter, FakeClock, SeqNameGen>;
type TestBridge =
    ChannelBridge<FakeChannel, FakeTerminalAdapter, FakeNotifyAdapter, FakeClock, SeqNameGen>;

struct Harness {
    bridge: TestBridge,
    channel: FakeChannel,
    supervisor: Arc<TestSupervisor>,
    bus: Arc<SignalBus<FakeClock>>,
    stores: Arc<Stores>,
    clock: FakeClock,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let stores = Arc::new(Stores::open(dir.path(), "demo").unwrap());
    let bus = Arc::new(SignalBus::new(clock.clone(), BusConfig::default()));
    let supervisor = Arc::new(Supervisor::new(
        FakeTerminalAdapter::new(),
        FakeNotifyAdapter::new(),
        clock.clone(),
        SeqNameGen::new(),
        CoreConfig::default(),
        dir.path().to_path_buf(),
        Arc::clone(&stores),
        Arc::clone(&bus),
    ));
    let channel = FakeChannel::new(&["general", "ops"]);
    let bridge = ChannelBridge::new(
        channel.clone(),
        vec!["general".into()],
        clock.clone(),
        Arc::clone(&stores),
        Arc::clone(&supervisor),
    );
    Harness {
        bridge,
        channel,
        supervisor,
        bus,
        stores,
        clock,
        _dir: dir,
    }
}

fn message(channel: &str, thread: &str, text: &str) -> ChannelMessage {
    ChannelMessage {
        channel: channel.into(),
        thread: thread.into(),
        author: "casey".into(),
        text: text.into(),
        sent_at_ms: 42,
        is_reply: false,
    }
}

#[tokio::test]
async fn new_message_in_watched_channel_becomes_chat_task() {
    let h = harness();
    h.channel
        .push_incoming(message("general", "t1", "Can you fix the login page?"));

    let created = h.bridge.ingest_pending().await.unwrap();
    assert_eq!(created.len(), 1);
    let task = &created[0];
    assert_eq!(task.issue_type, IssueType::Chat);
    assert_eq!(task.title, "Can you fix the login page?");
    assert!(task.labels.contains("origin:general"));
    assert!(task.labels.contains("thread:t1"));
    assert!(task.description.contains("casey"));
}

#[tokio::test]
async fn unwatched_channels_are_ignored() {
    let h = harness();
    h.channel.push_incoming(message("ops", "t9", "deploy please"));
    let created = h.bridge.ingest_pending().await.unwrap();
    assert!(created.is_empty());
    assert!(h.stores.tasks.lock().is_empty());
}

#[tokio::test]
async fn reply_appends_follow_up_to_description() {
    let h = harness();
    h.channel.push_incoming(message("general", "t1", "first ask"));
    let created = h.bridge.ingest_pending().await.unwrap();
    let task_id = created[0].id.clone();

    h.channel
        .push_incoming(message("general", "t1", "also handle mobile"));
    let second = h.bridge.ingest_pending().await.unwrap();
    assert!(second.is_empty());

    let task = h.stores.tasks.lock().show(&task_id).unwrap();
    assert!(task.description.contains("follow-up from casey"));
    assert!(task.description.contains("also handle mobile"));
}

#[tokio::test]
async fn reply_resumes_paused_session_with_preamble() {
    let h = harness();
    h.channel.push_incoming(message("general", "t1", "first ask"));
    let created = h.bridge.ingest_pending().await.unwrap();
    let task_id = created[0].id.clone();

    // An agent picks up the chat task, then pauses
    h.supervisor
        .spawn(SpawnRequest {
            agent: Some("AlphaGlade".into()),
            task: Some(task_id.clone()),
            mode: SpawnMode::Chat,
            program: None,
            model: None,
        })
        .await
        .unwrap();
    h.supervisor.pause("squad-AlphaGlade").await.unwrap();

    h.channel
        .push_incoming(message("general", "t1", "yes, go ahead"));
    h.bridge.ingest_pending().await.unwrap();

    let record = h.supervisor.session("squad-AlphaGlade").unwrap();
    assert_eq!(record.state, squad_core::SessionState::Working);

    let terminal = h.supervisor.sessions();
    assert_eq!(terminal[0].task.as_ref(), Some(&task_id));
}

#[tokio::test]
async fn reply_injection_carries_the_fixed_preamble() {
    let terminal = FakeTerminalAdapter::new();
    // Build the pieces around a shared terminal we can inspect
    let clock = FakeClock::new();
    let dir = tempfile::tempdir().unwrap();
    let stores = Arc::new(Stores::open(dir.path(), "demo").unwrap());
    let bus = Arc::new(SignalBus::new(clock.clone(), BusConfig::default()));
    let supervisor = Arc::new(Supervisor::new(
        terminal.clone(),
        FakeNotifyAdapter::new(),
        clock.clone(),
        SeqNameGen::new(),
        CoreConfig::default(),
        dir.path().to_path_buf(),
        Arc::clone(&stores),
        bus,
    ));
    let channel = FakeChannel::new(&["general"]);
    let bridge = ChannelBridge::new(
        channel.clone(),
        vec!["general".into()],
        clock.clone(),
        Arc::clone(&stores),
        Arc::clone(&supervisor),
    );

    channel.push_incoming(message("general", "t1", "first ask"));
    let created = bridge.ingest_pending().await.unwrap();
    let task_id = created[0].id.clone();
    supervisor
        .spawn(SpawnRequest {
            agent: Some("AlphaGlade".into()),
            task: Some(task_id),
            mode: SpawnMode::Chat,
            program: None,
            model: None,
        })
        .await
        .unwrap();
    supervisor.pause("squad-AlphaGlade").await.unwrap();

    channel.push_incoming(message("general", "t1", "go ahead"));
    bridge.ingest_pending().await.unwrap();

    let input = terminal.input_for("squad-AlphaGlade");
    assert_eq!(input[0], "the user replied: go ahead");
    assert_eq!(input[1], "<Enter>");
}

#[tokio::test]
async fn outbound_reply_signal_reaches_the_thread() {
    let h = harness();
    h.channel.push_incoming(message("general", "t1", "first ask"));
    let created = h.bridge.ingest_pending().await.unwrap();
    let task_id = created[0].id.clone();

    h.clock.advance(Duration::from_millis(250));
    let signal = h
        .bus
        .publish(
            &SessionName::new("squad-AlphaGlade"),
            SignalEnvelope {
                kind: SignalKind::Reply,
                payload: json!({
                    "task": task_id,
                    "message": "done, deployed to staging",
                    "replyType": "completion",
                }),
                timestamp: None,
            },
        )
        .unwrap()
        .unwrap();

    assert!(h.bridge.forward_reply(&signal).await.unwrap());
    let sent = h.channel.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].thread, "t1");
    assert_eq!(sent[0].text, "done, deployed to staging");
}

#[tokio::test]
async fn reply_for_unknown_task_is_skipped() {
    let h = harness();
    h.clock.advance(Duration::from_millis(250));
    let signal = h
        .bus
        .publish(
            &SessionName::new("squad-AlphaGlade"),
            SignalEnvelope {
                kind: SignalKind::Reply,
                payload: json!({
                    "task": "demo-zzzz",
                    "message": "hello",
                    "replyType": "ack",
                }),
                timestamp: None,
            },
        )
        .unwrap()
        .unwrap();
    assert!(!h.bridge.forward_reply(&signal).await.unwrap());
    assert!(h.channel.sent().is_empty());
}

#[tokio::test]
async fn thread_index_rebuilds_from_labels() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let stores = Arc::new(Stores::open(dir.path(), "demo").unwrap());

    // First life ingests a chat task
    {
        let bus = Arc::new(SignalBus::new(clock.clone(), BusConfig::default()));
        let supervisor = Arc::new(Supervisor::new(
            FakeTerminalAdapter::new(),
            FakeNotifyAdapter::new(),
            clock.clone(),
            SeqNameGen::new(),
            CoreConfig::default(),
            dir.path().to_path_buf(),
            Arc::clone(&stores),
            bus,
        ));
        let channel = FakeChannel::new(&["general"]);
        let bridge = ChannelBridge::new(
            channel.clone(),
            vec!["general".into()],
            clock.clone(),
            Arc::clone(&stores),
            supervisor,
        );
        channel.push_incoming(message("general", "t1", "first ask"));
        bridge.ingest_pending().await.unwrap();
    }

    // Second life: the reply lands as a follow-up, not a new task
    let bus = Arc::new(SignalBus::new(clock.clone(), BusConfig::default()));
    let supervisor = Arc::new(Supervisor::new(
        FakeTerminalAdapter::new(),
        FakeNotifyAdapter::new(),
        clock.clone(),
        SeqNameGen::new(),
        CoreConfig::default(),
        dir.path().to_path_buf(),
        Arc::clone(&stores),
        bus,
    ));
    let channel = FakeChannel::new(&["general"]);
    let bridge = ChannelBridge::new(
        channel.clone(),
        vec!["general".into()],
        clock.clone(),
        Arc::clone(&stores),
        supervisor,
    );
    channel.push_incoming(message("general", "t1", "a reply"));
    let created = bridge.ingest_pending().await.unwrap();
    assert!(created.is_empty());
    assert_eq!(h_len(&stores), 1);
}

fn h_len(stores: &Stores) -> usize {
    stores.tasks.lock().len()
}

#[tokio::test]
async fn chat_tasks_keep_status_open_until_claimed() {
    let h = harness();
    h.channel.push_incoming(message("general", "t1", "ask"));
    let created = h.bridge.ingest_pending().await.unwrap();
    assert_eq!(created[0].status, TaskStatus::Open);
}
