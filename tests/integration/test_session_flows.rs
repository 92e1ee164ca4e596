//! Integration tests for full session scenarios
//!
//! Sessions are driven against real PTYs running scripted shells, so the
//! whole pipeline is exercised: spawn → raw bytes → normalization →
//! segmentation → stage rules → observable events.

use agentterm::{Error, Session, SessionConfig, SessionEvent, SessionStage};
use std::time::{Duration, Instant};

/// Config that runs a scripted command instead of an interactive shell
fn scripted(script: &str) -> SessionConfig {
    SessionConfig {
        shell: "/bin/sh".to_string(),
        shell_args: vec!["-c".to_string(), script.to_string()],
        ..Default::default()
    }
}

/// Pump the session until `done` returns true or the timeout elapses,
/// returning every event observed along the way.
fn pump_until(
    session: &mut Session,
    timeout: Duration,
    mut done: impl FnMut(&[SessionEvent]) -> bool,
) -> Vec<SessionEvent> {
    let deadline = Instant::now() + timeout;
    let mut all = Vec::new();
    while Instant::now() < deadline {
        let events = session.pump().expect("pump");
        all.extend(events);
        if done(&all) {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    all
}

#[test]
fn test_normal_session_scenario() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let script = "printf 'Welcome, logged in as x\\n$ ls\\nfile-a\\n$ \\n'; sleep 0.1";
    let mut session = Session::new(scripted(script)).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");
    assert_eq!(session.stage(), SessionStage::LoginRequired);

    let events = pump_until(&mut session, Duration::from_secs(10), |events| {
        events.iter().any(|e| matches!(e, SessionEvent::Exited(_)))
    });

    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::StageChanged(SessionStage::ReadyToLaunch))),
        "events: {events:?}"
    );
    assert!(events.iter().any(
        |e| matches!(e, SessionEvent::Entry(entry) if entry.command == "ls" && entry.output == "file-a" && !entry.is_error)
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::Exited(0))));

    // Shell exit resets the session
    assert_eq!(session.stage(), SessionStage::Disconnected);
    assert!(!session.is_connected());
    assert_eq!(session.entries().len(), 1);
}

#[test]
fn test_connect_timeout_tears_down_silent_shell() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut config = scripted("sleep 30");
    config.connect_timeout_ms = 300;
    let mut session = Session::new(config).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut timeout_error = None;
    while Instant::now() < deadline {
        match session.pump() {
            Ok(_) => std::thread::sleep(Duration::from_millis(20)),
            Err(e) => {
                timeout_error = Some(e);
                break;
            }
        }
    }

    assert!(
        matches!(timeout_error, Some(Error::ConnectTimeout { .. })),
        "expected a connect timeout, got {timeout_error:?}"
    );
    assert_eq!(session.stage(), SessionStage::Disconnected);
    assert!(!session.is_connected());
}

#[test]
fn test_resume_token_flow() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let script = "printf 'claude --resume 123e4567-e89b-12d3-a456-426614174000\\n'; sleep 0.1";
    let mut session = Session::new(scripted(script)).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");

    let events = pump_until(&mut session, Duration::from_secs(10), |events| {
        events.iter().any(|e| matches!(e, SessionEvent::Exited(_)))
    });

    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::ResumeTokenDiscovered(token)
            if token == "123e4567-e89b-12d3-a456-426614174000"
    )));
    assert_eq!(session.resume_store().len(), 1);
}

#[test]
fn test_disconnect_drops_partial_state() {
    let workspace = tempfile::tempdir().expect("tempdir");
    // Open a record, never close it
    let script = "printf '$ tail -f log\\nhalf an output line\\n'; sleep 30";
    let mut session = Session::new(scripted(script)).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");

    pump_until(&mut session, Duration::from_secs(5), |events| {
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Output(text) if text.contains("half an output")))
    });

    session.disconnect();
    assert_eq!(session.stage(), SessionStage::Disconnected);
    // The open record was dropped, not emitted
    assert!(session.entries().is_empty());
    // Disconnect is idempotent
    session.disconnect();
}

#[test]
fn test_stale_attempt_events_are_dropped() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let script = "printf 'Welcome, logged in as x\\n'; sleep 30";
    let mut session = Session::new(scripted(script)).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");

    // Give the first shell time to emit, then supersede it without pumping
    std::thread::sleep(Duration::from_millis(300));
    session.disconnect();

    // Notices from the superseded attempt must not resurrect the stage
    let events = session.pump().expect("pump");
    assert!(events.is_empty(), "stale events leaked: {events:?}");
    assert_eq!(session.stage(), SessionStage::Disconnected);
}

#[test]
fn test_interactive_write_path() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let mut session = Session::new(scripted("cat")).expect("session");
    session.set_workspace(workspace.path());
    session.connect().expect("connect");

    // Wait for the attempt to become live before poking it
    std::thread::sleep(Duration::from_millis(200));
    session.submit_command("hello-cat").expect("write");

    let events = pump_until(&mut session, Duration::from_secs(10), |events| {
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Output(text) if text.contains("hello-cat")))
    });
    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Output(text) if text.contains("hello-cat"))),
        "events: {events:?}"
    );

    session.disconnect();
}

#[test]
fn test_pending_action_replayed_on_connect() {
    let workspace = tempfile::tempdir().expect("tempdir");
    // cat echoes whatever the replayed action writes back to us
    let mut session = Session::new(scripted("cat")).expect("session");
    session.set_workspace(workspace.path());

    session.enter_interactive().expect("queue");
    assert!(session.pending_action().is_some());

    session.connect().expect("connect");
    assert!(session.pending_action().is_none());
    let events = pump_until(&mut session, Duration::from_secs(10), |events| {
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Output(text) if text.contains("claude")))
    });

    assert!(
        events
            .iter()
            .any(|e| matches!(e, SessionEvent::Output(text) if text.contains("claude"))),
        "events: {events:?}"
    );
    session.disconnect();
}
