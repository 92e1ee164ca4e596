//! Integration tests for the PTY handle lifecycle
//!
//! These tests spawn real child processes through a real pseudo-terminal
//! and verify spawn, I/O, exit reporting, and termination behavior.

use agentterm::{Error, PtyHandle};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

fn handle() -> PtyHandle {
    PtyHandle::new(40, Duration::from_millis(5), Duration::from_millis(150))
}

fn collect_output(rx: &mpsc::Receiver<Vec<u8>>, needle: &str, timeout: Duration) -> String {
    let deadline = Instant::now() + timeout;
    let mut collected = Vec::new();
    while Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(chunk) => {
                collected.extend(chunk);
                if String::from_utf8_lossy(&collected).contains(needle) {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    String::from_utf8_lossy(&collected).into_owned()
}

#[test]
fn test_spawn_produces_output_and_clean_exit() {
    let (data_tx, data_rx) = mpsc::channel();
    let (exit_tx, exit_rx) = mpsc::channel();

    let pty = handle();
    pty.on_data(move |chunk| {
        let _ = data_tx.send(chunk);
    });
    pty.on_exit(move |code| {
        let _ = exit_tx.send(code);
    });
    pty.start(
        "/bin/sh",
        &["-c".to_string(), "echo lifecycle-marker".to_string()],
        Path::new("/tmp"),
    )
    .expect("spawn");
    assert!(pty.is_started());
    assert!(pty.pid().is_some());

    let output = collect_output(&data_rx, "lifecycle-marker", Duration::from_secs(5));
    assert!(output.contains("lifecycle-marker"), "output: {output:?}");

    let code = exit_rx.recv_timeout(Duration::from_secs(5)).expect("exit");
    assert_eq!(code, 0);
}

#[test]
fn test_write_reaches_child_stdin() {
    let (data_tx, data_rx) = mpsc::channel();
    let pty = handle();
    pty.on_data(move |chunk| {
        let _ = data_tx.send(chunk);
    });
    pty.start(
        "/bin/sh",
        &[
            "-c".to_string(),
            "read line; echo \"got-$line\"".to_string(),
        ],
        Path::new("/tmp"),
    )
    .expect("spawn");

    pty.write(b"ping\r").expect("write");
    let output = collect_output(&data_rx, "got-ping", Duration::from_secs(5));
    assert!(output.contains("got-ping"), "output: {output:?}");
}

#[test]
fn test_nonzero_exit_code_reported() {
    let (exit_tx, exit_rx) = mpsc::channel();
    let pty = handle();
    pty.on_exit(move |code| {
        let _ = exit_tx.send(code);
    });
    pty.start(
        "/bin/sh",
        &["-c".to_string(), "exit 3".to_string()],
        Path::new("/tmp"),
    )
    .expect("spawn");

    let code = exit_rx.recv_timeout(Duration::from_secs(5)).expect("exit");
    assert_eq!(code, 3);
}

#[test]
fn test_terminate_kills_child_and_is_idempotent() {
    let (exit_tx, exit_rx) = mpsc::channel();
    let pty = handle();
    pty.on_exit(move |code| {
        let _ = exit_tx.send(code);
    });
    pty.start(
        "/bin/sh",
        &["-c".to_string(), "sleep 60".to_string()],
        Path::new("/tmp"),
    )
    .expect("spawn");
    let pid = pty.pid().expect("pid");

    pty.terminate(true);
    pty.terminate(true);
    pty.terminate(false);
    assert!(!pty.is_started());

    // Exit reported exactly once, with the signal sentinel
    let code = exit_rx.recv_timeout(Duration::from_secs(5)).expect("exit");
    assert_eq!(code, -1);
    assert!(exit_rx.recv_timeout(Duration::from_millis(200)).is_err());

    // The child must actually be gone, not leaked
    let deadline = Instant::now() + Duration::from_secs(5);
    let proc_path = format!("/proc/{}", pid);
    while Instant::now() < deadline && Path::new(&proc_path).exists() {
        std::thread::sleep(Duration::from_millis(20));
    }
    assert!(!Path::new(&proc_path).exists(), "child {pid} still alive");
}

#[test]
fn test_double_start_is_rejected() {
    let pty = handle();
    pty.start(
        "/bin/sh",
        &["-c".to_string(), "sleep 2".to_string()],
        Path::new("/tmp"),
    )
    .expect("spawn");
    let second = pty.start(
        "/bin/sh",
        &["-c".to_string(), "true".to_string()],
        Path::new("/tmp"),
    );
    assert!(second.is_err());
    pty.terminate(true);
}

#[test]
fn test_spawn_failure_leaves_handle_idle() {
    let pty = handle();
    let result = pty.start(
        "/nonexistent/shell-binary",
        &[],
        Path::new("/tmp"),
    );
    assert!(matches!(result, Err(Error::SpawnFailed { .. })));
    assert!(!pty.is_started());
    // A failed start leaves the handle usable for error reporting paths
    assert!(matches!(pty.write(b"x"), Err(Error::PtyNotStarted)));
}
