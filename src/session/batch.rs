//! Batch (print-mode) agent invocation
//!
//! Runs one non-interactive agent prompt through the user's login shell with
//! structured streaming output, decoding the JSON-Lines stream as it arrives.
//! Blocking by design; callers run it on a worker thread.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Mutex;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::models::StreamEvent;
use crate::stream::StreamDecoder;
use crate::term::Utf8Carry;

/// Locations probed when the login shell cannot resolve the agent executable
const FALLBACK_AGENT_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin"];

/// Resolved executable paths, keyed by agent command name
static RESOLVED_AGENTS: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Run one prompt through the agent CLI in print mode.
///
/// The invocation goes through `config.shell` as an interactive login shell
/// so the agent inherits the user's environment, with stderr merged into the
/// stream. Each decoded [`StreamEvent`] is handed to `on_event` as it
/// arrives; the return value is the full collected response text, or
/// [`Error::BatchFailed`] carrying the stream's recorded error message (or a
/// generic exit-code message when none was recorded).
pub fn run_batch(
    prompt: &str,
    workspace: &Path,
    config: &SessionConfig,
    mut on_event: impl FnMut(StreamEvent),
) -> Result<String> {
    let agent = resolve_agent_path(&config.shell, &config.agent_command)?;
    let command = format!(
        "cd {} && {} -p --output-format stream-json --include-partial-messages {} 2>&1",
        shell_quoted(&workspace.to_string_lossy()),
        shell_quoted(&agent),
        shell_quoted(prompt),
    );
    debug!(workspace = %workspace.display(), "starting batch invocation");

    let mut child = Command::new(&config.shell)
        .args(["-ilc", &command])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::SpawnFailed {
            command: config.shell.clone(),
            reason: e.to_string(),
        })?;

    let mut decoder = StreamDecoder::new();
    let mut carry = Utf8Carry::new();
    if let Some(mut stdout) = child.stdout.take() {
        let mut buf = [0u8; 8192];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    let text = carry.push(&buf[..n]);
                    for event in decoder.feed(&text) {
                        on_event(event);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    let status = child.wait()?;
    let exit_code = status.code().unwrap_or(-1);
    let residual = carry.flush();
    if !residual.is_empty() {
        for event in decoder.feed(&residual) {
            on_event(event);
        }
    }

    let (events, result) = decoder.finish(exit_code);
    for event in events {
        on_event(event);
    }
    result
}

/// Resolve the agent executable path, caching successful lookups.
///
/// Absolute paths are accepted as-is when they exist. Otherwise the login
/// shell is asked via `command -v`, then a short list of well-known install
/// directories is probed, matching where the CLI's installer places it.
pub fn resolve_agent_path(shell: &str, agent_command: &str) -> Result<String> {
    if let Some(cached) = RESOLVED_AGENTS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(agent_command)
    {
        return Ok(cached.clone());
    }

    let resolved = probe_agent_path(shell, agent_command).ok_or_else(|| Error::AgentNotFound {
        command: agent_command.to_string(),
    })?;
    debug!(agent = agent_command, path = %resolved, "agent executable resolved");

    RESOLVED_AGENTS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .insert(agent_command.to_string(), resolved.clone());
    Ok(resolved)
}

fn probe_agent_path(shell: &str, agent_command: &str) -> Option<String> {
    let direct = Path::new(agent_command);
    if direct.is_absolute() && direct.exists() {
        return Some(agent_command.to_string());
    }

    let probe = Command::new(shell)
        .args(["-ilc", &format!("command -v {}", shell_quoted(agent_command))])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output();
    if let Ok(output) = probe {
        if output.status.success() {
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if found.starts_with('/') && Path::new(&found).exists() {
                return Some(found);
            }
        }
    }

    let home = dirs::home_dir();
    let home_candidates = home
        .iter()
        .flat_map(|h| [h.join(".local/bin"), h.join("bin")]);
    FALLBACK_AGENT_DIRS
        .iter()
        .map(|dir| Path::new(dir).to_path_buf())
        .chain(home_candidates)
        .map(|dir| dir.join(agent_command))
        .find(|candidate| candidate.exists())
        .map(|candidate| candidate.to_string_lossy().into_owned())
}

/// Single-quote `value` for safe interpolation into a shell command line
fn shell_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
