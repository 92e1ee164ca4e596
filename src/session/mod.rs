//! Session aggregate
//!
//! The single-owner state machine over one embedded agent shell. All PTY
//! callbacks post messages into a channel tagged with the connect attempt's
//! identity token; the owner drains them through [`Session::pump`], so stage,
//! history, and pending-action state are only ever mutated on the caller's
//! context and stale callbacks from a superseded attempt are dropped.

pub mod batch;
pub mod resume;
pub mod stage;

pub use batch::{resolve_agent_path, run_batch};
pub use resume::ResumeStore;
pub use stage::StageRules;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::models::{EntrySource, PendingAction, SessionStage, StreamEvent, TerminalEntry};
use crate::pty::PtyHandle;
use crate::term::{normalize, LineSegmenter, Utf8Carry, NO_OUTPUT};

/// Observable outcome of one [`Session::pump`] drain
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session stage changed
    StageChanged(SessionStage),
    /// Normalized output text, ready for display
    Output(String),
    /// A command/output record was finalized
    Entry(TerminalEntry),
    /// A resume token was discovered and saved
    ResumeTokenDiscovered(String),
    /// The shell process exited with the given code
    Exited(i32),
}

/// Message posted by PTY threads, tagged with the attempt that produced it
#[derive(Debug)]
enum PtyNotice {
    Data(Uuid, Vec<u8>),
    Exit(Uuid, i32),
}

/// Aggregate root for one embedded agent shell session
pub struct Session {
    config: SessionConfig,
    stage: SessionStage,
    workspace: Option<PathBuf>,
    pending_action: Option<PendingAction>,
    /// At most one live child process per session
    pty: Option<PtyHandle>,
    /// Identity of the current connect attempt; regenerating it invalidates
    /// all in-flight notices from previous attempts
    attempt: Uuid,
    notice_tx: mpsc::UnboundedSender<PtyNotice>,
    notice_rx: mpsc::UnboundedReceiver<PtyNotice>,
    /// Connect deadline; cleared by the first output of the current attempt
    deadline: Option<Instant>,
    utf8: Utf8Carry,
    segmenter: LineSegmenter,
    rules: StageRules,
    entries: Vec<TerminalEntry>,
    resume_store: ResumeStore,
}

impl Session {
    /// Create a disconnected session with the given configuration
    pub fn new(config: SessionConfig) -> Result<Self> {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let segmenter = LineSegmenter::new(&config.agent_command)?;
        let rules = StageRules::new(&config.agent_command);
        let resume_store = ResumeStore::new(config.max_resume_sessions);
        Ok(Self {
            config,
            stage: SessionStage::Disconnected,
            workspace: None,
            pending_action: None,
            pty: None,
            attempt: Uuid::new_v4(),
            notice_tx,
            notice_rx,
            deadline: None,
            utf8: Utf8Carry::new(),
            segmenter,
            rules,
            entries: Vec::new(),
            resume_store,
        })
    }

    /// Select the workspace directory used by connect and batch runs
    pub fn set_workspace(&mut self, path: impl Into<PathBuf>) {
        self.workspace = Some(path.into());
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    pub fn is_connected(&self) -> bool {
        self.pty.is_some()
    }

    /// Terminal history, oldest first, bounded by `config.max_entries`
    pub fn entries(&self) -> &[TerminalEntry] {
        &self.entries
    }

    pub fn resume_store(&self) -> &ResumeStore {
        &self.resume_store
    }

    pub fn resume_store_mut(&mut self) -> &mut ResumeStore {
        &mut self.resume_store
    }

    /// Spawn the interactive shell in the selected workspace.
    ///
    /// Any previous handle is torn down first; the new attempt gets a fresh
    /// identity token and a connect deadline. Spawn failure resets the stage
    /// to `Disconnected` and is returned without retry.
    pub fn connect(&mut self) -> Result<()> {
        let workspace = self
            .workspace
            .clone()
            .ok_or(Error::WorkspaceNotSelected)?;
        if let Some(previous) = self.pty.take() {
            previous.terminate(true);
        }

        self.attempt = Uuid::new_v4();
        self.stage = SessionStage::PreparingShell;
        self.utf8.reset();
        self.segmenter.reset();

        let handle = PtyHandle::new(
            self.config.write_retry_attempts,
            Duration::from_millis(self.config.write_retry_delay_ms),
            self.config.kill_grace(),
        );
        let attempt = self.attempt;
        let tx = self.notice_tx.clone();
        handle.on_data(move |chunk| {
            let _ = tx.send(PtyNotice::Data(attempt, chunk));
        });
        let tx = self.notice_tx.clone();
        handle.on_exit(move |code| {
            let _ = tx.send(PtyNotice::Exit(attempt, code));
        });

        match handle.start(&self.config.shell, &self.config.shell_args, &workspace) {
            Ok(()) => {
                info!(shell = %self.config.shell, workspace = %workspace.display(), "shell connected");
                self.pty = Some(handle);
                self.stage = SessionStage::LoginRequired;
                self.deadline = Some(Instant::now() + self.config.connect_timeout());
                self.replay_pending_action();
                Ok(())
            }
            Err(e) => {
                error!("shell spawn failed: {}", e);
                self.stage = SessionStage::Disconnected;
                Err(e)
            }
        }
    }

    /// Force-terminate the shell and reset to `Disconnected`.
    ///
    /// Buffered partial state (line carry, open record) is dropped, not
    /// emitted; in-flight callbacks from the old attempt are invalidated.
    pub fn disconnect(&mut self) {
        self.attempt = Uuid::new_v4();
        if let Some(pty) = self.pty.take() {
            pty.terminate(true);
        }
        self.utf8.reset();
        self.segmenter.reset();
        self.deadline = None;
        self.stage = SessionStage::Disconnected;
        debug!("session disconnected");
    }

    /// Drain pending PTY notices and apply them.
    ///
    /// Call this periodically (or when woken by the embedding layer). Returns
    /// the observable events produced by this drain, or
    /// [`Error::ConnectTimeout`] when the current attempt produced no output
    /// within the configured bound; the timeout tears the handle down first
    /// so no child process leaks.
    pub fn pump(&mut self) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();
        while let Ok(notice) = self.notice_rx.try_recv() {
            match notice {
                PtyNotice::Data(id, bytes) if id == self.attempt => {
                    self.handle_chunk(&bytes, &mut events);
                }
                PtyNotice::Exit(id, code) if id == self.attempt => {
                    self.handle_exit(code, &mut events);
                }
                stale => trace!(?stale, "dropping notice from superseded attempt"),
            }
        }

        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                warn!("no shell output within the connect timeout");
                self.disconnect();
                return Err(Error::ConnectTimeout {
                    timeout: self.config.connect_timeout(),
                });
            }
        }
        Ok(events)
    }

    /// Send a command line to the shell (a carriage return is appended)
    pub fn submit_command(&mut self, command: &str) -> Result<()> {
        self.write(&format!("{}\r", command))
    }

    /// Write raw text to the shell's input
    pub fn write(&self, text: &str) -> Result<()> {
        let pty = self.pty.as_ref().ok_or(Error::PtyNotStarted)?;
        pty.write(text.as_bytes())
    }

    /// Start the browser-based login flow, or queue it while disconnected
    pub fn start_browser_login(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.queue_action(PendingAction::BrowserLogin);
            return Ok(());
        }
        self.write(&format!("{} login\r", self.config.agent_command))?;
        self.stage = SessionStage::Authenticating;
        Ok(())
    }

    /// Start the API-key login flow, or queue it while disconnected
    pub fn start_api_login(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.queue_action(PendingAction::ApiLogin);
            return Ok(());
        }
        self.write(&format!("{} auth login\r", self.config.agent_command))?;
        self.stage = SessionStage::Authenticating;
        Ok(())
    }

    /// Launch the agent CLI interactively, or queue it while disconnected
    pub fn enter_interactive(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.queue_action(PendingAction::EnterInteractive);
            return Ok(());
        }
        self.write(&format!("{}\r", self.config.agent_command))
    }

    /// Answer the workspace trust prompt affirmatively
    pub fn confirm_trust(&mut self) -> Result<()> {
        self.write("1\r")
    }

    /// Decline the workspace trust prompt
    pub fn decline_trust(&mut self) -> Result<()> {
        self.write("2\r")
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.pending_action
    }

    /// Run one prompt through the agent in batch (print) mode, recording the
    /// outcome as a `ProtocolBatch` history entry. Blocking; run off any
    /// latency-sensitive thread.
    pub fn run_batch(
        &mut self,
        prompt: &str,
        mut on_event: impl FnMut(StreamEvent),
    ) -> Result<String> {
        let workspace = self
            .workspace
            .clone()
            .ok_or(Error::WorkspaceNotSelected)?;
        let result = batch::run_batch(prompt, &workspace, &self.config, &mut on_event);
        match &result {
            Ok(text) => {
                let output = if text.trim().is_empty() {
                    NO_OUTPUT.to_string()
                } else {
                    text.clone()
                };
                self.store_entry(TerminalEntry::new(
                    prompt.to_string(),
                    output,
                    false,
                    EntrySource::ProtocolBatch,
                ));
            }
            Err(Error::BatchFailed { message }) => {
                self.store_entry(TerminalEntry::new(
                    prompt.to_string(),
                    message.clone(),
                    true,
                    EntrySource::ProtocolBatch,
                ));
            }
            Err(_) => {}
        }
        result
    }

    fn queue_action(&mut self, action: PendingAction) {
        if let Some(previous) = self.pending_action.replace(action) {
            debug!(?previous, ?action, "pending action overwritten");
        }
    }

    fn handle_chunk(&mut self, bytes: &[u8], events: &mut Vec<SessionEvent>) {
        // First output of this attempt: the connection is live
        self.deadline = None;

        let text = self.utf8.push(bytes);
        if !text.is_empty() {
            let normalized = normalize(&text);
            if !normalized.is_empty() {
                events.push(SessionEvent::Output(normalized.clone()));
            }

            let out = self.segmenter.feed(&normalized);
            for entry in out.entries {
                self.store_entry(entry.clone());
                events.push(SessionEvent::Entry(entry));
            }
            for token in out.resume_tokens {
                if self.resume_store.save(&token, None) {
                    events.push(SessionEvent::ResumeTokenDiscovered(token));
                }
            }
            for line in &out.lines {
                if let Some(next) = self.rules.evaluate(line, self.stage) {
                    self.set_stage(next, events);
                }
            }
        }
    }

    fn handle_exit(&mut self, code: i32, events: &mut Vec<SessionEvent>) {
        info!(exit_code = code, "shell exited");
        if let Some(entry) = self.segmenter.flush() {
            self.store_entry(entry.clone());
            events.push(SessionEvent::Entry(entry));
        }
        self.utf8.reset();
        self.pty = None;
        self.deadline = None;
        events.push(SessionEvent::Exited(code));
        self.set_stage(SessionStage::Disconnected, events);
    }

    fn replay_pending_action(&mut self) {
        let Some(action) = self.pending_action.take() else {
            return;
        };
        debug!(?action, "replaying pending action");
        let result = match action {
            PendingAction::BrowserLogin => self.start_browser_login(),
            PendingAction::ApiLogin => self.start_api_login(),
            PendingAction::EnterInteractive => self.enter_interactive(),
        };
        if let Err(e) = result {
            warn!("pending action replay failed: {}", e);
        }
    }

    fn set_stage(&mut self, next: SessionStage, events: &mut Vec<SessionEvent>) {
        if next != self.stage {
            debug!(from = ?self.stage, to = ?next, "stage transition");
            self.stage = next;
            events.push(SessionEvent::StageChanged(next));
        }
    }

    fn store_entry(&mut self, entry: TerminalEntry) {
        self.entries.push(entry);
        if self.entries.len() > self.config.max_entries {
            let overflow = self.entries.len() - self.config.max_entries;
            self.entries.drain(..overflow);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(pty) = self.pty.take() {
            pty.terminate(true);
        }
    }
}
