//! Owning PTY handle
//!
//! One `PtyHandle` exclusively owns one PTY master and one child process.
//! `start()` allocates the pair via `portable-pty`, spawns the child with
//! the slave as its controlling terminal, and launches two background
//! threads: a reader that forwards output chunks to the data callback and
//! a waiter that reaps the child and fires the exit callback exactly once,
//! after the read loop has finished. `terminate()` is idempotent and safe
//! from any thread; dropping the handle terminates too.

use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Exit code reported when the child was terminated by a signal we sent
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Read buffer size for the PTY reader thread
const READ_BUFFER_SIZE: usize = 8192;

/// How long the wait thread gives the read loop to observe EOF before
/// reporting exit anyway
const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Callback invoked with each chunk of raw PTY output
pub type DataCallback = Box<dyn FnMut(Vec<u8>) + Send + 'static>;

/// Callback invoked exactly once with the child's exit code
pub type ExitCallback = Box<dyn FnOnce(i32) + Send + 'static>;

/// Live I/O state; present between `start()` and `terminate()`/EOF teardown
struct PtyIo {
    writer: Box<dyn Write + Send>,
    /// Held to keep the master descriptor open; dropping closes it
    master: Box<dyn MasterPty + Send>,
    pid: Option<u32>,
}

/// Owning handle to a pseudo-terminal and its child process.
///
/// Handles are single-use: one `start()` per handle, a fresh handle per
/// session. This keeps the background threads free of reuse races.
pub struct PtyHandle {
    io: Arc<Mutex<Option<PtyIo>>>,
    on_data: Arc<Mutex<Option<DataCallback>>>,
    on_exit: Arc<Mutex<Option<ExitCallback>>>,
    /// Latched by `start()`; a handle never spawns twice
    started: AtomicBool,
    /// Set by `terminate()`; stops callback delivery before teardown
    shutdown: Arc<AtomicBool>,
    write_retry_attempts: u32,
    write_retry_delay: Duration,
    kill_grace: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PtyHandle {
    /// Create an idle handle with the given write-retry and kill-grace bounds
    pub fn new(write_retry_attempts: u32, write_retry_delay: Duration, kill_grace: Duration) -> Self {
        Self {
            io: Arc::new(Mutex::new(None)),
            on_data: Arc::new(Mutex::new(None)),
            on_exit: Arc::new(Mutex::new(None)),
            started: AtomicBool::new(false),
            shutdown: Arc::new(AtomicBool::new(false)),
            write_retry_attempts,
            write_retry_delay,
            kill_grace,
        }
    }

    /// Register the data callback. Chunks are delivered in read order;
    /// chunk boundaries carry no meaning and may split multi-byte UTF-8.
    pub fn on_data(&self, callback: impl FnMut(Vec<u8>) + Send + 'static) {
        *lock(&self.on_data) = Some(Box::new(callback));
    }

    /// Register the exit callback; fires exactly once, after the read loop ends
    pub fn on_exit(&self, callback: impl FnOnce(i32) + Send + 'static) {
        *lock(&self.on_exit) = Some(Box::new(callback));
    }

    /// Allocate the PTY, spawn `command` with `args` in `working_directory`,
    /// and start the reader and wait threads.
    ///
    /// The child inherits the parent environment with `TERM` forced to a sane
    /// value. No descriptors leak on any failure path: everything opened is
    /// dropped before returning.
    pub fn start(&self, command: &str, args: &[String], working_directory: &Path) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::Other("PTY handle already started".to_string()));
        }

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::PtyAllocationFailed {
                reason: e.to_string(),
            })?;

        let mut builder = CommandBuilder::new(command);
        builder.args(args);
        builder.cwd(working_directory);
        // Pass the full environment through so the shell behaves like the
        // user's own login sessions
        for (key, value) in std::env::vars() {
            builder.env(key, value);
        }
        builder.env("TERM", "xterm-256color");

        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|e| Error::SpawnFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;
        // The slave belongs to the child now
        drop(pair.slave);

        let pid = child.process_id();
        let writer = match pair.master.take_writer() {
            Ok(writer) => writer,
            Err(e) => {
                // Descriptor setup failed; do not leak the spawned child
                let _ = child.kill();
                return Err(Error::SpawnFailed {
                    command: command.to_string(),
                    reason: e.to_string(),
                });
            }
        };
        let reader = match pair.master.try_clone_reader() {
            Ok(reader) => reader,
            Err(e) => {
                let _ = child.kill();
                return Err(Error::SpawnFailed {
                    command: command.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        *lock(&self.io) = Some(PtyIo {
            writer,
            master: pair.master,
            pid,
        });
        debug!(pid = pid.unwrap_or(0), command, "PTY spawned");

        let (reader_done_tx, reader_done_rx) = channel::<()>();
        self.spawn_read_loop(reader, reader_done_tx);
        self.spawn_wait_loop(child, reader_done_rx);
        Ok(())
    }

    /// Write bytes to the PTY master, retrying briefly on would-block.
    ///
    /// Fails with [`Error::PtyNotStarted`] when the handle is idle and
    /// [`Error::PtyWriteFailed`] on a non-transient error or exhausted retries.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        let mut guard = lock(&self.io);
        let io = guard.as_mut().ok_or(Error::PtyNotStarted)?;

        let mut remaining = data;
        let mut attempts = 0u32;
        while !remaining.is_empty() {
            match io.writer.write(remaining) {
                Ok(written) => {
                    remaining = &remaining[written..];
                    attempts = 0;
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        && attempts < self.write_retry_attempts =>
                {
                    attempts += 1;
                    thread::sleep(self.write_retry_delay);
                }
                Err(e) => {
                    return Err(Error::PtyWriteFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
        if let Err(e) = io.writer.flush() {
            debug!("PTY flush error: {}", e);
        }
        Ok(())
    }

    /// Whether the handle currently owns a live master descriptor
    pub fn is_started(&self) -> bool {
        lock(&self.io).is_some()
    }

    /// The child's process id, if started
    pub fn pid(&self) -> Option<u32> {
        lock(&self.io).as_ref().and_then(|io| io.pid)
    }

    /// Stop the read loop, signal the child, and close the master.
    ///
    /// Teardown order matters: callbacks stop first, then the child gets
    /// SIGTERM (escalating to SIGKILL after the grace period when `force`),
    /// then the descriptor closes. Idempotent and safe from any thread.
    pub fn terminate(&self, force: bool) {
        self.shutdown.store(true, Ordering::SeqCst);
        let Some(io) = lock(&self.io).take() else {
            return;
        };

        if let Some(pid) = io.pid {
            send_signal(pid, false);
            if force {
                let grace = self.kill_grace;
                thread::spawn(move || {
                    thread::sleep(grace);
                    send_signal(pid, true);
                });
            }
        }
        // Dropping the writer and master closes the descriptor, which also
        // unblocks the reader thread.
        drop(io);
    }

    fn spawn_read_loop(&self, mut reader: Box<dyn Read + Send>, done: Sender<()>) {
        let on_data = Arc::clone(&self.on_data);
        let shutdown = Arc::clone(&self.shutdown);
        thread::spawn(move || {
            let mut buf = [0u8; READ_BUFFER_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        debug!("PTY read EOF");
                        break;
                    }
                    Ok(n) => {
                        if shutdown.load(Ordering::SeqCst) {
                            break;
                        }
                        if let Some(callback) = lock(&on_data).as_mut() {
                            callback(buf[..n].to_vec());
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        if shutdown.load(Ordering::SeqCst) {
                            break;
                        }
                        thread::sleep(Duration::from_millis(10));
                    }
                    Err(e) => {
                        // Master closed or child gone
                        debug!("PTY read ended: {}", e);
                        break;
                    }
                }
            }
            let _ = done.send(());
        });
    }

    fn spawn_wait_loop(
        &self,
        mut child: Box<dyn portable_pty::Child + Send + Sync>,
        reader_done: Receiver<()>,
    ) {
        let on_exit = Arc::clone(&self.on_exit);
        let shutdown = Arc::clone(&self.shutdown);
        let io = Arc::clone(&self.io);
        thread::spawn(move || {
            let code = match child.wait() {
                Ok(status) if status.success() => 0,
                Ok(status) => {
                    if shutdown.load(Ordering::SeqCst) {
                        SIGNAL_EXIT_CODE
                    } else {
                        status.exit_code() as i32
                    }
                }
                Err(_) => SIGNAL_EXIT_CODE,
            };

            // The exit callback must not outrun the read loop
            let _ = reader_done.recv_timeout(READER_DRAIN_TIMEOUT);

            // Natural exit: release the master so the handle reads as stopped
            lock(&io).take();

            if let Some(callback) = lock(&on_exit).take() {
                callback(code);
            }
            debug!(exit_code = code, "PTY child reaped");
        });
    }
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        self.terminate(true);
    }
}

/// Deliver SIGTERM (or SIGKILL) to `pid`, checking liveness first for the kill path
#[cfg(unix)]
fn send_signal(pid: u32, kill: bool) {
    use nix::sys::signal::{kill as nix_kill, Signal};
    use nix::unistd::Pid;

    let target = Pid::from_raw(pid as i32);
    if kill {
        if nix_kill(target, None).is_ok() {
            let _ = nix_kill(target, Signal::SIGKILL);
        }
    } else if let Err(e) = nix_kill(target, Signal::SIGTERM) {
        debug!("SIGTERM delivery failed for pid {}: {}", pid, e);
    }
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _kill: bool) {
    // Closing the master tears the child down on non-Unix platforms
}
