//! Out-of-line search process transport.
//!
//! `SearchProcess` is the seam between the engine bridge and whatever runs
//! the search. `ChildProcess` spawns a UCI executable and moves its stdout
//! onto a channel from a reader thread, so reading never blocks the session.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::errors::{ControllerError, ControllerResult};
use crate::uci::uci_messages::EngineCommand;

/// How long an engine gets to act on `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_millis(250);
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub trait SearchProcess: Send {
    /// Send one protocol line. Must not wait for an answer.
    fn send_line(&mut self, line: &str) -> ControllerResult<()>;

    /// Next line printed by the process, if one has arrived.
    fn try_read_line(&mut self) -> Option<String>;

    /// False once the process has closed its output.
    fn is_alive(&self) -> bool {
        true
    }
}

pub struct ChildProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    closed: bool,
}

impl ChildProcess {
    pub fn spawn(program: &str, args: &[String]) -> ControllerResult<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ControllerError::EngineUnavailable(format!("{program}: {e}")))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                reap(&mut child);
                return Err(ControllerError::EngineUnavailable(format!(
                    "{program}: stdio not piped"
                )));
            }
        };

        let (line_tx, line_rx) = channel::<String>();
        let name = program.to_owned();
        let reader = thread::Builder::new()
            .name("engine-reader".to_owned())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    match line {
                        Ok(line) => {
                            if line_tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(engine = %name, error = %e, "engine output unreadable");
                            break;
                        }
                    }
                }
                debug!(engine = %name, "engine output closed");
            });
        if let Err(e) = reader {
            reap(&mut child);
            return Err(ControllerError::EngineUnavailable(format!(
                "{program}: reader thread: {e}"
            )));
        }

        debug!(engine = %program, pid = child.id(), "engine process started");
        Ok(Self {
            child,
            stdin,
            lines: line_rx,
            closed: false,
        })
    }
}

impl SearchProcess for ChildProcess {
    fn send_line(&mut self, line: &str) -> ControllerResult<()> {
        trace!(%line, "to engine");
        writeln!(self.stdin, "{line}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| ControllerError::EngineUnavailable(format!("engine pipe closed: {e}")))
    }

    fn try_read_line(&mut self) -> Option<String> {
        match self.lines.try_recv() {
            Ok(line) => {
                trace!(%line, "from engine");
                Some(line)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    fn is_alive(&self) -> bool {
        !self.closed
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "{}", EngineCommand::Quit);
        let _ = self.stdin.flush();
        shut_down(&mut self.child, QUIT_GRACE);
    }
}

/// Wait up to `grace` for the process to exit on its own, then kill it.
/// Returns true when it exited without being killed.
fn shut_down(child: &mut Child, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "engine process exited");
                return true;
            }
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
            Ok(None) | Err(_) => {
                reap(child);
                return false;
            }
        }
    }
}

/// Kill and collect a child that is not going to be used.
fn reap(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "engine process already gone");
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::{Command, Stdio};
    use std::time::{Duration, Instant};

    use super::{reap, shut_down, ChildProcess, SearchProcess};

    #[test]
    fn reap_collects_a_running_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("sleep should start");
        reap(&mut child);
        assert!(child
            .try_wait()
            .expect("status should be readable")
            .is_some());
    }

    #[test]
    fn shut_down_lets_a_cooperative_process_exit() {
        let mut child = Command::new("sh")
            .args(["-c", "read line; exit 0"])
            .stdin(Stdio::piped())
            .spawn()
            .expect("sh should start");
        drop(child.stdin.take());
        assert!(shut_down(&mut child, Duration::from_secs(5)));
    }

    #[test]
    fn shut_down_kills_a_process_that_ignores_quit() {
        let mut child = Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("sleep should start");
        let started = Instant::now();
        assert!(!shut_down(&mut child, Duration::from_millis(50)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(child
            .try_wait()
            .expect("status should be readable")
            .is_some());
    }

    #[test]
    fn exited_engine_reports_not_alive() {
        let mut process = ChildProcess::spawn("sh", &["-c".to_owned(), "echo uciok".to_owned()])
            .expect("sh should start");
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut lines = Vec::new();
        while process.is_alive() && Instant::now() < deadline {
            lines.extend(process.try_read_line());
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(lines, vec!["uciok"]);
        assert!(!process.is_alive());
    }

    #[test]
    fn missing_program_is_unavailable() {
        assert!(ChildProcess::spawn("plum-versus-no-such-engine", &[]).is_err());
    }
}
