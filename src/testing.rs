//! Test doubles for driving a session without a real engine.
//!
//! `ScriptedProcess` stands in for a UCI executable. The paired
//! `ScriptHandle` stays with the test: it records every line the bridge sent
//! and lets the test decide when (and whether) the "engine" answers.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engines::search_process::SearchProcess;
use crate::errors::{ControllerError, ControllerResult};

#[derive(Debug, Default)]
struct Script {
    sent: Vec<String>,
    pending_output: VecDeque<String>,
    closed: bool,
}

pub struct ScriptedProcess {
    script: Arc<Mutex<Script>>,
}

#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

/// A fresh scripted process and the handle controlling it.
pub fn scripted_process() -> (ScriptedProcess, ScriptHandle) {
    let script = Arc::new(Mutex::new(Script::default()));
    (
        ScriptedProcess {
            script: Arc::clone(&script),
        },
        ScriptHandle { script },
    )
}

impl SearchProcess for ScriptedProcess {
    fn send_line(&mut self, line: &str) -> ControllerResult<()> {
        let mut script = self.script.lock();
        if script.closed {
            return Err(ControllerError::EngineUnavailable(
                "scripted engine closed".to_owned(),
            ));
        }
        script.sent.push(line.to_owned());
        Ok(())
    }

    fn try_read_line(&mut self) -> Option<String> {
        self.script.lock().pending_output.pop_front()
    }

    fn is_alive(&self) -> bool {
        !self.script.lock().closed
    }
}

impl ScriptHandle {
    /// Queue a line as if the engine had printed it.
    pub fn respond(&self, line: &str) {
        self.script.lock().pending_output.push_back(line.to_owned());
    }

    pub fn sent(&self) -> Vec<String> {
        self.script.lock().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.script.lock().sent.clear();
    }

    /// Number of sent lines starting with `prefix`.
    pub fn count_sent(&self, prefix: &str) -> usize {
        self.script
            .lock()
            .sent
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    pub fn close(&self) {
        self.script.lock().closed = true;
    }
}
