// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processors that were spawned and have not registered yet.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::errors::SchedulingError;
use crate::proto::Processor;
use crate::scheduling::pool::RegisteredProcessor;

/// Lines of a worker stream kept for error reports.
const CAPTURED_LINES: usize = 200;

pub type RegistrationResult = Result<Arc<RegisteredProcessor>, SchedulingError>;

/// Tail of the stdout and stderr of a worker process.
#[derive(Debug, Default)]
pub struct OutputCapture {
    stdout: Mutex<VecDeque<String>>,
    stderr: Mutex<VecDeque<String>>,
}

impl OutputCapture {
    pub fn push(&self, stream: &str, line: String) {
        let buffer = if stream == "stderr" { &self.stderr } else { &self.stdout };
        let mut lines = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == CAPTURED_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    pub fn stdout(&self) -> String {
        Self::joined(&self.stdout)
    }

    pub fn stderr(&self) -> String {
        Self::joined(&self.stderr)
    }

    fn joined(buffer: &Mutex<VecDeque<String>>) -> String {
        let lines = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// A spawned worker waiting for its registration.
#[derive(Debug)]
pub struct PendingProcessor {
    pub processor: Processor,
    pub capture: Arc<OutputCapture>,
    registered: oneshot::Sender<RegistrationResult>,
}

impl PendingProcessor {
    pub fn new(
        processor: Processor,
        capture: Arc<OutputCapture>,
    ) -> (Self, oneshot::Receiver<RegistrationResult>) {
        let (registered, receiver) = oneshot::channel();
        (
            PendingProcessor {
                processor,
                capture,
                registered,
            },
            receiver,
        )
    }

    /// Wake the spawn waiting on this processor. A spawn that already gave
    /// up is ignored.
    pub fn notify(self, result: RegistrationResult) {
        let _ = self.registered.send(result);
    }
}

/// Pending processors keyed by their generated id.
#[derive(Debug, Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<String, PendingProcessor>>,
}

impl PendingRegistry {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, PendingProcessor>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, pending: PendingProcessor) {
        self.entries().insert(pending.processor.id.clone(), pending);
    }

    /// Remove and return the entry of `id`.
    pub fn unqueue(&self, id: &str) -> Option<PendingProcessor> {
        self.entries().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
