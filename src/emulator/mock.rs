//! In-memory emulator for tests without network calls.

use super::trace::TraceNode;
use super::{Emulator, EmulatorError, UnsignedMessage};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Returns a canned trace per message destination.
#[derive(Debug, Default)]
pub struct MockEmulator {
    traces: HashMap<String, TraceNode>,
    sessions: AtomicUsize,
    last_block: AtomicU64,
}

impl MockEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the trace returned for messages sent to `destination`.
    pub fn with_trace(mut self, destination: impl Into<String>, trace: TraceNode) -> Self {
        self.traces.insert(destination.into(), trace);
        self
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    pub fn last_block_seqno(&self) -> Option<u64> {
        match self.last_block.load(Ordering::SeqCst) {
            0 => None,
            seqno => Some(seqno),
        }
    }
}

#[async_trait]
impl Emulator for MockEmulator {
    async fn create_session(&self, block_seqno: u64) -> Result<String, EmulatorError> {
        let n = self.sessions.fetch_add(1, Ordering::SeqCst);
        self.last_block.store(block_seqno, Ordering::SeqCst);
        Ok(format!("mock-session-{}", n))
    }

    async fn emulate_trace(
        &self,
        _session_id: &str,
        message: &UnsignedMessage,
    ) -> Result<TraceNode, EmulatorError> {
        self.traces
            .get(&message.destination)
            .cloned()
            .ok_or_else(|| EmulatorError::MissingTrace(message.destination.clone()))
    }
}
