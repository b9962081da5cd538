//! Session State Machines

use ring_buffer::{RingStore, SampleRecord, TraversalToken};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Protocol a session was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// One sample per open
    Latest,
    /// Every surviving sample, oldest first
    #[serde(rename = "full")]
    FullDrain,
}

impl SessionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Latest => "latest",
            SessionKind::FullDrain => "full",
        }
    }
}

/// State of a [`LatestReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatestState {
    Fresh,
    Delivered,
}

/// Returns the active sample once, then nothing until reset
pub struct LatestReader {
    store: Arc<RingStore>,
    state: LatestState,
}

impl LatestReader {
    pub fn new(store: Arc<RingStore>) -> Self {
        Self {
            store,
            state: LatestState::Fresh,
        }
    }

    pub fn read(&mut self) -> Option<SampleRecord> {
        match self.state {
            LatestState::Delivered => None,
            LatestState::Fresh => {
                let record = self.store.peek_active()?;
                self.state = LatestState::Delivered;
                Some(record)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = LatestState::Fresh;
    }

    pub fn state(&self) -> LatestState {
        self.state
    }
}

/// State of a [`FullDrainReader`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainState {
    NotStarted,
    Draining(TraversalToken),
    Exhausted,
}

/// Walks the ring oldest-to-newest, one sample per read, until it has
/// returned the active sample
pub struct FullDrainReader {
    store: Arc<RingStore>,
    state: DrainState,
}

impl FullDrainReader {
    pub fn new(store: Arc<RingStore>) -> Self {
        Self {
            store,
            state: DrainState::NotStarted,
        }
    }

    pub fn read(&mut self) -> Option<SampleRecord> {
        let mut token = match std::mem::replace(&mut self.state, DrainState::Exhausted) {
            DrainState::Exhausted => return None,
            DrainState::NotStarted => self.store.begin_traversal(),
            DrainState::Draining(token) => token,
        };

        let record = self.store.advance_traversal(&mut token);
        if record.is_some() && !self.store.is_traversal_complete(&token) {
            self.state = DrainState::Draining(token);
        } else {
            if token.is_stale() {
                warn!(
                    "Drain finished with {} samples lost to overwrite",
                    token.skipped()
                );
            }
            debug!("Drain exhausted after {} samples", token.delivered());
        }
        record
    }

    pub fn reset(&mut self) {
        self.state = DrainState::NotStarted;
    }

    pub fn state(&self) -> &DrainState {
        &self.state
    }
}

/// A consumer's read handle
pub enum ReadSession {
    Latest(LatestReader),
    FullDrain(FullDrainReader),
}

impl ReadSession {
    /// Create a session in its initial state
    pub fn open(kind: SessionKind, store: Arc<RingStore>) -> Self {
        match kind {
            SessionKind::Latest => ReadSession::Latest(LatestReader::new(store)),
            SessionKind::FullDrain => ReadSession::FullDrain(FullDrainReader::new(store)),
        }
    }

    /// Next sample for this consumer, `None` when there is nothing (more) to read
    pub fn read(&mut self) -> Option<SampleRecord> {
        match self {
            ReadSession::Latest(reader) => reader.read(),
            ReadSession::FullDrain(reader) => reader.read(),
        }
    }

    /// Return to the state right after opening
    pub fn reset(&mut self) {
        match self {
            ReadSession::Latest(reader) => reader.reset(),
            ReadSession::FullDrain(reader) => reader.reset(),
        }
    }

    pub fn kind(&self) -> SessionKind {
        match self {
            ReadSession::Latest(_) => SessionKind::Latest,
            ReadSession::FullDrain(_) => SessionKind::FullDrain,
        }
    }

    /// Whether further reads return nothing until reset
    pub fn is_finished(&self) -> bool {
        match self {
            ReadSession::Latest(reader) => reader.state() == LatestState::Delivered,
            ReadSession::FullDrain(reader) => *reader.state() == DrainState::Exhausted,
        }
    }
}
