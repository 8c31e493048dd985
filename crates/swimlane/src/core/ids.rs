//! Deterministic identifiers for one generation run
//!
//! Every id minted during a run carries the same [`RunToken`], so two
//! documents generated in different runs never collide, while a fixed token
//! reproduces byte-identical output.

use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Value shared by every id minted in one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunToken(u64);

impl RunToken {
    /// Token from the system clock, in milliseconds since the epoch
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self(millis)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RunToken {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Element category an id is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Definitions,
    Collaboration,
    Participant,
    Process,
    StartEvent,
    EndEvent,
    Task,
    Gateway,
    Flow,
    Diagram,
    Plane,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Definitions => "Definitions",
            IdKind::Collaboration => "Collaboration",
            IdKind::Participant => "Participant",
            IdKind::Process => "Process",
            IdKind::StartEvent => "StartEvent",
            IdKind::EndEvent => "EndEvent",
            IdKind::Task => "Task",
            IdKind::Gateway => "Gateway",
            IdKind::Flow => "Flow",
            IdKind::Diagram => "Diagram",
            IdKind::Plane => "Plane",
        }
    }
}

/// Mints `{Prefix}_{n}_{token}` ids with a per-kind counter starting at 1
#[derive(Debug, Clone)]
pub struct IdAllocator {
    token: RunToken,
    counters: HashMap<IdKind, u32>,
}

impl IdAllocator {
    pub fn new(token: RunToken) -> Self {
        Self {
            token,
            counters: HashMap::new(),
        }
    }

    pub fn token(&self) -> RunToken {
        self.token
    }

    /// Mint the next id for `kind`
    pub fn allocate(&mut self, kind: IdKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}_{}_{}", kind.prefix(), counter, self.token)
    }
}
