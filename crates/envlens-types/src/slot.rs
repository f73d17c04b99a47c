//! Slot identifiers for the two comparison positions.

use serde::{Deserialize, Serialize};

/// One of the two fixed comparison positions.
///
/// The wire names (`env1`/`env2`) are the historical frame ids and appear
/// verbatim in cross-frame messages and query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotId {
    #[serde(rename = "env1")]
    Env1,
    #[serde(rename = "env2")]
    Env2,
}

impl SlotId {
    /// Both slots, in display order (left, right).
    pub const BOTH: [SlotId; 2] = [SlotId::Env1, SlotId::Env2];

    /// The opposite slot.
    pub fn other(self) -> SlotId {
        match self {
            SlotId::Env1 => SlotId::Env2,
            SlotId::Env2 => SlotId::Env1,
        }
    }

    /// Stable array index (Env1 = 0, Env2 = 1).
    pub fn index(self) -> usize {
        match self {
            SlotId::Env1 => 0,
            SlotId::Env2 => 1,
        }
    }

    /// Wire name of the slot.
    pub fn as_str(self) -> &'static str {
        match self {
            SlotId::Env1 => "env1",
            SlotId::Env2 => "env2",
        }
    }

    /// Parse a wire name back into a slot.
    pub fn from_str_opt(s: &str) -> Option<SlotId> {
        match s {
            "env1" => Some(SlotId::Env1),
            "env2" => Some(SlotId::Env2),
            _ => None,
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
