//! The closed command vocabulary.
//!
//! Player commands travel on the `player-in` channel, admin commands on
//! `admin`. Unknown names are rejected at the routing layer, never
//! silently ignored.

/// Caller-facing game commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Liveness probe: is the worker awake?
    Wakeup,
    /// Declare interest in a queue slot at a difficulty level.
    RequestSlot,
    /// Poll the caller's current slot status.
    Status,
    /// Move by a floating-point distance.
    Move,
    /// Cancel the caller's pending slot.
    Cancel,
    /// Register a display name against a public id.
    RegisterName,
}

impl PlayerCommand {
    /// Every player command, in routing order.
    pub const ALL: [Self; 6] = [
        Self::Wakeup,
        Self::RequestSlot,
        Self::Status,
        Self::Move,
        Self::Cancel,
        Self::RegisterName,
    ];

    /// The wire and path name of the command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wakeup => "wakeup",
            Self::RequestSlot => "request_slot",
            Self::Status => "status",
            Self::Move => "move",
            Self::Cancel => "cancel",
            Self::RegisterName => "register_name",
        }
    }

    /// Resolve a path segment against the vocabulary.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin-only commands, reachable only through the guarded endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    /// Inspect the worker-side state of one caller's slot.
    InspectState,
    /// Dump the worker's entire queue state.
    DumpAll,
}

impl AdminCommand {
    /// The wire name of the command.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InspectState => "inspect_state",
            Self::DumpAll => "dump_all",
        }
    }
}

impl std::fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
