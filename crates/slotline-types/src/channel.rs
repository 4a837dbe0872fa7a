//! Bus channel names.
//!
//! Three logical channels exist: two outgoing (selected by caller
//! privilege) and one reply channel per server instance, derived from
//! the instance identity (see [`InstanceId::reply_channel`]).
//! The names are a static contract between the gateway and the worker.
//!
//! [`InstanceId::reply_channel`]: crate::id::InstanceId::reply_channel

/// Outgoing bus channel, selected by caller privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Normal game commands from players.
    Player,
    /// Privileged operator commands.
    Admin,
}

impl Channel {
    /// The wire name of the channel.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player-in",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_are_the_wire_contract() {
        assert_eq!(Channel::Player.as_str(), "player-in");
        assert_eq!(Channel::Admin.as_str(), "admin");
    }
}
