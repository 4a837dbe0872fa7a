//! The path-based command router.
//!
//! A caller's opaque session id and a command name share a single flat
//! path segment list ambiguously: `/abc…32chars/move/3.5` and
//! `/move/distance/3.5` must both route. Disambiguation is purely by
//! string length — a 32-character first segment is an id, anything else
//! is a command. The heuristic assumes no command name is ever 32
//! characters and no id collides with a command name; it is deliberate
//! policy, contained in [`looks_like_private_id`] so it can be swapped
//! if the id format is ever renegotiated.

use serde_json::{Map, Value};
use slotline_types::{IdError, PlayerCommand, PrivateId, ID_LEN, NONE_SENTINEL};

use crate::error::GatewayError;

/// Whether a path segment should be treated as a session id rather
/// than a command name.
///
/// The single place the 32-character heuristic lives.
pub fn looks_like_private_id(segment: &str) -> bool {
    segment.len() == ID_LEN
}

/// A fully resolved command path: identifier, command, and positional
/// arguments in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedCommand {
    /// The caller's session id, when one was present in the path.
    pub private_id: Option<PrivateId>,
    /// The resolved command.
    pub command: PlayerCommand,
    /// Positional arguments, in path order.
    pub args: Vec<String>,
}

/// Parse a flat list of path segments into a [`RoutedCommand`].
///
/// - One segment: a bare command, no id, no arguments.
/// - Two or more: the first segment is the id iff it passes
///   [`looks_like_private_id`]; the next segment is the command; the
///   rest is the raw argument payload.
/// - The literal `"None"` in the leading position is a rejected
///   sentinel, never an id or a command.
///
/// # Errors
///
/// Returns [`GatewayError::UnknownCommand`] for names outside the
/// vocabulary, [`GatewayError::InvalidIdentifier`] for the sentinel or
/// a malformed id, and [`GatewayError::MalformedArguments`] for an
/// odd-length key/value payload.
pub fn route(segments: &[&str]) -> Result<RoutedCommand, GatewayError> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(GatewayError::UnknownCommand(String::new()));
    };
    if *first == NONE_SENTINEL {
        return Err(GatewayError::InvalidIdentifier(IdError::Sentinel));
    }

    let (private_id, name, payload): (Option<PrivateId>, &str, &[&str]) = if rest.is_empty() {
        (None, *first, rest)
    } else if looks_like_private_id(first) {
        match rest.split_first() {
            Some((name, payload)) => (Some(PrivateId::parse(first)?), *name, payload),
            None => (None, *first, rest),
        }
    } else {
        (None, *first, rest)
    };

    let command = PlayerCommand::parse(name)
        .ok_or_else(|| GatewayError::UnknownCommand(name.to_owned()))?;
    let args = reduce_args(payload)?;

    Ok(RoutedCommand {
        private_id,
        command,
        args,
    })
}

/// Reduce the raw trailing segments to positional arguments.
///
/// A single segment is one argument. Two or more segments are an
/// alternating flat key/value sequence: the values (odd indices) are
/// kept in order, the keys discarded, and the length must be even.
fn reduce_args(payload: &[&str]) -> Result<Vec<String>, GatewayError> {
    match payload.len() {
        0 => Ok(Vec::new()),
        1 => Ok(payload.iter().map(|s| (*s).to_owned()).collect()),
        n if n % 2 == 0 => Ok(payload
            .iter()
            .skip(1)
            .step_by(2)
            .map(|s| (*s).to_owned())
            .collect()),
        n => Err(GatewayError::MalformedArguments(format!(
            "expected alternating key/value segments, got odd length {n}"
        ))),
    }
}

/// Build the wire payload for a routed command.
///
/// Performs the per-command argument typing (a float distance for
/// `move`, an integer level for `request_slot`, two strings for
/// `register_name`) so that only well-formed calls generate bus
/// traffic. `caller_ip` is forwarded on slot requests.
///
/// # Errors
///
/// Returns [`GatewayError::MalformedArguments`] if a required argument
/// is missing or fails to parse.
pub fn build_payload(
    routed: &RoutedCommand,
    caller_ip: &str,
) -> Result<Map<String, Value>, GatewayError> {
    let id_value = routed
        .private_id
        .as_ref()
        .map_or(Value::Null, |id| Value::from(id.as_str()));

    let mut payload = Map::new();
    match routed.command {
        PlayerCommand::Wakeup => {
            payload.insert("dummy".to_owned(), Value::Null);
        }
        PlayerCommand::Status => {
            payload.insert("private_id".to_owned(), id_value);
            // A status poll is a zero-distance probe on the wire.
            payload.insert("move_dx".to_owned(), Value::from(0.0));
        }
        PlayerCommand::Move => {
            let distance: f64 = required_arg(routed, 0, "distance")?
                .parse()
                .map_err(|e| {
                    GatewayError::MalformedArguments(format!("move distance: {e}"))
                })?;
            payload.insert("private_id".to_owned(), id_value);
            payload.insert("move_dx".to_owned(), Value::from(distance));
        }
        PlayerCommand::RequestSlot => {
            let level: i64 = required_arg(routed, 0, "level")?.parse().map_err(|e| {
                GatewayError::MalformedArguments(format!("request_slot level: {e}"))
            })?;
            payload.insert("private_id".to_owned(), id_value);
            payload.insert("level".to_owned(), Value::from(level));
            payload.insert("ip_address".to_owned(), Value::from(caller_ip));
        }
        PlayerCommand::Cancel => {
            payload.insert("private_id".to_owned(), id_value);
        }
        PlayerCommand::RegisterName => {
            if routed.private_id.is_none() {
                return Err(GatewayError::MalformedArguments(
                    "register_name requires a private id".to_owned(),
                ));
            }
            let public_id = required_arg(routed, 0, "public_id")?.to_owned();
            let name = required_arg(routed, 1, "name")?.to_owned();
            payload.insert("private_id".to_owned(), id_value);
            payload.insert("public_id".to_owned(), Value::from(public_id));
            payload.insert("name".to_owned(), Value::from(name));
        }
    }
    Ok(payload)
}

fn required_arg<'a>(
    routed: &'a RoutedCommand,
    index: usize,
    what: &str,
) -> Result<&'a str, GatewayError> {
    routed.args.get(index).map(String::as_str).ok_or_else(|| {
        GatewayError::MalformedArguments(format!(
            "{} requires a {what} argument",
            routed.command
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id32() -> String {
        "a".repeat(32)
    }

    #[test]
    fn bare_command_routes_without_id_or_args() {
        let routed = route(&["status"]).ok();
        assert_eq!(
            routed,
            Some(RoutedCommand {
                private_id: None,
                command: PlayerCommand::Status,
                args: Vec::new(),
            })
        );
    }

    #[test]
    fn leading_32_char_segment_is_the_id() {
        let id = id32();
        let routed = route(&[&id, "move", "3.5"]).ok();
        assert_eq!(
            routed,
            Some(RoutedCommand {
                private_id: PrivateId::parse(&id).ok(),
                command: PlayerCommand::Move,
                args: vec!["3.5".to_owned()],
            })
        );
    }

    #[test]
    fn even_payload_keeps_the_value_half() {
        let routed = route(&["move", "x", "3.5"]).ok();
        assert_eq!(
            routed,
            Some(RoutedCommand {
                private_id: None,
                command: PlayerCommand::Move,
                args: vec!["3.5".to_owned()],
            })
        );
    }

    #[test]
    fn longer_even_payload_keeps_values_in_order() {
        let id = id32();
        let routed = route(&[&id, "register_name", "public_id", "p1", "name", "Ada"]).ok();
        assert_eq!(
            routed.map(|r| r.args),
            Some(vec!["p1".to_owned(), "Ada".to_owned()])
        );
    }

    #[test]
    fn odd_payload_of_three_is_malformed() {
        let result = route(&["move", "a", "b", "c"]);
        assert!(matches!(
            result,
            Err(GatewayError::MalformedArguments(_))
        ));
    }

    #[test]
    fn none_sentinel_is_always_rejected() {
        for segments in [
            vec!["None"],
            vec!["None", "status"],
            vec!["None", "move", "3.5"],
        ] {
            let result = route(&segments);
            assert!(
                matches!(result, Err(GatewayError::InvalidIdentifier(IdError::Sentinel))),
                "expected sentinel rejection for {segments:?}"
            );
        }
    }

    #[test]
    fn unknown_command_is_rejected_without_dispatch() {
        let result = route(&["teleport", "3.5", "7"]);
        assert!(matches!(
            result,
            Err(GatewayError::UnknownCommand(name)) if name == "teleport"
        ));
    }

    #[test]
    fn unknown_command_after_an_id_is_rejected() {
        let id = id32();
        let result = route(&[&id, "teleport"]);
        assert!(matches!(result, Err(GatewayError::UnknownCommand(_))));
    }

    #[test]
    fn the_predicate_is_pure_length() {
        assert!(looks_like_private_id(&"x".repeat(32)));
        assert!(!looks_like_private_id(&"x".repeat(31)));
        assert!(!looks_like_private_id(&"x".repeat(33)));
        assert!(!looks_like_private_id("move"));
    }

    #[test]
    fn move_payload_types_the_distance() {
        let routed = RoutedCommand {
            private_id: PrivateId::parse(&id32()).ok(),
            command: PlayerCommand::Move,
            args: vec!["3.5".to_owned()],
        };
        let payload = build_payload(&routed, "203.0.113.9").unwrap_or_default();
        assert_eq!(payload.get("move_dx"), Some(&Value::from(3.5)));
        assert_eq!(payload.get("private_id"), Some(&Value::from(id32())));
    }

    #[test]
    fn move_without_distance_is_malformed() {
        let routed = RoutedCommand {
            private_id: None,
            command: PlayerCommand::Move,
            args: Vec::new(),
        };
        assert!(matches!(
            build_payload(&routed, "203.0.113.9"),
            Err(GatewayError::MalformedArguments(_))
        ));
    }

    #[test]
    fn request_slot_carries_level_and_caller_ip() {
        let routed = RoutedCommand {
            private_id: None,
            command: PlayerCommand::RequestSlot,
            args: vec!["2".to_owned()],
        };
        let payload = build_payload(&routed, "203.0.113.9").unwrap_or_default();
        assert_eq!(payload.get("level"), Some(&Value::from(2)));
        assert_eq!(payload.get("ip_address"), Some(&Value::from("203.0.113.9")));
        assert_eq!(payload.get("private_id"), Some(&Value::Null));
    }

    #[test]
    fn register_name_requires_an_id() {
        let routed = RoutedCommand {
            private_id: None,
            command: PlayerCommand::RegisterName,
            args: vec!["p1".to_owned(), "Ada".to_owned()],
        };
        assert!(matches!(
            build_payload(&routed, "203.0.113.9"),
            Err(GatewayError::MalformedArguments(_))
        ));
    }
}
