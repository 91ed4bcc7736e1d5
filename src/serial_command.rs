//! Single character commands on the debug serial port.

use crate::event::Action;

/// Command characters with their meaning, printed by `h`.
pub const HELP: &[(u8, &str)] = &[
    (b'p', "play"),
    (b'P', "stop"),
    (b'n', "next track"),
    (b'r', "previous track"),
    (b'u', "volume up"),
    (b'd', "volume down"),
    (b'a', "admin menu"),
    (b's', "shutdown"),
    (b'S', "dump settings"),
    (b'h', "help"),
];

pub fn action_for(byte: u8) -> Option<Action> {
    let action = match byte {
        b'p' => Action::Play,
        b'P' => Action::Stop,
        b'n' => Action::Next,
        b'r' => Action::Previous,
        b'u' => Action::VolumeUp,
        b'd' => Action::VolumeDown,
        b'a' => Action::EnterAdmin,
        b's' => Action::Shutdown,
        b'S' => Action::DumpSettings,
        b'h' => Action::Help,
        _ => return None,
    };
    Some(action)
}
