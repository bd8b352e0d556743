//! Action-link idempotence gate
//!
//! Every state-changing GET carries a timestamped token
//! (`?action=<timestamp>`); the gate answers true exactly once per
//! distinct token, so refreshing the page does not repeat the action.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Tracks the last token seen per action name
pub struct ActionGate {
    seen: Vec<(String, u32)>,
}

impl ActionGate {
    /// Gate with no tokens seen
    pub fn new() -> Self {
        Self { seen: Vec::new() }
    }

    /// Whether the action should run for this token.
    ///
    /// Returns true on the first sighting of `(name, token)` and false on
    /// every repeat of the same token.
    pub fn should_perform(&mut self, name: &str, token: u32) -> bool {
        for entry in &mut self.seen {
            if entry.0 == name {
                if entry.1 == token {
                    return false;
                }
                entry.1 = token;
                return true;
            }
        }
        self.seen.push((name.to_string(), token));
        true
    }
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_fires_once() {
        let mut gate = ActionGate::new();
        assert!(gate.should_perform("clear", 1_700_000_001));
        assert!(!gate.should_perform("clear", 1_700_000_001));
        assert!(gate.should_perform("clear", 1_700_000_099));
    }

    #[test]
    fn actions_are_independent() {
        let mut gate = ActionGate::new();
        assert!(gate.should_perform("clear", 7));
        assert!(gate.should_perform("sync", 7));
        assert!(!gate.should_perform("clear", 7));
    }
}
