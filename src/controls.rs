//! Key bindings
//!
//! Keys are lowercase `KeyboardEvent.key` strings (`"a"`, `"arrowleft"`, `" "`).

use serde::{Deserialize, Serialize};

/// Something the player can do to the falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Left,
    Right,
    Rotate,
    SoftDrop,
    HardDrop,
}

/// Per-account key map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlBindings {
    pub left: String,
    pub right: String,
    pub rotate: String,
    pub down: String,
    pub hard_drop: String,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            left: "a".to_string(),
            right: "d".to_string(),
            rotate: "w".to_string(),
            down: "s".to_string(),
            hard_drop: " ".to_string(),
        }
    }
}

impl ControlBindings {
    /// Control bound to `key`. Space always hard drops, whatever the binding.
    pub fn resolve(&self, key: &str) -> Option<Control> {
        let key = key.to_lowercase();
        if key == self.left {
            Some(Control::Left)
        } else if key == self.right {
            Some(Control::Right)
        } else if key == self.rotate {
            Some(Control::Rotate)
        } else if key == self.down {
            Some(Control::SoftDrop)
        } else if key == self.hard_drop || key == " " {
            Some(Control::HardDrop)
        } else {
            None
        }
    }

    /// Whether releasing `key` ends a soft drop
    pub fn is_down(&self, key: &str) -> bool {
        key.to_lowercase() == self.down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let b = ControlBindings::default();
        assert_eq!(b.resolve("a"), Some(Control::Left));
        assert_eq!(b.resolve("D"), Some(Control::Right));
        assert_eq!(b.resolve("w"), Some(Control::Rotate));
        assert_eq!(b.resolve("s"), Some(Control::SoftDrop));
        assert_eq!(b.resolve(" "), Some(Control::HardDrop));
        assert_eq!(b.resolve("x"), None);
    }

    #[test]
    fn test_space_hard_drops_when_rebound() {
        let b = ControlBindings {
            hard_drop: "enter".to_string(),
            ..Default::default()
        };
        assert_eq!(b.resolve("enter"), Some(Control::HardDrop));
        assert_eq!(b.resolve(" "), Some(Control::HardDrop));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&ControlBindings::default()).unwrap();
        assert!(json.contains("\"hardDrop\":\" \""));
    }
}
