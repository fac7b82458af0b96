//! Game settings and preferences
//!
//! Persisted separately from accounts in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

/// Cell size presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlockScale {
    #[default]
    Desktop,
    /// Bigger cells for fingers on small screens
    Touch,
}

impl BlockScale {
    /// Viewports narrower than this get the touch preset
    pub const TOUCH_BREAKPOINT_PX: f64 = 768.0;

    /// Preset for a viewport width in CSS pixels
    pub fn for_viewport(width_px: f64) -> Self {
        if width_px < Self::TOUCH_BREAKPOINT_PX {
            BlockScale::Touch
        } else {
            BlockScale::Desktop
        }
    }

    /// Cell edge in canvas pixels
    pub fn block_size(&self) -> u32 {
        match self {
            BlockScale::Desktop => 40,
            BlockScale::Touch => 60,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Timing ===
    /// Baseline gravity period (ms)
    pub drop_interval_ms: f64,
    /// Gravity period while the soft-drop key is held (ms)
    pub soft_drop_interval_ms: f64,
    /// Gravity period while the on-screen soft-drop button is held (ms)
    pub touch_soft_drop_interval_ms: f64,

    // === Display ===
    /// Draw the landing preview
    pub ghost_piece: bool,
    /// Floating "+N XP" labels on lock
    pub xp_popups: bool,
    pub block_scale: BlockScale,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            drop_interval_ms: 1000.0,
            soft_drop_interval_ms: 100.0,
            touch_soft_drop_interval_ms: 50.0,

            ghost_piece: true,
            xp_popups: true,
            block_scale: BlockScale::Desktop,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "blockfall_settings";

    /// Defaults with the block scale picked for the viewport
    pub fn for_viewport(width_px: f64) -> Self {
        Self {
            block_scale: BlockScale::for_viewport(width_px),
            ..Self::default()
        }
    }

    /// Load settings from storage, falling back to defaults
    pub fn load() -> Self {
        match storage::load_json::<Settings>(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from storage");
                settings.sanitized()
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if storage::save_json(Self::STORAGE_KEY, self) {
            log::info!("Settings saved");
        }
    }

    /// Replace non-positive or non-finite intervals with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let fix = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        self.drop_interval_ms = fix(self.drop_interval_ms, defaults.drop_interval_ms);
        self.soft_drop_interval_ms =
            fix(self.soft_drop_interval_ms, defaults.soft_drop_interval_ms);
        self.touch_soft_drop_interval_ms = fix(
            self.touch_soft_drop_interval_ms,
            defaults.touch_soft_drop_interval_ms,
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_scale_for_viewport() {
        assert_eq!(BlockScale::for_viewport(400.0), BlockScale::Touch);
        assert_eq!(BlockScale::for_viewport(1280.0), BlockScale::Desktop);
        assert_eq!(BlockScale::Touch.block_size(), 60);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ghost_piece": false}"#).unwrap();
        assert!(!settings.ghost_piece);
        assert_eq!(settings.drop_interval_ms, 1000.0);
    }

    #[test]
    fn test_sanitized_rejects_bad_intervals() {
        let settings = Settings {
            drop_interval_ms: -5.0,
            soft_drop_interval_ms: f64::NAN,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(settings.drop_interval_ms, 1000.0);
        assert_eq!(settings.soft_drop_interval_ms, 100.0);
    }

    #[test]
    fn test_save_then_load() {
        let settings = Settings {
            xp_popups: false,
            block_scale: BlockScale::Touch,
            ..Settings::default()
        };
        settings.save();
        assert_eq!(Settings::load(), settings);
    }
}
