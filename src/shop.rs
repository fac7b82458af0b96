//! Cosmetic catalog
//!
//! Static skin and music tables. Items unlock by player level; the simulation only
//! asks this module for colors.

use serde::{Deserialize, Serialize};

use crate::sim::Color;

/// Which table an item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CosmeticKind {
    Skin,
    Music,
}

impl CosmeticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CosmeticKind::Skin => "skins",
            CosmeticKind::Music => "musics",
        }
    }
}

/// Default skin/track every account owns
pub const DEFAULT_ITEM: u32 = 0;

/// A piece skin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    pub id: u32,
    pub name: &'static str,
    pub required_level: u32,
    pub color: Color,
}

/// A background music track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicTrack {
    pub id: u32,
    pub name: &'static str,
    pub required_level: u32,
    pub url: &'static str,
}

pub const SKINS: [Skin; 5] = [
    Skin {
        id: 0,
        name: "Classic",
        required_level: 1,
        color: Color::NEUTRAL,
    },
    Skin {
        id: 1,
        name: "Vert",
        required_level: 5,
        color: Color(0x00FF00),
    },
    Skin {
        id: 2,
        name: "Bleu",
        required_level: 10,
        color: Color(0x0099FF),
    },
    Skin {
        id: 3,
        name: "Rouge",
        required_level: 15,
        color: Color(0xFF3333),
    },
    Skin {
        id: 4,
        name: "Violet",
        required_level: 20,
        color: Color(0xDD00FF),
    },
];

pub const MUSIC_TRACKS: [MusicTrack; 5] = [
    MusicTrack {
        id: 0,
        name: "Original",
        required_level: 1,
        url: "assets/music/original.mp3",
    },
    MusicTrack {
        id: 1,
        name: "Cheerful",
        required_level: 5,
        url: "assets/music/cheerful.mp3",
    },
    MusicTrack {
        id: 2,
        name: "Theme 1",
        required_level: 10,
        url: "assets/music/theme1.mp3",
    },
    MusicTrack {
        id: 3,
        name: "Theme 2",
        required_level: 15,
        url: "assets/music/theme2.mp3",
    },
    MusicTrack {
        id: 4,
        name: "T E T R I S",
        required_level: 20,
        url: "assets/music/t_e_t_r_i_s.mp3",
    },
];

pub fn skin(id: u32) -> Option<&'static Skin> {
    SKINS.iter().find(|s| s.id == id)
}

pub fn music_track(id: u32) -> Option<&'static MusicTrack> {
    MUSIC_TRACKS.iter().find(|m| m.id == id)
}

/// Level gate for an item, `None` if the id is unknown
pub fn required_level(kind: CosmeticKind, id: u32) -> Option<u32> {
    match kind {
        CosmeticKind::Skin => skin(id).map(|s| s.required_level),
        CosmeticKind::Music => music_track(id).map(|m| m.required_level),
    }
}

/// Whether a player at `level` may buy the item. Unknown items are never unlocked.
pub fn is_unlocked(kind: CosmeticKind, id: u32, level: u32) -> bool {
    required_level(kind, id).is_some_and(|required| level >= required)
}

/// Display color for a skin, neutral grey for unknown ids
pub fn skin_color(id: u32) -> Color {
    skin(id).map(|s| s.color).unwrap_or(Color::NEUTRAL)
}
