//! Player accounts
//!
//! The simulation talks to accounts only through [`AccountFacade`]. [`AccountBook`]
//! is the in-process implementation: profiles keyed by pseudo, persisted to
//! LocalStorage, with a monotonic merge for copies coming from other devices.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::controls::ControlBindings;
use crate::error::{AccountError, AccountResult};
use crate::platform::{now_ms, storage};
use crate::progression::level_from_xp;
use crate::shop::{self, CosmeticKind, DEFAULT_ITEM};

/// What the game core needs from whoever owns the player's profile
///
/// Writes are fire-and-forget. XP and best score only ever grow; implementations
/// must never lower them.
pub trait AccountFacade {
    /// Equipped item of `kind`, `None` when nobody is logged in
    fn equipped_cosmetic(&self, kind: CosmeticKind) -> Option<u32>;
    fn is_owned(&self, kind: CosmeticKind, id: u32) -> bool;
    fn control_bindings(&self) -> ControlBindings;
    fn report_xp_gain(&mut self, amount: u32);
    /// Returns true if `score` became the new best
    fn report_best_score(&mut self, score: u32) -> bool;
}

/// No account: default controls, neutral cosmetics, nothing persisted
#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl AccountFacade for Guest {
    fn equipped_cosmetic(&self, _kind: CosmeticKind) -> Option<u32> {
        None
    }

    fn is_owned(&self, _kind: CosmeticKind, _id: u32) -> bool {
        false
    }

    fn control_bindings(&self) -> ControlBindings {
        ControlBindings::default()
    }

    fn report_xp_gain(&mut self, _amount: u32) {}

    fn report_best_score(&mut self, _score: u32) -> bool {
        false
    }
}

/// Shared handle, so the UI and a running session can both reach the book
impl<T: AccountFacade> AccountFacade for Rc<RefCell<T>> {
    fn equipped_cosmetic(&self, kind: CosmeticKind) -> Option<u32> {
        self.borrow().equipped_cosmetic(kind)
    }

    fn is_owned(&self, kind: CosmeticKind, id: u32) -> bool {
        self.borrow().is_owned(kind, id)
    }

    fn control_bindings(&self) -> ControlBindings {
        self.borrow().control_bindings()
    }

    fn report_xp_gain(&mut self, amount: u32) {
        self.borrow_mut().report_xp_gain(amount);
    }

    fn report_best_score(&mut self, score: u32) -> bool {
        self.borrow_mut().report_best_score(score)
    }
}

/// Owned skins and music tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedItems {
    pub skins: BTreeSet<u32>,
    pub musics: BTreeSet<u32>,
}

impl Default for OwnedItems {
    fn default() -> Self {
        Self {
            skins: BTreeSet::from([DEFAULT_ITEM]),
            musics: BTreeSet::from([DEFAULT_ITEM]),
        }
    }
}

impl OwnedItems {
    pub fn of(&self, kind: CosmeticKind) -> &BTreeSet<u32> {
        match kind {
            CosmeticKind::Skin => &self.skins,
            CosmeticKind::Music => &self.musics,
        }
    }

    fn of_mut(&mut self, kind: CosmeticKind) -> &mut BTreeSet<u32> {
        match kind {
            CosmeticKind::Skin => &mut self.skins,
            CosmeticKind::Music => &mut self.musics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChannel {
    Music,
    Effects,
}

/// A player's progression record and preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub pseudo: String,
    pub code: String,
    pub xp: u64,
    pub level: u32,
    pub best_score: u32,
    #[serde(default)]
    pub owned_items: OwnedItems,
    #[serde(default)]
    pub equipped_skin: u32,
    #[serde(default)]
    pub equipped_music: u32,
    /// 0-100
    #[serde(default = "full_volume")]
    pub music_volume: u8,
    /// 0-100
    #[serde(default = "full_volume")]
    pub effects_volume: u8,
    #[serde(default)]
    pub controls: ControlBindings,
    /// Unix ms
    pub created_at: f64,
    /// Unix ms, decides which side wins preference fields on merge
    pub last_login: f64,
}

fn full_volume() -> u8 {
    100
}

impl Profile {
    pub fn new(pseudo: &str, code: &str, now: f64) -> Self {
        Self {
            pseudo: pseudo.to_string(),
            code: code.to_string(),
            xp: 0,
            level: 1,
            best_score: 0,
            owned_items: OwnedItems::default(),
            equipped_skin: DEFAULT_ITEM,
            equipped_music: DEFAULT_ITEM,
            music_volume: 100,
            effects_volume: 100,
            controls: ControlBindings::default(),
            created_at: now,
            last_login: now,
        }
    }

    pub fn equipped(&self, kind: CosmeticKind) -> u32 {
        match kind {
            CosmeticKind::Skin => self.equipped_skin,
            CosmeticKind::Music => self.equipped_music,
        }
    }

    pub fn owns(&self, kind: CosmeticKind, id: u32) -> bool {
        self.owned_items.of(kind).contains(&id)
    }

    /// Add XP and re-derive the level. Returns the new level if it changed.
    pub fn add_xp(&mut self, amount: u64) -> Option<u32> {
        self.xp = self.xp.saturating_add(amount);
        let level = level_from_xp(self.xp);
        let changed = level != self.level;
        self.level = level;
        changed.then_some(level)
    }

    /// Field-level merge with another copy of the same account
    ///
    /// XP and best score take the max and the level is re-derived, owned items are
    /// unioned, and preferences come from whichever copy logged in last.
    pub fn merge(&mut self, other: &Profile) {
        self.xp = self.xp.max(other.xp);
        self.level = level_from_xp(self.xp);
        self.best_score = self.best_score.max(other.best_score);
        self.owned_items
            .skins
            .extend(other.owned_items.skins.iter().copied());
        self.owned_items
            .musics
            .extend(other.owned_items.musics.iter().copied());
        self.created_at = self.created_at.min(other.created_at);

        if other.last_login > self.last_login {
            self.code = other.code.clone();
            self.equipped_skin = other.equipped_skin;
            self.equipped_music = other.equipped_music;
            self.music_volume = other.music_volume;
            self.effects_volume = other.effects_volume;
            self.controls = other.controls.clone();
            self.last_login = other.last_login;
        }
    }
}

/// Leaderboard line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub pseudo: String,
    pub score: u32,
}

/// All known accounts plus the logged-in one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBook {
    pub accounts: BTreeMap<String, Profile>,
    #[serde(skip)]
    current: Option<String>,
}

impl AccountBook {
    const ACCOUNTS_KEY: &'static str = "blockfall_accounts";
    const CURRENT_USER_KEY: &'static str = "blockfall_current_user";

    /// Default number of leaderboard lines
    pub const TOP_SCORES: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Restore accounts and the last session from storage
    pub fn load() -> Self {
        let accounts: BTreeMap<String, Profile> =
            storage::load_json(Self::ACCOUNTS_KEY).unwrap_or_default();
        let current = storage::load_string(Self::CURRENT_USER_KEY)
            .filter(|pseudo| accounts.contains_key(pseudo));
        log::info!("Loaded {} account(s)", accounts.len());
        Self { accounts, current }
    }

    /// Write accounts and the session marker to storage
    pub fn save(&self) {
        if storage::save_json(Self::ACCOUNTS_KEY, &self.accounts) {
            log::debug!("Accounts saved ({} entries)", self.accounts.len());
        }
        match &self.current {
            Some(pseudo) => {
                storage::save_string(Self::CURRENT_USER_KEY, pseudo);
            }
            None => storage::remove(Self::CURRENT_USER_KEY),
        }
    }

    pub fn create_account(&mut self, pseudo: &str, code: &str) -> AccountResult<()> {
        if self.accounts.contains_key(pseudo) {
            return Err(AccountError::NameTaken(pseudo.to_string()));
        }
        self.accounts
            .insert(pseudo.to_string(), Profile::new(pseudo, code, now_ms()));
        log::info!("Account {pseudo} created");
        self.save();
        Ok(())
    }

    pub fn login(&mut self, pseudo: &str, code: &str) -> AccountResult<()> {
        let profile = self
            .accounts
            .get_mut(pseudo)
            .ok_or_else(|| AccountError::UnknownAccount(pseudo.to_string()))?;
        if profile.code != code {
            return Err(AccountError::WrongCode);
        }
        profile.last_login = now_ms();
        // The curve may have changed since the level was stored
        profile.level = level_from_xp(profile.xp);
        self.current = Some(pseudo.to_string());
        log::info!("Logged in as {pseudo}");
        self.save();
        Ok(())
    }

    pub fn logout(&mut self) {
        if let Some(pseudo) = self.current.take() {
            log::info!("Logged out {pseudo}");
        }
        self.save();
    }

    /// Remove an account for good, logging it out if it is the current one
    pub fn delete_account(&mut self, pseudo: &str) -> AccountResult<()> {
        if self.accounts.remove(pseudo).is_none() {
            return Err(AccountError::UnknownAccount(pseudo.to_string()));
        }
        if self.current.as_deref() == Some(pseudo) {
            self.current = None;
        }
        self.save();
        Ok(())
    }

    pub fn current_user(&self) -> Option<&Profile> {
        self.current.as_ref().and_then(|p| self.accounts.get(p))
    }

    fn current_user_mut(&mut self) -> AccountResult<&mut Profile> {
        let pseudo = self.current.as_ref().ok_or(AccountError::NotLoggedIn)?;
        self.accounts
            .get_mut(pseudo)
            .ok_or_else(|| AccountError::UnknownAccount(pseudo.clone()))
    }

    /// Credit XP to the current user. Returns the new level on a level-up.
    pub fn report_xp(&mut self, amount: u64) -> Option<u32> {
        let profile = self.current_user_mut().ok()?;
        let level_up = profile.add_xp(amount);
        if let Some(level) = level_up {
            log::info!("{} reached level {level}", profile.pseudo);
        }
        self.save();
        level_up
    }

    /// Record `score` if it beats the current user's best
    pub fn update_best_score(&mut self, score: u32) -> bool {
        let Ok(profile) = self.current_user_mut() else {
            return false;
        };
        if score <= profile.best_score {
            return false;
        }
        profile.best_score = score;
        self.save();
        true
    }

    /// Best scores across all accounts, highest first
    pub fn top_scores(&self, limit: usize) -> Vec<ScoreEntry> {
        let mut entries: Vec<ScoreEntry> = self
            .accounts
            .values()
            .map(|p| ScoreEntry {
                pseudo: p.pseudo.clone(),
                score: p.best_score,
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        entries
    }

    /// Add an item to the current user's inventory
    pub fn buy(&mut self, kind: CosmeticKind, id: u32) -> AccountResult<()> {
        let required_level =
            shop::required_level(kind, id).ok_or(AccountError::UnknownItem(kind, id))?;
        let profile = self.current_user_mut()?;
        if profile.owns(kind, id) {
            return Err(AccountError::AlreadyOwned(kind, id));
        }
        if profile.level < required_level {
            return Err(AccountError::Locked { required_level });
        }
        profile.owned_items.of_mut(kind).insert(id);
        self.save();
        Ok(())
    }

    pub fn equip(&mut self, kind: CosmeticKind, id: u32) -> AccountResult<()> {
        let profile = self.current_user_mut()?;
        if !profile.owns(kind, id) {
            return Err(AccountError::NotOwned(kind, id));
        }
        match kind {
            CosmeticKind::Skin => profile.equipped_skin = id,
            CosmeticKind::Music => profile.equipped_music = id,
        }
        self.save();
        Ok(())
    }

    pub fn update_controls(&mut self, controls: ControlBindings) -> AccountResult<()> {
        self.current_user_mut()?.controls = controls;
        self.save();
        Ok(())
    }

    /// Set a volume, clamped to 0-100
    pub fn update_volume(&mut self, channel: VolumeChannel, value: u8) -> AccountResult<()> {
        let profile = self.current_user_mut()?;
        let value = value.min(100);
        match channel {
            VolumeChannel::Music => profile.music_volume = value,
            VolumeChannel::Effects => profile.effects_volume = value,
        }
        self.save();
        Ok(())
    }

    /// Fold in accounts from another device
    pub fn merge_remote(&mut self, remote: BTreeMap<String, Profile>) {
        let count = remote.len();
        for (pseudo, mut theirs) in remote {
            match self.accounts.get_mut(&pseudo) {
                Some(ours) => ours.merge(&theirs),
                None => {
                    theirs.level = level_from_xp(theirs.xp);
                    self.accounts.insert(pseudo, theirs);
                }
            }
        }
        log::info!("Merged {count} remote account(s)");
        self.save();
    }

    /// JSON export of every account
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.accounts)
    }

    /// Merge accounts from an export produced by [`AccountBook::export_json`]
    pub fn import_json(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let remote: BTreeMap<String, Profile> = serde_json::from_str(json)?;
        let count = remote.len();
        self.merge_remote(remote);
        Ok(count)
    }
}

impl AccountFacade for AccountBook {
    fn equipped_cosmetic(&self, kind: CosmeticKind) -> Option<u32> {
        self.current_user().map(|p| p.equipped(kind))
    }

    fn is_owned(&self, kind: CosmeticKind, id: u32) -> bool {
        self.current_user().is_some_and(|p| p.owns(kind, id))
    }

    fn control_bindings(&self) -> ControlBindings {
        self.current_user()
            .map(|p| p.controls.clone())
            .unwrap_or_default()
    }

    fn report_xp_gain(&mut self, amount: u32) {
        self.report_xp(u64::from(amount));
    }

    fn report_best_score(&mut self, score: u32) -> bool {
        self.update_best_score(score)
    }
}
