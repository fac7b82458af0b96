//! Error types for the account book.

use std::fmt;

use crate::shop::CosmeticKind;

/// Why an account operation was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Another account already uses this pseudo.
    NameTaken(String),
    /// No account with this pseudo.
    UnknownAccount(String),
    /// The code does not match.
    WrongCode,
    /// The operation needs a logged-in user.
    NotLoggedIn,
    /// The item is already in the inventory.
    AlreadyOwned(CosmeticKind, u32),
    /// The item is not in the catalog.
    UnknownItem(CosmeticKind, u32),
    /// The player's level is below the item's gate.
    Locked {
        /// Level the item unlocks at.
        required_level: u32,
    },
    /// Equipping an item that was never bought.
    NotOwned(CosmeticKind, u32),
}

impl fmt::Display for AccountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountError::NameTaken(name) => write!(f, "pseudo already in use: {name}"),
            AccountError::UnknownAccount(name) => write!(f, "no account named {name}"),
            AccountError::WrongCode => write!(f, "incorrect code"),
            AccountError::NotLoggedIn => write!(f, "not logged in"),
            AccountError::AlreadyOwned(kind, id) => {
                write!(f, "{} item {id} already owned", kind.as_str())
            }
            AccountError::UnknownItem(kind, id) => {
                write!(f, "no {} item with id {id}", kind.as_str())
            }
            AccountError::Locked { required_level } => {
                write!(f, "unlocks at level {required_level}")
            }
            AccountError::NotOwned(kind, id) => {
                write!(f, "{} item {id} not owned", kind.as_str())
            }
        }
    }
}

impl std::error::Error for AccountError {}

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;
