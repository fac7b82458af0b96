//! Key/value JSON storage
//!
//! LocalStorage in the browser. Native builds keep values in a per-thread map for
//! the life of the process, which is enough for tests and the headless demo.

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
}

#[cfg(target_arch = "wasm32")]
fn get_raw(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok()?
}

#[cfg(target_arch = "wasm32")]
fn set_raw(key: &str, value: &str) -> bool {
    local_storage().is_some_and(|s| s.set_item(key, value).is_ok())
}

#[cfg(target_arch = "wasm32")]
pub fn remove(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

#[cfg(not(target_arch = "wasm32"))]
thread_local! {
    static MEMORY: std::cell::RefCell<std::collections::HashMap<String, String>> =
        std::cell::RefCell::new(std::collections::HashMap::new());
}

#[cfg(not(target_arch = "wasm32"))]
fn get_raw(key: &str) -> Option<String> {
    MEMORY.with(|m| m.borrow().get(key).cloned())
}

#[cfg(not(target_arch = "wasm32"))]
fn set_raw(key: &str, value: &str) -> bool {
    MEMORY.with(|m| m.borrow_mut().insert(key.to_string(), value.to_string()));
    true
}

#[cfg(not(target_arch = "wasm32"))]
pub fn remove(key: &str) {
    MEMORY.with(|m| m.borrow_mut().remove(key));
}

/// Read and decode `key`. Missing keys give `None`; malformed JSON is logged.
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    let json = get_raw(key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed {key}: {e}");
            None
        }
    }
}

/// Encode and write `value` under `key`. Returns false if nothing was written.
pub fn save_json<T: Serialize + ?Sized>(key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(json) => {
            let saved = set_raw(key, &json);
            if !saved {
                log::warn!("Storage unavailable, {key} not saved");
            }
            saved
        }
        Err(e) => {
            log::warn!("Could not encode {key}: {e}");
            false
        }
    }
}

/// Raw string value, for keys that are not JSON
pub fn load_string(key: &str) -> Option<String> {
    get_raw(key)
}

pub fn save_string(key: &str, value: &str) -> bool {
    set_raw(key, value)
}
