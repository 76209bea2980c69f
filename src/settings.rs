//! Player preferences
//!
//! Persisted separately from the leaderboard in LocalStorage.

use serde::{Deserialize, Serialize};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pre-fill the game-over prompt with the last identifier used
    pub remember_identifier: bool,
    /// Raw (unmasked) identifier; stays on this device only
    pub last_identifier: Option<String>,

    /// Reduced motion (no monkey spin or obstacle rotation when drawing)
    pub reduced_motion: bool,
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remember_identifier: true,
            last_identifier: None,
            reduced_motion: false,
            show_fps: false,
        }
    }
}

impl Settings {
    /// Text to pre-fill the identifier prompt with
    pub fn prompt_default(&self) -> &str {
        match (&self.last_identifier, self.remember_identifier) {
            (Some(identifier), true) => identifier,
            _ => "",
        }
    }

    /// Record the identifier the player just entered
    pub fn remember(&mut self, identifier: &str) {
        if self.remember_identifier && !identifier.trim().is_empty() {
            self.last_identifier = Some(identifier.trim().to_string());
        }
    }

    /// Rotation to draw for an entity (flattened under reduced motion)
    pub fn effective_rotation(&self, rotation: f32) -> f32 {
        if self.reduced_motion { 0.0 } else { rotation }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "monkey_bed_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Could not save settings");
                }
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
