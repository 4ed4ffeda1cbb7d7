use std::collections::HashMap;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Last-write-wins key state, one boolean per key name.
///
/// Written by the host's key-down/key-up handlers, read once per tick.
#[derive(Resource, Debug, Default, Clone)]
pub struct InputLatch {
    keys: HashMap<String, bool>,
}

impl InputLatch {
    pub fn set_key(&mut self, key: impl Into<String>, pressed: bool) {
        self.keys.insert(key.into(), pressed);
    }

    /// Keys that were never seen read as released.
    pub fn is_pressed(&self, key: &str) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    pub fn release_all(&mut self) {
        for pressed in self.keys.values_mut() {
            *pressed = false;
        }
    }

    pub fn held(&self) -> impl Iterator<Item = &str> {
        self.keys
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(key, _)| key.as_str())
    }
}

/// How key names are normalized before they reach the latch.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Names are latched exactly as the host reports them.
    #[default]
    Raw,
    /// Single-character keys are lower-cased, so `W` and `w` are the same key.
    LowerLetters,
}

impl KeyCase {
    pub fn normalize(self, key: &str) -> String {
        match self {
            KeyCase::Raw => key.to_string(),
            KeyCase::LowerLetters => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c.to_lowercase().collect(),
                    _ => key.to_string(),
                }
            }
        }
    }
}

/// Which latched key drives which control.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Bindings {
    pub forward: String,
    pub reverse: String,
    pub left: String,
    pub right: String,
}

impl Bindings {
    pub fn arrows() -> Self {
        Self {
            forward: "ArrowUp".to_string(),
            reverse: "ArrowDown".to_string(),
            left: "ArrowLeft".to_string(),
            right: "ArrowRight".to_string(),
        }
    }

    pub fn wasd() -> Self {
        Self {
            forward: "w".to_string(),
            reverse: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
        }
    }

    /// Snapshot the bound keys out of the latch.
    pub fn read(&self, latch: &InputLatch) -> Controls {
        Controls {
            forward: latch.is_pressed(&self.forward),
            reverse: latch.is_pressed(&self.reverse),
            left: latch.is_pressed(&self.left),
            right: latch.is_pressed(&self.right),
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        [&self.forward, &self.reverse, &self.left, &self.right]
            .into_iter()
            .map(String::as_str)
    }
}

/// Controls held during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub forward: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
}

impl Controls {
    pub fn any(&self) -> bool {
        self.forward || self.reverse || self.left || self.right
    }
}
