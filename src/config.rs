//! Tunables for the page components.
//!
//! Defaults reproduce the shipped page. A page may override any subset by
//! embedding `<script type="application/json" id="portfolio-config">` with a
//! camelCase JSON object; unknown keys are ignored.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};

use crate::dom::Dom;
use crate::error::ConfigError;

/// Element id of the optional JSON config block.
pub const CONFIG_ELEMENT_ID: &str = "portfolio-config";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeConfig {
    /// `localStorage` key holding `"light"` / `"dark"`.
    pub storage_key: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self { storage_key: "theme".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationConfig {
    pub scroll_throttle_ms: u32,
    /// How far above a section's top the section already counts as active.
    pub section_lookahead_px: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self { scroll_throttle_ms: 100, section_lookahead_px: 100.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationConfig {
    pub reveal_threshold: f64,
    pub reveal_root_margin: String,
    /// Delay between consecutive grid cards in a revealed section.
    pub stagger_step_ms: u32,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub title_delay_ms: u32,
    pub subtitle_delay_ms: u32,
    pub type_speed_ms: u32,
    pub particle_count: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            reveal_threshold: 0.1,
            reveal_root_margin: "0px 0px -50px 0px".to_owned(),
            stagger_step_ms: 100,
            hero_title: "Ahmed Hussain".to_owned(),
            hero_subtitle: "Aspiring AI/ML Engineer".to_owned(),
            title_delay_ms: 500,
            subtitle_delay_ms: 2000,
            type_speed_ms: 100,
            particle_count: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactConfig {
    /// Simulated network latency for the contact round trip.
    pub submit_latency_ms: u32,
    /// Lifetime of the success / failure banner.
    pub banner_ttl_ms: u32,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self { submit_latency_ms: 2000, banner_ttl_ms: 5000 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioConfig {
    pub theme: ThemeConfig,
    pub navigation: NavigationConfig,
    pub animation: AnimationConfig,
    pub contact: ContactConfig,
}

impl PortfolioConfig {
    /// Parse a (possibly partial) JSON override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or mistyped values.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read the config block from the page, falling back to defaults when it
    /// is absent, empty or invalid.
    pub fn load<D: Dom + ?Sized>(dom: &D) -> Self {
        let Some(el) = dom.element_by_id(CONFIG_ELEMENT_ID) else {
            return Self::default();
        };
        let raw = dom.text_content(&el);
        if raw.trim().is_empty() {
            return Self::default();
        }
        match Self::from_json(&raw) {
            Ok(config) => {
                log::debug!("loaded page config from #{CONFIG_ELEMENT_ID}");
                config
            }
            Err(err) => {
                log::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }
}
