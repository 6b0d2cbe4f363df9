//! Startup configuration.
//!
//! Read once from `$MARKOV_FLOW_SETTINGS` or `<config dir>/markov-flow/settings.json`.
//! Every field has a default, so a partial file is fine and a missing one means
//! all defaults. Out-of-range values are replaced by their defaults with a
//! warning. Nothing is ever written back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable overriding the settings file location
pub const SETTINGS_ENV: &str = "MARKOV_FLOW_SETTINGS";

/// Upper bound on synchronous prewarm iterations
pub const MAX_PREWARM_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File path or http(s) URL of the initial chain document
    pub chain_source: String,

    // Layout area
    pub width: f32,
    pub height: f32,

    // Physics
    pub charge: f32,
    pub gravity: f32,
    pub link_strength: f32,
    pub link_distance: f32,
    pub friction: f32,
    pub theta: f32,
    pub prewarm_iterations: usize,
    /// Fixed RNG seed for reproducible layouts
    pub layout_seed: Option<u64>,

    // Display
    pub node_radius: f32,
    /// Transition length used by the single-step button
    pub step_transition_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain_source: "markov.json".to_string(),

            width: 960.0,
            height: 500.0,

            charge: -1000.0,
            gravity: 0.05,
            link_strength: 1.0,
            link_distance: 100.0,
            friction: 0.9,
            theta: 0.8,
            prewarm_iterations: 200,
            layout_seed: None,

            node_radius: 30.0,
            step_transition_ms: 1000,
        }
    }
}

impl Settings {
    /// Get the path to the settings file
    fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|mut p| {
            p.push("markov-flow");
            p.push("settings.json");
            p
        })
    }

    /// Load settings from disk, returning defaults if the file doesn't exist or is invalid
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            warn!("could not determine config directory, using default settings");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(settings) => {
                    info!(path = %path.display(), "loaded settings");
                    settings
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                    Self::default()
                }
            },
            // File doesn't exist yet, that's fine
            Err(_) => Self::default(),
        }
    }

    /// Parse settings, resetting out-of-range fields to their defaults
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let settings: Self = serde_json::from_str(text)?;
        Ok(settings.sanitized())
    }

    fn sanitized(mut self) -> Self {
        let d = Self::default();
        check(self.width > 0.0 && self.width.is_finite(), "width", &mut self.width, d.width);
        check(self.height > 0.0 && self.height.is_finite(), "height", &mut self.height, d.height);
        check((0.0..=1.0).contains(&self.friction), "friction", &mut self.friction, d.friction);
        check(self.theta >= 0.0 && self.theta.is_finite(), "theta", &mut self.theta, d.theta);
        check(
            self.link_distance >= 0.0 && self.link_distance.is_finite(),
            "link_distance",
            &mut self.link_distance,
            d.link_distance,
        );
        check(
            self.prewarm_iterations <= MAX_PREWARM_ITERATIONS,
            "prewarm_iterations",
            &mut self.prewarm_iterations,
            d.prewarm_iterations,
        );
        check(self.node_radius > 0.0 && self.node_radius.is_finite(), "node_radius", &mut self.node_radius, d.node_radius);
        self
    }
}

fn check<T: std::fmt::Debug>(in_range: bool, field: &'static str, value: &mut T, default: T) {
    if !in_range {
        warn!(field, value = ?value, default = ?default, "setting out of range, using default");
        *value = default;
    }
}
