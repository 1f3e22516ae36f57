use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::NarrativeText;
use crate::scene::{PlanError, SceneKind, ScenePlan};

/// Durations as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = value.as_millis().min(u64::MAX as u128) as u64;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid scene plan: {0}")]
    Plan(#[from] PlanError),
}

/// Named timing and geometry constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Tunables {
    #[serde(with = "duration_ms")]
    pub hold_duration: Duration,
    /// Logical px between a tap and the expected trace star for it to count.
    pub snap_radius: f32,
    pub wheel_delta_threshold: f32,
    #[serde(with = "duration_ms")]
    pub wheel_debounce: Duration,
    #[serde(with = "duration_ms")]
    pub transition_lock: Duration,
    pub swipe_reset_threshold: f32,
    pub swipe_fade_distance: f32,
    /// Path reveal progress per second of scene age.
    pub path_reveal_rate: f32,
    /// Intro star fade-in progress per second of scene age.
    pub intro_star_reveal_rate: f32,
    #[serde(with = "duration_ms")]
    pub memory_line_step: Duration,
    #[serde(with = "duration_ms")]
    pub reduced_memory_line_step: Duration,
    pub max_device_pixel_ratio: f32,
    pub low_power_device_pixel_ratio: f32,
    pub star_count: usize,
    pub low_power_star_factor: f32,
    #[serde(with = "duration_ms")]
    pub ripple_lifetime: Duration,
    #[serde(with = "duration_ms")]
    pub burst_lifetime: Duration,
    #[serde(with = "duration_ms")]
    pub wave_lifetime: Duration,
    #[serde(with = "duration_ms")]
    pub shimmer_lifetime: Duration,
    pub telemetry_capacity: usize,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            hold_duration: Duration::from_millis(1500),
            snap_radius: 34.0,
            wheel_delta_threshold: 24.0,
            wheel_debounce: Duration::from_millis(380),
            transition_lock: Duration::from_millis(260),
            swipe_reset_threshold: 120.0,
            swipe_fade_distance: 240.0,
            path_reveal_rate: 0.48,
            intro_star_reveal_rate: 0.22,
            memory_line_step: Duration::from_millis(1450),
            reduced_memory_line_step: Duration::from_millis(380),
            max_device_pixel_ratio: 2.0,
            low_power_device_pixel_ratio: 1.4,
            star_count: 220,
            low_power_star_factor: 0.62,
            ripple_lifetime: Duration::from_millis(900),
            burst_lifetime: Duration::from_millis(1100),
            // 1 / 0.013 and 1 / 0.016 frames at 60 Hz.
            wave_lifetime: Duration::from_millis(1280),
            shimmer_lifetime: Duration::from_millis(1040),
            telemetry_capacity: 64,
        }
    }
}

impl Tunables {
    pub fn sanitized(mut self) -> Self {
        let defaults = Tunables::default();
        let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };

        self.snap_radius = finite_or(self.snap_radius, defaults.snap_radius).max(0.0);
        self.wheel_delta_threshold =
            finite_or(self.wheel_delta_threshold, defaults.wheel_delta_threshold).max(0.0);
        self.swipe_reset_threshold =
            finite_or(self.swipe_reset_threshold, defaults.swipe_reset_threshold).max(0.0);
        self.swipe_fade_distance =
            finite_or(self.swipe_fade_distance, defaults.swipe_fade_distance).max(1.0);
        self.path_reveal_rate = finite_or(self.path_reveal_rate, defaults.path_reveal_rate).max(0.0);
        self.intro_star_reveal_rate =
            finite_or(self.intro_star_reveal_rate, defaults.intro_star_reveal_rate).max(0.0);
        self.max_device_pixel_ratio =
            finite_or(self.max_device_pixel_ratio, defaults.max_device_pixel_ratio).clamp(0.5, 4.0);
        self.low_power_device_pixel_ratio = finite_or(
            self.low_power_device_pixel_ratio,
            defaults.low_power_device_pixel_ratio,
        )
        .clamp(0.5, 4.0);
        self.star_count = self.star_count.min(4000);
        self.low_power_star_factor =
            finite_or(self.low_power_star_factor, defaults.low_power_star_factor).clamp(0.0, 1.0);
        self.telemetry_capacity = self.telemetry_capacity.max(1);
        if self.hold_duration.is_zero() {
            self.hold_duration = defaults.hold_duration;
        }
        self
    }
}

/// Reduced-motion and low-power flags. Both are binary.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MotionPolicy {
    pub reduced_motion: bool,
    pub low_power: bool,
}

/// Reads a boolean switch such as `1`, `true`, `off`. Unset or unrecognised values are `None`.
pub fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name).ok().as_deref().and_then(parse_bool)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl MotionPolicy {
    pub const LOW_POWER_MAX_CORES: usize = 4;

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Reads `CONSTELLATION_REDUCED_MOTION` / `CONSTELLATION_LOW_POWER`, falling back to `self`
    /// for reduced motion and to the core count for low power.
    pub fn with_env_overrides(self) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.with_overrides(|name| std::env::var(name).ok(), cores)
    }

    fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>, cores: usize) -> Self {
        let flag = |name: &str| lookup(name).as_deref().and_then(parse_bool);
        Self {
            reduced_motion: flag("CONSTELLATION_REDUCED_MOTION").unwrap_or(self.reduced_motion),
            low_power: flag("CONSTELLATION_LOW_POWER")
                .unwrap_or(self.low_power || cores <= Self::LOW_POWER_MAX_CORES),
        }
    }

    pub fn star_count(self, tunables: &Tunables) -> usize {
        if self.low_power {
            (tunables.star_count as f32 * tunables.low_power_star_factor).floor() as usize
        } else {
            tunables.star_count
        }
    }

    pub fn max_device_pixel_ratio(self, tunables: &Tunables) -> f32 {
        if self.low_power {
            tunables.low_power_device_pixel_ratio
        } else {
            tunables.max_device_pixel_ratio
        }
    }

    pub fn memory_line_step(self, tunables: &Tunables) -> Duration {
        if self.reduced_motion {
            tunables.reduced_memory_line_step
        } else {
            tunables.memory_line_step
        }
    }
}

/// Optional decorative layers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AmbientEffects {
    pub tap_ripples: bool,
    /// First and last scene (inclusive) on which background taps spawn ripples.
    pub ripple_from: SceneKind,
    pub ripple_until: SceneKind,
    pub moonlight_beams: bool,
    pub center_light: bool,
    pub vignette: bool,
}

impl Default for AmbientEffects {
    fn default() -> Self {
        Self {
            tap_ripples: true,
            ripple_from: SceneKind::Glow,
            ripple_until: SceneKind::Question,
            moonlight_beams: true,
            center_light: true,
            vignette: true,
        }
    }
}

impl AmbientEffects {
    pub fn ripples_on(&self, kind: SceneKind) -> bool {
        self.tap_ripples
            && (self.ripple_from.ordinal()..=self.ripple_until.ordinal()).contains(&kind.ordinal())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceConfig {
    #[serde(default)]
    pub scenes: ScenePlan,
    /// Prefix `scenes` with the trace pre-stage.
    #[serde(default)]
    pub trace_stage: bool,
    #[serde(default)]
    pub tunables: Tunables,
    #[serde(default)]
    pub ambient: AmbientEffects,
    #[serde(default)]
    pub motion: MotionPolicy,
    #[serde(default)]
    pub debug_overlay: bool,
    #[serde(default)]
    pub text: NarrativeText,
    /// Endpoint for the decorative quote; `None` keeps the local fallback.
    #[serde(default)]
    pub quote_url: Option<String>,
}

impl Default for ExperienceConfig {
    fn default() -> Self {
        Self {
            scenes: ScenePlan::standard(),
            trace_stage: false,
            tunables: Tunables::default(),
            ambient: AmbientEffects::default(),
            motion: MotionPolicy::default(),
            debug_overlay: false,
            text: NarrativeText::default(),
            quote_url: None,
        }
    }
}

impl ExperienceConfig {
    /// The plan actually walked, including the trace pre-stage when enabled.
    pub fn plan(&self) -> Result<ScenePlan, PlanError> {
        if self.trace_stage && !self.scenes.has_trace() {
            self.scenes.clone().with_trace()
        } else {
            Ok(self.scenes.clone())
        }
    }

    pub fn sanitized(mut self) -> Self {
        self.tunables = self.tunables.sanitized();
        self
    }

    /// Applies the motion, debug and quote endpoint environment variables.
    pub fn with_env_overrides(self) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.with_overrides(|name| std::env::var(name).ok(), cores)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>, cores: usize) -> Self {
        self.motion = self.motion.with_overrides(&lookup, cores);
        if let Some(debug) = lookup(ConfigStore::DEBUG_VAR).as_deref().and_then(parse_bool) {
            self.debug_overlay = debug;
        }
        if let Some(url) = lookup(ConfigStore::QUOTE_URL_VAR) {
            if !url.trim().is_empty() {
                self.quote_url = Some(url);
            }
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: Option<PathBuf>,
}

impl ConfigStore {
    pub const PATH_VAR: &'static str = "CONSTELLATION_CONFIG";
    pub const QUOTE_URL_VAR: &'static str = "CONSTELLATION_QUOTE_URL";
    pub const DEBUG_VAR: &'static str = "CONSTELLATION_DEBUG";

    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(Self::PATH_VAR).map(PathBuf::from),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Loads the config file (defaults when unset or missing), then applies environment
    /// overrides for motion policy, the debug overlay and the quote endpoint.
    pub fn load(&self) -> Result<ExperienceConfig, ConfigError> {
        let config = self.load_file()?;
        config.plan()?;
        Ok(config.with_env_overrides())
    }

    pub fn load_file(&self) -> Result<ExperienceConfig, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(ExperienceConfig::default());
        };
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(ExperienceConfig::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.clone(),
                    source,
                });
            }
        };
        let config: ExperienceConfig = serde_json::from_slice(&bytes)?;
        Ok(config.sanitized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tunables_default_to_documented_constants() {
        let t = Tunables::default();
        assert_eq!(t.hold_duration, Duration::from_millis(1500));
        assert_eq!(t.snap_radius, 34.0);
        assert_eq!(t.wheel_delta_threshold, 24.0);
        assert_eq!(t.wheel_debounce, Duration::from_millis(380));
    }

    #[test]
    fn low_power_scales_star_count_and_dpr_cap() {
        let t = Tunables::default();
        let normal = MotionPolicy::default();
        let low = MotionPolicy {
            low_power: true,
            ..MotionPolicy::default()
        };
        assert_eq!(normal.star_count(&t), 220);
        assert_eq!(low.star_count(&t), 136);
        assert_eq!(normal.max_device_pixel_ratio(&t), 2.0);
        assert_eq!(low.max_device_pixel_ratio(&t), 1.4);
    }

    #[test]
    fn reduced_motion_shortens_memory_stagger() {
        let t = Tunables::default();
        let reduced = MotionPolicy {
            reduced_motion: true,
            low_power: false,
        };
        assert_eq!(reduced.memory_line_step(&t), Duration::from_millis(380));
        assert_eq!(
            MotionPolicy::default().memory_line_step(&t),
            Duration::from_millis(1450)
        );
    }

    #[test]
    fn partial_json_keeps_defaults_and_durations_are_millis() {
        let json = r#"{
            "scenes": ["intro", "hold", "resolved"],
            "tunables": { "hold_duration": 900, "snap_radius": -5 }
        }"#;
        let config: ExperienceConfig = serde_json::from_str(json).unwrap();
        let config = config.sanitized();
        assert_eq!(config.scenes, ScenePlan::short());
        assert_eq!(config.tunables.hold_duration, Duration::from_millis(900));
        assert_eq!(config.tunables.snap_radius, 0.0);
        assert_eq!(config.tunables.wheel_debounce, Duration::from_millis(380));

        let out = serde_json::to_value(&config.tunables).unwrap();
        assert_eq!(out["hold_duration"], 900);
    }

    #[test]
    fn invalid_plan_in_config_is_rejected() {
        let json = r#"{ "scenes": ["intro", "glow"] }"#;
        assert!(serde_json::from_str::<ExperienceConfig>(json).is_err());
    }

    #[test]
    fn trace_stage_prefixes_plan() {
        let config = ExperienceConfig {
            trace_stage: true,
            ..ExperienceConfig::default()
        };
        let plan = config.plan().unwrap();
        assert_eq!(plan.kinds()[0], SceneKind::Trace);
        assert_eq!(plan.len(), 7);
    }

    #[test]
    fn ripple_window_is_inclusive() {
        let fx = AmbientEffects::default();
        assert!(!fx.ripples_on(SceneKind::Intro));
        assert!(fx.ripples_on(SceneKind::Glow));
        assert!(fx.ripples_on(SceneKind::Question));
        assert!(!fx.ripples_on(SceneKind::Hold));
    }

    #[test]
    fn overrides_apply_to_default_config() {
        let vars = [
            ("CONSTELLATION_REDUCED_MOTION", " Yes "),
            ("CONSTELLATION_DEBUG", "1"),
            ("CONSTELLATION_QUOTE_URL", "http://127.0.0.1:9/quote"),
        ];
        let lookup = |name: &str| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        };

        let config = ExperienceConfig::default().with_overrides(lookup, 2);
        assert!(config.motion.reduced_motion);
        assert!(config.motion.low_power, "few cores default to low power");
        assert!(config.debug_overlay);
        assert_eq!(config.quote_url.as_deref(), Some("http://127.0.0.1:9/quote"));

        let roomy = ExperienceConfig::default().with_overrides(|_| None, 16);
        assert_eq!(roomy.motion, MotionPolicy::default());
        assert!(!roomy.debug_overlay);
    }

    #[test]
    fn bool_switches_accept_common_spellings() {
        assert_eq!(parse_bool("ON"), Some(true));
        assert_eq!(parse_bool(" off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let store = ConfigStore::at(std::env::temp_dir().join("constellation-missing-config.json"));
        let config = store.load_file().unwrap();
        assert_eq!(config, ExperienceConfig::default());
    }
}
