//! Runtime configuration resource.
//!
//! Tuning values loaded from an INI file. Every key is optional; missing
//! keys keep their defaults, so a missing file is not an error for callers
//! that choose to ignore it.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_dt = 0.016
//! max_script_steps = 64
//!
//! [motion]
//! speed = 200
//! epsilon = 0.001
//!
//! [grid]
//! cell_width = 400
//! cell_height = 400
//!
//! [touch]
//! stages = 2,1,0
//! mask = 64
//!
//! [exercise]
//! required_score = 1
//! ```

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::components::motion::{ARRIVAL_EPSILON, DEFAULT_SPEED};
use crate::exercise::state::DEFAULT_REQUIRED_SCORE;
use crate::resources::stages::{MAX_STAGES, StageId};
use crate::spatial::Category;
use crate::spatial::grid::DEFAULT_CELL_SIZE;

const DEFAULT_FIXED_DT: f32 = 0.016;
const DEFAULT_MAX_SCRIPT_STEPS: u32 = 64;
const DEFAULT_CONFIG_PATH: &str = "./learnstage.ini";

/// Touch stages tried first to last.
pub const DEFAULT_TOUCH_STAGES: [StageId; 3] = [StageId(2), StageId(1), StageId(0)];

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Seconds simulated per tick.
    pub fixed_dt: f32,
    /// Upper bound of statements one script may run in a single tick.
    pub max_script_steps: u32,
    pub speed: f32,
    pub epsilon: f32,
    pub cell_width: f32,
    pub cell_height: f32,
    pub touch_stages: ArrayVec<StageId, MAX_STAGES>,
    /// `None` disables category filtering for touches. Written as `0`.
    pub touch_mask: Option<Category>,
    pub required_score: f64,
    pub config_path: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self {
            fixed_dt: DEFAULT_FIXED_DT,
            max_script_steps: DEFAULT_MAX_SCRIPT_STEPS,
            speed: DEFAULT_SPEED,
            epsilon: ARRIVAL_EPSILON,
            cell_width: DEFAULT_CELL_SIZE,
            cell_height: DEFAULT_CELL_SIZE,
            touch_stages: DEFAULT_TOUCH_STAGES.into_iter().collect(),
            touch_mask: Some(Category::UI),
            required_score: DEFAULT_REQUIRED_SCORE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values. Values that do not parse
    /// are skipped with a warning.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        info!(
            "Loaded config: dt={}, steps={}, speed={}, grid={}x{}, touch={:?} mask={:?}",
            self.fixed_dt,
            self.max_script_steps,
            self.speed,
            self.cell_width,
            self.cell_height,
            self.touch_stages,
            self.touch_mask
        );
        Ok(())
    }

    /// Same as [`load_from_file`](Self::load_from_file) but from a string.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [simulation] section
        if let Some(dt) = positive(config, "simulation", "fixed_dt") {
            self.fixed_dt = dt as f32;
        }
        if let Some(steps) = config.getuint("simulation", "max_script_steps").ok().flatten() {
            self.max_script_steps = (steps as u32).max(1);
        }

        // [motion] section
        if let Some(speed) = positive(config, "motion", "speed") {
            self.speed = speed as f32;
        }
        if let Some(epsilon) = positive(config, "motion", "epsilon") {
            self.epsilon = epsilon as f32;
        }

        // [grid] section
        if let Some(w) = positive(config, "grid", "cell_width") {
            self.cell_width = w as f32;
        }
        if let Some(h) = positive(config, "grid", "cell_height") {
            self.cell_height = h as f32;
        }

        // [touch] section
        if let Some(stages) = config.get("touch", "stages") {
            match parse_stage_list(&stages) {
                Ok(list) => self.touch_stages = list,
                Err(e) => warn!("ignoring [touch] stages: {}", e),
            }
        }
        if let Some(mask) = config.getuint("touch", "mask").ok().flatten() {
            self.touch_mask = match mask {
                0 => None,
                bits => Some(Category::from_bits_truncate(bits as u32)),
            };
        }

        // [exercise] section
        if let Some(required) = config.getfloat("exercise", "required_score").ok().flatten() {
            self.required_score = required;
        }
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("simulation", "fixed_dt", Some(self.fixed_dt.to_string()));
        config.set(
            "simulation",
            "max_script_steps",
            Some(self.max_script_steps.to_string()),
        );
        config.set("motion", "speed", Some(self.speed.to_string()));
        config.set("motion", "epsilon", Some(self.epsilon.to_string()));
        config.set("grid", "cell_width", Some(self.cell_width.to_string()));
        config.set("grid", "cell_height", Some(self.cell_height.to_string()));
        let stages: Vec<String> = self.touch_stages.iter().map(|s| s.0.to_string()).collect();
        config.set("touch", "stages", Some(stages.join(",")));
        config.set(
            "touch",
            "mask",
            Some(self.touch_mask.map_or(0, |m| m.bits()).to_string()),
        );
        config.set(
            "exercise",
            "required_score",
            Some(self.required_score.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn set_grid_size(&mut self, width: f32, height: f32) {
        self.cell_width = width;
        self.cell_height = height;
    }

    pub fn set_touch(&mut self, stages: &[StageId], mask: Option<Category>) {
        self.touch_stages = stages.iter().copied().take(MAX_STAGES).collect();
        self.touch_mask = mask;
    }
}

fn positive(config: &Ini, section: &str, key: &str) -> Option<f64> {
    match config.getfloat(section, key) {
        Ok(Some(v)) if v > 0.0 && v.is_finite() => Some(v),
        Ok(Some(v)) => {
            warn!("[{}] {} must be positive, got {}", section, key, v);
            None
        }
        Ok(None) => None,
        Err(e) => {
            warn!("[{}] {}: {}", section, key, e);
            None
        }
    }
}

fn parse_stage_list(text: &str) -> Result<ArrayVec<StageId, MAX_STAGES>, String> {
    let mut list = ArrayVec::new();
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: u8 = part
            .parse()
            .map_err(|e| format!("bad stage id {:?}: {}", part, e))?;
        list.try_push(StageId(id))
            .map_err(|_| format!("more than {} stages", MAX_STAGES))?;
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = RuntimeConfig::new();
        assert_eq!(c.speed, 200.0);
        assert_eq!(c.cell_width, 400.0);
        assert_eq!(c.touch_stages.as_slice(), &DEFAULT_TOUCH_STAGES);
        assert_eq!(c.touch_mask, Some(Category::UI));
    }

    #[test]
    fn test_load_from_str_overrides_and_keeps_missing() {
        let mut c = RuntimeConfig::new();
        c.load_from_str(
            "[motion]\nspeed = 50\n[touch]\nstages = 0, 3\nmask = 0\n[grid]\ncell_width = -4\n",
        )
        .unwrap();
        assert_eq!(c.speed, 50.0);
        assert_eq!(c.touch_stages.as_slice(), &[StageId(0), StageId(3)]);
        assert_eq!(c.touch_mask, None);
        assert_eq!(c.cell_width, 400.0);
        assert_eq!(c.fixed_dt, DEFAULT_FIXED_DT);
    }

    #[test]
    fn test_bad_stage_list_is_ignored() {
        let mut c = RuntimeConfig::new();
        c.load_from_str("[touch]\nstages = 1,x\n").unwrap();
        assert_eq!(c.touch_stages.as_slice(), &DEFAULT_TOUCH_STAGES);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut c = RuntimeConfig::with_path("/nonexistent/learnstage.ini");
        assert!(c.load_from_file().is_err());
    }
}
