//! Top-level configuration, loadable from JSON. Every section has defaults,
//! so a file only needs the values it changes.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::integration::ClassMap;
use crate::rally::RallyConfig;
use crate::tracker::TrackerConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefereeConfig {
    /// Camera frame width used for the left/right split of rackets and
    /// players when the calibration does not record a frame size.
    pub frame_width: Option<u32>,
    pub tracker: TrackerConfig,
    pub rally: RallyConfig,
    pub classes: ClassMap,
}

impl RefereeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RefereeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rally = &self.rally;
        let rules = &rally.rules;

        if self.frame_width == Some(0) {
            return Err(invalid("frame_width must be positive"));
        }
        if self.tracker.history_capacity == 0 {
            return Err(invalid("tracker.history_capacity must be positive"));
        }
        if !rally.table.is_valid() {
            return Err(invalid("rally.table dimensions must be positive"));
        }
        if rules.points_to_win_game == 0
            || rules.games_to_win_match == 0
            || rules.serves_per_turn == 0
        {
            return Err(invalid(
                "points_to_win_game, games_to_win_match and serves_per_turn must be positive",
            ));
        }

        let non_negative = [
            ("serve_speed_threshold", rally.serve_speed_threshold),
            ("serve_cooldown_secs", rally.serve_cooldown_secs),
            ("hit_proximity", rally.hit_proximity),
            ("hit_refractory_secs", rally.hit_refractory_secs),
            ("bounce_noise", rally.bounce_noise),
            ("bounce_tolerance", rally.bounce_tolerance),
            ("out_of_bounds_margin", rally.out_of_bounds_margin),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(&format!("rally.{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Invalid(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;
    use crate::rally::UnattributedPointPolicy;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = RefereeConfig::from_json_str(
            r#"{
                "rally": {
                    "serve_speed_threshold": 80.0,
                    "rules": { "games_to_win_match": 2 },
                    "unattributed_point": "replay"
                },
                "classes": { "ball": 0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.rally.serve_speed_threshold, 80.0);
        assert_eq!(config.rally.rules.games_to_win_match, 2);
        assert_eq!(config.rally.rules.points_to_win_game, 11);
        assert_eq!(config.rally.unattributed_point, UnattributedPointPolicy::Replay);
        assert_eq!(config.classes.ball, 0);
        assert_eq!(config.classes.racket, 1);
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_award_policy_parses() {
        let config =
            RefereeConfig::from_json_str(r#"{"rally": {"unattributed_point": {"award_to": "right"}}}"#)
                .unwrap();
        assert_eq!(
            config.rally.unattributed_point,
            UnattributedPointPolicy::AwardTo(Side::Right)
        );
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            RefereeConfig::from_json_str(r#"{"tracker": {"history_capacity": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RefereeConfig::from_json_str(r#"{"rally": {"hit_proximity": -1.0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RefereeConfig::from_json_str(r#"{"rally": {"table": {"width": 0.0}}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RefereeConfig::from_json_str(r#"{"rally": {"serve_cooldown_secs": -0.5}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RefereeConfig::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
