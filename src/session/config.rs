//! Session settings, loadable from a JSON file.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engines::skill_level::SkillLevel;
use crate::errors::{ControllerError, ControllerResult};
use crate::game_state::chess_types::Color;

pub const DEFAULT_THINK_DELAY_MS: u64 = 500;
pub const DEFAULT_ENGINE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanSide {
    #[default]
    White,
    Black,
}

impl HumanSide {
    pub fn color(self) -> Color {
        match self {
            HumanSide::White => Color::White,
            HumanSide::Black => Color::Black,
        }
    }
}

impl FromStr for HumanSide {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(HumanSide::White),
            "black" | "b" => Ok(HumanSide::Black),
            other => Err(ControllerError::Parse(format!("unknown side '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// UCI executable. Without one only the random tier can play.
    pub engine_command: Option<String>,
    pub engine_args: Vec<String>,
    pub skill_level: SkillLevel,
    pub think_delay_ms: u64,
    /// `null` waits for the engine forever.
    pub engine_timeout_ms: Option<u64>,
    pub human_side: HumanSide,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_command: None,
            engine_args: Vec::new(),
            skill_level: SkillLevel::default(),
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
            engine_timeout_ms: Some(DEFAULT_ENGINE_TIMEOUT_MS),
            human_side: HumanSide::White,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> ControllerResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| ControllerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_json(text: &str) -> ControllerResult<Self> {
        serde_json::from_str(text).map_err(|e| ControllerError::Config(e.to_string()))
    }

    #[inline]
    pub fn think_delay(&self) -> Duration {
        Duration::from_millis(self.think_delay_ms)
    }

    #[inline]
    pub fn engine_timeout(&self) -> Option<Duration> {
        self.engine_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{HumanSide, SessionConfig};
    use crate::engines::skill_level::SkillLevel;
    use crate::errors::ControllerError;

    #[test]
    fn defaults_match_documented_values() {
        let config = SessionConfig::default();
        assert_eq!(config.think_delay(), Duration::from_millis(500));
        assert_eq!(config.engine_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.human_side, HumanSide::White);
        assert_eq!(config.skill_level, SkillLevel::EASY);
        assert!(config.engine_command.is_none());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = SessionConfig::from_json(
            r#"{"engine_command": "stockfish", "skill_level": 18, "human_side": "black", "engine_timeout_ms": null}"#,
        )
        .expect("config should decode");
        assert_eq!(config.engine_command.as_deref(), Some("stockfish"));
        assert_eq!(config.skill_level, SkillLevel::HARD);
        assert_eq!(config.human_side, HumanSide::Black);
        assert_eq!(config.engine_timeout(), None);
        assert_eq!(config.think_delay_ms, 500);
    }

    #[test]
    fn human_side_parses_from_flags() {
        assert_eq!("Black".parse::<HumanSide>().expect("side should parse"), HumanSide::Black);
        assert_eq!("w".parse::<HumanSide>().expect("side should parse"), HumanSide::White);
        assert!("red".parse::<HumanSide>().is_err());
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = SessionConfig::from_json(r#"{"skill_level": "very"}"#).expect_err("should fail");
        assert!(matches!(err, ControllerError::Config(_)));
    }
}
