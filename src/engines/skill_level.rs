//! Engine strength as a search depth.
//!
//! Depth 0 is the random tier and never reaches the search process.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ControllerError;

pub const MAX_SEARCH_DEPTH: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SkillLevel(u8);

impl SkillLevel {
    pub const RANDOM: SkillLevel = SkillLevel(0);
    pub const EASY: SkillLevel = SkillLevel(2);
    pub const MEDIUM: SkillLevel = SkillLevel(8);
    pub const HARD: SkillLevel = SkillLevel(18);

    pub const TIERS: [(&'static str, SkillLevel); 4] = [
        ("random", SkillLevel::RANDOM),
        ("easy", SkillLevel::EASY),
        ("medium", SkillLevel::MEDIUM),
        ("hard", SkillLevel::HARD),
    ];

    pub fn from_depth(depth: u8) -> Result<Self, ControllerError> {
        if depth > MAX_SEARCH_DEPTH {
            return Err(ControllerError::Parse(format!(
                "skill level {depth} is above the maximum depth {MAX_SEARCH_DEPTH}"
            )));
        }
        Ok(SkillLevel(depth))
    }

    #[inline]
    pub fn depth(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_random(self) -> bool {
        self.0 == 0
    }

    /// Tier name when the depth matches one exactly.
    pub fn label(self) -> Option<&'static str> {
        Self::TIERS
            .iter()
            .find(|(_, level)| *level == self)
            .map(|(name, _)| *name)
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel::EASY
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(name) => write!(f, "{name} (depth {})", self.0),
            None => write!(f, "depth {}", self.0),
        }
    }
}

impl FromStr for SkillLevel {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((_, level)) = Self::TIERS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
        {
            return Ok(*level);
        }
        let depth = trimmed
            .parse::<u8>()
            .map_err(|_| ControllerError::Parse(format!("unknown skill level '{trimmed}'")))?;
        SkillLevel::from_depth(depth)
    }
}

impl TryFrom<u8> for SkillLevel {
    type Error = ControllerError;

    fn try_from(depth: u8) -> Result<Self, Self::Error> {
        SkillLevel::from_depth(depth)
    }
}

impl From<SkillLevel> for u8 {
    fn from(level: SkillLevel) -> Self {
        level.0
    }
}
