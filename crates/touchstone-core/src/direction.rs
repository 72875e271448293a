//! Movement direction bitmask.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Direction of a movement, or a mask of allowed directions.
    ///
    /// `NONE` is a real bit so that "no movement" can be distinguished from
    /// an empty mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        /// No dominant direction
        const NONE = 1;
        /// Towards negative x
        const LEFT = 2;
        /// Towards positive x
        const RIGHT = 4;
        /// Towards negative y
        const UP = 8;
        /// Towards positive y
        const DOWN = 16;
        /// Left or right
        const HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        /// Up or down
        const VERTICAL = Self::UP.bits() | Self::DOWN.bits();
        /// Any direction
        const ALL = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

impl Direction {
    /// Dominant direction of a displacement.
    ///
    /// Equal components yield `NONE`; ties between the axes favour the
    /// horizontal one.
    #[must_use]
    pub fn between(dx: f32, dy: f32) -> Self {
        if dx == dy {
            return Self::NONE;
        }
        if dx.abs() >= dy.abs() {
            if dx < 0.0 {
                Self::LEFT
            } else {
                Self::RIGHT
            }
        } else if dy < 0.0 {
            Self::UP
        } else {
            Self::DOWN
        }
    }

    /// Event name suffix for a single direction, empty otherwise.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        if self == Self::LEFT {
            "left"
        } else if self == Self::RIGHT {
            "right"
        } else if self == Self::UP {
            "up"
        } else if self == Self::DOWN {
            "down"
        } else {
            ""
        }
    }

    fn parse_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::NONE),
            "left" => Some(Self::LEFT),
            "right" => Some(Self::RIGHT),
            "up" => Some(Self::UP),
            "down" => Some(Self::DOWN),
            "horizontal" => Some(Self::HORIZONTAL),
            "vertical" => Some(Self::VERTICAL),
            "all" => Some(Self::ALL),
            _ => None,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::NONE
    }
}

/// Error parsing a direction string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDirectionError {
    /// Input was empty
    #[error("empty direction")]
    Empty,
    /// A `|`-separated component was not a known direction name
    #[error("unknown direction '{0}' (expected none, left, right, up, down, horizontal, vertical or all)")]
    Unknown(String),
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseDirectionError::Empty);
        }
        s.split('|').try_fold(Self::empty(), |acc, part| {
            let part = part.trim().to_ascii_lowercase();
            Self::parse_name(&part)
                .map(|d| acc | d)
                .ok_or(ParseDirectionError::Unknown(part))
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("all");
        }
        let mut parts = Vec::new();
        let mut rest = *self;
        for (name, dir) in [("horizontal", Self::HORIZONTAL), ("vertical", Self::VERTICAL)] {
            if rest.contains(dir) {
                parts.push(name);
                rest.remove(dir);
            }
        }
        for (name, dir) in [
            ("none", Self::NONE),
            ("left", Self::LEFT),
            ("right", Self::RIGHT),
            ("up", Self::UP),
            ("down", Self::DOWN),
        ] {
            if rest.contains(dir) {
                parts.push(name);
            }
        }
        f.write_str(&parts.join("|"))
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_between_equal_is_none() {
        assert_eq!(Direction::between(0.0, 0.0), Direction::NONE);
        assert_eq!(Direction::between(5.0, 5.0), Direction::NONE);
    }

    #[test]
    fn test_between_horizontal_wins_ties() {
        assert_eq!(Direction::between(-5.0, 5.0), Direction::LEFT);
        assert_eq!(Direction::between(5.0, -5.0), Direction::RIGHT);
    }

    #[test]
    fn test_between_vertical() {
        assert_eq!(Direction::between(1.0, -8.0), Direction::UP);
        assert_eq!(Direction::between(1.0, 8.0), Direction::DOWN);
    }

    #[test]
    fn test_suffix() {
        assert_eq!(Direction::LEFT.suffix(), "left");
        assert_eq!(Direction::DOWN.suffix(), "down");
        assert_eq!(Direction::NONE.suffix(), "");
        assert_eq!(Direction::HORIZONTAL.suffix(), "");
    }

    #[test]
    fn test_composite_values() {
        assert_eq!(Direction::HORIZONTAL.bits(), 6);
        assert_eq!(Direction::VERTICAL.bits(), 24);
        assert_eq!(Direction::ALL.bits(), 30);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("horizontal".parse::<Direction>(), Ok(Direction::HORIZONTAL));
        assert_eq!("Left | up".parse::<Direction>(), Ok(Direction::LEFT | Direction::UP));
        assert_eq!("all".parse::<Direction>(), Ok(Direction::ALL));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Direction>(), Err(ParseDirectionError::Empty));
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(ParseDirectionError::Unknown("sideways".into()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Direction::ALL.to_string(), "all");
        assert_eq!(Direction::HORIZONTAL.to_string(), "horizontal");
        assert_eq!((Direction::LEFT | Direction::UP).to_string(), "left|up");
        assert_eq!((Direction::VERTICAL | Direction::LEFT).to_string(), "vertical|left");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Direction::VERTICAL).unwrap();
        assert_eq!(json, "\"vertical\"");
        let back: Direction = serde_json::from_str("\"left|right\"").unwrap();
        assert_eq!(back, Direction::HORIZONTAL);
        assert!(serde_json::from_str::<Direction>("\"nowhere\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_between_is_single_bit(dx in -500.0f32..500.0, dy in -500.0f32..500.0) {
            let d = Direction::between(dx, dy);
            prop_assert_eq!(d.bits().count_ones(), 1);
        }

        #[test]
        fn prop_display_parse_roundtrip(bits in 1u8..32) {
            let d = Direction::from_bits_truncate(bits);
            prop_assume!(!d.is_empty());
            prop_assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
        }
    }
}
