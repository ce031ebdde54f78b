use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record.
///
/// Lower ordinal means more severe. `First` and `Last` bracket the real
/// levels and are only used for range checks; a record carrying either
/// of them is never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    First = 0,
    Critical = 1,
    Error = 2,
    Warn = 3,
    Info = 4,
    Debug = 5,
    Last = 6,
}

impl Level {
    /// Real levels, most severe first.
    pub const ALL: [Level; 5] = [
        Level::Critical,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    /// `true` for every level strictly between the two sentinels.
    pub fn is_valid(self) -> bool {
        self > Level::First && self < Level::Last
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::First => "first",
            Level::Critical => "critical",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Last => "last",
        }
    }

    /// Severity name as understood by Cloud Logging.
    pub fn severity(self) -> &'static str {
        match self {
            Level::Critical => "CRITICAL",
            Level::Error => "ERROR",
            Level::Warn => "WARNING",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::First | Level::Last => "DEFAULT",
        }
    }
}

/// Decide whether a record at `level` passes a `threshold`.
///
/// Sentinel or out-of-range levels never pass, whatever the threshold.
pub fn should_emit(level: Level, threshold: Level) -> bool {
    level.is_valid() && level <= threshold
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name or ordinal is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl TryFrom<u8> for Level {
    type Error = ParseLevelError;

    fn try_from(value: u8) -> Result<Self, ParseLevelError> {
        match value {
            0 => Ok(Level::First),
            1 => Ok(Level::Critical),
            2 => Ok(Level::Error),
            3 => Ok(Level::Warn),
            4 => Ok(Level::Info),
            5 => Ok(Level::Debug),
            6 => Ok(Level::Last),
            other => Err(ParseLevelError(other.to_string())),
        }
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u8>() {
            return Level::try_from(n);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "critical" | "fatal" => Ok(Level::Critical),
            "error" => Ok(Level::Error),
            "warn" | "warning" => Ok(Level::Warn),
            "info" => Ok(Level::Info),
            "debug" => Ok(Level::Debug),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Ordinal(u8),
    Name(String),
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Ordinal(n) => Level::try_from(n).map_err(serde::de::Error::custom),
            LevelRepr::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_at_or_above_threshold_severity() {
        for threshold in Level::ALL {
            for level in Level::ALL {
                assert_eq!(
                    should_emit(level, threshold),
                    level <= threshold,
                    "level={level} threshold={threshold}"
                );
            }
        }
    }

    #[test]
    fn sentinels_never_emit() {
        for threshold in [Level::First, Level::Debug, Level::Last] {
            assert!(!should_emit(Level::First, threshold));
            assert!(!should_emit(Level::Last, threshold));
        }
    }

    #[test]
    fn parses_names_and_ordinals() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!("2".parse::<Level>().unwrap(), Level::Error);
        assert!("verbose".parse::<Level>().is_err());
        assert!(Level::try_from(7).is_err());
    }

    #[test]
    fn ordinals_map_onto_every_level() {
        for level in Level::ALL {
            assert_eq!(Level::try_from(level as u8), Ok(level));
        }
        assert_eq!(
            Level::try_from(200),
            Err(ParseLevelError("200".to_string()))
        );
    }

    #[test]
    fn deserializes_from_either_form() {
        let by_name: Level = serde_json::from_str("\"debug\"").unwrap();
        let by_ordinal: Level = serde_json::from_str("1").unwrap();
        assert_eq!(by_name, Level::Debug);
        assert_eq!(by_ordinal, Level::Critical);
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
    }
}
