//! Model version triples.
//!
//! A `ModelVersion` names the shape of the management model a client or
//! server speaks. Comparison is lexicographic over (major, minor, micro),
//! which the derived `Ord` gives us from field order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A (major, minor, micro) management model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelVersion {
    pub major: u16,
    pub minor: u16,
    pub micro: u16,
}

impl ModelVersion {
    /// Create a new model version.
    pub const fn new(major: u16, minor: u16, micro: u16) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

impl FromStr for ModelVersion {
    type Err = Error;

    /// Parse `"major.minor.micro"`; a missing micro defaults to 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVersion(s.to_string());

        let mut parts = s.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let micro = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor, micro))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(ModelVersion::new(1, 0, 0) < ModelVersion::new(1, 0, 1));
        assert!(ModelVersion::new(1, 9, 9) < ModelVersion::new(2, 0, 0));
        assert!(ModelVersion::new(2, 1, 0) > ModelVersion::new(2, 0, 9));
        assert_eq!(ModelVersion::new(1, 2, 3), ModelVersion::new(1, 2, 3));
    }

    #[test]
    fn test_parse_and_display() {
        let v: ModelVersion = "2.1.3".parse().unwrap();
        assert_eq!(v, ModelVersion::new(2, 1, 3));
        assert_eq!(v.to_string(), "2.1.3");

        let short: ModelVersion = "1.0".parse().unwrap();
        assert_eq!(short, ModelVersion::new(1, 0, 0));

        assert!("".parse::<ModelVersion>().is_err());
        assert!("1".parse::<ModelVersion>().is_err());
        assert!("1.0.0.0".parse::<ModelVersion>().is_err());
        assert!("1.x".parse::<ModelVersion>().is_err());
        assert!("-1.0.0".parse::<ModelVersion>().is_err());
    }
}
