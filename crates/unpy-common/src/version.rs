//! Target Python versions and version intervals.
//!
//! `PythonVersion` is the closed set of targets the backporter can lower to.
//! `Version` is an open `major.minor` pair used by the lookup tables, where
//! `4.0` means "not available in any 3.x release".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `major.minor` version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// Sentinel for "never available natively".
    pub const NEVER: Version = Version::new(4, 0);

    pub const fn new(major: u8, minor: u8) -> Version {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The minimum Python version a stub is lowered for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PythonVersion {
    #[default]
    #[serde(rename = "3.10")]
    Py310,
    #[serde(rename = "3.11")]
    Py311,
    #[serde(rename = "3.12")]
    Py312,
    #[serde(rename = "3.13")]
    Py313,
    #[serde(rename = "3.14")]
    Py314,
}

impl PythonVersion {
    pub const ALL: [PythonVersion; 5] = [
        PythonVersion::Py310,
        PythonVersion::Py311,
        PythonVersion::Py312,
        PythonVersion::Py313,
        PythonVersion::Py314,
    ];

    pub const fn version(self) -> Version {
        match self {
            PythonVersion::Py310 => Version::new(3, 10),
            PythonVersion::Py311 => Version::new(3, 11),
            PythonVersion::Py312 => Version::new(3, 12),
            PythonVersion::Py313 => Version::new(3, 13),
            PythonVersion::Py314 => Version::new(3, 14),
        }
    }

    /// The target for a `3.x` table version, `None` outside 3.10..=3.14.
    pub fn from_version(version: Version) -> Option<PythonVersion> {
        PythonVersion::ALL
            .into_iter()
            .find(|target| target.version() == version)
    }

    /// Whether `version` is available at this target.
    pub fn supports(self, version: Version) -> bool {
        self.version() >= version
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PythonVersion::Py310 => "3.10",
            PythonVersion::Py311 => "3.11",
            PythonVersion::Py312 => "3.12",
            PythonVersion::Py313 => "3.13",
            PythonVersion::Py314 => "3.14",
        }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported target version '{0}' (expected one of 3.10, 3.11, 3.12, 3.13, 3.14)")]
pub struct ParseVersionError(String);

impl FromStr for PythonVersion {
    type Err = ParseVersionError;

    /// Accepts `3.12`, `312` and `py312`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("py")
            .or_else(|| trimmed.strip_prefix("PY"))
            .unwrap_or(trimmed)
            .replace('.', "");
        match digits.as_str() {
            "310" => Ok(PythonVersion::Py310),
            "311" => Ok(PythonVersion::Py311),
            "312" => Ok(PythonVersion::Py312),
            "313" => Ok(PythonVersion::Py313),
            "314" => Ok(PythonVersion::Py314),
            _ => Err(ParseVersionError(s.to_string())),
        }
    }
}

/// A half-open interval `[start, end)` of versions. `end == None` is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VersionInterval {
    pub start: Version,
    pub end: Option<Version>,
}

impl VersionInterval {
    pub const fn since(start: Version) -> VersionInterval {
        VersionInterval { start, end: None }
    }

    pub const fn between(start: Version, end: Version) -> VersionInterval {
        VersionInterval {
            start,
            end: Some(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.end, Some(end) if end <= self.start)
    }

    pub fn contains(&self, version: Version) -> bool {
        version >= self.start && self.end.is_none_or(|end| version < end)
    }

    pub fn intersect(&self, other: &VersionInterval) -> Option<VersionInterval> {
        let start = self.start.max(other.start);
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let interval = VersionInterval { start, end };
        (!interval.is_empty()).then_some(interval)
    }

    /// Merge overlapping or touching intervals into a sorted, disjoint list.
    pub fn normalize(intervals: &[VersionInterval]) -> Vec<VersionInterval> {
        let mut sorted: Vec<VersionInterval> =
            intervals.iter().copied().filter(|iv| !iv.is_empty()).collect();
        sorted.sort_by_key(|iv| iv.start);

        let mut merged: Vec<VersionInterval> = Vec::with_capacity(sorted.len());
        for interval in sorted {
            if let Some(last) = merged.last_mut() {
                let touches = last.end.is_none_or(|end| interval.start <= end);
                if touches {
                    last.end = match (last.end, interval.end) {
                        (Some(a), Some(b)) => Some(a.max(b)),
                        _ => None,
                    };
                    continue;
                }
            }
            merged.push(interval);
        }
        merged
    }
}

impl fmt::Display for VersionInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, ...)", self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_version() {
        assert_eq!("3.11".parse::<PythonVersion>(), Ok(PythonVersion::Py311));
        assert_eq!("py313".parse::<PythonVersion>(), Ok(PythonVersion::Py313));
        assert_eq!("310".parse::<PythonVersion>(), Ok(PythonVersion::Py310));
        assert!("3.9".parse::<PythonVersion>().is_err());
        assert!("4.0".parse::<PythonVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(PythonVersion::Py310 < PythonVersion::Py312);
        assert!(PythonVersion::Py312.supports(Version::new(3, 12)));
        assert!(!PythonVersion::Py311.supports(Version::new(3, 12)));
        assert!(!PythonVersion::Py314.supports(Version::NEVER));
        assert_eq!(PythonVersion::default(), PythonVersion::Py310);
        assert_eq!(PythonVersion::Py314.to_string(), "3.14");
        assert_eq!(
            PythonVersion::from_version(Version::new(3, 12)),
            Some(PythonVersion::Py312)
        );
        assert_eq!(PythonVersion::from_version(Version::NEVER), None);
    }

    #[test]
    fn test_interval_contains() {
        let iv = VersionInterval::between(Version::new(3, 10), Version::new(3, 12));
        assert!(iv.contains(Version::new(3, 10)));
        assert!(iv.contains(Version::new(3, 11)));
        assert!(!iv.contains(Version::new(3, 12)));
        assert!(VersionInterval::since(Version::new(3, 13)).contains(Version::new(3, 14)));
    }

    #[test]
    fn test_interval_intersect() {
        let a = VersionInterval::between(Version::new(3, 10), Version::new(3, 13));
        let b = VersionInterval::since(Version::new(3, 12));
        assert_eq!(
            a.intersect(&b),
            Some(VersionInterval::between(
                Version::new(3, 12),
                Version::new(3, 13)
            ))
        );
        let c = VersionInterval::since(Version::new(3, 13));
        assert_eq!(a.intersect(&c), None);
    }

    #[test]
    fn test_interval_normalize() {
        let merged = VersionInterval::normalize(&[
            VersionInterval::between(Version::new(3, 12), Version::new(3, 13)),
            VersionInterval::between(Version::new(3, 10), Version::new(3, 12)),
            VersionInterval::between(Version::new(3, 14), Version::new(3, 14)),
        ]);
        assert_eq!(
            merged,
            vec![VersionInterval::between(
                Version::new(3, 10),
                Version::new(3, 13)
            )]
        );
        assert_eq!(
            VersionInterval::since(Version::new(3, 11)).to_string(),
            "[3.11, ...)"
        );
    }
}
