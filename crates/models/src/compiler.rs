use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Which trailing zero components to omit when rendering a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroppingZeroes {
    None,
    Patch,
    All,
}

/// A compiler toolchain version, `major.minor.patch`.
///
/// Builds are grouped by compatibility class (`major.minor`), see
/// [`CompilerVersion::compatibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}
impl CompilerVersion {
    pub const V5_8: Self = Self::new(5, 8, 0);
    pub const V5_9: Self = Self::new(5, 9, 0);
    pub const V5_10: Self = Self::new(5, 10, 0);
    pub const V6_0: Self = Self::new(6, 0, 0);
    pub const V6_1: Self = Self::new(6, 1, 0);

    /// Compatibility classes currently built for, oldest first.
    pub const SUPPORTED: [Self; 5] = [Self::V5_8, Self::V5_9, Self::V5_10, Self::V6_0, Self::V6_1];

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Two versions are compatible when they share `major.minor`.
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor
    }

    /// The supported compatibility class this version belongs to, if any.
    pub fn compatibility(&self) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|v| v.is_compatible(self))
    }

    pub fn description(&self, dropping: DroppingZeroes) -> String {
        match dropping {
            DroppingZeroes::None => format!("{}.{}.{}", self.major, self.minor, self.patch),
            DroppingZeroes::Patch if self.patch == 0 => format!("{}.{}", self.major, self.minor),
            DroppingZeroes::All if self.patch == 0 && self.minor == 0 => self.major.to_string(),
            DroppingZeroes::All if self.patch == 0 => format!("{}.{}", self.major, self.minor),
            _ => format!("{}.{}.{}", self.major, self.minor, self.patch),
        }
    }

    /// `major.minor`, as passed to build jobs.
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}
impl FromStr for CompilerVersion {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            exn::Exn::from(ErrorKind::ParseError {
                field: "compiler version",
                value: s.to_string(),
            })
        };
        let mut parts = s.trim().split('.').map(|p| p.parse::<u32>().map_err(|_| invalid()));
        let major = parts.next().ok_or_else(invalid)??;
        let minor = parts.next().transpose()?.unwrap_or(0);
        let patch = parts.next().transpose()?.unwrap_or(0);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(major, minor, patch))
    }
}
impl Display for CompilerVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.description(DroppingZeroes::None))
    }
}
