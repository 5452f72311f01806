use crate::error::{Error, ErrorKind};
use crate::{CompilerVersion, Id};
use exn::OptionExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use time::UtcDateTime;

/// Target platform (and build tool, where a platform has several) of a build.
///
/// Declaration order is the display order within a build matrix row group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Ios,
    MacosSpm,
    MacosXcodebuild,
    VisionOs,
    TvOs,
    WatchOs,
    Linux,
}
impl Platform {
    pub const ALL: [Platform; 7] = [
        Self::Ios,
        Self::MacosSpm,
        Self::MacosXcodebuild,
        Self::VisionOs,
        Self::TvOs,
        Self::WatchOs,
        Self::Linux,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::MacosSpm => "macos-spm",
            Self::MacosXcodebuild => "macos-xcodebuild",
            Self::VisionOs => "visionos",
            Self::TvOs => "tvos",
            Self::WatchOs => "watchos",
            Self::Linux => "linux",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ios => "iOS",
            Self::MacosSpm => "macOS (SPM)",
            Self::MacosXcodebuild => "macOS (Xcode)",
            Self::VisionOs => "visionOS",
            Self::TvOs => "tvOS",
            Self::WatchOs => "watchOS",
            Self::Linux => "Linux",
        }
    }
}
impl FromStr for Platform {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|p| p.as_str() == s).ok_or_raise(|| ErrorKind::ParseError {
            field: "platform",
            value: s.to_string(),
        })
    }
}
impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Outcome of a build job.
///
/// `Triggered` is the only non-terminal status; transitions are one-way from
/// `Triggered` to any of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStatus {
    Triggered,
    Ok,
    Failed,
    Timeout,
    InfrastructureError,
}
impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::InfrastructureError => "infrastructureError",
        }
    }

    /// Terminal statuses count as completed builds.
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Triggered)
    }

    /// Whether a build currently in `self` may move to `next`.
    pub fn can_transition_to(&self, next: BuildStatus) -> bool {
        matches!(self, Self::Triggered) && next.is_completed()
    }
}
impl FromStr for BuildStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "triggered" => Self::Triggered,
            "ok" => Self::Ok,
            "failed" => Self::Failed,
            "timeout" => Self::Timeout,
            "infrastructureError" => Self::InfrastructureError,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "build status",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for BuildStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One cell of the compatibility matrix for a [`Version`](crate::Version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Build {
    pub id: Id,
    pub version_id: Id,
    pub platform: Platform,
    pub compiler_version: CompilerVersion,
    pub status: BuildStatus,
    /// Web URL of the build job, when the build farm acknowledged one.
    pub job_url: Option<String>,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}
impl Build {
    pub fn triggered(version_id: Id, platform: Platform, compiler_version: CompilerVersion) -> Self {
        let now = UtcDateTime::now();
        Self {
            id: Id::new_v4(),
            version_id,
            platform,
            compiler_version,
            status: BuildStatus::Triggered,
            job_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}
