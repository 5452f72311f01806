use crate::Id;
use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use time::UtcDateTime;

/// A named reference into a package's source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum Reference {
    Tag(String),
    Branch(String),
}
impl Reference {
    pub fn name(&self) -> &str {
        match self {
            Self::Tag(name) | Self::Branch(name) => name,
        }
    }
}
impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionKind {
    Release,
    PreRelease,
    DefaultBranch,
}
impl VersionKind {
    /// Column order of the build matrix.
    pub const ALL: [VersionKind; 3] = [Self::Release, Self::PreRelease, Self::DefaultBranch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::PreRelease => "preRelease",
            Self::DefaultBranch => "defaultBranch",
        }
    }
}
impl FromStr for VersionKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "release" => Self::Release,
            "preRelease" => Self::PreRelease,
            "defaultBranch" => Self::DefaultBranch,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "version kind",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for VersionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A named documentation bundle produced by a documentation build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocArchive {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub id: Id,
    pub package_id: Id,
    pub reference: Reference,
    pub kind: VersionKind,
    pub doc_archives: Vec<DocArchive>,
    pub created_at: UtcDateTime,
}
impl Version {
    pub fn new(package_id: Id, reference: Reference, kind: VersionKind) -> Self {
        Self {
            id: Id::new_v4(),
            package_id,
            reference,
            kind,
            doc_archives: Vec::new(),
            created_at: UtcDateTime::now(),
        }
    }
}
