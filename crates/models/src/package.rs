use crate::Id;
use crate::error::{Error, ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use time::UtcDateTime;

/// Coarse pipeline phase a package currently occupies.
///
/// Ordered by progression through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Reconciliation,
    Ingestion,
    Analysis,
}
impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reconciliation => "reconciliation",
            Self::Ingestion => "ingestion",
            Self::Analysis => "analysis",
        }
    }

    /// The stage a package must have completed to become a candidate for
    /// this stage. Reconciliation is where packages are born, so it has none.
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Self::Reconciliation => None,
            Self::Ingestion => Some(Self::Reconciliation),
            Self::Analysis => Some(Self::Ingestion),
        }
    }
}
impl FromStr for Stage {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "reconciliation" => Self::Reconciliation,
            "ingestion" => Self::Ingestion,
            "analysis" => Self::Analysis,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "processing stage",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Outcome of the most recent stage transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Freshly discovered or freshly (re-)ingested; fast-tracked by analysis.
    New,
    Ok,
    NotFound,
    InvalidUrl,
    NoValidVersions,
    IngestionFailed,
    AnalysisFailed,
}
impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Ok => "ok",
            Self::NotFound => "notFound",
            Self::InvalidUrl => "invalidUrl",
            Self::NoValidVersions => "noValidVersions",
            Self::IngestionFailed => "ingestionFailed",
            Self::AnalysisFailed => "analysisFailed",
        }
    }

    /// Status to record after a successful ingestion pass.
    ///
    /// Packages already in a settled success state keep it, everything else
    /// becomes [`Status::New`] so the analysis stage picks it up promptly.
    pub fn after_successful_ingestion(self) -> Status {
        match self {
            Self::Ok => Self::Ok,
            _ => Self::New,
        }
    }
}
impl FromStr for Status {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "new" => Self::New,
            "ok" => Self::Ok,
            "notFound" => Self::NotFound,
            "invalidUrl" => Self::InvalidUrl,
            "noValidVersions" => Self::NoValidVersions,
            "ingestionFailed" => Self::IngestionFailed,
            "analysisFailed" => Self::AnalysisFailed,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "status",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A tracked source package, identified by its hosted repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub id: Id,
    pub url: String,
    pub status: Status,
    pub stage: Stage,
    pub created_at: UtcDateTime,
    pub updated_at: UtcDateTime,
}
impl Package {
    /// A newly reconciled package, not yet persisted.
    pub fn new(url: impl Into<String>) -> Self {
        let now = UtcDateTime::now();
        Self {
            id: Id::new_v4(),
            url: url.into(),
            status: Status::New,
            stage: Stage::Reconciliation,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    /// See [`normalize_url`](crate::normalize_url).
    pub fn normalized_url(&self) -> String {
        crate::normalize_url(&self.url)
    }

    /// See [`owner_repository`](crate::owner_repository).
    pub fn owner_repository(&self) -> Result<(String, String)> {
        crate::owner_repository(&self.url)
    }
}
