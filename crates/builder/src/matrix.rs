//! Build matrix of a package.
//!
//! Rows are every (compiler compatibility class, platform) pair, newest
//! compiler first; columns are the latest version of each [`VersionKind`]
//! the package has. A cell holds the outcome of the most recent build of
//! its column's version for its row, if there is one.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgindex_db::BuildStore;
use pkgindex_models::{Build, BuildStatus, CompilerVersion, Id, Platform, Version, VersionKind};
use std::cmp::Reverse;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowIndex {
    pub compiler_version: CompilerVersion,
    pub platform: Platform,
}
impl RowIndex {
    /// Every row, by compiler version descending then platform ascending.
    pub fn all() -> Vec<RowIndex> {
        let mut rows: Vec<RowIndex> = CompilerVersion::SUPPORTED
            .into_iter()
            .flat_map(|compiler_version| {
                Platform::ALL.into_iter().map(move |platform| RowIndex {
                    compiler_version,
                    platform,
                })
            })
            .collect();
        rows.sort_by_key(|row| (Reverse(row.compiler_version), row.platform));
        rows
    }

    /// The row a build belongs in; `None` for unsupported compilers.
    pub fn of(build: &Build) -> Option<RowIndex> {
        Some(RowIndex {
            compiler_version: build.compiler_version.compatibility()?,
            platform: build.platform,
        })
    }
}

/// A version and its builds, one column of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildGroup {
    pub name: String,
    pub kind: VersionKind,
    pub builds: Vec<Build>,
}
impl BuildGroup {
    pub fn new(version: &Version, builds: Vec<Build>) -> Self {
        Self {
            name: version.reference.to_string(),
            kind: version.kind,
            builds,
        }
    }

    /// Latest version of each kind with its builds, in column order.
    pub async fn load(store: &BuildStore, package_id: Id) -> Result<Vec<BuildGroup>> {
        let versions = store.latest_versions_with_builds(package_id).await.or_raise(|| ErrorKind::Database)?;
        Ok(versions.into_iter().map(|(version, builds)| BuildGroup::new(&version, builds)).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    pub kind: VersionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub build_id: Id,
    pub status: BuildStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: RowIndex,
    /// One entry per [`BuildMatrix::columns`] entry.
    pub cells: Vec<Option<Cell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMatrix {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl BuildMatrix {
    pub fn new(groups: &[BuildGroup]) -> Self {
        let columns = groups
            .iter()
            .map(|group| Column {
                label: group.name.clone(),
                kind: group.kind,
            })
            .collect();
        let latest: Vec<HashMap<RowIndex, &Build>> = groups.iter().map(|group| latest_builds(&group.builds)).collect();
        let rows = RowIndex::all()
            .into_iter()
            .map(|index| Row {
                index,
                cells: latest
                    .iter()
                    .map(|column| {
                        column.get(&index).map(|build| Cell {
                            build_id: build.id,
                            status: build.status,
                        })
                    })
                    .collect(),
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cell(&self, index: RowIndex, kind: VersionKind) -> Option<Cell> {
        let column = self.columns.iter().position(|c| c.kind == kind)?;
        let row = self.rows.iter().find(|r| r.index == index)?;
        row.cells[column]
    }

    /// Rows of the compatibility class of `compiler_version`, by platform.
    pub fn rows_for(&self, compiler_version: CompilerVersion) -> Vec<&Row> {
        let mut rows: Vec<&Row> =
            self.rows.iter().filter(|r| r.index.compiler_version.is_compatible(&compiler_version)).collect();
        rows.sort_by_key(|r| r.index.platform);
        rows
    }
}

/// Most recent build per row. Ties keep the earlier build in the list.
fn latest_builds(builds: &[Build]) -> HashMap<RowIndex, &Build> {
    let mut latest: HashMap<RowIndex, &Build> = HashMap::new();
    for build in builds {
        let Some(index) = RowIndex::of(build) else {
            continue;
        };
        if latest.get(&index).is_none_or(|current| build.created_at > current.created_at) {
            latest.insert(index, build);
        }
    }
    latest
}

/// Builds with a terminal status, across all groups.
pub fn completed_build_count(groups: &[BuildGroup]) -> usize {
    groups.iter().flat_map(|g| &g.builds).filter(|b| b.status.is_completed()).count()
}
