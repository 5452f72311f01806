use crate::error::{Error, ErrorKind};
use crate::models::{parse_id, parse_timestamp};
use exn::ResultExt;
use pkgindex_models::{Package, Stage, Status};

#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    pub(crate) id: String,
    pub(crate) url: String,
    pub(crate) status: String,
    pub(crate) processing_stage: String,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}
impl From<&Package> for PackageRow {
    fn from(package: &Package) -> Self {
        Self {
            id: package.id.to_string(),
            url: package.url.clone(),
            status: package.status.to_string(),
            processing_stage: package.stage.to_string(),
            created_at: package.created_at.unix_timestamp(),
            updated_at: package.updated_at.unix_timestamp(),
        }
    }
}
impl TryFrom<PackageRow> for Package {
    type Error = Error;
    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id, "package id")?,
            url: row.url,
            status: row.status.parse::<Status>().or_raise(|| ErrorKind::InvalidData("package status"))?,
            stage: row
                .processing_stage
                .parse::<Stage>()
                .or_raise(|| ErrorKind::InvalidData("processing stage"))?,
            created_at: parse_timestamp(row.created_at, "package creation date")?,
            updated_at: parse_timestamp(row.updated_at, "package update date")?,
        })
    }
}
