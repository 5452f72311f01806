use crate::error::{Error, ErrorKind};
use crate::models::{from_json, parse_id, parse_timestamp, to_json};
use exn::ResultExt;
use pkgindex_models::{Version, VersionKind};

#[derive(sqlx::FromRow)]
pub(crate) struct VersionRow {
    pub(crate) id: String,
    pub(crate) package_id: String,
    pub(crate) reference: String,
    pub(crate) kind: String,
    pub(crate) doc_archives: String,
    pub(crate) created_at: i64,
}
impl TryFrom<&Version> for VersionRow {
    type Error = Error;
    fn try_from(version: &Version) -> Result<Self, Self::Error> {
        Ok(Self {
            id: version.id.to_string(),
            package_id: version.package_id.to_string(),
            reference: to_json(&version.reference, "reference")?,
            kind: version.kind.to_string(),
            doc_archives: to_json(&version.doc_archives, "doc archives")?,
            created_at: version.created_at.unix_timestamp(),
        })
    }
}
impl TryFrom<VersionRow> for Version {
    type Error = Error;
    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id, "version id")?,
            package_id: parse_id(&row.package_id, "package id")?,
            reference: from_json(&row.reference, "reference")?,
            kind: row.kind.parse::<VersionKind>().or_raise(|| ErrorKind::InvalidData("version kind"))?,
            doc_archives: from_json(&row.doc_archives, "doc archives")?,
            created_at: parse_timestamp(row.created_at, "version creation date")?,
        })
    }
}
