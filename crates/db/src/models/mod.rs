mod build;
mod package;
mod repository;
mod version;

pub(crate) use self::build::BuildRow;
pub(crate) use self::package::PackageRow;
pub(crate) use self::repository::RepositoryRow;
pub(crate) use self::version::VersionRow;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgindex_models::Id;
use serde::Serialize;
use serde::de::DeserializeOwned;
use time::UtcDateTime;

pub(crate) fn parse_id(value: &str, field: &'static str) -> Result<Id> {
    Id::parse_str(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn parse_timestamp(value: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn to_json<T: Serialize>(value: &T, field: &'static str) -> Result<String> {
    serde_json::to_string(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn from_json<T: DeserializeOwned>(value: &str, field: &'static str) -> Result<T> {
    serde_json::from_str(value).or_raise(|| ErrorKind::InvalidData(field))
}
