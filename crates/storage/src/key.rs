//! Object keys and the readme cache key scheme.

use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A validated object key, relative to the root of the store.
///
/// Keys are `/`-separated segments; empty, `.` and `..` segments and null
/// bytes are rejected so that a key can never address anything outside the
/// owning repository's prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let valid = !key.is_empty()
            && !key.contains('\0')
            && key.split('/').all(|segment| !matches!(segment, "" | "." | ".."));
        match valid {
            true => Ok(Self(key)),
            false => exn::bail!(ErrorKind::InvalidKey(key)),
        }
    }

    /// `{owner}/{repo}/readme.html`, lower-cased.
    pub fn readme(owner: &str, repo: &str) -> Result<Self> {
        Self::new(format!("{owner}/{repo}/readme.html").to_lowercase())
    }

    /// A cached image referenced by the readme of `{owner}/{repo}`.
    ///
    /// Owner and repository are lower-cased; the file name keeps its case.
    pub fn readme_image(owner: &str, repo: &str, file_name: &str) -> Result<Self> {
        Self::new(format!("{}/{}/{file_name}", owner.to_lowercase(), repo.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
