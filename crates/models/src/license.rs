use exn::OptionExt;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How a license affects redistribution through app stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    CompatibleWithAppStore,
    IncompatibleWithAppStore,
    NoneOrUnknown,
}

/// Licenses recognised by their hosting-service keys.
///
/// Unrecognised keys map to [`License::Other`]; a repository without a
/// license is [`License::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum License {
    Afl3_0,
    Apache2_0,
    Artistic2_0,
    Bsd2Clause,
    Bsd3Clause,
    Bsd3ClauseClear,
    Bsl1_0,
    Cc,
    Cc0_1_0,
    CcBy4_0,
    CcBySa4_0,
    Wtfpl,
    Ecl2_0,
    Epl1_0,
    Eupl1_1,
    Agpl3_0,
    Gpl,
    Gpl2_0,
    Gpl3_0,
    Lgpl,
    Lgpl2_1,
    Lgpl3_0,
    Isc,
    Lppl1_3c,
    MsPl,
    Mit,
    Mpl2_0,
    Osl3_0,
    PostgreSql,
    Ofl1_1,
    Ncsa,
    Unlicense,
    Zlib,
    Other,
    None,
}
impl License {
    const ALL: [License; 33] = [
        Self::Afl3_0,
        Self::Apache2_0,
        Self::Artistic2_0,
        Self::Bsd2Clause,
        Self::Bsd3Clause,
        Self::Bsd3ClauseClear,
        Self::Bsl1_0,
        Self::Cc,
        Self::Cc0_1_0,
        Self::CcBy4_0,
        Self::CcBySa4_0,
        Self::Wtfpl,
        Self::Ecl2_0,
        Self::Epl1_0,
        Self::Eupl1_1,
        Self::Agpl3_0,
        Self::Gpl,
        Self::Gpl2_0,
        Self::Gpl3_0,
        Self::Lgpl,
        Self::Lgpl2_1,
        Self::Lgpl3_0,
        Self::Isc,
        Self::Lppl1_3c,
        Self::MsPl,
        Self::Mit,
        Self::Mpl2_0,
        Self::Osl3_0,
        Self::PostgreSql,
        Self::Ofl1_1,
        Self::Ncsa,
        Self::Unlicense,
        Self::Zlib,
    ];

    /// The hosting service's license key, also used as the storage value.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Afl3_0 => "afl-3.0",
            Self::Apache2_0 => "apache-2.0",
            Self::Artistic2_0 => "artistic-2.0",
            Self::Bsd2Clause => "bsd-2-clause",
            Self::Bsd3Clause => "bsd-3-clause",
            Self::Bsd3ClauseClear => "bsd-3-clause-clear",
            Self::Bsl1_0 => "bsl-1.0",
            Self::Cc => "cc",
            Self::Cc0_1_0 => "cc0-1.0",
            Self::CcBy4_0 => "cc-by-4.0",
            Self::CcBySa4_0 => "cc-by-sa-4.0",
            Self::Wtfpl => "wtfpl",
            Self::Ecl2_0 => "ecl-2.0",
            Self::Epl1_0 => "epl-1.0",
            Self::Eupl1_1 => "eupl-1.1",
            Self::Agpl3_0 => "agpl-3.0",
            Self::Gpl => "gpl",
            Self::Gpl2_0 => "gpl-2.0",
            Self::Gpl3_0 => "gpl-3.0",
            Self::Lgpl => "lgpl",
            Self::Lgpl2_1 => "lgpl-2.1",
            Self::Lgpl3_0 => "lgpl-3.0",
            Self::Isc => "isc",
            Self::Lppl1_3c => "lppl-1.3c",
            Self::MsPl => "ms-pl",
            Self::Mit => "mit",
            Self::Mpl2_0 => "mpl-2.0",
            Self::Osl3_0 => "osl-3.0",
            Self::PostgreSql => "postgresql",
            Self::Ofl1_1 => "ofl-1.1",
            Self::Ncsa => "ncsa",
            Self::Unlicense => "unlicense",
            Self::Zlib => "zlib",
            Self::Other => "other",
            Self::None => "none",
        }
    }

    /// Map an optional hosting-service key, treating absence as
    /// [`License::None`].
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some(key) => key.parse().unwrap_or(Self::Other),
            None => Self::None,
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Afl3_0 => "Academic Free License v3.0",
            Self::Apache2_0 => "Apache License 2.0",
            Self::Artistic2_0 => "Artistic License 2.0",
            Self::Bsd2Clause => "BSD 2-clause \"Simplified\" License",
            Self::Bsd3Clause => "BSD 3-clause \"New\" or \"Revised\" License",
            Self::Bsd3ClauseClear => "BSD 3-clause Clear License",
            Self::Bsl1_0 => "Boost Software License 1.0",
            Self::Cc => "Creative Commons License Family",
            Self::Cc0_1_0 => "Creative Commons Zero v1.0 Universal",
            Self::CcBy4_0 => "Creative Commons Attribution 4.0",
            Self::CcBySa4_0 => "Creative Commons Attribution Share Alike 4.0",
            Self::Wtfpl => "Do What The F*ck You Want To Public License",
            Self::Ecl2_0 => "Educational Community License v2.0",
            Self::Epl1_0 => "Eclipse Public License 1.0",
            Self::Eupl1_1 => "European Union Public License 1.1",
            Self::Agpl3_0 => "GNU Affero General Public License v3.0",
            Self::Gpl => "GNU General Public License Family",
            Self::Gpl2_0 => "GNU General Public License v2.0",
            Self::Gpl3_0 => "GNU General Public License v3.0",
            Self::Lgpl => "GNU Lesser General Public License Family",
            Self::Lgpl2_1 => "GNU Lesser General Public License v2.1",
            Self::Lgpl3_0 => "GNU Lesser General Public License v3.0",
            Self::Isc => "ISC License",
            Self::Lppl1_3c => "LaTeX Project Public License v1.3c",
            Self::MsPl => "Microsoft Public License",
            Self::Mit => "MIT License",
            Self::Mpl2_0 => "Mozilla Public License 2.0",
            Self::Osl3_0 => "Open Software License 3.0",
            Self::PostgreSql => "PostgreSQL License",
            Self::Ofl1_1 => "SIL Open Font License 1.1",
            Self::Ncsa => "University of Illinois/NCSA Open Source License",
            Self::Unlicense => "The Unlicense",
            Self::Zlib => "zLib License",
            Self::Other => "Unknown License",
            Self::None => "No License",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Afl3_0 => "AFL 3.0",
            Self::Apache2_0 => "Apache 2.0",
            Self::Artistic2_0 => "Artistic 2.0",
            Self::Bsd2Clause => "BSD 2-clause",
            Self::Bsd3Clause => "BSD 3-clause",
            Self::Bsd3ClauseClear => "BSD 3-clause Clear",
            Self::Bsl1_0 => "Boost 1.0",
            Self::Cc => "CC",
            Self::Cc0_1_0 => "CC Zero 1.0",
            Self::CcBy4_0 => "CC Attribution 4.0",
            Self::CcBySa4_0 => "CC Attribution Share Alike 4.0",
            Self::Wtfpl => "WTFPL",
            Self::Ecl2_0 => "ECL 2.0",
            Self::Epl1_0 => "EPL 1.0",
            Self::Eupl1_1 => "EUPL 1.1",
            Self::Agpl3_0 => "AGPL 3.0",
            Self::Gpl => "GPL",
            Self::Gpl2_0 => "GPL 2.0",
            Self::Gpl3_0 => "GPL 3.0",
            Self::Lgpl => "LGPL",
            Self::Lgpl2_1 => "LGPL 2.1",
            Self::Lgpl3_0 => "LGPL 3.0",
            Self::Isc => "ISC",
            Self::Lppl1_3c => "LPPL 1.3c",
            Self::MsPl => "MS-PL",
            Self::Mit => "MIT",
            Self::Mpl2_0 => "MPL 2.0",
            Self::Osl3_0 => "OSL 3.0",
            Self::PostgreSql => "PostgreSQL",
            Self::Ofl1_1 => "OFL 1.1",
            Self::Ncsa => "NCSA",
            Self::Unlicense => "The Unlicense",
            Self::Zlib => "zLib",
            Self::Other => "Unknown License",
            Self::None => "No License",
        }
    }

    pub fn kind(&self) -> LicenseKind {
        match self {
            Self::Other | Self::None => LicenseKind::NoneOrUnknown,
            Self::Agpl3_0 | Self::Gpl | Self::Gpl2_0 | Self::Gpl3_0 | Self::Lgpl | Self::Lgpl2_1 | Self::Lgpl3_0 => {
                LicenseKind::IncompatibleWithAppStore
            },
            _ => LicenseKind::CompatibleWithAppStore,
        }
    }
}
impl FromStr for License {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "other" => Ok(Self::Other),
            "none" => Ok(Self::None),
            _ => Self::ALL.into_iter().find(|l| l.key().eq_ignore_ascii_case(s)).ok_or_raise(|| {
                crate::error::ErrorKind::ParseError {
                    field: "license",
                    value: s.to_string(),
                }
            }),
        }
    }
}
impl Display for License {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.key())
    }
}
