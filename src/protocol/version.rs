//! Protocol version numbers and table-driven resolution of version-dependent
//! values.
//!
//! Packet IDs and field encodings changed many times across releases and
//! snapshots. Instead of comparing against breakpoints by hand, each consumer
//! declares a [`VersionTable`] mapping the first version of every era to the
//! value used in that era, and resolves it against the negotiated version.

use serde::Deserialize;
use std::{fmt, str::FromStr};
use strum::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("protocol version must not be negative (got {0})")]
    Negative(i32),
    #[error("unknown protocol version '{0}'")]
    Unknown(String),
}

/// A protocol version number as sent in the handshake.
///
/// Always non-negative. Ordering follows release order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "VersionSpec")]
pub struct ProtocolVersion(i32);

impl ProtocolVersion {
    pub fn new(number: i32) -> Result<Self, VersionError> {
        if number < 0 {
            Err(VersionError::Negative(number))
        } else {
            Ok(Self(number))
        }
    }

    /// Const constructor for tables and registry entries.
    ///
    /// # Panics
    /// Panics (at compile time in const context) if `number` is negative.
    pub const fn from_raw(number: i32) -> Self {
        assert!(number >= 0, "protocol versions are non-negative");
        Self(number)
    }

    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Breakpoint> for ProtocolVersion {
    fn from(breakpoint: Breakpoint) -> Self {
        breakpoint.protocol()
    }
}

/// Accepts either a number or a [`Breakpoint`] name such as `1.12.2-pre1`.
impl FromStr for ProtocolVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(number) = s.parse::<i32>() {
            return Self::new(number);
        }
        Breakpoint::from_str(s)
            .map(Breakpoint::protocol)
            .map_err(|_| VersionError::Unknown(s.to_owned()))
    }
}

/// Serialized form: a bare number or a breakpoint name.
#[derive(Deserialize)]
#[serde(untagged)]
enum VersionSpec {
    Number(i32),
    Name(String),
}

impl TryFrom<VersionSpec> for ProtocolVersion {
    type Error = VersionError;

    fn try_from(spec: VersionSpec) -> Result<Self, Self::Error> {
        match spec {
            VersionSpec::Number(number) => Self::new(number),
            VersionSpec::Name(name) => name.parse(),
        }
    }
}

/// Named releases and snapshots at which some part of the protocol changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum Breakpoint {
    #[strum(serialize = "1.7.2")]
    V1_7_2,
    #[strum(serialize = "1.7.6")]
    V1_7_6,
    #[strum(serialize = "14w21a")]
    V14w21a,
    #[strum(serialize = "14w31a")]
    V14w31a,
    #[strum(serialize = "1.8")]
    V1_8,
    #[strum(serialize = "15w36a")]
    V15w36a,
    #[strum(serialize = "15w43a")]
    V15w43a,
    #[strum(serialize = "1.9")]
    V1_9,
    #[strum(serialize = "1.10")]
    V1_10,
    #[strum(serialize = "1.11")]
    V1_11,
    #[strum(serialize = "17w13a")]
    V17w13a,
    #[strum(serialize = "1.12-pre5")]
    V1_12Pre5,
    #[strum(serialize = "1.12")]
    V1_12,
    #[strum(serialize = "17w31a")]
    V17w31a,
    #[strum(serialize = "1.12.1")]
    V1_12_1,
    #[strum(serialize = "1.12.2-pre1")]
    V1_12_2Pre1,
    #[strum(serialize = "1.12.2")]
    V1_12_2,
    #[strum(serialize = "17w45a")]
    V17w45a,
    #[strum(serialize = "1.13-pre4")]
    V1_13Pre4,
    #[strum(serialize = "1.13-pre7")]
    V1_13Pre7,
    #[strum(serialize = "1.13")]
    V1_13,
    #[strum(serialize = "1.13.2")]
    V1_13_2,
    #[strum(serialize = "1.14")]
    V1_14,
    #[strum(serialize = "1.15")]
    V1_15,
    #[strum(serialize = "1.16")]
    V1_16,
    #[strum(serialize = "1.16.5")]
    V1_16_5,
    #[strum(serialize = "1.20.4")]
    V1_20_4,
}

impl Breakpoint {
    /// The protocol number this breakpoint introduced.
    pub const fn protocol(self) -> ProtocolVersion {
        ProtocolVersion::from_raw(match self {
            Self::V1_7_2 => 4,
            Self::V1_7_6 => 5,
            Self::V14w21a => 17,
            Self::V14w31a => 32,
            Self::V1_8 => 47,
            Self::V15w36a => 67,
            Self::V15w43a => 80,
            Self::V1_9 => 107,
            Self::V1_10 => 210,
            Self::V1_11 => 315,
            Self::V17w13a => 318,
            Self::V1_12Pre5 => 332,
            Self::V1_12 => 335,
            Self::V17w31a => 336,
            Self::V1_12_1 => 338,
            Self::V1_12_2Pre1 => 339,
            Self::V1_12_2 => 340,
            Self::V17w45a => 343,
            Self::V1_13Pre4 => 386,
            Self::V1_13Pre7 => 389,
            Self::V1_13 => 393,
            Self::V1_13_2 => 404,
            Self::V1_14 => 477,
            Self::V1_15 => 573,
            Self::V1_16 => 735,
            Self::V1_16_5 => 754,
            Self::V1_20_4 => 765,
        })
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Maps protocol eras to the value in effect during each.
///
/// Thresholds are listed newest first; the value of the greatest threshold
/// not above the requested version wins, and versions older than every
/// threshold get the fallback.
#[derive(Debug)]
pub struct VersionTable<T: 'static> {
    thresholds: &'static [(ProtocolVersion, T)],
    fallback: T,
}

impl<T: 'static> VersionTable<T> {
    /// # Panics
    /// Panics if the thresholds are not strictly descending. For tables
    /// declared as `static` or `const` this is a compile error.
    pub const fn new(thresholds: &'static [(ProtocolVersion, T)], fallback: T) -> Self {
        let mut i = 1;
        while i < thresholds.len() {
            assert!(
                thresholds[i - 1].0 .0 > thresholds[i].0 .0,
                "version table thresholds must be strictly descending"
            );
            i += 1;
        }
        Self {
            thresholds,
            fallback,
        }
    }

    /// Resolves a raw protocol number, rejecting negative input.
    pub fn resolve(&self, version: i32) -> Result<&T, VersionError> {
        ProtocolVersion::new(version).map(|version| self.resolve_version(version))
    }

    pub fn resolve_version(&self, version: ProtocolVersion) -> &T {
        self.thresholds
            .iter()
            .find(|(threshold, _)| version >= *threshold)
            .map_or(&self.fallback, |(_, value)| value)
    }

    pub fn thresholds(&self) -> &'static [(ProtocolVersion, T)] {
        self.thresholds
    }

    pub fn fallback(&self) -> &T {
        &self.fallback
    }
}

/// How a length-prefixed sequence encodes its length.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LengthPrefix {
    VarInt,
    /// Big-endian `u16`.
    UnsignedShort,
}

pub static BYTE_ARRAY_PREFIX: VersionTable<LengthPrefix> = VersionTable::new(
    &[(Breakpoint::V14w21a.protocol(), LengthPrefix::VarInt)],
    LengthPrefix::UnsignedShort,
);
