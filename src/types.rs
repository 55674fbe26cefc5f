//! Core identifier types used throughout the crate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest AS number rendered in plain decimal (the BGP range).
const MAX_BGP_ASN: u64 = u32::MAX as u64;

/// Mask for the 48-bit AS part of an [`IsdAsn`].
const ASN_MASK: u64 = (1 << 48) - 1;

/// Routing domain identifier: 16-bit isolation domain plus 48-bit AS number.
///
/// Rendered as `<isd>-<as>`, where the AS part is decimal inside the BGP
/// range and three colon-separated hex groups otherwise (`1-ff00:0:110`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IsdAsn(pub u64);

impl IsdAsn {
    /// Wildcard / unknown routing domain (`0-0`).
    pub const UNSPECIFIED: Self = Self(0);

    pub fn new(isd: u16, asn: u64) -> Result<Self> {
        if asn > ASN_MASK {
            return Err(Error::InvalidArgument(format!(
                "AS number {asn:#x} exceeds 48 bits"
            )));
        }
        Ok(Self((u64::from(isd) << 48) | asn))
    }

    pub fn isd(self) -> u16 {
        (self.0 >> 48) as u16
    }

    pub fn asn(self) -> u64 {
        self.0 & ASN_MASK
    }

    pub fn is_unspecified(self) -> bool {
        self == Self::UNSPECIFIED
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for IsdAsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let asn = self.asn();
        if asn <= MAX_BGP_ASN {
            write!(f, "{}-{}", self.isd(), asn)
        } else {
            write!(
                f,
                "{}-{:x}:{:x}:{:x}",
                self.isd(),
                (asn >> 32) & 0xffff,
                (asn >> 16) & 0xffff,
                asn & 0xffff
            )
        }
    }
}

impl FromStr for IsdAsn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("invalid ISD-AS: {s:?}"));

        let (isd, asn) = s.split_once('-').ok_or_else(invalid)?;
        let isd: u16 = isd.parse().map_err(|_| invalid())?;

        let asn = if asn.contains(':') {
            let groups: Vec<&str> = asn.split(':').collect();
            if groups.len() != 3 {
                return Err(invalid());
            }
            let mut value = 0u64;
            for group in groups {
                let part = u16::from_str_radix(group, 16).map_err(|_| invalid())?;
                value = (value << 16) | u64::from(part);
            }
            value
        } else {
            let value: u64 = asn.parse().map_err(|_| invalid())?;
            if value > MAX_BGP_ASN {
                return Err(invalid());
            }
            value
        };

        Self::new(isd, asn)
    }
}

impl Serialize for IsdAsn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsdAsn {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Interface identifier, unique within one AS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct IfId(pub u16);

impl fmt::Display for IfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for IfId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// One interface traversed by a path, qualified by its routing domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathInterface {
    pub ia: IsdAsn,
    pub ifid: IfId,
}

impl PathInterface {
    pub fn new(ia: IsdAsn, ifid: u16) -> Self {
        Self {
            ia,
            ifid: IfId(ifid),
        }
    }
}

impl fmt::Display for PathInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ia, self.ifid)
    }
}

impl FromStr for PathInterface {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (ia, ifid) = s
            .rsplit_once('#')
            .ok_or_else(|| Error::InvalidArgument(format!("invalid path interface: {s:?}")))?;
        let ifid: u16 = ifid
            .parse()
            .map_err(|_| Error::InvalidArgument(format!("invalid interface id: {ifid:?}")))?;
        Ok(Self::new(ia.parse()?, ifid))
    }
}

/// Hop-by-hop pair of interfaces as seen in traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HopInterfaces {
    pub ingress: IfId,
    pub egress: IfId,
}
