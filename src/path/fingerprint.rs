//! Structural path identity.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::types::{IfId, IsdAsn, PathInterface};

const ROUTE_TAG: u8 = 0x01;

/// Identity of a path derived from the interfaces it traverses.
///
/// Stable across metadata refreshes and re-encodings of the same route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash the interface sequence: per interface, ISD-AS (u64 BE) then
    /// interface id (u16 BE).
    pub fn from_interfaces(interfaces: &[PathInterface]) -> Self {
        let mut hasher = Sha256::new();
        for iface in interfaces {
            hasher.update(iface.ia.to_be_bytes());
            hasher.update(iface.ifid.0.to_be_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Fingerprint for a decoded route between two endpoints.
    ///
    /// Hashes a `0x01` tag, source and destination ISD-AS (u64 BE), then
    /// every traversed interface id (u16 BE). The preimage length is odd,
    /// so it never equals an [`Fingerprint::from_interfaces`] preimage.
    pub fn from_route(source: IsdAsn, destination: IsdAsn, ifids: &[IfId]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([ROUTE_TAG]);
        hasher.update(source.to_be_bytes());
        hasher.update(destination.to_be_bytes());
        for ifid in ifids {
            hasher.update(ifid.0.to_be_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    /// Wrap an existing identifier; any non-empty string is accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::InvalidArgument("empty fingerprint".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
