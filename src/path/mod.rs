//! Path representation: forwarding path, metadata and fingerprint.
//!
//! This module implements:
//! - Decoding of segment-based raw paths into traversed interfaces
//! - Normalized metadata accessors
//! - Structure-derived fingerprints used as cache keys

pub mod fingerprint;
pub mod forwarding;
pub mod metadata;
pub mod raw;

pub use fingerprint::Fingerprint;
pub use forwarding::{ForwardingPath, PathType};
pub use metadata::PathMetadata;
pub use raw::{decode_hops, DecodedPath, HopField, InfoField, PathMeta};

use std::fmt;
use std::time::SystemTime;

use crate::error::{DecodeError, Error, Result};
use crate::types::{IfId, IsdAsn};

/// A path to a destination.
///
/// Immutable once built; a metadata refresh produces a new value. Two paths
/// with the same fingerprint are the same path for caching and selection.
#[derive(Debug, Clone)]
pub struct Path {
    pub source: IsdAsn,
    pub destination: IsdAsn,
    pub forwarding: ForwardingPath,
    pub metadata: Option<PathMetadata>,
    pub(crate) fingerprint: Fingerprint,
}

impl Path {
    /// Build a path and derive its fingerprint.
    ///
    /// The fingerprint covers the endpoints and the interfaces decoded from
    /// the forwarding path, so it is the same with or without metadata.
    /// Metadata interfaces, when given, must name the same interface ids.
    /// Opaque path types are identified by their metadata interfaces alone.
    pub fn new(
        source: IsdAsn,
        destination: IsdAsn,
        forwarding: ForwardingPath,
        metadata: Option<PathMetadata>,
    ) -> Result<Self> {
        let fingerprint = match &forwarding {
            ForwardingPath::Unsupported { path_type, .. } => match metadata {
                Some(ref md) if !md.interfaces.is_empty() => {
                    Fingerprint::from_interfaces(&md.interfaces)
                }
                _ => return Err(DecodeError::UnsupportedPathType(*path_type).into()),
            },
            _ => {
                let ifids = forwarding.interfaces()?;
                if let Some(ref md) = metadata {
                    check_metadata_interfaces(md, &ifids)?;
                }
                Fingerprint::from_route(source, destination, &ifids)
            }
        };

        Ok(Self {
            source,
            destination,
            forwarding,
            metadata,
            fingerprint,
        })
    }

    /// Build from a path type tag and raw bytes.
    pub fn from_raw(
        source: IsdAsn,
        destination: IsdAsn,
        path_type: u8,
        raw: &[u8],
        metadata: Option<PathMetadata>,
    ) -> Result<Self> {
        Self::new(
            source,
            destination,
            ForwardingPath::from_raw(path_type, raw)?,
            metadata,
        )
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn raw(&self) -> &[u8] {
        self.forwarding.raw()
    }

    pub fn interfaces(&self) -> Result<Vec<IfId>> {
        self.forwarding.interfaces()
    }

    /// Expiry from metadata, else from the hop fields. Empty paths never expire.
    pub fn expiry(&self) -> Option<SystemTime> {
        if let Some(ref md) = self.metadata {
            return Some(md.expiry());
        }
        self.forwarding.decoded().ok().map(DecodedPath::expiry)
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiry().is_some_and(|expiry| now >= expiry)
    }

    /// Path for the return direction, with metadata reversed hop by hop.
    pub fn reverse(&self) -> Result<Self> {
        let metadata = self.metadata.clone().map(|mut md| {
            md.interfaces.reverse();
            md.latency.reverse();
            md.bandwidth_kbps.reverse();
            md
        });
        Self::new(
            self.destination,
            self.source,
            self.forwarding.reverse()?,
            metadata,
        )
    }
}

/// Metadata interfaces must pair up with the decoded interface ids.
fn check_metadata_interfaces(md: &PathMetadata, ifids: &[IfId]) -> Result<()> {
    if md.interfaces.is_empty() {
        return Ok(());
    }
    let matches = md.interfaces.len() == ifids.len()
        && md.interfaces.iter().zip(ifids).all(|(iface, ifid)| iface.ifid == *ifid);
    if matches {
        Ok(())
    } else {
        let reported: Vec<String> = md.interfaces.iter().map(ToString::to_string).collect();
        let decoded: Vec<String> = ifids.iter().map(ToString::to_string).collect();
        Err(Error::InvalidArgument(format!(
            "metadata interfaces [{}] do not match decoded path [{}]",
            reported.join(" "),
            decoded.join(" ")
        )))
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Path {}

impl std::hash::Hash for Path {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ifaces = self
            .metadata
            .as_ref()
            .map(|md| md.interfaces.as_slice())
            .unwrap_or_default();

        if ifaces.is_empty() || ifaces.len() % 2 != 0 {
            return write!(f, "{} -> {} {}", self.source, self.destination, self.forwarding);
        }

        write!(f, "[{}", ifaces[0].ia)?;
        for pair in ifaces.chunks(2) {
            write!(f, " {}>{} {}", pair[0].ifid, pair[1].ifid, pair[1].ia)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::raw::tests::TWO_SEGMENT_PATH;
    use crate::types::PathInterface;
    use std::time::{Duration, UNIX_EPOCH};

    fn ia(s: &str) -> IsdAsn {
        s.parse().unwrap()
    }

    fn metadata(latency_ms: u64) -> PathMetadata {
        PathMetadata::new(
            vec![
                PathInterface::new(ia("1-ff00:0:110"), 1),
                PathInterface::new(ia("1-ff00:0:111"), 2),
                PathInterface::new(ia("1-ff00:0:111"), 2),
                PathInterface::new(ia("1-ff00:0:112"), 1),
            ],
            1400,
            UNIX_EPOCH + Duration::from_secs(2_000_000_000),
        )
        .with_latency(vec![Some(Duration::from_millis(latency_ms)), None, None])
    }

    fn two_segment(metadata: Option<PathMetadata>) -> Path {
        Path::from_raw(
            ia("1-ff00:0:110"),
            ia("1-ff00:0:112"),
            1,
            &TWO_SEGMENT_PATH,
            metadata,
        )
        .unwrap()
    }

    #[test]
    fn test_fingerprint_stable_across_metadata() {
        let a = two_segment(Some(metadata(5)));
        let b = two_segment(Some(metadata(80)));
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_stable_across_raw_bytes() {
        // Differing MACs and timestamps decode to the same interfaces.
        let mut other = TWO_SEGMENT_PATH;
        other[8..12].copy_from_slice(&[0, 0, 2, 0]);
        other[26..32].copy_from_slice(&[9, 9, 9, 9, 9, 9]);

        let a = two_segment(None);
        let b = Path::from_raw(ia("1-ff00:0:110"), ia("1-ff00:0:112"), 1, &other, None).unwrap();
        assert_ne!(a.raw(), b.raw());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_same_with_and_without_metadata() {
        let with_md = two_segment(Some(metadata(5)));
        let without = two_segment(None);
        let expected = Fingerprint::from_route(
            ia("1-ff00:0:110"),
            ia("1-ff00:0:112"),
            &[IfId(1), IfId(2), IfId(2), IfId(1)],
        );
        assert_eq!(with_md.fingerprint(), &expected);
        assert_eq!(without.fingerprint(), &expected);

        let mut mru = crate::cache::PathsMru::new();
        mru.insert(without, 4).unwrap();
        mru.insert(with_md, 4).unwrap();
        assert_eq!(mru.len(), 1);
        assert!(mru.first().unwrap().metadata.is_some());
    }

    #[test]
    fn test_metadata_must_match_route() {
        let mut md = metadata(5);
        md.interfaces[2].ifid = IfId(7);
        let err = Path::from_raw(ia("1-ff00:0:110"), ia("1-ff00:0:112"), 1, &TWO_SEGMENT_PATH, Some(md))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        // An empty path traverses no interfaces, so a non-empty list is inconsistent.
        let err = Path::new(
            ia("1-ff00:0:110"),
            ia("1-ff00:0:112"),
            ForwardingPath::Empty,
            Some(metadata(5)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_metadata_without_interfaces_accepted() {
        let md = PathMetadata::new(Vec::new(), 1400, UNIX_EPOCH + Duration::from_secs(2_000_000_000));
        let p = two_segment(Some(md));
        assert_eq!(p.fingerprint(), two_segment(None).fingerprint());
    }

    #[test]
    fn test_unsupported_identified_by_metadata() {
        let md = metadata(5);
        let p = Path::from_raw(ia("1-ff00:0:110"), ia("1-ff00:0:112"), 3, &[0; 8], Some(md.clone()))
            .unwrap();
        assert_eq!(p.fingerprint(), &Fingerprint::from_interfaces(&md.interfaces));
        assert_ne!(p.fingerprint(), two_segment(None).fingerprint());
    }

    #[test]
    fn test_unsupported_without_metadata_fails() {
        assert!(matches!(
            Path::from_raw(ia("1-ff00:0:110"), ia("1-ff00:0:112"), 3, &[0; 8], None),
            Err(Error::Decode(DecodeError::UnsupportedPathType(3)))
        ));
    }

    #[test]
    fn test_expiry_prefers_metadata() {
        let with_md = two_segment(Some(metadata(5)));
        assert_eq!(with_md.expiry(), Some(UNIX_EPOCH + Duration::from_secs(2_000_000_000)));

        let without = two_segment(None);
        // segment timestamp 256 + full hop lifetime
        assert!(without.is_expired(UNIX_EPOCH + Duration::from_secs(256 + 86_400)));
        assert!(!without.is_expired(UNIX_EPOCH + Duration::from_secs(256)));

        let empty = Path::new(ia("1-ff00:0:110"), ia("1-ff00:0:110"), ForwardingPath::Empty, None).unwrap();
        assert_eq!(empty.expiry(), None);
        assert!(!empty.is_expired(SystemTime::now()));
    }

    #[test]
    fn test_reverse() {
        let p = two_segment(Some(metadata(5)));
        let r = p.reverse().unwrap();
        assert_eq!(r.source, p.destination);
        assert_eq!(r.destination, p.source);
        let md = r.metadata.as_ref().unwrap();
        assert_eq!(md.interfaces[0], PathInterface::new(ia("1-ff00:0:112"), 1));
        assert_eq!(md.latency(2).unwrap(), Some(Duration::from_millis(5)));
        assert_ne!(r.fingerprint(), p.fingerprint());
        assert_eq!(r.reverse().unwrap().fingerprint(), p.fingerprint());
    }

    #[test]
    fn test_display() {
        let p = two_segment(Some(metadata(5)));
        assert_eq!(p.to_string(), "[1-ff00:0:110 1>2 1-ff00:0:111 2>1 1-ff00:0:112]");

        let bare = two_segment(None);
        assert_eq!(bare.to_string(), "1-ff00:0:110 -> 1-ff00:0:112 [1>2 2>1]");
    }
}
