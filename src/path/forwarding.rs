//! Forwarding path: the raw encoding tagged by path type.

use std::fmt;

use crate::error::{DecodeError, Result};
use crate::types::IfId;

use super::raw::DecodedPath;

/// Path type tag as carried in the packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PathType {
    /// No path; source and destination share a routing domain.
    Empty = 0,
    /// Segment-based hop-field path.
    Scion = 1,
    OneHop = 2,
    Epic = 3,
    Colibri = 4,
}

impl PathType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Empty),
            1 => Some(Self::Scion),
            2 => Some(Self::OneHop),
            3 => Some(Self::Epic),
            4 => Some(Self::Colibri),
            _ => None,
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Scion => write!(f, "scion"),
            Self::OneHop => write!(f, "onehop"),
            Self::Epic => write!(f, "epic"),
            Self::Colibri => write!(f, "colibri"),
        }
    }
}

/// Raw forwarding path, decoded where the type has a segment structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardingPath {
    Empty,
    Scion { raw: Vec<u8>, decoded: DecodedPath },
    /// Kept opaque; hop extraction is not possible.
    Unsupported { path_type: u8, raw: Vec<u8> },
}

impl ForwardingPath {
    /// Build from a path type tag and the raw bytes.
    ///
    /// Segment-based paths are decoded eagerly so malformed input fails here.
    pub fn from_raw(path_type: u8, raw: &[u8]) -> Result<Self> {
        match PathType::from_u8(path_type) {
            Some(PathType::Empty) => {
                if raw.is_empty() {
                    Ok(Self::Empty)
                } else {
                    Err(DecodeError::TrailingBytes(raw.len()).into())
                }
            }
            Some(PathType::Scion) => Ok(Self::Scion {
                raw: raw.to_vec(),
                decoded: DecodedPath::decode(raw)?,
            }),
            _ => Ok(Self::Unsupported {
                path_type,
                raw: raw.to_vec(),
            }),
        }
    }

    pub fn from_decoded(decoded: DecodedPath) -> Self {
        Self::Scion {
            raw: decoded.encode(),
            decoded,
        }
    }

    pub fn path_type(&self) -> u8 {
        match self {
            Self::Empty => PathType::Empty as u8,
            Self::Scion { .. } => PathType::Scion as u8,
            Self::Unsupported { path_type, .. } => *path_type,
        }
    }

    pub fn raw(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            Self::Scion { raw, .. } | Self::Unsupported { raw, .. } => raw,
        }
    }

    pub fn decoded(&self) -> Result<&DecodedPath> {
        match self {
            Self::Scion { decoded, .. } => Ok(decoded),
            _ => Err(DecodeError::UnsupportedPathType(self.path_type()).into()),
        }
    }

    /// Interfaces traversed; an empty path traverses none.
    pub fn interfaces(&self) -> Result<Vec<IfId>> {
        match self {
            Self::Empty => Ok(Vec::new()),
            _ => Ok(self.decoded()?.interfaces()),
        }
    }

    /// Path for the return direction.
    pub fn reverse(&self) -> Result<Self> {
        match self {
            Self::Empty => Ok(Self::Empty),
            Self::Scion { decoded, .. } => Ok(Self::from_decoded(decoded.reverse())),
            Self::Unsupported { path_type, .. } => {
                Err(DecodeError::UnsupportedPathType(*path_type).into())
            }
        }
    }
}

impl fmt::Display for ForwardingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Scion { decoded, .. } => write!(f, "{decoded}"),
            Self::Unsupported { path_type, raw } => {
                let name = PathType::from_u8(*path_type)
                    .map_or_else(|| format!("type {path_type}"), |t| t.to_string());
                write!(f, "{name} ({} bytes)", raw.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::path::raw::tests::TWO_SEGMENT_PATH;

    #[test]
    fn test_scion_from_raw() {
        let fwd = ForwardingPath::from_raw(1, &TWO_SEGMENT_PATH).unwrap();
        assert_eq!(fwd.path_type(), 1);
        assert_eq!(fwd.raw(), &TWO_SEGMENT_PATH[..]);
        assert_eq!(fwd.interfaces().unwrap(), vec![IfId(1), IfId(2), IfId(2), IfId(1)]);
        assert_eq!(fwd.to_string(), "[1>2 2>1]");
    }

    #[test]
    fn test_malformed_scion_fails() {
        assert!(matches!(
            ForwardingPath::from_raw(1, &TWO_SEGMENT_PATH[..10]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_empty() {
        let fwd = ForwardingPath::from_raw(0, &[]).unwrap();
        assert!(fwd.raw().is_empty());
        assert!(fwd.interfaces().unwrap().is_empty());
        assert_eq!(fwd.reverse().unwrap(), ForwardingPath::Empty);
        assert!(ForwardingPath::from_raw(0, &[1]).is_err());
    }

    #[test]
    fn test_unsupported_has_no_hops() {
        let fwd = ForwardingPath::from_raw(4, &[1, 2, 3]).unwrap();
        assert_eq!(fwd.raw(), &[1, 2, 3]);
        assert_eq!(fwd.to_string(), "colibri (3 bytes)");
        assert!(matches!(
            fwd.interfaces(),
            Err(Error::Decode(DecodeError::UnsupportedPathType(4)))
        ));
        assert!(fwd.reverse().is_err());
    }

    #[test]
    fn test_reverse_reencodes() {
        let fwd = ForwardingPath::from_raw(1, &TWO_SEGMENT_PATH).unwrap();
        let rev = fwd.reverse().unwrap();
        assert_ne!(rev.raw(), fwd.raw());
        assert_eq!(rev.reverse().unwrap(), fwd);
    }
}
