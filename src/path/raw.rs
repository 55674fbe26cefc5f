//! Segment-based raw path header: parsing, serialization, reversal and
//! flattening into the interfaces a packet traverses.
//!
//! Layout (all fields big-endian):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | C |  CurrHF   |    RSV    |  Seg0Len  |  Seg1Len  |  Seg2Len  |  path meta
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     flags     |      RSV      |             SegID             |  info field
//! |                           Timestamp                           |  (x NumINF)
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     flags     |    ExpTime    |          ConsIngress          |  hop field
//! |          ConsEgress           |                               |  (x NumHF)
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+            MAC                +
//! |                                                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, Result};
use crate::types::{HopInterfaces, IfId};

/// Size of the path meta header.
pub const META_LEN: usize = 4;

/// Size of one info field.
pub const INFO_FIELD_LEN: usize = 8;

/// Size of one hop field.
pub const HOP_FIELD_LEN: usize = 12;

/// Maximum number of segments.
pub const MAX_SEGMENTS: usize = 3;

/// Maximum number of hop fields in one path.
pub const MAX_HOPS: usize = 64;

/// Size of the hop field MAC.
pub const MAC_LEN: usize = 6;

/// Hop field expiry granularity: one day split into 256 units.
const EXP_TIME_UNIT: Duration = Duration::from_millis(337_500);

/// Path meta header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathMeta {
    /// Index of the current info field (2 bits).
    pub curr_inf: u8,
    /// Index of the current hop field (6 bits).
    pub curr_hf: u8,
    /// Number of hop fields per segment (6 bits each).
    pub seg_len: [u8; MAX_SEGMENTS],
}

impl PathMeta {
    fn decode(buf: &[u8]) -> Self {
        let line = BigEndian::read_u32(buf);
        Self {
            curr_inf: (line >> 30) as u8,
            curr_hf: ((line >> 24) & 0x3f) as u8,
            seg_len: [
                ((line >> 12) & 0x3f) as u8,
                ((line >> 6) & 0x3f) as u8,
                (line & 0x3f) as u8,
            ],
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        let line = (u32::from(self.curr_inf & 0x3) << 30)
            | (u32::from(self.curr_hf & 0x3f) << 24)
            | (u32::from(self.seg_len[0] & 0x3f) << 12)
            | (u32::from(self.seg_len[1] & 0x3f) << 6)
            | u32::from(self.seg_len[2] & 0x3f);
        BigEndian::write_u32(buf, line);
    }

    /// Number of info fields implied by the segment lengths.
    ///
    /// A zero-length segment followed by a non-empty one is rejected.
    fn num_info_fields(&self) -> std::result::Result<usize, DecodeError> {
        let mut num_inf = 0;
        for i in (0..MAX_SEGMENTS).rev() {
            if self.seg_len[i] > 0 && num_inf == 0 {
                num_inf = i + 1;
            } else if self.seg_len[i] == 0 && num_inf > 0 {
                return Err(DecodeError::SegmentGap { index: i });
            }
        }
        if num_inf == 0 {
            return Err(DecodeError::NoSegments);
        }
        Ok(num_inf)
    }
}

/// Info field: one per segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfoField {
    /// Set when the segment is traversed in construction direction.
    pub cons_dir: bool,
    /// Set for peering segments.
    pub peer: bool,
    pub seg_id: u16,
    /// Segment creation time, seconds since the Unix epoch.
    pub timestamp: u32,
}

impl InfoField {
    const FLAG_CONS_DIR: u8 = 1 << 0;
    const FLAG_PEER: u8 = 1 << 1;

    fn decode(buf: &[u8]) -> Self {
        Self {
            cons_dir: buf[0] & Self::FLAG_CONS_DIR != 0,
            peer: buf[0] & Self::FLAG_PEER != 0,
            seg_id: BigEndian::read_u16(&buf[2..4]),
            timestamp: BigEndian::read_u32(&buf[4..8]),
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        let mut flags = 0;
        if self.cons_dir {
            flags |= Self::FLAG_CONS_DIR;
        }
        if self.peer {
            flags |= Self::FLAG_PEER;
        }
        buf[0] = flags;
        buf[1] = 0;
        BigEndian::write_u16(&mut buf[2..4], self.seg_id);
        BigEndian::write_u32(&mut buf[4..8], self.timestamp);
    }
}

/// Hop field: one forwarding decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HopField {
    pub ingress_alert: bool,
    pub egress_alert: bool,
    /// Relative expiry, in units of 1/256 day after the segment timestamp.
    pub exp_time: u8,
    /// Ingress interface in construction direction.
    pub cons_ingress: u16,
    /// Egress interface in construction direction.
    pub cons_egress: u16,
    pub mac: [u8; MAC_LEN],
}

impl HopField {
    const FLAG_EGRESS_ALERT: u8 = 1 << 0;
    const FLAG_INGRESS_ALERT: u8 = 1 << 1;

    fn decode(buf: &[u8]) -> Self {
        let mut mac = [0u8; MAC_LEN];
        mac.copy_from_slice(&buf[6..12]);
        Self {
            egress_alert: buf[0] & Self::FLAG_EGRESS_ALERT != 0,
            ingress_alert: buf[0] & Self::FLAG_INGRESS_ALERT != 0,
            exp_time: buf[1],
            cons_ingress: BigEndian::read_u16(&buf[2..4]),
            cons_egress: BigEndian::read_u16(&buf[4..6]),
            mac,
        }
    }

    fn encode(&self, buf: &mut [u8]) {
        let mut flags = 0;
        if self.egress_alert {
            flags |= Self::FLAG_EGRESS_ALERT;
        }
        if self.ingress_alert {
            flags |= Self::FLAG_INGRESS_ALERT;
        }
        buf[0] = flags;
        buf[1] = self.exp_time;
        BigEndian::write_u16(&mut buf[2..4], self.cons_ingress);
        BigEndian::write_u16(&mut buf[4..6], self.cons_egress);
        buf[6..12].copy_from_slice(&self.mac);
    }

    /// Interfaces in traversal direction for a segment with the given flag.
    pub fn interfaces(&self, cons_dir: bool) -> HopInterfaces {
        if cons_dir {
            HopInterfaces {
                ingress: IfId(self.cons_ingress),
                egress: IfId(self.cons_egress),
            }
        } else {
            HopInterfaces {
                ingress: IfId(self.cons_egress),
                egress: IfId(self.cons_ingress),
            }
        }
    }

    /// Lifetime of the hop field relative to its segment timestamp.
    pub fn lifetime(&self) -> Duration {
        EXP_TIME_UNIT * (u32::from(self.exp_time) + 1)
    }
}

/// Fully decoded segment-based path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath {
    pub meta: PathMeta,
    pub info_fields: Vec<InfoField>,
    pub hop_fields: Vec<HopField>,
}

impl DecodedPath {
    /// Parse a raw path. Trailing bytes beyond the declared fields are an error.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < META_LEN {
            return Err(DecodeError::BufferTooShort {
                needed: META_LEN,
                actual: buf.len(),
            }
            .into());
        }

        let meta = PathMeta::decode(buf);
        let num_inf = meta.num_info_fields()?;
        let num_hops: usize = meta.seg_len.iter().map(|&l| usize::from(l)).sum();
        if num_hops > MAX_HOPS {
            return Err(DecodeError::TooManyHops(num_hops).into());
        }

        let needed = encoded_len(num_inf, num_hops);
        if buf.len() < needed {
            return Err(DecodeError::BufferTooShort {
                needed,
                actual: buf.len(),
            }
            .into());
        }
        if buf.len() > needed {
            return Err(DecodeError::TrailingBytes(buf.len() - needed).into());
        }

        if usize::from(meta.curr_inf) >= num_inf {
            return Err(DecodeError::InvalidCursor {
                field: "CurrINF",
                value: meta.curr_inf,
                limit: num_inf,
            }
            .into());
        }
        if usize::from(meta.curr_hf) >= num_hops {
            return Err(DecodeError::InvalidCursor {
                field: "CurrHF",
                value: meta.curr_hf,
                limit: num_hops,
            }
            .into());
        }

        let info_fields = buf[META_LEN..META_LEN + num_inf * INFO_FIELD_LEN]
            .chunks_exact(INFO_FIELD_LEN)
            .map(InfoField::decode)
            .collect();
        let hop_fields = buf[META_LEN + num_inf * INFO_FIELD_LEN..]
            .chunks_exact(HOP_FIELD_LEN)
            .map(HopField::decode)
            .collect();

        Ok(Self {
            meta,
            info_fields,
            hop_fields,
        })
    }

    /// Build a path from segments, each given as its info field and hop fields.
    pub fn from_segments(segments: Vec<(InfoField, Vec<HopField>)>) -> Result<Self> {
        if segments.is_empty() {
            return Err(DecodeError::NoSegments.into());
        }
        if segments.len() > MAX_SEGMENTS {
            return Err(crate::error::Error::InvalidArgument(format!(
                "{} segments (max {MAX_SEGMENTS})",
                segments.len()
            )));
        }

        let mut meta = PathMeta::default();
        let mut info_fields = Vec::with_capacity(segments.len());
        let mut hop_fields = Vec::new();
        for (index, (info, hops)) in segments.into_iter().enumerate() {
            if hops.is_empty() {
                return Err(DecodeError::SegmentGap { index }.into());
            }
            if hops.len() > 0x3f {
                return Err(DecodeError::SegmentTooLong {
                    index,
                    len: hops.len(),
                }
                .into());
            }
            meta.seg_len[index] = hops.len() as u8;
            info_fields.push(info);
            hop_fields.extend(hops);
        }
        if hop_fields.len() > MAX_HOPS {
            return Err(DecodeError::TooManyHops(hop_fields.len()).into());
        }

        Ok(Self {
            meta,
            info_fields,
            hop_fields,
        })
    }

    pub fn num_info_fields(&self) -> usize {
        self.info_fields.len()
    }

    pub fn num_hops(&self) -> usize {
        self.hop_fields.len()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        encoded_len(self.num_info_fields(), self.num_hops())
    }

    pub fn is_empty(&self) -> bool {
        self.hop_fields.is_empty()
    }

    /// Serialize back to the wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; self.len()];
        self.meta.encode(&mut buf[..META_LEN]);

        let mut offset = META_LEN;
        for info in &self.info_fields {
            info.encode(&mut buf[offset..offset + INFO_FIELD_LEN]);
            offset += INFO_FIELD_LEN;
        }
        for hop in &self.hop_fields {
            hop.encode(&mut buf[offset..offset + HOP_FIELD_LEN]);
            offset += HOP_FIELD_LEN;
        }

        buf
    }

    /// Reverse the path so it can be used for the return direction.
    pub fn reverse(&self) -> Self {
        let num_inf = self.num_info_fields();
        let num_hops = self.num_hops();

        let mut info_fields = self.info_fields.clone();
        info_fields.reverse();
        for info in &mut info_fields {
            info.cons_dir = !info.cons_dir;
        }

        let mut seg_len = [0u8; MAX_SEGMENTS];
        for (i, len) in self.meta.seg_len[..num_inf].iter().rev().enumerate() {
            seg_len[i] = *len;
        }

        let mut hop_fields = self.hop_fields.clone();
        hop_fields.reverse();

        Self {
            meta: PathMeta {
                curr_inf: (num_inf.saturating_sub(1) as u8).saturating_sub(self.meta.curr_inf),
                curr_hf: (num_hops.saturating_sub(1) as u8).saturating_sub(self.meta.curr_hf),
                seg_len,
            },
            info_fields,
            hop_fields,
        }
    }

    /// Iterate over segments as (info field, hop fields in traversal order).
    pub fn segments(&self) -> impl Iterator<Item = (&InfoField, &[HopField])> {
        let mut offset = 0;
        self.info_fields
            .iter()
            .zip(self.meta.seg_len.iter())
            .map(move |(info, &len)| {
                let hops = &self.hop_fields[offset..offset + usize::from(len)];
                offset += usize::from(len);
                (info, hops)
            })
    }

    /// Interfaces traversed, in physical order from source to destination.
    ///
    /// Per segment, the first hop contributes only its egress and the last
    /// hop only its ingress; interior hops contribute ingress then egress.
    pub fn interfaces(&self) -> Vec<IfId> {
        let mut ifaces = Vec::with_capacity(2 * self.num_hops());
        for (info, hops) in self.segments() {
            let last = hops.len().saturating_sub(1);
            for (h, hop) in hops.iter().enumerate() {
                let HopInterfaces { ingress, egress } = hop.interfaces(info.cons_dir);
                if h > 0 {
                    ifaces.push(ingress);
                }
                if h < last {
                    ifaces.push(egress);
                }
            }
        }
        ifaces
    }

    /// Per-hop interfaces in traversal direction.
    pub fn hop_interfaces(&self) -> Vec<HopInterfaces> {
        self.segments()
            .flat_map(|(info, hops)| hops.iter().map(|hop| hop.interfaces(info.cons_dir)))
            .collect()
    }

    /// Earliest expiry over all hop fields.
    pub fn expiry(&self) -> SystemTime {
        self.segments()
            .flat_map(|(info, hops)| {
                let base = UNIX_EPOCH + Duration::from_secs(u64::from(info.timestamp));
                hops.iter().map(move |hop| base + hop.lifetime())
            })
            .min()
            .unwrap_or(UNIX_EPOCH)
    }
}

impl fmt::Display for DecodedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ifaces = self.interfaces();
        let rendered: Vec<String> = ifaces
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => format!("{a}>{b}"),
                [a] => a.to_string(),
                _ => String::new(),
            })
            .collect();
        write!(f, "[{}]", rendered.join(" "))
    }
}

fn encoded_len(num_inf: usize, num_hops: usize) -> usize {
    META_LEN + num_inf * INFO_FIELD_LEN + num_hops * HOP_FIELD_LEN
}

/// Decode a raw path into the interfaces it traverses.
///
/// Either the full sequence is returned or the decode error, never a prefix.
pub fn decode_hops(raw: &[u8]) -> Result<Vec<IfId>> {
    Ok(DecodedPath::decode(raw)?.interfaces())
}
