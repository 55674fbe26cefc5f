//! Path performance metadata and normalized accessors.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::types::PathInterface;

/// Metadata reported by the path source for one path.
///
/// Latency and bandwidth are per hop; `None` marks a value the source did
/// not report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMetadata {
    /// Interfaces traversed, qualified by routing domain.
    pub interfaces: Vec<PathInterface>,
    /// Path MTU in bytes.
    pub mtu: u16,
    /// Latency per hop.
    pub latency: Vec<Option<Duration>>,
    /// Bandwidth per hop in Kbit/s.
    pub bandwidth_kbps: Vec<Option<u64>>,
    /// Absolute expiry of the path.
    pub expiry: SystemTime,
}

impl PathMetadata {
    pub fn new(interfaces: Vec<PathInterface>, mtu: u16, expiry: SystemTime) -> Self {
        Self {
            interfaces,
            mtu,
            latency: Vec::new(),
            bandwidth_kbps: Vec::new(),
            expiry,
        }
    }

    /// Set per-hop latencies.
    pub fn with_latency(mut self, latency: Vec<Option<Duration>>) -> Self {
        self.latency = latency;
        self
    }

    /// Set per-hop bandwidths in Kbit/s.
    pub fn with_bandwidth_kbps(mut self, bandwidth: Vec<Option<u64>>) -> Self {
        self.bandwidth_kbps = bandwidth;
        self
    }

    pub fn mtu(&self) -> usize {
        usize::from(self.mtu)
    }

    /// Latency at hop `index`.
    pub fn latency(&self, index: usize) -> Result<Option<Duration>> {
        self.latency.get(index).copied().ok_or(Error::Bounds {
            index,
            len: self.latency.len(),
        })
    }

    /// Bandwidth at hop `index` in bits per second.
    pub fn bandwidth_bps(&self, index: usize) -> Result<Option<u64>> {
        self.bandwidth_kbps
            .get(index)
            .copied()
            .map(|bw| bw.map(|kbps| kbps.saturating_mul(1000)))
            .ok_or(Error::Bounds {
                index,
                len: self.bandwidth_kbps.len(),
            })
    }

    /// Expiry truncated to whole seconds.
    pub fn expiry(&self) -> SystemTime {
        let secs = self
            .expiry
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expiry
    }

    /// Sum of all hop latencies, `None` if any hop is unknown.
    pub fn total_latency(&self) -> Option<Duration> {
        self.latency.iter().copied().sum()
    }

    /// Bottleneck bandwidth in bits per second over the hops that reported one.
    pub fn min_bandwidth_bps(&self) -> Option<u64> {
        self.bandwidth_kbps
            .iter()
            .flatten()
            .min()
            .map(|kbps| kbps.saturating_mul(1000))
    }
}
