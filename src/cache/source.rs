//! Path source: the external service answering path queries.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{LookupError, Result};
use crate::path::Path;
use crate::types::IsdAsn;

/// Capability to look up the current paths to a destination.
///
/// Implementations own discovery, probing and cancellation. Failures are
/// reported as [`crate::Error::Lookup`].
#[async_trait]
pub trait PathSource: Send + Sync {
    async fn query_paths(&self, dst: IsdAsn) -> Result<Vec<Path>>;
}

/// In-memory path source with a fixed answer per destination.
#[derive(Debug, Default)]
pub struct StaticPathSource {
    paths: RwLock<HashMap<IsdAsn, Vec<Path>>>,
}

impl StaticPathSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the answer for `dst`.
    pub fn set_paths(&self, dst: IsdAsn, paths: Vec<Path>) {
        self.paths.write().insert(dst, paths);
    }

    /// Forget `dst`; later queries fail.
    pub fn remove(&self, dst: IsdAsn) {
        self.paths.write().remove(&dst);
    }
}

#[async_trait]
impl PathSource for StaticPathSource {
    async fn query_paths(&self, dst: IsdAsn) -> Result<Vec<Path>> {
        self.paths
            .read()
            .get(&dst)
            .cloned()
            .ok_or_else(|| {
                LookupError::Unreachable {
                    dst,
                    reason: "destination not configured".into(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::path::ForwardingPath;

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticPathSource::new();
        let dst: IsdAsn = "1-ff00:0:110".parse().unwrap();

        assert!(matches!(
            source.query_paths(dst).await,
            Err(Error::Lookup(LookupError::Unreachable { .. }))
        ));

        let path = Path::new(dst, dst, ForwardingPath::Empty, None).unwrap();
        source.set_paths(dst, vec![path]);
        assert_eq!(source.query_paths(dst).await.unwrap().len(), 1);

        source.remove(dst);
        assert!(source.query_paths(dst).await.is_err());
    }
}
