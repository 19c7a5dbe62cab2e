use std::path::Path;

use async_trait::async_trait;

use super::AssetProbe;

/// Checks the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAssetProbe;

#[async_trait]
impl AssetProbe for FsAssetProbe {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
