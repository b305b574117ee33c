use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::{fs::File, io::AsyncWriteExt};

pub const IMAGE_FILE: &str = "room.png";
pub const MODEL_FILE: &str = "model.glb";

/// URL paths under which the static file service exposes the two outputs.
pub const IMAGE_URL_PATH: &str = "/room.png";
pub const MODEL_URL_PATH: &str = "/model.glb";

/// The two output files, kept at fixed names inside the public directory.
///
/// Every write replaces the previous file. Concurrent requests race on the
/// same paths; nothing here serialises them.
#[derive(Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl StorageService {
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create public dir at {}", root.display()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_path(&self) -> PathBuf {
        self.root.join(IMAGE_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.root.join(MODEL_FILE)
    }

    pub async fn write_image(&self, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.image_path();
        overwrite(&path, bytes).await?;
        Ok(path)
    }

    pub async fn read_image(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.image_path()).await
    }

    pub async fn write_model(&self, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.model_path();
        overwrite(&path, bytes).await?;
        Ok(path)
    }
}

async fn overwrite(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await
}
