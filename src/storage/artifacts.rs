use super::{StorageError, StorageResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const HD_DIR: &str = "hd";
const THUMBNAILS_DIR: &str = "thumbnails";
const HD_EXTENSION: &str = "png";
const THUMBNAIL_EXTENSION: &str = "jpg";

/// Public URL prefix under which the artifact tree is served
const URL_PREFIX: &str = "/screenshots";

/// Root of the on-disk artifact tree
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths for one job; nothing is created until [`JobArtifacts::prepare`]
    pub fn for_job(&self, job_id: Uuid) -> JobArtifacts {
        JobArtifacts {
            job_id,
            dir: self.root.join(job_id.to_string()),
        }
    }
}

/// Artifact locations of a single job
#[derive(Debug, Clone)]
pub struct JobArtifacts {
    job_id: Uuid,
    dir: PathBuf,
}

impl JobArtifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the job directory and its `hd/` and `thumbnails/` folders
    pub async fn prepare(&self) -> StorageResult<()> {
        for sub in [HD_DIR, THUMBNAILS_DIR] {
            let path = self.dir.join(sub);
            tokio::fs::create_dir_all(&path)
                .await
                .map_err(|source| StorageError::CreateDir { path, source })?;
        }
        tracing::debug!("Prepared artifact directory {}", self.dir.display());
        Ok(())
    }

    pub fn full_image_path(&self, screenshot_id: Uuid) -> PathBuf {
        self.dir
            .join(HD_DIR)
            .join(format!("{}.{}", screenshot_id, HD_EXTENSION))
    }

    pub fn thumbnail_path(&self, screenshot_id: Uuid) -> PathBuf {
        self.dir
            .join(THUMBNAILS_DIR)
            .join(format!("{}.{}", screenshot_id, THUMBNAIL_EXTENSION))
    }

    /// Public locator for the full-size image
    pub fn full_image_url(&self, screenshot_id: Uuid) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            URL_PREFIX, self.job_id, HD_DIR, screenshot_id, HD_EXTENSION
        )
    }

    /// Public locator for the thumbnail
    pub fn thumbnail_url(&self, screenshot_id: Uuid) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            URL_PREFIX, self.job_id, THUMBNAILS_DIR, screenshot_id, THUMBNAIL_EXTENSION
        )
    }

    pub async fn write_full_image(&self, screenshot_id: Uuid, bytes: &[u8]) -> StorageResult<PathBuf> {
        write(self.full_image_path(screenshot_id), bytes).await
    }

    pub async fn write_thumbnail(&self, screenshot_id: Uuid, bytes: &[u8]) -> StorageResult<PathBuf> {
        write(self.thumbnail_path(screenshot_id), bytes).await
    }
}

async fn write(path: PathBuf, bytes: &[u8]) -> StorageResult<PathBuf> {
    match tokio::fs::write(&path, bytes).await {
        Ok(()) => Ok(path),
        Err(source) => Err(StorageError::Write { path, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths_are_job_scoped() {
        let store = ArtifactStore::new("/data/shots");
        let job = Uuid::new_v4();
        let shot = Uuid::new_v4();
        let artifacts = store.for_job(job);

        assert_eq!(
            artifacts.full_image_path(shot),
            PathBuf::from(format!("/data/shots/{}/hd/{}.png", job, shot))
        );
        assert_eq!(
            artifacts.thumbnail_path(shot),
            PathBuf::from(format!("/data/shots/{}/thumbnails/{}.jpg", job, shot))
        );
    }

    #[test]
    fn test_urls() {
        let store = ArtifactStore::new("/anywhere");
        let job = Uuid::new_v4();
        let shot = Uuid::new_v4();
        let artifacts = store.for_job(job);

        assert_eq!(
            artifacts.thumbnail_url(shot),
            format!("/screenshots/{}/thumbnails/{}.jpg", job, shot)
        );
        assert_eq!(
            artifacts.full_image_url(shot),
            format!("/screenshots/{}/hd/{}.png", job, shot)
        );
    }

    #[tokio::test]
    async fn test_prepare_and_write() {
        let tmp = TempDir::new().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let artifacts = store.for_job(Uuid::new_v4());
        let shot = Uuid::new_v4();

        artifacts.prepare().await.unwrap();
        assert!(artifacts.dir().join("hd").is_dir());
        assert!(artifacts.dir().join("thumbnails").is_dir());

        let full = artifacts.write_full_image(shot, b"png-bytes").await.unwrap();
        let thumb = artifacts.write_thumbnail(shot, b"jpg-bytes").await.unwrap();

        assert_eq!(std::fs::read(full).unwrap(), b"png-bytes");
        assert_eq!(std::fs::read(thumb).unwrap(), b"jpg-bytes");
    }

    #[tokio::test]
    async fn test_write_without_prepare_fails() {
        let tmp = TempDir::new().unwrap();
        let artifacts = ArtifactStore::new(tmp.path()).for_job(Uuid::new_v4());

        let result = artifacts.write_full_image(Uuid::new_v4(), b"x").await;
        assert!(matches!(result, Err(StorageError::Write { .. })));
    }
}
