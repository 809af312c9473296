use crate::config::MurmurPaths;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stores post images under the media directory and resolves them back
/// for serving. Stored names are freshly minted UUIDs, so a resolved
/// name can never climb out of the directory.
#[derive(Clone)]
pub struct MediaService {
    paths: MurmurPaths,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn is_image(&self) -> bool {
        !self.data.is_empty() && infer::is_image(&self.data)
    }
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
}

impl MediaService {
    pub fn new(paths: MurmurPaths) -> Self {
        Self { paths }
    }

    pub fn save_image(&self, upload: &ImageUpload) -> Result<StoredImage> {
        if upload.data.is_empty() {
            return Err(anyhow!("image data may not be empty"));
        }

        let id = Uuid::new_v4().to_string();
        let extension = upload
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension().and_then(|ext| ext.to_str()))
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
            .or_else(|| infer::get(&upload.data).map(|kind| kind.extension().to_string()));

        let stored_name = match extension {
            Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
            _ => id,
        };

        std::fs::create_dir_all(&self.paths.media_dir).with_context(|| {
            format!(
                "failed to create media directory {}",
                self.paths.media_dir.display()
            )
        })?;
        let absolute_path = self.paths.media_dir.join(&stored_name);
        std::fs::write(&absolute_path, &upload.data)
            .with_context(|| format!("failed to write image to {}", absolute_path.display()))?;

        tracing::debug!(file = %stored_name, bytes = upload.data.len(), "stored image");

        Ok(StoredImage {
            file_name: stored_name,
        })
    }

    /// Path of a previously stored image, or `None` for unknown or
    /// suspicious names.
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        if file_name.is_empty()
            || file_name.contains('/')
            || file_name.contains('\\')
            || file_name.contains("..")
        {
            return None;
        }
        let path = self.paths.media_dir.join(file_name);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // 1x1 transparent GIF, enough for `infer` to recognize the format.
    pub(crate) const TINY_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn service() -> (tempfile::TempDir, MediaService) {
        let dir = tempdir().expect("tempdir");
        let paths = MurmurPaths::from_base_dir(dir.path()).expect("paths");
        (dir, MediaService::new(paths))
    }

    #[test]
    fn stores_and_resolves_an_image() {
        let (_dir, service) = service();
        let upload = ImageUpload {
            file_name: Some("small.gif".into()),
            data: TINY_GIF.to_vec(),
        };
        assert!(upload.is_image());

        let stored = service.save_image(&upload).expect("save");
        assert!(stored.file_name.ends_with(".gif"));

        let path = service.resolve(&stored.file_name).expect("resolve");
        assert_eq!(std::fs::read(path).expect("read back"), TINY_GIF);
    }

    #[test]
    fn rejects_traversal_names() {
        let (_dir, service) = service();
        assert!(service.resolve("../etc/passwd").is_none());
        assert!(service.resolve("a/b.gif").is_none());
        assert!(service.resolve("").is_none());
    }

    #[test]
    fn text_payload_is_not_an_image() {
        let upload = ImageUpload {
            file_name: Some("note.txt".into()),
            data: b"just text".to_vec(),
        };
        assert!(!upload.is_image());
    }
}
