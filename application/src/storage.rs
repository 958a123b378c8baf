//! Local file [`Storage`] for uploaded [`Car`] images.
//!
//! [`Car`]: service::domain::Car

use std::{io, path::PathBuf, sync::Arc};

use service::domain::car;
use uuid::Uuid;

/// Storage of uploaded [`Car`] images on the local filesystem.
///
/// Each upload is stored under a unique name, returned to the caller as a
/// stable [`car::ImageFile`] reference.
///
/// [`Car`]: service::domain::Car
#[derive(Clone, Debug)]
pub struct Storage {
    /// Root directory the uploads are stored in.
    root: Arc<PathBuf>,
}

impl Storage {
    /// Initializes a new [`Storage`] rooted at the provided directory,
    /// creating it if absent.
    ///
    /// # Errors
    ///
    /// If the directory cannot be created.
    pub async fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root: Arc::new(root),
        })
    }

    /// Saves the provided `content` under a unique name derived from the
    /// original `file_name`, and returns its reference.
    ///
    /// # Errors
    ///
    /// If the file cannot be written.
    pub async fn save(
        &self,
        file_name: &str,
        content: &[u8],
    ) -> io::Result<car::ImageFile> {
        let file = car::ImageFile::new(format!(
            "{}_{}",
            Uuid::new_v4(),
            sanitize(file_name),
        ))
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid file name")
        })?;

        let name: &str = file.as_ref();
        tokio::fs::write(self.root.join(name), content).await?;

        Ok(file)
    }

    /// Deletes the file the provided reference points at.
    ///
    /// Deleting an already missing file is not an error.
    ///
    /// # Errors
    ///
    /// If the file cannot be removed.
    pub async fn delete(&self, file: &car::ImageFile) -> io::Result<()> {
        let name: &str = file.as_ref();
        match tokio::fs::remove_file(self.root.join(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Replaces every character unsafe for a file name with an underscore.
fn sanitize(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod spec {
    use super::sanitize;

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize("photo.png"), "photo.png");
        assert_eq!(sanitize("my car.png"), "my_car.png");
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
    }
}
