/// Avatar lookup by bare address
use crate::error::Result;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait AvatarResolver: Send + Sync {
    /// Picture for a contact, or `None` when there is nothing to show
    fn avatar(&self, address: &str) -> Option<DynamicImage>;
}

/// Never has an avatar
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAvatars;

impl AvatarResolver for NoAvatars {
    fn avatar(&self, _address: &str) -> Option<DynamicImage> {
        None
    }
}

/// Avatars stored as `<dir>/<address>.png`, with an optional default logo
/// for contacts that have none.
pub struct DirectoryAvatars {
    dir: PathBuf,
    default_logo: Option<DynamicImage>,
}

impl DirectoryAvatars {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            default_logo: None,
        }
    }

    pub fn with_default_logo(mut self, logo: DynamicImage) -> Self {
        self.default_logo = Some(logo);
        self
    }

    /// Load the default logo from disk
    pub fn with_default_logo_file(self, path: &Path) -> Result<Self> {
        let logo = image::open(path)?;
        Ok(self.with_default_logo(logo))
    }

    fn path_for(&self, address: &str) -> Option<PathBuf> {
        // Addresses come from the network; keep them inside the directory
        if address.is_empty()
            || address.contains(['/', '\\'])
            || address.starts_with('.')
        {
            return None;
        }
        Some(self.dir.join(format!("{}.png", address)))
    }
}

impl AvatarResolver for DirectoryAvatars {
    fn avatar(&self, address: &str) -> Option<DynamicImage> {
        let stored = self.path_for(address).filter(|p| p.is_file()).and_then(|path| {
            match image::open(&path) {
                Ok(img) => Some(img),
                Err(e) => {
                    warn!("Unreadable avatar {}: {}", path.display(), e);
                    None
                }
            }
        });
        if stored.is_none() {
            debug!("No avatar for {}, using default", address);
        }
        stored.or_else(|| self.default_logo.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn logo() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 255, 255])))
    }

    #[test]
    fn test_loads_png_by_address() {
        let dir = tempfile::tempdir().unwrap();
        let img = RgbaImage::from_pixel(2, 3, Rgba([5, 6, 7, 8]));
        img.save(dir.path().join("alice@example.com.png")).unwrap();

        let avatars = DirectoryAvatars::new(dir.path());
        let found = avatars.avatar("alice@example.com").unwrap();
        assert_eq!((found.width(), found.height()), (2, 3));
    }

    #[test]
    fn test_missing_avatar_uses_default_logo() {
        let dir = tempfile::tempdir().unwrap();
        let avatars = DirectoryAvatars::new(dir.path());
        assert!(avatars.avatar("nobody@example.com").is_none());

        let avatars = avatars.with_default_logo(logo());
        let found = avatars.avatar("nobody@example.com").unwrap();
        assert_eq!(found.width(), 1);
    }

    #[test]
    fn test_rejects_path_escape() {
        let dir = tempfile::tempdir().unwrap();
        let avatars = DirectoryAvatars::new(dir.path());
        assert!(avatars.path_for("../etc/passwd").is_none());
        assert!(avatars.path_for("a/b").is_none());
        assert!(avatars.path_for("").is_none());
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x@y.png"), b"not a png").unwrap();
        let avatars = DirectoryAvatars::new(dir.path()).with_default_logo(logo());
        assert_eq!(avatars.avatar("x@y").unwrap().width(), 1);
    }
}
