//! Sponsor tiers and image listing

use std::path::{Path, PathBuf};

use tokio::fs;

use super::config::AssetConfig;
use crate::constants::sponsors::IMAGE_EXTENSIONS;
use crate::errors::ServerError;

/// Sponsor tier served under `/sponsors/<tier>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SponsorTier {
    Diamond,
    Platinum,
    Gold,
}

/// Configured sponsor tiers plus the image directory
#[derive(Debug, Clone)]
pub struct SponsorCatalog {
    images_dir: PathBuf,
    diamond: Vec<String>,
    platinum: Vec<String>,
    gold: Vec<String>,
}

impl SponsorCatalog {
    pub fn from_config(config: &AssetConfig) -> Self {
        Self {
            images_dir: config.sponsors_dir.clone(),
            diamond: config.diamond.clone(),
            platinum: config.platinum.clone(),
            gold: config.gold.clone(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Image file names configured for `tier`
    pub fn tier(&self, tier: SponsorTier) -> &[String] {
        match tier {
            SponsorTier::Diamond => &self.diamond,
            SponsorTier::Platinum => &self.platinum,
            SponsorTier::Gold => &self.gold,
        }
    }

    /// Every image under the sponsor directory, as sorted relative paths
    ///
    /// Subdirectories are walked; paths use `/` separators so they can be
    /// appended to `/sponsors/images/` directly.
    pub async fn list_images(&self) -> Result<Vec<String>, ServerError> {
        let listing_error = |path: &Path, source| ServerError::SponsorListing {
            path: path.to_path_buf(),
            source,
        };

        let mut images = Vec::new();
        let mut pending = vec![self.images_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| listing_error(&dir, e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| listing_error(&dir, e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| listing_error(&path, e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if is_image(&path) {
                    if let Ok(relative) = path.strip_prefix(&self.images_dir) {
                        let components: Vec<_> = relative
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy().into_owned())
                            .collect();
                        images.push(components.join("/"));
                    }
                }
            }
        }

        images.sort();
        Ok(images)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}
