use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::video::domain::video_source::VideoSource;

#[derive(Debug, Error)]
pub enum ImageSourceError {
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),

    #[error("no image files in {0}")]
    NoImages(PathBuf),

    #[error("failed to read directory {path}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Frame source backed by still images.
///
/// A single file repeats forever; a directory becomes a looping sequence of
/// its image files in name order. Frames are decoded on demand, so long
/// sequences never sit in memory at once.
#[derive(Debug)]
pub struct ImageSource {
    paths: Vec<PathBuf>,
    dimensions: (u32, u32),
    cursor: usize,
    index: usize,
}

impl ImageSource {
    pub fn open(path: &Path) -> Result<Self, ImageSourceError> {
        if !path.exists() {
            return Err(ImageSourceError::NotFound(path.to_path_buf()));
        }
        let paths = if path.is_dir() {
            let mut found = Vec::new();
            let entries = std::fs::read_dir(path).map_err(|source| ImageSourceError::ReadDir {
                path: path.to_path_buf(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| ImageSourceError::ReadDir {
                    path: path.to_path_buf(),
                    source,
                })?;
                if is_image_file(&entry.path()) {
                    found.push(entry.path());
                }
            }
            if found.is_empty() {
                return Err(ImageSourceError::NoImages(path.to_path_buf()));
            }
            found.sort();
            found
        } else {
            vec![path.to_path_buf()]
        };

        let first = image::open(&paths[0]).map_err(|source| ImageSourceError::Decode {
            path: paths[0].clone(),
            source,
        })?;
        Ok(Self {
            dimensions: (first.width(), first.height()),
            paths,
            cursor: 0,
            index: 0,
        })
    }

    /// Number of distinct images in one pass of the loop.
    pub fn frame_count(&self) -> usize {
        self.paths.len()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl VideoSource for ImageSource {
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let path = &self.paths[self.cursor];
        let image = image::open(path).map_err(|source| ImageSourceError::Decode {
            path: path.clone(),
            source,
        })?;
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        let frame = Frame::new(rgb.into_raw(), width, height, 3, self.index);
        self.cursor = (self.cursor + 1) % self.paths.len();
        self.index += 1;
        Ok(Some(frame))
    }
}
