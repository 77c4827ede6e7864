use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::canvas::Canvas;

/// Destination of a finished frame.
pub trait Sink {
    fn present(&self, canvas: &Canvas) -> Result<()>;
}

/// 1-bit grayscale PNG on disk.
pub struct PngFile {
    pub path: PathBuf,
}

impl Sink for PngFile {
    fn present(&self, canvas: &Canvas) -> Result<()> {
        let png = canvas.encode_png()?;
        fs::write(&self.path, &png).with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::info!("Wrote {} ({} bytes)", self.path.display(), png.len());
        Ok(())
    }
}

/// Packed frame buffer, the layout e-paper drivers take as is.
pub struct RawFrame {
    pub path: PathBuf,
}

impl Sink for RawFrame {
    fn present(&self, canvas: &Canvas) -> Result<()> {
        fs::write(&self.path, canvas.raw()).with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::info!("Wrote raw frame to {}", self.path.display());
        Ok(())
    }
}
