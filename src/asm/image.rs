//! Raw binary images.
//!
//! An image is a plain byte file loaded at address 0. Program files ending
//! in `.asm` are assembled on load.

use crate::asm::assembler::{assemble, AssemblerError, MAX_IMAGE_SIZE};
use log::debug;
use std::path::Path;
use thiserror::Error;

/// Load a raw image from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| ImageError::IoError(e.to_string()))?;
    check_size(bytes.len())?;
    debug!("loaded {} bytes from {}", bytes.len(), path.as_ref().display());
    Ok(bytes)
}

/// Save a raw image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ImageError> {
    check_size(bytes.len())?;
    std::fs::write(path.as_ref(), bytes).map_err(|e| ImageError::IoError(e.to_string()))
}

/// Load a program: `.asm` files are assembled, anything else is read raw.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let path = path.as_ref();
    if is_source(path) {
        let source = std::fs::read_to_string(path).map_err(|e| ImageError::IoError(e.to_string()))?;
        Ok(assemble(&source)?)
    } else {
        load_image(path)
    }
}

/// True for assembler source files.
pub fn is_source(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("asm"))
}

fn check_size(size: usize) -> Result<(), ImageError> {
    if size > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge { size });
    }
    Ok(())
}

/// Errors that can occur loading or saving images.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("image too large: {size} bytes (maximum 65536)")]
    TooLarge { size: usize },

    #[error(transparent)]
    Assembler(#[from] AssemblerError),
}
