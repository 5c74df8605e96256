//! System ROM image handling.
//!
//! The C64 environment needs three fixed-size images: kernal (8 KiB),
//! basic (8 KiB) and chargen (4 KiB). A [`RomSet`] may be partial; the
//! caller decides whether that is acceptable.

use std::path::Path;

use crate::error::{Result, SidError};

/// Expected kernal image size in bytes.
pub const KERNAL_LEN: usize = 8192;

/// Expected basic image size in bytes.
pub const BASIC_LEN: usize = 8192;

/// Expected chargen image size in bytes.
pub const CHARGEN_LEN: usize = 4096;

/// The three system ROM images, each possibly absent.
#[derive(Debug, Clone, Default)]
pub struct RomSet {
    kernal: Option<Vec<u8>>,
    basic: Option<Vec<u8>>,
    chargen: Option<Vec<u8>>,
}

impl RomSet {
    /// Load all three images from `dir`.
    ///
    /// Returns the (possibly partial) set plus one [`SidError::RomImage`]
    /// per missing or wrongly sized image, so the caller can choose
    /// between strict failure and logged degradation.
    pub fn load(dir: &Path) -> (RomSet, Vec<SidError>) {
        let mut set = RomSet::default();
        let mut problems = Vec::new();

        match read_image(dir, "kernal.bin", KERNAL_LEN) {
            Ok(image) => set.kernal = Some(image),
            Err(e) => problems.push(e),
        }
        match read_image(dir, "basic.bin", BASIC_LEN) {
            Ok(image) => set.basic = Some(image),
            Err(e) => problems.push(e),
        }
        match read_image(dir, "chargen.bin", CHARGEN_LEN) {
            Ok(image) => set.chargen = Some(image),
            Err(e) => problems.push(e),
        }

        (set, problems)
    }

    /// Whether every image is present with its expected size.
    pub fn is_complete(&self) -> bool {
        self.kernal.is_some() && self.basic.is_some() && self.chargen.is_some()
    }
}

fn read_image(dir: &Path, name: &str, expected: usize) -> Result<Vec<u8>> {
    let path = dir.join(name);
    let bytes = std::fs::read(&path).map_err(|e| SidError::RomImage {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() != expected {
        return Err(SidError::RomImage {
            name: name.to_string(),
            reason: format!("expected {expected} bytes, got {}", bytes.len()),
        });
    }
    Ok(bytes)
}
