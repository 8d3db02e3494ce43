use crate::{Error, Result};
use std::collections::HashSet;

const IPHONE_POINTS: [u32; 7] = [29, 40, 50, 57, 60, 72, 76];

const IPHONE_SCALE: [(&str, u32); 3] = [("", 1), ("@2x", 2), ("@3x", 3)];

pub const DPI_LABEL: [&str; 6] = ["ldpi", "mdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi"];

pub const DPI_SIZE: [u32; 6] = [36, 48, 72, 96, 144, 192];

/// One named square icon size.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    label: String,
    size: u32,
}

impl Entry {
    pub fn new(label: impl Into<String>, size: u32) -> Self {
        Self {
            label: label.into(),
            size,
        }
    }

    /// File name suffix of the icon, including the `.png` extension.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Width and height in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Immutable table of icon sizes an image is packed into.
///
/// The default catalog covers the iOS icon sizes at 1x, 2x and 3x scale and
/// the Android launcher density buckets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SizeCatalog {
    entries: Vec<Entry>,
}

impl SizeCatalog {
    pub fn new(entries: Vec<Entry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Catalog("catalog has no entries".into()));
        }
        let mut labels = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if entry.label.is_empty() {
                return Err(Error::Catalog("empty label".into()));
            }
            if entry.size == 0 {
                return Err(Error::Catalog(format!("{} has a size of 0", entry.label)));
            }
            if !labels.insert(entry.label.as_str()) {
                return Err(Error::Catalog(format!("duplicate label {}", entry.label)));
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SizeCatalog {
    fn default() -> Self {
        let mut entries = vec![];
        for (suffix, scale) in IPHONE_SCALE {
            for points in IPHONE_POINTS {
                entries.push(Entry::new(
                    format!("iphone-{}{}.png", points, suffix),
                    points * scale,
                ));
            }
        }
        for (label, size) in DPI_LABEL.iter().zip(DPI_SIZE) {
            entries.push(Entry::new(format!("android-{}.png", label), size));
        }
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a SizeCatalog {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
