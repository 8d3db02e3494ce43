use crate::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::result::ZipError;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl Compression {
    pub fn compression_method(self) -> CompressionMethod {
        match self {
            Self::Stored => CompressionMethod::Stored,
            Self::Deflated => CompressionMethod::Deflated,
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(compression: &str) -> Result<Self, Self::Err> {
        Ok(match compression {
            "stored" => Self::Stored,
            "deflated" => Self::Deflated,
            _ => return Err(format!("unsupported compression {}", compression)),
        })
    }
}

/// Zip archive built in memory.
///
/// Entry names are unique. [`IconArchive::finish`] consumes the writer, so a
/// finished archive can't be written to again.
pub struct IconArchive {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
    compression: Compression,
}

impl IconArchive {
    pub fn new(compression: Compression) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(vec![])),
            names: HashSet::new(),
            compression,
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if !self.names.insert(name.to_string()) {
            return Err(ZipError::InvalidArchive("duplicate entry name").into());
        }
        let opts =
            FileOptions::default().compression_method(self.compression.compression_method());
        self.zip.start_file(name, opts)?;
        self.zip.write_all(bytes).map_err(ZipError::Io)?;
        tracing::trace!("added {} ({} bytes)", name, bytes.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}
