use image::error::{LimitError, LimitErrorKind};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, ImageReader};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::Path;

mod archive;
mod catalog;
mod error;
mod fit;

pub use crate::archive::{Compression, IconArchive};
pub use crate::catalog::{Entry, SizeCatalog};
pub use crate::error::{Error, Result};
pub use crate::fit::fit;

const DEFAULT_BASE_NAME: &str = "icon";

/// Returns the file name without directories and without its extension.
///
/// Both `/` and `\` separate directories since browsers may send either.
pub fn base_name(file_name: &str) -> &str {
    let name = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    };
    if stem.is_empty() {
        DEFAULT_BASE_NAME
    } else {
        stem
    }
}

/// A decoded image to produce icons from.
#[derive(Debug)]
pub struct SourceImage {
    name: String,
    img: DynamicImage,
}

impl SourceImage {
    pub fn new(file_name: &str, img: DynamicImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Decode(ImageError::Limits(LimitError::from_kind(
                LimitErrorKind::DimensionError,
            ))));
        }
        Ok(Self {
            name: base_name(file_name).to_string(),
            img,
        })
    }

    /// Decodes `bytes`, guessing the format from the content.
    pub fn decode(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| Error::Decode(ImageError::IoError(err)))?
            .decode()
            .map_err(Error::Decode)?;
        Self::new(file_name, img)
    }

    /// Reads and decodes a local file. Failing to read the file is an
    /// [`Error::Read`], not a decode error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(Error::Read)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        Self::decode(&file_name, &bytes)
    }

    pub fn base_name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.img
    }

    /// Name of the archive entry for a catalog label.
    pub fn entry_name(&self, label: &str) -> String {
        format!("{}-{}", self.name, label)
    }

    /// File name the archive is served as.
    pub fn archive_name(&self) -> String {
        format!("{}.icon.zip", self.name)
    }
}

pub trait Encoder: Send + Sync {
    fn encode(&self, icon: &DynamicImage) -> image::ImageResult<Vec<u8>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Png;

impl Encoder for Png {
    fn encode(&self, icon: &DynamicImage) -> image::ImageResult<Vec<u8>> {
        let (width, height) = icon.dimensions();
        let mut buf = Cursor::new(Vec::with_capacity(width as usize * height as usize * 4));
        icon.write_to(&mut buf, ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// One encoded icon.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Icon {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Resizes a source image into every size of a [`SizeCatalog`] and packs the
/// results into a zip archive.
///
/// If any icon fails to render the whole operation fails with the error of
/// the first failing entry in catalog order. No partial archive is produced.
pub struct IconPackager<E = Png> {
    catalog: SizeCatalog,
    encoder: E,
    compression: Compression,
    parallel: bool,
}

impl IconPackager<Png> {
    pub fn new(catalog: SizeCatalog) -> Self {
        Self::with_encoder(catalog, Png)
    }
}

impl Default for IconPackager<Png> {
    fn default() -> Self {
        Self::new(SizeCatalog::default())
    }
}

impl<E: Encoder> IconPackager<E> {
    pub fn with_encoder(catalog: SizeCatalog, encoder: E) -> Self {
        Self {
            catalog,
            encoder,
            compression: Compression::default(),
            parallel: true,
        }
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Renders the icons on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn catalog(&self) -> &SizeCatalog {
        &self.catalog
    }

    pub fn render_icon(&self, source: &SourceImage, entry: &Entry) -> Result<Icon> {
        let (orig_width, orig_height) = source.dimensions();
        let (width, height) = fit(orig_width, orig_height, entry.size(), entry.size());
        let icon = source
            .image()
            .resize_exact(width, height, FilterType::Lanczos3);
        let bytes = self.encoder.encode(&icon).map_err(|source| Error::Encode {
            label: entry.label().to_string(),
            source,
        })?;
        tracing::debug!(
            "rendered {} {}x{} ({} bytes)",
            entry.label(),
            width,
            height,
            bytes.len()
        );
        Ok(Icon {
            name: source.entry_name(entry.label()),
            width,
            height,
            bytes,
        })
    }

    /// Renders every catalog entry, in catalog order.
    pub fn render(&self, source: &SourceImage) -> Result<Vec<Icon>> {
        // collect every result before short-circuiting, rayon's own
        // `Result` collect may report any failing entry instead of the first
        let icons: Vec<Result<Icon>> = if self.parallel {
            self.catalog
                .entries()
                .par_iter()
                .map(|entry| self.render_icon(source, entry))
                .collect()
        } else {
            self.catalog
                .iter()
                .map(|entry| self.render_icon(source, entry))
                .collect()
        };
        icons.into_iter().collect()
    }

    pub fn pack(&self, source: &SourceImage) -> Result<Vec<u8>> {
        let icons = self.render(source)?;
        let mut archive = IconArchive::new(self.compression);
        for icon in &icons {
            archive.add(&icon.name, &icon.bytes)?;
        }
        tracing::debug!("packed {} icons for {}", archive.len(), source.base_name());
        archive.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use zip::ZipArchive;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut buf = Cursor::new(vec![]);
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn catalog(entries: &[(&str, u32)]) -> SizeCatalog {
        SizeCatalog::new(
            entries
                .iter()
                .map(|(label, size)| Entry::new(*label, *size))
                .collect(),
        )
        .unwrap()
    }

    struct FailOn(u32);

    impl Encoder for FailOn {
        fn encode(&self, icon: &DynamicImage) -> image::ImageResult<Vec<u8>> {
            if icon.width() == self.0 {
                return Err(ImageError::Limits(LimitError::from_kind(
                    LimitErrorKind::InsufficientMemory,
                )));
            }
            Png.encode(icon)
        }
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("logo.jpg"), "logo");
        assert_eq!(base_name("art.png"), "art");
        assert_eq!(base_name("archive.tar.gz"), "archive.tar");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(base_name("dir/sub/logo.png"), "logo");
        assert_eq!(base_name("C:\\Users\\me\\logo.png"), "logo");
        assert_eq!(base_name(""), "icon");
        assert_eq!(base_name(".png"), "icon");
    }

    #[test]
    fn test_names() {
        let source = SourceImage::decode("logo.jpg", &png(4, 4)).unwrap();
        assert_eq!(source.entry_name("iphone-60@2x.png"), "logo-iphone-60@2x.png");
        assert_eq!(source.archive_name(), "logo.icon.zip");
    }

    #[test]
    fn test_landscape_entry() {
        let source = SourceImage::decode("art.png", &png(1000, 500)).unwrap();
        let packager = IconPackager::default();
        let entry = Entry::new("android-xxxhdpi.png", 192);
        let icon = packager.render_icon(&source, &entry).unwrap();
        assert_eq!(icon.name, "art-android-xxxhdpi.png");
        assert_eq!((icon.width, icon.height), (192, 96));
        let decoded =
            image::load_from_memory_with_format(&icon.bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (192, 96));
    }

    #[test]
    fn test_square_entry() {
        let source = SourceImage::decode("square.png", &png(100, 100)).unwrap();
        let icon = IconPackager::default()
            .render_icon(&source, &Entry::new("iphone-29.png", 29))
            .unwrap();
        assert_eq!((icon.width, icon.height), (29, 29));
    }

    #[test]
    fn test_source_is_not_mutated() {
        let source = SourceImage::decode("logo.png", &png(64, 32)).unwrap();
        let before = source.image().clone();
        IconPackager::default().render(&source).unwrap();
        assert_eq!(source.dimensions(), (64, 32));
        assert_eq!(source.image(), &before);
    }

    #[test]
    fn test_decode_error() {
        let err = SourceImage::decode("notes.png", b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.is_client_error());

        let mut truncated = png(32, 32);
        truncated.truncate(40);
        let err = SourceImage::decode("broken.png", &truncated).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_empty_image() {
        let err = SourceImage::new("empty.png", DynamicImage::new_rgba8(0, 0)).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let path = std::env::temp_dir().join("iconpack-does-not-exist.png");
        let err = SourceImage::open(&path).unwrap_err();
        assert!(matches!(err, Error::Read(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_open() {
        let path = std::env::temp_dir().join(format!("iconpack-open-{}.png", std::process::id()));
        std::fs::write(&path, png(12, 6)).unwrap();
        let source = SourceImage::open(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(source.dimensions(), (12, 6));
        assert!(source.base_name().starts_with("iconpack-open-"));
    }

    #[test]
    fn test_first_failing_entry_aborts() {
        let catalog = catalog(&[("a.png", 16), ("b.png", 29), ("c.png", 48), ("d.png", 29)]);
        let source = SourceImage::decode("logo.png", &png(64, 64)).unwrap();
        for parallel in [false, true] {
            let packager =
                IconPackager::with_encoder(catalog.clone(), FailOn(29)).parallel(parallel);
            match packager.pack(&source) {
                Err(Error::Encode { label, .. }) => assert_eq!(label, "b.png"),
                other => panic!("expected encode error, got {:?}", other.map(|b| b.len())),
            }
            assert!(!packager.pack(&source).unwrap_err().is_client_error());
        }
    }

    #[test]
    fn test_alternate_catalog() {
        let catalog = catalog(&[("small.png", 16), ("wide.png", 40)]);
        let source = SourceImage::decode("logo.png", &png(80, 40)).unwrap();
        let bytes = IconPackager::new(catalog)
            .compression(Compression::Stored)
            .pack(&source)
            .unwrap();
        let zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = zip.file_names().collect();
        names.sort_unstable();
        assert_eq!(names, ["logo-small.png", "logo-wide.png"]);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let source = SourceImage::decode("logo.png", &png(90, 60)).unwrap();
        let sequential = IconPackager::default().parallel(false).pack(&source).unwrap();
        let parallel = IconPackager::default().parallel(true).pack(&source).unwrap();
        assert_eq!(sequential, parallel);
    }
}
