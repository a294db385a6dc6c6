//! GHS Pictogram Catalog
//!
//! Maps pictogram codes to image sources. Codes without an image render as
//! a text placeholder.

use base64::Engine;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// GHS01..GHS09 with English and Chinese short names.
pub const KNOWN_PICTOGRAMS: [(&str, &str, &str); 9] = [
    ("GHS01", "Explosive", "爆炸物"),
    ("GHS02", "Flammable", "易燃"),
    ("GHS03", "Oxidizing", "氧化性"),
    ("GHS04", "Compressed gas", "压缩气体"),
    ("GHS05", "Corrosive", "腐蚀性"),
    ("GHS06", "Toxic", "急性毒性"),
    ("GHS07", "Harmful", "有害"),
    ("GHS08", "Health hazard", "健康危害"),
    ("GHS09", "Environmental hazard", "环境危害"),
];

pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn pictogram_names(code: &str) -> Option<(&'static str, &'static str)> {
    let code = normalize_code(code);
    KNOWN_PICTOGRAMS
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, en, zh)| (*en, *zh))
}

#[derive(Debug, Clone)]
pub enum PictogramSource {
    /// `{base_url}/{CODE}.svg`
    Remote { base_url: String },
    /// Base64 data URIs read from an asset directory at load time.
    Inline { images: HashMap<String, String> },
}

#[derive(Debug, Clone)]
pub struct PictogramCatalog {
    source: PictogramSource,
}

impl PictogramCatalog {
    pub fn remote(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            source: PictogramSource::Remote { base_url },
        }
    }

    /// Read `{CODE}.svg` (or `.png`) for each known code. Missing files are
    /// left out and will print as placeholders.
    pub fn load_inline(dir: &Path) -> Self {
        let mut images = HashMap::new();
        for (code, _, _) in KNOWN_PICTOGRAMS {
            let candidates = [
                (dir.join(format!("{code}.svg")), "image/svg+xml"),
                (dir.join(format!("{code}.png")), "image/png"),
            ];
            let found = candidates
                .iter()
                .find_map(|(path, mime)| fs::read(path).ok().map(|bytes| (bytes, *mime)));

            match found {
                Some((bytes, mime)) => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    images.insert(code.to_string(), format!("data:{mime};base64,{encoded}"));
                }
                None => {
                    tracing::warn!(code, dir = %dir.display(), "pictogram asset missing, labels will use a text placeholder");
                }
            }
        }
        Self {
            source: PictogramSource::Inline { images },
        }
    }

    /// Image source for a code, or `None` when the label should show the
    /// code as text.
    pub fn image_src(&self, code: &str) -> Option<String> {
        let code = normalize_code(code);
        pictogram_names(&code)?;
        match &self.source {
            PictogramSource::Remote { base_url } => Some(format!("{base_url}/{code}.svg")),
            PictogramSource::Inline { images } => images.get(&code).cloned(),
        }
    }
}

impl Default for PictogramCatalog {
    fn default() -> Self {
        Self::remote("/ghs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_sources() {
        let catalog = PictogramCatalog::remote("https://assets.example.org/ghs/");
        assert_eq!(
            catalog.image_src("ghs02").as_deref(),
            Some("https://assets.example.org/ghs/GHS02.svg")
        );
        assert_eq!(catalog.image_src("GHS10"), None);
    }

    #[test]
    fn test_inline_sources_skip_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("GHS07.svg"), "<svg/>").unwrap();

        let catalog = PictogramCatalog::load_inline(dir.path());
        let src = catalog.image_src("GHS07").unwrap();
        assert!(src.starts_with("data:image/svg+xml;base64,"));
        assert_eq!(catalog.image_src("GHS02"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(pictogram_names(" ghs05 "), Some(("Corrosive", "腐蚀性")));
        assert_eq!(pictogram_names("H225"), None);
    }
}
