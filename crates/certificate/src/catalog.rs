//! Font catalog and asset sources

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{CertificateError, Result};

/// Fonts selectable for the name and body fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FontId {
    DejaVuSans,
    #[serde(rename = "ScriptMTBold")]
    ScriptMtBold,
    #[serde(rename = "TomNR")]
    TomNr,
    AlefRegular,
    #[serde(rename = "BodoniFLF")]
    BodoniFlf,
}

impl FontId {
    /// Font used when an identifier is not recognized
    pub const DEFAULT: FontId = FontId::DejaVuSans;

    /// Every selectable font, in menu order
    pub const ALL: [FontId; 5] = [
        FontId::DejaVuSans,
        FontId::ScriptMtBold,
        FontId::TomNr,
        FontId::AlefRegular,
        FontId::BodoniFlf,
    ];

    /// Identifier as shown to users and stored in field values
    pub fn name(&self) -> &'static str {
        match self {
            FontId::DejaVuSans => "DejaVuSans",
            FontId::ScriptMtBold => "ScriptMTBold",
            FontId::TomNr => "TomNR",
            FontId::AlefRegular => "AlefRegular",
            FontId::BodoniFlf => "BodoniFLF",
        }
    }

    /// Default file name of the TrueType font
    pub fn file_name(&self) -> &'static str {
        match self {
            FontId::DejaVuSans => "DejaVuSans.ttf",
            FontId::ScriptMtBold => "script-mt-bold.ttf",
            FontId::TomNr => "tomnr.ttf",
            FontId::AlefRegular => "Alef-Regular.ttf",
            FontId::BodoniFlf => "BodoniFLF.ttf",
        }
    }

    /// Look up an identifier exactly
    pub fn from_name(name: &str) -> Option<FontId> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Look up an identifier, falling back to [`FontId::DEFAULT`]
    pub fn resolve(name: &str) -> FontId {
        match Self::from_name(name) {
            Some(id) => id,
            None => {
                debug!(
                    requested = name,
                    fallback = Self::DEFAULT.name(),
                    "unknown font identifier"
                );
                Self::DEFAULT
            }
        }
    }
}

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where each font's bytes live, relative to an [`AssetSource`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontCatalog {
    paths: BTreeMap<FontId, String>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self {
            paths: FontId::ALL
                .into_iter()
                .map(|id| (id, id.file_name().to_string()))
                .collect(),
        }
    }
}

impl FontCatalog {
    /// Catalog with no paths registered
    pub fn empty() -> Self {
        Self {
            paths: BTreeMap::new(),
        }
    }

    /// Register or replace the path of a font
    pub fn set_path(&mut self, id: FontId, path: impl Into<String>) {
        self.paths.insert(id, path.into());
    }

    pub fn path(&self, id: FontId) -> Option<&str> {
        self.paths.get(&id).map(String::as_str)
    }

    /// Fetch the TrueType bytes of a font
    pub fn fetch<S: AssetSource + ?Sized>(&self, id: FontId, source: &S) -> Result<Vec<u8>> {
        let path = self.path(id).ok_or_else(|| CertificateError::FontLoad {
            font: id.name().to_string(),
            reason: "no path configured".to_string(),
        })?;

        debug!(font = id.name(), path, "fetching font");
        source.fetch(path).map_err(|e| CertificateError::FontLoad {
            font: id.name().to_string(),
            reason: format!("{path}: {e}"),
        })
    }
}

/// Supplies template and font bytes by relative path
pub trait AssetSource {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>>;
}

impl<T: AssetSource + ?Sized> AssetSource for &T {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).fetch(path)
    }
}

/// Reads assets from files under a root directory
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path.trim_start_matches('/')))
    }
}

/// Holds assets in memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under a path, replacing any previous asset
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(path.into(), bytes);
    }

    /// Builder form of [`MemorySource::insert`]
    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        self.assets.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("asset not found: {path}"))
        })
    }
}
