// Renderer options, stored as JSON in the platform config dir:
// e.g. ~/.config/tessera/options.json on Linux.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Rgb;

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Font family looked up in the system font database.
    pub font: String,
    /// Regular font file; skips the family lookup when set.
    pub font_path: Option<PathBuf>,
    /// Family for double-width (East Asian wide) glyphs.
    pub dw_font: Option<String>,
    /// Target glyph height in pixels.
    pub font_size: u16,
    /// Inset between the window edge and the grid, in pixels.
    pub border: u16,
    pub bg: Rgb,
    pub fg: Rgb,
    pub show_wraps: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            font: "monospace".to_string(),
            font_path: None,
            dw_font: None,
            font_size: 16,
            border: 2,
            bg: Rgb::BLACK,
            fg: Rgb::new(0xd3, 0xd3, 0xd3),
            show_wraps: false,
        }
    }
}

impl Options {
    pub fn default_path() -> Option<PathBuf> {
        let config_dir = dirs::config_dir()?;
        Some(config_dir.join("tessera").join("options.json"))
    }

    /// Load from the default location, falling back to defaults on any problem.
    pub fn load() -> Options {
        let path = match Self::default_path() {
            Some(p) => p,
            None => return Options::default(),
        };
        if !path.exists() {
            return Options::default();
        }

        match Self::load_from(&path) {
            Ok(options) => options,
            Err(e) => {
                log::warn!("{e}; using default options");
                Options::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Options, OptionsError> {
        let data = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| OptionsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), OptionsError> {
        let io_err = |source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| OptionsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }
}
