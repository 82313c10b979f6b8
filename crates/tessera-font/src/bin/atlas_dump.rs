// atlas-dump: build the font pack from the user's options and write every
// atlas as a grayscale PNG, for eyeballing glyph placement.
//
// Usage: atlas-dump [output-dir]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tessera_core::Options;
use tessera_font::{Font, FontPack};

fn save_atlas(font: &Font, dir: &Path, name: &str) -> Result<PathBuf, String> {
    let geometry = font.geometry();
    let (width, height) = (geometry.pixel_width(), geometry.pixel_height());
    let image = image::GrayImage::from_raw(width, height, font.atlas().to_vec())
        .ok_or_else(|| format!("{name}: atlas buffer does not match {width}x{height}"))?;

    let path = dir.join(format!("atlas-{name}.png"));
    image
        .save(&path)
        .map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(path)
}

fn main() -> ExitCode {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let options = Options::load();
    let pack = match FontPack::load(&options) {
        Ok(pack) => pack,
        Err(e) => {
            log::error!("Failed to load fonts: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut fonts: Vec<(&Font, &str)> = pack
        .styles()
        .into_iter()
        .zip(["regular", "bold", "italic", "bold-italic"])
        .collect();
    if let Some(dw) = pack.double_width() {
        fonts.push((dw, "double-width"));
    }

    for (font, name) in fonts {
        match save_atlas(font, &out_dir, name) {
            Ok(path) => log::info!(
                "{name} ({}): {} glyphs in {}x{} cells -> {}",
                font.path().display(),
                font.atlas_map().len(),
                font.nx(),
                font.ny(),
                path.display()
            ),
            Err(e) => {
                log::error!("Failed to write atlas: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
