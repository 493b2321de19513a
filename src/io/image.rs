//! PNG translation for single-layer tile maps
//!
//! The reference host adapter: each distinct opaque pixel color becomes one
//! tile handle through a shared [`Palette`], fully transparent pixels are
//! empty cells. Image row 0 is the top of the picture, so rows are flipped
//! into the engine's bottom-up `y` axis on load and back on export.

use std::path::Path;

use image::{ImageBuffer, Rgba};
use serde::{Deserialize, Serialize};

use crate::io::error::{EngineError, Result, invalid_parameter};
use crate::spatial::region::Region;
use crate::spatial::tiles::{MapBuffer, TileGrid, TileHandle};

/// Color table shared by every map of one training set
///
/// Handles are indices into the color list; palettes are tiny, so interning
/// is a linear scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    /// Create an empty palette
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Test whether no colors were interned
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Handle already assigned to a color, if any
    pub fn handle_of(&self, color: [u8; 4]) -> Option<TileHandle> {
        self.colors
            .iter()
            .position(|&known| known == color)
            .map(|index| TileHandle(index as u32))
    }

    /// Handle for a color, interning it on first sight
    pub fn intern(&mut self, color: [u8; 4]) -> TileHandle {
        if let Some(handle) = self.handle_of(color) {
            return handle;
        }
        self.colors.push(color);
        TileHandle((self.colors.len() - 1) as u32)
    }

    /// Color behind a handle
    pub fn color_of(&self, handle: TileHandle) -> Option<[u8; 4]> {
        self.colors.get(handle.0 as usize).copied()
    }
}

/// Load a PNG as a single-layer map, interning new colors into the palette
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_png_map(path: &Path, palette: &mut Palette) -> Result<MapBuffer> {
    let image = image::open(path)
        .map_err(|source| EngineError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let height = image.height();
    let mut map = MapBuffer::new(1);
    for (px, py, pixel) in image.enumerate_pixels() {
        let Rgba(color) = *pixel;
        if color[3] == 0 {
            continue;
        }
        let handle = palette.intern(color);
        let y = (height - 1 - py) as i32;
        map.set(0, px as i32, y, Some(handle));
    }
    Ok(map)
}

/// Load a PNG against a frozen palette, skipping unknown colors
///
/// Used for prefill images at generation time, where inventing new handles
/// would bypass the trained tile table.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_png_map_with(path: &Path, palette: &Palette) -> Result<MapBuffer> {
    let image = image::open(path)
        .map_err(|source| EngineError::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let height = image.height();
    let mut map = MapBuffer::new(1);
    for (px, py, pixel) in image.enumerate_pixels() {
        let Rgba(color) = *pixel;
        if color[3] == 0 {
            continue;
        }
        if let Some(handle) = palette.handle_of(color) {
            let y = (height - 1 - py) as i32;
            map.set(0, px as i32, y, Some(handle));
        }
    }
    Ok(map)
}

/// Export one region of a single-layer map as a PNG
///
/// Cells without a handle (or with a handle outside the palette) come out
/// fully transparent. Parent directories are created as needed.
///
/// # Errors
///
/// Returns an error if:
/// - The map has no layers
/// - The parent directory cannot be created
/// - The image cannot be saved
pub fn export_png_map(map: &MapBuffer, palette: &Palette, region: Region, path: &Path) -> Result<()> {
    if map.layer_count() == 0 {
        return Err(invalid_parameter(
            "map",
            &"0 layers",
            &"cannot export a map without layers",
        ));
    }

    let width = region.width() as u32;
    let height = region.height() as u32;
    let mut image = ImageBuffer::new(width, height);

    for y in 0..region.height() {
        for x in 0..region.width() {
            let (abs_x, abs_y) = region.absolute(x, y);
            let color = map
                .get(0, abs_x, abs_y)
                .and_then(|handle| palette.color_of(handle))
                .unwrap_or([0, 0, 0, 0]);
            let py = height - 1 - y as u32;
            image.put_pixel(x as u32, py, Rgba(color));
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| EngineError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source,
            })?;
        }
    }

    image.save(path).map_err(|source| EngineError::ImageExport {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
