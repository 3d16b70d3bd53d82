// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Color LUT resources.
//!
//! A [`ColorLut`] is built once from a LUT image and registered with the
//! session, which hands back a [`ColorLutId`]. The runtime object is created
//! lazily the first time a style using the LUT is applied, and forgotten
//! (not destroyed) when the feature goes away, since the runtime destroys
//! LUTs together with their feature.

use std::collections::BTreeMap;

use passthrough_port::{
    ColorLutChannels, ColorLutCreateInfo, ColorLutHandle, FeatureHandle, PassthroughRuntime,
    RuntimeError, XrHost,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::PassthroughSession;

/// Pixel layout of a LUT source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// 3 bytes per pixel.
    Rgb8,
    /// 4 bytes per pixel.
    Rgba8,
}

impl ImageFormat {
    const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Error building, registering or freeing a color LUT.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LutError {
    /// Strip images need a power-of-two height.
    #[error("color LUT cell resolution must be a power of 2, current resolution: {0}")]
    NotPowerOfTwo(u32),
    /// Strip images need `width == height²`.
    #[error("color LUT image is incorrect size: {width}x{height}")]
    StripSize {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
    /// Square images must be 8x8, 64x64 or 512x512.
    #[error("square color LUT image must be of total resolution 8x8, 64x64, or 512x512, got {0}x{0}")]
    SquareSize(u32),
    /// Pixel buffer length does not match the image dimensions.
    #[error("pixel buffer has {actual} bytes, expected {expected}")]
    PixelData {
        /// `width × height × bytes per pixel`.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// Raw LUT data length does not match `resolution³ × channels`.
    #[error("LUT data has {actual} bytes, expected {expected}")]
    LutData {
        /// `resolution³ × channels`.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// Resolution exceeds what the system supports.
    #[error("color LUT cell resolution {resolution} exceeds system maximum {max}")]
    ResolutionTooHigh {
        /// Requested resolution.
        resolution: u32,
        /// `maxColorLutResolution`.
        max: u32,
    },
    /// `XR_META_passthrough_color_lut` is not enabled.
    #[error("passthrough color LUT extension not enabled")]
    ExtensionDisabled,
    /// The id is not registered.
    #[error("cannot free unknown color LUT {0:?}")]
    Unknown(ColorLutId),
    /// Destroying the runtime object failed; the LUT stays registered.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// A 3D color lookup table in the runtime's memory layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorLut {
    channels: ColorLutChannels,
    resolution: u32,
    data: Vec<u8>,
}

impl ColorLut {
    /// Build a LUT from a LUT image.
    ///
    /// Two layouts are accepted: a horizontal strip of `height` slices, each
    /// `height × height` (so `width == height²`, height a power of two), and
    /// square tiled images of 8x8, 64x64 or 512x512 pixels holding a 4, 16
    /// or 64 cell LUT. Pixels are converted to `channels` (RGB drops alpha,
    /// RGBA adds opaque alpha).
    pub fn from_image(
        width: u32,
        height: u32,
        pixels: &[u8],
        format: ImageFormat,
        channels: ColorLutChannels,
    ) -> Result<Self, LutError> {
        let resolution = cell_resolution(width, height)?;
        let src_bpp = format.bytes_per_pixel();
        let expected = width as usize * height as usize * src_bpp;
        if pixels.len() != expected {
            return Err(LutError::PixelData {
                expected,
                actual: pixels.len(),
            });
        }

        let r = resolution as usize;
        let ch = channels.count();
        let res_sq = r * r;
        let res_sqrt = (r as f64).sqrt() as usize;
        let mut data = vec![0u8; res_sq * r * ch];

        for y in 0..height as usize {
            let y_val = res_sqrt * res_sq * (y / r) + r * (y % r);
            for x in 0..width as usize {
                let x_val = res_sq * (x / r) + x % r;
                let dst = (x_val + y_val) * ch;
                let src = (y * width as usize + x) * src_bpp;
                let pixel = &pixels[src..src + src_bpp];
                let out = &mut data[dst..dst + ch];
                out[..3].copy_from_slice(&pixel[..3]);
                if ch == 4 {
                    out[3] = pixel.get(3).copied().unwrap_or(u8::MAX);
                }
            }
        }

        Ok(Self {
            channels,
            resolution,
            data,
        })
    }

    /// Wrap LUT data that is already in the runtime layout.
    pub fn from_raw(
        channels: ColorLutChannels,
        resolution: u32,
        data: Vec<u8>,
    ) -> Result<Self, LutError> {
        let expected = (resolution as usize).pow(3) * channels.count();
        if data.len() != expected {
            return Err(LutError::LutData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            channels,
            resolution,
            data,
        })
    }

    /// Channel layout.
    pub fn channels(&self) -> ColorLutChannels {
        self.channels
    }

    /// Cells per axis.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// LUT bytes, `resolution³ × channels` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn cell_resolution(width: u32, height: u32) -> Result<u32, LutError> {
    if width == height {
        return match height {
            8 => Ok(4),
            64 => Ok(16),
            512 => Ok(64),
            other => Err(LutError::SquareSize(other)),
        };
    }
    if !height.is_power_of_two() {
        return Err(LutError::NotPowerOfTwo(height));
    }
    if u64::from(width) != u64::from(height) * u64::from(height) {
        return Err(LutError::StripSize { width, height });
    }
    Ok(height)
}

/// Session-scoped id of a registered color LUT.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColorLutId(pub(crate) u64);

#[derive(Debug)]
struct ColorLutEntry {
    lut: ColorLut,
    handle: Option<ColorLutHandle>,
}

#[derive(Debug, Default)]
pub(crate) struct ColorLutRegistry {
    entries: BTreeMap<ColorLutId, ColorLutEntry>,
    next: u64,
}

impl ColorLutRegistry {
    pub(crate) fn insert(&mut self, lut: ColorLut) -> ColorLutId {
        self.next += 1;
        let id = ColorLutId(self.next);
        self.entries.insert(id, ColorLutEntry { lut, handle: None });
        id
    }

    pub(crate) fn contains(&self, id: ColorLutId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Runtime handle for `id`, creating the runtime object on first use.
    pub(crate) fn realize<R: PassthroughRuntime>(
        &mut self,
        id: ColorLutId,
        feature: Option<FeatureHandle>,
        runtime: &mut R,
    ) -> Option<ColorLutHandle> {
        let entry = self.entries.get_mut(&id)?;
        if let Some(handle) = entry.handle {
            return Some(handle);
        }
        let feature = feature?;
        let info = ColorLutCreateInfo {
            channels: entry.lut.channels,
            resolution: entry.lut.resolution,
            data: &entry.lut.data,
        };
        match runtime.create_color_lut(feature, &info) {
            Ok(handle) => {
                debug!(?id, ?handle, "color LUT realized");
                entry.handle = Some(handle);
                Some(handle)
            }
            Err(err) => {
                warn!(%err, "failed to create passthrough color LUT");
                None
            }
        }
    }

    /// Drop every runtime handle without destroying it.
    pub(crate) fn forget_handles(&mut self) {
        for entry in self.entries.values_mut() {
            entry.handle = None;
        }
    }
}

impl<R, H> PassthroughSession<R, H> {
    /// Maximum LUT cell resolution, 0 when the color LUT extension is off.
    pub fn max_color_lut_resolution(&self) -> u32 {
        if self.extensions.meta_passthrough_color_lut {
            self.properties.max_color_lut_resolution
        } else {
            0
        }
    }

    /// Number of registered color LUTs.
    pub fn color_lut_count(&self) -> usize {
        self.luts.len()
    }
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Register a color LUT for use with the LUT filters.
    pub fn create_color_lut(&mut self, lut: ColorLut) -> Result<ColorLutId, LutError> {
        if !self.extensions.meta_passthrough_color_lut {
            return Err(LutError::ExtensionDisabled);
        }
        let max = self.properties.max_color_lut_resolution;
        if lut.resolution > max {
            return Err(LutError::ResolutionTooHigh {
                resolution: lut.resolution,
                max,
            });
        }
        let id = self.luts.insert(lut);
        info!(?id, "color LUT registered");
        Ok(id)
    }

    /// Free a color LUT. A filter that used it falls back to `Disabled`.
    pub fn free_color_lut(&mut self, id: ColorLutId) -> Result<(), LutError> {
        let entry = self.luts.entries.get(&id).ok_or(LutError::Unknown(id))?;
        if let Some(handle) = entry.handle {
            self.runtime.destroy_color_lut(handle)?;
        }
        self.luts.entries.remove(&id);
        if self.style.release_lut(id) {
            info!(?id, "freed color LUT was in use, filter disabled");
            self.apply_style();
        }
        Ok(())
    }
}
