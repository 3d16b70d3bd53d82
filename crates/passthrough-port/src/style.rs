// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Layer style as handed to the runtime (`XrPassthroughStyleFB` + chained filter).

use crate::ColorLutHandle;

/// Linear RGBA color with `f32` components.
pub type ColorRgba = [f32; 4];

/// Number of entries in a mono-to-RGBA or mono-to-mono color map
/// (`XR_PASSTHROUGH_COLOR_MAP_MONO_SIZE_FB`).
pub const COLOR_MAP_MONO_SIZE: usize = 256;

/// Which color filter is selected, without its payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PassthroughFilter {
    /// No filter.
    #[default]
    Disabled,
    /// Mono-to-RGBA color map.
    ColorMap,
    /// Mono-to-mono map.
    MonoMap,
    /// Brightness, contrast and saturation adjustment.
    BrightnessContrastSaturation,
    /// Single color LUT.
    ColorMapLut,
    /// Two color LUTs interpolated by weight.
    InterpolatedLut,
}

/// Filter chained onto the style, with its payload.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleFilter {
    /// No filter.
    Disabled,
    /// Mono-to-RGBA color map.
    ColorMap(Box<[ColorRgba; COLOR_MAP_MONO_SIZE]>),
    /// Mono-to-mono map.
    MonoMap(Box<[u8; COLOR_MAP_MONO_SIZE]>),
    /// Brightness, contrast and saturation adjustment.
    BrightnessContrastSaturation {
        /// Brightness offset in `[-100, 100]`.
        brightness: f32,
        /// Contrast multiplier, `>= 0`.
        contrast: f32,
        /// Saturation multiplier, `>= 0`.
        saturation: f32,
    },
    /// Single color LUT.
    ColorMapLut {
        /// Runtime LUT handle.
        lut: ColorLutHandle,
        /// Blend weight in `[0, 1]`.
        weight: f32,
    },
    /// Two color LUTs interpolated by weight.
    InterpolatedLut {
        /// LUT at weight 0.
        source: ColorLutHandle,
        /// LUT at weight 1.
        target: ColorLutHandle,
        /// Interpolation weight in `[0, 1]`.
        weight: f32,
    },
}

impl StyleFilter {
    /// The filter kind this payload belongs to.
    pub const fn kind(&self) -> PassthroughFilter {
        match self {
            Self::Disabled => PassthroughFilter::Disabled,
            Self::ColorMap(_) => PassthroughFilter::ColorMap,
            Self::MonoMap(_) => PassthroughFilter::MonoMap,
            Self::BrightnessContrastSaturation { .. } => {
                PassthroughFilter::BrightnessContrastSaturation
            }
            Self::ColorMapLut { .. } => PassthroughFilter::ColorMapLut,
            Self::InterpolatedLut { .. } => PassthroughFilter::InterpolatedLut,
        }
    }
}

/// Complete style applied to a layer in one `set_layer_style` call.
#[derive(Clone, Debug, PartialEq)]
pub struct PassthroughStyle {
    /// Opacity of the passthrough texture.
    pub texture_opacity_factor: f32,
    /// Edge rendering color; alpha 0 disables edges.
    pub edge_color: ColorRgba,
    /// Chained color filter.
    pub filter: StyleFilter,
}

impl Default for PassthroughStyle {
    fn default() -> Self {
        Self {
            texture_opacity_factor: 1.0,
            edge_color: [0.0, 0.0, 0.0, 0.0],
            filter: StyleFilter::Disabled,
        }
    }
}
