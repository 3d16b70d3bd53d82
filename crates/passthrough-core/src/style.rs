// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared layer style, filter payloads and the session's style setters.

use passthrough_port::{
    ColorLutHandle, ColorRgba, PassthroughFilter, PassthroughRuntime, PassthroughStyle,
    StyleFilter, XrHost, COLOR_MAP_MONO_SIZE,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{ColorLutId, PassthroughSession};

const BRIGHTNESS_MIN: f32 = -100.0;
const BRIGHTNESS_MAX: f32 = 100.0;

/// Error returned by style setters for invalid input. The style is left
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StyleError {
    /// Brightness outside `[-100, 100]`.
    #[error("brightness value {0} is not within bounds of -100 and 100")]
    BrightnessOutOfRange(f32),
    /// Negative (or NaN) contrast.
    #[error("contrast value {0} is not greater than or equal to zero")]
    NegativeContrast(f32),
    /// Negative (or NaN) saturation.
    #[error("saturation value {0} is not greater than or equal to zero")]
    NegativeSaturation(f32),
    /// A LUT filter was selected before its LUT was set.
    #[error("cannot set filter to {0:?}, color LUT has not been previously set")]
    ColorLutNotSet(PassthroughFilter),
    /// `XR_META_passthrough_color_lut` is not enabled.
    #[error("passthrough color LUT extension not enabled")]
    ColorLutExtensionDisabled,
    /// The LUT id is not (or no longer) registered.
    #[error("unknown color LUT {0:?}")]
    UnknownColorLut(ColorLutId),
}

/// Brightness, contrast and saturation adjustment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrightnessContrastSaturation {
    /// Brightness offset in `[-100, 100]`.
    pub brightness: f32,
    /// Contrast multiplier, `>= 0`.
    pub contrast: f32,
    /// Saturation multiplier, `>= 0`.
    pub saturation: f32,
}

impl Default for BrightnessContrastSaturation {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
        }
    }
}

impl BrightnessContrastSaturation {
    fn validate(self) -> Result<Self, StyleError> {
        if !(BRIGHTNESS_MIN..=BRIGHTNESS_MAX).contains(&self.brightness) {
            return Err(StyleError::BrightnessOutOfRange(self.brightness));
        }
        if self.contrast.is_nan() || self.contrast < 0.0 {
            return Err(StyleError::NegativeContrast(self.contrast));
        }
        if self.saturation.is_nan() || self.saturation < 0.0 {
            return Err(StyleError::NegativeSaturation(self.saturation));
        }
        Ok(self)
    }
}

/// Piecewise-linear color gradient sampled over `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<(f32, ColorRgba)>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self::new([(0.0, [0.0, 0.0, 0.0, 1.0]), (1.0, [1.0, 1.0, 1.0, 1.0])])
    }
}

impl Gradient {
    /// Build a gradient from `(offset, color)` stops in any order.
    pub fn new(stops: impl IntoIterator<Item = (f32, ColorRgba)>) -> Self {
        let mut stops: Vec<_> = stops.into_iter().collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// Color at `offset`, clamped to the first and last stops. An empty
    /// gradient is transparent black.
    pub fn sample(&self, offset: f32) -> ColorRgba {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return [0.0; 4];
        };
        if offset <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let ((a_off, a), (b_off, b)) = (pair[0], pair[1]);
            if offset <= b_off {
                let t = segment_t(a_off, b_off, offset);
                return [
                    lerp(a[0], b[0], t),
                    lerp(a[1], b[1], t),
                    lerp(a[2], b[2], t),
                    lerp(a[3], b[3], t),
                ];
            }
        }
        last.1
    }
}

/// Piecewise-linear scalar curve sampled over `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    points: Vec<(f32, f32)>,
}

impl Default for Curve {
    fn default() -> Self {
        Self::new([(0.0, 0.0), (1.0, 1.0)])
    }
}

impl Curve {
    /// Build a curve from `(x, y)` points in any order.
    pub fn new(points: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut points: Vec<_> = points.into_iter().collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// Value at `x`, clamped to the end points. An empty curve is zero.
    pub fn sample(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if x <= first.0 {
            return first.1;
        }
        for pair in self.points.windows(2) {
            let ((ax, ay), (bx, by)) = (pair[0], pair[1]);
            if x <= bx {
                return lerp(ay, by, segment_t(ax, bx, x));
            }
        }
        last.1
    }
}

fn segment_t(start: f32, end: f32, at: f32) -> f32 {
    let span = end - start;
    if span > 0.0 {
        (at - start) / span
    } else {
        1.0
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

/// The single style shared by both layers, with every filter's payload kept
/// so switching filters back and forth does not lose data.
#[derive(Debug, Clone)]
pub(crate) struct StyleState {
    pub(crate) texture_opacity_factor: f32,
    pub(crate) edge_color: ColorRgba,
    pub(crate) filter: PassthroughFilter,
    pub(crate) color_map: Box<[ColorRgba; COLOR_MAP_MONO_SIZE]>,
    pub(crate) mono_map: Box<[u8; COLOR_MAP_MONO_SIZE]>,
    pub(crate) bcs: BrightnessContrastSaturation,
    pub(crate) lut: Option<(ColorLutId, f32)>,
    pub(crate) interpolated_lut: Option<(ColorLutId, ColorLutId, f32)>,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            texture_opacity_factor: 1.0,
            edge_color: [0.0; 4],
            filter: PassthroughFilter::Disabled,
            color_map: Box::new([[0.0; 4]; COLOR_MAP_MONO_SIZE]),
            mono_map: Box::new([0; COLOR_MAP_MONO_SIZE]),
            bcs: BrightnessContrastSaturation::default(),
            lut: None,
            interpolated_lut: None,
        }
    }
}

impl StyleState {
    /// Build the runtime style. LUT ids go through `resolve`; a LUT that
    /// cannot be resolved disables the filter for this application only.
    pub(crate) fn to_runtime(
        &self,
        mut resolve: impl FnMut(ColorLutId) -> Option<ColorLutHandle>,
    ) -> PassthroughStyle {
        let filter = match self.filter {
            PassthroughFilter::Disabled => Some(StyleFilter::Disabled),
            PassthroughFilter::ColorMap => Some(StyleFilter::ColorMap(self.color_map.clone())),
            PassthroughFilter::MonoMap => Some(StyleFilter::MonoMap(self.mono_map.clone())),
            PassthroughFilter::BrightnessContrastSaturation => {
                Some(StyleFilter::BrightnessContrastSaturation {
                    brightness: self.bcs.brightness,
                    contrast: self.bcs.contrast,
                    saturation: self.bcs.saturation,
                })
            }
            PassthroughFilter::ColorMapLut => self.lut.and_then(|(id, weight)| {
                resolve(id).map(|lut| StyleFilter::ColorMapLut { lut, weight })
            }),
            PassthroughFilter::InterpolatedLut => {
                self.interpolated_lut
                    .and_then(|(source, target, weight)| {
                        Some(StyleFilter::InterpolatedLut {
                            source: resolve(source)?,
                            target: resolve(target)?,
                            weight,
                        })
                    })
            }
        };
        let filter = filter.unwrap_or_else(|| {
            warn!(filter = ?self.filter, "color LUT unavailable, applying style without filter");
            StyleFilter::Disabled
        });
        PassthroughStyle {
            texture_opacity_factor: self.texture_opacity_factor,
            edge_color: self.edge_color,
            filter,
        }
    }

    /// Forget a freed LUT. Returns whether the active filter used it and was
    /// reset to `Disabled`.
    pub(crate) fn release_lut(&mut self, id: ColorLutId) -> bool {
        let mut reset = false;
        if self.lut.is_some_and(|(lut, _)| lut == id) {
            self.lut = None;
            reset |= self.filter == PassthroughFilter::ColorMapLut;
        }
        if self
            .interpolated_lut
            .is_some_and(|(source, target, _)| source == id || target == id)
        {
            self.interpolated_lut = None;
            reset |= self.filter == PassthroughFilter::InterpolatedLut;
        }
        if reset {
            self.filter = PassthroughFilter::Disabled;
        }
        reset
    }
}

impl<R, H> PassthroughSession<R, H> {
    /// Opacity of the passthrough texture.
    pub fn texture_opacity_factor(&self) -> f32 {
        self.style.texture_opacity_factor
    }

    /// Edge rendering color.
    pub fn edge_color(&self) -> ColorRgba {
        self.style.edge_color
    }

    /// The selected filter.
    pub fn passthrough_filter(&self) -> PassthroughFilter {
        self.style.filter
    }

    /// Last color map set with [`PassthroughSession::set_color_map`].
    pub fn color_map(&self) -> &[ColorRgba; COLOR_MAP_MONO_SIZE] {
        &self.style.color_map
    }

    /// Last mono map set with [`PassthroughSession::set_mono_map`].
    pub fn mono_map(&self) -> &[u8; COLOR_MAP_MONO_SIZE] {
        &self.style.mono_map
    }

    /// Last brightness, contrast and saturation set.
    pub fn brightness_contrast_saturation(&self) -> BrightnessContrastSaturation {
        self.style.bcs
    }

    /// LUT and clamped weight of the single-LUT filter.
    pub fn color_lut(&self) -> Option<(ColorLutId, f32)> {
        self.style.lut
    }

    /// Source, target and clamped weight of the interpolated-LUT filter.
    pub fn interpolated_color_lut(&self) -> Option<(ColorLutId, ColorLutId, f32)> {
        self.style.interpolated_lut
    }
}

impl<R: PassthroughRuntime, H: XrHost> PassthroughSession<R, H> {
    /// Set the passthrough texture opacity.
    pub fn set_texture_opacity_factor(&mut self, value: f32) {
        self.style.texture_opacity_factor = value;
        self.apply_style();
    }

    /// Set the edge color; alpha 0 disables edge rendering.
    pub fn set_edge_color(&mut self, color: ColorRgba) {
        self.style.edge_color = color;
        self.apply_style();
    }

    /// Select a filter, keeping its previously set payload.
    ///
    /// LUT filters are rejected until their LUT has been set.
    pub fn set_passthrough_filter(&mut self, filter: PassthroughFilter) -> Result<(), StyleError> {
        let lut_missing = match filter {
            PassthroughFilter::ColorMapLut => self.style.lut.is_none(),
            PassthroughFilter::InterpolatedLut => self.style.interpolated_lut.is_none(),
            _ => false,
        };
        if lut_missing {
            return Err(StyleError::ColorLutNotSet(filter));
        }
        self.style.filter = filter;
        self.apply_style();
        Ok(())
    }

    /// Sample `gradient` into the color map and select the color map filter.
    pub fn set_color_map(&mut self, gradient: &Gradient) {
        for (i, entry) in self.style.color_map.iter_mut().enumerate() {
            *entry = gradient.sample(i as f32 / COLOR_MAP_MONO_SIZE as f32);
        }
        self.style.filter = PassthroughFilter::ColorMap;
        self.apply_style();
    }

    /// Sample `curve` into the mono map and select the mono map filter.
    pub fn set_mono_map(&mut self, curve: &Curve) {
        for (i, entry) in self.style.mono_map.iter_mut().enumerate() {
            let value = curve.sample(i as f32 / COLOR_MAP_MONO_SIZE as f32);
            *entry = (value * COLOR_MAP_MONO_SIZE as f32) as u8;
        }
        self.style.filter = PassthroughFilter::MonoMap;
        self.apply_style();
    }

    /// Set brightness, contrast and saturation and select that filter.
    pub fn set_brightness_contrast_saturation(
        &mut self,
        brightness: f32,
        contrast: f32,
        saturation: f32,
    ) -> Result<(), StyleError> {
        self.style.bcs = BrightnessContrastSaturation {
            brightness,
            contrast,
            saturation,
        }
        .validate()?;
        self.style.filter = PassthroughFilter::BrightnessContrastSaturation;
        self.apply_style();
        Ok(())
    }

    /// Select a single color LUT blended by `weight` (clamped to `[0, 1]`).
    pub fn set_color_lut(&mut self, weight: f32, lut: ColorLutId) -> Result<(), StyleError> {
        self.check_lut(lut)?;
        self.style.lut = Some((lut, clamp_weight(weight)));
        self.style.filter = PassthroughFilter::ColorMapLut;
        self.apply_style();
        Ok(())
    }

    /// Select two color LUTs interpolated by `weight` (clamped to `[0, 1]`).
    pub fn set_interpolated_color_lut(
        &mut self,
        weight: f32,
        source: ColorLutId,
        target: ColorLutId,
    ) -> Result<(), StyleError> {
        self.check_lut(source)?;
        self.check_lut(target)?;
        self.style.interpolated_lut = Some((source, target, clamp_weight(weight)));
        self.style.filter = PassthroughFilter::InterpolatedLut;
        self.apply_style();
        Ok(())
    }

    fn check_lut(&self, lut: ColorLutId) -> Result<(), StyleError> {
        if !self.extensions.meta_passthrough_color_lut {
            return Err(StyleError::ColorLutExtensionDisabled);
        }
        if !self.luts.contains(lut) {
            return Err(StyleError::UnknownColorLut(lut));
        }
        Ok(())
    }

    /// Push the current style to the active layer, if any.
    pub(crate) fn apply_style(&mut self) {
        if !self.feature.is_started() {
            return;
        }
        let Some(layer) = self.layers.current_handle() else {
            return;
        };
        let style = self.runtime_style();
        match self.runtime.set_layer_style(layer, &style) {
            Ok(()) => debug!(?layer, filter = ?style.filter.kind(), "passthrough style applied"),
            Err(err) => warn!(%err, "failed to set passthrough style"),
        }
    }

    fn runtime_style(&mut self) -> PassthroughStyle {
        let Self {
            style,
            luts,
            runtime,
            feature,
            ..
        } = self;
        let feature = feature.handle();
        style.to_runtime(|id| luts.realize(id, feature, runtime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_clamps_and_interpolates() {
        let g = Gradient::new([(1.0, [1.0, 0.0, 0.0, 1.0]), (0.0, [0.0, 0.0, 1.0, 1.0])]);
        assert_eq!(g.sample(-1.0), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(g.sample(2.0), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(g.sample(0.5), [0.5, 0.0, 0.5, 1.0]);
        assert_eq!(Gradient::new([]).sample(0.5), [0.0; 4]);
    }

    #[test]
    fn curve_default_is_identity() {
        let c = Curve::default();
        assert!((c.sample(0.25) - 0.25).abs() < 1e-6);
        assert!((c.sample(1.5) - 1.0).abs() < 1e-6);
        assert!(Curve::new([]).sample(0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn coincident_stops_take_the_later_value() {
        let c = Curve::new([(0.0, 0.0), (0.5, 0.2), (0.5, 0.8), (1.0, 1.0)]);
        assert!((c.sample(0.5) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn bcs_validation_bounds() {
        let ok = |b, c, s| {
            BrightnessContrastSaturation {
                brightness: b,
                contrast: c,
                saturation: s,
            }
            .validate()
        };
        assert!(ok(-100.0, 0.0, 0.0).is_ok());
        assert!(ok(100.0, 5.0, 5.0).is_ok());
        assert_eq!(
            ok(100.5, 1.0, 1.0),
            Err(StyleError::BrightnessOutOfRange(100.5))
        );
        assert_eq!(ok(0.0, -0.1, 1.0), Err(StyleError::NegativeContrast(-0.1)));
        assert_eq!(
            ok(0.0, 1.0, -2.0),
            Err(StyleError::NegativeSaturation(-2.0))
        );
        assert!(ok(f32::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn weights_are_clamped() {
        assert!((clamp_weight(1.5) - 1.0).abs() < f32::EPSILON);
        assert!(clamp_weight(-0.5).abs() < f32::EPSILON);
        assert!(clamp_weight(f32::NAN).abs() < f32::EPSILON);
        assert!((clamp_weight(0.25) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn unresolved_lut_disables_filter_for_application() {
        let mut style = StyleState {
            filter: PassthroughFilter::ColorMapLut,
            lut: Some((ColorLutId(3), 0.5)),
            ..StyleState::default()
        };
        assert_eq!(style.to_runtime(|_| None).filter, StyleFilter::Disabled);
        assert_eq!(
            style.to_runtime(|_| Some(ColorLutHandle(9))).filter,
            StyleFilter::ColorMapLut {
                lut: ColorLutHandle(9),
                weight: 0.5
            }
        );
        assert!(style.release_lut(ColorLutId(3)));
        assert_eq!(style.filter, PassthroughFilter::Disabled);
        assert_eq!(style.lut, None);
    }

    #[test]
    fn releasing_unused_lut_keeps_filter() {
        let mut style = StyleState {
            filter: PassthroughFilter::MonoMap,
            interpolated_lut: Some((ColorLutId(1), ColorLutId(2), 1.0)),
            ..StyleState::default()
        };
        assert!(!style.release_lut(ColorLutId(2)));
        assert_eq!(style.filter, PassthroughFilter::MonoMap);
        assert_eq!(style.interpolated_lut, None);
    }
}
