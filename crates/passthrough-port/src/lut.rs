// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Color LUT creation payload.

/// Channels stored per LUT entry (`XrPassthroughColorLutChannelsMETA`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorLutChannels {
    /// 3 bytes per entry.
    Rgb,
    /// 4 bytes per entry.
    Rgba,
}

impl ColorLutChannels {
    /// Bytes per LUT entry.
    pub const fn count(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Parameters for `xrCreatePassthroughColorLutMETA`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorLutCreateInfo<'a> {
    /// Channel layout of `data`.
    pub channels: ColorLutChannels,
    /// Cells per axis.
    pub resolution: u32,
    /// `resolution³ × channels` bytes.
    pub data: &'a [u8],
}
