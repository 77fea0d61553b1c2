//! Color types and the pixel capability interface
//!
//! All blending is performed on [`LinColor`]: alpha premultiplied RGBA in
//! linear color space. `RGBA` is the 8-bit sRGB exchange format, and plain
//! [`Scalar`] acts as the grayscale pixel used by coverage masks.
use crate::{utils::clamp, Scalar};
use bytemuck::{Pod, Zeroable};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Add, Mul, Sub},
    str::FromStr,
};

/// Common interface to all pixel representations
///
/// This is the seam that makes the rasterizer polymorphic over the pixel
/// type: blending, modulation by a coverage value in [0, 1], and conversion
/// to the 8-bit exchange format.
pub trait Color: Copy {
    /// Blend other color on top of this color (source-over, premultiplied)
    fn blend_over(self, other: Self) -> Self;

    /// Modulate all components by a single-channel value in [0, 1]
    fn modulate(self, coverage: Scalar) -> Self;

    /// Linear interpolation between self and the other color
    fn lerp(self, other: Self, t: f32) -> Self;

    /// Convert color to sRGBA bytes
    fn to_rgba(self) -> [u8; 4];

    /// Convert color to sRGB bytes (alpha is discarded)
    fn to_rgb(self) -> [u8; 3] {
        let [r, g, b, _] = self.to_rgba();
        [r, g, b]
    }
}

/// sRGBA color packed as `[u8; 4]`
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Pod, Zeroable)]
pub struct RGBA([u8; 4]);

impl RGBA {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub const fn red(self) -> u8 {
        self.0[0]
    }

    pub const fn green(self) -> u8 {
        self.0[1]
    }

    pub const fn blue(self) -> u8 {
        self.0[2]
    }

    pub const fn alpha(self) -> u8 {
        self.0[3]
    }
}

impl Color for RGBA {
    fn to_rgba(self) -> [u8; 4] {
        self.0
    }

    fn blend_over(self, other: Self) -> Self {
        LinColor::from(self)
            .blend_over(LinColor::from(other))
            .into()
    }

    fn modulate(self, coverage: Scalar) -> Self {
        LinColor::from(self).modulate(coverage).into()
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        LinColor::from(self).lerp(LinColor::from(other), t).into()
    }
}

impl From<[u8; 4]> for RGBA {
    #[inline]
    fn from(rgba: [u8; 4]) -> Self {
        RGBA(rgba)
    }
}

impl From<[u8; 3]> for RGBA {
    #[inline]
    fn from([r, g, b]: [u8; 3]) -> Self {
        RGBA::new(r, g, b, 255)
    }
}

impl fmt::Debug for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for RGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.to_rgba();
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)?;
        if a != 255 {
            write!(f, "{:02x}", a)?;
        }
        Ok(())
    }
}

impl FromStr for RGBA {
    type Err = ColorError;

    /// Parse `#RRGGBB` or `#RRGGBBAA` hex string
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        if !color.starts_with('#') || (color.len() != 7 && color.len() != 9) {
            return Err(ColorError::HexExpected);
        }
        let bytes: &[u8] = color[1..].as_ref();
        let digit = |byte| match byte {
            b'A'..=b'F' => Ok(byte - b'A' + 10),
            b'a'..=b'f' => Ok(byte - b'a' + 10),
            b'0'..=b'9' => Ok(byte - b'0'),
            _ => Err(ColorError::HexExpected),
        };
        let mut hex = bytes
            .chunks(2)
            .map(|pair| Ok((digit(pair[0])? << 4) | digit(pair[1])?));
        Ok(RGBA::new(
            hex.next().unwrap_or(Ok(0))?,
            hex.next().unwrap_or(Ok(0))?,
            hex.next().unwrap_or(Ok(0))?,
            hex.next().unwrap_or(Ok(255))?,
        ))
    }
}

#[cfg(feature = "serde")]
impl Serialize for RGBA {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for RGBA {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        std::borrow::Cow::<'de, str>::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Alpha premultiplied RGBA color in the linear color space (no gamma)
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct LinColor([f32; 4]);

impl LinColor {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub fn red(self) -> f32 {
        self.0[0]
    }

    #[inline]
    pub fn green(self) -> f32 {
        self.0[1]
    }

    #[inline]
    pub fn blue(self) -> f32 {
        self.0[2]
    }

    #[inline]
    pub fn alpha(self) -> f32 {
        self.0[3]
    }

    /// Remove alpha pre-multiplication
    #[inline]
    fn unmultiply(self) -> [f32; 4] {
        let Self([r, g, b, a]) = self;
        if a <= 1e-6 {
            // avoid division by zero on fully transparent pixels
            [0.0; 4]
        } else {
            [r / a, g / a, b / a, a]
        }
    }

    /// Convert into alpha-premultiplied sRGB from linear RGB
    ///
    /// Used by gradient stop interpolation only.
    pub(crate) fn into_srgb(self) -> Self {
        let [r, g, b, a] = self.unmultiply();
        Self([
            linear_to_srgb(r) * a,
            linear_to_srgb(g) * a,
            linear_to_srgb(b) * a,
            a,
        ])
    }

    /// Convert into alpha-premultiplied linear RGB from sRGB
    ///
    /// Used by gradient stop interpolation only.
    pub(crate) fn into_linear(self) -> Self {
        let [r, g, b, a] = self.unmultiply();
        Self([
            srgb_to_linear(r) * a,
            srgb_to_linear(g) * a,
            srgb_to_linear(b) * a,
            a,
        ])
    }
}

impl Color for LinColor {
    #[inline]
    fn to_rgba(self) -> [u8; 4] {
        RGBA::from(self).to_rgba()
    }

    #[inline]
    fn blend_over(self, other: Self) -> Self {
        other + self * (1.0 - other.alpha())
    }

    #[inline]
    fn modulate(self, coverage: Scalar) -> Self {
        self * (coverage as f32)
    }

    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for LinColor {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self::Output {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        Self([r0 + r1, g0 + g1, b0 + b1, a0 + a1])
    }
}

impl Sub for LinColor {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self::Output {
        let Self([r0, g0, b0, a0]) = self;
        let Self([r1, g1, b1, a1]) = other;
        Self([r0 - r1, g0 - g1, b0 - b1, a0 - a1])
    }
}

impl Mul<f32> for LinColor {
    type Output = Self;

    #[inline]
    fn mul(self, scale: f32) -> Self::Output {
        let Self([r, g, b, a]) = self;
        Self([r * scale, g * scale, b * scale, a * scale])
    }
}

impl From<RGBA> for LinColor {
    fn from(color: RGBA) -> Self {
        let a = color.alpha() as f32 / 255.0;
        let r = srgb_to_linear(color.red() as f32 / 255.0) * a;
        let g = srgb_to_linear(color.green() as f32 / 255.0) * a;
        let b = srgb_to_linear(color.blue() as f32 / 255.0) * a;
        LinColor::new(r, g, b, a)
    }
}

impl From<LinColor> for RGBA {
    fn from(color: LinColor) -> Self {
        let [r, g, b, a] = color.unmultiply();
        RGBA::new(
            (linear_to_srgb(clamp(r, 0.0, 1.0)) * 255.0 + 0.5) as u8,
            (linear_to_srgb(clamp(g, 0.0, 1.0)) * 255.0 + 0.5) as u8,
            (linear_to_srgb(clamp(b, 0.0, 1.0)) * 255.0 + 0.5) as u8,
            (clamp(a, 0.0, 1.0) * 255.0 + 0.5) as u8,
        )
    }
}

impl FromStr for LinColor {
    type Err = ColorError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        Ok(RGBA::from_str(color)?.into())
    }
}

impl fmt::Display for LinColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        RGBA::from(*self).fmt(f)
    }
}

/// Grayscale coverage pixel
impl Color for Scalar {
    fn to_rgba(self) -> [u8; 4] {
        let value = (linear_to_srgb(clamp(self, 0.0, 1.0) as f32) * 255.0 + 0.5) as u8;
        [value, value, value, 255]
    }

    fn blend_over(self, other: Self) -> Self {
        other + self * (1.0 - other)
    }

    fn modulate(self, coverage: Scalar) -> Self {
        self * coverage
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        let t = t as Scalar;
        self * (1.0 - t) + other * t
    }
}

/// Convert linear RGB color component into an sRGB color component
#[inline]
pub fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

/// Convert sRGB color component into a linear RGB color component
#[inline]
pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    HexExpected,
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::HexExpected => write!(f, "color format is #RRGGBB or #RRGGBBAA"),
        }
    }
}

impl std::error::Error for ColorError {}
