/// Avatar bitmap to notification icon payload
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use zbus::zvariant;

pub const BITS_PER_SAMPLE: i32 = 8;
pub const CHANNELS: i32 = 4;

/// Raw RGBA pixels in the layout the notification service expects for
/// the `icon_data` hint. Converts into a `(iiibiiay)` structure value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, zvariant::Value)]
pub struct IconPayload {
    pub width: i32,
    pub height: i32,
    pub rowstride: i32,
    /// Always true: the data carries four channels per pixel
    pub has_alpha: bool,
    pub bits_per_sample: i32,
    pub channels: i32,
    /// Row-major, four bytes per pixel in R, G, B, A order
    pub data: Vec<u8>,
}

/// Encode an image for the wire.
///
/// The source is always converted to 8-bit RGBA first, so paletted, grey,
/// 16-bit or float images end up in the same layout. Returns `None` for an
/// empty image: callers omit the hint instead of sending zero bytes.
pub fn encode(image: &DynamicImage) -> Option<IconPayload> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return None;
    }
    let width_i = i32::try_from(width).ok()?;
    let height_i = i32::try_from(height).ok()?;
    let rowstride = width_i.checked_mul(CHANNELS)?;

    let rgba = image.to_rgba8();
    let mut data = Vec::with_capacity(rgba.as_raw().len());
    // pixels() walks rows top to bottom, left to right within a row
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        data.extend_from_slice(&[r, g, b, a]);
    }

    Some(IconPayload {
        width: width_i,
        height: height_i,
        rowstride,
        has_alpha: true,
        bits_per_sample: BITS_PER_SAMPLE,
        channels: CHANNELS,
        data,
    })
}
