//! Image to tensor conversion.

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

/// Resize to `size`x`size`, scale to [0,1] and add a batch dimension.
///
/// Output layout is NHWC: `[1, size, size, 3]`, RGB channel order.
pub fn to_input_tensor(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = if image.dimensions() == (size, size) {
        image.clone()
    } else {
        imageops::resize(image, size, size, FilterType::Triangle)
    };

    let side = size as usize;
    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}
