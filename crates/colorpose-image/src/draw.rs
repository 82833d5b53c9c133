use crate::image::Image;

#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x >= 0 && x < img.width() as i64 && y >= 0 && y < img.height() as i64 {
        let start = (y as usize * img.width() + x as usize) * C;
        img.as_slice_mut()[start..start + C].copy_from_slice(&color);
    }
}

/// Draws the outline of an axis aligned rectangle inplace.
///
/// Pixels falling outside the image are skipped.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `top_left` - The top-left corner as (x, y).
/// * `size` - The rectangle size as (width, height).
/// * `color` - The color of the outline.
/// * `thickness` - The thickness of the outline, grown towards the inside.
pub fn draw_rect<const C: usize>(
    img: &mut Image<u8, C>,
    top_left: (i64, i64),
    size: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (x0, y0) = top_left;
    let (w, h) = size;
    if w <= 0 || h <= 0 {
        return;
    }
    let (x1, y1) = (x0 + w - 1, y0 + h - 1);

    for t in 0..thickness as i64 {
        for x in x0..=x1 {
            set_pixel(img, x, y0 + t, color);
            set_pixel(img, x, y1 - t, color);
        }
        for y in y0..=y1 {
            set_pixel(img, x0 + t, y, color);
            set_pixel(img, x1 - t, y, color);
        }
    }
}
