use crate::content::{Rgb, Sprite};

/// RGBA8 frame view handed to screens for drawing. Everything clips to the frame.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear(&mut self, color: [u8; 4]) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn fill_rect(&mut self, left: i32, top: i32, width: u32, height: u32, color: [u8; 4]) {
        let Some((x0, y0, x1, y1)) = self.clip(left, top, width, height) else {
            return;
        };
        let frame_width = self.width as usize;
        for y in y0..y1 {
            let row = y * frame_width;
            for x in x0..x1 {
                let offset = (row + x) * 4;
                blend_into(&mut self.frame[offset..offset + 4], color);
            }
        }
    }

    pub fn outline_rect(&mut self, left: i32, top: i32, width: u32, height: u32, color: [u8; 4]) {
        if width == 0 || height == 0 {
            return;
        }
        let right = left + width as i32 - 1;
        let bottom = top + height as i32 - 1;
        self.fill_rect(left, top, width, 1, color);
        self.fill_rect(left, bottom, width, 1, color);
        self.fill_rect(left, top, 1, height, color);
        self.fill_rect(right, top, 1, height, color);
    }

    /// Nearest-neighbour blit with its top-left at `(left, top)`. `alpha` scales the
    /// sprite's own alpha; `tint` replaces colour while keeping the shape.
    pub fn draw_sprite(
        &mut self,
        sprite: &Sprite,
        left: i32,
        top: i32,
        scale: u32,
        alpha: u8,
        tint: Option<Rgb>,
    ) {
        if sprite.width == 0 || sprite.height == 0 || alpha == 0 {
            return;
        }
        let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
        if sprite.rgba.len() < expected_rgba_len {
            return;
        }
        let scale = scale.max(1);
        let scaled_w = sprite.width.saturating_mul(scale);
        let scaled_h = sprite.height.saturating_mul(scale);
        let Some((x0, y0, x1, y1)) = self.clip(left, top, scaled_w, scaled_h) else {
            return;
        };

        let frame_width = self.width as usize;
        let sprite_width = sprite.width as usize;
        for out_y in y0..y1 {
            let src_y = ((out_y as i64 - top as i64) / scale as i64) as usize;
            for out_x in x0..x1 {
                let src_x = ((out_x as i64 - left as i64) / scale as i64) as usize;
                let src = (src_y * sprite_width + src_x) * 4;
                let src_alpha = sprite.rgba[src + 3];
                if src_alpha == 0 {
                    continue;
                }
                let combined = (u16::from(src_alpha) * u16::from(alpha) / 255) as u8;
                let color = match tint {
                    Some(tint) => tint.rgba(combined),
                    None => [
                        sprite.rgba[src],
                        sprite.rgba[src + 1],
                        sprite.rgba[src + 2],
                        combined,
                    ],
                };
                let dst = (out_y * frame_width + out_x) * 4;
                blend_into(&mut self.frame[dst..dst + 4], color);
            }
        }
    }

    fn clip(
        &self,
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    ) -> Option<(usize, usize, usize, usize)> {
        let x0 = i64::from(left).max(0);
        let y0 = i64::from(top).max(0);
        let x1 = (i64::from(left) + i64::from(width)).min(i64::from(self.width));
        let y1 = (i64::from(top) + i64::from(height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        let needed = (y1 as usize) * self.width as usize * 4;
        if needed > self.frame.len() {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }
}

fn blend_into(dst: &mut [u8], color: [u8; 4]) {
    let alpha = u16::from(color[3]);
    if alpha == 255 {
        dst.copy_from_slice(&color);
        return;
    }
    let inverse = 255 - alpha;
    for channel in 0..3 {
        let blended = (u16::from(color[channel]) * alpha + u16::from(dst[channel]) * inverse) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn fill_rect_clips_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(-2, 2, 10, 10, [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, 4, 0, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 3, 3), [255, 0, 0, 255]);
    }

    #[test]
    fn half_alpha_blends_with_background() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear([0, 0, 200, 255]);
        canvas.fill_rect(0, 0, 1, 1, [200, 0, 0, 128]);
        let blended = pixel(&frame, 1, 0, 0);
        assert_eq!(blended[0], 100);
        assert_eq!(blended[2], 99);
    }

    #[test]
    fn sprite_tint_keeps_shape() {
        let sprite = Sprite {
            width: 2,
            height: 1,
            rgba: vec![9, 9, 9, 255, 0, 0, 0, 0],
        };
        let mut frame = vec![0u8; 2 * 2 * 4];
        let mut canvas = Canvas::new(&mut frame, 2, 2);
        canvas.draw_sprite(&sprite, 0, 1, 1, 255, Some(Rgb::new(1, 2, 3)));
        assert_eq!(pixel(&frame, 2, 0, 1), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 2, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn sprite_scale_repeats_pixels() {
        let sprite = Sprite {
            width: 1,
            height: 1,
            rgba: vec![7, 7, 7, 255],
        };
        let mut frame = vec![0u8; 3 * 3 * 4];
        let mut canvas = Canvas::new(&mut frame, 3, 3);
        canvas.draw_sprite(&sprite, 1, 1, 2, 255, None);
        assert_eq!(pixel(&frame, 3, 2, 2), [7, 7, 7, 255]);
        assert_eq!(pixel(&frame, 3, 0, 0), [0, 0, 0, 0]);
    }
}
