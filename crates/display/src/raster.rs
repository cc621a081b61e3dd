//! Drawing contexts and the images they rasterize to.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::geometry::{Color, Rect, Size};
use crate::transform::{Transform, TransformImageArguments};

/// Not-yet-rasterized pixels produced by a transform.
pub trait DrawingContext {
    /// `None` when nothing displayable could be produced.
    fn generate_image(&self) -> Option<RenderedImage>;
}

/// A displayable image. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pixels: Arc<RgbaImage>,
    scale: f32,
}

impl RenderedImage {
    pub fn new(pixels: RgbaImage, scale: f32) -> Self {
        Self {
            pixels: Arc::new(pixels),
            scale,
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Size in points.
    pub fn size(&self) -> Size {
        Size::new(
            self.pixels.width() as f32 / self.scale,
            self.pixels.height() as f32 / self.scale,
        )
    }

    /// Same underlying pixel buffer?
    pub fn ptr_eq(&self, other: &RenderedImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// The image used as a stencil: every pixel takes `color`, keeping the
    /// image's coverage as alpha.
    pub fn tinted(&self, color: Color) -> RenderedImage {
        let mut pixels = (*self.pixels).clone();
        for p in pixels.pixels_mut() {
            let alpha = (p[3] as u16 * color.a as u16 / 255) as u8;
            *p = Rgba([color.r, color.g, color.b, alpha]);
        }
        RenderedImage::new(pixels, self.scale)
    }
}

impl PartialEq for RenderedImage {
    fn eq(&self, other: &Self) -> bool {
        self.scale == other.scale && (self.ptr_eq(other) || *self.pixels == *other.pixels)
    }
}

/// Largest width or height, in pixels, a context will allocate.
pub const MAX_PIXEL_DIMENSION: u32 = 16_384;

/// An RGBA pixel buffer sized in points at a given scale.
///
/// Sizes beyond [`MAX_PIXEL_DIMENSION`] get an empty buffer, which
/// rasterizes to no image.
pub struct PixelDrawingContext {
    size: Size,
    scale: f32,
    buffer: RgbaImage,
}

impl PixelDrawingContext {
    pub fn new(size: Size, scale: f32) -> Self {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let width = (size.width * scale).ceil().max(0.0) as u32;
        let height = (size.height * scale).ceil().max(0.0) as u32;

        let buffer = if width > MAX_PIXEL_DIMENSION || height > MAX_PIXEL_DIMENSION {
            tracing::warn!("drawing context of {width}x{height} pixels is too large");
            RgbaImage::new(0, 0)
        } else {
            RgbaImage::new(width, height)
        };

        Self {
            size,
            scale,
            buffer,
        }
    }

    /// A context covering the full drawing area of `arguments`.
    pub fn for_arguments(arguments: &TransformImageArguments) -> Self {
        Self::new(arguments.drawing_size(), arguments.scale.unwrap_or(1.0))
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn fill(&mut self, color: Color) {
        let pixel = Rgba(color.to_array());
        for p in self.buffer.pixels_mut() {
            *p = pixel;
        }
    }

    /// Fill `rect` (in points), clipped to the context.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let pixel = Rgba(color.to_array());
        let to_px = |v: f32, max: u32| ((v * self.scale).round().max(0.0) as u32).min(max);

        let x0 = to_px(rect.min_x(), self.buffer.width());
        let x1 = to_px(rect.max_x(), self.buffer.width());
        let y0 = to_px(rect.min_y(), self.buffer.height());
        let y1 = to_px(rect.max_y(), self.buffer.height());

        for y in y0..y1 {
            for x in x0..x1 {
                self.buffer.put_pixel(x, y, pixel);
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.buffer
            .get_pixel_checked(x, y)
            .map(|p| Color::from_rgba(p[0], p[1], p[2], p[3]))
    }
}

impl DrawingContext for PixelDrawingContext {
    fn generate_image(&self) -> Option<RenderedImage> {
        if self.buffer.width() == 0 || self.buffer.height() == 0 {
            return None;
        }
        Some(RenderedImage::new(self.buffer.clone(), self.scale))
    }
}

/// A transform that fills the drawing rect with `color` and the rest of the
/// context with the arguments' empty color.
pub fn solid_fill_transform(color: Color) -> Transform {
    Arc::new(move |arguments: &TransformImageArguments| {
        let mut context = PixelDrawingContext::for_arguments(arguments);
        if let Some(empty) = arguments.empty_color {
            context.fill(empty);
        }
        context.fill_rect(arguments.drawing_rect(), color);
        Some(Box::new(context) as Box<dyn DrawingContext>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EdgeInsets;
    use crate::transform::ImageCorners;

    #[test]
    fn zero_sized_context_has_no_image() {
        let context = PixelDrawingContext::new(Size::ZERO, 2.0);
        assert!(context.generate_image().is_none());
    }

    #[test]
    fn scale_multiplies_pixels() {
        let context = PixelDrawingContext::new(Size::new(10.0, 5.0), 2.0);
        let image = context.generate_image().unwrap();
        assert_eq!(image.pixels().dimensions(), (20, 10));
        assert_eq!(image.size(), Size::new(10.0, 5.0));
    }

    #[test]
    fn oversized_context_has_no_image() {
        let context = PixelDrawingContext::new(Size::new(1.0e9, 1.0e9), 1.0);
        assert!(context.generate_image().is_none());

        let context = PixelDrawingContext::new(Size::new(f32::INFINITY, 4.0), 2.0);
        assert!(context.generate_image().is_none());

        let arguments = TransformImageArguments::new(
            ImageCorners::default(),
            Size::new(10.0, 10.0),
            Size::new(100_000.0, 100_000.0),
            EdgeInsets::ZERO,
        );
        let context = solid_fill_transform(Color::WHITE)(&arguments).unwrap();
        assert!(context.generate_image().is_none());
    }

    #[test]
    fn tinted_keeps_coverage() {
        let mut context = PixelDrawingContext::new(Size::new(2.0, 1.0), 1.0);
        context.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        let image = context.generate_image().unwrap();

        let red = Color::from_rgb(255, 0, 0);
        let tinted = image.tinted(red);
        assert_eq!(tinted.pixels().get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(tinted.pixels().get_pixel(1, 0).0, [255, 0, 0, 0]);
        assert!(!tinted.ptr_eq(&image));
    }

    #[test]
    fn fill_rect_is_clipped() {
        let mut context = PixelDrawingContext::new(Size::new(4.0, 4.0), 1.0);
        context.fill_rect(Rect::new(2.0, 2.0, 10.0, 10.0), Color::WHITE);
        assert_eq!(context.pixel(3, 3), Some(Color::WHITE));
        assert_eq!(context.pixel(1, 1), Some(Color::TRANSPARENT));
        assert_eq!(context.pixel(4, 4), None);
    }

    #[test]
    fn solid_fill_respects_insets() {
        let arguments = TransformImageArguments::new(
            ImageCorners::default(),
            Size::new(2.0, 2.0),
            Size::new(2.0, 2.0),
            EdgeInsets::new(1.0, 1.0, 1.0, 1.0),
        )
        .with_empty_color(Color::BLACK);

        let transform = solid_fill_transform(Color::WHITE);
        let image = transform(&arguments).unwrap().generate_image().unwrap();
        let pixels = image.pixels();
        assert_eq!(pixels.dimensions(), (4, 4));
        assert_eq!(pixels.get_pixel(0, 0).0, Color::BLACK.to_array());
        assert_eq!(pixels.get_pixel(1, 1).0, Color::WHITE.to_array());
        assert_eq!(pixels.get_pixel(2, 2).0, Color::WHITE.to_array());
        assert_eq!(pixels.get_pixel(3, 3).0, Color::BLACK.to_array());
    }
}
