use std::fmt;
use std::sync::Arc;

use crate::geometry::{Color, EdgeInsets, Rect, Size};

/// One corner of a transformed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageCorner {
    Corner(f32),
    /// A bubble tail; widens its side of the drawing area by `width`.
    Tail { radius: f32, width: f32 },
}

impl Default for ImageCorner {
    fn default() -> Self {
        ImageCorner::Corner(0.0)
    }
}

impl ImageCorner {
    pub fn radius(&self) -> f32 {
        match self {
            ImageCorner::Corner(radius) => *radius,
            ImageCorner::Tail { radius, .. } => *radius,
        }
    }

    fn extended_width(&self) -> f32 {
        match self {
            ImageCorner::Corner(_) => 0.0,
            ImageCorner::Tail { width, .. } => *width,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageCorners {
    pub top_left: ImageCorner,
    pub top_right: ImageCorner,
    pub bottom_left: ImageCorner,
    pub bottom_right: ImageCorner,
}

impl ImageCorners {
    pub fn uniform(radius: f32) -> Self {
        let corner = ImageCorner::Corner(radius);
        Self {
            top_left: corner,
            top_right: corner,
            bottom_left: corner,
            bottom_right: corner,
        }
    }

    /// Extra room needed outside the image for bottom tails.
    pub fn extended_edges(&self) -> EdgeInsets {
        EdgeInsets::new(
            0.0,
            self.bottom_left.extended_width(),
            0.0,
            self.bottom_right.extended_width(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformImageResizeMode {
    Fill(Color),
    AspectFill,
    BlurBackground,
}

impl Default for TransformImageResizeMode {
    fn default() -> Self {
        TransformImageResizeMode::Fill(Color::BLACK)
    }
}

/// Caller-defined extra arguments, compared by their serialized form.
pub trait TransformImageCustomArguments: Send + Sync {
    fn serialized(&self) -> serde_json::Value;
}

/// Everything a transform needs to lay out and draw an image.
#[derive(Clone, Default)]
pub struct TransformImageArguments {
    pub corners: ImageCorners,
    pub image_size: Size,
    pub bounding_size: Size,
    pub intrinsic_insets: EdgeInsets,
    pub resize_mode: TransformImageResizeMode,
    pub empty_color: Option<Color>,
    pub custom: Option<Arc<dyn TransformImageCustomArguments>>,
    pub scale: Option<f32>,
}

impl TransformImageArguments {
    pub fn new(
        corners: ImageCorners,
        image_size: Size,
        bounding_size: Size,
        intrinsic_insets: EdgeInsets,
    ) -> Self {
        Self {
            corners,
            image_size,
            bounding_size,
            intrinsic_insets,
            ..Default::default()
        }
    }

    pub fn with_resize_mode(mut self, resize_mode: TransformImageResizeMode) -> Self {
        self.resize_mode = resize_mode;
        self
    }

    pub fn with_empty_color(mut self, color: Color) -> Self {
        self.empty_color = Some(color);
        self
    }

    pub fn with_custom(mut self, custom: impl TransformImageCustomArguments + 'static) -> Self {
        self.custom = Some(Arc::new(custom));
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Corner extensions plus intrinsic insets.
    pub fn insets(&self) -> EdgeInsets {
        self.corners.extended_edges() + self.intrinsic_insets
    }

    pub fn drawing_size(&self) -> Size {
        let insets = self.insets();
        Size::new(
            self.bounding_size.width + insets.horizontal(),
            self.bounding_size.height + insets.vertical(),
        )
    }

    pub fn drawing_rect(&self) -> Rect {
        let insets = self.insets();
        Rect::new(
            insets.left,
            insets.top,
            self.bounding_size.width,
            self.bounding_size.height,
        )
    }

    /// The image centered in the drawing rect, snapped down to whole points.
    pub fn image_rect(&self) -> Rect {
        let drawing_rect = self.drawing_rect();
        Rect::new(
            drawing_rect.min_x() + ((drawing_rect.width - self.image_size.width) / 2.0).floor(),
            drawing_rect.min_y() + ((drawing_rect.height - self.image_size.height) / 2.0).floor(),
            self.image_size.width,
            self.image_size.height,
        )
    }
}

fn custom_eq(
    lhs: &Option<Arc<dyn TransformImageCustomArguments>>,
    rhs: &Option<Arc<dyn TransformImageCustomArguments>>,
) -> bool {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => Arc::ptr_eq(lhs, rhs) || lhs.serialized() == rhs.serialized(),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for TransformImageArguments {
    fn eq(&self, other: &Self) -> bool {
        self.image_size == other.image_size
            && self.bounding_size == other.bounding_size
            && self.corners == other.corners
            && self.intrinsic_insets == other.intrinsic_insets
            && self.resize_mode == other.resize_mode
            && self.empty_color == other.empty_color
            && self.scale == other.scale
            && custom_eq(&self.custom, &other.custom)
    }
}

impl fmt::Debug for TransformImageArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformImageArguments")
            .field("corners", &self.corners)
            .field("image_size", &self.image_size)
            .field("bounding_size", &self.bounding_size)
            .field("intrinsic_insets", &self.intrinsic_insets)
            .field("resize_mode", &self.resize_mode)
            .field("empty_color", &self.empty_color)
            .field("custom", &self.custom.as_ref().map(|c| c.serialized()))
            .field("scale", &self.scale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Blur {
        radius: u32,
    }

    impl TransformImageCustomArguments for Blur {
        fn serialized(&self) -> serde_json::Value {
            json!(["blur", self.radius])
        }
    }

    fn args() -> TransformImageArguments {
        TransformImageArguments::new(
            ImageCorners::uniform(4.0),
            Size::new(100.0, 50.0),
            Size::new(80.0, 40.0),
            EdgeInsets::new(1.0, 2.0, 3.0, 4.0),
        )
    }

    #[test]
    fn geometry_without_tails() {
        let a = args();
        assert_eq!(a.drawing_size(), Size::new(86.0, 44.0));
        assert_eq!(a.drawing_rect(), Rect::new(2.0, 1.0, 80.0, 40.0));
        assert_eq!(a.image_rect(), Rect::new(-8.0, -4.0, 100.0, 50.0));
    }

    #[test]
    fn bottom_tail_extends_its_side() {
        let mut a = args();
        a.corners.bottom_left = ImageCorner::Tail {
            radius: 4.0,
            width: 6.0,
        };
        assert_eq!(a.insets(), EdgeInsets::new(1.0, 8.0, 3.0, 4.0));
        assert_eq!(a.drawing_size(), Size::new(92.0, 44.0));
        assert_eq!(a.drawing_rect().min_x(), 8.0);
    }

    #[test]
    fn image_rect_floors_centering() {
        let a = TransformImageArguments::new(
            ImageCorners::default(),
            Size::new(3.0, 3.0),
            Size::new(10.0, 10.0),
            EdgeInsets::ZERO,
        );
        assert_eq!(a.image_rect(), Rect::new(3.0, 3.0, 3.0, 3.0));
    }

    #[test]
    fn custom_payloads_compare_by_serialization() {
        let a = args().with_custom(Blur { radius: 3 });
        let b = args().with_custom(Blur { radius: 3 });
        let c = args().with_custom(Blur { radius: 4 });

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, args());
        assert_eq!(args(), args());
    }

    #[test]
    fn every_field_counts() {
        assert_ne!(args(), args().with_scale(2.0));
        assert_ne!(args(), args().with_empty_color(Color::WHITE));
        assert_ne!(
            args(),
            args().with_resize_mode(TransformImageResizeMode::AspectFill)
        );

        let mut insets = args();
        insets.intrinsic_insets = EdgeInsets::ZERO;
        assert_ne!(args(), insets);
    }
}
