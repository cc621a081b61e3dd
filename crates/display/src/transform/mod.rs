mod arguments;
mod node;

pub use arguments::{
    ImageCorner, ImageCorners, TransformImageArguments, TransformImageCustomArguments,
    TransformImageResizeMode,
};
pub use node::{
    transform_channel, AsyncLayout, ContentAnimation, ImageUpdate, LayoutApply, OverlayUpdate,
    Transform, TransformImageNode, TransformSender, TransformSource,
};
