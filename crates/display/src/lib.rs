//! Asynchronous image transform pipeline and alert text content.
//!
//! A [`TransformImageNode`] keeps a displayed image in sync with a stream of
//! transforms and layout arguments, computing at most one image at a time
//! off the presentation thread.

pub mod alert;
mod config;
mod error;
pub mod geometry;
pub mod jobs;
pub mod logging;
mod options;
pub mod raster;
mod result;
pub mod transform;

pub use config::DisplayConfig;
pub use display_markdown as markdown;
pub use error::Error;
pub use options::{ContentAnimations, TransformImageOptions};
pub use result::Result;
pub use transform::{
    transform_channel, ImageUpdate, Transform, TransformImageArguments, TransformImageNode,
};
