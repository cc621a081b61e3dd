use std::collections::VecDeque;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as chan;

use crate::geometry::Color;
use crate::jobs::{Scheduler, Submitted, Throttled};
use crate::raster::{DrawingContext, RenderedImage};
use crate::transform::TransformImageArguments;
use crate::{ContentAnimations, TransformImageOptions};

/// Turns layout arguments into a drawing context, or nothing.
pub type Transform =
    Arc<dyn Fn(&TransformImageArguments) -> Option<Box<dyn DrawingContext>> + Send + Sync>;

/// A stream of transforms, fed through a channel.
pub type TransformSender = chan::Sender<Transform>;
pub type TransformSource = chan::Receiver<Transform>;

pub fn transform_channel() -> (TransformSender, TransformSource) {
    chan::unbounded()
}

const CONTENT_ANIMATION_DURATION: Duration = Duration::from_millis(150);
const OVERLAY_FADE_OUT_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAnimation {
    /// Fade the first image in from transparent
    FadeIn,
    /// Fade the previous image out over the new one
    CrossFade,
    /// Fade a removed overlay out to transparent
    FadeOut,
}

impl ContentAnimation {
    pub fn duration(&self) -> Duration {
        match self {
            ContentAnimation::FadeIn | ContentAnimation::CrossFade => CONTENT_ANIMATION_DURATION,
            ContentAnimation::FadeOut => OVERLAY_FADE_OUT_DURATION,
        }
    }
}

/// Reported to the `image_updated` callback on every apply.
#[derive(Debug, Clone)]
pub struct ImageUpdate {
    /// The newly displayed image, if this apply changed it
    pub image: Option<RenderedImage>,
    pub animation: Option<ContentAnimation>,
}

/// Reported to the `overlay_updated` callback when the tint layer changes.
#[derive(Debug, Clone)]
pub struct OverlayUpdate {
    /// The tinted copy of the contents, `None` once the overlay is removed
    pub overlay: Option<RenderedImage>,
    pub animation: Option<ContentAnimation>,
}

struct TransformRequest {
    transform: Transform,
    arguments: TransformImageArguments,
}

struct TransformResult {
    transform: Transform,
    arguments: TransformImageArguments,
    image: Option<RenderedImage>,
}

/// `None` when the transform produced no drawing context.
type TransformOutput = Option<TransformResult>;

#[profiling::function]
fn compute(request: TransformRequest) -> TransformOutput {
    let context = (request.transform)(&request.arguments)?;
    let image = context.generate_image();
    if image.is_none() {
        tracing::debug!("rasterizer produced no image");
    }

    Some(TransformResult {
        transform: request.transform,
        arguments: request.arguments,
        image,
    })
}

#[derive(Default)]
struct RenderState {
    transform: Option<Transform>,
    arguments: Option<TransformImageArguments>,
    contents: Option<RenderedImage>,
    overlay_color: Option<Color>,
    /// Contents tinted with `overlay_color`, drawn on top of them
    overlay: Option<RenderedImage>,
}

type ImageUpdatedFn = dyn FnMut(&ImageUpdate);
type OverlayUpdatedFn = dyn FnMut(&OverlayUpdate);

/// Keeps one displayed image in sync with a changing transform and layout.
///
/// At most one transform runs at a time; while it runs only the newest
/// (transform, arguments) pair is kept, and it runs once the current one
/// finishes. Results come back through [`TransformImageNode::update`] and are
/// applied either right away or on the next [`TransformImageNode::display_tick`].
///
/// The node lives on the presentation thread and can't leave it; background
/// work only ever sees cloned requests.
pub struct TransformImageNode {
    scheduler: Arc<dyn Scheduler>,
    options: TransformImageOptions,
    content_animations: ContentAnimations,
    image_updated: Option<Box<ImageUpdatedFn>>,
    overlay_updated: Option<Box<OverlayUpdatedFn>>,

    source: Option<TransformSource>,
    latest_transform: Option<Transform>,
    latest_arguments: Option<TransformImageArguments>,

    throttled: Throttled<TransformRequest, TransformOutput>,
    display_link: VecDeque<TransformOutput>,
    render: RenderState,

    _presentation_thread: PhantomData<Rc<()>>,
}

impl TransformImageNode {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_options(scheduler, TransformImageOptions::default())
    }

    pub fn with_options(scheduler: Arc<dyn Scheduler>, options: TransformImageOptions) -> Self {
        let mut throttled = Throttled::new(scheduler.clone(), compute);
        throttled.set_synchronous(options.is_synchronous());

        Self {
            scheduler,
            options,
            content_animations: ContentAnimations::empty(),
            image_updated: None,
            overlay_updated: None,
            source: None,
            latest_transform: None,
            latest_arguments: None,
            throttled,
            display_link: VecDeque::new(),
            render: RenderState::default(),
            _presentation_thread: PhantomData,
        }
    }

    pub fn options(&self) -> TransformImageOptions {
        self.options
    }

    pub fn set_content_animations(&mut self, animations: ContentAnimations) {
        self.content_animations = animations;
    }

    pub fn set_image_updated(&mut self, callback: impl FnMut(&ImageUpdate) + 'static) {
        self.image_updated = Some(Box::new(callback));
    }

    pub fn set_overlay_updated(&mut self, callback: impl FnMut(&OverlayUpdate) + 'static) {
        self.overlay_updated = Some(Box::new(callback));
    }

    /// The displayed image.
    pub fn contents(&self) -> Option<&RenderedImage> {
        self.render.contents.as_ref()
    }

    pub fn overlay_color(&self) -> Option<Color> {
        self.render.overlay_color
    }

    /// The tint layer drawn over the contents, if any.
    pub fn overlay(&self) -> Option<&RenderedImage> {
        self.render.overlay.as_ref()
    }

    /// Tint the contents with `color`, or remove the tint with `None`.
    ///
    /// Setting the current color again does nothing. The tint follows every
    /// later contents change. Removal fades out when `animated`.
    pub fn set_overlay_color(&mut self, color: Option<Color>, animated: bool) {
        if self.render.overlay_color == color {
            return;
        }
        self.render.overlay_color = color;

        if color.is_some() {
            self.apply_overlay_color();
        } else if self.render.overlay.take().is_some() {
            self.notify_overlay(OverlayUpdate {
                overlay: None,
                animation: animated.then_some(ContentAnimation::FadeOut),
            });
        }
    }

    /// Arguments of the last applied result.
    pub fn current_arguments(&self) -> Option<&TransformImageArguments> {
        self.render.arguments.as_ref()
    }

    pub fn is_computing(&self) -> bool {
        self.throttled.is_in_flight()
    }

    pub fn has_pending(&self) -> bool {
        self.throttled.has_pending()
    }

    /// Replace the transform stream.
    ///
    /// Work started for the old stream is dropped; the displayed image stays
    /// until the new stream produces one.
    pub fn set_transform_source(
        &mut self,
        source: TransformSource,
        options: TransformImageOptions,
    ) {
        self.cancel_work();
        self.options = options;
        self.throttled.set_synchronous(options.is_synchronous());
        self.latest_transform = None;
        self.source = Some(source);
        self.pump_source();
    }

    /// Push a single transform, as if it arrived on the source.
    pub fn set_transform(&mut self, transform: Transform) {
        self.latest_transform = Some(transform);
        self.submit_latest();
    }

    /// Latest layout arguments. Repeats of the previous value are ignored.
    pub fn set_layout_arguments(&mut self, arguments: TransformImageArguments) {
        if self.latest_arguments.as_ref() == Some(&arguments) {
            return;
        }
        self.latest_arguments = Some(arguments);
        self.submit_latest();
    }

    /// Presentation pump: pull new transforms, collect finished work, apply it
    /// or queue it for the next display tick.
    #[profiling::function]
    pub fn update(&mut self) {
        self.pump_source();
        self.deliver_completed();
    }

    /// Apply everything that was waiting for a display tick, in order.
    pub fn display_tick(&mut self) {
        while let Some(output) = self.display_link.pop_front() {
            self.apply(output);
        }
    }

    /// Drop all work and the displayed image; the transform source is detached.
    /// The overlay color is kept for the next contents.
    pub fn reset(&mut self) {
        self.cancel_work();
        self.source = None;
        self.latest_transform = None;
        self.render = RenderState {
            overlay_color: self.render.overlay_color,
            ..RenderState::default()
        };
    }

    /// Snapshot for laying out off the presentation thread.
    pub fn async_layout(&self) -> AsyncLayout {
        AsyncLayout {
            transform: self.render.transform.clone(),
            arguments: self.render.arguments.clone(),
        }
    }

    /// Finish an [`AsyncLayout`] back on the presentation thread.
    pub fn apply_layout(&mut self, apply: LayoutApply) {
        if let Some(image) = apply.image {
            self.render.contents = Some(image);
            self.render.arguments = Some(apply.arguments.clone());
            self.apply_overlay_color();
        }
        self.set_layout_arguments(apply.arguments);
    }

    fn cancel_work(&mut self) {
        self.throttled.cancel();
        self.display_link.clear();
    }

    fn pump_source(&mut self) {
        let Some(source) = &self.source else {
            return;
        };

        let received: Vec<Transform> = source.try_iter().collect();
        for transform in received {
            self.latest_transform = Some(transform);
            self.submit_latest();
        }
    }

    fn submit_latest(&mut self) {
        let (Some(transform), Some(arguments)) = (&self.latest_transform, &self.latest_arguments)
        else {
            return;
        };

        let request = TransformRequest {
            transform: transform.clone(),
            arguments: arguments.clone(),
        };

        match self.throttled.submit(request) {
            Submitted::Started => tracing::trace!("transform started"),
            Submitted::Latched | Submitted::Replaced => {
                tracing::trace!("transform latched behind running one")
            }
            Submitted::Rejected => tracing::warn!("transform dropped, scheduler refused it"),
        }

        if self.options.is_synchronous() {
            self.deliver_completed();
        }
    }

    fn deliver_completed(&mut self) {
        let outputs = self.throttled.take_completed();
        if outputs.is_empty() {
            return;
        }

        if self.options.defers_to_display_tick() {
            self.display_link.extend(outputs);
            self.scheduler.request_display_tick();
        } else {
            for output in outputs {
                self.apply(output);
            }
        }
    }

    fn apply(&mut self, output: TransformOutput) {
        let mut update = ImageUpdate {
            image: None,
            animation: None,
        };

        if let Some(result) = output {
            if let Some(image) = result.image {
                update.animation = self.content_animation();
                self.render.contents = Some(image.clone());
                update.image = Some(image);
            }
            self.render.transform = Some(result.transform);
            self.render.arguments = Some(result.arguments);
        }

        self.apply_overlay_color();

        if let Some(image_updated) = &mut self.image_updated {
            image_updated(&update);
        }
    }

    /// Re-tint the current contents with the overlay color.
    fn apply_overlay_color(&mut self) {
        let (Some(color), Some(contents)) = (self.render.overlay_color, &self.render.contents)
        else {
            return;
        };

        let overlay = contents.tinted(color);
        self.render.overlay = Some(overlay.clone());
        self.notify_overlay(OverlayUpdate {
            overlay: Some(overlay),
            animation: None,
        });
    }

    fn notify_overlay(&mut self, update: OverlayUpdate) {
        if let Some(overlay_updated) = &mut self.overlay_updated {
            overlay_updated(&update);
        }
    }

    fn content_animation(&self) -> Option<ContentAnimation> {
        if self.render.contents.is_none() {
            let animate = self
                .content_animations
                .contains(ContentAnimations::FIRST_UPDATE)
                && !self.options.is_synchronous();
            animate.then_some(ContentAnimation::FadeIn)
        } else {
            self.content_animations
                .contains(ContentAnimations::SUBSEQUENT_UPDATES)
                .then_some(ContentAnimation::CrossFade)
        }
    }
}

/// A node's applied transform and arguments, detached so layout can run on
/// any thread.
#[derive(Clone)]
pub struct AsyncLayout {
    transform: Option<Transform>,
    arguments: Option<TransformImageArguments>,
}

impl AsyncLayout {
    /// Redraw with the applied transform if `arguments` changed.
    pub fn layout(self, arguments: TransformImageArguments) -> LayoutApply {
        let image = if self.arguments.as_ref() != Some(&arguments) {
            self.transform
                .and_then(|transform| transform(&arguments))
                .and_then(|context| context.generate_image())
        } else {
            None
        };

        LayoutApply { arguments, image }
    }
}

/// Result of [`AsyncLayout::layout`], for [`TransformImageNode::apply_layout`].
pub struct LayoutApply {
    arguments: TransformImageArguments,
    image: Option<RenderedImage>,
}

impl LayoutApply {
    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }
}
