use bitflags::bitflags;

bitflags! {
    /// How a [`crate::TransformImageNode`] schedules its work.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct TransformImageOptions: u32 {
        /// Run transforms inline on the presentation thread and apply immediately
        const ATTEMPT_SYNCHRONOUSLY = 1 << 0;

        /// Defer applying results to the next display tick
        const DISPATCH_ON_DISPLAY_LINK = 1 << 1;
    }
}

impl Default for TransformImageOptions {
    fn default() -> Self {
        TransformImageOptions::DISPATCH_ON_DISPLAY_LINK
    }
}

impl TransformImageOptions {
    pub fn is_synchronous(&self) -> bool {
        self.contains(TransformImageOptions::ATTEMPT_SYNCHRONOUSLY)
    }

    /// Synchronous mode always applies right away.
    pub fn defers_to_display_tick(&self) -> bool {
        self.contains(TransformImageOptions::DISPATCH_ON_DISPLAY_LINK) && !self.is_synchronous()
    }
}

bitflags! {
    /// Which content changes get animated.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct ContentAnimations: u32 {
        /// Fade in the first image
        const FIRST_UPDATE = 1 << 0;

        /// Cross-fade from the old image to the new one
        const SUBSEQUENT_UPDATES = 1 << 1;
    }
}
