//! Reading-position preservation across transcript updates.
//!
//! Units are whatever the surface measures in (pixels, terminal rows); the
//! preserver only compares and subtracts them.

/// Distance from the bottom, in surface units, that still counts as anchored
pub const DEFAULT_ANCHOR_THRESHOLD: usize = 80;

/// Scroll geometry at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Distance from the top of the content to the top of the viewport
    pub offset: usize,
    pub viewport_height: usize,
    pub content_height: usize,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Gap between the viewport bottom and the content bottom
    pub fn distance_from_bottom(&self) -> usize {
        self.max_offset().saturating_sub(self.offset)
    }
}

/// What to do with the offset once the new content is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPlan {
    StickToBottom,
    /// Keep `content_height - offset` constant across the update
    KeepDistanceFromBottom(usize),
}

#[derive(Debug, Clone)]
pub struct ScrollPreserver {
    threshold: usize,
    anchored: bool,
}

impl Default for ScrollPreserver {
    fn default() -> Self {
        Self::new(DEFAULT_ANCHOR_THRESHOLD)
    }
}

impl ScrollPreserver {
    /// A fresh view starts anchored to the newest message
    pub fn new(threshold: usize) -> Self {
        Self { threshold, anchored: true }
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    /// Recompute the anchor after the reader scrolled
    pub fn on_user_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        self.anchored = metrics.distance_from_bottom() <= self.threshold;
        self.anchored
    }

    /// Capture the plan before the content changes
    pub fn before_update(&self, metrics: ScrollMetrics, force_bottom: bool) -> ScrollPlan {
        if force_bottom || self.anchored {
            ScrollPlan::StickToBottom
        } else {
            let distance = metrics.content_height.saturating_sub(metrics.offset);
            ScrollPlan::KeepDistanceFromBottom(distance)
        }
    }

    /// Resolve the plan against the new layout and return the offset to apply
    pub fn after_update(
        &mut self,
        plan: ScrollPlan,
        viewport_height: usize,
        new_content_height: usize,
    ) -> usize {
        let max_offset = new_content_height.saturating_sub(viewport_height);
        match plan {
            ScrollPlan::StickToBottom => {
                self.anchored = true;
                max_offset
            }
            ScrollPlan::KeepDistanceFromBottom(distance) => {
                new_content_height.saturating_sub(distance).min(max_offset)
            }
        }
    }

    /// Back to the initial anchored state, used when the conversation changes
    pub fn reset(&mut self) {
        self.anchored = true;
    }
}
