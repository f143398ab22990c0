//! Windowed row layout for the virtual list.
//!
//! Rows start at the profile's estimated height and switch to their measured
//! height once rendered. Measurements are cached by [`ItemKey`], so a row keeps
//! its height when the item set is replaced or reordered.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::time::{Duration, Instant};

use super::item::ItemKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump straight to the target offset.
    Auto,
    /// Animate towards the target offset over the configured duration.
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    /// Move the least distance that makes the row fully visible.
    Nearest,
}

#[derive(Debug, Clone, Copy)]
struct ScrollAnimation {
    from: u32,
    to: u32,
    started: Instant,
    duration: Duration,
}

impl ScrollAnimation {
    fn offset_at(&self, now: Instant) -> (u32, bool) {
        let elapsed = now.saturating_duration_since(self.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            return (self.to, true);
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = 1.0 - (1.0 - t).powi(3);
        let from = f64::from(self.from);
        let to = f64::from(self.to);
        ((from + (to - from) * eased).round() as u32, false)
    }
}

#[derive(Debug, Clone)]
pub struct Viewport {
    estimated_height: u16,
    measured: HashMap<ItemKey, u16>,
    keys: Vec<ItemKey>,
    offsets: Vec<u32>,
    scroll_offset: u32,
    height: u16,
    overscan: usize,
    smooth_duration: Duration,
    animation: Option<ScrollAnimation>,
}

impl Viewport {
    pub fn new(estimated_height: u16, overscan: usize) -> Self {
        Self {
            estimated_height: estimated_height.max(1),
            measured: HashMap::new(),
            keys: Vec::new(),
            offsets: vec![0],
            scroll_offset: 0,
            height: 0,
            overscan,
            smooth_duration: Duration::from_millis(180),
            animation: None,
        }
    }

    pub fn with_smooth_duration(mut self, duration: Duration) -> Self {
        self.smooth_duration = duration;
        self
    }

    /// Replaces the row set. Measurements for keys that disappeared are dropped.
    pub fn reset(&mut self, keys: Vec<ItemKey>) {
        let live: HashSet<&ItemKey> = keys.iter().collect();
        self.measured.retain(|key, _| live.contains(key));
        self.keys = keys;
        self.rebuild_offsets();
        self.animation = None;
        self.clamp_offset();
    }

    /// Records the rendered height of a row. Returns `true` when the layout changed.
    pub fn measure(&mut self, index: usize, height: u16) -> bool {
        let Some(key) = self.keys.get(index) else {
            return false;
        };
        let previous = self.row_height(index);
        self.measured.insert(key.clone(), height);
        if previous == height {
            return false;
        }
        self.rebuild_offsets();
        self.clamp_offset();
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn estimated_height(&self) -> u16 {
        self.estimated_height
    }

    pub fn row_height(&self, index: usize) -> u16 {
        self.keys
            .get(index)
            .and_then(|key| self.measured.get(key).copied())
            .unwrap_or(self.estimated_height)
    }

    pub fn row_top(&self, index: usize) -> u32 {
        self.offsets
            .get(index)
            .copied()
            .unwrap_or_else(|| self.total_height())
    }

    pub fn total_height(&self) -> u32 {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = height;
        self.clamp_offset();
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn max_offset(&self) -> u32 {
        self.total_height().saturating_sub(u32::from(self.height))
    }

    /// Where scrolling will come to rest: the animation target if one is running.
    pub fn scroll_target(&self) -> u32 {
        self.animation
            .map(|animation| animation.to)
            .unwrap_or(self.scroll_offset)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Row containing the given content line.
    pub fn index_at(&self, line: u32) -> Option<usize> {
        if line >= self.total_height() {
            return None;
        }
        let after = self.offsets.partition_point(|top| *top <= line);
        after.checked_sub(1)
    }

    /// Rows intersecting the viewport.
    pub fn visible_range(&self) -> Range<usize> {
        if self.keys.is_empty() || self.height == 0 {
            return 0..0;
        }
        let Some(start) = self.index_at(self.scroll_offset) else {
            return 0..0;
        };
        let bottom = self.scroll_offset + u32::from(self.height);
        let end = self.offsets.partition_point(|top| *top < bottom).min(self.len());
        start..end.max(start + 1)
    }

    /// Rows that get materialized: the visible range plus overscan on both sides.
    pub fn mounted_range(&self) -> Range<usize> {
        let visible = self.visible_range();
        if visible.is_empty() {
            return visible;
        }
        let start = visible.start.saturating_sub(self.overscan);
        let end = (visible.end + self.overscan).min(self.len());
        start..end
    }

    /// Immediately scrolls the least distance that brings `index` into view.
    pub fn scroll_into_view(&mut self, index: usize) {
        if index >= self.len() {
            return;
        }
        let target = self.offset_for(index, Align::Nearest);
        self.animation = None;
        self.scroll_offset = target;
    }

    pub fn scroll_to_index(
        &mut self,
        index: usize,
        align: Align,
        behavior: ScrollBehavior,
        now: Instant,
    ) {
        if index >= self.len() {
            return;
        }
        let target = self.offset_for(index, align);
        match behavior {
            ScrollBehavior::Auto => {
                self.animation = None;
                self.scroll_offset = target;
            }
            ScrollBehavior::Smooth => {
                self.animation = Some(ScrollAnimation {
                    from: self.scroll_offset,
                    to: target,
                    started: now,
                    duration: self.smooth_duration,
                });
            }
        }
    }

    pub fn scroll_by(&mut self, delta: i32) {
        self.animation = None;
        let next = i64::from(self.scroll_offset) + i64::from(delta);
        let clamped = next.clamp(0, i64::from(self.max_offset()));
        self.scroll_offset = u32::try_from(clamped).unwrap_or(0);
    }

    pub fn scroll_to_top(&mut self) {
        self.animation = None;
        self.scroll_offset = 0;
    }

    /// Advances a running smooth scroll. Returns `true` while the offset moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };
        let (offset, finished) = animation.offset_at(now);
        let changed = offset != self.scroll_offset;
        self.scroll_offset = offset.min(self.max_offset());
        if finished {
            self.animation = None;
        }
        changed
    }

    fn offset_for(&self, index: usize, align: Align) -> u32 {
        let top = self.row_top(index);
        let row = u32::from(self.row_height(index));
        let view = u32::from(self.height);
        let target = match align {
            Align::Start => top,
            Align::End => (top + row).saturating_sub(view),
            Align::Center => (top + row / 2).saturating_sub(view / 2),
            Align::Nearest => {
                if top < self.scroll_offset || row >= view {
                    top
                } else if top + row > self.scroll_offset + view {
                    top + row - view
                } else {
                    self.scroll_offset
                }
            }
        };
        target.min(self.max_offset())
    }

    fn rebuild_offsets(&mut self) {
        let mut offsets = Vec::with_capacity(self.keys.len() + 1);
        let mut running = 0u32;
        offsets.push(running);
        for index in 0..self.keys.len() {
            running += u32::from(self.row_height(index));
            offsets.push(running);
        }
        self.offsets = offsets;
    }

    fn clamp_offset(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
    }
}
