//! Per-view state that outlives individual documents.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Remembered scroll offsets, keyed by subject id. Owned by the parent view and
/// handed to every [`Viewport`] it creates, so nothing leaks between views.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollPositionCache {
    offsets: HashMap<String, f32>,
}

impl ScrollPositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, subject_id: &str) -> Option<f32> {
        self.offsets.get(subject_id).copied()
    }

    pub fn set(&mut self, subject_id: impl Into<String>, offset: f32) {
        self.offsets.insert(subject_id.into(), offset);
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Scroll state of one document view
#[derive(Debug)]
pub struct Viewport {
    subject_id: String,
    offset: f32,
    cache: Rc<RefCell<ScrollPositionCache>>,
}

impl Viewport {
    /// Open a view of `subject_id`, restoring its last offset from `cache`
    pub fn new(subject_id: impl Into<String>, cache: Rc<RefCell<ScrollPositionCache>>) -> Self {
        let subject_id = subject_id.into();
        let offset = cache.borrow().get(&subject_id).unwrap_or(0.0);
        Self {
            subject_id,
            offset,
            cache,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.offset = offset.max(0.0);
        self.cache
            .borrow_mut()
            .set(self.subject_id.clone(), self.offset);
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to(self.offset + delta);
    }

    /// Keep `top..bottom` visible in a viewport `height` tall
    pub fn reveal(&mut self, top: f32, bottom: f32, height: f32) {
        if top < self.offset {
            self.scroll_to(top);
        } else if bottom > self.offset + height {
            self.scroll_to(bottom - height);
        }
    }
}
