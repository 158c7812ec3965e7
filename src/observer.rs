//! Scroll-reveal observer.
//!
//! Elements are registered by id and checked against the viewport whenever
//! the host reports a scroll or resize. The first time an element is at least
//! `threshold` visible, a [`Revealed`] message is sent on the subscription
//! channel and the element stops being watched. Reveals never revert.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::trace;

/// Vertical extent of an element in document coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Visible area of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_y: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(scroll_y: f64, height: f64) -> Self {
        Self { scroll_y, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible
    pub threshold: f64,
    /// Added to the viewport's bottom edge; negative pulls it up
    pub root_margin_bottom: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin_bottom: -50.0,
        }
    }
}

/// Sent once per element, the first time it becomes visible enough
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revealed {
    pub id: String,
}

/// Host-provided geometry lookup
pub trait Layout {
    fn bounds(&self, id: &str) -> Option<Bounds>;
}

impl<F> Layout for F
where
    F: Fn(&str) -> Option<Bounds>,
{
    fn bounds(&self, id: &str) -> Option<Bounds> {
        self(id)
    }
}

pub struct RevealObserver {
    options: ObserverOptions,
    watched: Vec<String>,
    revealed: HashSet<String>,
    tx: mpsc::UnboundedSender<Revealed>,
}

impl RevealObserver {
    pub fn new(options: ObserverOptions) -> (Self, mpsc::UnboundedReceiver<Revealed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = Self {
            options,
            watched: Vec::new(),
            revealed: HashSet::new(),
            tx,
        };
        (observer, rx)
    }

    /// Start watching an element. Already watched or revealed ids are ignored.
    pub fn observe(&mut self, id: impl Into<String>) {
        let id = id.into();
        if self.revealed.contains(&id) || self.watched.contains(&id) {
            return;
        }
        self.watched.push(id);
    }

    pub fn unobserve(&mut self, id: &str) {
        self.watched.retain(|watched| watched != id);
    }

    /// Drop everything known about `id`, so an element rendered again under it starts hidden
    pub fn forget(&mut self, id: &str) {
        self.unobserve(id);
        self.revealed.remove(id);
    }

    pub fn is_watching(&self, id: &str) -> bool {
        self.watched.iter().any(|watched| watched == id)
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Check every watched element against `viewport` and notify newly visible ones.
    ///
    /// Elements the layout does not know about stay watched. Returns how many
    /// elements were revealed by this call.
    pub fn evaluate(&mut self, viewport: Viewport, layout: &impl Layout) -> usize {
        let options = self.options;
        let mut newly = Vec::new();

        self.watched.retain(|id| {
            let Some(bounds) = layout.bounds(id) else {
                return true;
            };
            let ratio = intersection_ratio(bounds, viewport, options.root_margin_bottom);
            if ratio > 0.0 && ratio >= options.threshold {
                newly.push(id.clone());
                false
            } else {
                true
            }
        });

        for id in &newly {
            trace!(id = %id, "element revealed");
            self.revealed.insert(id.clone());
            // A dropped receiver only means nobody renders the flag any more.
            let _ = self.tx.send(Revealed { id: id.clone() });
        }

        newly.len()
    }
}

/// Visible fraction of `bounds` inside the viewport shrunk by the bottom margin
pub fn intersection_ratio(bounds: Bounds, viewport: Viewport, root_margin_bottom: f64) -> f64 {
    let root_top = viewport.scroll_y;
    let root_bottom = (viewport.scroll_y + viewport.height + root_margin_bottom).max(root_top);

    if bounds.height <= 0.0 {
        let inside = bounds.top >= root_top && bounds.top <= root_bottom;
        return if inside { 1.0 } else { 0.0 };
    }

    let visible = (bounds.bottom().min(root_bottom) - bounds.top.max(root_top)).max(0.0);
    (visible / bounds.height).min(1.0)
}
