//! Viewport tracking with debounced resizes.
//!
//! Hosts tend to deliver resize notifications in bursts while a window edge
//! is dragged. The [`ViewportManager`] records each notification as pending
//! and only applies it once no further notification arrived for the debounce
//! window (100 ms by default). Applying is always a separate step driven by
//! [`poll`](ViewportManager::poll) from the event loop, never done inside the
//! notification itself.
//!
//! ```ignore
//! let mut viewport = ViewportManager::new(Viewport::new(1280, 720, 1.0));
//! viewport.notify_resize(1300, 720, 1.0, now);
//! viewport.notify_resize(1400, 720, 1.0, now + 30ms);
//! assert!(viewport.poll(now + 60ms).is_none());
//! let applied = viewport.poll(now + 130ms); // Some(1400 x 720)
//! ```

use std::time::{Duration, Instant};

/// Default resize debounce window.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Upper bound on the device pixel ratio.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Container size and pixel density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Device pixel ratio, capped at [`MAX_PIXEL_RATIO`].
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(pixel_ratio),
        }
    }

    /// Render size for a window of the given physical size.
    ///
    /// Windows on displays denser than [`MAX_PIXEL_RATIO`] are rendered at
    /// the capped density, so the surface is smaller than the window.
    pub fn from_window(physical_width: u32, physical_height: u32, scale_factor: f64) -> Self {
        let ratio = clamp_pixel_ratio(scale_factor);
        let shrink = if scale_factor.is_finite() && scale_factor > ratio {
            ratio / scale_factor
        } else {
            1.0
        };
        Self {
            width: (physical_width as f64 * shrink).round() as u32,
            height: (physical_height as f64 * shrink).round() as u32,
            pixel_ratio: ratio,
        }
    }

    /// Width over height, or 1.0 for a degenerate viewport.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Whether there is anything to draw into.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Size as floats, for the shader.
    pub fn size_f32(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

fn clamp_pixel_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Debounces resize notifications into viewport updates.
#[derive(Debug, Clone)]
pub struct ViewportManager {
    current: Viewport,
    pending: Option<(Viewport, Instant)>,
    debounce: Duration,
    torn_down: bool,
}

impl ViewportManager {
    pub fn new(initial: Viewport) -> Self {
        Self::with_debounce(initial, RESIZE_DEBOUNCE)
    }

    pub fn with_debounce(initial: Viewport, debounce: Duration) -> Self {
        Self {
            current: initial,
            pending: None,
            debounce,
            torn_down: false,
        }
    }

    /// The last applied viewport.
    #[inline]
    pub fn current(&self) -> Viewport {
        self.current
    }

    /// Whether an update is waiting for its debounce window.
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a resize notification for a window of the given physical size
    /// and scale factor. Restarts the debounce window.
    ///
    /// Ignored after [`tear_down`](Self::tear_down).
    pub fn notify_resize(&mut self, width: u32, height: u32, scale_factor: f64, now: Instant) {
        if self.torn_down {
            return;
        }
        self.pending = Some((Viewport::from_window(width, height, scale_factor), now));
    }

    /// Apply the pending update if its debounce window has elapsed.
    ///
    /// Returns the newly applied viewport. Updates that do not change the
    /// viewport are dropped and yield `None`.
    pub fn poll(&mut self, now: Instant) -> Option<Viewport> {
        if self.torn_down {
            return None;
        }
        let (viewport, at) = self.pending?;
        if now.saturating_duration_since(at) < self.debounce {
            return None;
        }
        self.pending = None;
        if viewport == self.current {
            return None;
        }
        tracing::debug!(
            width = viewport.width,
            height = viewport.height,
            pixel_ratio = viewport.pixel_ratio,
            "applying resize"
        );
        self.current = viewport;
        Some(viewport)
    }

    /// When the pending update becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        self.pending.map(|(_, at)| at + self.debounce)
    }

    /// Drop any pending update without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Cancel pending work and ignore everything afterwards.
    pub fn tear_down(&mut self) {
        self.pending = None;
        self.torn_down = true;
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
