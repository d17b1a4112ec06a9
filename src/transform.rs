//! Logical ↔ device coordinate mapping.
//!
//! Token positions live in a zoom/pan independent *logical* space. What the
//! participant sees is the *device* projection:
//!
//! ```text
//! device  = offset + logical * scale
//! logical = (device - offset) / scale
//! ```
//!
//! The mapping is affine with a uniform scale and no rotation. Stored output
//! coordinates are logical, so this mapping must stay exactly as written.

use crate::config::ZoomConfig;

/// A position in either coordinate space. Which one is always clear from the
/// function it is passed to.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned bounding box of a set of logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Returns `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let seed = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        Some(points.fold(seed, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Result of a pivot zoom that actually changed the scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomChange {
    pub previous_scale: f32,
    pub scale: f32,
    pub display_percentage: u32,
}

/// Scale and offset of the canvas view.
///
/// `scale` is clamped to `[min_scale, max_scale]` by every mutator. The
/// offset is unbounded until [`Transform::clamp_offset`] is called.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    min_scale: f32,
    max_scale: f32,
    max_display_percentage: u32,
}

impl Transform {
    /// Start at `min_scale` with the logical origin at the canvas centre.
    pub fn new(zoom: &ZoomConfig, canvas: Size) -> Self {
        let center = canvas.center();
        Self {
            scale: zoom.min_scale,
            offset_x: center.x,
            offset_y: center.y,
            min_scale: zoom.min_scale,
            max_scale: zoom.max_scale,
            max_display_percentage: zoom.max_display_percentage,
        }
    }

    /// Build a transform with an explicit state; `scale` is clamped.
    pub fn with_state(zoom: &ZoomConfig, scale: f32, offset: Point) -> Self {
        let mut transform = Self::new(zoom, Size::new(0.0, 0.0));
        transform.set_scale(scale);
        transform.set_offset(offset);
        transform
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Point {
        Point::new(self.offset_x, self.offset_y)
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(self.min_scale, self.max_scale);
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset_x = offset.x;
        self.offset_y = offset.y;
    }

    pub fn logical_to_device(&self, logical: Point) -> Point {
        Point::new(
            self.offset_x + logical.x * self.scale,
            self.offset_y + logical.y * self.scale,
        )
    }

    pub fn device_to_logical(&self, device: Point) -> Point {
        Point::new(
            (device.x - self.offset_x) / self.scale,
            (device.y - self.offset_y) / self.scale,
        )
    }

    /// Zoom by `factor` keeping the logical point under `pivot` (device
    /// space) visually fixed.
    ///
    /// Returns `None` when clamping leaves the scale unchanged, in which case
    /// the offset is untouched as well.
    pub fn pivot_zoom(&mut self, pivot: Point, factor: f32) -> Option<ZoomChange> {
        let logical = self.device_to_logical(pivot);
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if new_scale == self.scale {
            return None;
        }

        let previous_scale = self.scale;
        self.scale = new_scale;

        // Where the pivot's logical point lands before the offset catches up.
        let drifted = self.logical_to_device(logical);
        self.offset_x += pivot.x - drifted.x;
        self.offset_y += pivot.y - drifted.y;

        Some(ZoomChange {
            previous_scale,
            scale: new_scale,
            display_percentage: self.display_percentage(),
        })
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Put `logical` at the centre of a canvas of the given size.
    pub fn center_on(&mut self, logical: Point, canvas: Size) {
        let center = canvas.center();
        self.offset_x = center.x - logical.x * self.scale;
        self.offset_y = center.y - logical.y * self.scale;
    }

    /// Constrain the offset so the token bounds, padded by half a token and
    /// `margin`, project inside the canvas.
    ///
    /// On an axis where the padded bounds are larger than the canvas, the
    /// bounds must cover the canvas instead. Returns whether the offset moved.
    pub fn clamp_offset(
        &mut self,
        bounds: Bounds,
        token_size: Size,
        margin: f32,
        canvas: Size,
    ) -> bool {
        let margin_x = token_size.width / (2.0 * self.scale) + margin;
        let margin_y = token_size.height / (2.0 * self.scale) + margin;

        let x = clamp_axis(
            self.offset_x,
            bounds.min_x - margin_x,
            bounds.max_x + margin_x,
            self.scale,
            canvas.width,
        );
        let y = clamp_axis(
            self.offset_y,
            bounds.min_y - margin_y,
            bounds.max_y + margin_y,
            self.scale,
            canvas.height,
        );

        let moved = x != self.offset_x || y != self.offset_y;
        self.offset_x = x;
        self.offset_y = y;
        moved
    }

    /// Scale normalized to `0..=max_display_percentage`, rounded down.
    pub fn display_percentage(&self) -> u32 {
        let range = self.max_scale - self.min_scale;
        if range <= 0.0 {
            return 0;
        }
        let normalized = (self.scale - self.min_scale) / range;
        (normalized * self.max_display_percentage as f32).floor() as u32
    }

    pub fn zoom_label(&self) -> String {
        format!("Zoom: {}%", self.display_percentage())
    }
}

fn clamp_axis(offset: f32, low: f32, high: f32, scale: f32, extent: f32) -> f32 {
    // Offset at which `low` sits on the canvas' leading edge, and at which
    // `high` sits on its trailing edge.
    let leading = -low * scale;
    let trailing = extent - high * scale;
    let (lo, hi) = if trailing <= leading {
        (trailing, leading)
    } else {
        (leading, trailing)
    };
    offset.clamp(lo, hi)
}
