//! Draggable word tokens.
//!
//! A [`Token`] owns its logical centre. The device rectangle it carries is a
//! render cache: it is recomputed from the logical position by
//! [`Token::render`], or written directly while the token is being dragged
//! (in which case the logical position is derived back from it).
//!
//! Two independent state axes live here:
//!
//! - drag: `idle → dragging → idle`
//! - highlight: `unhighlighted ⇄ highlighted`
//!
//! The viewport's highlight mode decides which axis a click drives.

use slint::Color;

use crate::config::TokenConfig;
use crate::transform::{Point, Size, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

/// Read-only copy of a token handed to the trial sequencer.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSnapshot {
    pub id: TokenId,
    pub word: String,
    /// Logical coordinates.
    pub x: f32,
    pub y: f32,
    pub highlighted: bool,
}

/// Device-space rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DeviceRect {
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self {
            x: center.x - size.width / 2.0,
            y: center.y - size.height / 2.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Hit test against the ellipse inscribed in the rectangle.
    pub fn contains_in_ellipse(&self, p: Point) -> bool {
        let rx = self.width / 2.0;
        let ry = self.height / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let c = self.center();
        let dx = (p.x - c.x) / rx;
        let dy = (p.y - c.y) / ry;
        dx * dx + dy * dy <= 1.0
    }
}

/// Outline styling of a token as currently rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenVisual {
    pub outline: Color,
    pub outline_width: f32,
}

#[derive(Debug, Clone)]
pub struct Token {
    id: TokenId,
    word: String,
    logical: Point,
    size: Size,
    highlighted: bool,
    rect: DeviceRect,
    /// Pointer position relative to the rect's top-left at drag start.
    grab: Option<Point>,
}

impl Token {
    pub fn new(id: TokenId, word: impl Into<String>, size: Size) -> Self {
        Self {
            id,
            word: word.into(),
            logical: Point::default(),
            size,
            highlighted: false,
            rect: DeviceRect::default(),
            grab: None,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn logical(&self) -> Point {
        self.logical
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rect(&self) -> DeviceRect {
        self.rect
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Set the logical centre and render it.
    pub fn place(&mut self, logical: Point, transform: &Transform) {
        self.logical = logical;
        self.render(transform);
    }

    /// Recompute the device rectangle from the logical centre.
    pub fn render(&mut self, transform: &Transform) {
        let center = transform.logical_to_device(self.logical);
        self.rect = DeviceRect::centered_at(center, self.size);
    }

    /// Start dragging from `pointer` (device space).
    ///
    /// Ignored in highlight mode. Returns whether a drag started.
    pub fn begin_drag(&mut self, pointer: Point, highlight_mode: bool) -> bool {
        if highlight_mode {
            return false;
        }
        self.grab = Some(Point::new(pointer.x - self.rect.x, pointer.y - self.rect.y));
        true
    }

    /// Follow the pointer, keeping the token fully on the canvas.
    ///
    /// The logical position is derived from the new device centre using the
    /// transform as it is *now*, not as it was when the drag began. Returns
    /// `false` when no drag is in progress.
    pub fn drag_to(&mut self, pointer: Point, transform: &Transform, canvas: Size) -> bool {
        let Some(grab) = self.grab else {
            return false;
        };

        let x = (pointer.x - grab.x)
            .min(canvas.width - self.size.width)
            .max(0.0);
        let y = (pointer.y - grab.y)
            .min(canvas.height - self.size.height)
            .max(0.0);

        self.rect = DeviceRect {
            x,
            y,
            width: self.size.width,
            height: self.size.height,
        };
        self.logical = transform.device_to_logical(self.rect.center());
        true
    }

    pub fn end_drag(&mut self) {
        self.grab = None;
    }

    /// Flip the highlight flag. Only active in highlight mode; returns the
    /// new state, or `None` when ignored.
    pub fn toggle_highlight(&mut self, highlight_mode: bool) -> Option<bool> {
        if !highlight_mode {
            return None;
        }
        self.highlighted = !self.highlighted;
        Some(self.highlighted)
    }

    /// Outline for the current highlight state. Highlighted tokens keep
    /// their highlight outline whether or not highlight mode is on.
    pub fn visual(&self, style: &TokenConfig) -> TokenVisual {
        if self.highlighted {
            TokenVisual {
                outline: style.highlight_color(),
                outline_width: style.highlight_width,
            }
        } else {
            TokenVisual {
                outline: style.outline_color(),
                outline_width: style.outline_width,
            }
        }
    }

    pub fn contains_device_point(&self, p: Point) -> bool {
        self.rect.contains_in_ellipse(p)
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        TokenSnapshot {
            id: self.id,
            word: self.word.clone(),
            x: self.logical.x,
            y: self.logical.y,
            highlighted: self.highlighted,
        }
    }
}
