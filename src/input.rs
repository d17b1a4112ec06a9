//! Toolkit-independent input routing.
//!
//! The UI translates its native pointer, wheel and key callbacks into
//! [`InputEvent`]s; [`InputDispatcher`] applies them to a [`Viewport`] and
//! reports what changed as a [`ViewportEvent`].

use crate::config::Config;
use crate::token::TokenId;
use crate::transform::{Point, ZoomChange};
use crate::viewport::Viewport;

/// Arrow keys, the only keys the canvas reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    /// Positive delta zooms in, negative zooms out.
    WheelScroll { delta: f32 },
    KeyPress(ArrowKey),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    DragStarted(TokenId),
    TokenMoved(TokenId),
    DragEnded(TokenId),
    HighlightToggled { id: TokenId, highlighted: bool },
    Zoomed(ZoomChange),
    Panned { dx: f32, dy: f32 },
}

impl ViewportEvent {
    /// Whether token device positions changed and the UI should redraw them.
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, Self::DragEnded(_))
    }
}

pub struct InputDispatcher {
    zoom_factor: f32,
    pan_step: f32,
    active_drag: Option<TokenId>,
}

impl InputDispatcher {
    pub fn new(config: &Config) -> Self {
        Self {
            zoom_factor: config.zoom.zoom_factor,
            pan_step: config.controls.pan_step,
            active_drag: None,
        }
    }

    /// Token currently following the pointer, if any.
    pub fn active_drag(&self) -> Option<TokenId> {
        self.active_drag
    }

    /// Drop any drag in progress, e.g. before the canvas is cleared.
    pub fn cancel_drag(&mut self, viewport: &mut Viewport) {
        if let Some(id) = self.active_drag.take() {
            viewport.end_drag(id);
        }
    }

    pub fn dispatch(&mut self, viewport: &mut Viewport, event: InputEvent) -> Option<ViewportEvent> {
        match event {
            InputEvent::PointerDown(p) => {
                viewport.track_pointer(p);
                let id = viewport.token_at(p)?;
                // A click either highlights or starts a drag, never both.
                if viewport.highlight_mode() {
                    let highlighted = viewport.toggle_token_highlight(id)?;
                    Some(ViewportEvent::HighlightToggled { id, highlighted })
                } else if viewport.begin_drag(id, p) {
                    self.active_drag = Some(id);
                    Some(ViewportEvent::DragStarted(id))
                } else {
                    None
                }
            }
            InputEvent::PointerMove(p) => {
                viewport.track_pointer(p);
                let id = self.active_drag?;
                viewport
                    .drag_to(id, p)
                    .then_some(ViewportEvent::TokenMoved(id))
            }
            InputEvent::PointerUp(p) => {
                viewport.track_pointer(p);
                let id = self.active_drag.take()?;
                viewport.end_drag(id);
                Some(ViewportEvent::DragEnded(id))
            }
            InputEvent::WheelScroll { delta } => {
                let factor = if delta > 0.0 {
                    self.zoom_factor
                } else if delta < 0.0 {
                    1.0 / self.zoom_factor
                } else {
                    return None;
                };
                viewport.pivot_zoom(factor).map(ViewportEvent::Zoomed)
            }
            InputEvent::KeyPress(key) => {
                // Moving the offset right shifts the scene right, so the
                // left arrow pushes the offset in the positive direction.
                let step = self.pan_step;
                let (dx, dy) = match key {
                    ArrowKey::Left => (step, 0.0),
                    ArrowKey::Right => (-step, 0.0),
                    ArrowKey::Up => (0.0, step),
                    ArrowKey::Down => (0.0, -step),
                };
                viewport.pan(dx, dy);
                Some(ViewportEvent::Panned { dx, dy })
            }
        }
    }
}
