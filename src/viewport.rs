//! The word space: a pannable, zoomable canvas holding word tokens.
//!
//! [`Viewport`] owns the [`Transform`] and every [`Token`] on the canvas.
//! Whenever scale or offset change, [`Viewport::update_all_positions`]
//! re-projects all tokens; tokens never refresh themselves.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use slint::{Color, SharedString};

use crate::config::{CanvasConfig, Config, PlacementConfig, TokenConfig};
use crate::token::{Token, TokenId, TokenSnapshot};
use crate::transform::{Bounds, Point, Size, Transform, ZoomChange};

/// Everything the UI needs to draw one token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenView {
    pub id: TokenId,
    pub word: SharedString,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub highlighted: bool,
    pub fill: Color,
    pub text_color: Color,
    pub outline: Color,
    pub outline_width: f32,
}

/// The canvas model behind the word space window.
///
/// Holds the tokens in insertion order, which is also drawing order: the
/// last token is on top and wins hit tests. All positions handed out
/// ([`TokenView`], [`Token::rect`]) are device coordinates; everything
/// recorded ([`TokenSnapshot`]) is logical.
pub struct Viewport {
    transform: Transform,
    canvas: Size,
    canvas_config: CanvasConfig,
    token_style: TokenConfig,
    placement: PlacementConfig,
    tokens: Vec<Token>,
    next_id: u32,
    highlight_mode: bool,
    last_pointer: Option<Point>,
    rng: SmallRng,
}

impl Viewport {
    /// An empty canvas at `min_scale`, sized from `config.canvas`, with
    /// placement jitter seeded from the OS.
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, SmallRng::from_os_rng())
    }

    /// Deterministic placement jitter, for tests and replays.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: SmallRng) -> Self {
        let canvas = config.canvas.size();
        Self {
            transform: Transform::new(&config.zoom, canvas),
            canvas,
            canvas_config: config.canvas.clone(),
            token_style: config.token.clone(),
            placement: config.placement.clone(),
            tokens: Vec::new(),
            next_id: 1,
            highlight_mode: false,
            last_pointer: None,
            rng,
        }
    }

    /// Current logical/device mapping.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn scale(&self) -> f32 {
        self.transform.scale()
    }

    pub fn offset(&self) -> Point {
        self.transform.offset()
    }

    /// Size of the drawing area in device pixels.
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Tokens in drawing order, bottom-most first.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn highlight_mode(&self) -> bool {
        self.highlight_mode
    }

    /// Last pointer position seen on the canvas; the wheel zoom pivot.
    pub fn last_pointer(&self) -> Option<Point> {
        self.last_pointer
    }

    pub fn track_pointer(&mut self, pointer: Point) {
        self.last_pointer = Some(pointer);
    }

    /// `"Zoom: {n}%"` with `n` normalized to `0..=500`.
    pub fn zoom_label(&self) -> String {
        self.transform.zoom_label()
    }

    /// Resize the canvas (window resize). Tokens keep their logical spots.
    pub fn set_canvas_size(&mut self, size: Size) {
        self.canvas = size;
        self.update_all_positions();
    }

    /// Logical point currently shown at the canvas centre.
    pub fn view_center(&self) -> Point {
        self.transform.device_to_logical(self.canvas.center())
    }

    // === Token collection ===

    /// Add a word near the centre of the current view.
    ///
    /// The position is jittered uniformly by up to half the configured range
    /// on each axis so words added in a row do not stack exactly.
    pub fn add_token(&mut self, word: impl Into<String>) -> TokenId {
        let center = self.view_center();
        let jitter_x = jitter(&mut self.rng, self.placement.jitter_x);
        let jitter_y = jitter(&mut self.rng, self.placement.jitter_y);
        self.add_token_at(word, Point::new(center.x + jitter_x, center.y + jitter_y))
    }

    /// Add a word at an exact logical position, on top of every other token.
    pub fn add_token_at(&mut self, word: impl Into<String>, logical: Point) -> TokenId {
        let id = TokenId(self.next_id);
        self.next_id += 1;

        let mut token = Token::new(id, word, self.token_style.size());
        token.place(logical, &self.transform);
        tracing::debug!(id = id.0, word = token.word(), x = logical.x, y = logical.y, "token placed");
        self.tokens.push(token);
        id
    }

    /// Returns whether a token with `id` existed.
    pub fn remove_token(&mut self, id: TokenId) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.id() != id);
        self.tokens.len() != before
    }

    /// Clear the canvas between trials.
    pub fn remove_all_tokens(&mut self) {
        self.tokens.clear();
    }

    /// Top-most token whose outline contains the device point.
    pub fn token_at(&self, device: Point) -> Option<TokenId> {
        self.tokens
            .iter()
            .rev()
            .find(|t| t.contains_device_point(device))
            .map(Token::id)
    }

    /// Logical positions and highlight flags of every token, in drawing
    /// order. This is what a trial records.
    pub fn tokens_snapshot(&self) -> Vec<TokenSnapshot> {
        self.tokens.iter().map(Token::snapshot).collect()
    }

    /// Bounding box of the token centres, or `None` for an empty canvas.
    pub fn logical_bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.tokens.iter().map(Token::logical))
    }

    // === Per-token interaction ===

    /// Grab token `id` at the device `pointer` position.
    ///
    /// Returns `false` for an unknown id or while highlight mode is on,
    /// where presses toggle highlights instead.
    pub fn begin_drag(&mut self, id: TokenId, pointer: Point) -> bool {
        let highlight_mode = self.highlight_mode;
        self.tokens
            .iter_mut()
            .find(|t| t.id() == id)
            .is_some_and(|t| t.begin_drag(pointer, highlight_mode))
    }

    /// Move a grabbed token so it stays under the pointer, clamped to the
    /// canvas. Returns whether the token moved.
    pub fn drag_to(&mut self, id: TokenId, pointer: Point) -> bool {
        let transform = &self.transform;
        let canvas = self.canvas;
        self.tokens
            .iter_mut()
            .find(|t| t.id() == id)
            .is_some_and(|t| t.drag_to(pointer, transform, canvas))
    }

    pub fn end_drag(&mut self, id: TokenId) {
        if let Some(token) = self.tokens.iter_mut().find(|t| t.id() == id) {
            token.end_drag();
        }
    }

    /// Returns the token's new highlight state, or `None` outside highlight
    /// mode or for an unknown id.
    pub fn toggle_token_highlight(&mut self, id: TokenId) -> Option<bool> {
        let highlight_mode = self.highlight_mode;
        self.tokens
            .iter_mut()
            .find(|t| t.id() == id)
            .and_then(|t| t.toggle_highlight(highlight_mode))
    }

    /// Switch highlight mode and return the new mode. Existing highlights
    /// stay as they are.
    pub fn toggle_highlight_mode(&mut self) -> bool {
        self.highlight_mode = !self.highlight_mode;
        self.highlight_mode
    }

    // === View changes ===

    /// Zoom around the last tracked pointer position. No-op without one.
    pub fn pivot_zoom(&mut self, factor: f32) -> Option<ZoomChange> {
        let pivot = self.last_pointer?;
        self.pivot_zoom_at(pivot, factor)
    }

    /// Zoom by `factor` keeping the logical point under the device `pivot`
    /// fixed. `None` when the scale is already at its limit.
    pub fn pivot_zoom_at(&mut self, pivot: Point, factor: f32) -> Option<ZoomChange> {
        let change = self.transform.pivot_zoom(pivot, factor)?;
        tracing::debug!(
            scale = change.scale,
            percentage = change.display_percentage,
            "zoomed"
        );
        self.update_all_positions();
        Some(change)
    }

    /// Shift the view by a device-space delta.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.transform.pan(dx, dy);
        self.update_all_positions();
    }

    /// Keep the tokens reachable. Returns whether the view moved.
    pub fn clamp_offset(&mut self) -> bool {
        let Some(bounds) = self.logical_bounds() else {
            return false;
        };
        let moved = self.transform.clamp_offset(
            bounds,
            self.token_style.size(),
            self.canvas_config.safety_margin,
            self.canvas,
        );
        if moved {
            self.update_all_positions();
        }
        moved
    }

    /// Recenter the view.
    ///
    /// With no tokens the scale drops to `min_scale` and the logical origin
    /// returns to the canvas centre. Otherwise the scale is chosen to fit the
    /// token bounds with padding and the bounds' centre is put in the middle.
    pub fn reset_view(&mut self) {
        match self.logical_bounds() {
            None => {
                self.transform.set_scale(self.transform.min_scale());
                self.transform.center_on(Point::default(), self.canvas);
            }
            Some(bounds) => {
                self.transform.set_scale(self.fit_scale(&bounds));
                self.transform.center_on(bounds.center(), self.canvas);
            }
        }
        tracing::debug!(scale = self.transform.scale(), "view reset");
        self.update_all_positions();
    }

    fn fit_scale(&self, bounds: &Bounds) -> f32 {
        let padding = self.canvas_config.padding_factor;
        let room_x = self.canvas.width - self.token_style.width;
        let room_y = self.canvas.height - self.token_style.height;

        // A degenerate axis (all tokens in one row or column) does not
        // constrain the scale.
        let fit_x = (bounds.width() > 0.0).then(|| room_x / (bounds.width() * padding));
        let fit_y = (bounds.height() > 0.0).then(|| room_y / (bounds.height() * padding));

        match (fit_x, fit_y) {
            (Some(x), Some(y)) => x.min(y),
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => self.transform.min_scale(),
        }
    }

    /// Re-project every token through the current transform.
    pub fn update_all_positions(&mut self) {
        for token in &mut self.tokens {
            token.render(&self.transform);
        }
    }

    /// Device-space rendering data for every token, in drawing order.
    pub fn token_views(&self) -> Vec<TokenView> {
        let style = &self.token_style;
        self.tokens
            .iter()
            .map(|token| {
                let rect = token.rect();
                let visual = token.visual(style);
                TokenView {
                    id: token.id(),
                    word: token.word().into(),
                    x: rect.x,
                    y: rect.y,
                    width: rect.width,
                    height: rect.height,
                    highlighted: token.is_highlighted(),
                    fill: style.fill_color(),
                    text_color: style.text_color(),
                    outline: visual.outline,
                    outline_width: visual.outline_width,
                }
            })
            .collect()
    }
}

fn jitter(rng: &mut SmallRng, range: f32) -> f32 {
    let half = range / 2.0;
    rng.random_range(-half..=half)
}
