//! Input latching between event handlers and the tick
//!
//! Pointer, touch and keyboard handlers only record the latest desired paddle
//! movement here. The session reads it once at the top of every frame, so a
//! frame without any input simply leaves the paddle where it is.

use glam::Vec2;

use crate::sim::{PaddleIntent, Rect};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "Right" | "d" | "D" => Some(Key::Right),
            _ => None,
        }
    }
}

/// Latest paddle input, written by handlers and read once per frame
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    /// Pointer/touch x in canvas space, cleared once read
    pointer_x: Option<f32>,
    left_held: bool,
    right_held: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an absolute pointer position (canvas space)
    pub fn pointer_moved(&mut self, x: f32) {
        if x.is_finite() {
            self.pointer_x = Some(x);
        }
    }

    pub fn key_down(&mut self, key: Key) {
        match key {
            Key::Left => self.left_held = true,
            Key::Right => self.right_held = true,
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Left => self.left_held = false,
            Key::Right => self.right_held = false,
        }
    }

    /// Drop all held state (focus loss, screen switch)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Intent for this frame; a fresh pointer position wins over keys
    pub fn take_intent(&mut self) -> PaddleIntent {
        if let Some(x) = self.pointer_x.take() {
            return PaddleIntent::MoveTo(x);
        }
        match (self.left_held, self.right_held) {
            (true, false) => PaddleIntent::Left,
            (false, true) => PaddleIntent::Right,
            _ => PaddleIntent::Hold,
        }
    }
}

/// Convert one client-space axis to canvas space when the canvas is CSS-scaled
pub fn client_to_canvas(client: f32, rect_start: f32, rect_extent: f32, canvas_extent: f32) -> f32 {
    if rect_extent <= 0.0 {
        return client - rect_start;
    }
    (client - rect_start) * canvas_extent / rect_extent
}

/// Level select buttons, laid out row-major and centred horizontally
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelGrid {
    pub left: f32,
    pub top: f32,
    pub cell: f32,
    pub gap: f32,
    pub columns: u32,
    pub levels: u32,
}

impl LevelGrid {
    const COLUMNS: u32 = 10;
    const CELL: f32 = 36.0;
    const GAP: f32 = 6.0;
    const TOP: f32 = 110.0;

    pub fn new(canvas_width: f32, levels: u32) -> Self {
        let columns = Self::COLUMNS;
        let row_width = columns as f32 * (Self::CELL + Self::GAP) - Self::GAP;
        Self {
            left: ((canvas_width - row_width) / 2.0).max(0.0),
            top: Self::TOP,
            cell: Self::CELL,
            gap: Self::GAP,
            columns,
            levels,
        }
    }

    /// Button for `level` (1-based)
    pub fn cell_rect(&self, level: u32) -> Option<Rect> {
        if level == 0 || level > self.levels {
            return None;
        }
        let index = level - 1;
        let step = self.cell + self.gap;
        Some(Rect::new(
            self.left + (index % self.columns) as f32 * step,
            self.top + (index / self.columns) as f32 * step,
            self.cell,
            self.cell,
        ))
    }

    /// Level whose button contains the canvas point, gaps excluded
    pub fn level_at(&self, x: f32, y: f32) -> Option<u32> {
        let step = self.cell + self.gap;
        let (dx, dy) = (x - self.left, y - self.top);
        if !(dx >= 0.0 && dy >= 0.0) {
            return None;
        }
        let col = (dx / step) as u32;
        let row = (dy / step) as u32;
        if col >= self.columns {
            return None;
        }
        let level = row.checked_mul(self.columns)?.checked_add(col + 1)?;
        self.cell_rect(level)
            .filter(|rect| rect.contains_point(Vec2::new(x, y)))
            .map(|_| level)
    }
}
