//! Canvas-space geometry for labels.
//!
//! All coordinates are canvas pixels. The drawable part of the canvas is the
//! [`Frame`]: the letterboxed region the image occupies after padding.

use serde::{Deserialize, Serialize};

/// Handle id of a label body (move handle).
pub const BODY_HANDLE: u8 = 0;

/// Number of resize handles on a box.
pub const BOX_HANDLE_COUNT: u8 = 8;

/// Handle dragged out when a box is created from a single click.
pub const CREATION_HANDLE: u8 = BoxHandle::BottomRight as u8;

/// A 2D point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The padded image region of the canvas. Labels live inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Frame {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Fit an image of the given size into a canvas, preserving aspect ratio
    /// and centring it (letterboxing).
    pub fn letterbox(canvas_width: f32, canvas_height: f32, image_width: f32, image_height: f32) -> Self {
        if image_width <= 0.0 || image_height <= 0.0 {
            return Self::new(0.0, 0.0, canvas_width, canvas_height);
        }
        let scale = (canvas_width / image_width).min(canvas_height / image_height);
        let width = image_width * scale;
        let height = image_height * scale;
        Self::new(
            (canvas_width - width) / 2.0,
            (canvas_height - height) / 2.0,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if a point is inside the frame (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Closest point inside the frame.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }
}

/// Resize handles of a box, numbered clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BoxHandle {
    TopLeft = 1,
    Top = 2,
    TopRight = 3,
    Right = 4,
    BottomRight = 5,
    Bottom = 6,
    BottomLeft = 7,
    Left = 8,
}

impl BoxHandle {
    pub fn all() -> &'static [BoxHandle] {
        &[
            BoxHandle::TopLeft,
            BoxHandle::Top,
            BoxHandle::TopRight,
            BoxHandle::Right,
            BoxHandle::BottomRight,
            BoxHandle::Bottom,
            BoxHandle::BottomLeft,
            BoxHandle::Left,
        ]
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::all().iter().copied().find(|h| *h as u8 == id)
    }

    fn moves_left(self) -> bool {
        matches!(self, BoxHandle::TopLeft | BoxHandle::BottomLeft | BoxHandle::Left)
    }

    fn moves_right(self) -> bool {
        matches!(self, BoxHandle::TopRight | BoxHandle::BottomRight | BoxHandle::Right)
    }

    fn moves_top(self) -> bool {
        matches!(self, BoxHandle::TopLeft | BoxHandle::TopRight | BoxHandle::Top)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, BoxHandle::BottomLeft | BoxHandle::BottomRight | BoxHandle::Bottom)
    }
}

/// An axis-aligned box. Width and height may be negative while a resize
/// drag is inverting the box; [`BoxGeometry::normalize`] fixes that up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxGeometry {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoxGeometry {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Zero-sized box anchored at a point.
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, 0.0, 0.0)
    }

    /// Flip the origin so that width and height are non-negative.
    pub fn normalize(&mut self) {
        if self.w < 0.0 {
            self.x += self.w;
            self.w = -self.w;
        }
        if self.h < 0.0 {
            self.y += self.h;
            self.h = -self.h;
        }
    }

    /// Check if a point is inside the box (edges included).
    pub fn contains(&self, point: &Point) -> bool {
        let (x0, x1) = (self.x.min(self.x + self.w), self.x.max(self.x + self.w));
        let (y0, y1) = (self.y.min(self.y + self.h), self.y.max(self.y + self.h));
        point.x >= x0 && point.x <= x1 && point.y >= y0 && point.y <= y1
    }

    /// Canvas position of a resize handle.
    pub fn handle_position(&self, handle: BoxHandle) -> Point {
        let cx = self.x + self.w / 2.0;
        let cy = self.y + self.h / 2.0;
        let right = self.x + self.w;
        let bottom = self.y + self.h;
        match handle {
            BoxHandle::TopLeft => Point::new(self.x, self.y),
            BoxHandle::Top => Point::new(cx, self.y),
            BoxHandle::TopRight => Point::new(right, self.y),
            BoxHandle::Right => Point::new(right, cy),
            BoxHandle::BottomRight => Point::new(right, bottom),
            BoxHandle::Bottom => Point::new(cx, bottom),
            BoxHandle::BottomLeft => Point::new(self.x, bottom),
            BoxHandle::Left => Point::new(self.x, cy),
        }
    }

    /// Move the edges controlled by `handle` to `point`. The opposite edges
    /// stay where they are.
    pub fn drag_handle(&mut self, handle: BoxHandle, point: Point) {
        let right = self.x + self.w;
        let bottom = self.y + self.h;
        if handle.moves_left() {
            self.x = point.x;
            self.w = right - point.x;
        } else if handle.moves_right() {
            self.w = point.x - self.x;
        }
        if handle.moves_top() {
            self.y = point.y;
            self.h = bottom - point.y;
        } else if handle.moves_bottom() {
            self.h = point.y - self.y;
        }
    }

    /// Shift the box so it lies inside the frame, shrinking it only when it
    /// is larger than the frame.
    pub fn clamp_to(&mut self, frame: &Frame) {
        self.normalize();
        self.w = self.w.min(frame.width);
        self.h = self.h.min(frame.height);
        self.x = self.x.clamp(frame.x, frame.right() - self.w);
        self.y = self.y.clamp(frame.y, frame.bottom() - self.h);
    }
}
