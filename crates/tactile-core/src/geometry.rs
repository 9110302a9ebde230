#![forbid(unsafe_code)]

//! Geometric primitives and angle math for pointer tracking.
//!
//! Coordinates are CSS pixels in the viewport space reported by
//! `clientX`/`clientY` and `getBoundingClientRect()`.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// A pointer position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// An element's bounding box in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Bounds {
    #[inline]
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Geometric center of the box.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Horizontal pointer position as a percentage of the box width.
    ///
    /// Unclamped: pointers left of the box yield negative values. A zero-width
    /// box reports `0.0`.
    #[must_use]
    pub fn percent_x(&self, x: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        (x - self.left) / self.width * 100.0
    }
}

/// Angle of `point` around the center of `bounds`, in radians (`atan2`).
#[inline]
#[must_use]
pub fn pointer_angle(bounds: &Bounds, point: Point) -> f64 {
    let center = bounds.center();
    (point.y - center.y).atan2(point.x - center.x)
}

/// Shortest-path angle difference.
///
/// `delta` is the raw difference of two `atan2` results, so it lies in
/// `[-2π, 2π]`; a single ±2π correction brings it into `[-π, π]`.
#[inline]
#[must_use]
pub fn normalize_angle_delta(delta: f64) -> f64 {
    if delta > PI {
        delta - TAU
    } else if delta < -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Bucket index of an unbounded accumulator for a given step.
#[inline]
#[must_use]
pub fn bucket(value: f64, step: f64) -> i64 {
    (value / step).floor() as i64
}
