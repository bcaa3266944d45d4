//! Display geometry in virtual-desktop coordinates.
//!
//! All positions here are absolute: the origin is the virtual desktop origin
//! reported by the platform, so monitors left of or above the primary one
//! have negative coordinates.

use crate::error::{AppError, Result};
use screenshots::Screen;
use std::fmt;

/// A point in virtual-desktop coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle with non-negative size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// The rectangle a user picked with the region selector.
pub type CaptureRegion = Rect;

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds the rectangle spanned by two opposite corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: a.x.abs_diff(b.x),
            height: a.y.abs_diff(b.y),
        }
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (point.x as i64, point.y as i64);
        self.x as i64 <= px && px < self.right() && self.y as i64 <= py && py < self.bottom()
    }

    /// The overlapping area, or `None` if the rectangles share no pixels.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = (self.x as i64).max(other.x as i64);
        let top = (self.y as i64).max(other.y as i64);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        Some(Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// The smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let left = (self.x as i64).min(other.x as i64);
        let top = (self.y as i64).min(other.y as i64);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// One physical display.
#[derive(Clone, Debug, PartialEq)]
pub struct Monitor {
    pub id: u32,
    pub origin: Point,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
    pub is_primary: bool,
}

impl Monitor {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.origin.x, self.origin.y, self.width, self.height)
    }
}

impl fmt::Display for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Monitor {}: {}x{} at ({}, {}) (scale: {}){}",
            self.id,
            self.width,
            self.height,
            self.origin.x,
            self.origin.y,
            self.scale_factor,
            if self.is_primary { " [primary]" } else { "" }
        )
    }
}

/// Snapshot of the display layout, taken once per selection session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonitorLayout {
    monitors: Vec<Monitor>,
}

impl MonitorLayout {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self { monitors }
    }

    /// Enumerates the connected displays.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Capture`] if the display server cannot be queried
    /// or reports no displays.
    pub fn detect() -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }

        let monitors = screens
            .iter()
            .map(|screen| {
                let info = &screen.display_info;
                Monitor {
                    id: info.id,
                    origin: Point::new(info.x, info.y),
                    width: info.width,
                    height: info.height,
                    scale_factor: info.scale_factor,
                    is_primary: info.is_primary,
                }
            })
            .collect::<Vec<_>>();

        log::debug!("Detected {} monitor(s)", monitors.len());
        Ok(Self { monitors })
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Finds the monitor containing `point`. The first match wins when
    /// monitors overlap.
    pub fn locate(&self, point: Point) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.bounds().contains(point))
    }

    /// Scale factor of the primary monitor (the first one if none is marked),
    /// used to convert desktop pixels into window points.
    pub fn primary_scale(&self) -> f32 {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
            .map(|m| m.scale_factor)
            .filter(|scale| *scale > 0.0)
            .unwrap_or(1.0)
    }

    /// The union of all monitor rectangles, or `None` for an empty layout.
    pub fn virtual_desktop(&self) -> Option<Rect> {
        self.monitors
            .iter()
            .map(Monitor::bounds)
            .reduce(|acc, bounds| acc.union(&bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(id: u32, x: i32, y: i32, width: u32, height: u32) -> Monitor {
        Monitor {
            id,
            origin: Point::new(x, y),
            width,
            height,
            scale_factor: 1.0,
            is_primary: id == 0,
        }
    }

    fn dual_layout() -> MonitorLayout {
        // Secondary display sits left of the primary, shifted down.
        MonitorLayout::new(vec![
            monitor(0, 0, 0, 1920, 1080),
            monitor(1, -1280, 200, 1280, 1024),
        ])
    }

    #[test]
    fn corners_in_any_order_give_the_same_rect() {
        let cases = [
            (Point::new(10, 20), Point::new(110, 70)),
            (Point::new(110, 70), Point::new(10, 20)),
            (Point::new(110, 20), Point::new(10, 70)),
            (Point::new(10, 70), Point::new(110, 20)),
        ];
        for (a, b) in cases {
            assert_eq!(Rect::from_corners(a, b), Rect::new(10, 20, 100, 50));
        }
    }

    #[test]
    fn corners_across_negative_coordinates() {
        let rect = Rect::from_corners(Point::new(-500, 900), Point::new(300, 250));
        assert_eq!(rect, Rect::new(-500, 250, 800, 650));
    }

    #[test]
    fn identical_corners_give_zero_area() {
        let rect = Rect::from_corners(Point::new(5, 5), Point::new(5, 5));
        assert!(rect.is_empty());
        assert_eq!((rect.x, rect.y), (5, 5));
    }

    #[test]
    fn locate_uses_half_open_intervals() {
        let layout = dual_layout();

        assert_eq!(layout.locate(Point::new(0, 0)).map(|m| m.id), Some(0));
        assert_eq!(layout.locate(Point::new(1919, 1079)).map(|m| m.id), Some(0));
        assert_eq!(layout.locate(Point::new(1920, 500)), None);
        assert_eq!(layout.locate(Point::new(-1, 500)).map(|m| m.id), Some(1));
        assert_eq!(layout.locate(Point::new(-1280, 200)).map(|m| m.id), Some(1));
        assert_eq!(layout.locate(Point::new(-1, 1224)), None);
        assert_eq!(layout.locate(Point::new(-100, 100)), None);
    }

    #[test]
    fn locate_prefers_first_overlapping_monitor() {
        let layout = MonitorLayout::new(vec![
            monitor(7, 0, 0, 1000, 1000),
            monitor(8, 500, 500, 1000, 1000),
        ]);
        assert_eq!(layout.locate(Point::new(600, 600)).map(|m| m.id), Some(7));
        assert_eq!(layout.locate(Point::new(1200, 1200)).map(|m| m.id), Some(8));
    }

    #[test]
    fn virtual_desktop_spans_all_monitors() {
        assert_eq!(
            dual_layout().virtual_desktop(),
            Some(Rect::new(-1280, 0, 3200, 1224))
        );
        assert_eq!(MonitorLayout::default().virtual_desktop(), None);
    }

    #[test]
    fn intersection_is_none_for_touching_edges() {
        let a = Rect::new(0, 0, 100, 100);
        assert_eq!(a.intersect(&Rect::new(100, 0, 50, 50)), None);
        assert_eq!(
            a.intersect(&Rect::new(50, -10, 100, 40)),
            Some(Rect::new(50, 0, 50, 30))
        );
    }

    #[test]
    fn primary_scale_comes_from_the_primary_monitor() {
        let mut layout = dual_layout();
        assert_eq!(layout.primary_scale(), 1.0);

        layout.monitors[0].scale_factor = 2.0;
        layout.monitors[1].scale_factor = 1.25;
        assert_eq!(layout.primary_scale(), 2.0);

        layout.monitors[0].is_primary = false;
        assert_eq!(layout.primary_scale(), 2.0);
        assert_eq!(MonitorLayout::default().primary_scale(), 1.0);
    }
}
