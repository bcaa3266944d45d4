//! Input translation for the selection overlay.
//!
//! egui reports pointer positions in logical points relative to the
//! viewport, while monitor geometry is in physical pixels. The input layer
//! is placed at the virtual desktop origin, so scaling by the viewport's
//! pixels-per-point and adding that origin gives desktop coordinates.

use super::selector::SelectorEvent;
use crate::monitors::Point;
use eframe::egui;

/// Maps a viewport-relative position in points to virtual-desktop pixels.
pub fn to_desktop(origin: Point, pos: egui::Pos2, pixels_per_point: f32) -> Point {
    Point::new(
        origin.x + (pos.x * pixels_per_point).round() as i32,
        origin.y + (pos.y * pixels_per_point).round() as i32,
    )
}

/// Maps a desktop rectangle in pixels into the overlay viewport's points.
pub fn to_viewport(origin: Point, rect: crate::monitors::Rect, pixels_per_point: f32) -> egui::Rect {
    let min = egui::pos2(
        (rect.x - origin.x) as f32 / pixels_per_point,
        (rect.y - origin.y) as f32 / pixels_per_point,
    );
    let size = egui::vec2(
        rect.width as f32 / pixels_per_point,
        rect.height as f32 / pixels_per_point,
    );
    egui::Rect::from_min_size(min, size)
}

/// Converts raw egui events from the input layer into selector events.
///
/// Only the primary button drives the selection; Escape cancels.
pub fn translate_events(
    events: &[egui::Event],
    origin: Point,
    pixels_per_point: f32,
) -> Vec<SelectorEvent> {
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::PointerButton {
                pos,
                button: egui::PointerButton::Primary,
                pressed,
                ..
            } => {
                let point = to_desktop(origin, *pos, pixels_per_point);
                Some(if *pressed {
                    SelectorEvent::Press(point)
                } else {
                    SelectorEvent::Release(point)
                })
            }
            egui::Event::PointerMoved(pos) => {
                Some(SelectorEvent::Motion(to_desktop(origin, *pos, pixels_per_point)))
            }
            egui::Event::Key {
                key: egui::Key::Escape,
                pressed: true,
                ..
            } => Some(SelectorEvent::Cancel),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitors::Rect;

    fn button(x: f32, y: f32, button: egui::PointerButton, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos: egui::pos2(x, y),
            button,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn positions_are_offset_by_the_desktop_origin() {
        let origin = Point::new(-1280, -200);
        assert_eq!(
            to_desktop(origin, egui::pos2(1300.4, 199.6), 1.0),
            Point::new(20, 0)
        );
    }

    #[test]
    fn viewport_rect_round_trips_desktop_rect() {
        let origin = Point::new(-1280, 0);
        let rect = to_viewport(origin, Rect::new(-1280, 0, 1280, 1024), 1.0);
        assert_eq!(rect.min, egui::pos2(0.0, 0.0));
        assert_eq!(rect.max, egui::pos2(1280.0, 1024.0));
    }

    #[test]
    fn primary_drag_becomes_press_motion_release() {
        let origin = Point::new(-100, 0);
        let events = [
            button(10.0, 10.0, egui::PointerButton::Primary, true),
            egui::Event::PointerMoved(egui::pos2(60.0, 40.0)),
            button(80.0, 50.0, egui::PointerButton::Secondary, true),
            button(90.0, 70.0, egui::PointerButton::Primary, false),
            egui::Event::Text("x".into()),
        ];

        assert_eq!(
            translate_events(&events, origin, 1.0),
            vec![
                SelectorEvent::Press(Point::new(-90, 10)),
                SelectorEvent::Motion(Point::new(-40, 40)),
                SelectorEvent::Release(Point::new(-10, 70)),
            ]
        );
    }

    #[test]
    fn scaled_pointer_maps_to_physical_pixels() {
        // 3840x2160 panel at scale 2: physical (2000, 1000) arrives as (1000, 500).
        assert_eq!(
            to_desktop(Point::new(0, 0), egui::pos2(1000.0, 500.0), 2.0),
            Point::new(2000, 1000)
        );
        assert_eq!(
            to_desktop(Point::new(-1280, 0), egui::pos2(640.0, 10.0), 1.5),
            Point::new(-320, 15)
        );
    }

    #[test]
    fn scaled_rect_maps_back_to_points() {
        let origin = Point::new(-1280, 0);
        let rect = to_viewport(origin, Rect::new(0, 200, 3840, 2160), 2.0);
        assert_eq!(rect.min, egui::pos2(640.0, 100.0));
        assert_eq!(rect.size(), egui::vec2(1920.0, 1080.0));

        let events = [button(640.0, 100.0, egui::PointerButton::Primary, true)];
        assert_eq!(
            translate_events(&events, origin, 2.0),
            vec![SelectorEvent::Press(Point::new(0, 200))]
        );
    }
}
