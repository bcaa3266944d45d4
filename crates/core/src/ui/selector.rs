//! Region selection state machine.
//!
//! A [`RegionSelector`] owns two full-desktop surfaces: an input layer that
//! receives pointer and key events, and a visual layer that only draws.
//! Keeping the layers apart means the visual feedback never sits in the
//! path of input, and neither layer needs to be captured later.
//!
//! ```text
//! Idle --press--> Dragging --release--> Completed
//!   \                |
//!    \---cancel------+--------------->  Cancelled
//! ```
//!
//! Both surfaces are destroyed on every exit path, including drop. A surface
//! that fails to go away is logged and skipped.

use crate::error::Result;
use crate::monitors::{CaptureRegion, Monitor, MonitorLayout, Point, Rect};

/// What a rectangle drawn on a surface represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RectStyle {
    /// Outline of one physical display.
    MonitorBorder,
    /// The rubber band following the pointer. Replaces the previous one.
    Selection,
}

/// Capabilities the selector needs from a window-like surface.
pub trait Surface {
    fn show(&mut self) -> Result<()>;
    fn hide(&mut self) -> Result<()>;
    fn draw_rect(&mut self, rect: Rect, style: RectStyle) -> Result<()>;
    fn destroy(&mut self) -> Result<()>;
}

/// Input delivered to the selector, in virtual-desktop coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorEvent {
    Press(Point),
    Motion(Point),
    Release(Point),
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorState {
    Idle,
    Dragging,
    Completed,
    Cancelled,
}

impl SelectorState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Terminal result of a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The normalized rectangle. May have zero area.
    Completed(CaptureRegion),
    Cancelled,
}

/// Pointer bookkeeping for one selection.
#[derive(Clone, Debug)]
pub struct SelectionSession {
    layout: MonitorLayout,
    start: Point,
    current: Point,
    active_monitor: Option<Monitor>,
    state: SelectorState,
}

impl SelectionSession {
    fn new(layout: MonitorLayout) -> Self {
        Self {
            layout,
            start: Point::default(),
            current: Point::default(),
            active_monitor: None,
            state: SelectorState::Idle,
        }
    }

    /// The rectangle spanned so far, while dragging or once completed.
    pub fn rect(&self) -> Option<Rect> {
        match self.state {
            SelectorState::Dragging | SelectorState::Completed => {
                Some(Rect::from_corners(self.start, self.current))
            }
            _ => None,
        }
    }
}

/// Runs one selection over a pair of surfaces.
pub struct RegionSelector<S: Surface> {
    session: SelectionSession,
    input: Option<S>,
    visual: Option<S>,
}

impl<S: Surface> RegionSelector<S> {
    /// Shows both layers and outlines every monitor on the visual one.
    ///
    /// # Errors
    ///
    /// Fails if either layer cannot be shown; both are torn down first.
    pub fn open(layout: MonitorLayout, input: S, visual: S) -> Result<Self> {
        let mut selector = Self {
            session: SelectionSession::new(layout),
            input: Some(input),
            visual: Some(visual),
        };

        // Visual first so the input layer ends up on top.
        if let Some(visual) = selector.visual.as_mut() {
            visual.show()?;
            for monitor in selector.session.layout.monitors() {
                visual.draw_rect(monitor.bounds(), RectStyle::MonitorBorder)?;
            }
        }
        if let Some(input) = selector.input.as_mut() {
            input.show()?;
        }

        log::debug!(
            "Region selector open over {} monitor(s)",
            selector.session.layout.monitors().len()
        );
        Ok(selector)
    }

    pub fn state(&self) -> SelectorState {
        self.session.state
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    /// Monitor under the press point, if any. Informational only.
    pub fn active_monitor(&self) -> Option<&Monitor> {
        self.session.active_monitor.as_ref()
    }

    pub fn layout(&self) -> &MonitorLayout {
        &self.session.layout
    }

    pub fn input_surface(&self) -> Option<&S> {
        self.input.as_ref()
    }

    pub fn visual_surface(&self) -> Option<&S> {
        self.visual.as_ref()
    }

    /// Feeds one event. Returns the outcome once the selection finishes.
    pub fn handle(&mut self, event: SelectorEvent) -> Option<SelectionOutcome> {
        if self.session.state.is_finished() {
            return None;
        }

        match (self.session.state, event) {
            (_, SelectorEvent::Cancel) => {
                self.session.state = SelectorState::Cancelled;
                self.teardown();
                log::debug!("Selection cancelled");
                Some(SelectionOutcome::Cancelled)
            }
            (_, SelectorEvent::Press(point)) => {
                self.session.start = point;
                self.session.current = point;
                self.session.active_monitor = self.session.layout.locate(point).cloned();
                self.session.state = SelectorState::Dragging;
                match &self.session.active_monitor {
                    Some(monitor) => log::debug!("Drag started on monitor {}", monitor.id),
                    None => log::debug!("Drag started outside every monitor at {:?}", point),
                }
                self.redraw();
                None
            }
            (SelectorState::Dragging, SelectorEvent::Motion(point)) => {
                self.session.current = point;
                self.redraw();
                None
            }
            (SelectorState::Dragging, SelectorEvent::Release(point)) => {
                self.session.current = point;
                self.session.state = SelectorState::Completed;
                let region = Rect::from_corners(self.session.start, point);
                self.teardown();
                log::debug!("Selection completed: {}", region);
                Some(SelectionOutcome::Completed(region))
            }
            _ => None,
        }
    }

    fn redraw(&mut self) {
        let (Some(rect), Some(visual)) = (self.session.rect(), self.visual.as_mut()) else {
            return;
        };
        if let Err(e) = visual.draw_rect(rect, RectStyle::Selection) {
            log::debug!("Selection feedback not drawn: {}", e);
        }
    }

    fn teardown(&mut self) {
        for (name, surface) in [("input", self.input.take()), ("visual", self.visual.take())] {
            if let Some(mut surface) = surface {
                if let Err(e) = surface.hide() {
                    log::debug!("Failed to hide {} layer: {}", name, e);
                }
                if let Err(e) = surface.destroy() {
                    log::warn!("Failed to destroy {} layer: {}", name, e);
                }
            }
        }
    }
}

impl<S: Surface> Drop for RegionSelector<S> {
    fn drop(&mut self) {
        if !self.session.state.is_finished() {
            self.session.state = SelectorState::Cancelled;
        }
        self.teardown();
    }
}
