//! Controllers that report value changes to the event bus
//!
//! Positions use top-left screen coordinates. Rendering is left to the host;
//! controllers only keep the geometry needed for hit testing and stacking.

pub mod button;
pub mod label;
pub mod multilist;

pub use button::{Button, ButtonState};
pub use label::Label;
pub use multilist::{Direction, MultiList, MultiListConfig, NodeId};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict containment, points on the border are outside
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x > self.x && x < self.x + self.width && y > self.y && y < self.y + self.height
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }
}

/// Keyboard modifiers held during a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer and keyboard state sampled once per frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputState {
    pub pointer: [f32; 2],
    /// Pointer position of the previous frame
    pub prev_pointer: [f32; 2],
    /// Primary pointer button is down
    pub pressed: bool,
    pub modifiers: Modifiers,
}

impl InputState {
    /// Move the pointer, keeping the old position for deltas
    pub fn move_to(&mut self, x: f32, y: f32) {
        self.prev_pointer = self.pointer;
        self.pointer = [x, y];
    }

    /// Pointer movement since the previous frame
    pub fn delta(&self) -> (f32, f32) {
        (
            self.pointer[0] - self.prev_pointer[0],
            self.pointer[1] - self.prev_pointer[1],
        )
    }
}

/// Trait for controllers that react to the pointer
pub trait Widget {
    /// Update hover state from the pointer position
    fn update_hover(&mut self, input: &InputState);

    /// Handle pointer press, returns true if the widget was hit
    fn handle_press(&mut self, input: &InputState) -> bool;

    /// Handle pointer release, returns true if a click completed on the widget
    fn handle_release(&mut self, input: &InputState) -> bool;

    /// Widget bounds in screen coordinates
    fn bounds(&self) -> Rect;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_strict() {
        let rect = Rect::new(10.0, 10.0, 100.0, 20.0);
        assert!(rect.contains(50.0, 20.0));
        assert!(!rect.contains(10.0, 20.0));
        assert!(!rect.contains(50.0, 30.0));
        assert!(!rect.contains(111.0, 20.0));
    }

    #[test]
    fn test_input_delta() {
        let mut input = InputState::default();
        input.move_to(4.0, 4.0);
        input.move_to(9.0, 1.0);
        assert_eq!(input.delta(), (5.0, -3.0));
    }
}
