//! Button controller

use super::label::Label;
use super::{InputState, Rect, Widget};
use crate::bus::{ControllerKind, EventBus, SourceId};

/// Visual state of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Normal,
    Hover,
    Pressed,
}

/// A clickable button broadcasting its value when clicked
#[derive(Debug, Clone)]
pub struct Button {
    /// Source registered on the bus
    source: SourceId,
    /// Caption
    caption: Label,
    /// Value sent with every click
    value: f32,
    /// Bounds in screen coordinates
    bounds: Rect,
    /// Current visual state
    state: ButtonState,
    /// Whether button is visible
    visible: bool,
}

impl Button {
    /// Create a button and register it on the bus
    pub fn new(bus: &EventBus, name: &str, value: f32) -> Self {
        let source = bus.register_controller(name, ControllerKind::Button);
        Self {
            source,
            caption: Label::new(name).with_size(80.0, 19.0),
            value,
            bounds: Rect::new(0.0, 0.0, 80.0, 19.0),
            state: ButtonState::Normal,
            visible: true,
        }
    }

    /// Set the button position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.bounds.x = x;
        self.bounds.y = y;
        self
    }

    /// Set the button size
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.bounds.width = width;
        self.bounds.height = height;
        self.caption.set_size(width, height);
        self
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn caption(&self) -> &Label {
        &self.caption
    }

    pub fn caption_mut(&mut self) -> &mut Label {
        &mut self.caption
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Get the current state
    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Check if visible
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set visibility
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn width(&self) -> f32 {
        self.bounds.width
    }

    pub fn height(&self) -> f32 {
        self.bounds.height
    }

    /// Broadcast the button value
    pub fn click(&self, bus: &EventBus) {
        bus.notify(self.source, self.value);
    }

    /// Handle pointer release and broadcast if a click completed
    pub fn release(&mut self, input: &InputState, bus: &EventBus) -> bool {
        let clicked = self.handle_release(input);
        if clicked {
            self.click(bus);
        }
        clicked
    }

    /// Remove the button's source from the bus
    pub fn remove(self, bus: &EventBus) {
        bus.remove_controller(self.source);
    }

    fn contains_point(&self, input: &InputState) -> bool {
        self.visible && self.bounds.contains(input.pointer[0], input.pointer[1])
    }
}

impl Widget for Button {
    fn update_hover(&mut self, input: &InputState) {
        if !self.visible {
            return;
        }

        let is_inside = self.contains_point(input);

        self.state = match self.state {
            ButtonState::Pressed => ButtonState::Pressed, // Keep pressed until release
            _ if is_inside => ButtonState::Hover,
            _ => ButtonState::Normal,
        };
    }

    fn handle_press(&mut self, input: &InputState) -> bool {
        if self.contains_point(input) {
            self.state = ButtonState::Pressed;
            true
        } else {
            false
        }
    }

    fn handle_release(&mut self, input: &InputState) -> bool {
        if !self.visible {
            return false;
        }

        let was_pressed = self.state == ButtonState::Pressed;
        let is_inside = self.contains_point(input);

        self.state = if is_inside {
            ButtonState::Hover
        } else {
            ButtonState::Normal
        };

        was_pressed && is_inside
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{ControlEvent, ControlListener};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Values(Vec<f32>);

    impl ControlListener for Values {
        fn control_event(&mut self, event: &ControlEvent, _: &EventBus) {
            self.0.push(event.value);
        }
    }

    fn input_at(x: f32, y: f32) -> InputState {
        InputState {
            pointer: [x, y],
            ..Default::default()
        }
    }

    #[test]
    fn test_click_requires_press_inside() {
        let bus = EventBus::new();
        let mut button = Button::new(&bus, "play", 1.0)
            .with_position(10.0, 10.0)
            .with_size(60.0, 20.0);
        let values = Rc::new(RefCell::new(Values(Vec::new())));
        let listener: crate::bus::SharedListener = values.clone();
        bus.register_listener(button.source(), &listener);

        // Released without a press
        assert!(!button.release(&input_at(20.0, 20.0), &bus));

        assert!(button.handle_press(&input_at(20.0, 20.0)));
        assert_eq!(button.state(), ButtonState::Pressed);
        assert!(button.release(&input_at(25.0, 15.0), &bus));
        assert_eq!(button.state(), ButtonState::Hover);
        assert_eq!(values.borrow().0, vec![1.0]);
    }

    #[test]
    fn test_hover_and_hidden() {
        let bus = EventBus::new();
        let mut button = Button::new(&bus, "stop", 0.0).with_position(0.0, 0.0);
        button.update_hover(&input_at(5.0, 5.0));
        assert_eq!(button.state(), ButtonState::Hover);

        button.set_visible(false);
        assert!(!button.handle_press(&input_at(5.0, 5.0)));
    }
}
