//! Multi-level menu controller
//!
//! A `MultiList` owns a tree of menu buttons stored in an arena. Node 0 is the
//! list itself, every other node is a button. Buttons of the first level are
//! stacked below the list position; nested buttons open beside their parent.
//!
//! Every button source carries a relay listener. An event of a button, from a
//! click or reported straight to the bus, is re-broadcast under the list's
//! source, so a host can plug either a single entry or the whole menu.
//!
//! The list closes itself after `close_delay` frames without the pointer on it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Deserialize;

use super::label::Label;
use super::{InputState, Rect};
use crate::bus::{
    ControlEvent, ControlListener, ControllerKind, EventBus, SharedListener, SourceId,
};

/// Index of a node in a [`MultiList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The list itself
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// Side on which nested buttons open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    #[default]
    Right,
}

/// Menu settings, read from the `[menu]` table of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct MultiListConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_button_height")]
    pub button_height: f32,
    /// Idle frames before the menu closes
    #[serde(default = "default_close_delay")]
    pub close_delay: u32,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_upper_case")]
    pub upper_case: bool,
}

impl Default for MultiListConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            button_height: default_button_height(),
            close_delay: default_close_delay(),
            direction: Direction::default(),
            upper_case: default_upper_case(),
        }
    }
}

fn default_width() -> f32 {
    99.0
}
fn default_button_height() -> f32 {
    19.0
}
fn default_close_delay() -> u32 {
    30
}
fn default_upper_case() -> bool {
    true
}

#[derive(Debug, Clone)]
struct MenuNode {
    source: SourceId,
    caption: Label,
    value: f32,
    bounds: Rect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Shown on screen
    visible: bool,
    /// Children are shown
    open: bool,
}

/// Forwards button events to the list's own source
#[derive(Debug)]
struct MenuRelay {
    menu: SourceId,
    value: Rc<Cell<f32>>,
}

impl ControlListener for MenuRelay {
    fn control_event(&mut self, event: &ControlEvent, bus: &EventBus) {
        if event.kind == ControllerKind::MultiListButton {
            self.value.set(event.value);
            bus.notify(self.menu, event.value);
        }
    }
}

/// A multi-level menu
#[derive(Debug)]
pub struct MultiList {
    nodes: Vec<MenuNode>,
    value: Rc<Cell<f32>>,
    relay: Rc<RefCell<MenuRelay>>,
    button_height: f32,
    direction: Direction,
    upper_case: bool,
    close_delay: u32,
    occupied: bool,
    idle_ticks: u32,
    most_recent: NodeId,
    hovered: Option<NodeId>,
    dragging: bool,
    /// Area covered by the first level, used by `observe`
    rect: Rect,
}

impl MultiList {
    /// Create an empty menu at `(x, y)` and register it on the bus
    pub fn new(bus: &EventBus, name: &str, x: f32, y: f32, config: &MultiListConfig) -> Self {
        let source = bus.register_controller(name, ControllerKind::MultiList);
        let mut caption = Label::new(name).with_size(config.width, config.button_height);
        caption.to_upper_case(config.upper_case);
        let root = MenuNode {
            source,
            caption,
            value: 0.0,
            bounds: Rect::new(x, y, config.width, 0.0),
            parent: None,
            children: Vec::new(),
            visible: true,
            open: true,
        };
        let value = Rc::new(Cell::new(0.0));
        let relay = Rc::new(RefCell::new(MenuRelay {
            menu: source,
            value: Rc::clone(&value),
        }));
        Self {
            nodes: vec![root],
            value,
            relay,
            button_height: config.button_height,
            direction: config.direction,
            upper_case: config.upper_case,
            close_delay: config.close_delay,
            occupied: false,
            idle_ticks: 0,
            most_recent: NodeId::ROOT,
            hovered: None,
            dragging: false,
            rect: Rect::new(x, y, config.width, config.button_height),
        }
    }

    /// Add a first-level button stacked below the existing ones
    pub fn add(&mut self, bus: &EventBus, name: &str, value: f32) -> NodeId {
        let root = &self.nodes[0];
        let offset: f32 = root
            .children
            .iter()
            .map(|c| self.nodes[c.0].bounds.height + 1.0)
            .sum();
        let bounds = Rect::new(
            root.bounds.x,
            root.bounds.y + offset,
            root.bounds.width,
            self.button_height,
        );
        let id = self.push_node(bus, NodeId::ROOT, name, value, bounds, true);

        let count = self.nodes[0].children.len() as f32;
        self.rect = Rect::new(
            self.nodes[0].bounds.x,
            self.nodes[0].bounds.y,
            self.nodes[0].bounds.width,
            (self.button_height + 1.0) * count,
        );
        id
    }

    /// Add a nested button to `parent`, opening beside it.
    ///
    /// Returns `None` if `parent` is not a node of this list.
    pub fn add_to(
        &mut self,
        bus: &EventBus,
        parent: NodeId,
        name: &str,
        value: f32,
    ) -> Option<NodeId> {
        if parent == NodeId::ROOT {
            return Some(self.add(bus, name, value));
        }
        let node = self.nodes.get(parent.0)?;
        let row = node.children.len() as f32;
        let bounds = Rect::new(
            self.beside(node.bounds),
            node.bounds.y + (self.button_height + 1.0) * row,
            node.bounds.width,
            self.button_height,
        );
        let visible = node.open && node.visible;
        Some(self.push_node(bus, parent, name, value, bounds, visible))
    }

    fn push_node(
        &mut self,
        bus: &EventBus,
        parent: NodeId,
        name: &str,
        value: f32,
        bounds: Rect,
        visible: bool,
    ) -> NodeId {
        let source = bus.register_controller(name, ControllerKind::MultiListButton);
        let relay: SharedListener = self.relay.clone();
        bus.register_listener(source, &relay);
        let mut caption = Label::new(name).with_size(bounds.width, bounds.height);
        caption.to_upper_case(self.upper_case);
        let id = NodeId(self.nodes.len());
        self.nodes.push(MenuNode {
            source,
            caption,
            value,
            bounds,
            parent: Some(parent),
            children: Vec::new(),
            visible,
            open: false,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn beside(&self, parent: Rect) -> f32 {
        match self.direction {
            Direction::Right => parent.x + parent.width + 1.0,
            Direction::Left => parent.x - parent.width - 1.0,
        }
    }

    pub fn source(&self) -> SourceId {
        self.nodes[0].source
    }

    /// Value of the last clicked button
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    pub fn close_delay(&self) -> u32 {
        self.close_delay
    }

    pub fn set_close_delay(&mut self, frames: u32) {
        self.close_delay = frames;
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    /// Button most recently entered by the pointer
    pub fn most_recent(&self) -> NodeId {
        self.most_recent
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(id.0).map(|n| n.bounds)
    }

    pub fn caption(&self, id: NodeId) -> Option<&Label> {
        self.nodes.get(id.0).map(|n| &n.caption)
    }

    pub fn node_source(&self, id: NodeId) -> Option<SourceId> {
        self.nodes.get(id.0).map(|n| n.source)
    }

    pub fn node_value(&self, id: NodeId) -> Option<f32> {
        self.nodes.get(id.0).map(|n| n.value)
    }

    /// Whether the node shows its children
    pub fn is_open(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.open)
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(|n| n.visible)
    }

    /// Close every first-level branch except `excluded`
    pub fn close(&mut self, excluded: Option<NodeId>) {
        let children = self.nodes[0].children.clone();
        for child in children {
            if Some(child) != excluded {
                self.close_node(child);
            }
        }
    }

    /// Open every branch of the menu
    pub fn open(&mut self) {
        let children = self.nodes[0].children.clone();
        for child in children {
            self.open_node(child);
        }
    }

    /// Hide the children of `id` and close them recursively
    pub fn close_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        node.open = false;
        let children = node.children.clone();
        for child in children {
            self.nodes[child.0].visible = false;
            self.close_node(child);
        }
    }

    /// Show the children of `id` and open them recursively
    pub fn open_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        node.open = true;
        let children = node.children.clone();
        for child in children {
            self.nodes[child.0].visible = true;
            self.open_node(child);
        }
    }

    /// Show the direct children of `id` only
    fn show_children(&mut self, id: NodeId) {
        self.nodes[id.0].open = true;
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.nodes[child.0].visible = true;
        }
    }

    /// Close the siblings of `id` so only its branch stays open
    fn close_siblings(&mut self, id: NodeId) {
        match self.nodes[id.0].parent {
            Some(NodeId::ROOT) | None => self.close(Some(id)),
            Some(parent) => {
                let siblings = self.nodes[parent.0].children.clone();
                for sibling in siblings {
                    if sibling != id {
                        self.close_node(sibling);
                    }
                }
            }
        }
    }

    /// Mark the menu as in use and restart the idle countdown
    pub fn occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
        self.idle_ticks = 0;
    }

    /// Whether the pointer is over the first level of the menu
    pub fn observe(&self, input: &InputState) -> bool {
        self.rect.contains(input.pointer[0], input.pointer[1])
    }

    /// Advance one frame.
    ///
    /// Returns true while the menu is being dragged.
    pub fn update(&mut self, input: &InputState) -> bool {
        if !self.occupied {
            self.idle_ticks = self.idle_ticks.saturating_add(1);
            if self.idle_ticks == self.close_delay {
                log::debug!("Menu '{}' idle, closing", self.nodes[0].caption.text());
                self.close(None);
            }
        }

        if self.dragging {
            let (dx, dy) = input.delta();
            self.update_location(dx, dy);
            self.dragging = input.pressed;
        }

        if self.occupied && input.pressed && input.modifiers.alt {
            self.dragging = true;
            return true;
        }
        false
    }

    /// Move the whole menu by `(dx, dy)`
    pub fn update_location(&mut self, dx: f32, dy: f32) {
        for node in &mut self.nodes {
            node.bounds.translate(dx, dy);
        }
        self.rect.translate(dx, dy);
    }

    /// Track the pointer: entering a button opens its branch.
    pub fn pointer_moved(&mut self, input: &InputState) {
        let target = self.node_at(input);
        match (target, self.hovered) {
            (Some(id), hovered) if hovered != Some(id) => {
                self.occupied(true);
                self.most_recent = id;
                self.close_siblings(id);
                self.show_children(id);
            }
            (None, Some(_)) => self.occupied(false),
            _ => {}
        }
        self.hovered = target;
    }

    /// Click the button under the pointer
    pub fn release(&mut self, input: &InputState, bus: &EventBus) -> Option<NodeId> {
        let id = self.node_at(input)?;
        self.click(bus, id);
        Some(id)
    }

    /// Broadcast a button's value. The relay then re-broadcasts it as the menu's.
    pub fn click(&mut self, bus: &EventBus, id: NodeId) -> bool {
        if id == NodeId::ROOT {
            return false;
        }
        let Some(node) = self.nodes.get(id.0) else {
            return false;
        };
        bus.notify(node.source, node.value);
        true
    }

    fn node_at(&self, input: &InputState) -> Option<NodeId> {
        let [x, y] = input.pointer;
        self.nodes
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, n)| n.visible && n.bounds.contains(x, y))
            .map(|(i, _)| NodeId(i))
    }

    /// Change the side nested buttons open on
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        // Parents always precede their children in the arena
        for i in 1..self.nodes.len() {
            if let Some(parent) = self.nodes[i].parent.filter(|p| *p != NodeId::ROOT) {
                let x = self.beside(self.nodes[parent.0].bounds);
                self.nodes[i].bounds.x = x;
            }
        }
    }

    pub fn to_upper_case(&mut self, upper_case: bool) {
        self.upper_case = upper_case;
        for node in &mut self.nodes {
            node.caption.to_upper_case(upper_case);
        }
    }

    /// Remove the menu and all of its buttons from the bus
    pub fn remove(self, bus: &EventBus) {
        for node in &self.nodes {
            bus.remove_controller(node.source);
        }
    }
}

impl ControlListener for MultiList {
    fn control_event(&mut self, event: &ControlEvent, bus: &EventBus) {
        MenuRelay {
            menu: self.source(),
            value: Rc::clone(&self.value),
        }
        .control_event(event, bus);
    }
}
