//! Application state - the host sketch and the frame loop driving the menu

use std::cell::RefCell;
use std::rc::Rc;

use skatolo_ui::{Capabilities, ControlEvent, EventBus, InputState, NodeId, Pluggable};

use crate::config::{Config, PlugConfig};
use crate::ui::{self, Menu};

/// The host application plugs deliver to
#[derive(Debug, Default)]
pub struct Sketch {
    pub preset: i32,
    pub speed: f32,
    pub muted: bool,
    pub volume: f32,
    pub resets: u32,
    pub last_event: Option<ControlEvent>,
}

impl Pluggable for Sketch {
    fn capabilities(caps: &mut Capabilities<Self>) {
        caps.method("preset", |s: &mut Sketch, v: i32| {
            log::info!("Sketch: preset {}", v);
            s.preset = v;
        })
        .method("speed", |s: &mut Sketch, v: f32| {
            log::info!("Sketch: speed {}", v);
            s.speed = v;
        })
        .method("mute", |s: &mut Sketch, v: bool| {
            log::info!("Sketch: muted {}", v);
            s.muted = v;
        })
        .method0("reset", |s| {
            log::info!("Sketch: reset");
            *s = Sketch {
                resets: s.resets + 1,
                ..Default::default()
            };
        })
        .field("volume", |s: &Sketch| s.volume, |s, v: f32| s.volume = v)
        .handler("controlEvent", |s, e| {
            log::debug!("Sketch: event from '{}' = {}", e.name, e.value);
            s.last_event = Some(e.clone());
        })
        .unavailable("shutdown");
    }
}

/// Main application state
pub struct App {
    bus: EventBus,
    menu: Menu,
    sketch: Rc<RefCell<Sketch>>,
    input: InputState,
}

impl App {
    /// Create new app from configuration
    pub fn new(config: Config) -> Self {
        let bus = EventBus::with_config(config.bus.clone());
        let menu = ui::create_menu_from_config(&bus, &config.menu);
        let sketch = Rc::new(RefCell::new(Sketch::default()));

        let app = Self {
            bus,
            menu,
            sketch,
            input: InputState::default(),
        };
        app.bus.plug_handler(app.menu.list.source(), &app.sketch);
        for plug in &config.plugs {
            app.plug_from_config(plug);
        }
        app
    }

    fn plug_from_config(&self, config: &PlugConfig) {
        let Some(&id) = self.menu.nodes.get(&config.source) else {
            log::warn!("Plug source '{}' is not a menu item", config.source);
            return;
        };
        let Some(source) = self.menu.list.node_source(id) else {
            return;
        };
        let plug = match config.kind {
            None => self.bus.plug_to(source, &self.sketch, &config.target),
            Some(kind) => {
                let accepted = config
                    .accept
                    .clone()
                    .unwrap_or_else(|| self.bus.config().accepted.clone());
                self.bus.plug(source, &self.sketch, &config.target, kind, &accepted)
            }
        };
        let plug = plug.borrow();
        log::info!(
            "Plug {} -> {} ({:?})",
            config.source,
            plug.name(),
            plug.kind()
        );
    }

    pub fn sketch(&self) -> &Rc<RefCell<Sketch>> {
        &self.sketch
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Advance one frame with the pointer at `pointer`
    pub fn frame(&mut self, pointer: Option<[f32; 2]>, click: bool) {
        if let Some([x, y]) = pointer {
            self.input.move_to(x, y);
        } else {
            let [x, y] = self.input.pointer;
            self.input.move_to(x, y);
        }
        self.menu.list.pointer_moved(&self.input);
        if click {
            if let Some(id) = self.menu.list.release(&self.input, &self.bus) {
                let caption = self.menu.list.caption(id).map(|c| c.text_formatted());
                log::info!("Clicked {:?}", caption);
            }
        }
        self.menu.list.update(&self.input);
    }

    /// Run a scripted session: open the first branch, click its deepest
    /// first entry, leave the menu and let it close.
    pub fn run(&mut self, frames: u32) {
        let Some(&first) = self.menu.list.children(NodeId::ROOT).first() else {
            log::warn!("Menu has no items, nothing to do");
            return;
        };
        let mut path = vec![first];
        let mut last = first;
        while let Some(&child) = self.menu.list.children(last).first() {
            path.push(child);
            last = child;
        }
        let away = [-100.0, -100.0];

        let mut frame = 0;
        for id in &path {
            let at = ui::center_of(&self.menu.list, *id);
            self.frame(at, false);
            frame += 1;
        }
        self.frame(None, true);
        frame += 1;
        self.frame(Some(away), false);
        frame += 1;

        while frame < frames {
            self.frame(None, false);
            frame += 1;
        }

        log::info!(
            "Done after {} frames, menu open: {}, sketch: {:?}",
            frame,
            self.menu.list.is_open(first),
            self.sketch.borrow()
        );
    }
}
