//! Event bus connecting controllers to plugs and listeners
//!
//! Every controller registers itself as a source. A value change is reported
//! with [`EventBus::notify`], which delivers it to the plugs and then to the
//! listeners registered for that source, in registration order. A failing
//! target is logged and skipped; it never stops delivery to the others and
//! never reaches the caller.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;

use crate::capability::Pluggable;
use crate::coerce::ValueKind;
use crate::plug::{AccessGuard, BindingKind, Plug};

/// Identity of a controller emitting events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

/// Kind of controller behind a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    #[default]
    Generic,
    Button,
    MultiList,
    MultiListButton,
}

/// A value change reported by a controller
#[derive(Debug, Clone, PartialEq)]
pub struct ControlEvent {
    pub source: SourceId,
    /// Name the controller was registered with
    pub name: String,
    pub kind: ControllerKind,
    pub value: f32,
}

/// Receives every event of the sources it is registered for
pub trait ControlListener {
    /// Handle an event. The bus is passed along so listeners can re-broadcast.
    fn control_event(&mut self, event: &ControlEvent, bus: &EventBus);
}

pub type SharedPlug = Rc<RefCell<Plug>>;
pub type SharedListener = Rc<RefCell<dyn ControlListener>>;

/// Bus settings, usually read from the `[bus]` table of the config file
#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    /// Start in restricted mode: private members are never plugged
    #[serde(default)]
    pub restricted_execution: bool,
    /// Parameter kinds accepted by name-based plugs, in priority order
    #[serde(default = "default_accepted")]
    pub accepted: Vec<ValueKind>,
    /// Name of the generic event handler looked up on hosts
    #[serde(default = "default_handler")]
    pub handler: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            restricted_execution: false,
            accepted: default_accepted(),
            handler: default_handler(),
        }
    }
}

fn default_accepted() -> Vec<ValueKind> {
    vec![ValueKind::Float, ValueKind::Int, ValueKind::Bool]
}

fn default_handler() -> String {
    "controlEvent".to_string()
}

#[derive(Default)]
struct SourceEntry {
    name: String,
    kind: ControllerKind,
    plugs: Vec<SharedPlug>,
    listeners: Vec<SharedListener>,
}

/// Registry of sources and their plugs and listeners
pub struct EventBus {
    config: BusConfig,
    sources: RefCell<HashMap<SourceId, SourceEntry>>,
    next_source: Cell<u32>,
    broadcast: Cell<bool>,
    access: AccessGuard,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        let access = AccessGuard::new(config.restricted_execution);
        Self {
            config,
            sources: RefCell::new(HashMap::new()),
            next_source: Cell::new(1),
            broadcast: Cell::new(true),
            access,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Guard shared by every plug bound through this bus
    pub fn access(&self) -> &AccessGuard {
        &self.access
    }

    /// Register a controller and return its source id
    pub fn register_controller(&self, name: &str, kind: ControllerKind) -> SourceId {
        let id = SourceId(self.next_source.get());
        self.next_source.set(id.0 + 1);
        self.sources.borrow_mut().insert(
            id,
            SourceEntry {
                name: name.to_string(),
                kind,
                ..Default::default()
            },
        );
        log::debug!("Registered {:?} '{}' as {:?}", kind, name, id);
        id
    }

    /// Forget a controller together with its plugs and listeners
    pub fn remove_controller(&self, source: SourceId) -> bool {
        self.sources.borrow_mut().remove(&source).is_some()
    }

    pub fn source_name(&self, source: SourceId) -> Option<String> {
        self.sources.borrow().get(&source).map(|e| e.name.clone())
    }

    pub fn plug_count(&self, source: SourceId) -> usize {
        self.sources.borrow().get(&source).map_or(0, |e| e.plugs.len())
    }

    pub fn listener_count(&self, source: SourceId) -> usize {
        self.sources.borrow().get(&source).map_or(0, |e| e.listeners.len())
    }

    /// Append a plug to a source.
    ///
    /// Returns false if it was already registered or the source is unknown.
    pub fn register_plug(&self, source: SourceId, plug: &SharedPlug) -> bool {
        let mut sources = self.sources.borrow_mut();
        let Some(entry) = sources.get_mut(&source) else {
            log::warn!("Cannot register a plug on unknown source {:?}", source);
            return false;
        };
        if entry.plugs.iter().any(|p| Rc::ptr_eq(p, plug)) {
            return false;
        }
        entry.plugs.push(Rc::clone(plug));
        true
    }

    pub fn unregister_plug(&self, source: SourceId, plug: &SharedPlug) -> bool {
        let mut sources = self.sources.borrow_mut();
        let Some(entry) = sources.get_mut(&source) else {
            return false;
        };
        let before = entry.plugs.len();
        entry.plugs.retain(|p| !Rc::ptr_eq(p, plug));
        entry.plugs.len() != before
    }

    /// Append a listener to a source.
    ///
    /// Returns false if it was already registered or the source is unknown.
    pub fn register_listener(&self, source: SourceId, listener: &SharedListener) -> bool {
        let mut sources = self.sources.borrow_mut();
        let Some(entry) = sources.get_mut(&source) else {
            log::warn!("Cannot register a listener on unknown source {:?}", source);
            return false;
        };
        if entry.listeners.iter().any(|l| same_listener(l, listener)) {
            return false;
        }
        entry.listeners.push(Rc::clone(listener));
        true
    }

    pub fn unregister_listener(&self, source: SourceId, listener: &SharedListener) -> bool {
        let mut sources = self.sources.borrow_mut();
        let Some(entry) = sources.get_mut(&source) else {
            return false;
        };
        let before = entry.listeners.len();
        entry.listeners.retain(|l| !same_listener(l, listener));
        entry.listeners.len() != before
    }

    /// Bind `name` on `host` and register the plug for `source`
    pub fn plug<H: Pluggable>(
        &self,
        source: SourceId,
        host: &Rc<RefCell<H>>,
        name: &str,
        kind: BindingKind,
        accepted: &[ValueKind],
    ) -> SharedPlug {
        let plug = Rc::new(RefCell::new(Plug::bind(host, name, kind, accepted, &self.access)));
        self.register_plug(source, &plug);
        plug
    }

    /// Plug a source to the member of `host` sharing `name`.
    ///
    /// A method with no parameter or one accepted parameter is preferred,
    /// otherwise the name is bound as a field.
    pub fn plug_to<H: Pluggable>(
        &self,
        source: SourceId,
        host: &Rc<RefCell<H>>,
        name: &str,
    ) -> SharedPlug {
        let accepted = self.config.accepted.clone();
        let is_method = Plug::check_plug::<H>(name, &[])
            || accepted.iter().any(|kind| Plug::check_plug::<H>(name, &[*kind]));
        let kind = if is_method {
            BindingKind::Method
        } else {
            BindingKind::Field
        };
        self.plug(source, host, name, kind, &accepted)
    }

    /// Plug a source to the host's generic event handler
    pub fn plug_handler<H: Pluggable>(
        &self,
        source: SourceId,
        host: &Rc<RefCell<H>>,
    ) -> SharedPlug {
        let name = self.config.handler.clone();
        self.plug(source, host, &name, BindingKind::Handler, &[])
    }

    /// Turn event delivery on or off
    pub fn set_broadcast(&self, enabled: bool) {
        self.broadcast.set(enabled);
    }

    pub fn is_broadcasting(&self) -> bool {
        self.broadcast.get()
    }

    /// Deliver a value change of `source` to its plugs, then its listeners.
    pub fn notify(&self, source: SourceId, value: f32) {
        if !self.broadcast.get() {
            return;
        }

        // Work on a snapshot so targets may register, unregister or notify.
        let (event, plugs, listeners) = {
            let sources = self.sources.borrow();
            let Some(entry) = sources.get(&source) else {
                log::debug!("Dropping event for unknown source {:?}", source);
                return;
            };
            let event = ControlEvent {
                source,
                name: entry.name.clone(),
                kind: entry.kind,
                value,
            };
            (event, entry.plugs.clone(), entry.listeners.clone())
        };

        for shared in &plugs {
            let Ok(plug) = shared.try_borrow() else {
                log::warn!("Plug of '{}' is being rebound, skipped", event.name);
                continue;
            };
            if let Err(err) = plug.dispatch(value, &event) {
                log::warn!(
                    "Could not deliver {} from '{}' to '{}': {}",
                    value,
                    event.name,
                    plug.name(),
                    err
                );
            }
        }

        for shared in &listeners {
            match shared.try_borrow_mut() {
                Ok(mut listener) => listener.control_event(&event, self),
                Err(_) => log::warn!("Listener of '{}' is busy, skipped", event.name),
            }
        }
    }
}

fn same_listener(a: &SharedListener, b: &SharedListener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::Capabilities;
    use crate::test_log;

    #[derive(Default)]
    struct Sketch {
        calls: Vec<String>,
        slide: Option<f32>,
        level: i32,
    }

    impl Pluggable for Sketch {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.method("onSlide", |s: &mut Sketch, v: f32| {
                s.calls.push("onSlide".into());
                s.slide = Some(v);
            })
            .method0("bang", |s| s.calls.push("bang".into()))
            .try_method("explode", |s: &mut Sketch, _: f32| {
                s.calls.push("explode".into());
                Err("boom".into())
            })
            .field("level", |s: &Sketch| s.level, |s, v: i32| s.level = v)
            .handler("controlEvent", |s, e| s.calls.push(format!("event:{}", e.name)));
        }
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<String>>>,
        tag: &'static str,
    }

    impl ControlListener for Recorder {
        fn control_event(&mut self, event: &ControlEvent, _: &EventBus) {
            self.seen.borrow_mut().push(format!("{}:{}", self.tag, event.value));
        }
    }

    /// Re-broadcasts every event it receives under its own source
    struct Relay {
        target: SourceId,
    }

    impl ControlListener for Relay {
        fn control_event(&mut self, event: &ControlEvent, bus: &EventBus) {
            bus.notify(self.target, event.value * 2.0);
        }
    }

    fn setup() -> (EventBus, SourceId, Rc<RefCell<Sketch>>) {
        let bus = EventBus::new();
        let source = bus.register_controller("slider", ControllerKind::Generic);
        (bus, source, Rc::new(RefCell::new(Sketch::default())))
    }

    #[test]
    fn test_notify_invokes_slide_once() {
        let (bus, source, host) = setup();
        bus.plug(source, &host, "onSlide", BindingKind::Method, &[ValueKind::Float]);

        bus.notify(source, 0.73);
        assert_eq!(host.borrow().slide, Some(0.73));
        assert_eq!(host.borrow().calls, vec!["onSlide"]);
    }

    #[test]
    fn test_missing_name_is_invalid_and_silent() {
        test_log::start();
        let (bus, source, host) = setup();
        let accepted = [ValueKind::Float];
        let plug = bus.plug(source, &host, "doesNotExist", BindingKind::Method, &accepted);

        assert_eq!(plug.borrow().kind(), BindingKind::Invalid);
        bus.notify(source, 1.0);
        assert_eq!(test_log::warnings_mentioning("doesNotExist"), 1);
        assert!(host.borrow().calls.is_empty());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let (bus, source, host) = setup();
        let plug = bus.plug(source, &host, "bang", BindingKind::Method, &[]);
        assert!(!bus.register_plug(source, &plug));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener: SharedListener = Rc::new(RefCell::new(Recorder {
            seen: Rc::clone(&seen),
            tag: "a",
        }));
        assert!(bus.register_listener(source, &listener));
        assert!(!bus.register_listener(source, &listener));

        bus.notify(source, 1.0);
        assert_eq!(host.borrow().calls, vec!["bang"]);
        assert_eq!(*seen.borrow(), vec!["a:1"]);
        assert_eq!(bus.plug_count(source), 1);
        assert_eq!(bus.listener_count(source), 1);
    }

    #[test]
    fn test_fault_does_not_stop_later_targets() {
        test_log::start();
        let (bus, source, host) = setup();
        bus.plug(source, &host, "explode", BindingKind::Method, &[ValueKind::Float]);
        bus.plug(source, &host, "onSlide", BindingKind::Method, &[ValueKind::Float]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener: SharedListener = Rc::new(RefCell::new(Recorder {
            seen: Rc::clone(&seen),
            tag: "after",
        }));
        bus.register_listener(source, &listener);

        bus.notify(source, 0.5);
        assert_eq!(host.borrow().calls, vec!["explode", "onSlide"]);
        assert_eq!(*seen.borrow(), vec!["after:0.5"]);
        assert_eq!(test_log::warnings_mentioning("boom"), 1);
    }

    #[test]
    fn test_dispatch_follows_registration_order() {
        let (bus, source, host) = setup();
        bus.plug_handler(source, &host);
        bus.plug(source, &host, "bang", BindingKind::Method, &[]);
        bus.plug(source, &host, "onSlide", BindingKind::Method, &[ValueKind::Float]);

        bus.notify(source, 0.1);
        assert_eq!(host.borrow().calls, vec!["event:slider", "bang", "onSlide"]);
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let (bus, source, host) = setup();
        let plug = bus.plug(source, &host, "bang", BindingKind::Method, &[]);
        assert!(bus.unregister_plug(source, &plug));
        assert!(!bus.unregister_plug(source, &plug));

        bus.notify(source, 1.0);
        assert!(host.borrow().calls.is_empty());
    }

    #[test]
    fn test_plug_to_picks_method_or_field() {
        let (bus, source, host) = setup();
        let method = bus.plug_to(source, &host, "onSlide");
        let field = bus.plug_to(source, &host, "level");
        assert_eq!(method.borrow().kind(), BindingKind::Method);
        assert_eq!(field.borrow().kind(), BindingKind::Field);

        bus.notify(source, 7.8);
        assert_eq!(host.borrow().level, 7);
    }

    #[test]
    fn test_listener_can_rebroadcast() {
        let (bus, source, host) = setup();
        let parent = bus.register_controller("menu", ControllerKind::MultiList);
        bus.plug(parent, &host, "onSlide", BindingKind::Method, &[ValueKind::Float]);
        let relay: SharedListener = Rc::new(RefCell::new(Relay { target: parent }));
        bus.register_listener(source, &relay);

        bus.notify(source, 0.25);
        assert_eq!(host.borrow().slide, Some(0.5));
    }

    #[test]
    fn test_broadcast_switch_and_removal() {
        let (bus, source, host) = setup();
        bus.plug(source, &host, "bang", BindingKind::Method, &[]);

        bus.set_broadcast(false);
        bus.notify(source, 1.0);
        assert!(host.borrow().calls.is_empty());

        bus.set_broadcast(true);
        assert!(bus.remove_controller(source));
        bus.notify(source, 1.0);
        assert!(host.borrow().calls.is_empty());
        assert_eq!(bus.source_name(source), None);
    }

    #[test]
    fn test_unknown_source_is_not_registered() {
        test_log::start();
        let (bus, source, host) = setup();
        assert!(bus.remove_controller(source));

        let plug = bus.plug(source, &host, "bang", BindingKind::Method, &[]);
        assert!(!bus.register_plug(source, &plug));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let listener: SharedListener = Rc::new(RefCell::new(Recorder { seen, tag: "late" }));
        assert!(!bus.register_listener(source, &listener));

        assert_eq!(bus.source_name(source), None);
        assert_eq!(bus.plug_count(source), 0);
        assert_eq!(test_log::warnings_mentioning("unknown source"), 3);
    }

    #[test]
    fn test_busy_host_is_logged_not_fatal() {
        test_log::start();
        let (bus, source, host) = setup();
        bus.plug(source, &host, "bang", BindingKind::Method, &[]);

        let _held = host.borrow_mut();
        bus.notify(source, 1.0);
        assert_eq!(test_log::warnings_mentioning("already borrowed"), 1);
    }
}
