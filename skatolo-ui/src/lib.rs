//! # skatolo-ui
//!
//! Controllers for interactive sketches and the plumbing that connects their
//! value changes to the host application.
//!
//! ## Features
//! - Plugs: bind a controller to a method, field or event handler of a host by name
//! - Capability tables declared by host types
//! - Value coercion from `f32` to float, int and bool parameters
//! - An explicit event bus with ordered, fault-isolated delivery
//! - Buttons, labels and a multi-level menu
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use skatolo_ui::{BindingKind, Capabilities, ControllerKind, EventBus, Pluggable, ValueKind};
//!
//! #[derive(Default)]
//! struct Sketch {
//!     speed: f32,
//! }
//!
//! impl Pluggable for Sketch {
//!     fn capabilities(caps: &mut Capabilities<Self>) {
//!         caps.method("onSlide", |s: &mut Sketch, v: f32| s.speed = v);
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let slider = bus.register_controller("slider", ControllerKind::Generic);
//! let sketch = Rc::new(RefCell::new(Sketch::default()));
//! bus.plug(slider, &sketch, "onSlide", BindingKind::Method, &[ValueKind::Float]);
//!
//! bus.notify(slider, 0.73);
//! assert_eq!(sketch.borrow().speed, 0.73);
//! ```

pub mod bus;
pub mod capability;
pub mod coerce;
pub mod elements;
mod error;
pub mod plug;

// Binding core
pub use bus::{
    BusConfig, ControlEvent, ControlListener, ControllerKind, EventBus, SharedListener,
    SharedPlug, SourceId,
};
pub use capability::{Access, Capabilities, Pluggable};
pub use coerce::{coerce, Arg, Value, ValueKind};
pub use error::{BindError, DispatchError, HostFault, HostResult};
pub use plug::{AccessGuard, BindingKind, Plug};

// Elements system
pub use elements::{
    Button, ButtonState, Direction, InputState, Label, Modifiers, MultiList, MultiListConfig,
    NodeId, Rect, Widget,
};

/// Captures log records per test thread so tests can count warnings
#[cfg(test)]
pub(crate) mod test_log {
    use std::cell::RefCell;
    use std::sync::Once;

    use log::{Level, LevelFilter, Log, Metadata, Record};

    thread_local! {
        static RECORDS: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    struct Capture;

    impl Log for Capture {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: Capture = Capture;
    static INIT: Once = Once::new();

    /// Install the capture logger and clear this thread's records
    pub fn start() {
        INIT.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Trace);
            }
        });
        RECORDS.with(|r| r.borrow_mut().clear());
    }

    pub fn warnings_mentioning(text: &str) -> usize {
        RECORDS.with(|r| {
            r.borrow()
                .iter()
                .filter(|(level, message)| *level == Level::Warn && message.contains(text))
                .count()
        })
    }
}
