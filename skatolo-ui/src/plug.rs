//! Plugs: name-based bindings from a controller to a member of a host object
//!
//! A [`Plug`] is resolved eagerly when it is bound. Resolution never fails
//! loudly: a plug that cannot be resolved becomes [`BindingKind::Invalid`],
//! records the [`BindError`] and logs a single warning. Dispatching to an
//! invalid plug is a no-op.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Deserialize;

use crate::bus::ControlEvent;
use crate::capability::{Access, Capabilities, Member, Pluggable, Shape};
use crate::coerce::{coerce, Value, ValueKind};
use crate::error::{BindError, DispatchError, HostResult};

/// What a plug binds to on its host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Method,
    Field,
    /// A handler receiving the whole [`ControlEvent`]
    Handler,
    #[default]
    Invalid,
}

/// Tracks whether the host environment restricts access to private members.
///
/// Once a binding hits an unavailable member the guard switches to restricted
/// mode and later resolutions skip private members up front.
#[derive(Debug, Default)]
pub struct AccessGuard {
    restricted: Cell<bool>,
}

impl AccessGuard {
    pub fn new(restricted: bool) -> Self {
        Self {
            restricted: Cell::new(restricted),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted.get()
    }

    pub fn restrict(&self) {
        if !self.restricted.replace(true) {
            log::info!(
                "Restricted execution detected, only public members can be plugged from now on"
            );
        }
    }

    fn check<H>(&self, member: &Member<H>) -> Result<(), BindError> {
        if member.access == Access::Private && self.is_restricted() {
            return Err(BindError::Inaccessible {
                name: member.name.clone(),
            });
        }
        Ok(())
    }
}

type Invoke = Rc<dyn Fn(f32, &ControlEvent) -> Result<(), DispatchError>>;

struct Resolved {
    kind: BindingKind,
    param: Option<ValueKind>,
    value: Option<Value>,
    invoke: Invoke,
}

/// A binding from a symbolic name to a method, field or handler of a host
pub struct Plug {
    host: Weak<dyn Any>,
    name: String,
    requested: BindingKind,
    accepted: Vec<ValueKind>,
    param: Option<ValueKind>,
    value: Option<Value>,
    target: Option<(BindingKind, Invoke)>,
    failure: Option<BindError>,
    /// Set after the first skipped dispatch so an invalid plug logs once
    skipped: Cell<bool>,
}

impl Plug {
    /// Bind `name` on `host` and resolve it immediately.
    pub fn bind<H: Pluggable>(
        host: &Rc<RefCell<H>>,
        name: &str,
        kind: BindingKind,
        accepted: &[ValueKind],
        guard: &AccessGuard,
    ) -> Self {
        let weak = Rc::downgrade(host) as Weak<RefCell<H>>;
        let mut plug = Self {
            host: weak,
            name: name.to_string(),
            requested: kind,
            accepted: accepted.to_vec(),
            param: None,
            value: None,
            target: None,
            failure: None,
            skipped: Cell::new(false),
        };
        plug.set(host, name, kind, accepted, guard);
        plug
    }

    /// Re-bind this plug, possibly to another host, name or kind.
    pub fn set<H: Pluggable>(
        &mut self,
        host: &Rc<RefCell<H>>,
        name: &str,
        kind: BindingKind,
        accepted: &[ValueKind],
        guard: &AccessGuard,
    ) {
        let weak = Rc::downgrade(host) as Weak<RefCell<H>>;
        self.host = weak;
        self.name = name.to_string();
        self.requested = kind;
        self.accepted = accepted.to_vec();
        self.skipped.set(false);

        match resolve(host, name, kind, accepted, guard) {
            Ok(resolved) => {
                log::debug!("Plugged '{}' as {:?}", name, resolved.kind);
                self.param = resolved.param;
                self.value = resolved.value;
                self.target = Some((resolved.kind, resolved.invoke));
                self.failure = None;
            }
            Err(err) => {
                log::warn!("plug() failed for '{}': {}", name, err);
                self.param = None;
                self.value = None;
                self.target = None;
                self.failure = Some(err);
            }
        }
    }

    /// Whether `H` declares a method `name` with exactly the parameters `params`.
    ///
    /// Access rules are not applied; this only inspects the declared members.
    pub fn check_plug<H: Pluggable>(name: &str, params: &[ValueKind]) -> bool {
        let wanted = match params {
            [] => None,
            [kind] => Some(*kind),
            _ => return false,
        };
        Capabilities::<H>::of()
            .named(name)
            .any(|m| m.method_param() == Some(wanted))
    }

    /// Deliver a controller value to the resolved target.
    pub fn dispatch(&self, value: f32, event: &ControlEvent) -> Result<(), DispatchError> {
        match &self.target {
            Some((_, invoke)) => invoke(value, event),
            None => {
                if !self.skipped.replace(true) {
                    log::debug!("Skipping invalid plug '{}'", self.name);
                }
                Ok(())
            }
        }
    }

    /// Resolved binding kind, `Invalid` when resolution failed
    pub fn kind(&self) -> BindingKind {
        self.target
            .as_ref()
            .map_or(BindingKind::Invalid, |(kind, _)| *kind)
    }

    pub fn is_valid(&self) -> bool {
        self.target.is_some()
    }

    /// Kind that was asked for when binding
    pub fn requested_kind(&self) -> BindingKind {
        self.requested
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field value read when the plug was bound
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The host object, if it is still alive
    pub fn object(&self) -> Option<Rc<dyn Any>> {
        self.host.upgrade()
    }

    /// The host object as its concrete type
    pub fn object_as<H: 'static>(&self) -> Option<Rc<RefCell<H>>> {
        self.object()?.downcast::<RefCell<H>>().ok()
    }

    /// Parameter kind of the resolved target.
    ///
    /// `None` for zero-argument methods and handlers.
    pub fn class_type(&self) -> Option<ValueKind> {
        self.param
    }

    pub fn accepted(&self) -> &[ValueKind] {
        &self.accepted
    }

    /// Why the last resolution failed
    pub fn failure(&self) -> Option<&BindError> {
        self.failure.as_ref()
    }
}

impl fmt::Debug for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plug")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .field("param", &self.param)
            .field("value", &self.value)
            .field("failure", &self.failure)
            .finish()
    }
}

fn resolve<H: Pluggable>(
    host: &Rc<RefCell<H>>,
    name: &str,
    kind: BindingKind,
    accepted: &[ValueKind],
    guard: &AccessGuard,
) -> Result<Resolved, BindError> {
    let caps = Capabilities::<H>::of();
    let not_found = || BindError::NotFound {
        name: name.to_string(),
    };

    if kind == BindingKind::Invalid {
        return Err(BindError::InvalidKind {
            name: name.to_string(),
        });
    }
    if caps
        .named(name)
        .any(|m| matches!(m.shape, Shape::Unavailable))
    {
        guard.restrict();
        return Err(BindError::Unavailable {
            name: name.to_string(),
        });
    }

    let weak = Rc::downgrade(host);
    match kind {
        BindingKind::Method => {
            // The first declaration of `name` decides: its parameter must be
            // accepted, otherwise only a zero-argument overload can match.
            let first = caps.named(name).find(|m| m.method_param().is_some());
            let member = match first {
                Some(m)
                    if m.method_param().flatten().is_some_and(|k| accepted.contains(&k)) =>
                {
                    m
                }
                _ => caps
                    .named(name)
                    .find(|m| m.method_param() == Some(None))
                    .ok_or_else(not_found)?,
            };
            guard.check(member)?;
            let Shape::Method { param, call } = &member.shape else {
                return Err(not_found());
            };
            let (param, call) = (*param, Rc::clone(call));
            let invoke = move |value: f32, _: &ControlEvent| -> Result<(), DispatchError> {
                let arg = match param {
                    Some(kind) => {
                        Some(coerce(value, kind).ok_or(DispatchError::Unsupported(kind))?)
                    }
                    None => None,
                };
                with_host(&weak, |h| call(h, arg))
            };
            Ok(Resolved {
                kind,
                param,
                value: None,
                invoke: Rc::new(invoke),
            })
        }
        BindingKind::Handler => {
            let member = caps
                .named(name)
                .find(|m| matches!(m.shape, Shape::Handler(_)))
                .ok_or_else(not_found)?;
            guard.check(member)?;
            let Shape::Handler(call) = &member.shape else {
                return Err(not_found());
            };
            let call = Rc::clone(call);
            let invoke = move |_: f32, event: &ControlEvent| -> Result<(), DispatchError> {
                with_host(&weak, |h| call(h, event))
            };
            Ok(Resolved {
                kind,
                param: None,
                value: None,
                invoke: Rc::new(invoke),
            })
        }
        BindingKind::Field => {
            let member = caps
                .named(name)
                .filter(|m| matches!(m.shape, Shape::Field { .. }))
                .last()
                .ok_or_else(not_found)?;
            guard.check(member)?;
            let Shape::Field { kind: field_kind, get, set } = &member.shape else {
                return Err(not_found());
            };
            let value = host
                .try_borrow()
                .map(|h| get(&*h))
                .map_err(|_| BindError::HostGone {
                    name: name.to_string(),
                })?;
            let (field_kind, set) = (*field_kind, Rc::clone(set));
            let invoke = move |value: f32, _: &ControlEvent| -> Result<(), DispatchError> {
                let value =
                    coerce(value, field_kind).ok_or(DispatchError::Unsupported(field_kind))?;
                with_host(&weak, |h| set(h, value))
            };
            Ok(Resolved {
                kind,
                param: Some(field_kind),
                value: Some(value),
                invoke: Rc::new(invoke),
            })
        }
        BindingKind::Invalid => Err(BindError::InvalidKind {
            name: name.to_string(),
        }),
    }
}

fn with_host<H>(
    host: &Weak<RefCell<H>>,
    f: impl FnOnce(&mut H) -> HostResult,
) -> Result<(), DispatchError> {
    let host = host.upgrade().ok_or(DispatchError::HostDropped)?;
    let mut guard = host.try_borrow_mut().map_err(|_| DispatchError::HostBusy)?;
    f(&mut *guard)?;
    Ok(())
}
