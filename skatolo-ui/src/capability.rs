//! Named members a host type exposes to plugs
//!
//! A host registers its methods, fields and event handlers under symbolic
//! names once, in declaration order. Plugs resolve against this table.

use std::rc::Rc;

use crate::bus::ControlEvent;
use crate::coerce::{Arg, Value, ValueKind};
use crate::error::HostResult;

/// Visibility of a registered member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Public,
    Private,
}

pub(crate) type MethodFn<H> = Rc<dyn Fn(&mut H, Option<Value>) -> HostResult>;
pub(crate) type HandlerFn<H> = Rc<dyn Fn(&mut H, &ControlEvent) -> HostResult>;
pub(crate) type GetterFn<H> = Rc<dyn Fn(&H) -> Value>;
pub(crate) type SetterFn<H> = Rc<dyn Fn(&mut H, Value) -> HostResult>;

pub(crate) enum Shape<H> {
    /// Zero or one parameter
    Method {
        param: Option<ValueKind>,
        call: MethodFn<H>,
    },
    /// Receives the full control event
    Handler(HandlerFn<H>),
    Field {
        kind: ValueKind,
        get: GetterFn<H>,
        set: SetterFn<H>,
    },
    /// Declared by the host but not granted to plugs
    Unavailable,
}

pub(crate) struct Member<H> {
    pub(crate) name: String,
    pub(crate) access: Access,
    pub(crate) shape: Shape<H>,
}

impl<H> Member<H> {
    pub(crate) fn method_param(&self) -> Option<Option<ValueKind>> {
        match &self.shape {
            Shape::Method { param, .. } => Some(*param),
            _ => None,
        }
    }
}

/// Implemented by host types that can be the target of plugs
pub trait Pluggable: Sized + 'static {
    /// Register the members plugs may bind to.
    fn capabilities(caps: &mut Capabilities<Self>);
}

/// Ordered table of members registered by a host type
pub struct Capabilities<H> {
    members: Vec<Member<H>>,
}

impl<H> Default for Capabilities<H> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<H: 'static> Capabilities<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table a pluggable host type declares
    pub fn of() -> Self
    where
        H: Pluggable,
    {
        let mut caps = Self::new();
        H::capabilities(&mut caps);
        caps
    }

    /// Register a method without parameters
    pub fn method0(&mut self, name: &str, f: impl Fn(&mut H) + 'static) -> &mut Self {
        let call = move |host: &mut H, _: Option<Value>| -> HostResult {
            f(host);
            Ok(())
        };
        self.push(
            name,
            Shape::Method {
                param: None,
                call: Rc::new(call),
            },
        )
    }

    /// Register a method taking one argument
    pub fn method<A: Arg>(&mut self, name: &str, f: impl Fn(&mut H, A) + 'static) -> &mut Self {
        self.try_method(name, move |host: &mut H, arg: A| -> HostResult {
            f(host, arg);
            Ok(())
        })
    }

    /// Register a fallible method taking one argument
    pub fn try_method<A: Arg>(
        &mut self,
        name: &str,
        f: impl Fn(&mut H, A) -> HostResult + 'static,
    ) -> &mut Self {
        let call = move |host: &mut H, value: Option<Value>| -> HostResult {
            match value.and_then(A::from_value) {
                Some(arg) => f(host, arg),
                None => Err(format!("expected a {:?} argument", A::KIND).into()),
            }
        };
        self.push(
            name,
            Shape::Method {
                param: Some(A::KIND),
                call: Rc::new(call),
            },
        )
    }

    /// Register a handler receiving the whole control event
    pub fn handler(
        &mut self,
        name: &str,
        f: impl Fn(&mut H, &ControlEvent) + 'static,
    ) -> &mut Self {
        let call = move |host: &mut H, event: &ControlEvent| -> HostResult {
            f(host, event);
            Ok(())
        };
        self.push(name, Shape::Handler(Rc::new(call)))
    }

    /// Register a field through its getter and setter
    pub fn field<A: Arg>(
        &mut self,
        name: &str,
        get: impl Fn(&H) -> A + 'static,
        set: impl Fn(&mut H, A) + 'static,
    ) -> &mut Self {
        let getter = move |host: &H| get(host).into_value();
        let setter = move |host: &mut H, value: Value| -> HostResult {
            match A::from_value(value) {
                Some(arg) => {
                    set(host, arg);
                    Ok(())
                }
                None => Err(format!("expected a {:?} value", A::KIND).into()),
            }
        };
        self.push(
            name,
            Shape::Field {
                kind: A::KIND,
                get: Rc::new(getter),
                set: Rc::new(setter),
            },
        )
    }

    /// Declare a member the environment does not let plugs reach
    pub fn unavailable(&mut self, name: &str) -> &mut Self {
        self.push(name, Shape::Unavailable)
    }

    /// Mark the most recently registered member as non-public
    pub fn private(&mut self) -> &mut Self {
        if let Some(member) = self.members.last_mut() {
            member.access = Access::Private;
        }
        self
    }

    /// Number of registered members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether any member is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.named(name).next().is_some()
    }

    pub(crate) fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Member<H>> + 'a {
        self.members.iter().filter(move |m| m.name == name)
    }

    fn push(&mut self, name: &str, shape: Shape<H>) -> &mut Self {
        self.members.push(Member {
            name: name.to_string(),
            access: Access::Public,
            shape,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Knob {
        level: f32,
    }

    impl Pluggable for Knob {
        fn capabilities(caps: &mut Capabilities<Self>) {
            caps.method("level", |k: &mut Knob, v: f32| k.level = v)
                .method0("level", |k| k.level = 0.0)
                .field("level", |k: &Knob| k.level, |k, v: f32| k.level = v)
                .private()
                .unavailable("hidden");
        }
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let caps = Capabilities::<Knob>::of();
        assert_eq!(caps.len(), 4);
        let params: Vec<_> = caps.named("level").map(|m| m.method_param()).collect();
        assert_eq!(params, vec![Some(Some(ValueKind::Float)), Some(None), None]);
    }

    #[test]
    fn test_private_marks_last_member() {
        let caps = Capabilities::<Knob>::of();
        let access: Vec<_> = caps.named("level").map(|m| m.access).collect();
        assert_eq!(access, vec![Access::Public, Access::Public, Access::Private]);
        assert!(caps.contains("hidden"));
        assert!(!caps.contains("missing"));
    }

    #[test]
    fn test_try_method_rejects_wrong_value() {
        let caps = Capabilities::<Knob>::of();
        let mut knob = Knob::default();
        let member = caps.named("level").next().unwrap();
        let Shape::Method { call, .. } = &member.shape else {
            panic!("expected a method");
        };
        assert!(call(&mut knob, Some(Value::Int(3))).is_err());
        assert!(call(&mut knob, Some(Value::Float(0.25))).is_ok());
        assert_eq!(knob.level, 0.25);
    }
}
