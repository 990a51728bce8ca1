use crate::dom::{Dom, Handler, RefHook};
use core::fmt::{self, Debug, Display, Formatter};
use std::{collections::BTreeMap, rc::Rc};

/// The content of one data hole of a [`Block`](`crate::BlockNode`).
///
/// Which variants a hole accepts:
///
/// - text: [`Text`](`Value::Text`) is the data, [`Empty`](`Value::Empty`) the empty string.
/// - attribute: [`Text`](`Value::Text`) is the value, [`Bool(true)`](`Value::Bool`) sets `""`, [`Empty`](`Value::Empty`) and `Bool(false)` remove it.
/// - `class` attribute: [`Text`](`Value::Text`) holds whitespace-separated tokens, which are added and removed one by one.
///   [`Empty`](`Value::Empty`) means no tokens.
/// - property (`value`, `checked` and the like on form controls): [`Text`](`Value::Text`) or [`Bool`](`Value::Bool`).
///   [`Empty`](`Value::Empty`) resets `value` to `""` and anything else to `false`.
/// - attribute map: [`Attributes`](`Value::Attributes`), [`Empty`](`Value::Empty`) for none.
/// - handler: [`Handler`](`Value::Handler`), or [`Empty`](`Value::Empty`) for no listener.
/// - ref: [`Ref`](`Value::Ref`), or [`Empty`](`Value::Empty`) for no callback.
///
/// Anything else is a contract violation and panics.
pub enum Value<D: Dom> {
	Empty,
	Text(String),
	Bool(bool),
	/// Attributes set as a whole. Names missing from the next value are removed again; `class` is diffed by token.
	Attributes(BTreeMap<String, String>),
	Handler(Handler<D>),
	Ref(RefHook<D>),
}

impl<D: Dom> Value<D> {
	/// Formats `value` into a [`Value::Text`].
	pub fn display(value: impl Display) -> Self {
		Self::Text(value.to_string())
	}

	pub fn handler(handler: impl 'static + Fn(&D::Event)) -> Self {
		Self::Handler(Rc::new(handler))
	}

	pub fn reference(hook: impl 'static + Fn(Option<&D::Node>)) -> Self {
		Self::Ref(Rc::new(hook))
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Value::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Collects `attributes` into a [`Value::Attributes`].
	pub fn attributes<N: Into<String>, V: Into<String>>(attributes: impl IntoIterator<Item = (N, V)>) -> Self {
		Self::Attributes(attributes.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
	}

	pub(crate) fn kind_name(&self) -> &'static str {
		match self {
			Value::Empty => "empty",
			Value::Text(_) => "text",
			Value::Bool(_) => "bool",
			Value::Attributes(_) => "attributes",
			Value::Handler(_) => "handler",
			Value::Ref(_) => "ref",
		}
	}
}

fn same_rc<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
	Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

impl<D: Dom> PartialEq for Value<D> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Empty, Value::Empty) => true,
			(Value::Text(a), Value::Text(b)) => a == b,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Attributes(a), Value::Attributes(b)) => a == b,
			(Value::Handler(a), Value::Handler(b)) => same_rc(a, b),
			(Value::Ref(a), Value::Ref(b)) => same_rc(a, b),
			_ => false,
		}
	}
}

impl<D: Dom> Clone for Value<D> {
	fn clone(&self) -> Self {
		match self {
			Value::Empty => Value::Empty,
			Value::Text(text) => Value::Text(text.clone()),
			Value::Bool(flag) => Value::Bool(*flag),
			Value::Attributes(attributes) => Value::Attributes(attributes.clone()),
			Value::Handler(handler) => Value::Handler(Rc::clone(handler)),
			Value::Ref(hook) => Value::Ref(Rc::clone(hook)),
		}
	}
}

impl<D: Dom> Debug for Value<D> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Empty => f.write_str("Empty"),
			Value::Text(text) => {
				if cfg!(feature = "dangerous-logging") {
					f.debug_tuple("Text").field(text).finish()
				} else {
					write!(f, "Text(<{} bytes>)", text.len())
				}
			}
			Value::Bool(flag) => f.debug_tuple("Bool").field(flag).finish(),
			Value::Attributes(attributes) => {
				if cfg!(feature = "dangerous-logging") {
					f.debug_tuple("Attributes").field(attributes).finish()
				} else {
					f.debug_tuple("Attributes").field(&attributes.keys().collect::<Vec<_>>()).finish()
				}
			}
			Value::Handler(handler) => write!(f, "Handler({:p})", Rc::as_ptr(handler).cast::<()>()),
			Value::Ref(hook) => write!(f, "Ref({:p})", Rc::as_ptr(hook).cast::<()>()),
		}
	}
}

impl<D: Dom> Default for Value<D> {
	fn default() -> Self {
		Self::Empty
	}
}

impl<D: Dom> From<&str> for Value<D> {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl<D: Dom> From<String> for Value<D> {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl<D: Dom, T: Into<Value<D>>> From<Option<T>> for Value<D> {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Empty, Into::into)
	}
}

impl<D: Dom> From<bool> for Value<D> {
	fn from(flag: bool) -> Self {
		Self::Bool(flag)
	}
}
