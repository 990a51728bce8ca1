use core::fmt::{self, Display, Formatter};
use std::rc::Rc;

/// Identifies an entry of a keyed [list](`crate::Node::List`) across patches, or the active variant of a [toggler](`crate::Node::Toggler`).
///
/// Keys must be unique within one list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
	Int(i64),
	Str(Rc<str>),
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}

impl From<&str> for Key {
	fn from(value: &str) -> Self {
		Self::Str(value.into())
	}
}

impl From<String> for Key {
	fn from(value: String) -> Self {
		Self::Str(value.into())
	}
}

impl From<Rc<str>> for Key {
	fn from(value: Rc<str>) -> Self {
		Self::Str(value)
	}
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => write!(f, "{}", int),
			Key::Str(str) => write!(f, "{:?}", str),
		}
	}
}
