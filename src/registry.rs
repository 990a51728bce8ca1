use crate::{
	dom::Dom,
	template::{Template, TemplateError, TemplateNode, TemplateOptions},
};
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::debug;

/// Interns compiled [`Template`]s by name, so that each is compiled exactly once
/// and blocks built from the same name stay [compatible](`crate::VNode::is_compatible`).
pub struct Registry<D: Dom> {
	options: TemplateOptions,
	templates: HashMap<Rc<str>, Rc<Template<D>>>,
}

impl<D: Dom> Default for Registry<D> {
	fn default() -> Self {
		Self::new()
	}
}

impl<D: Dom> Registry<D> {
	#[must_use]
	pub fn new() -> Self {
		Self::with_options(TemplateOptions::default())
	}

	#[must_use]
	pub fn with_options(options: TemplateOptions) -> Self {
		Self {
			options,
			templates: HashMap::new(),
		}
	}

	/// Returns the template registered as `name`, compiling `markup()` first if there is none yet.
	///
	/// `markup` is not called for known names.
	///
	/// # Errors
	///
	/// Iff `markup()` fails to compile. Nothing is registered in that case.
	pub fn intern(&mut self, name: &str, markup: impl FnOnce() -> TemplateNode) -> Result<Rc<Template<D>>, TemplateError> {
		match self.templates.entry(name.into()) {
			Entry::Occupied(occupied) => Ok(Rc::clone(occupied.get())),
			Entry::Vacant(vacant) => {
				let template = Rc::new(Template::compile_with(markup(), self.options)?);
				debug!(name, id = template.id(), "Registered template.");
				Ok(Rc::clone(vacant.insert(template)))
			}
		}
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Rc<Template<D>>> {
		self.templates.get(name)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.templates.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.templates.is_empty()
	}

	#[must_use]
	pub fn options(&self) -> TemplateOptions {
		self.options
	}
}
