mod common;

use block_vdom::{Handler, MemoryDom, MemoryEvent, Mutation, Node, NodeId, Property, RefHook, Template, TemplateError, TemplateNode, TemplateOptions, Value};
use common::{setup, touched};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

fn compile(root: TemplateNode) -> Rc<Template<MemoryDom>> {
	Rc::new(Template::compile(root).unwrap())
}

#[test]
fn text_hole() {
	let (mut dom, container) = setup();
	let greeting = compile(TemplateNode::element("p").children(vec![
		TemplateNode::text("Hello, "),
		TemplateNode::text_hole(0),
		TemplateNode::text("!"),
	]));

	let mut block = Node::block(&greeting, vec![Value::from("world")], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<p>Hello, world!</p>");
	dom.take_mutations();

	block.patch(&mut dom, Node::block(&greeting, vec![Value::from("world")], vec![]), &container, None).unwrap();
	assert!(dom.mutations().is_empty());

	block.patch(&mut dom, Node::block(&greeting, vec![Value::display(42)], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<p>Hello, 42!</p>");
	assert_eq!(dom.mutations().len(), 1);
	assert!(matches!(dom.mutations()[0], Mutation::SetText(_)));

	block.patch(&mut dom, Node::block(&greeting, vec![Value::Empty], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<p>Hello, !</p>");
}

#[test]
fn text_hole_as_root() {
	let (mut dom, container) = setup();
	let bare = compile(TemplateNode::text_hole(0));

	let mut block = Node::block(&bare, vec![Value::from("a")], vec![]).mount(&mut dom, &container, None).unwrap();
	block.patch(&mut dom, Node::block(&bare, vec![Value::from("b")], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "b");
}

#[test]
fn attribute_hole() {
	let (mut dom, container) = setup();
	let link = compile(TemplateNode::element("a").attribute("class", "link").attribute_hole("href", 0));

	let mut block = Node::block(&link, vec![Value::from("/home")], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<a class="link" href="/home"></a>"#);

	block.patch(&mut dom, Node::block(&link, vec![Value::from(None::<&str>)], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<a class="link"></a>"#);
	assert!(matches!(dom.mutations().last(), Some(Mutation::RemoveAttribute { name, .. }) if name == "href"));

	block.patch(&mut dom, Node::block(&link, vec![Value::from(Some("/away"))], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<a class="link" href="/away"></a>"#);
}

#[test]
fn handler_hole() {
	let (mut dom, container) = setup();
	let button = compile(TemplateNode::element("button").handler_hole("click", 0).child(TemplateNode::text("Click me")));

	let first = Rc::new(Cell::new(0));
	let second = Rc::new(Cell::new(0));
	let on_first: Handler<MemoryDom> = {
		let first = Rc::clone(&first);
		Rc::new(move |event: &MemoryEvent| {
			assert_eq!(event.name, "click");
			first.set(first.get() + 1);
		})
	};

	let mut block = Node::block(&button, vec![Value::Handler(Rc::clone(&on_first))], vec![])
		.mount(&mut dom, &container, None)
		.unwrap();
	let element = dom.children(container)[0];
	assert_eq!(dom.dispatch(element, "click"), 1);
	assert_eq!(first.get(), 1);

	// Same handler: no listener churn.
	dom.take_mutations();
	block.patch(&mut dom, Node::block(&button, vec![Value::Handler(Rc::clone(&on_first))], vec![]), &container, None).unwrap();
	assert!(dom.mutations().is_empty());

	let on_second = {
		let second = Rc::clone(&second);
		Value::<MemoryDom>::handler(move |_: &MemoryEvent| second.set(second.get() + 1))
	};
	block.patch(&mut dom, Node::block(&button, vec![on_second], vec![]), &container, None).unwrap();
	assert_eq!(
		dom.mutations(),
		[
			Mutation::RemoveListener {
				element,
				event: "click".to_owned()
			},
			Mutation::AddListener {
				element,
				event: "click".to_owned()
			},
		]
	);
	assert_eq!(dom.dispatch(element, "click"), 1);
	assert_eq!((first.get(), second.get()), (1, 1));

	block.patch(&mut dom, Node::block(&button, vec![Value::Empty], vec![]), &container, None).unwrap();
	assert_eq!(dom.listener_count(element, "click"), 0);
	assert_eq!(dom.dispatch(element, "click"), 0);
}

#[test]
fn removal_detaches_listeners() {
	let (mut dom, container) = setup();
	let button = compile(TemplateNode::element("button").handler_hole("click", 0).ref_hole(1));

	let kept = Rc::new(Cell::new(None));
	let keep = {
		let kept = Rc::clone(&kept);
		Value::<MemoryDom>::reference(move |element: Option<&NodeId>| {
			if let Some(&element) = element {
				kept.set(Some(element));
			}
		})
	};
	let block = Node::block(&button, vec![Value::<MemoryDom>::handler(|_: &MemoryEvent| ()), keep], vec![])
		.mount(&mut dom, &container, None)
		.unwrap();
	let element = kept.get().unwrap();
	assert_eq!(dom.listener_count(element, "click"), 1);

	block.before_remove();
	block.remove(&mut dom, &container).unwrap();
	assert_eq!(dom.listener_count(element, "click"), 0);
	assert_eq!(dom.dispatch(element, "click"), 0);
}

#[test]
fn nested_listeners_are_detached_with_their_parent() {
	let (mut dom, container) = setup();
	let button = compile(TemplateNode::element("button").handler_hole("click", 0));
	let toolbar = compile(TemplateNode::element("nav").child(TemplateNode::child_hole(0)));

	let nested = Node::block(&button, vec![Value::<MemoryDom>::handler(|_: &MemoryEvent| ())], vec![]);
	let block = Node::block(&toolbar, vec![], vec![Some(nested)]).mount(&mut dom, &container, None).unwrap();
	let nav = dom.children(container)[0];
	let inner = dom.children(nav)[0];

	block.before_remove();
	block.remove(&mut dom, &container).unwrap();
	assert_eq!(dom.listener_count(inner, "click"), 0);
}

#[test]
fn ref_hole() {
	let (mut dom, container) = setup();
	let input = compile(TemplateNode::element("label").child(TemplateNode::element("input").ref_hole(0)));

	let seen = Rc::new(RefCell::new(Vec::<Option<NodeId>>::new()));
	let hook: RefHook<MemoryDom> = {
		let seen = Rc::clone(&seen);
		Rc::new(move |element: Option<&NodeId>| seen.borrow_mut().push(element.copied()))
	};

	let block = Node::block(&input, vec![Value::Ref(Rc::clone(&hook))], vec![]).mount(&mut dom, &container, None).unwrap();
	let label = dom.children(container)[0];
	let element = dom.children(label)[0];
	assert_eq!(dom.tag(element), Some("input"));
	assert_eq!(*seen.borrow(), [Some(element)]);

	block.before_remove();
	block.remove(&mut dom, &container).unwrap();
	assert_eq!(*seen.borrow(), [Some(element), None]);
	assert!(dom.children(container).is_empty());
}

#[test]
fn ref_hole_replaced() {
	let (mut dom, container) = setup();
	let input = compile(TemplateNode::element("input").ref_hole(0));

	let log = Rc::new(RefCell::new(Vec::new()));
	let hook = |name: &'static str| {
		let log = Rc::clone(&log);
		Value::<MemoryDom>::reference(move |element: Option<&NodeId>| log.borrow_mut().push((name, element.is_some())))
	};

	let mut block = Node::block(&input, vec![hook("a")], vec![]).mount(&mut dom, &container, None).unwrap();
	block.patch(&mut dom, Node::block(&input, vec![hook("b")], vec![]), &container, None).unwrap();
	assert_eq!(*log.borrow(), [("a", true), ("a", false), ("b", true)]);
}

#[test]
fn child_holes() {
	let (mut dom, container) = setup();
	let frame = compile(TemplateNode::element("div").children(vec![
		TemplateNode::element("h1").child(TemplateNode::text("title")),
		TemplateNode::child_hole(0),
		TemplateNode::element("hr"),
		TemplateNode::child_hole(1),
	]));

	let mut block = Node::block(&frame, vec![], vec![Some(Node::text("x")), None]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<div><h1>title</h1>x<hr></hr></div>");
	let div = dom.children(container)[0];
	let x = dom.children(div)[1];
	dom.take_mutations();

	block.patch(&mut dom, Node::block(&frame, vec![], vec![Some(Node::text("x")), Some(Node::text("y"))]), &container, None)
		.unwrap();
	assert_eq!(dom.inner_html(container), "<div><h1>title</h1>x<hr></hr>y</div>");
	assert!(!touched(&dom, x));

	block.patch(&mut dom, Node::block(&frame, vec![], vec![None, Some(Node::text("z"))]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<div><h1>title</h1><hr></hr>z</div>");
	assert_eq!(dom.text_content(div), "titlez");
}

#[test]
fn nested_blocks() {
	let (mut dom, container) = setup();
	let item = compile(TemplateNode::element("li").child(TemplateNode::text_hole(0)));
	let list = compile(TemplateNode::element("ul").attribute_hole("class", 0).child(TemplateNode::child_hole(0)));

	let render = |class: &str, item_text: &str| {
		Node::block(&list, vec![Value::from(class)], vec![Some(Node::block(&item, vec![Value::from(item_text)], vec![]))])
	};

	let mut block = render("a", "1").mount(&mut dom, &container, None).unwrap();
	dom.take_mutations();
	block.patch(&mut dom, render("a", "2"), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<ul class="a"><li>2</li></ul>"#);
	assert_eq!(dom.mutations().len(), 1);
}

#[test]
fn static_content_is_set_on_the_prototype_only() {
	let (mut dom, container) = setup();
	let styled = compile(TemplateNode::element("div").attribute("class", "card").child(TemplateNode::element("span").attribute("title", "t")));

	let mut multi = Node::multi(vec![Some(Node::block(&styled, vec![], vec![])), None]).mount(&mut dom, &container, None).unwrap();
	dom.take_mutations();

	multi.patch(&mut dom, Node::multi(vec![Some(Node::block(&styled, vec![], vec![])), Some(Node::block(&styled, vec![], vec![]))]), &container, None)
		.unwrap();
	assert_eq!(dom.count_mutations(|m| matches!(m, Mutation::SetAttribute { .. })), 0);
	assert_eq!(dom.count_mutations(|m| matches!(m, Mutation::Insert { .. })), 1);
	assert_eq!(
		dom.inner_html(container),
		r#"<div class="card"><span title="t"></span></div><div class="card"><span title="t"></span></div>"#
	);
}

#[test]
fn different_templates_replace() {
	let (mut dom, container) = setup();
	let a = compile(TemplateNode::element("a"));
	let b = compile(TemplateNode::element("b"));

	let mut block = Node::block(&a, vec![], vec![]).mount(&mut dom, &container, None).unwrap();
	let old = dom.children(container)[0];
	block.patch(&mut dom, Node::block(&b, vec![], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<b></b>");
	assert_ne!(dom.children(container)[0], old);
	assert_eq!(dom.parent(old), None);
}

#[test]
fn escaping() {
	let (mut dom, container) = setup();
	let quote = compile(TemplateNode::element("q").attribute_hole("cite", 0).child(TemplateNode::text_hole(1)));

	let _block = Node::block(&quote, vec![Value::from(r#""a" & b"#), Value::from("<i>")], vec![])
		.mount(&mut dom, &container, None)
		.unwrap();
	assert_eq!(dom.inner_html(container), r#"<q cite="&quot;a&quot; &amp; b">&lt;i&gt;</q>"#);
}

#[test]
#[should_panic(expected = "data hole(s), but 0 value(s) were given.")]
fn missing_values() {
	let (mut dom, container) = setup();
	let greeting = compile(TemplateNode::element("p").child(TemplateNode::text_hole(0)));
	let _ = Node::block(&greeting, vec![], vec![]).mount(&mut dom, &container, None);
}

#[test]
#[should_panic(expected = "Can't apply a handler value")]
fn handler_on_text_hole() {
	let (mut dom, container) = setup();
	let greeting = compile(TemplateNode::element("p").child(TemplateNode::text_hole(0)));
	let _ = Node::block(&greeting, vec![Value::<MemoryDom>::handler(|_: &MemoryEvent| ())], vec![]).mount(&mut dom, &container, None);
}

#[test]
fn template_errors() {
	fn error(root: TemplateNode) -> TemplateError {
		Template::<MemoryDom>::compile(root).unwrap_err()
	}

	assert_eq!(error(TemplateNode::child_hole(0)), TemplateError::ChildHoleAtRoot);
	assert_eq!(
		error(TemplateNode::element("p").children(vec![TemplateNode::text_hole(0), TemplateNode::text_hole(0)])),
		TemplateError::DuplicateDataHole(0)
	);
	assert_eq!(
		error(TemplateNode::element("p").attribute_hole("id", 1)),
		TemplateError::MissingDataHole { missing: 0, count: 2 }
	);
	assert_eq!(
		error(TemplateNode::element("p").children(vec![TemplateNode::child_hole(0), TemplateNode::child_hole(0)])),
		TemplateError::DuplicateChildHole(0)
	);
	assert_eq!(
		error(TemplateNode::element("p").children(vec![TemplateNode::text("a"), TemplateNode::child_hole(1)])),
		TemplateError::MissingChildHole { missing: 0, count: 2 }
	);
	assert_eq!(
		TemplateError::MissingDataHole { missing: 0, count: 2 }.to_string(),
		"data hole 0 is missing (the template uses 2 data hole(s))"
	);
}

#[test]
fn hole_counts() {
	let template = Template::<MemoryDom>::compile(
		TemplateNode::element("div")
			.attribute_hole("id", 1)
			.handler_hole("click", 0)
			.children(vec![TemplateNode::text_hole(2), TemplateNode::child_hole(0)]),
	)
	.unwrap();
	assert_eq!((template.data_len(), template.children_len()), (3, 1));
}

#[test]
fn whitespace_normalization() {
	let (mut dom, container) = setup();
	let markup = || {
		TemplateNode::element("div").children(vec![
			TemplateNode::text("\n\t"),
			TemplateNode::element("span"),
			TemplateNode::text("  "),
			TemplateNode::element("pre").child(TemplateNode::text("  ")),
		])
	};

	let normalized = compile(markup());
	let _first = Node::block(&normalized, vec![], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<div><span></span><pre>  </pre></div>");

	let (mut dom, container) = setup();
	let verbatim = Rc::new(Template::<MemoryDom>::compile_with(markup(), TemplateOptions { normalize_whitespace: false }).unwrap());
	let _second = Node::block(&verbatim, vec![], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<div>\n\t<span></span>  <pre>  </pre></div>");
}

#[test]
fn attributes_hole() {
	let (mut dom, container) = setup();
	let card = compile(TemplateNode::element("div").attribute("class", "card").attributes_hole(0));

	let mut block = Node::block(&card, vec![Value::attributes(vec![("id", "a"), ("title", "t")])], vec![])
		.mount(&mut dom, &container, None)
		.unwrap();
	assert_eq!(dom.inner_html(container), r#"<div class="card" id="a" title="t"></div>"#);
	let div = dom.children(container)[0];
	dom.take_mutations();

	block.patch(&mut dom, Node::block(&card, vec![Value::attributes(vec![("id", "b"), ("lang", "en")])], vec![]), &container, None)
		.unwrap();
	assert_eq!(
		dom.mutations(),
		[
			Mutation::RemoveAttribute {
				element: div,
				name: "title".to_owned()
			},
			Mutation::SetAttribute {
				element: div,
				name: "id".to_owned()
			},
			Mutation::SetAttribute {
				element: div,
				name: "lang".to_owned()
			},
		]
	);
	assert_eq!(dom.inner_html(container), r#"<div class="card" id="b" lang="en"></div>"#);

	// `class` in the map is merged token-wise with the static one.
	block.patch(&mut dom, Node::block(&card, vec![Value::attributes(vec![("class", "selected"), ("id", "b")])], vec![]), &container, None)
		.unwrap();
	assert_eq!(dom.inner_html(container), r#"<div class="card selected" id="b"></div>"#);

	block.patch(&mut dom, Node::block(&card, vec![Value::Empty], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<div class="card"></div>"#);
}

#[test]
fn class_hole_diffs_tokens() {
	let (mut dom, container) = setup();
	let tag = compile(TemplateNode::element("span").attribute("class", "tag").attribute_hole("class", 0));

	let mut block = Node::block(&tag, vec![Value::from("a b")], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<span class="tag a b"></span>"#);
	let span = dom.children(container)[0];
	dom.take_mutations();

	block.patch(&mut dom, Node::block(&tag, vec![Value::from("b c")], vec![]), &container, None).unwrap();
	assert_eq!(
		dom.mutations(),
		[
			Mutation::RemoveClass {
				element: span,
				token: "a".to_owned()
			},
			Mutation::AddClass {
				element: span,
				token: "c".to_owned()
			},
		]
	);
	assert_eq!(dom.inner_html(container), r#"<span class="tag b c"></span>"#);

	// Same tokens, different spelling.
	dom.take_mutations();
	block.patch(&mut dom, Node::block(&tag, vec![Value::from(" c  b ")], vec![]), &container, None).unwrap();
	assert!(dom.mutations().is_empty());

	block.patch(&mut dom, Node::block(&tag, vec![Value::Empty], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<span class="tag"></span>"#);
}

#[test]
fn form_control_properties() {
	let (mut dom, container) = setup();
	let checkbox = compile(
		TemplateNode::element("input")
			.attribute("type", "checkbox")
			.attribute_hole("value", 0)
			.attribute_hole("checked", 1)
			.attribute_hole("name", 2),
	);

	let mut block = Node::block(&checkbox, vec![Value::from("x"), Value::from(true), Value::from("choice")], vec![])
		.mount(&mut dom, &container, None)
		.unwrap();
	let input = dom.children(container)[0];
	assert_eq!(dom.property(input, "value"), Some(&Property::Text("x".to_owned())));
	assert_eq!(dom.property(input, "checked"), Some(&Property::Bool(true)));
	assert_eq!(dom.inner_html(container), r#"<input type="checkbox" name="choice"></input>"#);
	dom.take_mutations();

	block.patch(&mut dom, Node::block(&checkbox, vec![Value::Empty, Value::from(false), Value::from("choice")], vec![]), &container, None)
		.unwrap();
	assert_eq!(
		dom.mutations(),
		[
			Mutation::SetProperty {
				element: input,
				name: "value".to_owned()
			},
			Mutation::SetProperty {
				element: input,
				name: "checked".to_owned()
			},
		]
	);
	assert_eq!(dom.property(input, "value"), Some(&Property::Text(String::new())));
	assert_eq!(dom.property(input, "checked"), Some(&Property::Bool(false)));
}

#[test]
fn explicit_property_hole() {
	let (mut dom, container) = setup();
	let slider = compile(TemplateNode::element("x-slider").property_hole("level", 0));

	let _block = Node::block(&slider, vec![Value::display(3)], vec![]).mount(&mut dom, &container, None).unwrap();
	let element = dom.children(container)[0];
	assert_eq!(dom.property(element, "level"), Some(&Property::Text("3".to_owned())));
	assert_eq!(dom.inner_html(container), "<x-slider></x-slider>");
}

#[test]
fn boolean_attribute() {
	let (mut dom, container) = setup();
	let details = compile(TemplateNode::element("details").attribute_hole("open", 0));

	let mut block = Node::block(&details, vec![Value::from(true)], vec![]).mount(&mut dom, &container, None).unwrap();
	assert_eq!(dom.inner_html(container), r#"<details open=""></details>"#);

	block.patch(&mut dom, Node::block(&details, vec![Value::from(false)], vec![]), &container, None).unwrap();
	assert_eq!(dom.inner_html(container), "<details></details>");
}

#[test]
#[should_panic(expected = "Can't apply a bool value")]
fn bool_on_text_hole() {
	let (mut dom, container) = setup();
	let greeting = compile(TemplateNode::element("p").child(TemplateNode::text_hole(0)));
	let _ = Node::block(&greeting, vec![Value::from(true)], vec![]).mount(&mut dom, &container, None);
}
