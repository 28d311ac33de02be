//! A small HTML fragment parser and serializer, sufficient for template markup.
//!
//! Supported: comments (including `<!-->`), bogus comments (`<?…>`, `<!…>`, with doctypes dropped), void elements,
//! raw text in `script`, `style`, `textarea` and `title`, `<template>` content, the SVG namespace (including self-closing tags),
//! quoted and unquoted attribute values, and the common character references.
//!
//! Known limitations:
//! - No implied end tags and no foster parenting. Misnested markup is closed by the next matching end tag, or never.
//! - Element and attribute names are ASCII-lowercased in both namespaces, so e.g. `viewBox` becomes `viewbox`.

use super::{MemoryNode, Namespace, NodeData};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn is_void_element(name: &str) -> bool {
	matches!(
		name,
		"area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param" | "source" | "track" | "wbr"
	)
}

/// Elements whose content is text up to the matching end tag. The flag is whether character references are decoded.
fn raw_text_element(name: &str) -> Option<bool> {
	match name {
		"script" | "style" => Some(false),
		"textarea" | "title" => Some(true),
		_ => None,
	}
}

fn is_whitespace(byte: u8) -> bool {
	matches!(byte, b' ' | b'\t' | b'\n' | b'\x0c' | b'\r')
}

struct OpenElement {
	/// Where children go: the element itself or, for templates, its content.
	insertion: MemoryNode,
	name: String,
	namespace: Namespace,
}

struct Parser<'a> {
	input: &'a str,
	pos: usize,
	root: MemoryNode,
	open: Vec<OpenElement>,
}

/// Parses `html` as children of `root`.
pub(super) fn parse_into(root: &MemoryNode, html: &str) {
	Parser {
		input: html,
		pos: 0,
		root: root.clone(),
		open: Vec::new(),
	}
	.run();
}

impl<'a> Parser<'a> {
	fn rest(&self) -> &'a str {
		&self.input[self.pos..]
	}

	fn current(&self) -> &MemoryNode {
		self.open.last().map_or(&self.root, |open| &open.insertion)
	}

	fn namespace(&self) -> Namespace {
		self.open.last().map_or(Namespace::Html, |open| open.namespace)
	}

	fn run(&mut self) {
		while self.pos < self.input.len() {
			let rest = self.rest();
			if !rest.starts_with('<') {
				let end = memchr(b'<', rest.as_bytes()).unwrap_or(rest.len());
				self.append_text(&decode_character_references(&rest[..end]));
				self.pos += end;
				continue;
			}

			let next = rest.as_bytes().get(1).copied();
			if rest.starts_with(COMMENT_START) {
				self.comment();
			} else if matches!(next, Some(b'!' | b'?')) {
				self.bogus_comment();
			} else if next == Some(b'/') && rest.as_bytes().get(2).map_or(false, u8::is_ascii_alphabetic) {
				self.end_tag();
			} else if next.map_or(false, |next| next.is_ascii_alphabetic()) {
				self.start_tag();
			} else {
				self.append_text("<");
				self.pos += 1;
			}
		}
	}

	fn append(&self, node: &MemoryNode) {
		self.current().insert_raw(node, None);
	}

	/// Appends text, merging it into a preceding text node.
	fn append_text(&self, text: &str) {
		if text.is_empty() {
			return;
		}
		let parent = self.current();
		let last = parent.0.children.borrow().last().cloned();
		if let Some(last) = last {
			if let NodeData::Text(data) = &mut *last.0.data.borrow_mut() {
				data.push_str(text);
				return;
			}
		}
		self.append(&MemoryNode::new(NodeData::Text(text.to_owned())));
	}

	fn comment(&mut self) {
		let body = &self.rest()[COMMENT_START.len()..];
		// Abruptly closed empty comments.
		for abrupt in [">", "->"] {
			if body.starts_with(abrupt) {
				self.append(&MemoryNode::new(NodeData::Comment(String::new())));
				self.pos += COMMENT_START.len() + abrupt.len();
				return;
			}
		}
		let (data, consumed) = match body.find(COMMENT_END) {
			Some(end) => (&body[..end], end + COMMENT_END.len()),
			None => (body, body.len()),
		};
		self.append(&MemoryNode::new(NodeData::Comment(data.to_owned())));
		self.pos += COMMENT_START.len() + consumed;
	}

	fn bogus_comment(&mut self) {
		let body = &self.rest()[1..];
		let (data, consumed) = match memchr(b'>', body.as_bytes()) {
			Some(end) => (&body[..end], end + 1),
			None => (body, body.len()),
		};
		let is_doctype = data.len() >= 8 && data[..8].eq_ignore_ascii_case("!doctype");
		if !is_doctype {
			let data = data.strip_prefix('!').unwrap_or(data);
			self.append(&MemoryNode::new(NodeData::Comment(data.to_owned())));
		}
		self.pos += 1 + consumed;
	}

	fn tag_name(&mut self) -> String {
		let rest = self.rest();
		let end = rest.bytes().position(|byte| is_whitespace(byte) || byte == b'/' || byte == b'>').unwrap_or(rest.len());
		self.pos += end;
		rest[..end].to_ascii_lowercase()
	}

	fn end_tag(&mut self) {
		self.pos += 2;
		let name = self.tag_name();
		let rest = self.rest();
		self.pos += memchr(b'>', rest.as_bytes()).map_or(rest.len(), |end| end + 1);

		if let Some(index) = self.open.iter().rposition(|open| open.name == name) {
			self.open.truncate(index);
		}
	}

	fn start_tag(&mut self) {
		self.pos += 1;
		let name = self.tag_name();
		let namespace = if name == "svg" { Namespace::Svg } else { self.namespace() };
		let element = MemoryNode::element(&name, namespace);
		let self_closing = self.attributes(&element);
		self.append(&element);

		if (self_closing && namespace == Namespace::Svg) || (namespace == Namespace::Html && is_void_element(&name)) {
			return;
		}

		if let (Namespace::Html, Some(decode)) = (namespace, raw_text_element(&name)) {
			let rest = self.rest();
			let (text, consumed) = match find_close_tag(rest, &name) {
				Some((start, end)) => (&rest[..start], end),
				None => (rest, rest.len()),
			};
			if !text.is_empty() {
				let text = if decode { decode_character_references(text) } else { text.to_owned() };
				element.insert_raw(&MemoryNode::new(NodeData::Text(text)), None);
			}
			self.pos += consumed;
			return;
		}

		let insertion = element.template_content().unwrap_or(element);
		self.open.push(OpenElement { insertion, name, namespace });
	}

	/// Parses attributes up to and including the closing `>`. Returns whether the tag was self-closing.
	fn attributes(&mut self, element: &MemoryNode) -> bool {
		loop {
			let bytes = self.rest().as_bytes();
			let skip = bytes.iter().position(|&byte| !is_whitespace(byte)).unwrap_or(bytes.len());
			self.pos += skip;

			let rest = self.rest();
			match rest.as_bytes().first() {
				None => return false,
				Some(b'>') => {
					self.pos += 1;
					return false;
				}
				Some(b'/') if rest.as_bytes().get(1) == Some(&b'>') => {
					self.pos += 2;
					return true;
				}
				Some(b'/') => {
					self.pos += 1;
					continue;
				}
				Some(_) => (),
			}

			// A leading `=` belongs to the name.
			let end = rest
				.bytes()
				.enumerate()
				.position(|(i, byte)| is_whitespace(byte) || byte == b'/' || byte == b'>' || (byte == b'=' && i > 0))
				.unwrap_or(rest.len());
			let name = rest[..end].to_ascii_lowercase();
			self.pos += end;

			let value = self.attribute_value();
			if let NodeData::Element(data) = &mut *element.0.data.borrow_mut() {
				if !data.attributes.iter().any(|(existing, _)| *existing == name) {
					data.attributes.push((name, value));
				}
			}
		}
	}

	fn attribute_value(&mut self) -> String {
		let rest = self.rest();
		let after_whitespace = rest.bytes().position(|byte| !is_whitespace(byte)).unwrap_or(rest.len());
		if rest.as_bytes().get(after_whitespace) != Some(&b'=') {
			return String::new();
		}
		self.pos += after_whitespace + 1;

		let rest = self.rest();
		let skip = rest.bytes().position(|byte| !is_whitespace(byte)).unwrap_or(rest.len());
		self.pos += skip;
		let rest = self.rest();

		match rest.as_bytes().first() {
			Some(&quote @ (b'"' | b'\'')) => {
				let body = &rest[1..];
				let end = memchr(quote, body.as_bytes()).unwrap_or(body.len());
				self.pos += 1 + (end + 1).min(body.len());
				decode_character_references(&body[..end])
			}
			_ => {
				let end = rest.bytes().position(|byte| is_whitespace(byte) || byte == b'>').unwrap_or(rest.len());
				self.pos += end;
				decode_character_references(&rest[..end])
			}
		}
	}
}

/// Finds `</name` (ASCII case-insensitively) followed by whitespace, `/` or `>`. Returns the start of the tag and the end of its `>`.
fn find_close_tag(haystack: &str, name: &str) -> Option<(usize, usize)> {
	let bytes = haystack.as_bytes();
	let mut i = 0;
	while i < bytes.len() {
		i += memchr(b'<', &bytes[i..])?;
		let name_start = i + 2;
		let name_end = name_start + name.len();
		if bytes.get(i + 1) == Some(&b'/')
			&& bytes.get(name_start..name_end).map_or(false, |candidate| candidate.eq_ignore_ascii_case(name.as_bytes()))
			&& bytes.get(name_end).map_or(true, |&byte| is_whitespace(byte) || byte == b'/' || byte == b'>')
		{
			let close = memchr(b'>', &bytes[name_end..]).map_or(bytes.len(), |end| name_end + end + 1);
			return Some((i, close));
		}
		i += 1;
	}
	None
}

/// Decodes the common named and all numeric character references. Anything unrecognized is kept verbatim.
pub(super) fn decode_character_references(text: &str) -> String {
	if memchr(b'&', text.as_bytes()).is_none() {
		return text.to_owned();
	}

	let mut decoded = String::with_capacity(text.len());
	let mut rest = text;
	while let Some(ampersand) = rest.find('&') {
		decoded.push_str(&rest[..ampersand]);
		rest = &rest[ampersand..];

		let reference = rest.find(';').filter(|&end| end <= 32).and_then(|end| decode_reference(&rest[1..end]).map(|c| (c, end)));
		match reference {
			Some((c, end)) => {
				decoded.push(c);
				rest = &rest[end + 1..];
			}
			None => {
				decoded.push('&');
				rest = &rest[1..];
			}
		}
	}
	decoded.push_str(rest);
	decoded
}

fn decode_reference(reference: &str) -> Option<char> {
	if let Some(numeric) = reference.strip_prefix('#') {
		let code = match numeric.strip_prefix(['x', 'X']) {
			Some(hex) => u32::from_str_radix(hex, 16).ok()?,
			None => numeric.parse().ok()?,
		};
		return char::from_u32(code).or(Some('\u{FFFD}'));
	}
	Some(match reference {
		"amp" => '&',
		"lt" => '<',
		"gt" => '>',
		"quot" => '"',
		"apos" => '\'',
		"nbsp" => '\u{A0}',
		_ => return None,
	})
}

fn escape(text: &str, attribute: bool, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'\u{A0}' => out.push_str("&nbsp;"),
			'"' if attribute => out.push_str("&quot;"),
			'<' if !attribute => out.push_str("&lt;"),
			'>' if !attribute => out.push_str("&gt;"),
			c => out.push(c),
		}
	}
}

/// Serializes the children of `node` (or of its template content) into `out`.
pub(super) fn serialize_children(node: &MemoryNode, out: &mut String, comments: bool) {
	let node = node.template_content().unwrap_or_else(|| node.clone());
	let raw = node.local_name().map_or(false, |name| matches!(name.as_str(), "script" | "style"));
	for child in node.children() {
		match &*child.0.data.borrow() {
			NodeData::Text(data) if raw => out.push_str(data),
			NodeData::Text(data) => escape(data, false, out),
			NodeData::Comment(data) => {
				if comments {
					out.push_str(COMMENT_START);
					out.push_str(data);
					out.push_str(COMMENT_END);
				}
			}
			NodeData::Fragment => serialize_children(&child, out, comments),
			NodeData::Element(element) => {
				out.push('<');
				out.push_str(&element.name);
				for (name, value) in &element.attributes {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					escape(value, true, out);
					out.push('"');
				}
				out.push('>');
				if element.namespace == Namespace::Html && is_void_element(&element.name) {
					continue;
				}
			}
		}
		// Element children are serialized outside the borrow above.
		if let Some(name) = child.local_name() {
			serialize_children(&child, out, comments);
			out.push_str("</");
			out.push_str(&name);
			out.push('>');
		}
	}
}
