//! Sentinel tokens used to find dynamic positions again after the host's HTML parser has run.
//!
//! The bare [`Marker::token`] is written wherever a value lands inside an attribute value or an HTML comment.
//! Everywhere else, the token is wrapped into a comment ([`Marker::node_marker`]) so it becomes its own node.

use core::hash::{BuildHasher, Hasher as _};
use regex::Regex;
use std::{collections::hash_map::RandomState, sync::OnceLock};

/// Appended to the name of every attribute that carries at least one binding.
///
/// This keeps the host parser from treating `style`, `src` or SVG presentation attributes specially
/// before the engine has had a chance to strip them.
pub const BOUND_ATTRIBUTE_SUFFIX: &str = "$bound$";

#[derive(Debug)]
pub struct Marker {
	token: String,
	node_marker: String,
	pattern: Regex,
}

/// The marker for this process.
///
/// It is generated once and stays the same for the remainder of the program.
pub fn marker() -> &'static Marker {
	static MARKER: OnceLock<Marker> = OnceLock::new();
	MARKER.get_or_init(|| {
		let hasher = RandomState::new().build_hasher();
		Marker::new(&format!("{{{{tagged-{}}}}}", hasher.finish()))
	})
}

impl Marker {
	fn new(token: &str) -> Self {
		let node_marker = format!("<!--{}-->", token);
		let pattern = Regex::new(&format!("{}|{}", regex::escape(token), regex::escape(&node_marker))).expect("escaped marker pattern is valid");
		Self {
			token: token.to_owned(),
			node_marker,
			pattern,
		}
	}

	#[must_use]
	pub fn token(&self) -> &str {
		&self.token
	}

	/// The token wrapped into an HTML comment.
	#[must_use]
	pub fn node_marker(&self) -> &str {
		&self.node_marker
	}

	#[must_use]
	pub fn is_in(&self, text: &str) -> bool {
		text.contains(&self.token)
	}

	/// How often the bare token occurs in `text`.
	#[must_use]
	pub fn count_in(&self, text: &str) -> usize {
		text.matches(&self.token).count()
	}

	/// Splits `text` at every bare or comment-wrapped marker.
	///
	/// The result always has one more element than there are markers.
	#[must_use]
	pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
		self.pattern.split(text).collect()
	}
}

/// The trailing attribute assignment of a literal segment, as found by [`last_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeMatch<'a> {
	/// Byte offset of the whitespace that precedes the name.
	pub start: usize,
	pub whitespace: &'a str,
	pub name: &'a str,
	/// `=` plus surrounding whitespace and any opening quote or partial value.
	pub tail: &'a str,
}

/// Finds an attribute assignment that is still open at the very end of `segment`.
///
/// This is a heuristic over literal text, not a parse: a `<` or `-->` inside a quoted attribute value can produce false positives.
#[must_use]
pub fn last_attribute(segment: &str) -> Option<AttributeMatch<'_>> {
	static PATTERN: OnceLock<Regex> = OnceLock::new();
	let pattern = PATTERN.get_or_init(|| {
		Regex::new(r#"([ \x09\x0a\x0c\x0d])([^\x00-\x1F\x7F-\x9F "'>=/]+)([ \x09\x0a\x0c\x0d]*=[ \x09\x0a\x0c\x0d]*(?:[^ \x09\x0a\x0c\x0d"'`<>=]*|"[^"]*|'[^']*))$"#)
			.expect("attribute pattern is valid")
	});

	let captures = pattern.captures(segment)?;
	let whitespace = captures.get(1)?;
	Some(AttributeMatch {
		start: whitespace.start(),
		whitespace: whitespace.as_str(),
		name: captures.get(2)?.as_str(),
		tail: captures.get(3)?.as_str(),
	})
}
