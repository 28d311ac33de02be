use thiserror::Error;

/// Everything that can go wrong while compiling, stamping or committing a template.
///
/// Unsupported value shapes are never an error: node parts stringify them instead.
#[derive(Debug, Error)]
pub enum Error {
	/// A `?name=…` binding mixed literal text into the attribute value or spanned more than one position.
	#[error("boolean attribute `{name}` can only contain a single expression")]
	MalformedBooleanBinding { name: String },

	/// An `@name=…` binding mixed literal text into the attribute value or spanned more than one position.
	#[error("event binding `{name}` can only contain a single expression")]
	MalformedEventBinding { name: String },

	/// The compiled template carried a suffixed attribute but the preceding literal segment had no attribute name.
	#[error("no bound attribute name found at the end of literal segment {segment:?}")]
	UnboundAttribute { segment: String },

	/// The tree walk ran out of nodes with descriptors still pending.
	///
	/// This means a blueprint's addresses no longer match its DOM, which is always an engine bug or a misbehaving structural edit.
	#[error("tree walk exhausted at node {index} with {pending} part descriptor(s) unresolved")]
	WalkExhausted { index: usize, pending: usize },

	/// A node part's address pointed at a node without a preceding sibling to use as start boundary.
	#[error("node part at address {index} has no preceding boundary node")]
	MissingBoundary { index: usize },

	/// Scoped rendering was requested without naming the scope.
	#[error("the `scope_name` render option is required when a scoping shim is installed")]
	MissingScopeName,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
