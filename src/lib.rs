/*!
A structured-data processing engine for XML 1.0: parsing, an in-memory,
mutable, ID-stable tag tree, XPath-style queries, and round-trip
serialization.

Unlike a read-only DOM, every [`Tag`] in a [`Document`] is addressable by a
stable [`TagId`] that survives mutation -- insertion, removal, movement, and
attribute edits never renumber or invalidate a tag's id, only pointers
derived from a prior borrow (see the ownership note on [`Document`]).

The crate is organized the way the source engine is, leaves-first:

- [`tag`] -- the `Tag` node and its stable id.
- [`store`] -- id-based lookup and the modification counter.
- [`parse`] -- the lexer/counter and the two-pass parser.
- [`escape`] -- the entity escape/unescape codec.
- [`serialize`] -- subtree-to-string serialization.
- [`xpath`] -- the location-path resolver.
- [`mutate`] -- insertion, removal, movement, attribute editing.
- [`sort`] -- multi-key sibling sort.
- [`namespace`] -- namespace interning and `xml:base` resolution.
- [`flags`] -- behavior bitsets and small enums.
- [`error`] -- the `Error` enum shared by every fallible operation.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod escape;
pub mod flags;
pub mod mutate;
pub mod namespace;
pub mod parse;
pub mod serialize;
pub mod sort;
pub mod store;
pub mod tag;
pub mod xpath;

use std::collections::HashMap;

pub use error::Error;
pub use flags::{AttribSelector, ParseFlags, SortFlags, Where};
pub use parse::ParseOptions;
pub use sort::SortOutcome;
pub use tag::{Attrib, Tag, TagId};
pub use xpath::{CompiledPath, Flow};

use namespace::NamespaceTable;
use store::Index;

/// The `http://www.w3.org/XML/1998/namespace` URI.
pub const NS_XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// The `http://www.w3.org/2000/xmlns/` URI.
pub const NS_XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// Root container, exclusive owner of all tags and auxiliary tables (§3).
///
/// # Ownership
///
/// `Document` exclusively owns its tag tree: tags are embedded directly in
/// their parents rather than scattered across an external arena. External
/// code should hold a tag by its stable [`TagId`] rather than a `&Tag`
/// across any call that might mutate the document -- every successful
/// mutation invalidates previously-borrowed `&Tag` references (Rust's
/// borrow checker enforces this at compile time for any reference held
/// across a `&mut self` call), though ids themselves remain valid for as
/// long as the tag they name exists.
pub struct Document {
    pub(crate) tags: Vec<Tag>,
    pub(crate) entities: HashMap<String, String>,
    pub(crate) parameter_entities: HashMap<String, String>,
    pub(crate) notations: HashMap<String, String>,
    pub(crate) doctype: Option<String>,
    pub(crate) public_id: Option<String>,
    pub(crate) system_id: Option<String>,
    pub(crate) namespace_table: NamespaceTable,
    pub(crate) base_uri_map: HashMap<TagId, String>,
    pub(crate) variables: HashMap<String, String>,
    pub(crate) modified_counter: u64,
    pub(crate) flags: ParseFlags,
    pub(crate) read_only: bool,
    pub(crate) line_no: u32,
    pub(crate) parse_error: Option<Error>,
    pub(crate) error_msg: Option<String>,
    pub(crate) cursor: Option<TagId>,
    pub(crate) attrib: Option<String>,
    pub(crate) sentinel: Option<String>,
    pub(crate) next_id: u32,
    pub(crate) index: Index,
}

impl Document {
    /// Builds an empty document carrying `flags`, without parsing anything.
    ///
    /// Equivalent to `Document::parse_with_options("<r/>", ParseFlags::NEW
    /// | flags)` followed by clearing the root, but cheaper and with no
    /// placeholder tag.
    pub fn new_empty(flags: ParseFlags) -> Document {
        Document {
            tags: Vec::new(),
            entities: HashMap::new(),
            parameter_entities: HashMap::new(),
            notations: HashMap::new(),
            doctype: None,
            public_id: None,
            system_id: None,
            namespace_table: NamespaceTable::default(),
            base_uri_map: HashMap::new(),
            variables: HashMap::new(),
            modified_counter: 0,
            flags,
            read_only: false,
            line_no: 0,
            parse_error: None,
            error_msg: None,
            cursor: None,
            attrib: None,
            sentinel: None,
            next_id: 0,
            index: Index::default(),
        }
    }

    /// Marks this document read-only: every subsequent mutation operation
    /// will fail with [`Error::ReadOnly`].
    ///
    /// Monotone by design (§3 invariant): there is no corresponding
    /// `set_writable`, matching the source's "once locked, always locked"
    /// contract.
    pub fn make_read_only(&mut self) {
        self.read_only = true;
    }

    /// True if this document is locked against mutation.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn reset(&mut self, flags: ParseFlags) {
        *self = Document::new_empty(flags);
    }

    /// Top-level tags, in document order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The parsed `DOCTYPE` name, if any.
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// The parsed `PUBLIC` identifier, if any.
    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    /// The parsed `SYSTEM` identifier, if any.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    /// A sentinel string recognized in the document's lead comment, when a
    /// [`ParseOptions::sentinel_prefix`] was configured and matched
    /// (§4.1 edge cases).
    pub fn sentinel(&self) -> Option<&str> {
        self.sentinel.as_deref()
    }

    /// The document's parse/behavior flags, as captured at construction.
    pub fn flags(&self) -> ParseFlags {
        self.flags
    }

    /// 1-based line number of the most recent parse failure, or 0.
    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    /// The most recent parse error, retained for diagnostics (§7).
    pub fn parse_error(&self) -> Option<&Error> {
        self.parse_error.as_ref()
    }

    /// A human-readable diagnostic message from the most recent parse or
    /// XPath failure (§7).
    pub fn error_msg(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    /// The tag of the most recent successful single-match XPath query
    /// (§4.6 "Cursor stability").
    pub fn cursor(&self) -> Option<TagId> {
        self.cursor
    }

    /// The matched attribute name of the most recent successful XPath
    /// query that ended in `/@attr`, or `None`.
    pub fn attrib(&self) -> Option<&str> {
        self.attrib.as_deref()
    }

    /// Looks up an `ENTITY` declaration by name (§4.3).
    pub fn get_entity(&self, name: &str) -> Result<&str, Error> {
        self.entities.get(name).map(|s| s.as_str()).ok_or(Error::Search)
    }

    /// Looks up a `NOTATION` declaration by name (§4.3).
    ///
    /// The returned descriptor is the system id, or `"public-id system-id"`
    /// when both were present.
    pub fn get_notation(&self, name: &str) -> Result<&str, Error> {
        self.notations.get(name).map(|s| s.as_str()).ok_or(Error::Search)
    }

    /// Sets an XPath variable (`$name`) binding.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Reads an XPath variable binding.
    pub fn get_variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(|s| s.as_str())
    }

    /// The namespace interning table.
    pub fn namespace_table(&self) -> &NamespaceTable {
        &self.namespace_table
    }
}
