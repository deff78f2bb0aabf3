//! Behavior bitsets and small enums that configure parsing, serialization and
//! insertion (§6.1, §6.2 of the design notes).

use bitflags::bitflags;

bitflags! {
    /// Parse / serialize behavior flags.
    ///
    /// Mirrors the `XMF_*` bitmask of the original source (see
    /// `examples/original_source/core/modules/xml/xml.c`), translated into a
    /// `bitflags`-based set the way the teacher crate gates its own
    /// cargo-feature-driven behavior.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct ParseFlags: u32 {
        /// Reject unbalanced tags with a hard failure; default is to
        /// truncate silently and log a warning.
        const WELL_FORMED       = 1 << 0;
        /// Emit comment tags; default is to strip them.
        const INCLUDE_COMMENTS  = 1 << 1;
        /// Discard all inter-tag text.
        const STRIP_CONTENT     = 1 << 2;
        /// Fold tag and attribute names to lower case at parse time.
        const LOWER_CASE        = 1 << 3;
        /// Fold tag and attribute names to upper case at parse time.
        const UPPER_CASE        = 1 << 4;
        /// Serializer emits line breaks between sibling/child elements.
        const READABLE          = 1 << 5;
        /// Mutations that remove tags fail with `ReadOnly`.
        const LOCK_REMOVE       = 1 << 6;
        /// Omit processing instructions and DOCTYPE from the tree.
        const STRIP_HEADERS     = 1 << 7;
        /// Suppress source parsing at construction time; start with an
        /// empty tree.
        const NEW               = 1 << 8;
        /// Do not entity-decode attribute/content values at parse time.
        const NO_ESCAPE         = 1 << 9;
        /// Preserve whitespace-only content between tags.
        const ALL_CONTENT       = 1 << 10;
        /// Relaxed parsing of loose, HTML-like constructs.
        ///
        /// Documented extension seam (open question in the design notes);
        /// accepted but not specially interpreted by this implementation.
        const PARSE_HTML        = 1 << 11;
        /// Serializer emits CDATA contents as plain text.
        const STRIP_CDATA       = 1 << 12;
        /// Serializer emits the starting tag plus all following siblings.
        const INCLUDE_SIBLINGS  = 1 << 13;
        /// Parse DOCTYPE entity/notation declarations.
        const PARSE_ENTITY      = 1 << 14;
    }
}

/// Insertion position, relative to a target tag (§6.2).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Where {
    /// Insert immediately before the target.
    Prev,
    /// Insert immediately after the target.
    Next,
    /// Insert as the first child of the target.
    Child,
    /// Insert as the last child of the target.
    ChildEnd,
    /// Append to the sequence containing the target.
    End,
}

/// Attribute selector for [`crate::mutate::set_attrib`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttribSelector {
    /// Replace (or remove, if `value` is `None`) the attribute at this
    /// zero-based index.
    Index(usize),
    /// Always append a new (name, value) pair.
    New,
    /// Update the attribute by name (case-insensitive), appending if absent.
    Update,
    /// Update the attribute by name (case-insensitive); fail with
    /// [`crate::Error::Search`] if absent.
    UpdateOnly,
}

/// Sort direction and extraction behavior (§4.7.5).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SortFlags {
    /// Sort in descending order; default is ascending.
    pub descending: bool,
    /// Prefer a nested tag's `sort` attribute over the normally-extracted
    /// sort key, when present.
    pub check_sort_attrib: bool,
}
