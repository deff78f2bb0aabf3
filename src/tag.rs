//! The [`Tag`] node type and its stable identifier (§3).

use bitflags::bitflags;

/// A stable identifier for a [`Tag`], unique within its owning [`crate::Document`]
/// for the document's lifetime.
///
/// Assigned monotonically at creation and never reused, even after the tag
/// that held it is removed. Unlike a pointer or array index, a `TagId`
/// remains meaningful across mutations -- see the ownership note on
/// [`crate::Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TagId(pub(crate) u32);

impl TagId {
    /// Returns the raw numeric value of this id.
    ///
    /// Exposed for callers that need to persist or transmit an id outside
    /// the crate; it carries no meaning on its own without the originating
    /// document.
    pub fn value(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Variant flags for a [`Tag`] (§3).
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct TagFlags: u8 {
        /// Content (text) tag: `attribs[0].name` is empty, `attribs[0].value`
        /// holds the text, and the tag has no children.
        const CONTENT     = 1 << 0;
        /// Content tag whose value came from a `<![CDATA[ ... ]]>` section.
        const CDATA       = 1 << 1;
        /// Notation declaration tag.
        const NOTATION    = 1 << 2;
        /// Processing instruction tag (`<?target value?>`).
        const INSTRUCTION = 1 << 3;
        /// Comment tag.
        const COMMENT     = 1 << 4;
    }
}

/// A single `(name, value)` pair in a tag's attribute array.
///
/// Index 0 of a tag's `attribs` is distinguished (§3): for an element it
/// holds the element's tag name in `name` with an empty `value`; for a
/// content/CDATA tag it holds an empty `name` with the text in `value`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Attrib {
    /// Attribute name, or empty for index 0 of a content tag.
    pub name: String,
    /// Attribute value, or the tag name's placeholder (empty) at index 0 of
    /// an element.
    pub value: String,
}

impl Attrib {
    pub(crate) fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attrib { name: name.into(), value: value.into() }
    }
}

/// Any XML construct other than the document root container (§3, GLOSSARY).
///
/// A `Tag` owns its children directly: the tree is a plain ownership
/// hierarchy, not an arena of pointers. External code addresses a tag by its
/// stable [`TagId`] via [`crate::Document::get_tag`] rather than holding a
/// long-lived reference, since any successful mutation invalidates
/// previously-borrowed references (though never the ids themselves).
#[derive(Clone, PartialEq, Debug)]
pub struct Tag {
    pub(crate) id: TagId,
    pub(crate) parent_id: Option<TagId>,
    pub(crate) line_no: u32,
    pub(crate) branch: u32,
    pub(crate) flags: TagFlags,
    pub(crate) namespace_id: Option<u32>,
    pub(crate) attribs: Vec<Attrib>,
    pub(crate) children: Vec<Tag>,
}

impl Tag {
    pub(crate) fn new_element(id: TagId, parent_id: Option<TagId>, name: impl Into<String>, line_no: u32, branch: u32) -> Self {
        Tag {
            id,
            parent_id,
            line_no,
            branch,
            flags: TagFlags::empty(),
            namespace_id: None,
            attribs: vec![Attrib::new(name, "")],
            children: Vec::new(),
        }
    }

    pub(crate) fn new_content(id: TagId, parent_id: Option<TagId>, text: impl Into<String>, line_no: u32, branch: u32, cdata: bool) -> Self {
        let mut flags = TagFlags::CONTENT;
        if cdata {
            flags |= TagFlags::CDATA;
        }
        Tag {
            id,
            parent_id,
            line_no,
            branch,
            flags,
            namespace_id: None,
            attribs: vec![Attrib::new("", text)],
            children: Vec::new(),
        }
    }

    /// This tag's stable id.
    pub fn id(&self) -> TagId {
        self.id
    }

    /// The id of the containing tag, or `None` for a root-level tag.
    pub fn parent_id(&self) -> Option<TagId> {
        self.parent_id
    }

    /// 1-based source line where the tag opened.
    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    /// Nesting depth; root-level tags are depth 0.
    pub fn branch(&self) -> u32 {
        self.branch
    }

    /// This tag's variant flags.
    pub fn flags(&self) -> TagFlags {
        self.flags
    }

    /// This tag's interned namespace id, if it was declared in a namespace.
    pub fn namespace_id(&self) -> Option<u32> {
        self.namespace_id
    }

    /// The tag's name (attribute index 0's `name`).
    ///
    /// Empty for content/CDATA tags.
    pub fn name(&self) -> &str {
        &self.attribs[0].name
    }

    /// The ordered `(name, value)` attribute array, including index 0.
    pub fn attribs(&self) -> &[Attrib] {
        &self.attribs
    }

    /// The tag's children, in document order.
    pub fn children(&self) -> &[Tag] {
        &self.children
    }

    /// Returns this tag's content text.
    ///
    /// Valid for content/CDATA tags; for elements, returns `None`
    /// (see [`Tag::text_content`] to concatenate immediate content children).
    pub fn value(&self) -> Option<&str> {
        if self.is_content() {
            Some(&self.attribs[0].value)
        } else {
            None
        }
    }

    /// Returns this tag's free-form text value regardless of variant:
    /// content/CDATA text, a comment's body, or a processing instruction's
    /// content (if any). Returns `None` for plain elements.
    pub fn text_value(&self) -> Option<&str> {
        if self.is_content() || self.is_comment() {
            Some(&self.attribs[0].value)
        } else if self.is_instruction() {
            self.attribs.get(1).map(|a| a.value.as_str())
        } else {
            None
        }
    }

    /// True if this is a content or CDATA tag.
    pub fn is_content(&self) -> bool {
        self.flags.contains(TagFlags::CONTENT)
    }

    /// True if this is a CDATA content tag.
    pub fn is_cdata(&self) -> bool {
        self.flags.contains(TagFlags::CDATA)
    }

    /// True if this is a comment tag.
    pub fn is_comment(&self) -> bool {
        self.flags.contains(TagFlags::COMMENT)
    }

    /// True if this is a processing instruction tag.
    pub fn is_instruction(&self) -> bool {
        self.flags.contains(TagFlags::INSTRUCTION)
    }

    /// True if this is a notation tag.
    pub fn is_notation(&self) -> bool {
        self.flags.contains(TagFlags::NOTATION)
    }

    /// True if this is a plain element (not content, comment, instruction,
    /// or notation).
    pub fn is_element(&self) -> bool {
        self.flags.is_empty()
    }

    /// Looks up an attribute's value by name (case-sensitive), skipping
    /// index 0.
    pub fn attrib(&self, name: &str) -> Option<&str> {
        self.attribs.iter().skip(1).find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// Concatenates the value of every immediate content/CDATA child, in
    /// document order. Used by the sort engine's content-extraction mode
    /// and the XPath content-equality predicate.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if child.is_content() {
                out.push_str(&child.attribs[0].value);
            }
        }
        out
    }

    pub(crate) fn attribs_mut(&mut self) -> &mut Vec<Attrib> {
        &mut self.attribs
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.children
    }

    /// Checks the tag-level invariant from §3: every tag has at least one
    /// attribute slot, and content tags never have children.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(!self.attribs.is_empty());
        if self.is_content() {
            assert!(self.attribs[0].name.is_empty());
            assert!(self.children.is_empty());
        }
        for child in &self.children {
            assert_eq!(child.parent_id, Some(self.id));
            assert_eq!(child.branch, self.branch + 1);
            child.check_invariants();
        }
    }
}
