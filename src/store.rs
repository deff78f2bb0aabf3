//! The tree store (§4.2): id-based lookup, the modification counter, and the
//! lazily-rebuilt flat index that backs `get_tag`.
//!
//! Tags are owned directly by their parent (`Tag::children: Vec<Tag>`), per
//! the design notes' "pointer graphs -> IDs + arenas" guidance translated
//! into an ownership tree. That leaves one open question the source's
//! pointer-array design doesn't have to answer: how do we get O(1)-ish
//! lookup by id without a parent pointer to walk? We resolve it (see
//! DESIGN.md) by maintaining a `TagId -> path` index -- a path being the
//! sequence of child indices from `Document::tags` down to the tag -- and
//! invalidating/rebuilding it on every successful mutation. Between
//! mutations the index is valid; `get_tag` rebuilds it lazily on first use
//! after invalidation, giving the "O(log n) via an index, or O(n) fallback
//! traversal" contract from §4.2 in either order.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::tag::{Tag, TagId};
use crate::Document;

/// A path of child indices from the top-level `tags` sequence down to a
/// specific tag.
pub(crate) type TagPath = Vec<usize>;

#[derive(Default)]
pub(crate) struct Index(RefCell<IndexInner>);

#[derive(Default)]
struct IndexInner {
    paths: HashMap<TagId, TagPath>,
    valid: bool,
}

impl Index {
    fn rebuild(&self, tags: &[Tag]) {
        let mut inner = self.0.borrow_mut();
        inner.paths.clear();
        fn walk(tags: &[Tag], prefix: &mut TagPath, out: &mut HashMap<TagId, TagPath>) {
            for (i, t) in tags.iter().enumerate() {
                prefix.push(i);
                out.insert(t.id, prefix.clone());
                walk(&t.children, prefix, out);
                prefix.pop();
            }
        }
        let mut prefix = Vec::new();
        walk(tags, &mut prefix, &mut inner.paths);
        inner.valid = true;
    }

    fn invalidate(&self) {
        self.0.borrow_mut().valid = false;
    }

    fn path_for(&self, id: TagId) -> Option<TagPath> {
        self.0.borrow().paths.get(&id).cloned()
    }

    fn is_valid(&self) -> bool {
        self.0.borrow().valid
    }
}

impl Document {
    pub(crate) fn invalidate_index(&mut self) {
        self.index.invalidate();
    }

    fn ensure_index(&self) {
        if !self.index.is_valid() {
            self.index.rebuild(&self.tags);
        }
    }

    fn path_to<'a>(tags: &'a [Tag], path: &[usize]) -> &'a Tag {
        let mut cur = &tags[path[0]];
        for &i in &path[1..] {
            cur = &cur.children[i];
        }
        cur
    }

    fn path_to_mut<'a>(tags: &'a mut [Tag], path: &[usize]) -> &'a mut Tag {
        let mut cur = &mut tags[path[0]];
        for &i in &path[1..] {
            cur = &mut cur.children[i];
        }
        cur
    }

    /// Looks up a tag by its stable id.
    ///
    /// Returns `None` if no tag with this id currently exists in the
    /// document (it may never have existed, or may have been removed).
    pub fn get_tag(&self, id: TagId) -> Option<&Tag> {
        self.ensure_index();
        self.index.path_for(id).map(|path| Self::path_to(&self.tags, &path))
    }

    pub(crate) fn get_tag_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.ensure_index();
        let path = self.index.path_for(id)?;
        Some(Self::path_to_mut(&mut self.tags, &path))
    }

    /// Returns the parent of `tag`, or `None` if it is root-level.
    pub fn get_parent(&self, tag: &Tag) -> Option<&Tag> {
        tag.parent_id.and_then(|id| self.get_tag(id))
    }

    pub(crate) fn path_of(&self, id: TagId) -> Option<TagPath> {
        self.ensure_index();
        self.index.path_for(id)
    }

    /// Returns the full sibling sequence that owns the tag at `path` (the
    /// document root, or a parent's children), without the mutable access
    /// `container_for` requires -- used to validate a range before mutating
    /// it (e.g. the move-disjointness check in `mutate.rs`).
    pub(crate) fn container_slice(&self, path: &[usize]) -> &[Tag] {
        if path.len() == 1 {
            &self.tags
        } else {
            let parent_path = &path[..path.len() - 1];
            &Self::path_to(&self.tags, parent_path).children
        }
    }

    /// Returns the owning sequence (document root, or a parent's children)
    /// for a given path, and the index within it -- the "container, cursor"
    /// pair used by the mutation engine for positional insertion (§4.2).
    pub(crate) fn container_for<'a>(&'a mut self, path: &[usize]) -> (&'a mut Vec<Tag>, usize) {
        if path.len() == 1 {
            (&mut self.tags, path[0])
        } else {
            let parent_path = &path[..path.len() - 1];
            let parent = Self::path_to_mut(&mut self.tags, parent_path);
            (&mut parent.children, path[path.len() - 1])
        }
    }

    /// Increments the modification counter and invalidates the cached index.
    /// Every successful mutation calls this exactly once (§4.2 invariant).
    pub(crate) fn touch(&mut self) {
        self.modified_counter += 1;
        self.invalidate_index();
    }

    /// The document's current modification counter (§3, §5).
    pub fn modified_counter(&self) -> u64 {
        self.modified_counter
    }

    /// Allocates the next tag id and advances the per-document counter.
    pub(crate) fn next_id(&mut self) -> TagId {
        let id = TagId(self.next_id);
        self.next_id += 1;
        id
    }
}
