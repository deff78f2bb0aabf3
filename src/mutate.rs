//! Insertion, removal, movement, and attribute editing (§4.7).
//!
//! Every operation here checks `read_only` up front, fails the caller's
//! whole request atomically on error (nothing is partially applied), and
//! calls [`Document::touch`] exactly once on success -- the invariant the
//! modification counter and cached index both depend on.

use crate::error::{Error, Result};
use crate::flags::{AttribSelector, ParseFlags, Where};
use crate::tag::{Attrib, Tag, TagId};
use crate::Document;

fn renumber(doc: &mut Document, tag: &mut Tag, parent_id: Option<TagId>, branch: u32) {
    tag.id = doc.next_id();
    tag.parent_id = parent_id;
    tag.branch = branch;
    for child in tag.children.iter_mut() {
        renumber(doc, child, Some(tag.id), branch + 1);
    }
}

fn reparent(_doc: &mut Document, tag: &mut Tag, parent_id: Option<TagId>, branch: u32) {
    tag.parent_id = parent_id;
    tag.branch = branch;
    for child in tag.children.iter_mut() {
        reparent(_doc, child, Some(tag.id), branch + 1);
    }
}

fn collect_ids(tag: &Tag, out: &mut Vec<TagId>) {
    out.push(tag.id());
    for child in tag.children() {
        collect_ids(child, out);
    }
}

impl Document {
    /// Splices `tags` in at a position relative to `target_id`, applying
    /// `relabel` to each root of `tags` (and, recursively, its children) to
    /// fix up id/parent/branch before it is linked in. `relabel` is
    /// [`renumber`] for freshly parsed fragments (new ids) or [`reparent`]
    /// for an in-place move (ids preserved).
    fn splice_at(
        &mut self,
        target_id: TagId,
        where_: Where,
        mut tags: Vec<Tag>,
        relabel: &dyn Fn(&mut Document, &mut Tag, Option<TagId>, u32),
    ) -> Result<TagId> {
        if tags.is_empty() {
            return Err(Error::NullArgs);
        }

        match where_ {
            Where::Child | Where::ChildEnd => {
                let branch = self.get_tag(target_id).ok_or(Error::NotFound)?.branch() + 1;
                for tag in tags.iter_mut() {
                    relabel(self, tag, Some(target_id), branch);
                }
                let first_id = tags[0].id;
                let target = self.get_tag_mut(target_id).ok_or(Error::NotFound)?;
                let idx = if where_ == Where::Child { 0 } else { target.children().len() };
                for (offset, tag) in tags.into_iter().enumerate() {
                    target.children_mut().insert(idx + offset, tag);
                }
                Ok(first_id)
            }
            Where::Prev | Where::Next | Where::End => {
                let path = self.path_of(target_id).ok_or(Error::NotFound)?;
                let parent_id = self.get_tag(target_id).ok_or(Error::NotFound)?.parent_id();
                let branch = self.get_tag(target_id).ok_or(Error::NotFound)?.branch();
                for tag in tags.iter_mut() {
                    relabel(self, tag, parent_id, branch);
                }
                let first_id = tags[0].id;
                let (container, index) = self.container_for(&path);
                let insert_at = match where_ {
                    Where::Prev => index,
                    Where::Next => index + 1,
                    Where::End => container.len(),
                    _ => unreachable!(),
                };
                for (offset, tag) in tags.into_iter().enumerate() {
                    container.insert(insert_at + offset, tag);
                }
                Ok(first_id)
            }
        }
    }

    /// Inserts a single new content tag holding `text` relative to
    /// `target_id` (§4.7.1).
    pub fn insert_content(&mut self, target_id: TagId, where_: Where, text: impl Into<String>) -> Result<TagId> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let placeholder = Tag::new_content(TagId(0), None, text.into(), 0, 0, false);
        let id = self.splice_at(target_id, where_, vec![placeholder], &renumber)?;
        self.touch();
        Ok(id)
    }

    /// Parses `xml_text` as a standalone fragment and inserts the resulting
    /// tag sequence relative to `target_id`, allocating fresh ids for every
    /// tag in the fragment (§4.7.1). Returns the id of the first inserted
    /// tag.
    pub fn insert_xml(&mut self, target_id: TagId, where_: Where, xml_text: &str) -> Result<TagId> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let fragment = Document::parse(xml_text)?;
        let id = self.splice_at(target_id, where_, fragment.tags, &renumber)?;
        self.touch();
        Ok(id)
    }

    /// Resolves `xpath` to a single tag, then delegates to
    /// [`Document::insert_xml`] (§4.7.1).
    pub fn insert_xpath(&mut self, xpath: &str, where_: Where, xml_text: &str) -> Result<TagId> {
        let target = self.find_xpath(xpath)?;
        self.insert_xml(target, where_, xml_text)
    }

    /// Removes `id` and its `count - 1` following siblings, transitively
    /// removing their children (§4.7.2).
    pub fn remove_tag(&mut self, id: TagId, count: usize) -> Result<()> {
        if self.read_only || self.flags.contains(ParseFlags::LOCK_REMOVE) {
            return Err(Error::ReadOnly);
        }
        let path = self.path_of(id).ok_or(Error::NotFound)?;
        let (container, index) = self.container_for(&path);
        if index >= container.len() {
            return Err(Error::NotFound);
        }
        let end = (index + count.max(1)).min(container.len());
        container.drain(index..end);
        self.touch();
        Ok(())
    }

    fn remove_attrib_by_name(&mut self, id: TagId, name: &str) -> Result<()> {
        let tag = self.get_tag_mut(id).ok_or(Error::NotFound)?;
        let pos = tag
            .attribs()
            .iter()
            .skip(1)
            .position(|a| a.name.eq_ignore_ascii_case(name))
            .map(|p| p + 1)
            .ok_or(Error::Search)?;
        tag.attribs_mut().remove(pos);
        self.touch();
        Ok(())
    }

    /// Repeatedly resolves `xpath` and removes the match -- a tag, or (when
    /// the path ends in `/@attr`) just that attribute -- until `limit`
    /// removals have occurred or no more matches exist. `limit < 0` means
    /// unlimited. Returns the number of removals performed (§4.7.2).
    pub fn remove_xpath(&mut self, xpath: &str, limit: i64) -> Result<usize> {
        if self.read_only || self.flags.contains(ParseFlags::LOCK_REMOVE) {
            return Err(Error::ReadOnly);
        }
        let mut removed = 0usize;
        loop {
            if limit >= 0 && removed as i64 >= limit {
                break;
            }
            let (matches, attrib) = self.collect_matches(xpath)?;
            let Some(&id) = matches.first() else {
                break;
            };
            match &attrib {
                Some(attr_name) => match self.remove_attrib_by_name(id, attr_name) {
                    Ok(()) => {}
                    // The attribute is already gone -- re-resolving the path
                    // found the tag but not the attribute, which is "no more
                    // matches" for this xpath, not a failure (§4.7.2).
                    Err(Error::Search) => break,
                    Err(e) => return Err(e),
                },
                None => self.remove_tag(id, 1)?,
            }
            removed += 1;
        }
        Ok(removed)
    }

    /// Detaches `count` siblings starting at `source_id` and re-inserts them
    /// at `dest_id` under `where_`, preserving every tag id and child
    /// structure (§4.7.3). Fails with [`Error::Args`] if `dest_id` lies
    /// within the source range (a tag cannot be moved into its own subtree).
    pub fn move_tags(&mut self, source_id: TagId, count: usize, dest_id: TagId, where_: Where) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }

        let path = self.path_of(source_id).ok_or(Error::NotFound)?;
        let index = *path.last().unwrap();
        let source_container = self.container_slice(&path);
        if index + count > source_container.len() {
            return Err(Error::OutOfRange);
        }

        let mut excluded = Vec::new();
        for tag in &source_container[index..index + count] {
            collect_ids(tag, &mut excluded);
        }
        if excluded.contains(&dest_id) {
            return Err(Error::Args("destination lies within the source range".into()));
        }

        let detached: Vec<Tag> = {
            let (container, _) = self.container_for(&path);
            container.drain(index..index + count).collect()
        };
        self.invalidate_index();

        self.splice_at(dest_id, where_, detached, &reparent)?;
        self.touch();
        Ok(())
    }

    /// Edits or removes an attribute on `tag_id` (§4.7.4). `name` is
    /// required for [`AttribSelector::New`], [`AttribSelector::Update`], and
    /// [`AttribSelector::UpdateOnly`]. For [`AttribSelector::Index`],
    /// passing `value = None` removes the attribute at that index --
    /// except index 0, which is cleared rather than removed, since it holds
    /// the tag's own name/content slot.
    pub fn set_attrib(
        &mut self,
        tag_id: TagId,
        selector: AttribSelector,
        name: Option<&str>,
        value: Option<&str>,
    ) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let tag = self.get_tag_mut(tag_id).ok_or(Error::NotFound)?;

        match selector {
            AttribSelector::New => {
                let n = name.ok_or(Error::NullArgs)?;
                tag.attribs_mut().push(Attrib::new(n, value.unwrap_or("")));
            }
            AttribSelector::Update => {
                let n = name.ok_or(Error::NullArgs)?;
                match tag.attribs_mut().iter_mut().skip(1).find(|a| a.name.eq_ignore_ascii_case(n)) {
                    Some(existing) => existing.value = value.unwrap_or("").to_string(),
                    None => tag.attribs_mut().push(Attrib::new(n, value.unwrap_or(""))),
                }
            }
            AttribSelector::UpdateOnly => {
                let n = name.ok_or(Error::NullArgs)?;
                let existing = tag
                    .attribs_mut()
                    .iter_mut()
                    .skip(1)
                    .find(|a| a.name.eq_ignore_ascii_case(n))
                    .ok_or(Error::Search)?;
                existing.value = value.unwrap_or("").to_string();
            }
            AttribSelector::Index(0) => {
                let slot = &mut tag.attribs_mut()[0];
                match value {
                    Some(v) => slot.value = v.to_string(),
                    None => slot.value.clear(),
                }
                if let Some(n) = name {
                    slot.name = n.to_string();
                }
            }
            AttribSelector::Index(idx) => {
                let attribs = tag.attribs_mut();
                if idx >= attribs.len() {
                    return Err(Error::OutOfRange);
                }
                match value {
                    Some(v) => {
                        attribs[idx].value = v.to_string();
                        if let Some(n) = name {
                            attribs[idx].name = n.to_string();
                        }
                    }
                    None => {
                        attribs.remove(idx);
                    }
                }
            }
        }

        self.touch();
        Ok(())
    }
}
