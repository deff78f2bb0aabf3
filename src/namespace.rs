//! Namespace interning and `xml:base` resolution (§4.8).

use std::collections::HashMap;

use crate::tag::{Tag, TagId};
use crate::Document;

/// Per-document URI interning table.
///
/// URIs are registered on first mention and assigned a stable `u32` id; a
/// tag's [`Tag::namespace_id`](crate::Tag::namespace_id) references this
/// table. Bidirectional, like the source's namespace table, so a resolver
/// can go either from URI to id (on declaration) or id to URI (when
/// reporting a tag's namespace to a caller).
#[derive(Default, Debug)]
pub struct NamespaceTable {
    by_uri: HashMap<String, u32>,
    by_id: Vec<String>,
}

impl NamespaceTable {
    /// Interns `uri`, returning its stable id. Repeated calls with the same
    /// URI return the same id.
    pub fn intern(&mut self, uri: &str) -> u32 {
        if let Some(&id) = self.by_uri.get(uri) {
            return id;
        }
        let id = self.by_id.len() as u32;
        self.by_id.push(uri.to_string());
        self.by_uri.insert(uri.to_string(), id);
        id
    }

    /// Resolves an interned id back to its URI.
    pub fn uri(&self, id: u32) -> Option<&str> {
        self.by_id.get(id as usize).map(|s| s.as_str())
    }
}

impl Document {
    /// Resolves a namespace prefix to a URI by walking the ancestor chain
    /// of `tag`, looking for `xmlns:prefix="uri"` (or default `xmlns="uri"`
    /// when `prefix` is empty) declarations (§4.8).
    pub fn resolve_namespace_prefix(&self, tag: &Tag, prefix: &str) -> Option<&str> {
        let attr_name = if prefix.is_empty() {
            "xmlns".to_string()
        } else {
            format!("xmlns:{prefix}")
        };

        let mut current = Some(tag);
        while let Some(t) = current {
            if let Some(v) = t.attrib(&attr_name) {
                return Some(v);
            }
            current = self.get_parent(t);
        }
        None
    }

    /// Resolves the effective `xml:base` URI for `tag`, inheriting from
    /// ancestors the way relative URI resolution requires, and caching the
    /// result in [`Document::base_uri_map`](crate::Document) keyed by
    /// [`TagId`].
    pub fn base_uri(&mut self, id: TagId) -> Option<String> {
        if let Some(cached) = self.base_uri_map.get(&id) {
            return Some(cached.clone());
        }

        let mut chain = Vec::new();
        let mut current = self.get_tag(id);
        while let Some(t) = current {
            chain.push(t.id);
            if t.attrib("xml:base").is_some() {
                break;
            }
            current = self.get_parent(t);
        }

        let mut base: Option<String> = None;
        for &tid in chain.iter().rev() {
            if let Some(t) = self.get_tag(tid) {
                if let Some(b) = t.attrib("xml:base") {
                    base = Some(resolve_relative(base.as_deref(), b));
                }
            }
        }

        if let Some(ref b) = base {
            self.base_uri_map.insert(id, b.clone());
        }
        base
    }
}

/// Resolves `relative` against `base` using simple path-join semantics
/// (absolute URIs -- those containing a `://` scheme separator -- replace
/// the base outright; everything else is appended after the base's final
/// `/`).
fn resolve_relative(base: Option<&str>, relative: &str) -> String {
    if relative.contains("://") {
        return relative.to_string();
    }
    match base {
        Some(base) => match base.rfind('/') {
            Some(idx) => format!("{}{}", &base[..=idx], relative),
            None => relative.to_string(),
        },
        None => relative.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_stable_ids() {
        let mut table = NamespaceTable::default();
        let a = table.intern("urn:a");
        let b = table.intern("urn:b");
        let a2 = table.intern("urn:a");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(table.uri(a), Some("urn:a"));
    }

    #[test]
    fn relative_uri_joins_on_base() {
        assert_eq!(resolve_relative(Some("http://x/dir/"), "f.xml"), "http://x/dir/f.xml");
        assert_eq!(resolve_relative(Some("http://x/dir/a.xml"), "f.xml"), "http://x/dir/f.xml");
        assert_eq!(resolve_relative(None, "f.xml"), "f.xml");
        assert_eq!(resolve_relative(Some("http://x/"), "http://y/g.xml"), "http://y/g.xml");
    }
}
