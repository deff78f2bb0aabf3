//! Multi-key sibling sort (§4.7.5).
//!
//! Sort keys are built per child by walking a comma-separated list of
//! `TagName[:AttribName]` clauses: for each clause, find the tag the clause
//! names -- the child itself, or (failing that) the first matching
//! descendant (wildcard-aware) -- then take either a named attribute's
//! value or that tag's concatenated content, and join the per-clause values
//! with a `0x01` separator so the whole key sorts as one string.

use crate::error::{Error, Result};
use crate::flags::SortFlags;
use crate::tag::{Tag, TagId};
use crate::xpath::wildcard_match;
use crate::Document;

/// Whether a [`Document::sort`] call actually reordered anything.
///
/// The original engine reports a "nothing done" status from the same call
/// that performs the sort; modeled here as a proper return value rather
/// than an out-parameter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SortOutcome {
    /// The children were already in sorted order; nothing was written back.
    Unchanged,
    /// At least one pair of children changed relative order.
    Reordered,
}

struct Clause {
    tag_pattern: String,
    attrib_pattern: Option<String>,
}

fn parse_sort_spec(spec: &str) -> Result<Vec<Clause>> {
    if spec.trim().is_empty() {
        return Err(Error::Syntax("empty sort specification".into()));
    }
    spec.split(',')
        .map(|clause| {
            let clause = clause.trim();
            if clause.is_empty() {
                return Err(Error::Syntax("empty sort clause".into()));
            }
            match clause.split_once(':') {
                Some((tag, attr)) => Ok(Clause { tag_pattern: tag.to_string(), attrib_pattern: Some(attr.to_string()) }),
                None => Ok(Clause { tag_pattern: clause.to_string(), attrib_pattern: None }),
            }
        })
        .collect()
}

fn sort_key(item: &Tag, clauses: &[Clause], check_sort_attrib: bool) -> String {
    let mut parts = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let nested = find_clause_tag(item, &clause.tag_pattern);
        let value = nested
            .map(|nested| extract_value(nested, clause, check_sort_attrib))
            .unwrap_or_default();
        parts.push(value);
    }
    parts.join("\u{1}")
}

/// Finds the tag a clause's name pattern refers to: the item itself, or
/// (failing that) the first matching descendant, in document order (xml.c
/// 2249-2258: "either at the current tag or in one of the child tags
/// underneath it").
fn find_clause_tag<'a>(item: &'a Tag, pattern: &str) -> Option<&'a Tag> {
    if !item.is_content() && wildcard_match(pattern, item.name()) {
        return Some(item);
    }
    for child in item.children() {
        if let Some(found) = find_clause_tag(child, pattern) {
            return Some(found);
        }
    }
    None
}

fn extract_value(nested: &Tag, clause: &Clause, check_sort_attrib: bool) -> String {
    if check_sort_attrib {
        if let Some(v) = nested.attrib("sort") {
            return v.to_string();
        }
    }
    match &clause.attrib_pattern {
        Some(attr_pattern) => nested
            .attribs()
            .iter()
            .skip(1)
            .find(|a| wildcard_match(attr_pattern, &a.name))
            .map(|a| a.value.clone())
            .unwrap_or_default(),
        None => nested.text_content(),
    }
}

impl Document {
    /// Sorts the children of the tag matched by `xpath` (or the document's
    /// top-level tags, if `xpath` is empty) by the multi-key `sort_spec`
    /// (§4.7.5).
    pub fn sort(&mut self, xpath: &str, sort_spec: &str, sort_flags: SortFlags) -> Result<SortOutcome> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        let clauses = parse_sort_spec(sort_spec)?;

        let container: &mut Vec<Tag> = if xpath.is_empty() {
            &mut self.tags
        } else {
            let (matches, _) = self.collect_matches(xpath)?;
            let id = *matches.first().ok_or(Error::Search)?;
            self.get_tag_mut(id).ok_or(Error::NotFound)?.children_mut()
        };

        let mut keyed: Vec<(String, Tag)> =
            container.drain(..).map(|t| (sort_key(&t, &clauses, sort_flags.check_sort_attrib), t)).collect();
        let original_order: Vec<TagId> = keyed.iter().map(|(_, t)| t.id()).collect();

        if sort_flags.descending {
            keyed.sort_by(|a, b| b.0.cmp(&a.0));
        } else {
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let changed = keyed.iter().map(|(_, t)| t.id()).ne(original_order.into_iter());
        *container = keyed.into_iter().map(|(_, t)| t).collect();

        if changed {
            self.touch();
            Ok(SortOutcome::Reordered)
        } else {
            Ok(SortOutcome::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::ParseFlags;
    use crate::parse::ParseOptions;

    fn parse(text: &str) -> Document {
        Document::parse_with_options(text, ParseOptions { flags: ParseFlags::empty(), sentinel_prefix: None }).unwrap()
    }

    #[test]
    fn sorts_by_nested_tag_content_ascending() {
        let mut doc = parse(
            "<root><item><name>b</name></item><item><name>a</name></item><item><name>c</name></item></root>",
        );
        let outcome = doc.sort("/root", "name", SortFlags::default()).unwrap();
        assert_eq!(outcome, SortOutcome::Reordered);
        let names: Vec<&str> =
            doc.tags()[0].children().iter().map(|item| item.children()[0].children()[0].value().unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn sorts_by_matching_the_child_itself_when_self_closing() {
        // §8 S6: the clause's tag name matches the sorted child directly,
        // since there is no nested tag underneath a self-closing element.
        let mut doc = parse("<r><i n=\"c\"/><i n=\"a\"/><i n=\"b\"/></r>");
        let outcome = doc.sort("/r", "i:n", SortFlags::default()).unwrap();
        assert_eq!(outcome, SortOutcome::Reordered);
        let names: Vec<&str> = doc.tags()[0].children().iter().map(|i| i.attrib("n").unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn sorts_descending_with_flag() {
        let mut doc = parse("<root><item><n>1</n></item><item><n>2</n></item></root>");
        let flags = SortFlags { descending: true, check_sort_attrib: false };
        doc.sort("/root", "n", flags).unwrap();
        let values: Vec<&str> =
            doc.tags()[0].children().iter().map(|item| item.children()[0].children()[0].value().unwrap()).collect();
        assert_eq!(values, vec!["2", "1"]);
    }

    #[test]
    fn sorts_by_attribute_when_named() {
        let mut doc = parse("<root><item><n v=\"2\"/></item><item><n v=\"1\"/></item></root>");
        let outcome = doc.sort("/root", "n:v", SortFlags::default()).unwrap();
        assert_eq!(outcome, SortOutcome::Reordered);
        let values: Vec<&str> = doc.tags()[0].children().iter().map(|item| item.children()[0].attrib("v").unwrap()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn reports_unchanged_when_already_sorted() {
        let mut doc = parse("<root><item><n>1</n></item><item><n>2</n></item></root>");
        let outcome = doc.sort("/root", "n", SortFlags::default()).unwrap();
        assert_eq!(outcome, SortOutcome::Unchanged);
    }

    #[test]
    fn check_sort_attrib_overrides_normal_extraction() {
        let mut doc = parse(
            "<root><item><n sort=\"2\">b</n></item><item><n sort=\"1\">a</n></item></root>",
        );
        let flags = SortFlags { descending: false, check_sort_attrib: true };
        doc.sort("/root", "n", flags).unwrap();
        let texts: Vec<&str> = doc.tags()[0].children().iter().map(|item| item.children()[0].value().unwrap()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn rejects_read_only_document() {
        let mut doc = parse("<root><item/></root>");
        doc.make_read_only();
        assert!(matches!(doc.sort("/root", "item", SortFlags::default()), Err(Error::ReadOnly)));
    }
}
