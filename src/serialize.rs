//! Subtree-to-string serialization (§4.5).
//!
//! Mirrors the parser's structure in reverse: a recursive walk that emits
//! escaped text for content tags and `<name attr="value">...</name>` for
//! everything else, honoring the same [`ParseFlags`] bits the parser
//! consults, so that `parse(serialize(parse(source)))` round-trips for any
//! document parsed without content-discarding or case-folding flags active
//! (§4.5 round-trip property).

use crate::escape::{escape_attribute, escape_content};
use crate::flags::ParseFlags;
use crate::tag::{Tag, TagFlags};
use crate::{Document, TagId};

impl Document {
    /// Serializes the tag named by `id`, honoring `flags`.
    ///
    /// With [`ParseFlags::INCLUDE_SIBLINGS`] set, also serializes every
    /// following sibling of `id` in document order.
    pub fn serialize(&self, id: TagId, flags: ParseFlags) -> Option<String> {
        let path = self.path_of(id)?;
        let siblings = self.siblings_from(&path)?;

        let mut out = String::new();
        let indent = if flags.contains(ParseFlags::READABLE) { Some(0u32) } else { None };
        for tag in siblings {
            write_tag(&mut out, tag, flags, indent);
            if !flags.contains(ParseFlags::INCLUDE_SIBLINGS) {
                break;
            }
        }
        Some(out)
    }

    fn siblings_from(&self, path: &[usize]) -> Option<&[Tag]> {
        if path.len() == 1 {
            Some(&self.tags[path[0]..])
        } else {
            let parent_path = &path[..path.len() - 1];
            let parent = {
                let mut cur = &self.tags[parent_path[0]];
                for &i in &parent_path[1..] {
                    cur = &cur.children[i];
                }
                cur
            };
            Some(&parent.children[path[path.len() - 1]..])
        }
    }
}

fn write_tag(out: &mut String, tag: &Tag, flags: ParseFlags, indent: Option<u32>) {
    if tag.is_content() {
        write_content(out, tag, flags);
        return;
    }

    if tag.is_comment() {
        out.push_str("<!--");
        out.push_str(tag.text_value().unwrap_or(""));
        out.push_str("-->");
        newline(out, indent);
        return;
    }

    if tag.is_instruction() {
        if flags.contains(ParseFlags::STRIP_HEADERS) {
            return;
        }
        out.push_str("<?");
        out.push_str(tag.name());
        if let Some(content) = tag.text_value() {
            if !content.is_empty() {
                out.push(' ');
                out.push_str(content);
            }
        }
        out.push_str("?>");
        newline(out, indent);
        return;
    }

    if tag.is_notation() {
        if flags.contains(ParseFlags::STRIP_HEADERS) {
            return;
        }
        out.push_str("<!");
        out.push_str(tag.name());
        out.push('>');
        newline(out, indent);
        return;
    }

    write_element(out, tag, flags, indent);
}

fn write_content(out: &mut String, tag: &Tag, flags: ParseFlags) {
    let value = tag.value().unwrap_or("");
    if tag.is_cdata() && !flags.contains(ParseFlags::STRIP_CDATA) {
        out.push_str("<![CDATA[");
        out.push_str(value);
        out.push_str("]]>");
    } else {
        out.push_str(&escape_content(value));
    }
}

fn write_element(out: &mut String, tag: &Tag, flags: ParseFlags, indent: Option<u32>) {
    out.push('<');
    out.push_str(tag.name());
    for attrib in tag.attribs().iter().skip(1) {
        out.push(' ');
        out.push_str(&attrib.name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(&attrib.value));
        out.push('"');
    }

    if tag.children().is_empty() {
        out.push_str("/>");
        newline(out, indent);
        return;
    }

    out.push('>');
    let child_indent = indent.map(|n| n + 1);
    if indent.is_some() {
        out.push('\n');
    }
    for child in tag.children() {
        if let Some(n) = child_indent {
            push_indent(out, n);
        }
        write_tag(out, child, flags, child_indent);
    }
    if let Some(n) = indent {
        push_indent(out, n);
    }
    out.push_str("</");
    out.push_str(tag.name());
    out.push('>');
    newline(out, indent);
}

fn newline(out: &mut String, indent: Option<u32>) {
    if indent.is_some() {
        out.push('\n');
    }
}

fn push_indent(out: &mut String, depth: u32) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseOptions;

    fn parse(text: &str, flags: ParseFlags) -> Document {
        Document::parse_with_options(text, ParseOptions { flags, sentinel_prefix: None }).unwrap()
    }

    #[test]
    fn serializes_self_closing_element() {
        let doc = parse("<a/>", ParseFlags::empty());
        let id = doc.tags()[0].id();
        assert_eq!(doc.serialize(id, ParseFlags::empty()).unwrap(), "<a/>");
    }

    #[test]
    fn serializes_attributes_and_children() {
        let doc = parse("<a x=\"1\"><b/></a>", ParseFlags::empty());
        let id = doc.tags()[0].id();
        assert_eq!(doc.serialize(id, ParseFlags::empty()).unwrap(), "<a x=\"1\"><b/></a>");
    }

    #[test]
    fn escapes_content_on_output() {
        let doc = parse("<a>x &amp; y</a>", ParseFlags::empty());
        let id = doc.tags()[0].id();
        assert_eq!(doc.serialize(id, ParseFlags::empty()).unwrap(), "<a>x &amp; y</a>");
    }

    #[test]
    fn strip_cdata_emits_plain_text() {
        let doc = parse("<a><![CDATA[<raw>]]></a>", ParseFlags::empty());
        let id = doc.tags()[0].id();
        let out = doc.serialize(id, ParseFlags::STRIP_CDATA).unwrap();
        assert_eq!(out, "<a>&lt;raw&gt;</a>");
    }

    #[test]
    fn include_siblings_serializes_the_rest() {
        let doc = parse("<a/><b/><c/>", ParseFlags::empty());
        let id = doc.tags()[0].id();
        let out = doc.serialize(id, ParseFlags::INCLUDE_SIBLINGS).unwrap();
        assert_eq!(out, "<a/><b/><c/>");
    }

    #[test]
    fn round_trips_through_parse() {
        let original = "<a x=\"1\"><b>hi</b><c/></a>";
        let doc = parse(original, ParseFlags::empty());
        let id = doc.tags()[0].id();
        let out = doc.serialize(id, ParseFlags::empty()).unwrap();
        let reparsed = parse(&out, ParseFlags::empty());
        assert_eq!(doc.tags(), reparsed.tags());
    }
}
