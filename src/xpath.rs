//! The location-path compiler and resolver (§4.6).
//!
//! A path is compiled once into a small step list, then walked depth-first
//! against the tree: each non-flat step locates the first matching sibling
//! (optionally refined by a subscript or predicate), while a flat (`//`)
//! step gathers every matching descendant, which is the one place multiple
//! matches can arise for enumeration mode. This mirrors the teacher's
//! tokenizer-then-walker split (compile once, then drive a stateless
//! traversal) rather than re-parsing the path string on every step.

use crate::error::{Error, Result};
use crate::tag::Tag;
use crate::{Document, TagId};

/// Maximum length, in bytes, of a single path-step name (§4.6 edge cases).
const MAX_NAME_LEN: usize = 120;

/// Outcome requested by a [`Document::for_each_xpath`] callback.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    /// Continue to the next match, if any.
    Continue,
    /// Stop traversal immediately.
    Terminate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum StepName {
    Wildcard,
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Index(usize),
    AttribEq(String, String),
    ContentEq(String),
}

#[derive(Clone, Debug)]
struct Step {
    flat: bool,
    name: StepName,
    predicate: Option<Predicate>,
}

/// A compiled location path, ready to be evaluated repeatedly without
/// re-parsing the source string.
#[derive(Clone, Debug)]
pub struct CompiledPath {
    steps: Vec<Step>,
    trailing_attrib: Option<String>,
}

impl CompiledPath {
    /// Compiles an XPath-style location path (§4.6 supported syntax).
    pub fn compile(xpath: &str) -> Result<CompiledPath> {
        if xpath.is_empty() {
            return Err(Error::StringFormat("empty xpath".into()));
        }
        if !xpath.starts_with('/') {
            return Err(Error::StringFormat("xpath must start with '/'".into()));
        }

        let mut chars: Vec<char> = xpath.chars().collect();
        // Trailing `/@attr` is not a step; detect and strip it first.
        let trailing_attrib = extract_trailing_attrib(&mut chars)?;

        let mut steps = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '/' {
                return Err(Error::StringFormat("expected '/' before path step".into()));
            }
            i += 1;
            let flat = i < chars.len() && chars[i] == '/';
            if flat {
                i += 1;
            }

            let name_start = i;
            let name = if i < chars.len() && chars[i] == '*' {
                i += 1;
                StepName::Wildcard
            } else {
                while i < chars.len() && chars[i] != '/' && chars[i] != '[' && chars[i] != '(' {
                    i += 1;
                }
                let raw: String = chars[name_start..i].iter().collect();
                if raw.is_empty() {
                    return Err(Error::StringFormat("empty step name".into()));
                }
                if raw.len() >= MAX_NAME_LEN {
                    return Err(Error::BufferOverflow);
                }
                StepName::Named(raw)
            };

            let predicate = if i < chars.len() && (chars[i] == '[' || chars[i] == '(') {
                let close = if chars[i] == '[' { ']' } else { ')' };
                i += 1;
                let pred_start = i;
                let mut depth = 1;
                while i < chars.len() && depth > 0 {
                    if chars[i] == close {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(Error::Search);
                }
                let body: String = chars[pred_start..i].iter().collect();
                i += 1; // consume closing bracket
                Some(parse_predicate(&body)?)
            } else {
                None
            };

            steps.push(Step { flat, name, predicate });
        }

        if steps.is_empty() && trailing_attrib.is_none() {
            return Err(Error::StringFormat("xpath has no steps".into()));
        }

        Ok(CompiledPath { steps, trailing_attrib })
    }
}

fn extract_trailing_attrib(chars: &mut Vec<char>) -> Result<Option<String>> {
    // Find the last `/@name` suffix, but only if it is not inside a predicate.
    let mut depth = 0i32;
    let mut i = chars.len();
    while i > 0 {
        i -= 1;
        match chars[i] {
            ']' | ')' => depth += 1,
            '[' | '(' => depth -= 1,
            '/' if depth == 0 => {
                if i + 1 < chars.len() && chars[i + 1] == '@' {
                    let name: String = chars[i + 2..].iter().collect();
                    if name.is_empty() {
                        return Err(Error::StringFormat("empty attribute name".into()));
                    }
                    chars.truncate(i);
                    return Ok(Some(name));
                }
                break;
            }
            _ => {}
        }
    }
    Ok(None)
}

fn parse_predicate(body: &str) -> Result<Predicate> {
    if let Some(rest) = body.strip_prefix('#') {
        let n = rest.parse::<usize>().map_err(|_| Error::StringFormat(format!("bad index predicate '{body}'")))?;
        return Ok(Predicate::Index(n));
    }
    if let Some(rest) = body.strip_prefix('@') {
        let eq = rest.find('=').ok_or_else(|| Error::StringFormat(format!("bad attribute predicate '{body}'")))?;
        let attr = rest[..eq].to_string();
        let value = parse_predicate_value(&rest[eq + 1..])?;
        return Ok(Predicate::AttribEq(attr, value));
    }
    if let Some(rest) = body.strip_prefix('=') {
        let value = parse_predicate_value(rest)?;
        return Ok(Predicate::ContentEq(value));
    }
    let n = body.parse::<usize>().map_err(|_| Error::StringFormat(format!("bad position predicate '{body}'")))?;
    Ok(Predicate::Position(n))
}

fn parse_predicate_value(raw: &str) -> Result<String> {
    let bytes: Vec<char> = raw.chars().collect();
    if bytes.is_empty() {
        return Ok(String::new());
    }
    if bytes[0] == '\'' || bytes[0] == '"' {
        let quote = bytes[0];
        let mut out = String::new();
        let mut i = 1;
        while i < bytes.len() {
            if bytes[i] == '\\' && i + 1 < bytes.len() && (bytes[i + 1] == '*' || bytes[i + 1] == '\'') {
                out.push(bytes[i + 1]);
                i += 2;
                continue;
            }
            if bytes[i] == quote {
                return Ok(out);
            }
            out.push(bytes[i]);
            i += 1;
        }
        Err(Error::Search)
    } else {
        // Unquoted: terminates at the predicate close, already stripped by
        // the caller, so the whole remainder is the value.
        Ok(raw.to_string())
    }
}

/// A small glob matcher: `*` matches any run of characters, everything else
/// matches literally. Shared with the sort engine's tag/attribute name
/// matching (§4.6 "within attribute values, `*` is a wildcard").
pub(crate) fn wildcard_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = value;
    for (i, seg) in segments.iter().enumerate() {
        if seg.is_empty() {
            continue;
        }
        if i == 0 {
            if !rest.starts_with(seg) {
                return false;
            }
            rest = &rest[seg.len()..];
        } else if i == segments.len() - 1 {
            return rest.ends_with(seg);
        } else if let Some(pos) = rest.find(seg) {
            rest = &rest[pos + seg.len()..];
        } else {
            return false;
        }
    }
    true
}

fn name_matches(tag: &Tag, name: &StepName) -> bool {
    if tag.is_content() {
        return false;
    }
    match name {
        StepName::Wildcard => true,
        StepName::Named(n) => tag.name() == n,
    }
}

fn predicate_matches(tag: &Tag, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::AttribEq(attr, value) => tag.attrib(attr).map(|v| wildcard_match(value, v)).unwrap_or(false),
        Predicate::ContentEq(value) => wildcard_match(value, &tag.text_content()),
        Predicate::Position(_) | Predicate::Index(_) => true,
    }
}

/// Selects the matches of a single non-flat step from one container
/// (a sibling list), in document order.
fn step_over<'a>(container: &'a [Tag], step: &Step) -> Vec<&'a Tag> {
    match &step.predicate {
        Some(Predicate::Index(n)) => container.get(*n).into_iter().collect(),
        Some(Predicate::Position(n)) => {
            if *n == 0 {
                Vec::new()
            } else {
                container
                    .iter()
                    .filter(|t| name_matches(t, &step.name))
                    .nth(n - 1)
                    .into_iter()
                    .collect()
            }
        }
        Some(pred @ (Predicate::AttribEq(..) | Predicate::ContentEq(_))) => container
            .iter()
            .filter(|t| name_matches(t, &step.name) && predicate_matches(t, pred))
            .take(1)
            .collect(),
        None => container.iter().find(|t| name_matches(t, &step.name)).into_iter().collect(),
    }
}

fn flat_scan<'a>(container: &'a [Tag], step: &Step, out: &mut Vec<&'a Tag>) {
    for tag in container {
        let name_ok = name_matches(tag, &step.name);
        let ok = match &step.predicate {
            None | Some(Predicate::Position(_)) | Some(Predicate::Index(_)) => name_ok,
            Some(pred) => name_ok && predicate_matches(tag, pred),
        };
        if ok {
            out.push(tag);
        }
        flat_scan(&tag.children, step, out);
    }
}

/// Applies a step's positional/index predicate to the full document-order
/// match list a flat (`//`) scan produced, since `flat_scan` itself collects
/// every name match across however many bases it was run against and can't
/// apply a subscript locally the way `step_over` does within one container.
fn apply_flat_subscript<'a>(matches: Vec<&'a Tag>, predicate: &Option<Predicate>) -> Vec<&'a Tag> {
    match predicate {
        Some(Predicate::Position(n)) => {
            if *n == 0 {
                Vec::new()
            } else {
                matches.into_iter().nth(n - 1).into_iter().collect()
            }
        }
        Some(Predicate::Index(n)) => matches.into_iter().nth(*n).into_iter().collect(),
        _ => matches,
    }
}

impl Document {
    fn resolve_steps(&self, steps: &[Step]) -> Vec<&Tag> {
        let mut bases: Vec<&Tag> = Vec::new();
        let mut at_root = true;

        for step in steps {
            let mut next = Vec::new();
            if step.flat {
                if at_root {
                    flat_scan(&self.tags, step, &mut next);
                } else {
                    for base in &bases {
                        flat_scan(&base.children, step, &mut next);
                    }
                }
                next = apply_flat_subscript(next, &step.predicate);
            } else if at_root {
                next.extend(step_over(&self.tags, step));
            } else {
                for base in &bases {
                    next.extend(step_over(&base.children, step));
                }
            }
            bases = next;
            at_root = false;
        }

        bases
    }

    /// Resolves `xpath` to its matches, without setting cursor/attrib state.
    ///
    /// Shared by the mutation engine's `*_xpath` operations, which need the
    /// raw match list (and trailing-attribute name) without disturbing
    /// `cursor`/`attrib`.
    pub(crate) fn collect_matches(&self, xpath: &str) -> Result<(Vec<TagId>, Option<String>)> {
        let compiled = CompiledPath::compile(xpath)?;
        let tags = if compiled.steps.is_empty() {
            // `/@attr` alone addresses the document's top-level tags.
            self.tags.iter().collect()
        } else {
            self.resolve_steps(&compiled.steps)
        };
        Ok((tags.iter().map(|t| t.id()).collect(), compiled.trailing_attrib))
    }

    /// Resolves `xpath` against the tree, setting [`Document::cursor`] (and
    /// [`Document::attrib`], if the path ends in `/@attr`) to the last
    /// match. Fails with [`Error::Search`] if there is no match.
    pub fn find_xpath(&mut self, xpath: &str) -> Result<TagId> {
        log::trace!("xmltree-core: resolving xpath '{xpath}' (single-match mode)");
        let (matches, attrib) = self.collect_matches(xpath)?;
        let last = *matches.last().ok_or(Error::Search)?;
        self.cursor = Some(last);
        self.attrib = attrib;
        log::trace!("xmltree-core: xpath '{xpath}' matched tag {last:?}");
        Ok(last)
    }

    /// Resolves `xpath` against the tree, invoking `callback` for every
    /// match in document order.
    ///
    /// If the callback returns [`Flow::Terminate`], or mutates the document
    /// (observed via [`Document::modified_counter`] changing between
    /// calls), traversal stops and this returns [`Error::Terminate`].
    /// A path with zero matches is not an error in this mode (§4.6).
    pub fn for_each_xpath(
        &mut self,
        xpath: &str,
        mut callback: impl FnMut(&mut Document, TagId, Option<&str>) -> Flow,
    ) -> Result<()> {
        log::trace!("xmltree-core: resolving xpath '{xpath}' (enumeration mode)");
        let (matches, attrib) = self.collect_matches(xpath)?;
        log::trace!("xmltree-core: xpath '{xpath}' yielded {} match(es)", matches.len());
        let baseline = self.modified_counter();
        for id in matches {
            let flow = callback(self, id, attrib.as_deref());
            if flow == Flow::Terminate {
                return Err(Error::Terminate);
            }
            if self.modified_counter() != baseline {
                return Err(Error::Terminate);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ParseOptions;
    use crate::ParseFlags;

    fn parse(text: &str) -> Document {
        Document::parse_with_options(text, ParseOptions { flags: ParseFlags::empty(), sentinel_prefix: None }).unwrap()
    }

    #[test]
    fn rejects_malformed_paths() {
        assert!(matches!(CompiledPath::compile(""), Err(Error::StringFormat(_))));
        assert!(matches!(CompiledPath::compile("a/b"), Err(Error::StringFormat(_))));
    }

    #[test]
    fn absolute_path_finds_first_match() {
        let mut doc = parse("<a><b x=\"1\"/><b x=\"2\"/></a>");
        let id = doc.find_xpath("/a/b").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("1"));
    }

    #[test]
    fn positional_subscript_selects_second_match() {
        let mut doc = parse("<a><b x=\"1\"/><b x=\"2\"/></a>");
        let id = doc.find_xpath("/a/b[2]").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("2"));
    }

    #[test]
    fn attribute_predicate_matches_by_value() {
        let mut doc = parse("<a><b x=\"1\"/><b x=\"2\"/></a>");
        let id = doc.find_xpath("/a/b[@x='2']").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("2"));
    }

    #[test]
    fn flat_scan_finds_nested_match() {
        let mut doc = parse("<a><b><c/></b></a>");
        let id = doc.find_xpath("//c").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().name(), "c");
    }

    #[test]
    fn flat_scan_honors_positional_subscript() {
        let mut doc = parse("<a><b x=\"1\"/><c><b x=\"2\"/></c><b x=\"3\"/></a>");
        let id = doc.find_xpath("//b[1]").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("1"));

        let id = doc.find_xpath("//b[2]").unwrap();
        assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("2"));

        let mut seen = Vec::new();
        doc.for_each_xpath("//b[1]", |_, id, _| {
            seen.push(id);
            Flow::Continue
        })
        .unwrap();
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn trailing_attribute_selects_attrib_name() {
        let mut doc = parse("<a x=\"1\"/>");
        doc.find_xpath("/a/@x").unwrap();
        assert_eq!(doc.attrib(), Some("x"));
    }

    #[test]
    fn no_match_in_single_mode_is_search_error() {
        let mut doc = parse("<a/>");
        assert!(matches!(doc.find_xpath("/missing"), Err(Error::Search)));
    }

    #[test]
    fn no_match_in_enumeration_mode_is_not_an_error() {
        let mut doc = parse("<a/>");
        let mut seen = 0;
        doc.for_each_xpath("/missing", |_, _, _| {
            seen += 1;
            Flow::Continue
        })
        .unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn enumeration_visits_every_match() {
        let mut doc = parse("<a><b/><b/><b/></a>");
        let mut seen = Vec::new();
        doc.for_each_xpath("//b", |_, id, _| {
            seen.push(id);
            Flow::Continue
        })
        .unwrap();
        assert_eq!(seen.len(), 3);
    }
}
