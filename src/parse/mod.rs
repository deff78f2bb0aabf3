//! The lexer/counter and the main two-pass parser (§4.1).
//!
//! Pass 1 ([`lexer::count_tags`]) validates that CDATA/comment sections are
//! terminated and computes an upper bound on the number of tags; pass 2
//! (this module's [`parse`]) re-scans the text and materializes the tag
//! tree, the way the teacher's `parse.rs` walks a token stream to build its
//! arena -- except here the tags are owned directly by their parents rather
//! than pushed into a flat arena (see `store.rs`).

mod doctype;
mod lexer;
mod stream;

use crate::error::{Error, Result};
use crate::escape::unescape;
use crate::flags::ParseFlags;
use crate::tag::{Attrib, Tag};
use crate::Document;

use stream::Stream;

/// Options threaded through [`Document::parse_with_options`].
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    /// Parse/serialize behavior flags (§6.1).
    pub flags: ParseFlags,
    /// A host-specified sentinel prefix recognized (but not otherwise
    /// interpreted) in a lead comment, e.g. `"-- $FLUID"` (§4.1 edge cases).
    pub sentinel_prefix: Option<String>,
}

struct OpenTag {
    tag: Tag,
    name: String,
}

impl Document {
    /// Parses `text` as XML 1.0 using default options (no behavior flags).
    pub fn parse(text: &str) -> Result<Document> {
        Document::parse_with_options(text, ParseOptions::default())
    }

    /// Parses `text` as XML 1.0 using `options`, returning a freshly
    /// constructed document.
    pub fn parse_with_options(text: &str, options: ParseOptions) -> Result<Document> {
        let mut doc = Document::new_empty(options.flags);
        doc.reparse_with_options(text, &options)?;
        Ok(doc)
    }

    /// Re-parses `text` into this document, replacing its entire contents.
    ///
    /// On failure the document is left empty; [`Document::line_no`] and
    /// [`Document::error_msg`] retain diagnostic information about the
    /// point of failure (§4.1 Failure semantics). Entity/notation tables,
    /// the namespace table, and the tag-id counter are all reset as part of
    /// the re-parse.
    pub fn reparse_with_options(&mut self, text: &str, options: &ParseOptions) -> Result<()> {
        self.reset(options.flags);

        if options.flags.contains(ParseFlags::NEW) {
            return Ok(());
        }

        log::debug!("xmltree-core: parsing {} byte(s)", text.len());
        match parse_into(text, self, options) {
            Ok(()) => {
                log::debug!("xmltree-core: parsed {} top-level tag(s)", self.tags.len());
                Ok(())
            }
            Err(e) => {
                let line = match &e {
                    Error::InvalidData { line, .. } | Error::UnbalancedXML { line, .. } => *line,
                    _ => self.line_no,
                };
                self.reset(options.flags);
                self.line_no = line;
                self.parse_error = Some(e.clone());
                self.error_msg = Some(e.to_string());
                Err(e)
            }
        }
    }
}

fn strip_bom(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &text[3..]
    } else if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        // UTF-16 BOM: only the marker is skipped. Without a transcoding
        // dependency the remaining bytes must already be valid UTF-8 (they
        // won't be, for genuine UTF-16 input), which surfaces as
        // `InvalidData` downstream -- documented limitation, see DESIGN.md.
        &text[2..]
    } else {
        text
    }
}

fn parse_into(raw_text: &str, doc: &mut Document, options: &ParseOptions) -> Result<()> {
    if raw_text.is_empty() {
        return Err(Error::NoData);
    }

    let text = strip_bom(raw_text);
    if text.trim().is_empty() {
        return Err(Error::NoData);
    }

    let flags = options.flags;

    {
        let first_non_space = text.trim_start();
        if !first_non_space.starts_with('<') {
            return Err(Error::InvalidData { line: 1, message: "document does not start with '<'".into() });
        }
    }

    // Pass 1: validate balance of CDATA/comments and get a size hint.
    let hint = lexer::count_tags(text, flags)?;
    let mut top_level: Vec<Tag> = Vec::with_capacity(hint.min(1024));
    let mut stack: Vec<OpenTag> = Vec::new();

    let mut s = Stream::new(text);
    let mut sentinel_checked = false;

    while !s.at_end() {
        if s.starts_with("<![CDATA[") {
            parse_cdata(&mut s, doc, &mut stack, &mut top_level, flags)?;
        } else if s.starts_with("<!--") {
            parse_comment(&mut s, doc, &mut stack, &mut top_level, flags, options, &mut sentinel_checked)?;
        } else if s.starts_with("<!DOCTYPE") {
            parse_doctype_tag(&mut s, doc, &mut stack, &mut top_level, flags)?;
        } else if s.starts_with("<?") {
            parse_instruction(&mut s, doc, &mut stack, &mut top_level, flags)?;
        } else if s.starts_with("</") {
            parse_close(&mut s, &mut stack, &mut top_level, flags)?;
        } else if s.curr_byte() == Some(b'<') {
            parse_element_start(&mut s, doc, &mut stack, &mut top_level, flags)?;
        } else {
            parse_content(&mut s, doc, &mut stack, &mut top_level, flags)?;
        }
    }

    if !stack.is_empty() {
        if flags.contains(ParseFlags::WELL_FORMED) {
            let unclosed = stack.last().unwrap().name.clone();
            return Err(Error::UnbalancedXML {
                line: s.line(),
                message: format!("unclosed tag '{unclosed}'"),
            });
        }
        log::warn!("xmltree-core: {} unclosed tag(s) at end of document; truncating", stack.len());
        while let Some(open) = stack.pop() {
            close_into(&mut stack, &mut top_level, open.tag);
        }
    }

    if top_level.is_empty() {
        return Err(Error::InvalidData { line: s.line(), message: "no tags produced".into() });
    }

    doc.tags = top_level;
    doc.invalidate_index();
    Ok(())
}

fn close_into(stack: &mut [OpenTag], top_level: &mut Vec<Tag>, tag: Tag) {
    match stack.last_mut() {
        Some(parent) => parent.tag.children.push(tag),
        None => top_level.push(tag),
    }
}

fn fold_case(s: &str, flags: ParseFlags) -> String {
    if flags.contains(ParseFlags::UPPER_CASE) {
        s.to_uppercase()
    } else if flags.contains(ParseFlags::LOWER_CASE) {
        s.to_lowercase()
    } else {
        s.to_string()
    }
}

fn current_branch(stack: &[OpenTag]) -> u32 {
    stack.len() as u32
}

fn parse_element_start(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    s.advance(1); // '<'
    let raw_name = s.consume_name();
    if raw_name.is_empty() {
        return Err(Error::InvalidData { line, message: "expected an element name".into() });
    }
    let name = fold_case(raw_name, flags);

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let mut tag = Tag::new_element(id, parent_id, name.clone(), line, branch);

    let mut self_closing = false;
    loop {
        s.skip_spaces();
        match s.curr_byte() {
            Some(b'/') => {
                s.advance(1);
                if s.curr_byte() != Some(b'>') {
                    return Err(Error::InvalidData { line: s.line(), message: "expected '>' after '/'".into() });
                }
                s.advance(1);
                self_closing = true;
                break;
            }
            Some(b'>') => {
                s.advance(1);
                break;
            }
            Some(_) => {
                let raw_attr_name = s.consume_name();
                if raw_attr_name.is_empty() {
                    return Err(Error::InvalidData { line: s.line(), message: "expected an attribute name".into() });
                }
                let attr_name = fold_case(raw_attr_name, flags);
                s.skip_spaces();
                let value = if s.curr_byte() == Some(b'=') {
                    s.advance(1);
                    s.skip_spaces();
                    consume_attr_value(s)?
                } else {
                    String::new()
                };
                let value = if flags.contains(ParseFlags::NO_ESCAPE) { value } else { unescape(&value) };
                tag.attribs_mut().push(Attrib::new(attr_name, value));
            }
            None => return Err(Error::InvalidData { line: s.line(), message: "unterminated element start tag".into() }),
        }
    }

    if self_closing {
        close_into(stack, top_level, tag);
    } else {
        stack.push(OpenTag { tag, name });
    }

    Ok(())
}

fn consume_attr_value(s: &mut Stream) -> Result<String> {
    match s.curr_byte() {
        Some(q @ (b'"' | b'\'')) => {
            s.advance(1);
            let quote = q as char;
            let value = s.consume_while(|c| c != quote).to_string();
            if s.curr_byte() == Some(q) {
                s.advance(1);
            } else {
                return Err(Error::InvalidData { line: s.line(), message: "unterminated attribute value".into() });
            }
            Ok(value)
        }
        Some(_) => Ok(s.consume_while(|c| !c.is_whitespace() && c != '>').to_string()),
        None => Err(Error::InvalidData { line: s.line(), message: "expected an attribute value".into() }),
    }
}

fn parse_close(
    s: &mut Stream,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    s.advance(2); // '</'
    let raw_name = s.consume_name();
    let name = fold_case(raw_name, flags);
    s.skip_spaces();
    if s.curr_byte() == Some(b'>') {
        s.advance(1);
    } else {
        return Err(Error::InvalidData { line: s.line(), message: "expected '>' in close tag".into() });
    }

    match stack.pop() {
        Some(open) => {
            if open.name != name {
                if flags.contains(ParseFlags::WELL_FORMED) {
                    return Err(Error::UnbalancedXML {
                        line,
                        message: format!("expected closing tag '{}', found '{}'", open.name, name),
                    });
                }
                log::warn!(
                    "xmltree-core: mismatched close tag: expected '{}', found '{}' at line {}",
                    open.name,
                    name,
                    line
                );
            }
            close_into(stack, top_level, open.tag);
            Ok(())
        }
        None => {
            if flags.contains(ParseFlags::WELL_FORMED) {
                return Err(Error::UnbalancedXML { line, message: format!("unexpected closing tag '{name}'") });
            }
            log::warn!("xmltree-core: excess closing tag '{name}' at line {line} ignored");
            Ok(())
        }
    }
}

fn parse_content(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    let raw = s.consume_until("<").unwrap_or_else(|| {
        let rest = s.rest();
        s.advance(rest.len());
        rest
    });

    if flags.contains(ParseFlags::STRIP_CONTENT) {
        return Ok(());
    }

    let normalized: String = raw.chars().filter(|&c| c != '\r').collect();
    let trimmed = if flags.contains(ParseFlags::ALL_CONTENT) {
        normalized
    } else {
        normalized.trim().to_string()
    };

    if trimmed.is_empty() {
        return Ok(());
    }

    let value = if flags.contains(ParseFlags::NO_ESCAPE) { trimmed } else { unescape(&trimmed) };

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let tag = Tag::new_content(id, parent_id, value, line, branch, false);
    close_into(stack, top_level, tag);
    Ok(())
}

fn parse_cdata(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    s.advance("<![CDATA[".len());
    let text = s.consume_until("]]>").ok_or_else(|| Error::InvalidData {
        line,
        message: "unterminated CDATA section".into(),
    })?;
    s.advance("]]>".len());

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let tag = Tag::new_content(id, parent_id, text.to_string(), line, branch, true);
    close_into(stack, top_level, tag);
    Ok(())
}

fn parse_comment(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
    options: &ParseOptions,
    sentinel_checked: &mut bool,
) -> Result<()> {
    let line = s.line();
    s.advance("<!--".len());
    let text = s.consume_until("-->").ok_or_else(|| Error::InvalidData {
        line,
        message: "unterminated comment".into(),
    })?;
    s.advance("-->".len());

    if !*sentinel_checked {
        *sentinel_checked = true;
        if let Some(prefix) = &options.sentinel_prefix {
            let trimmed = text.trim_start();
            if trimmed.starts_with(prefix.as_str()) {
                doc.sentinel = Some(trimmed.to_string());
            }
        }
    }

    if !flags.contains(ParseFlags::INCLUDE_COMMENTS) {
        return Ok(());
    }

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let mut tag = Tag::new_element(id, parent_id, "", line, branch);
    tag.flags |= crate::tag::TagFlags::COMMENT;
    tag.attribs_mut()[0].value = text.to_string();
    close_into(stack, top_level, tag);
    Ok(())
}

fn parse_instruction(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    s.advance(2); // '<?'
    let target = s.consume_name().to_string();
    s.skip_spaces();
    let content = s.consume_until("?>").unwrap_or_default().to_string();
    if s.starts_with("?>") {
        s.advance(2);
    } else {
        return Err(Error::InvalidData { line, message: "unterminated processing instruction".into() });
    }

    if target.eq_ignore_ascii_case("xml") {
        // XML declaration: validated implicitly, carries no tree-visible
        // information (matches the teacher's treatment of `<?xml ... ?>`).
        return Ok(());
    }

    if flags.contains(ParseFlags::STRIP_HEADERS) {
        return Ok(());
    }

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let mut tag = Tag::new_element(id, parent_id, target, line, branch);
    tag.flags |= crate::tag::TagFlags::INSTRUCTION;
    tag.attribs_mut().push(Attrib::new("", content));
    close_into(stack, top_level, tag);
    Ok(())
}

fn parse_doctype_tag(
    s: &mut Stream,
    doc: &mut Document,
    stack: &mut Vec<OpenTag>,
    top_level: &mut Vec<Tag>,
    flags: ParseFlags,
) -> Result<()> {
    let line = s.line();
    let info = doctype::parse_doctype(s, doc, flags.contains(ParseFlags::PARSE_ENTITY))?;

    doc.doctype = Some(info.name.clone());
    doc.public_id = info.public_id;
    doc.system_id = info.system_id;

    if flags.contains(ParseFlags::STRIP_HEADERS) {
        return Ok(());
    }

    let id = doc.next_id();
    let parent_id = stack.last().map(|o| o.tag.id);
    let branch = current_branch(stack);
    let mut tag = Tag::new_element(id, parent_id, info.name, line, branch);
    tag.flags |= crate::tag::TagFlags::NOTATION;
    close_into(stack, top_level, tag);
    Ok(())
}
