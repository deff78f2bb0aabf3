//! DOCTYPE internal-subset parsing: `ENTITY`, `NOTATION`, and
//! `PUBLIC`/`SYSTEM` identifiers (§4.1, §4.3). Only the internal subset is
//! honored; external DTDs are never fetched (§1 Non-goals).

use crate::error::{Error, Result};
use crate::parse::stream::Stream;
use crate::Document;

/// The result of parsing a `<!DOCTYPE ...>` declaration.
pub(crate) struct DoctypeInfo {
    pub(crate) name: String,
    pub(crate) public_id: Option<String>,
    pub(crate) system_id: Option<String>,
}

/// Parses a `<!DOCTYPE` declaration starting at `s` (which must currently
/// point at the `<`), populating `doc`'s entity/notation/doctype fields when
/// `parse_entities` is true, and always returning the doctype name and
/// external identifiers.
pub(crate) fn parse_doctype(
    s: &mut Stream,
    doc: &mut Document,
    parse_entities: bool,
) -> Result<DoctypeInfo> {
    s.advance("<!DOCTYPE".len());
    s.skip_spaces();
    let name = s.consume_name().to_string();
    s.skip_spaces();

    let (public_id, system_id) = parse_external_id(s)?;
    s.skip_spaces();

    match s.curr_byte() {
        Some(b'[') => {
            s.advance(1);
            parse_internal_subset(s, doc, parse_entities)?;
        }
        Some(b'>') => {}
        _ => {
            return Err(Error::InvalidData {
                line: s.line(),
                message: "malformed DOCTYPE declaration".into(),
            })
        }
    }

    s.skip_spaces();
    if s.curr_byte() == Some(b'>') {
        s.advance(1);
    } else {
        return Err(Error::InvalidData {
            line: s.line(),
            message: "unterminated DOCTYPE declaration".into(),
        });
    }

    Ok(DoctypeInfo { name, public_id, system_id })
}

fn parse_external_id(s: &mut Stream) -> Result<(Option<String>, Option<String>)> {
    if s.starts_with("SYSTEM") {
        s.advance("SYSTEM".len());
        s.skip_spaces();
        let system = parse_quoted(s)?;
        Ok((None, Some(system)))
    } else if s.starts_with("PUBLIC") {
        s.advance("PUBLIC".len());
        s.skip_spaces();
        let public = parse_quoted(s)?;
        s.skip_spaces();
        let system = parse_quoted(s)?;
        Ok((Some(public), Some(system)))
    } else {
        Ok((None, None))
    }
}

fn parse_quoted(s: &mut Stream) -> Result<String> {
    let quote = match s.curr_byte() {
        Some(q @ (b'"' | b'\'')) => q as char,
        _ => {
            return Err(Error::InvalidData {
                line: s.line(),
                message: "expected a quoted literal".into(),
            })
        }
    };
    s.advance(1);
    let value = s.consume_while(|c| c != quote).to_string();
    if s.curr_byte() == Some(quote as u8) {
        s.advance(1);
    }
    Ok(value)
}

fn parse_internal_subset(s: &mut Stream, doc: &mut Document, parse_entities: bool) -> Result<()> {
    loop {
        s.skip_spaces();
        if s.curr_byte() == Some(b']') {
            s.advance(1);
            return Ok(());
        }
        if s.at_end() {
            return Err(Error::InvalidData {
                line: s.line(),
                message: "unterminated DOCTYPE internal subset".into(),
            });
        }

        if s.starts_with("<!--") {
            s.advance(4);
            s.consume_until("-->");
            s.advance(3);
        } else if s.starts_with("<!ENTITY") {
            parse_entity_decl(s, doc, parse_entities)?;
        } else if s.starts_with("<!NOTATION") {
            parse_notation_decl(s, doc, parse_entities)?;
        } else if s.starts_with("<?") {
            s.advance(2);
            s.consume_until("?>");
            s.advance(2);
        } else {
            // <!ELEMENT ...> / <!ATTLIST ...> — recorded by neither the
            // spec's data model nor this implementation; skip to `>`.
            s.consume_while(|c| c != '>');
            if s.curr_byte() == Some(b'>') {
                s.advance(1);
            }
        }
    }
}

fn parse_entity_decl(s: &mut Stream, doc: &mut Document, record: bool) -> Result<()> {
    s.advance("<!ENTITY".len());
    s.skip_spaces();

    let is_parameter = s.curr_byte() == Some(b'%');
    if is_parameter {
        s.advance(1);
        s.skip_spaces();
    }

    let name = s.consume_name().to_string();
    s.skip_spaces();

    let value = match s.curr_byte() {
        Some(b'"') | Some(b'\'') => parse_quoted(s)?,
        _ => {
            // External entity (SYSTEM/PUBLIC) — not expanded, but consumed.
            let (_, system) = parse_external_id(s)?;
            system.unwrap_or_default()
        }
    };

    s.skip_spaces();
    s.consume_while(|c| c != '>');
    if s.curr_byte() == Some(b'>') {
        s.advance(1);
    }

    if record {
        if is_parameter {
            doc.parameter_entities.insert(name, value);
        } else {
            doc.entities.insert(name, value);
        }
    }

    Ok(())
}

fn parse_notation_decl(s: &mut Stream, doc: &mut Document, record: bool) -> Result<()> {
    s.advance("<!NOTATION".len());
    s.skip_spaces();
    let name = s.consume_name().to_string();
    s.skip_spaces();

    let (public_id, system_id) = parse_external_id(s)?;
    s.skip_spaces();
    if s.curr_byte() == Some(b'>') {
        s.advance(1);
    }

    if record {
        let descriptor = match (public_id, system_id) {
            (Some(p), Some(sys)) => format!("{p} {sys}"),
            (None, Some(sys)) => sys,
            (Some(p), None) => p,
            (None, None) => String::new(),
        };
        doc.notations.insert(name, descriptor);
    }

    Ok(())
}
