//! The counting pre-pass (§4.1): scans the input once to compute an upper
//! bound on the number of tags the main parse will produce, and validates
//! that CDATA sections and comments are terminated before the main parse
//! ever runs.

use crate::error::{Error, Result};
use crate::flags::ParseFlags;
use crate::parse::stream::Stream;

/// An upper bound on the number of tags the main parser will emit for this
/// input, given `flags`.
pub(crate) fn count_tags(text: &str, flags: ParseFlags) -> Result<usize> {
    let mut s = Stream::new(text);
    let mut count = 0usize;

    while !s.at_end() {
        if s.starts_with("<![CDATA[") {
            s.advance("<![CDATA[".len());
            if s.consume_until("]]>").is_none() {
                return Err(Error::InvalidData {
                    line: s.line(),
                    message: "unterminated CDATA section".into(),
                });
            }
            s.advance("]]>".len());
            count += 1;
        } else if s.starts_with("<!--") {
            s.advance("<!--".len());
            if s.consume_until("-->").is_none() {
                return Err(Error::InvalidData {
                    line: s.line(),
                    message: "unterminated comment".into(),
                });
            }
            s.advance("-->".len());
            if flags.contains(ParseFlags::INCLUDE_COMMENTS) {
                count += 1;
            }
        } else if s.starts_with("<!DOCTYPE") {
            // A DOCTYPE may contain an internal subset delimited by `[` ...
            // `]`; walk past it honoring nested `<!-- -->` before looking
            // for the terminating `>`.
            skip_doctype(&mut s)?;
            if !flags.contains(ParseFlags::STRIP_HEADERS) {
                count += 1;
            }
        } else if s.starts_with("<?") {
            s.advance(2);
            if s.consume_until("?>").is_none() {
                return Err(Error::InvalidData {
                    line: s.line(),
                    message: "unterminated processing instruction".into(),
                });
            }
            s.advance("?>".len());
            if !flags.contains(ParseFlags::STRIP_HEADERS) {
                count += 1;
            }
        } else if s.starts_with("</") {
            s.advance(2);
            let _ = s.consume_until(">");
            if s.curr_byte() == Some(b'>') {
                s.advance(1);
            }
        } else if s.curr_byte() == Some(b'<') {
            s.advance(1);
            let _ = s.consume_name();
            let mut self_closing = false;
            loop {
                s.skip_spaces();
                match s.curr_byte() {
                    Some(b'/') => {
                        s.advance(1);
                        self_closing = true;
                    }
                    Some(b'>') => {
                        s.advance(1);
                        break;
                    }
                    Some(_) => {
                        let _ = s.consume_name();
                        s.skip_spaces();
                        if s.curr_byte() == Some(b'=') {
                            s.advance(1);
                            s.skip_spaces();
                            skip_attr_value(&mut s);
                        }
                    }
                    None => break,
                }
            }
            count += 1;
            let _ = self_closing;
        } else {
            // Content text up to the next `<`.
            let text = s.consume_until("<").unwrap_or_else(|| {
                let rest = s.rest();
                s.advance(rest.len());
                rest
            });
            if !flags.contains(ParseFlags::STRIP_CONTENT) {
                if flags.contains(ParseFlags::ALL_CONTENT) || !text.trim().is_empty() {
                    count += 1;
                }
            }
        }
    }

    Ok(count)
}

fn skip_doctype(s: &mut Stream) -> Result<()> {
    s.advance("<!DOCTYPE".len());
    loop {
        match s.curr_byte() {
            Some(b'>') => {
                s.advance(1);
                return Ok(());
            }
            Some(b'[') => {
                s.advance(1);
                loop {
                    if s.starts_with("<!--") {
                        s.advance(4);
                        s.consume_until("-->");
                        s.advance(3);
                    } else if s.curr_byte() == Some(b']') {
                        s.advance(1);
                        break;
                    } else if s.at_end() {
                        return Err(Error::InvalidData {
                            line: s.line(),
                            message: "unterminated DOCTYPE internal subset".into(),
                        });
                    } else {
                        s.advance(1);
                    }
                }
            }
            Some(_) => s.advance(1),
            None => {
                return Err(Error::InvalidData {
                    line: s.line(),
                    message: "unterminated DOCTYPE declaration".into(),
                })
            }
        }
    }
}

fn skip_attr_value(s: &mut Stream) {
    match s.curr_byte() {
        Some(q @ (b'"' | b'\'')) => {
            s.advance(1);
            let quote = q as char;
            s.consume_while(|c| c != quote);
            if s.curr_byte() == Some(q) {
                s.advance(1);
            }
        }
        _ => {
            s.consume_while(|c| !c.is_whitespace() && c != '>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_simple_elements() {
        let n = count_tags("<a><b/><b/></a>", ParseFlags::empty()).unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn counts_content_unless_stripped() {
        let n = count_tags("<a>text</a>", ParseFlags::empty()).unwrap();
        assert_eq!(n, 2); // a, text
        let n = count_tags("<a>text</a>", ParseFlags::STRIP_CONTENT).unwrap();
        assert_eq!(n, 1);
    }

    #[test]
    fn rejects_unterminated_cdata() {
        let err = count_tags("<a><![CDATA[oops</a>", ParseFlags::empty()).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn rejects_unterminated_comment() {
        let err = count_tags("<a><!-- oops</a>", ParseFlags::empty()).unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }
}
