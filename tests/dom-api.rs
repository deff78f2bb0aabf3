//! DOCTYPE/entity table, namespace resolution, and attribute-editing
//! coverage -- the parts of the public surface `tests/api.rs` doesn't reach.

use xmltree_core::{AttribSelector, Document, Error, ParseFlags, ParseOptions, Where};

fn parse_with(text: &str, flags: ParseFlags) -> Document {
    Document::parse_with_options(text, ParseOptions { flags, sentinel_prefix: None }).unwrap()
}

#[test]
fn doctype_with_internal_entities_populates_tables() {
    let doc = parse_with(
        "<!DOCTYPE r PUBLIC \"-//X//Y\" \"r.dtd\" [\n\
           <!ENTITY foo \"bar\">\n\
           <!NOTATION jpeg SYSTEM \"image/jpeg\">\n\
         ]>\n<r/>",
        ParseFlags::PARSE_ENTITY,
    );

    assert_eq!(doc.doctype(), Some("r"));
    assert_eq!(doc.public_id(), Some("-//X//Y"));
    assert_eq!(doc.system_id(), Some("r.dtd"));
    assert_eq!(doc.get_entity("foo"), Ok("bar"));
    assert_eq!(doc.get_notation("jpeg"), Ok("image/jpeg"));
    assert!(matches!(doc.get_entity("missing"), Err(Error::Search)));
}

#[test]
fn strip_headers_omits_doctype_and_instructions_from_tree() {
    let doc = parse_with(
        "<?xml-stylesheet href='x.xsl'?><!DOCTYPE r [<!ENTITY x \"y\">]><r/>",
        ParseFlags::STRIP_HEADERS | ParseFlags::PARSE_ENTITY,
    );
    assert_eq!(doc.tags().len(), 1);
    assert_eq!(doc.tags()[0].name(), "r");
    // Entity table is still populated even though the DOCTYPE tag is omitted.
    assert_eq!(doc.get_entity("x"), Ok("y"));
}

#[test]
fn namespace_prefix_resolves_through_ancestor_chain() {
    let doc = parse_with(
        "<root xmlns:n='http://example.com/n'><child><leaf/></child></root>",
        ParseFlags::empty(),
    );
    let root = &doc.tags()[0];
    let child = &root.children()[0];
    let leaf = &child.children()[0];
    assert_eq!(doc.resolve_namespace_prefix(leaf, "n"), Some("http://example.com/n"));
    assert_eq!(doc.resolve_namespace_prefix(leaf, "missing"), None);
}

#[test]
fn xml_base_inherits_and_joins_relative_uris() {
    let mut doc = parse_with("<root xml:base='http://example.com/a/'><child xml:base='b.xml'/></root>", ParseFlags::empty());
    let root_id = doc.tags()[0].id();
    let child_id = doc.get_tag(root_id).unwrap().children()[0].id();
    assert_eq!(doc.base_uri(root_id), Some("http://example.com/a/".to_string()));
    assert_eq!(doc.base_uri(child_id), Some("http://example.com/a/b.xml".to_string()));
}

#[test]
fn case_folding_flags_apply_to_tag_and_attribute_names() {
    let doc = parse_with("<Root Attr='v'/>", ParseFlags::LOWER_CASE);
    assert_eq!(doc.tags()[0].name(), "root");
    assert_eq!(doc.tags()[0].attrib("attr"), Some("v"));

    let doc = parse_with("<root attr='v'/>", ParseFlags::UPPER_CASE);
    assert_eq!(doc.tags()[0].name(), "ROOT");
    assert_eq!(doc.tags()[0].attrib("ATTR"), Some("v"));
}

#[test]
fn set_attrib_new_update_and_update_only_round_trip() {
    let mut doc = parse_with("<a/>", ParseFlags::empty());
    let a = doc.tags()[0].id();

    doc.set_attrib(a, AttribSelector::New, Some("x"), Some("1")).unwrap();
    assert_eq!(doc.get_tag(a).unwrap().attrib("x"), Some("1"));

    doc.set_attrib(a, AttribSelector::Update, Some("X"), Some("2")).unwrap();
    assert_eq!(doc.get_tag(a).unwrap().attrib("x"), Some("2"));

    let err = doc.set_attrib(a, AttribSelector::UpdateOnly, Some("y"), Some("3")).unwrap_err();
    assert!(matches!(err, Error::Search));
}

#[test]
fn new_flag_suppresses_parsing_and_starts_empty() {
    let doc = parse_with("<a><b/></a>", ParseFlags::NEW);
    assert!(doc.tags().is_empty());
}

#[test]
fn insert_content_escape_encodes_text() {
    let mut doc = parse_with("<a/>", ParseFlags::empty());
    let a = doc.tags()[0].id();
    doc.insert_content(a, Where::Child, "3 < 4 & 5 > 2").unwrap();
    let out = doc.serialize(a, ParseFlags::empty()).unwrap();
    assert_eq!(out, "<a>3 &lt; 4 &amp; 5 &gt; 2</a>");
}
