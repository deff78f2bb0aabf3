//! End-to-end scenarios S1-S6 from the design notes' testable-properties
//! section, plus a handful of boundary behaviors, exercised the way the
//! teacher's `tests/api.rs` exercises its public surface.

#[macro_use]
extern crate pretty_assertions;

use xmltree_core::{AttribSelector, Document, Error, Flow, ParseFlags, ParseOptions, SortFlags, Where};

#[test]
fn s1_basic_parse_and_positional_query() {
    let mut doc = Document::parse(r#"<a><b id="1"/><b id="2"/></a>"#).unwrap();
    let id = doc.find_xpath("/a/b[2]/@id").unwrap();
    assert_eq!(doc.attrib(), Some("id"));
    assert_eq!(doc.get_tag(id).unwrap().attrib("id"), Some("2"));
}

#[test]
fn s2_flat_scan_finds_nested_attribute() {
    let mut doc = Document::parse(r#"<r><x><y v="found"/></x></r>"#).unwrap();
    doc.find_xpath("//y/@v").unwrap();
    assert_eq!(doc.attrib(), Some("v"));
    let tag = doc.get_tag(doc.cursor().unwrap()).unwrap();
    assert_eq!(tag.attrib("v"), Some("found"));
}

#[test]
fn s3_insert_then_serialize() {
    let mut doc = Document::parse("<a/>").unwrap();
    let a = doc.tags()[0].id();
    doc.insert_xml(a, Where::Child, "<b x='1'/>").unwrap();
    let out = doc.serialize(a, ParseFlags::empty()).unwrap();
    assert_eq!(out, r#"<a><b x="1"/></a>"#);
}

#[test]
fn s4_remove_by_path_counts_each_removal() {
    let mut doc = Document::parse("<r><a/><b/><a/></r>").unwrap();
    let r = doc.tags()[0].id();
    let before = doc.modified_counter();
    let removed = doc.remove_xpath("/r/a", -1).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(doc.modified_counter(), before + 2);
    assert_eq!(doc.serialize(r, ParseFlags::empty()).unwrap(), "<r><b/></r>");
}

#[test]
fn s5_move_preserves_ids() {
    let mut doc = Document::parse("<r><a/><b><c/></b></r>").unwrap();
    let r = doc.tags()[0].id();
    let a = doc.get_tag(r).unwrap().children()[0].id();
    let b = doc.get_tag(r).unwrap().children()[1].id();
    let c = doc.get_tag(b).unwrap().children()[0].id();

    doc.move_tags(a, 1, c, Where::Next).unwrap();

    assert_eq!(doc.serialize(r, ParseFlags::empty()).unwrap(), "<r><b><c/><a/></b></r>");
    assert_eq!(doc.get_tag(a).unwrap().id(), a);
    assert_eq!(doc.get_tag(b).unwrap().id(), b);
    assert_eq!(doc.get_tag(c).unwrap().id(), c);
}

#[test]
fn s6_sort_ascending_and_descending() {
    let mut doc = Document::parse(r#"<r><i n="c"/><i n="a"/><i n="b"/></r>"#).unwrap();
    let r = doc.tags()[0].id();
    doc.sort("/r", "i:n", SortFlags::default()).unwrap();
    let names: Vec<&str> = doc.get_tag(r).unwrap().children().iter().map(|t| t.attrib("n").unwrap()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let mut doc = Document::parse(r#"<r><i n="c"/><i n="a"/><i n="b"/></r>"#).unwrap();
    let r = doc.tags()[0].id();
    let flags = SortFlags { descending: true, check_sort_attrib: false };
    doc.sort("/r", "i:n", flags).unwrap();
    let names: Vec<&str> = doc.get_tag(r).unwrap().children().iter().map(|t| t.attrib("n").unwrap()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[test]
fn empty_input_is_no_data_and_does_not_panic() {
    assert!(matches!(Document::parse(""), Err(Error::NoData)));
    assert!(matches!(Document::parse("   \n  "), Err(Error::NoData)));
}

#[test]
fn self_closing_tag_has_no_children_and_no_close_tag() {
    let doc = Document::parse("<x/>").unwrap();
    let tag = &doc.tags()[0];
    assert!(tag.children().is_empty());
    assert_eq!(doc.serialize(tag.id(), ParseFlags::empty()).unwrap(), "<x/>");
}

#[test]
fn cdata_preserved_byte_for_byte_by_default() {
    let doc = Document::parse("<a><![CDATA[<raw> & stuff]]></a>").unwrap();
    let a = doc.tags()[0].id();
    let content = &doc.get_tag(a).unwrap().children()[0];
    assert_eq!(content.value(), Some("<raw> & stuff"));
    assert_eq!(doc.serialize(a, ParseFlags::empty()).unwrap(), "<a><![CDATA[<raw> & stuff]]></a>");
}

#[test]
fn unbalanced_input_well_formed_fails_loose_truncates() {
    let strict = Document::parse_with_options(
        "<a><b></a>",
        ParseOptions { flags: ParseFlags::WELL_FORMED, sentinel_prefix: None },
    );
    assert!(matches!(strict, Err(Error::UnbalancedXML { .. })));

    let loose = Document::parse("<a><b></a>").unwrap();
    assert_eq!(loose.tags().len(), 1);
    assert_eq!(loose.tags()[0].name(), "a");
}

#[test]
fn subscript_zero_never_matches_one_matches_first() {
    let mut doc = Document::parse("<a><b x='1'/><b x='2'/></a>").unwrap();
    assert!(matches!(doc.find_xpath("/a/b[0]"), Err(Error::Search)));
    let id = doc.find_xpath("/a/b[1]").unwrap();
    assert_eq!(doc.get_tag(id).unwrap().attrib("x"), Some("1"));
}

#[test]
fn read_only_document_rejects_every_mutation() {
    let mut doc = Document::parse("<a><b/></a>").unwrap();
    doc.make_read_only();
    let b = doc.get_tag(doc.tags()[0].id()).unwrap().children()[0].id();
    assert!(matches!(doc.remove_tag(b, 1), Err(Error::ReadOnly)));
    assert!(matches!(doc.insert_content(b, Where::Next, "x"), Err(Error::ReadOnly)));
    assert!(matches!(doc.set_attrib(b, AttribSelector::New, Some("x"), Some("1")), Err(Error::ReadOnly)));
}

#[test]
fn callback_mutation_halts_enumeration_with_terminate() {
    let mut doc = Document::parse("<a><b/><b/><b/></a>").unwrap();
    let mut seen = 0;
    let result = doc.for_each_xpath("//b", |d, id, _| {
        seen += 1;
        let _ = d.remove_tag(id, 1);
        Flow::Continue
    });
    assert!(matches!(result, Err(Error::Terminate)));
    assert_eq!(seen, 1);
}

#[test]
fn insert_xml_ids_are_disjoint_from_host_document() {
    let mut doc = Document::parse("<a><b/><c/></a>").unwrap();
    let existing: Vec<u32> = {
        let a = &doc.tags()[0];
        std::iter::once(a.id().value()).chain(a.children().iter().map(|c| c.id().value())).collect()
    };
    let a = doc.tags()[0].id();
    let new_id = doc.insert_xml(a, Where::ChildEnd, "<d/>").unwrap();
    assert!(!existing.contains(&new_id.value()));
}
