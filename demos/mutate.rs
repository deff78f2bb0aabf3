//! Demonstrates the mutation engine: insert, sort, then serialize back to
//! text, mirroring end-to-end scenario S3/S6 from the design notes.

use xmltree_core::{ParseFlags, SortFlags, Where};
use xmltree_core::Document;

fn main() {
    let mut doc = Document::parse("<catalog/>").unwrap();
    let root = doc.tags()[0].id();

    doc.insert_xml(root, Where::Child, "<entry><item name='c'/></entry>").unwrap();
    doc.insert_xml(root, Where::Child, "<entry><item name='a'/></entry>").unwrap();
    doc.insert_xml(root, Where::Child, "<entry><item name='b'/></entry>").unwrap();

    doc.sort("/catalog", "item:name", SortFlags::default()).unwrap();

    let out = doc.serialize(root, ParseFlags::READABLE).unwrap();
    print!("{out}");
}
