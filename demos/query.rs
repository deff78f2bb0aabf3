//! Parses a file (or, with no argument, a small built-in sample) and runs an
//! XPath query against it, printing the match. Adapted from the teacher's
//! `examples/ast.rs` usage pattern.

use std::env;
use std::fs;
use std::process;

use xmltree_core::Document;

fn main() {
    let args: Vec<_> = env::args().collect();

    let (text, xpath) = match args.len() {
        3 => (fs::read_to_string(&args[1]).expect("read input file"), args[2].clone()),
        1 => (SAMPLE.to_string(), "//item[@id='2']/@name".to_string()),
        _ => {
            println!("Usage:\n\tcargo run --example query -- input.xml '/xpath'");
            process::exit(1);
        }
    };

    let mut doc = match Document::parse(&text) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("parse error: {e}");
            process::exit(1);
        }
    };

    match doc.find_xpath(&xpath) {
        Ok(id) => {
            let tag = doc.get_tag(id).unwrap();
            match doc.attrib() {
                Some(attr) => println!("{} = {:?}", attr, tag.attrib(attr)),
                None => println!("matched <{}>", tag.name()),
            }
        }
        Err(e) => println!("no match: {e}"),
    }
}

const SAMPLE: &str = r#"
<catalog>
    <item id="1" name="widget"/>
    <item id="2" name="gadget"/>
</catalog>
"#;
