//! Shared fixtures for integration tests

#![allow(dead_code)]

use dqf_fill::metrics::StandardFont;
use dqf_fill::pdf::{self, TextRun};
use dqf_fill::PageDimensions;
use lopdf::content::Operation;
use lopdf::{Document, Object};

/// Stand-in for the blank packet: `pages` Letter pages, each with a footer
/// label and a scaling transform left unbalanced, the way some generators
/// leave their content streams.
pub fn packet_template(pages: usize) -> Vec<u8> {
    let contents = (1..=pages)
        .map(|n| {
            let mut ops = vec![Operation::new(
                "cm",
                vec![
                    Object::Real(0.5),
                    0.into(),
                    0.into(),
                    Object::Real(0.5),
                    0.into(),
                    0.into(),
                ],
            )];
            ops.extend(pdf::text_operations(
                StandardFont::Helvetica,
                8.0,
                36.0,
                30.0,
                &format!("DQF packet page {}", n),
            ));
            ops
        })
        .collect();
    pdf::build_document(contents, PageDimensions::letter(), &[StandardFont::Helvetica])
        .expect("fixture template")
}

pub fn page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).unwrap().get_pages().len()
}

/// Text shown on a page, excluding the fixture's own footer label
pub fn overlay_text(bytes: &[u8], page: u32) -> Vec<TextRun> {
    all_text(bytes, page)
        .into_iter()
        .filter(|run| !run.text.starts_with("DQF packet page"))
        .collect()
}

pub fn all_text(bytes: &[u8], page: u32) -> Vec<TextRun> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    pdf::page_text(&doc, page_id).unwrap()
}

pub fn operators(bytes: &[u8], page: u32) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = doc.get_pages()[&page];
    pdf::page_operations(&doc, page_id)
        .unwrap()
        .into_iter()
        .map(|op| op.operator)
        .collect()
}
