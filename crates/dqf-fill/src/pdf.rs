//! lopdf helpers shared by the fill engine and the fallback generator

use crate::error::DqfError;
use crate::metrics::StandardFont;
use dqf_types::PageDimensions;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;

fn op_err(e: impl std::fmt::Display) -> DqfError {
    DqfError::FieldDraw {
        field: String::new(),
        reason: e.to_string(),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(f64::from(*v)),
        _ => None,
    }
}

/// Page size from the MediaBox (or CropBox), following the Parent chain.
/// Falls back to Letter when no box is found.
pub fn page_dimensions(doc: &Document, page_id: ObjectId) -> PageDimensions {
    let mut current = page_id;

    // Follow parent chain up to 10 levels
    for _ in 0..10 {
        let Ok(dict) = doc.get_dictionary(current) else {
            break;
        };

        if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
            let array = match media_box {
                Object::Array(arr) => Some(arr.clone()),
                Object::Reference(id) => doc
                    .get_object(*id)
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .cloned(),
                _ => None,
            };
            if let Some(arr) = array {
                let values: Vec<f64> = arr.iter().filter_map(number).collect();
                if values.len() == 4 {
                    return PageDimensions::from_media_box([
                        values[0], values[1], values[2], values[3],
                    ]);
                }
            }
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => break,
        }
    }

    PageDimensions::letter()
}

/// Encode text for a simple font. Characters outside Latin-1 become `?`.
pub fn encode_text(font: StandardFont, text: &str) -> Vec<u8> {
    if !font.uses_win_ansi() {
        return text.bytes().collect();
    }
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if code < 0x100 {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

/// `BT /Font size Tf 0 g x y Td (text) Tj ET`
pub fn text_operations(font: StandardFont, size: f64, x: f64, y: f64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name().as_bytes().to_vec()),
                Object::Real(size as f32),
            ],
        ),
        Operation::new("g", vec![Object::Integer(0)]),
        Operation::new("Td", vec![Object::Real(x as f32), Object::Real(y as f32)]),
        Operation::new(
            "Tj",
            vec![Object::String(encode_text(font, text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

fn font_dictionary(font: StandardFont) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(),
    };
    if font.uses_win_ansi() {
        dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    }
    dict
}

/// Font objects added to a document, one per standard font
#[derive(Debug, Default)]
pub struct FontCache {
    objects: BTreeMap<StandardFont, ObjectId>,
}

impl FontCache {
    pub fn object_id(&mut self, doc: &mut Document, font: StandardFont) -> ObjectId {
        *self
            .objects
            .entry(font)
            .or_insert_with(|| doc.add_object(font_dictionary(font)))
    }
}

enum ResourcesLocation {
    Inline,
    Indirect(ObjectId),
}

/// Resources the page inherits from its ancestors, if any
fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut current = doc
        .get_dictionary(page_id)
        .ok()?
        .get(b"Parent")
        .ok()?
        .as_reference()
        .ok()?;

    for _ in 0..10 {
        let dict = doc.get_dictionary(current).ok()?;
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(res)) => return Some(res.clone()),
            Ok(Object::Reference(id)) => return doc.get_dictionary(*id).ok().cloned(),
            _ => {}
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn resources_location(doc: &mut Document, page_id: ObjectId) -> Result<ResourcesLocation, DqfError> {
    let existing = doc
        .get_dictionary(page_id)
        .map_err(op_err)?
        .get(b"Resources")
        .ok()
        .cloned();

    match existing {
        Some(Object::Reference(id)) => Ok(ResourcesLocation::Indirect(id)),
        Some(Object::Dictionary(_)) => Ok(ResourcesLocation::Inline),
        _ => {
            // Copy inherited resources down so the template keeps rendering
            let resources = inherited_resources(doc, page_id).unwrap_or_default();
            doc.get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(op_err)?
                .set("Resources", Object::Dictionary(resources));
            Ok(ResourcesLocation::Inline)
        }
    }
}

fn resources_mut<'a>(
    doc: &'a mut Document,
    page_id: ObjectId,
    location: &ResourcesLocation,
) -> Result<&'a mut Dictionary, DqfError> {
    match location {
        ResourcesLocation::Inline => doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .and_then(|page| page.get_mut(b"Resources"))
            .and_then(Object::as_dict_mut)
            .map_err(op_err),
        ResourcesLocation::Indirect(id) => doc
            .get_object_mut(*id)
            .and_then(Object::as_dict_mut)
            .map_err(op_err),
    }
}

/// Make `font` available to the page's content streams under its resource name
pub fn install_font(
    doc: &mut Document,
    cache: &mut FontCache,
    page_id: ObjectId,
    font: StandardFont,
) -> Result<(), DqfError> {
    let font_id = cache.object_id(doc, font);
    let location = resources_location(doc, page_id)?;

    let font_entry = resources_mut(doc, page_id, &location)?
        .get(b"Font")
        .ok()
        .cloned();

    let name = font.resource_name();
    match font_entry {
        Some(Object::Reference(fonts_id)) => {
            doc.get_object_mut(fonts_id)
                .and_then(Object::as_dict_mut)
                .map_err(op_err)?
                .set(name, Object::Reference(font_id));
        }
        Some(Object::Dictionary(_)) => {
            resources_mut(doc, page_id, &location)?
                .get_mut(b"Font")
                .and_then(Object::as_dict_mut)
                .map_err(op_err)?
                .set(name, Object::Reference(font_id));
        }
        _ => {
            let mut fonts = Dictionary::new();
            fonts.set(name, Object::Reference(font_id));
            resources_mut(doc, page_id, &location)?.set("Font", Object::Dictionary(fonts));
        }
    }
    Ok(())
}

/// Append drawing operations to a page. The existing content is wrapped in
/// `q ... Q` so any graphics state it leaves behind does not move the overlay.
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<(), DqfError> {
    let encoded = Content { operations }.encode().map_err(op_err)?;

    let existing: Vec<Object> = match doc
        .get_dictionary(page_id)
        .map_err(op_err)?
        .get(b"Contents")
        .ok()
        .cloned()
    {
        Some(Object::Array(arr)) => arr,
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(id)],
        },
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(restore_id));
    }
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
    contents.push(Object::Reference(overlay_id));

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(op_err)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Build a new document, one page per entry of `pages`, all sharing a
/// resource dictionary with the given fonts
pub fn build_document(
    pages: Vec<Vec<Operation>>,
    dims: PageDimensions,
    fonts: &[StandardFont],
) -> Result<Vec<u8>, DqfError> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut font_dict = Dictionary::new();
    for font in fonts {
        let font_id = doc.add_object(font_dictionary(*font));
        font_dict.set(font.resource_name(), Object::Reference(font_id));
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => font_dict,
    });

    let page_count = pages.len();
    let mut page_ids = Vec::with_capacity(page_count);
    for operations in pages {
        let encoded = Content { operations }.encode().map_err(op_err)?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => dims
                .media_box()
                .iter()
                .map(|v| Object::Real(*v as f32))
                .collect::<Vec<_>>(),
            "Resources" => Object::Reference(resources_id),
            "Contents" => Object::Reference(content_id),
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => page_count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    save(&mut doc)
}

/// Serialize a document to bytes
pub fn save(doc: &mut Document) -> Result<Vec<u8>, DqfError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| DqfError::Serialization(e.to_string()))?;
    Ok(buffer)
}

/// Decoded content of a page (all content streams concatenated)
pub fn page_operations(doc: &Document, page_id: ObjectId) -> Result<Vec<Operation>, DqfError> {
    let bytes = doc.get_page_content(page_id).map_err(op_err)?;
    Content::decode(&bytes)
        .map(|content| content.operations)
        .map_err(op_err)
}

/// One `Tj` with the font and text position in effect when it ran
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Text shown on a page, in content order. Only tracks `Tf` and `Td`, which
/// is all this crate emits.
pub fn page_text(doc: &Document, page_id: ObjectId) -> Result<Vec<TextRun>, DqfError> {
    let mut font = String::new();
    let (mut x, mut y) = (0.0, 0.0);
    let mut runs = Vec::new();

    for op in page_operations(doc, page_id)? {
        match op.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = op.operands.first() {
                    font = String::from_utf8_lossy(name).into_owned();
                }
            }
            "Td" => {
                if let [tx, ty] = op.operands.as_slice() {
                    x += number(tx).unwrap_or(0.0);
                    y += number(ty).unwrap_or(0.0);
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    runs.push(TextRun {
                        font: font.clone(),
                        x,
                        y,
                        text: bytes.iter().map(|&b| char::from(b)).collect(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(runs)
}
