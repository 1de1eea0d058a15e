use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

/// One run of Helvetica text; `top` is the baseline measured from the top of the page.
#[derive(Debug, Clone)]
pub struct TextRun {
    pub x: f32,
    pub top: f32,
    pub size: f32,
    pub text: String,
}

pub fn run(x: f32, top: f32, size: f32, text: &str) -> TextRun {
    TextRun { x, top, size, text: text.to_string() }
}

/// A TOC row: heading text at the left margin and its placeholder near the right edge.
pub fn toc_row(top: f32, heading: &str, token: &str) -> Vec<TextRun> {
    vec![run(72.0, top, 10.0, heading), run(500.0, top, 10.0, token)]
}

fn page_content(runs: &[TextRun]) -> Vec<u8> {
    let mut operations = Vec::new();
    for r in runs {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), r.size.into()]),
            Operation::new("Td", vec![r.x.into(), (PAGE_HEIGHT - r.top).into()]),
            Operation::new("Tj", vec![Object::String(r.text.clone().into_bytes(), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }
    Content { operations }.encode().unwrap()
}

/// A US Letter document with one page per entry, all pages sharing a Helvetica `/F1` resource.
pub fn build_pdf(pages: &[Vec<TextRun>]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for runs in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(runs)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Adds a link annotation over `rect` (PDF user space) pointing at `target`.
pub fn add_link(doc: &mut Document, page: ObjectId, target: ObjectId, rect: [f32; 4]) {
    let action_id = doc.add_object(dictionary! {
        "Type" => "Action",
        "S" => "GoTo",
        "D" => vec![Object::Reference(target), "Fit".into()],
    });
    let annot_id = doc.add_object(dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => rect.iter().map(|&v| Object::Real(v)).collect::<Vec<_>>(),
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => action_id,
    });
    if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page) {
        page_dict.set("Annots", vec![Object::Reference(annot_id)]);
    }
}

pub fn to_bytes(mut doc: Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Cover, TOC, preface, "Getting Started" on page 4 and "Advanced Topics" on page 7.
///
/// The TOC links its first row to page 4.
pub fn getting_started_book() -> Document {
    let mut toc = vec![run(72.0, 90.0, 16.0, "Contents")];
    toc.extend(toc_row(120.0, "1 Getting Started", "P#0001"));
    toc.extend(toc_row(140.0, "2 Advanced Topics", "P#0002"));

    let pages = vec![
        vec![run(200.0, 300.0, 24.0, "My Book")],
        toc,
        vec![run(72.0, 100.0, 11.0, "Preface text")],
        vec![run(72.0, 100.0, 18.0, "1 Getting Started"), run(72.0, 130.0, 11.0, "First steps.")],
        vec![run(72.0, 100.0, 11.0, "More about setup.")],
        vec![run(72.0, 100.0, 11.0, "Still setting up.")],
        vec![run(72.0, 100.0, 18.0, "2 Advanced Topics"), run(72.0, 130.0, 11.0, "Deep dive.")],
        vec![run(72.0, 100.0, 11.0, "The end.")],
    ];
    let mut doc = build_pdf(&pages);
    let ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    add_link(&mut doc, ids[1], ids[3], [72.0, 668.0, 540.0, 682.0]);
    doc
}

/// A document without any placeholder.
pub fn plain_book() -> Document {
    build_pdf(&[
        vec![run(72.0, 100.0, 12.0, "Title")],
        vec![run(72.0, 100.0, 12.0, "Body P#notatoken 42")],
    ])
}
