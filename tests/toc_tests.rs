mod common;

use common::fixtures::{build_pdf, getting_started_book, run, toc_row};
use common::pdf_assertions::{annotation_count, assert_token_gone, page_text, page_words};
use common::{TestResult, init_logging};
use folio::extractor::extract_from_layers;
use folio::resolver::{BodyText, resolve_in};
use folio::rewriter::{OVERFLOW_RIGHT_INSET, rewrite_document};
use folio::{PlaceholderToken, ReplacementMap, RewriteOptions, TocPages, extract, resolve, scan};
use folio_text_layer::{extract_page_at, extract_pages, page_ids, page_operations};
use lopdf::Document;

fn token(s: &str) -> PlaceholderToken {
    PlaceholderToken::new(s).unwrap()
}

#[test]
fn test_scan_finds_both_placeholders_on_the_toc_page() -> TestResult {
    init_logging();
    let doc = getting_started_book();
    let mut found: Vec<(usize, String)> = scan(&doc).into_iter().map(|o| (o.page_index, o.token.to_string())).collect();
    found.sort();
    assert_eq!(found, [(1, "P#0001".to_string()), (1, "P#0002".to_string())]);
    Ok(())
}

#[test]
fn test_extract_strips_section_numbers() -> TestResult {
    init_logging();
    let doc = getting_started_book();
    let occurrences = scan(&doc);
    let entries = extract(&doc, &occurrences)?;
    let rows: Vec<(&str, &str)> = entries.iter().map(|e| (e.token.as_str(), e.heading_query.as_str())).collect();
    assert_eq!(rows, [("P#0001", "Getting Started"), ("P#0002", "Advanced Topics")]);
    assert_eq!(TocPages::from_occurrences(&occurrences).max_toc_page(), Some(1));
    Ok(())
}

#[test]
fn test_resolve_end_to_end_map() -> TestResult {
    init_logging();
    let doc = getting_started_book();
    let occurrences = scan(&doc);
    let entries = extract(&doc, &occurrences)?;
    let map = resolve(&doc, &entries, 1)?;

    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&token("P#0001")), Some("4"));
    assert_eq!(map.get(&token("P#0002")), Some("7"));
    Ok(())
}

#[test]
fn test_rewrite_replaces_tokens_and_keeps_links() -> TestResult {
    init_logging();
    let mut doc = getting_started_book();
    let layers = extract_pages(&doc)?;
    let occurrences = folio::scanner::scan_layers(&layers);
    let entries = extract_from_layers(&layers, &occurrences);
    let resolution = resolve_in(&BodyText::from_layers(&layers), &entries, 1);

    let stats = rewrite_document(&mut doc, &resolution.map, RewriteOptions::default())?;
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.patches, 2);
    assert_eq!(stats.retired_runs, 2);
    assert_eq!(stats.overflows, 0);

    assert_token_gone(&doc, "P#0001");
    assert_token_gone(&doc, "P#0002");
    let words = page_words(&doc, 1);
    assert!(words.iter().any(|w| w == "4"), "{words:?}");
    assert!(words.iter().any(|w| w == "7"), "{words:?}");
    assert!(page_text(&doc, 1).contains("Getting Started"));
    assert_eq!(annotation_count(&doc, 1), 1);
    Ok(())
}

#[test]
fn test_rewrite_without_retirement_only_covers() -> TestResult {
    init_logging();
    let mut doc = getting_started_book();
    let layers = extract_pages(&doc)?;
    let occurrences = folio::scanner::scan_layers(&layers);
    let entries = extract_from_layers(&layers, &occurrences);
    let resolution = resolve_in(&BodyText::from_layers(&layers), &entries, 1);

    let options = RewriteOptions { retire_glyphs: false, ..RewriteOptions::default() };
    let stats = rewrite_document(&mut doc, &resolution.map, options)?;
    assert_eq!(stats.retired_runs, 0);
    assert_eq!(stats.patches, 2);
    // The token glyphs are still in the content stream, painted over.
    assert!(page_text(&doc, 1).contains("P#0001"));
    Ok(())
}

#[test]
fn test_missing_heading_is_guessed_forward() -> TestResult {
    init_logging();
    let mut toc = toc_row(120.0, "Introduction", "P#0001");
    toc.extend(toc_row(140.0, "Appendix", "P#0002"));
    let doc = build_pdf(&[
        vec![run(72.0, 100.0, 20.0, "Cover")],
        toc,
        vec![run(72.0, 100.0, 18.0, "Introduction")],
        vec![run(72.0, 100.0, 11.0, "Body text")],
    ]);

    let layers = extract_pages(&doc)?;
    let occurrences = folio::scanner::scan_layers(&layers);
    let entries = extract_from_layers(&layers, &occurrences);
    let resolution = resolve_in(&BodyText::from_layers(&layers), &entries, 1);

    let pages: Vec<usize> = resolution.entries.iter().map(|e| e.page.number()).collect();
    assert_eq!(pages, [3, 4]);
    let guessed: Vec<&str> = resolution.guessed().map(|e| e.token.as_str()).collect();
    assert_eq!(guessed, ["P#0002"]);
    Ok(())
}

#[test]
fn test_rows_sharing_a_heading_prefix_stay_monotonic() -> TestResult {
    init_logging();
    let mut toc = toc_row(120.0, "1 Setup", "P#0001");
    toc.extend(toc_row(140.0, "2 Usage", "P#0002"));
    toc.extend(toc_row(160.0, "3 Setup", "P#0003"));
    let doc = build_pdf(&[
        vec![run(72.0, 100.0, 20.0, "Cover")],
        toc,
        vec![run(72.0, 100.0, 18.0, "Setup")],
        vec![run(72.0, 100.0, 18.0, "Usage")],
    ]);

    let layers = extract_pages(&doc)?;
    let occurrences = folio::scanner::scan_layers(&layers);
    let entries = extract_from_layers(&layers, &occurrences);
    let resolution = resolve_in(&BodyText::from_layers(&layers), &entries, 1);
    let pages: Vec<usize> = resolution.entries.iter().map(|e| e.page.number()).collect();
    assert_eq!(pages, [3, 4, 4]);
    Ok(())
}

fn getting_started_map() -> ReplacementMap {
    let mut map = ReplacementMap::new();
    map.insert(token("P#0001"), "4");
    map.insert(token("P#0002"), "7");
    map
}

/// Boxes of the words `4` and `7` on the TOC page.
fn number_boxes(doc: &Document) -> Vec<(String, [f32; 4])> {
    extract_page_at(doc, 1)
        .unwrap()
        .words
        .into_iter()
        .filter(|w| w.text == "4" || w.text == "7")
        .map(|w| (w.text, [w.bbox.x0, w.bbox.y0, w.bbox.x1, w.bbox.y1]))
        .collect()
}

fn stroke_count(doc: &Document, index: usize) -> usize {
    let page_id = page_ids(doc)[index];
    page_operations(doc, page_id).unwrap().iter().filter(|op| op.operator == "S").count()
}

#[test]
fn test_debug_outlines_do_not_move_the_numbers() -> TestResult {
    init_logging();
    let map = getting_started_map();

    let mut plain = getting_started_book();
    rewrite_document(&mut plain, &map, RewriteOptions { debug_outlines: false, ..RewriteOptions::default() })?;
    let mut outlined = getting_started_book();
    rewrite_document(&mut outlined, &map, RewriteOptions { debug_outlines: true, ..RewriteOptions::default() })?;

    let boxes = number_boxes(&plain);
    assert_eq!(boxes.len(), 2, "{boxes:?}");
    assert_eq!(number_boxes(&outlined), boxes);
    assert_eq!(stroke_count(&plain, 1), 0);
    assert_eq!(stroke_count(&outlined, 1), 2);
    Ok(())
}

#[test]
fn test_number_too_tall_for_its_box_ends_left_of_the_token_edge() -> TestResult {
    init_logging();
    // A 4pt token whose top lines up with 10pt row text: the row sets the size, the token the box.
    let toc = vec![
        run(72.0, 120.0, 10.0, "Introduction"),
        run(300.0, 120.0, 10.0, "........"),
        run(500.0, 115.2, 4.0, "P#0001"),
    ];
    let mut doc = build_pdf(&[
        vec![run(72.0, 100.0, 20.0, "Cover")],
        toc,
        vec![run(72.0, 100.0, 18.0, "Introduction")],
    ]);
    let token_box = extract_page_at(&doc, 1)?.search("P#0001")[0].bbox;

    let mut map = ReplacementMap::new();
    map.insert(token("P#0001"), "3");
    let stats = rewrite_document(&mut doc, &map, RewriteOptions::default())?;
    assert_eq!(stats.patches, 1);
    assert_eq!(stats.overflows, 1);

    assert_token_gone(&doc, "P#0001");
    let layer = extract_page_at(&doc, 1)?;
    let three = layer.glyphs.iter().find(|g| g.text == "3").expect("the number is drawn");
    assert!(
        (three.bbox.x1 - (token_box.x1 - OVERFLOW_RIGHT_INSET)).abs() < 1e-2,
        "number ends at {}, token at {}",
        three.bbox.x1,
        token_box.x1
    );
    assert!((three.size - 10.0).abs() < 1e-3);
    Ok(())
}
