//! End-to-end scenarios over the built-in packet registry

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{all_text, operators, overlay_text, packet_template, page_count};
use dqf_fill::coords::{normalize, to_viewport};
use dqf_fill::fill::text_origin;
use dqf_fill::metrics::ELLIPSIS;
use dqf_fill::pdf;
use dqf_fill::{
    dqf_packet, fill, get_page_dimensions, produce_document, AnswerMap, BytesTemplate,
    CoordinateSpace, DocumentOutcome, FieldDefinition, FieldKind, FieldRegistry, FileDraftStore,
    FileTemplate, FillConfig, FillSession, GenerationGate, OverlayView, OwnerKey, PageDimensions,
    SaveStatus, TemplateSource, WidgetValue, PACKET_PAGE_COUNT,
};
use pretty_assertions::assert_eq;

fn jonathan() -> AnswerMap {
    let mut answers = AnswerMap::new();
    answers.insert("firstName".into(), "Jonathan".into());
    answers.insert("felony_yes".into(), true.into());
    answers
}

#[test]
fn jonathan_felony_scenario() {
    let registry = dqf_packet();
    let template = packet_template(PACKET_PAGE_COUNT as usize);
    let output = fill(&template, registry, &jonathan()).unwrap();

    assert_eq!(page_count(&output.bytes), 25);
    assert!(output.report.is_clean());
    assert_eq!(output.report.drawn.len(), 2);

    let page1 = overlay_text(&output.bytes, 1);
    assert_eq!(page1.len(), 1);
    assert_eq!(page1[0].text, "Jonathan");
    assert_eq!(page1[0].font, "DqfHelv");
    let field = registry.get("firstName").unwrap();
    let abs = normalize(field, registry.space(), PageDimensions::letter());
    let (x, y) = text_origin(&abs, field.font_size);
    assert!((page1[0].x - x).abs() < 1e-3);
    assert!((page1[0].y - y).abs() < 1e-3);

    let page4 = overlay_text(&output.bytes, 4);
    assert_eq!(page4.len(), 1);
    assert_eq!(page4[0].text, "4");
    assert_eq!(page4[0].font, "DqfZaDb");
    let felony = registry.get("felony_yes").unwrap();
    assert!((page4[0].x - felony.x).abs() < 1e-3);
    assert!((page4[0].y - felony.y).abs() < 1e-3);

    // Every other page carries only the template's own content
    for page in (2..=25).filter(|p| *p != 4) {
        assert!(overlay_text(&output.bytes, page).is_empty(), "page {}", page);
    }
}

#[test]
fn template_graphics_state_is_isolated() {
    let output = fill(&packet_template(25), dqf_packet(), &jonathan()).unwrap();
    let ops = operators(&output.bytes, 1);

    assert_eq!(ops.first().map(String::as_str), Some("q"));
    let restore = ops.iter().position(|op| op == "Q").unwrap();
    let template_cm = ops.iter().position(|op| op == "cm").unwrap();
    let last_show = ops.iter().rposition(|op| op == "Tj").unwrap();
    assert!(template_cm < restore);
    assert!(restore < last_show);

    // The template's footer is still there
    assert!(all_text(&output.bytes, 1)
        .iter()
        .any(|run| run.text == "DQF packet page 1"));
}

#[test]
fn page_30_on_a_25_page_template() {
    let registry = FieldRegistry::new(
        CoordinateSpace::PdfPoints,
        vec![
            FieldDefinition::text("firstName", 1, 72.0, 680.0, 130.0),
            FieldDefinition::text("addendum", 30, 72.0, 680.0, 130.0),
        ],
        [],
    )
    .unwrap();
    let mut answers = AnswerMap::new();
    answers.insert("firstName".into(), "Jonathan".into());
    answers.insert("addendum".into(), "never drawn".into());

    assert_eq!(registry.pages_out_of_range(25).len(), 1);

    let output = fill(&packet_template(25), &registry, &answers).unwrap();
    assert_eq!(page_count(&output.bytes), 25);
    assert_eq!(output.report.skipped_out_of_range.len(), 1);
    assert_eq!(output.report.skipped_out_of_range[0].id, "addendum");
    assert_eq!(output.report.skipped_out_of_range[0].page, 30);
    assert_eq!(overlay_text(&output.bytes, 1)[0].text, "Jonathan");
}

#[test]
fn short_template_skips_later_packet_pages() {
    let mut answers = jonathan();
    answers.insert("ackSignature".into(), "Jonathan Reyes".into());
    let output = fill(&packet_template(10), dqf_packet(), &answers).unwrap();
    let skipped: Vec<&str> = output
        .report
        .skipped_out_of_range
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(skipped, vec!["ackSignature"]);
    assert_eq!(output.report.drawn.len(), 2);
}

#[test]
fn fallback_on_fetch_failure() {
    let mut answers = jonathan();
    answers.insert("lastName".into(), "Reyes".into());
    answers.insert("signature".into(), "Jonathan Reyes".into());
    answers.insert("signatureDate".into(), "2024-05-01".into());

    let missing = FileTemplate::new("/nonexistent/assets/dqf-packet.pdf");
    let outcome = produce_document(missing.fetch(), dqf_packet(), &answers).unwrap();

    let DocumentOutcome::Degraded { bytes, reason } = outcome else {
        panic!("expected a degraded document");
    };
    assert!(reason.contains("dqf-packet.pdf"));

    let text: Vec<String> = all_text(&bytes, 1).into_iter().map(|r| r.text).collect();
    assert_eq!(text[0], "DEGRADED COPY");
    assert!(text.contains(&"First name: Jonathan".to_string()));
    assert!(text.contains(&"Last name: Reyes".to_string()));
    assert!(text.contains(&"Signature: Jonathan Reyes".to_string()));
    assert!(text.contains(&"Date signed: 05/01/2024".to_string()));
    assert!(text.contains(&"felony_yes: Yes".to_string()));
}

#[test]
fn fill_is_idempotent_and_leaves_input_alone() {
    let template = packet_template(25);
    let pristine = template.clone();
    let mut answers = jonathan();
    answers.insert("dob".into(), "1988-03-07".into());
    answers.insert("street".into(), "1234 Long Haul Boulevard, Building C, Suite 900".into());
    answers.insert("felonyExplanation".into(), "Possession charge in 2009, expunged 2014".into());

    let first = fill(&template, dqf_packet(), &answers).unwrap();
    let second = fill(&template, dqf_packet(), &answers).unwrap();

    assert_eq!(template, pristine);
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.report, second.report);
    assert_ne!(first.bytes, template);
}

#[test]
fn long_values_are_truncated_with_ellipsis() {
    let mut answers = AnswerMap::new();
    answers.insert("state".into(), "Oklahoma".into());
    answers.insert(
        "firstName".into(),
        "Jonathan Alexander Bartholomew Montgomery-Richardson".into(),
    );
    let output = fill(&packet_template(25), dqf_packet(), &answers).unwrap();

    let truncated: Vec<&str> = output.report.truncated().map(|f| f.id.as_str()).collect();
    assert_eq!(truncated, vec!["firstName", "state"]);

    let shown = overlay_text(&output.bytes, 1);
    let name = shown.iter().find(|run| run.text.starts_with("Jonathan")).unwrap();
    assert!(name.text.ends_with(ELLIPSIS));
    assert!(name.text.len() < 52);
    // 30pt box: "Oklaho" fits, the last three give way to the ellipsis
    assert!(shown.iter().any(|run| run.text == "Okl..."));
}

#[test]
fn percent_fields_follow_an_offset_media_box() {
    let page = PageDimensions::letter().with_origin(100.0, 100.0);
    let template = pdf::build_document(vec![Vec::new()], page, &[]).unwrap();
    let registry = FieldRegistry::new(
        CoordinateSpace::PagePercent,
        vec![FieldDefinition::new("firstName", FieldKind::Text, 1, 10.0, 10.0).size(20.0, 2.0)],
        [],
    )
    .unwrap();
    let mut answers = AnswerMap::new();
    answers.insert("firstName".into(), "Jonathan".into());

    let output = fill(&template, &registry, &answers).unwrap();
    let ink = &overlay_text(&output.bytes, 1)[0];
    assert!((ink.x - 161.2).abs() < 1e-3);
    assert!(ink.y > 100.0 && ink.y < 892.0);

    let dims = get_page_dimensions(&output.bytes).unwrap()[0];
    assert_eq!(dims, page);
    let view = dqf_fill::render_page(&registry, 1, 1, dims, 1.0, &answers);
    let widget = view.widgets()[0].rect;
    assert!((widget.left + page.origin_x - ink.x).abs() < 1e-3);
    let bottom = page.origin_y + page.height - widget.top - widget.height;
    assert!(ink.y >= bottom - 1e-3 && ink.y <= bottom + widget.height);
}

#[test]
fn widgets_sit_where_ink_lands() {
    let registry = dqf_packet();
    let mut answers = AnswerMap::new();
    for field in registry.fields_on_page(1) {
        if field.kind.is_textual() {
            answers.insert(field.id.clone(), "A".into());
        }
    }
    let output = fill(&packet_template(25), registry, &answers).unwrap();
    let runs = overlay_text(&output.bytes, 1);

    let dims = PageDimensions::letter();
    let view = dqf_fill::render_page(registry, 1, PACKET_PAGE_COUNT, dims, 1.0, &answers);
    let textual: Vec<_> = view.widgets().iter().filter(|w| w.kind.is_textual()).collect();
    assert_eq!(textual.len(), runs.len());

    for (widget, run) in textual.iter().zip(&runs) {
        let bottom = dims.height - widget.rect.top - widget.rect.height;
        assert!((widget.rect.left - run.x).abs() < 1e-3, "{}", widget.id);
        assert!(run.y >= bottom - 1e-3, "{}", widget.id);
        assert!(run.y <= bottom + widget.rect.height, "{}", widget.id);
    }
}

#[test]
fn overlay_and_store_survive_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let config = FillConfig {
        drafts_dir: dir.path().to_path_buf(),
        ..FillConfig::default()
    };
    let owner = OwnerKey::new("jonathan@example.com").unwrap();
    let registry = Arc::new(dqf_packet().clone());
    let dims = PageDimensions::letter();
    let start = Instant::now();

    let before = {
        let mut session = FillSession::resume(
            Arc::clone(&registry),
            FileDraftStore::new(&config.drafts_dir),
            owner.clone(),
            &config,
        );
        session.edit("firstName", "Jonathan", start).unwrap();
        session.edit("lastName", "Reyes", start).unwrap();
        session.go_to_page(4, start);
        session.edit("felony_yes", true, start).unwrap();
        assert_eq!(
            session.tick(start + Duration::from_millis(100)),
            SaveStatus::Saving
        );
        assert_eq!(session.tick(start + config.autosave_delay()), SaveStatus::Saved);
        session.overlay(PACKET_PAGE_COUNT, dims)
    };

    let session = FillSession::resume(
        Arc::clone(&registry),
        FileDraftStore::new(&config.drafts_dir),
        owner,
        &config,
    );
    assert_eq!(session.current_page(), 4);
    let after = session.overlay(PACKET_PAGE_COUNT, dims);
    assert_eq!(after, before);

    let felony = after.widgets().iter().find(|w| w.id == "felony_yes").unwrap();
    assert_eq!(felony.value, WidgetValue::Checked(true));

    // Zoom changes geometry, never values
    let mut session = session;
    session.set_scale(2.0);
    let zoomed = session.overlay(PACKET_PAGE_COUNT, dims);
    for (a, b) in after.widgets().iter().zip(zoomed.widgets()) {
        assert_eq!(a.value, b.value);
        let vp = to_viewport(
            &normalize(registry.get(&a.id).unwrap(), registry.space(), dims),
            dims,
            2.0,
        );
        assert_eq!(b.rect, vp);
    }
}

#[test]
fn internal_pages_are_skipped_in_navigation() {
    let registry = Arc::new(dqf_packet().clone());
    let start = Instant::now();
    let mut session = FillSession::resume(
        registry,
        dqf_fill::MemoryDraftStore::new(),
        OwnerKey::new("driver@example.com").unwrap(),
        &FillConfig::default(),
    );
    session.go_to_page(14, start);
    assert!(matches!(
        session.overlay(PACKET_PAGE_COUNT, PageDimensions::letter()),
        OverlayView::InternalNotice {
            next_user_page: Some(17),
            ..
        }
    ));
    assert_eq!(session.skip_internal_page(PACKET_PAGE_COUNT, start), Some(17));
    session.go_to_page(24, start);
    assert_eq!(session.skip_internal_page(PACKET_PAGE_COUNT, start), Some(25));
}

#[tokio::test]
async fn async_finalize_fills_the_packet() {
    let registry = Arc::new(dqf_packet().clone());
    let mut session = FillSession::resume(
        Arc::clone(&registry),
        dqf_fill::MemoryDraftStore::new(),
        OwnerKey::new("driver@example.com").unwrap(),
        &FillConfig::default(),
    );
    let now = Instant::now();
    for field in registry.fields().iter().filter(|f| f.required) {
        let value = match field.kind {
            FieldKind::Date => "2024-05-01",
            _ => "X",
        };
        session.edit(&field.id, value, now).unwrap();
    }

    let gate = GenerationGate::new();
    let template = BytesTemplate::new(packet_template(25));
    let outcome = session.finalize_async(&template, &gate).await.unwrap();
    match outcome {
        DocumentOutcome::Filled { report, .. } => {
            assert!(report.is_clean());
            assert_eq!(
                report.drawn.len(),
                registry.fields().iter().filter(|f| f.required).count()
            );
        }
        DocumentOutcome::Degraded { reason, .. } => panic!("degraded: {}", reason),
    }
    assert!(!gate.is_busy());
}
