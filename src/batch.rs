// Batch orchestration: one or more records in, one paginated document out.

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::document::{Canvas, Document, SectionPlacement, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::error::AppError;
use crate::metrics::FontStyle;
use crate::options::GenerateOptions;
use crate::pager::Pager;
use crate::record::{ConsultingRecord, Records};
use crate::sections::draw_header;

const FOOTER_LABEL: &str = "CONSULTING DESK by DESA SERVICE S.R.L.S.";
const FOOTER_FONT_SIZE: f32 = 8.0;

/// Footer baseline distance from the bottom edge
const FOOTER_OFFSET_MM: f32 = 10.0;

/// Generate the document for `records`, stamped with the current local time.
pub fn generate_document(records: impl Into<Records>, options: &GenerateOptions) -> Result<Document, AppError> {
    generate_document_at(records, options, Local::now().naive_local())
}

/// Generate the document for `records` as if it were `generated_at`.
///
/// The timestamp only feeds the page footers and the batch file name, so the
/// same inputs and timestamp always produce the same document.
pub fn generate_document_at(
    records: impl Into<Records>,
    options: &GenerateOptions,
    generated_at: NaiveDateTime,
) -> Result<Document, AppError> {
    let records = records.into().into_vec();
    if records.is_empty() {
        return Err(AppError::NoRecords);
    }

    let override_logo = options.override_logo();
    let mut canvas = Canvas::new();
    let mut placements = Vec::new();

    for (record_index, record) in records.iter().enumerate() {
        // Every record opens its own page
        let mut pager = Pager::start_record(&mut canvas, record_index);
        draw_header(&mut canvas, override_logo.as_ref().or(record.logo.as_ref()));

        for section in options.sections.enabled_sections() {
            let block = section.layout(record);
            let height = block.height;
            pager.ensure_room(&mut canvas, section.min_height(), height);
            let (page_index, y) = (pager.page_index, pager.y);
            log::debug!(
                "Record {}: '{}' at page {} y={:.1} ({:.1} mm)",
                record_index + 1,
                section,
                page_index + 1,
                y,
                height
            );

            let carried = pager.flow(&mut canvas, block);
            if carried > 0 {
                log::warn!(
                    "Record {} ({}): section '{}' is taller than the page, continued over {} more page(s)",
                    record_index + 1,
                    display_name(record),
                    section,
                    carried
                );
            }
            placements.push(SectionPlacement {
                record_index,
                section,
                page_index,
                y,
                height,
                last_page_index: page_index + carried,
            });
        }
    }

    draw_footers(&mut canvas, generated_at);

    let file_name = file_name_for(&records, generated_at.date());
    let pages = canvas.into_pages();
    log::info!(
        "Laid out {} record(s) on {} page(s) as {}",
        records.len(),
        pages.len(),
        file_name
    );

    Ok(Document {
        title: document_title(&records),
        file_name,
        pages,
        placements,
    })
}

/// Stamp the generation time on every physical page.
fn draw_footers(canvas: &mut Canvas, generated_at: NaiveDateTime) {
    let footer = format!(
        "Generato il: {} - {}",
        generated_at.format("%d/%m/%Y %H:%M:%S"),
        FOOTER_LABEL
    );
    for page in 0..canvas.page_count() {
        canvas.select_page(page);
        canvas.reset_style();
        canvas.set_font(FontStyle::Normal, FOOTER_FONT_SIZE);
        canvas.text_centered(&footer, PAGE_WIDTH_MM / 2.0, PAGE_HEIGHT_MM - FOOTER_OFFSET_MM);
    }
}

/// `scheda_<name>.pdf` for one record, a dated batch name otherwise.
pub fn file_name_for(records: &[ConsultingRecord], date: NaiveDate) -> String {
    match records {
        [single] => format!("scheda_{}.pdf", sanitize_file_stem(&single.full_name)),
        _ => format!("schede_consulenza_batch_{}.pdf", date.format("%Y-%m-%d")),
    }
}

fn sanitize_file_stem(name: &str) -> String {
    let stem = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect::<String>();
    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "cliente".to_string()
    } else {
        stem.to_string()
    }
}

fn display_name(record: &ConsultingRecord) -> &str {
    [record.full_name.as_str(), record.business_name.as_str()]
        .into_iter()
        .find(|name| !name.is_empty())
        .unwrap_or("senza nome")
}

fn document_title(records: &[ConsultingRecord]) -> String {
    match records {
        [single] => format!("Scheda Consulenza - {}", display_name(single)),
        _ => format!("Schede Consulenza ({})", records.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;
    use crate::options::RenderOptions;
    use crate::pager::{CONTENT_TOP_MM, PAGE_BOTTOM_MM, TOP_MARGIN_MM};
    use crate::record::ActivityFlag;
    use crate::sections::SectionKind;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap()
    }

    fn named(name: &str) -> ConsultingRecord {
        ConsultingRecord {
            full_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let result = generate_document_at(Vec::<ConsultingRecord>::new(), &GenerateOptions::default(), at());
        assert!(matches!(result, Err(AppError::NoRecords)));
    }

    #[test]
    fn default_layout_fits_one_page() {
        let doc = generate_document_at(named("Mario Rossi"), &GenerateOptions::default(), at()).unwrap();
        assert_eq!(doc.page_count(), 1);

        let order: Vec<_> = doc.placements.iter().map(|p| p.section).collect();
        assert_eq!(
            order,
            vec![
                SectionKind::Identity,
                SectionKind::Notes,
                SectionKind::Assignment,
                SectionKind::Signatures,
                SectionKind::Disclaimer
            ]
        );
        let offsets: Vec<_> = doc.placements.iter().map(|p| p.y).collect();
        assert_eq!(&offsets[..4], &[50.0, 130.0, 170.0, 190.0]);
        assert_eq!(offsets[4], 240.0);
    }

    #[test]
    fn details_push_the_tail_onto_a_new_page() {
        let options = GenerateOptions::with_sections(RenderOptions::all());
        let doc = generate_document_at(named("Mario Rossi"), &options, at()).unwrap();
        assert_eq!(doc.page_count(), 2);

        // 50 + 80 + 50 + 40 + 20 = 240, so the signature block (50) breaks
        let signatures = doc.placement(0, SectionKind::Signatures).unwrap();
        assert_eq!((signatures.page_index, signatures.y), (1, TOP_MARGIN_MM));
        let disclaimer = doc.placement(0, SectionKind::Disclaimer).unwrap();
        assert_eq!((disclaimer.page_index, disclaimer.y), (1, TOP_MARGIN_MM + 50.0));
        assert_eq!(doc.record_start_pages(), vec![0]);
    }

    #[test]
    fn every_record_starts_a_page() {
        let records = vec![named("A"), named("B"), named("C")];
        let doc = generate_document_at(records, &GenerateOptions::default(), at()).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.record_start_pages(), vec![0, 1, 2]);
        for (index, page) in doc.pages.iter().enumerate() {
            assert_eq!(page.record_index, index);
        }
        for index in 0..3 {
            let first = doc.placements_for(index).next().unwrap();
            assert_eq!(first.y, CONTENT_TOP_MM);
        }
    }

    #[test]
    fn footer_on_every_page() {
        let options = GenerateOptions::with_sections(RenderOptions::all());
        let doc = generate_document_at(vec![named("A"), named("B")], &options, at()).unwrap();
        assert_eq!(doc.page_count(), 4);
        for page in &doc.pages {
            let footers: Vec<_> = page
                .texts()
                .filter(|run| run.text == "Generato il: 14/03/2026 09:30:00 - CONSULTING DESK by DESA SERVICE S.R.L.S.")
                .collect();
            assert_eq!(footers.len(), 1);
            assert_eq!(footers[0].y, PAGE_HEIGHT_MM - FOOTER_OFFSET_MM);
        }
    }

    #[test]
    fn gating_removes_only_the_disabled_section() {
        let record = ConsultingRecord {
            betting_active: ActivityFlag::Si,
            betting_partners: vec!["PARTNER A".to_string()],
            ..named("Mario Rossi")
        };
        let all = generate_document_at(record.clone(), &GenerateOptions::with_sections(RenderOptions::all()), at()).unwrap();

        for disabled in SectionKind::ALL {
            let mut sections = RenderOptions::all();
            sections.set(disabled, false);
            let doc = generate_document_at(record.clone(), &GenerateOptions::with_sections(sections), at()).unwrap();

            let expected: Vec<_> = SectionKind::ALL.into_iter().filter(|k| *k != disabled).collect();
            let drawn: Vec<_> = doc.placements.iter().map(|p| p.section).collect();
            assert_eq!(drawn, expected);

            // Sections before the disabled one keep their exact position
            for placement in all.placements.iter().take_while(|p| p.section != disabled) {
                assert_eq!(doc.placement(0, placement.section), Some(placement));
            }
        }
    }

    #[test]
    fn nothing_enabled_leaves_header_and_footer() {
        let options = GenerateOptions::with_sections(RenderOptions::only(&[]));
        let doc = generate_document_at(named("Mario Rossi"), &options, at()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.placements.is_empty());
        let texts: Vec<_> = doc.pages[0].texts().map(|run| run.text.as_str()).collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "SCHEDA CONSULENZA");
    }

    fn with_requests(words: usize) -> ConsultingRecord {
        ConsultingRecord {
            requests: "parola ".repeat(words).trim_end().to_string(),
            ..named("Mario Rossi")
        }
    }

    #[test]
    fn section_that_fits_a_fresh_page_moves_there_whole() {
        let doc = generate_document_at(with_requests(180), &GenerateOptions::default(), at()).unwrap();
        let notes = doc.placement(0, SectionKind::Notes).unwrap();
        assert!(notes.height > 150.0 && notes.height <= 260.0);
        assert_eq!((notes.page_index, notes.y), (1, TOP_MARGIN_MM));
        assert_eq!(notes.last_page_index, 1);
    }

    #[test]
    fn oversized_section_continues_on_the_next_page() {
        let doc = generate_document_at(with_requests(400), &GenerateOptions::default(), at()).unwrap();
        let notes = doc.placement(0, SectionKind::Notes).unwrap();
        assert_eq!((notes.page_index, notes.y), (0, 130.0));
        assert!(notes.height > 260.0);
        assert!(notes.last_page_index > notes.page_index);
        assert!(doc.page_count() > 1);

        for page in &doc.pages {
            for element in &page.elements {
                let is_footer = matches!(element, Element::Text(run) if run.text.starts_with("Generato il"));
                if !is_footer {
                    assert!(element.y() <= PAGE_BOTTOM_MM, "element below the margin at {}", element.y());
                }
            }
        }

        // Every word made it onto some page
        let words: usize = doc
            .pages
            .iter()
            .flat_map(|page| page.texts())
            .map(|run| run.text.matches("parola").count())
            .sum();
        assert_eq!(words, 400);

        let assignment = doc.placement(0, SectionKind::Assignment).unwrap();
        assert!(assignment.page_index >= notes.last_page_index);
    }

    #[test]
    fn file_names() {
        let date = at().date();
        assert_eq!(file_name_for(&[named("Mario Rossi")], date), "scheda_Mario_Rossi.pdf");
        assert_eq!(file_name_for(&[named("  ")], date), "scheda_cliente.pdf");
        assert_eq!(file_name_for(&[named("../../etc/passwd")], date), "scheda_etcpasswd.pdf");
        let batch = vec![named("A"), named("B"), named("C")];
        assert_eq!(file_name_for(&batch, date), "schede_consulenza_batch_2026-03-14.pdf");
    }
}
