// The six sheet sections plus the per-record header.
//
// Every renderer draws starting at `y`, resets the text style first, and
// returns the vertical space it used. Page breaks are the caller's business.

use std::fmt;
use std::str::FromStr;

use crate::document::{Block, Canvas, BODY_FONT_SIZE, PAGE_WIDTH_MM};
use crate::embed::{embed, Size, LOGO_BOX, LOGO_X_MM, LOGO_Y_MM, SIGNATURE_BOX};
use crate::field::{draw_field_row, FIELD_LINE_HEIGHT_MM, FIELD_WIDTH_MM, LEFT_COLUMN_X, PLACEHOLDER, RIGHT_COLUMN_X};
use crate::metrics::{line_height_mm, split_text_to_size, FontStyle};
use crate::record::{ConsultingRecord, ImagePayload, Logo, SignatureType};

/// Font sizes in points
const TITLE_FONT_SIZE: f32 = 14.0;
const HEADING_FONT_SIZE: f32 = 14.0;
const PARTNER_FONT_SIZE: f32 = 10.0;
const TYPED_SIGNATURE_FONT_SIZE: f32 = 12.0;
const HINT_FONT_SIZE: f32 = 10.0;
const DISCLAIMER_FONT_SIZE: f32 = 8.0;

/// Gray levels (0 = black)
const HINT_GRAY: u8 = 150;
const DISCLAIMER_GRAY: u8 = 100;

/// Heading rules run from the left column to here
const RULE_END_X: f32 = 190.0;

/// Space taken by a heading and its rule before the first row
const HEADING_HEIGHT: f32 = 15.0;

/// Gap below the value lines of a field row
const ROW_GAP: f32 = 10.0;

const TITLE_Y: f32 = 25.0;
const TITLE: &str = "SCHEDA CONSULENZA";

const DISCLAIMER_WIDTH_MM: f32 = 170.0;
const DISCLAIMER: &str = "Avviso - I contatti presenti in questa scheda sono stati individuati tramite ricerche svolte con criteri accurati e non costituiscono appuntamenti, richieste dirette o manifestazioni di interesse da parte dei soggetti indicati. L’utilizzo dei dati è a esclusiva responsabilità dell’utente, nel rispetto della normativa vigente.";

/// Sheet sections in drawing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Identity,
    ServiceDetails,
    Notes,
    Assignment,
    Signatures,
    Disclaimer,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Identity,
        SectionKind::ServiceDetails,
        SectionKind::Notes,
        SectionKind::Assignment,
        SectionKind::Signatures,
        SectionKind::Disclaimer,
    ];

    /// Settings key gating this section
    pub fn key(&self) -> &'static str {
        match self {
            SectionKind::Identity => "anagrafica",
            SectionKind::ServiceDetails => "dettagli",
            SectionKind::Notes => "note",
            SectionKind::Assignment => "assegnazione",
            SectionKind::Signatures => "firma",
            SectionKind::Disclaimer => "disclaimer",
        }
    }

    /// Room that must be left on the page before the section may start
    pub fn min_height(&self) -> f32 {
        match self {
            SectionKind::Identity | SectionKind::Notes => 40.0,
            SectionKind::Assignment | SectionKind::Disclaimer => 30.0,
            SectionKind::ServiceDetails | SectionKind::Signatures => 50.0,
        }
    }

    /// Draw this section for `record` at `y`; returns the height used.
    pub fn render(&self, canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
        canvas.reset_style();
        match self {
            SectionKind::Identity => draw_identity(canvas, record, y),
            SectionKind::ServiceDetails => draw_service_details(canvas, record, y),
            SectionKind::Notes => draw_notes(canvas, record, y),
            SectionKind::Assignment => draw_assignment(canvas, record, y),
            SectionKind::Signatures => draw_signatures(canvas, record, y),
            SectionKind::Disclaimer => draw_disclaimer(canvas, y),
        }
    }

    /// Render into a detached block with its top at y = 0.
    pub fn layout(&self, record: &ConsultingRecord) -> Block {
        let mut scratch = Canvas::new();
        scratch.start_page(0);
        let height = self.render(&mut scratch, record, 0.0);
        let elements = scratch.into_pages().into_iter().flat_map(|page| page.elements).collect();
        Block { elements, height }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SectionKind {
    type Err = String;

    /// Accepts the settings keys and their English names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anagrafica" | "identity" => Ok(SectionKind::Identity),
            "dettagli" | "details" | "service-details" => Ok(SectionKind::ServiceDetails),
            "note" | "notes" => Ok(SectionKind::Notes),
            "assegnazione" | "assignment" => Ok(SectionKind::Assignment),
            "firma" | "signatures" => Ok(SectionKind::Signatures),
            "disclaimer" => Ok(SectionKind::Disclaimer),
            other => Err(format!(
                "unknown section '{}' (expected one of: anagrafica, dettagli, note, assegnazione, firma, disclaimer)",
                other
            )),
        }
    }
}

// ============================================================================
// Header
// ============================================================================

/// Logo and title at the top of each record's first page
pub fn draw_header(canvas: &mut Canvas, logo: Option<&Logo>) {
    canvas.reset_style();

    if let Some(logo) = logo {
        let declared = Size::new(logo.dimensions.width, logo.dimensions.height);
        embed(canvas, "logo", &logo.payload, Some(declared), LOGO_BOX, LOGO_X_MM, LOGO_Y_MM);
    }

    canvas.set_font(FontStyle::Bold, TITLE_FONT_SIZE);
    canvas.text_centered(TITLE, PAGE_WIDTH_MM / 2.0, TITLE_Y);
}

fn draw_heading(canvas: &mut Canvas, title: &str, y: f32) {
    canvas.set_font(FontStyle::Bold, HEADING_FONT_SIZE);
    canvas.text(title, LEFT_COLUMN_X, y);
    canvas.rule(LEFT_COLUMN_X, y + 2.0, RULE_END_X, y + 2.0);
    canvas.set_font(FontStyle::Normal, BODY_FONT_SIZE);
}

// ============================================================================
// Sections
// ============================================================================

fn draw_identity(canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
    draw_heading(canvas, "Anagrafica Cliente", y);
    let mut offset = HEADING_HEIGHT;

    let rows = [
        (("R.Sociale - Insegna", &record.business_name), ("Nome e Cognome", &record.full_name)),
        (("Indirizzo", &record.address), ("Comune", &record.city)),
        (("Provincia", &record.province), ("Telefono", &record.phone)),
        (("Email", &record.email), ("Fonte Acquisizione", &record.source)),
    ];
    for ((left_label, left), (right_label, right)) in rows {
        let height = draw_field_row(canvas, (left_label, left.as_str()), (right_label, right.as_str()), y + offset);
        offset += height + ROW_GAP;
    }

    offset + 5.0
}

fn draw_service_details(canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
    draw_heading(canvas, "Dettagli Servizio", y);
    let mut offset = HEADING_HEIGHT;

    let height = draw_field_row(
        canvas,
        ("Disponibilità Cliente", record.availability.as_str()),
        ("Interesse Maggiore", record.main_interest.display_label()),
        y + offset,
    );
    offset += height + ROW_GAP;

    let flags_y = y + offset;
    let height = draw_field_row(
        canvas,
        ("Servizio PVR Attivo", record.betting_active.as_str()),
        ("Servizio Utenze Attivo", record.utilities_active.as_str()),
        flags_y,
    );

    // Partner annotations go right under the flag values
    let partners_y = flags_y + 5.0 + height;
    let mut extra: f32 = 0.0;
    if let Some(partners) = record.visible_betting_partners() {
        extra = extra.max(draw_partners(canvas, partners, LEFT_COLUMN_X, partners_y));
    }
    if let Some(partners) = record.visible_utility_partners() {
        extra = extra.max(draw_partners(canvas, partners, RIGHT_COLUMN_X, partners_y));
    }

    offset + height + 15.0 + extra
}

fn draw_partners(canvas: &mut Canvas, partners: &[String], x: f32, y: f32) -> f32 {
    canvas.set_font(FontStyle::Italic, PARTNER_FONT_SIZE);
    let text = format!("Partner: {}", partners.join(", "));
    let lines = split_text_to_size(&text, FontStyle::Italic, PARTNER_FONT_SIZE, FIELD_WIDTH_MM);
    canvas.lines(&lines, x, y, FIELD_LINE_HEIGHT_MM);
    canvas.set_font(FontStyle::Normal, BODY_FONT_SIZE);
    lines.len() as f32 * FIELD_LINE_HEIGHT_MM + 5.0
}

fn draw_notes(canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
    draw_heading(canvas, "Note e Richieste", y);
    let height = draw_field_row(
        canvas,
        ("Richieste del Cliente", record.requests.as_str()),
        ("Note", record.notes.as_str()),
        y + HEADING_HEIGHT,
    );
    HEADING_HEIGHT + height + 20.0
}

fn draw_assignment(canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
    canvas.set_font(FontStyle::Bold, BODY_FONT_SIZE);
    canvas.text("Consulente Assegnato:", LEFT_COLUMN_X, y);
    canvas.set_style(FontStyle::Normal);

    let consultant = if record.assigned_consultant.is_empty() {
        PLACEHOLDER
    } else {
        record.assigned_consultant.as_str()
    };
    canvas.text(consultant, LEFT_COLUMN_X + 45.0, y);
    20.0
}

fn draw_signatures(canvas: &mut Canvas, record: &ConsultingRecord, y: f32) -> f32 {
    canvas.set_font(FontStyle::Bold, HEADING_FONT_SIZE);
    canvas.text("Firma Operatore", LEFT_COLUMN_X, y);
    canvas.text("Firma Consulente", RIGHT_COLUMN_X, y);
    canvas.rule(LEFT_COLUMN_X, y + 2.0, RULE_END_X, y + 2.0);

    let body_y = y + 10.0;
    let line_y = body_y + 20.0;

    match record.signature_type {
        SignatureType::Draw if !record.signature_data.is_empty() => {
            let payload = ImagePayload::new(record.signature_data.as_str());
            embed(canvas, "signature image", &payload, None, SIGNATURE_BOX, LEFT_COLUMN_X, body_y);
        }
        SignatureType::Type if !record.operator_name.is_empty() => {
            canvas.set_font(FontStyle::Italic, TYPED_SIGNATURE_FONT_SIZE);
            canvas.text(&record.operator_name, LEFT_COLUMN_X, line_y);
        }
        _ => {
            canvas.set_font(FontStyle::Normal, HINT_FONT_SIZE);
            canvas.set_gray(HINT_GRAY);
            canvas.text("(Nessuna firma apposta)", LEFT_COLUMN_X, line_y);
        }
    }

    // Counter-signature is always left for the consultant to sign by hand
    canvas.set_font(FontStyle::Normal, HINT_FONT_SIZE);
    canvas.set_gray(HINT_GRAY);
    canvas.text(PLACEHOLDER, RIGHT_COLUMN_X, line_y);
    canvas.set_gray(0);

    50.0
}

fn draw_disclaimer(canvas: &mut Canvas, y: f32) -> f32 {
    canvas.set_font(FontStyle::Italic, DISCLAIMER_FONT_SIZE);
    canvas.set_gray(DISCLAIMER_GRAY);
    let lines = split_text_to_size(DISCLAIMER, FontStyle::Italic, DISCLAIMER_FONT_SIZE, DISCLAIMER_WIDTH_MM);
    let line_height = line_height_mm(DISCLAIMER_FONT_SIZE);
    canvas.lines_centered(&lines, PAGE_WIDTH_MM / 2.0, y, line_height);
    canvas.set_gray(0);
    lines.len() as f32 * line_height
}
