// consulting-pdf: Generate consulting record sheets from record-store JSON

use ::image::{GenericImageView, ImageFormat};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::Parser;
use consulting_pdf::{
    generate_document, normalize_records, AppError, AppSettings, ConsultingRecord, GenerateOptions, ImagePayload, LogoDimensions,
    SectionKind,
};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate consulting record sheets as PDF")]
struct Args {
    /// Record file: a JSON record object or an array of records
    #[arg(short, long)]
    records: PathBuf,

    /// Settings file (JSON with pdf_options, logo, logo_dimensions)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Logo image (file path or URL) printed on every sheet
    #[arg(long)]
    logo: Option<String>,

    /// Turn a section on: anagrafica, dettagli, note, assegnazione, firma, disclaimer
    #[arg(long, value_name = "SECTION")]
    enable: Vec<SectionKind>,

    /// Turn a section off (same names as --enable)
    #[arg(long, value_name = "SECTION")]
    disable: Vec<SectionKind>,

    /// Output file (defaults to the derived sheet name inside --output-dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the derived file name
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(args: Args) -> Result<(), AppError> {
    let records = load_records(&args.records)?;

    let settings = match &args.settings {
        Some(path) => AppSettings::load(path)?,
        None => AppSettings::default(),
    };
    let mut options = settings.generate_options();
    apply_section_flags(&mut options, &args.enable, &args.disable);

    if let Some((payload, dimensions)) = load_logo(&args.logo)? {
        options.override_logo = Some(payload);
        options.override_logo_dimensions = Some(dimensions);
    }

    let document = generate_document(records, &options)?;

    let output_path = args
        .output
        .unwrap_or_else(|| args.output_dir.join(&document.file_name));
    document.save(&output_path)?;

    println!("✓ Generated: {}", output_path.display());
    println!("  Records: {}", document.record_count());
    println!("  Pages: {}", document.page_count());

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn load_records(path: &Path) -> Result<Vec<ConsultingRecord>, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::RecordError(format!("{}: {}", path.display(), e)))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| AppError::RecordError(format!("Invalid JSON: {}", e)))?;
    normalize_records(&raw)
}

/// Command-line flags win over the settings file
fn apply_section_flags(options: &mut GenerateOptions, enable: &[SectionKind], disable: &[SectionKind]) {
    for kind in enable {
        options.sections.set(*kind, true);
    }
    for kind in disable {
        options.sections.set(*kind, false);
    }
}

/// Read `--logo` into the data URL and pixel size the engine expects.
fn load_logo(path: &Option<String>) -> Result<Option<(ImagePayload, LogoDimensions)>, AppError> {
    match path {
        Some(p) => {
            let image_bytes = if p.starts_with("http://") || p.starts_with("https://") {
                let response = ureq::get(p)
                    .call()
                    .map_err(|e| AppError::LogoError(format!("Failed to fetch URL: {}", e)))?;

                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut bytes)
                    .map_err(|e| AppError::LogoError(format!("Failed to read response: {}", e)))?;
                bytes
            } else {
                std::fs::read(p).map_err(|e| AppError::LogoError(format!("{}: {}", p, e)))?
            };

            let img = ::image::load_from_memory(&image_bytes)
                .map_err(|e| AppError::LogoError(format!("Failed to decode image: {}", e)))?;
            let (width, height) = img.dimensions();

            // JPEG and PNG travel as-is, anything else is re-encoded as PNG
            let payload = match ::image::guess_format(&image_bytes) {
                Ok(ImageFormat::Jpeg) => format!("data:image/jpeg;base64,{}", STANDARD.encode(&image_bytes)),
                Ok(ImageFormat::Png) => format!("data:image/png;base64,{}", STANDARD.encode(&image_bytes)),
                _ => {
                    let mut png = Vec::new();
                    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                        .map_err(|e| AppError::LogoError(format!("Failed to re-encode image: {}", e)))?;
                    format!("data:image/png;base64,{}", STANDARD.encode(&png))
                }
            };

            let dimensions = LogoDimensions {
                width: width as f32,
                height: height as f32,
            };
            Ok(Some((ImagePayload::new(payload), dimensions)))
        }
        None => Ok(None),
    }
}
