// consulting-pdf: printable consulting record sheets, one record or a batch

pub mod batch;
pub mod document;
pub mod embed;
pub mod error;
pub mod field;
pub mod metrics;
pub mod options;
pub mod pager;
mod pdf;
pub mod record;
pub mod sections;

pub use batch::{file_name_for, generate_document, generate_document_at};
pub use document::{Document, Page, SectionPlacement};
pub use error::AppError;
pub use options::{AppSettings, GenerateOptions, RenderOptions};
pub use record::{
    normalize_records, ActivityFlag, Availability, ConsultingRecord, ImagePayload, Logo, LogoDimensions,
    MainInterest, Records, SignatureType,
};
pub use sections::SectionKind;
