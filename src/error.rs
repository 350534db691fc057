use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to create PDF: {0}")]
    PdfError(String),
    #[error("Invalid record input: {0}")]
    RecordError(String),
    #[error("Failed to read settings: {0}")]
    SettingsError(String),
    #[error("Failed to load logo: {0}")]
    LogoError(String),
    #[error("No records to generate: at least one record is required")]
    NoRecords,
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
