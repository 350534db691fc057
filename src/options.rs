// Render options and the settings-store document they come from.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;
use crate::record::{ImagePayload, Logo, LogoDimensions};
use crate::sections::SectionKind;

/// Which sections end up on the sheet. Missing keys take the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub anagrafica: bool,
    pub dettagli: bool,
    pub note: bool,
    pub assegnazione: bool,
    pub firma: bool,
    pub disclaimer: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            anagrafica: true,
            dettagli: false,
            note: true,
            assegnazione: true,
            firma: true,
            disclaimer: true,
        }
    }
}

impl RenderOptions {
    /// Every section enabled
    pub fn all() -> Self {
        Self::only(&SectionKind::ALL)
    }

    /// Exactly the given sections enabled
    pub fn only(kinds: &[SectionKind]) -> Self {
        let mut options = RenderOptions {
            anagrafica: false,
            dettagli: false,
            note: false,
            assegnazione: false,
            firma: false,
            disclaimer: false,
        };
        for kind in kinds {
            options.set(*kind, true);
        }
        options
    }

    pub fn is_enabled(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Identity => self.anagrafica,
            SectionKind::ServiceDetails => self.dettagli,
            SectionKind::Notes => self.note,
            SectionKind::Assignment => self.assegnazione,
            SectionKind::Signatures => self.firma,
            SectionKind::Disclaimer => self.disclaimer,
        }
    }

    pub fn set(&mut self, kind: SectionKind, enabled: bool) {
        let flag = match kind {
            SectionKind::Identity => &mut self.anagrafica,
            SectionKind::ServiceDetails => &mut self.dettagli,
            SectionKind::Notes => &mut self.note,
            SectionKind::Assignment => &mut self.assegnazione,
            SectionKind::Signatures => &mut self.firma,
            SectionKind::Disclaimer => &mut self.disclaimer,
        };
        *flag = enabled;
    }

    /// Enabled sections in drawing order
    pub fn enabled_sections(&self) -> impl Iterator<Item = SectionKind> + '_ {
        SectionKind::ALL.into_iter().filter(move |kind| self.is_enabled(*kind))
    }
}

/// Options for one generation call
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub sections: RenderOptions,
    pub override_logo: Option<ImagePayload>,
    pub override_logo_dimensions: Option<LogoDimensions>,
}

impl GenerateOptions {
    pub fn with_sections(sections: RenderOptions) -> Self {
        GenerateOptions {
            sections,
            ..Default::default()
        }
    }

    /// The organization-wide logo, when both its payload and dimensions are set.
    pub fn override_logo(&self) -> Option<Logo> {
        Logo::from_parts(self.override_logo.clone(), self.override_logo_dimensions)
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Global settings as persisted by the settings store
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    #[serde(alias = "pdfOptions")]
    pub pdf_options: Option<RenderOptions>,
    pub logo: Option<String>,
    #[serde(alias = "logoDimensions")]
    pub logo_dimensions: Option<LogoDimensions>,
}

impl AppSettings {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        serde_json::from_str(json).map_err(|e| AppError::SettingsError(format!("Invalid JSON: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::SettingsError(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            sections: self.pdf_options.unwrap_or_default(),
            override_logo: self
                .logo
                .as_deref()
                .filter(|logo| !logo.trim().is_empty())
                .map(ImagePayload::new),
            override_logo_dimensions: self.logo_dimensions,
        }
    }
}
