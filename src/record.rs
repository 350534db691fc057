// Canonical consulting record and the normalizer that builds it from the
// loosely-shaped JSON the record store and the form editor hand us.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;

// ============================================================================
// Wire Enumerations
// ============================================================================

/// Activity flag, stored as "SI" / "NO"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityFlag {
    #[serde(rename = "SI")]
    Si,
    #[default]
    #[serde(rename = "NO")]
    No,
}

impl ActivityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityFlag::Si => "SI",
            ActivityFlag::No => "NO",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == ActivityFlag::Si
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "SI" => Some(ActivityFlag::Si),
            "NO" => Some(ActivityFlag::No),
            _ => None,
        }
    }
}

/// How available the client is for a follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "BASSA")]
    Bassa,
    #[default]
    #[serde(rename = "MEDIA")]
    Media,
    #[serde(rename = "ALTA")]
    Alta,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Bassa => "BASSA",
            Availability::Media => "MEDIA",
            Availability::Alta => "ALTA",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "BASSA" => Some(Availability::Bassa),
            "MEDIA" => Some(Availability::Media),
            "ALTA" => Some(Availability::Alta),
            _ => None,
        }
    }
}

/// Main service the client is interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MainInterest {
    #[default]
    #[serde(rename = "SCOMMESSE")]
    Scommesse,
    #[serde(rename = "UTENZE")]
    Utenze,
    #[serde(rename = "ENTRAMBI")]
    Entrambi,
}

impl MainInterest {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainInterest::Scommesse => "SCOMMESSE",
            MainInterest::Utenze => "UTENZE",
            MainInterest::Entrambi => "ENTRAMBI",
        }
    }

    /// Label printed on the sheet. Betting is sold as "PVR".
    pub fn display_label(&self) -> &'static str {
        match self {
            MainInterest::Scommesse => "PVR",
            other => other.as_str(),
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "SCOMMESSE" => Some(MainInterest::Scommesse),
            "UTENZE" => Some(MainInterest::Utenze),
            "ENTRAMBI" => Some(MainInterest::Entrambi),
            _ => None,
        }
    }
}

/// Whether the operator drew a signature or typed their name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    Draw,
    #[default]
    Type,
}

impl SignatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureType::Draw => "draw",
            SignatureType::Type => "type",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "DRAW" => Some(SignatureType::Draw),
            "TYPE" => Some(SignatureType::Type),
            _ => None,
        }
    }
}

// ============================================================================
// Images
// ============================================================================

/// Encoded image as handed over by the UI: a `data:` URL or bare base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(pub String);

impl ImagePayload {
    pub fn new(data: impl Into<String>) -> Self {
        ImagePayload(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Source pixel dimensions of a logo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogoDimensions {
    pub width: f32,
    pub height: f32,
}

impl LogoDimensions {
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A logo is only usable with both its payload and its dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub payload: ImagePayload,
    pub dimensions: LogoDimensions,
}

impl Logo {
    /// Pair a payload with its dimensions; `None` unless both are usable.
    pub fn from_parts(payload: Option<ImagePayload>, dimensions: Option<LogoDimensions>) -> Option<Logo> {
        match (payload, dimensions) {
            (Some(payload), Some(dimensions)) if !payload.is_empty() && dimensions.is_valid() => {
                Some(Logo { payload, dimensions })
            }
            _ => None,
        }
    }
}

// ============================================================================
// Canonical Record
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ConsultingRecord {
    // Identity
    pub business_name: String,
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub phone: String,
    pub email: String,
    pub source: String,

    // Service
    pub availability: Availability,
    pub main_interest: MainInterest,
    pub betting_active: ActivityFlag,
    pub utilities_active: ActivityFlag,
    pub betting_partners: Vec<String>,
    pub utility_partners: Vec<String>,

    // Notes
    pub requests: String,
    pub notes: String,

    // Assignment
    pub assigned_consultant: String,

    // Signature
    pub signature_type: SignatureType,
    pub signature_data: String,
    pub operator_name: String,

    // Branding
    pub logo: Option<Logo>,
}

pub const DEFAULT_SOURCE: &str = "TELEFONO";

impl Default for ConsultingRecord {
    fn default() -> Self {
        ConsultingRecord {
            business_name: String::new(),
            full_name: String::new(),
            address: String::new(),
            city: String::new(),
            province: String::new(),
            phone: String::new(),
            email: String::new(),
            source: DEFAULT_SOURCE.to_string(),
            availability: Availability::default(),
            main_interest: MainInterest::default(),
            betting_active: ActivityFlag::default(),
            utilities_active: ActivityFlag::default(),
            betting_partners: Vec::new(),
            utility_partners: Vec::new(),
            requests: String::new(),
            notes: String::new(),
            assigned_consultant: String::new(),
            signature_type: SignatureType::default(),
            signature_data: String::new(),
            operator_name: String::new(),
            logo: None,
        }
    }
}

impl ConsultingRecord {
    /// Partners to print under the betting column, if any.
    pub fn visible_betting_partners(&self) -> Option<&[String]> {
        visible_partners(self.betting_active, &self.betting_partners)
    }

    /// Partners to print under the utilities column, if any.
    pub fn visible_utility_partners(&self) -> Option<&[String]> {
        visible_partners(self.utilities_active, &self.utility_partners)
    }

    /// Build the canonical record from one raw JSON object.
    ///
    /// Each field prefers its camelCase key, then its snake_case key, then
    /// the field default. Empty strings count as missing.
    pub fn from_value(raw: &Value) -> Result<Self, AppError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| AppError::RecordError(format!("expected a JSON object, found {}", kind_of(raw))))?;

        let full_name = text(obj, "fullName", "full_name");

        let availability = wire_enum(obj, "availability", "availability", "availability", Availability::from_wire);
        let main_interest = wire_enum(obj, "mainInterest", "main_interest", "main interest", MainInterest::from_wire);
        let betting_active = wire_enum(obj, "bettingActive", "betting_active", "betting flag", ActivityFlag::from_wire);
        let utilities_active =
            wire_enum(obj, "utilitiesActive", "utilities_active", "utilities flag", ActivityFlag::from_wire);
        let signature_type =
            wire_enum(obj, "signatureType", "signature_type", "signature type", SignatureType::from_wire);

        let source = text(obj, "source", "source");

        let logo_payload = text(obj, "logo", "logo");
        let logo_payload = (!logo_payload.is_empty()).then(|| ImagePayload(logo_payload));
        let logo_dimensions = lookup(obj, "logoDimensions", "logo_dimensions").and_then(decode_dimensions);
        let has_payload = logo_payload.is_some();
        let logo = Logo::from_parts(logo_payload, logo_dimensions);
        if has_payload && logo.is_none() {
            log::debug!("Record '{}': logo without usable dimensions, skipping it", full_name);
        }

        Ok(ConsultingRecord {
            business_name: text(obj, "businessName", "business_name"),
            full_name,
            address: text(obj, "address", "address"),
            city: text(obj, "city", "city"),
            province: text(obj, "province", "province"),
            phone: text(obj, "phone", "phone"),
            email: text(obj, "email", "email"),
            source: if source.is_empty() { DEFAULT_SOURCE.to_string() } else { source },
            availability,
            main_interest,
            betting_active,
            utilities_active,
            betting_partners: decode_partner_list(lookup(obj, "bettingPartners", "betting_partners")),
            utility_partners: decode_partner_list(lookup(obj, "utilityPartners", "utility_partners")),
            requests: text(obj, "requests", "requests"),
            notes: text(obj, "notes", "notes"),
            assigned_consultant: text(obj, "assignedConsultant", "assigned_consultant"),
            signature_type,
            signature_data: text(obj, "signatureData", "signature_data"),
            operator_name: text(obj, "operatorName", "operator_name"),
            logo,
        })
    }
}

fn visible_partners(flag: ActivityFlag, partners: &[String]) -> Option<&[String]> {
    if flag.is_active() && !partners.is_empty() {
        Some(partners)
    } else {
        None
    }
}

/// Normalize record-store input: one object or an array of objects.
pub fn normalize_records(raw: &Value) -> Result<Vec<ConsultingRecord>, AppError> {
    match raw {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                ConsultingRecord::from_value(item)
                    .map_err(|e| AppError::RecordError(format!("record #{}: {}", i + 1, e)))
            })
            .collect(),
        Value::Object(_) => Ok(vec![ConsultingRecord::from_value(raw)?]),
        other => Err(AppError::RecordError(format!(
            "expected a record object or an array of records, found {}",
            kind_of(other)
        ))),
    }
}

/// Decode a partner list that may arrive already parsed or JSON-encoded.
///
/// Never fails: anything that does not decode to a list yields an empty list.
pub fn decode_partner_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => list_of_strings(&items),
            Ok(other) => {
                log::warn!("Partner list decoded to {}, using an empty list", kind_of(&other));
                Vec::new()
            }
            Err(e) => {
                log::warn!("Malformed partner list {:?}: {}", encoded, e);
                Vec::new()
            }
        },
        Some(Value::Array(items)) => list_of_strings(items),
        _ => Vec::new(),
    }
}

// ============================================================================
// Raw Field Access
// ============================================================================

/// First key (camelCase, then snake_case) whose value is not "empty".
fn lookup<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    [camel, snake]
        .into_iter()
        .filter_map(|key| obj.get(key))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, camel: &str, snake: &str) -> String {
    [camel, snake]
        .into_iter()
        .filter_map(|key| obj.get(key))
        .filter(|value| is_present(value))
        .find_map(scalar_text)
        .unwrap_or_default()
}

fn wire_enum<T: Default>(
    obj: &Map<String, Value>,
    camel: &str,
    snake: &str,
    what: &str,
    parse: fn(&str) -> Option<T>,
) -> T {
    let raw = text(obj, camel, snake);
    if raw.trim().is_empty() {
        return T::default();
    }
    parse(&raw.trim().to_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown {} value {:?}, using the default", what, raw);
        T::default()
    })
}

fn list_of_strings(items: &[Value]) -> Vec<String> {
    items.iter().filter_map(scalar_text).collect()
}

fn decode_dimensions(value: &Value) -> Option<LogoDimensions> {
    let decoded = match value {
        Value::String(encoded) => serde_json::from_str::<LogoDimensions>(encoded).ok(),
        other => serde_json::from_value::<LogoDimensions>(other.clone()).ok(),
    };
    decoded.filter(LogoDimensions::is_valid)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Batch Input
// ============================================================================

/// One record or an ordered batch of records
#[derive(Debug, Clone)]
pub enum Records {
    Single(ConsultingRecord),
    Batch(Vec<ConsultingRecord>),
}

impl Records {
    pub fn into_vec(self) -> Vec<ConsultingRecord> {
        match self {
            Records::Single(record) => vec![record],
            Records::Batch(records) => records,
        }
    }
}

impl From<ConsultingRecord> for Records {
    fn from(record: ConsultingRecord) -> Self {
        Records::Single(record)
    }
}

impl From<Vec<ConsultingRecord>> for Records {
    fn from(records: Vec<ConsultingRecord>) -> Self {
        Records::Batch(records)
    }
}
