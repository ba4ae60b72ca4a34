//! Quotation data model
//!
//! Plain value types: customer details, line items and the whole-document
//! aggregate. Everything here is cheap to clone; the wizard replaces whole
//! values instead of mutating them through shared references.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Datelike, Duration, Local};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An uploaded image (logo or signature).
///
/// The payload and its display URL live in the same value, so a customer can
/// never carry one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime_type: String,
    bytes: Vec<u8>,
    data_url: String,
}

impl ImageAttachment {
    /// Build an attachment and derive its `data:` URL.
    ///
    /// Size and type checks happen in the customer step; this constructor
    /// only pairs the bytes with their URL.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(&bytes));
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
            data_url,
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL back into an attachment.
    pub fn from_data_url(file_name: impl Into<String>, data_url: &str) -> Option<Self> {
        let rest = data_url.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        let bytes = STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(file_name, mime, bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct AttachmentRepr {
    file_name: String,
    data_url: String,
}

impl Serialize for ImageAttachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        AttachmentRepr {
            file_name: self.file_name.clone(),
            data_url: self.data_url.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImageAttachment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = AttachmentRepr::deserialize(deserializer)?;
        ImageAttachment::from_data_url(repr.file_name, &repr.data_url)
            .ok_or_else(|| serde::de::Error::custom("attachment data_url must be a base64 data URL"))
    }
}

/// Customer block of a quotation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    /// Required before leaving the first step
    pub customer_name: String,
    /// Empty string means "not set"
    pub company_name: String,
    pub logo: Option<ImageAttachment>,
    pub signature: Option<ImageAttachment>,
}

impl CustomerInfo {
    pub fn has_name(&self) -> bool {
        !self.customer_name.is_empty()
    }
}

/// One priced entry of a quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationItem {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
}

pub fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl QuotationItem {
    /// A blank item as the add dialog opens it: quantity 1, price 0.
    pub fn blank() -> Self {
        Self {
            id: new_item_id(),
            name: String::new(),
            description: String::new(),
            quantity: 1,
            unit_price: 0.0,
        }
    }

    pub fn new(name: impl Into<String>, quantity: i64, unit_price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_price,
            ..Self::blank()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Whether the item may be saved: non-empty name, positive quantity and price
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && self.quantity > 0 && self.unit_price > 0.0
    }

    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Sum of `quantity × unit_price` over `items`
pub fn grand_total(items: &[QuotationItem]) -> f64 {
    items.iter().map(QuotationItem::total).sum()
}

/// The whole quotation being assembled by the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationDocument {
    pub customer_info: CustomerInfo,
    pub items: Vec<QuotationItem>,
    pub notes: String,
    pub quotation_number: String,
    pub creation_date: DateTime<Local>,
    pub valid_until: DateTime<Local>,
}

impl QuotationDocument {
    /// Fresh, empty document stamped with the current time.
    pub fn new(validity_days: u32) -> Self {
        Self::created_at(Local::now(), validity_days, &mut rand::thread_rng())
    }

    /// Fresh document for an explicit creation time and random source.
    pub fn created_at<R: Rng + ?Sized>(now: DateTime<Local>, validity_days: u32, rng: &mut R) -> Self {
        Self {
            customer_info: CustomerInfo::default(),
            items: Vec::new(),
            notes: String::new(),
            quotation_number: quotation_number_at(&now, rng),
            creation_date: now,
            valid_until: now + Duration::days(i64::from(validity_days)),
        }
    }

    pub fn grand_total(&self) -> f64 {
        grand_total(&self.items)
    }
}

/// `QT-YYMM-RRR` for the given generation time.
///
/// RRR is uniform in `[0, 999]`; numbers are not guaranteed to be unique.
pub fn quotation_number_at<Tz: chrono::TimeZone, R: Rng + ?Sized>(now: &DateTime<Tz>, rng: &mut R) -> String {
    let year = now.year().rem_euclid(100);
    let month = now.month();
    let random: u32 = rng.gen_range(0..1000);
    format!("QT-{:02}{:02}-{:03}", year, month, random)
}

/// `QT-YYMM-RRR` for the current local time
pub fn generate_quotation_number() -> String {
    quotation_number_at(&Local::now(), &mut rand::thread_rng())
}
