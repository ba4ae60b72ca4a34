//! Quotation Wizard
//!
//! A three-step wizard that collects customer details and line items and
//! renders a printable business quotation, with PDF and Word exports and
//! simulated e-mail / WhatsApp delivery.
//!
//! # Features
//!
//! - **Wizard**: customer info, items and preview steps with required-field
//!   validation between them
//! - **Export** (default): off-screen capture of the rendered document into a
//!   single-page A4 PDF, or a Word-readable HTML document
//! - **Delivery stubs**: simulated latency, `wa.me` deep links
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quotation_wizard::{DirectorySink, QuotationItem, QuotationSession, SystemOpener, WizardConfig};
//!
//! # async fn run() -> quotation_wizard::Result<()> {
//! let session = QuotationSession::new(
//!     WizardConfig::default(),
//!     Arc::new(DirectorySink::new(".")),
//!     Box::new(SystemOpener),
//! );
//! session.with_wizard(|w| {
//!     let step = quotation_wizard::CustomerInfoStep::new(5 * 1024 * 1024);
//!     let info = step.set_customer_name(&w.document().customer_info, "Acme");
//!     w.update_customer(info);
//!     w.update_items(vec![QuotationItem::new("Widget", 3, 100.0)], String::new());
//! });
//! session.advance()?;
//! session.advance()?;
//! let artifact = session.export_pdf().await?;
//! println!("saved {}", artifact.file_name);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result, UploadError, ValidationError};

pub mod delivery;
pub mod format;
pub mod model;
pub mod session;
pub mod steps;
pub mod wizard;

// Layout / paint / raster pipeline used by the PDF export
#[cfg(feature = "export")]
pub mod rendering;

#[cfg(feature = "export")]
pub mod export;

pub use delivery::{DeliveryReceipt, DeliveryStub, LinkOpener, RecordingOpener, SystemOpener};
#[cfg(feature = "export")]
pub use export::{Artifact, DirectorySink, DownloadSink, ExportPipeline, MemorySink};
pub use model::{CustomerInfo, ImageAttachment, QuotationDocument, QuotationItem};
pub use session::QuotationSession;
pub use steps::{CustomerInfoStep, DocumentView, ItemDialog, PreviewStep};
pub use wizard::{Notice, NoticeVariant, Step, Wizard};

/// Configuration for a quotation session
///
/// Loaded from JSON by the CLI; every field is optional there and falls back
/// to the defaults below.
///
/// # Examples
///
/// ```
/// let cfg = quotation_wizard::WizardConfig::default();
/// assert_eq!(cfg.currency, "EGP");
/// assert_eq!(cfg.validity_days, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Currency code shown next to amounts
    pub currency: String,
    /// Days between creation and the "valid until" date
    pub validity_days: u32,
    /// Largest accepted logo / signature upload
    pub max_upload_bytes: usize,
    /// Simulated latency of the delivery stubs in milliseconds
    pub delivery_delay_ms: u64,
    pub export: ExportConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            currency: "EGP".to_string(),
            validity_days: 7,
            max_upload_bytes: 5 * 1024 * 1024,
            delivery_delay_ms: 1500,
            export: ExportConfig::default(),
        }
    }
}

impl WizardConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: WizardConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.validity_days == 0 {
            return Err(Error::Config("validity_days must be at least 1".into()));
        }
        if self.export.page_width_px == 0 {
            return Err(Error::Config("export.page_width_px must be non-zero".into()));
        }
        if self.export.scale == 0 {
            return Err(Error::Config("export.scale must be non-zero".into()));
        }
        Ok(())
    }
}

/// Off-screen capture settings for PDF export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Width of the off-screen container (A4 at 96 DPI)
    pub page_width_px: u32,
    pub padding_px: u32,
    /// Device pixels per CSS pixel
    pub scale: u32,
    /// Wait before capturing, so images can finish loading
    pub settle_delay_ms: u64,
    pub allow_cross_origin: bool,
    /// Run at most one PDF export at a time
    pub serialize_exports: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            page_width_px: 794,
            padding_px: 40,
            scale: 2,
            settle_delay_ms: 500,
            allow_cross_origin: true,
            serialize_exports: true,
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 794,
            height: 1123,
        }
    }
}
