//! A quotation session: the wizard plus everything that acts on its document.
//!
//! The wizard lives behind a `std::sync::Mutex` that is only held for short
//! synchronous sections, never across an `.await`. Deliveries flag the wizard
//! as submitting for their whole duration through [`SubmittingGuard`].

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::delivery::{DeliveryReceipt, DeliveryStub, LinkOpener};
use crate::error::{Error, Result, ValidationError};
use crate::model::QuotationDocument;
use crate::steps::{CustomerInfoStep, DocumentView, PreviewStep};
use crate::wizard::{Notice, Step, Wizard};
use crate::WizardConfig;

#[cfg(feature = "export")]
use crate::export::{Artifact, DownloadSink, ExportPipeline};
#[cfg(feature = "export")]
use log::debug;

/// Sets `is_submitting` on creation and clears it on drop.
struct SubmittingGuard {
    wizard: Arc<Mutex<Wizard>>,
}

impl SubmittingGuard {
    fn begin(wizard: &Arc<Mutex<Wizard>>) -> Self {
        lock(wizard).set_submitting(true);
        Self {
            wizard: Arc::clone(wizard),
        }
    }
}

impl Drop for SubmittingGuard {
    fn drop(&mut self) {
        lock(&self.wizard).set_submitting(false);
    }
}

fn lock(wizard: &Mutex<Wizard>) -> MutexGuard<'_, Wizard> {
    wizard.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct QuotationSession {
    config: WizardConfig,
    wizard: Arc<Mutex<Wizard>>,
    customer_step: CustomerInfoStep,
    preview: PreviewStep,
    delivery: DeliveryStub,
    #[cfg(feature = "export")]
    pipeline: ExportPipeline,
}

impl QuotationSession {
    #[cfg(feature = "export")]
    pub fn new(config: WizardConfig, sink: Arc<dyn DownloadSink>, opener: Box<dyn LinkOpener>) -> Self {
        let pipeline = ExportPipeline::new(config.export.clone(), sink);
        Self::build(config, opener, pipeline)
    }

    #[cfg(feature = "export")]
    pub fn with_pipeline(config: WizardConfig, pipeline: ExportPipeline, opener: Box<dyn LinkOpener>) -> Self {
        Self::build(config, opener, pipeline)
    }

    #[cfg(feature = "export")]
    fn build(config: WizardConfig, opener: Box<dyn LinkOpener>, pipeline: ExportPipeline) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(Wizard::new(config.validity_days))),
            customer_step: CustomerInfoStep::new(config.max_upload_bytes),
            preview: PreviewStep::new(config.currency.clone()),
            delivery: DeliveryStub::new(Duration::from_millis(config.delivery_delay_ms), opener),
            pipeline,
            config,
        }
    }

    #[cfg(not(feature = "export"))]
    pub fn new(config: WizardConfig, opener: Box<dyn LinkOpener>) -> Self {
        Self {
            wizard: Arc::new(Mutex::new(Wizard::new(config.validity_days))),
            customer_step: CustomerInfoStep::new(config.max_upload_bytes),
            preview: PreviewStep::new(config.currency.clone()),
            delivery: DeliveryStub::new(Duration::from_millis(config.delivery_delay_ms), opener),
            config,
        }
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn customer_step(&self) -> &CustomerInfoStep {
        &self.customer_step
    }

    #[cfg(feature = "export")]
    pub fn pipeline(&self) -> &ExportPipeline {
        &self.pipeline
    }

    /// Run `f` with exclusive access to the wizard.
    pub fn with_wizard<T>(&self, f: impl FnOnce(&mut Wizard) -> T) -> T {
        f(&mut lock(&self.wizard))
    }

    pub fn step(&self) -> Step {
        self.with_wizard(|w| w.step())
    }

    pub fn is_submitting(&self) -> bool {
        self.with_wizard(|w| w.is_submitting())
    }

    pub fn advance(&self) -> Result<Step> {
        self.with_wizard(|w| w.advance())
    }

    pub fn retreat(&self) -> Result<Step> {
        self.with_wizard(|w| w.retreat())
    }

    pub fn snapshot(&self) -> QuotationDocument {
        self.with_wizard(|w| w.snapshot())
    }

    pub fn reset(&self) {
        self.with_wizard(|w| w.reset())
    }

    pub fn push_notice(&self, notice: Notice) {
        self.with_wizard(|w| w.push_notice(notice))
    }

    pub fn drain_notices(&self) -> Vec<Notice> {
        self.with_wizard(|w| w.drain_notices())
    }

    /// Preview markup for the current document
    pub fn render_view(&self) -> DocumentView {
        self.preview.render(&self.snapshot())
    }

    pub fn render_text(&self) -> String {
        self.preview.render_text(&self.snapshot())
    }

    fn reject(&self, err: ValidationError) -> Error {
        self.push_notice(Notice::from(&err));
        err.into()
    }

    pub async fn send_email(&self, address: &str) -> Result<DeliveryReceipt> {
        if address.is_empty() {
            return Err(self.reject(ValidationError::MissingEmail));
        }
        let _submitting = SubmittingGuard::begin(&self.wizard);
        let receipt = self.delivery.send_email(address).await?;
        self.push_notice(Notice::info(
            "Quotation sent",
            format!("Quotation has been sent to {}", receipt.destination),
        ));
        Ok(receipt)
    }

    pub async fn send_whatsapp(&self, phone: &str) -> Result<DeliveryReceipt> {
        if phone.is_empty() {
            return Err(self.reject(ValidationError::MissingPhoneNumber));
        }
        let number = self.with_wizard(|w| w.document().quotation_number.clone());
        let _submitting = SubmittingGuard::begin(&self.wizard);
        let receipt = self.delivery.send_whatsapp(phone, &number).await?;
        self.push_notice(Notice::info(
            "WhatsApp opened",
            "Quotation message has been prepared for WhatsApp",
        ));
        Ok(receipt)
    }

    #[cfg(feature = "export")]
    pub async fn export_pdf(&self) -> Result<Artifact> {
        let view = self.render_view();
        debug!("exporting {} as PDF", view.quotation_number);
        let result = self.pipeline.export_pdf(&view).await;
        self.notify_export_failure(&result);
        result
    }

    #[cfg(feature = "export")]
    pub async fn export_word(&self) -> Result<Artifact> {
        let view = self.render_view();
        debug!("exporting {} as Word", view.quotation_number);
        let result = self.pipeline.export_word(&view).await;
        self.notify_export_failure(&result);
        result
    }

    #[cfg(feature = "export")]
    fn notify_export_failure(&self, result: &Result<Artifact>) {
        if let Err(e) = result {
            self.push_notice(Notice::destructive("Export failed", e.to_string()));
        }
    }
}

#[cfg(all(test, feature = "export"))]
mod tests {
    use super::*;
    use crate::delivery::RecordingOpener;
    use crate::export::MemorySink;
    use crate::model::QuotationItem;
    use crate::wizard::NoticeVariant;

    fn session() -> QuotationSession {
        let mut config = WizardConfig::default();
        config.delivery_delay_ms = 0;
        config.export.settle_delay_ms = 0;
        QuotationSession::new(config, Arc::new(MemorySink::new()), Box::new(RecordingOpener::new()))
    }

    #[tokio::test]
    async fn blank_email_pushes_notice() {
        let s = session();
        let err = s.send_email("").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingEmail)));
        let notices = s.drain_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, "Missing email");
        assert_eq!(notices[0].variant, NoticeVariant::Destructive);
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn email_success_clears_submitting() {
        let s = session();
        let receipt = s.send_email("buyer@example.com").await.unwrap();
        assert_eq!(receipt.destination, "buyer@example.com");
        assert!(!s.is_submitting());
        let notices = s.drain_notices();
        assert_eq!(notices[0].title, "Quotation sent");
        assert_eq!(notices[0].description, "Quotation has been sent to buyer@example.com");
    }

    #[tokio::test]
    async fn whatsapp_uses_current_quotation_number() {
        let s = session();
        let number = s.snapshot().quotation_number;
        let receipt = s.send_whatsapp("+20 100").await.unwrap();
        assert!(receipt.link.unwrap().ends_with(&number));
        assert_eq!(s.drain_notices()[0].title, "WhatsApp opened");
    }

    #[test]
    fn view_reflects_wizard_updates() {
        let s = session();
        s.with_wizard(|w| w.update_items(vec![QuotationItem::new("Widget", 3, 100.0)], String::new()));
        assert!(s.render_view().html.contains("Widget"));
        assert!(s.render_text().contains("Widget"));
    }
}
