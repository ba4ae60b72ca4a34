//! Delivery stubs for e-mail and WhatsApp.
//!
//! Neither channel talks to a real service. E-mail only simulates latency;
//! WhatsApp builds a `wa.me` deep link and hands it to a [`LinkOpener`]
//! without waiting to see whether anything opened it.

use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use log::{info, warn};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::error::{Error, Result, ValidationError};

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// `https://wa.me/<digits>?text=<message>` for the given number
pub fn whatsapp_link(phone: &str, quotation_number: &str) -> Result<String> {
    let message = format!("Here's your quotation {}", quotation_number);
    let link = format!("https://wa.me/{}?text={}", digits_only(phone), encode_uri_component(&message));
    // Url would normalise the query, so it only validates here
    Url::parse(&link).map_err(|e| Error::Other(format!("invalid WhatsApp link: {}", e)))?;
    Ok(link)
}

/// The destination as entered, or the validation error when it is empty
pub fn require_destination(value: &str, missing: ValidationError) -> Result<String> {
    if value.is_empty() {
        return Err(missing.into());
    }
    Ok(value.to_string())
}

/// Opens a deep link in something that can handle it
pub trait LinkOpener: Send + Sync {
    fn open(&self, link: &str) -> Result<()>;
}

/// Hands links to the desktop's default handler
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, link: &str) -> Result<()> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", "", link]);
            c
        } else if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(link);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(link);
            c
        };
        // fire and forget; the child is never waited on
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        cmd.spawn()?;
        Ok(())
    }
}

/// Remembers every link instead of opening it
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, link: &str) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| Error::Other("recording opener lock poisoned".into()))?
            .push(link.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    Email,
    WhatsApp,
}

/// What a successful send reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub channel: Channel,
    pub destination: String,
    /// The deep link handed to the opener, for WhatsApp
    pub link: Option<String>,
}

pub struct DeliveryStub {
    delay: Duration,
    opener: Box<dyn LinkOpener>,
}

impl DeliveryStub {
    pub fn new(delay: Duration, opener: Box<dyn LinkOpener>) -> Self {
        Self { delay, opener }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Simulate sending the quotation to `address`.
    pub async fn send_email(&self, address: &str) -> Result<DeliveryReceipt> {
        let address = require_destination(address, ValidationError::MissingEmail)?;
        tokio::time::sleep(self.delay).await;
        info!("quotation e-mailed to {} (simulated)", address);
        Ok(DeliveryReceipt {
            channel: Channel::Email,
            destination: address,
            link: None,
        })
    }

    /// Prepare a WhatsApp message for `phone` and open it.
    pub async fn send_whatsapp(&self, phone: &str, quotation_number: &str) -> Result<DeliveryReceipt> {
        let phone = require_destination(phone, ValidationError::MissingPhoneNumber)?;
        tokio::time::sleep(self.delay).await;
        let link = whatsapp_link(&phone, quotation_number)?;
        if let Err(e) = self.opener.open(&link) {
            warn!("could not open {}: {}", link, e);
        }
        info!("WhatsApp message prepared for {}", phone);
        Ok(DeliveryReceipt {
            channel: Channel::WhatsApp,
            destination: phone,
            link: Some(link),
        })
    }
}
