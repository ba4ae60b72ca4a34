//! Wizard controller: the single owner of the quotation being built.
//!
//! The document is only ever replaced wholesale (`update_customer`,
//! `update_items`), and readers get immutable snapshots.

use log::{debug, info};

use crate::error::{Error, Result, ValidationError};
use crate::model::{CustomerInfo, QuotationDocument, QuotationItem};

/// The three wizard steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    CustomerInfo,
    Items,
    Preview,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::CustomerInfo, Step::Items, Step::Preview];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Step> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::CustomerInfo => "Customer Information",
            Step::Items => "Quotation Items",
            Step::Preview => "Preview & Send",
        }
    }

    pub fn is_first(self) -> bool {
        self == Step::CustomerInfo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Info,
    Destructive,
}

/// A transient user-facing message (the terminal's toast)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Info,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }
}

impl From<&ValidationError> for Notice {
    fn from(err: &ValidationError) -> Self {
        Notice::destructive(err.title(), err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Wizard {
    document: QuotationDocument,
    step: Step,
    is_submitting: bool,
    notices: Vec<Notice>,
    validity_days: u32,
}

impl Wizard {
    pub fn new(validity_days: u32) -> Self {
        Self::with_document(QuotationDocument::new(validity_days), validity_days)
    }

    pub fn with_document(document: QuotationDocument, validity_days: u32) -> Self {
        debug!("wizard started for {}", document.quotation_number);
        Self {
            document,
            step: Step::CustomerInfo,
            is_submitting: false,
            notices: Vec::new(),
            validity_days,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn document(&self) -> &QuotationDocument {
        &self.document
    }

    /// An owned copy of the current document
    pub fn snapshot(&self) -> QuotationDocument {
        self.document.clone()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.is_submitting = submitting;
    }

    /// Fraction of the progress bar filled for the current step
    pub fn progress(&self) -> f64 {
        self.step.index() as f64 / (Step::ALL.len() - 1) as f64
    }

    /// Validity predicate of the active step
    pub fn validate_step(&self) -> std::result::Result<(), ValidationError> {
        match self.step {
            Step::CustomerInfo if !self.document.customer_info.has_name() => {
                Err(ValidationError::MissingCustomerName)
            }
            Step::Items if self.document.items.is_empty() => Err(ValidationError::NoItems),
            _ => Ok(()),
        }
    }

    /// Move to the next step if the current one is valid.
    ///
    /// Refused while a submission is in flight. On the last step this is a
    /// no-op that still succeeds.
    pub fn advance(&mut self) -> Result<Step> {
        if self.is_submitting {
            return Err(Error::Navigation("a submission is in progress".into()));
        }
        if let Err(err) = self.validate_step() {
            debug!("advance from {:?} refused: {}", self.step, err);
            self.notices.push(Notice::from(&err));
            return Err(err.into());
        }
        let next = Step::from_index(self.step.index() + 1).unwrap_or(self.step);
        if next != self.step {
            debug!("step {:?} -> {:?}", self.step, next);
        }
        self.step = next;
        Ok(next)
    }

    /// Move back one step. Only refused on the first step.
    pub fn retreat(&mut self) -> Result<Step> {
        if self.step.is_first() {
            return Err(Error::Navigation("already on the first step".into()));
        }
        let prev = Step::from_index(self.step.index() - 1).unwrap_or(Step::CustomerInfo);
        debug!("step {:?} -> {:?}", self.step, prev);
        self.step = prev;
        Ok(prev)
    }

    pub fn update_customer(&mut self, customer_info: CustomerInfo) {
        self.document = QuotationDocument {
            customer_info,
            ..self.document.clone()
        };
    }

    pub fn update_items(&mut self, items: Vec<QuotationItem>, notes: String) {
        self.document = QuotationDocument {
            items,
            notes,
            ..self.document.clone()
        };
    }

    /// Discard the current document and start over on the first step.
    pub fn reset(&mut self) {
        info!("discarding quotation {}", self.document.quotation_number);
        *self = Wizard::new(self.validity_days);
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
