#![cfg(feature = "export")]

use std::sync::Arc;

use quotation_wizard::steps::{ItemDialog, MoveDirection};
use quotation_wizard::{
    Error, MemorySink, NoticeVariant, QuotationItem, QuotationSession, RecordingOpener, Step, ValidationError,
    WizardConfig,
};

fn quick_config() -> WizardConfig {
    let mut config = WizardConfig::default();
    config.delivery_delay_ms = 0;
    config.export.settle_delay_ms = 0;
    config.export.scale = 1;
    config
}

fn session_with(sink: Arc<MemorySink>) -> QuotationSession {
    QuotationSession::new(quick_config(), sink, Box::new(RecordingOpener::new()))
}

fn is_quotation_number(n: &str) -> bool {
    let b = n.as_bytes();
    n.len() == 11 && n.starts_with("QT-") && b[7] == b'-' && n[3..7].bytes().chain(n[8..].bytes()).all(|c| c.is_ascii_digit())
}

#[tokio::test]
async fn end_to_end_acme_widget() {
    let sink = Arc::new(MemorySink::new());
    let session = session_with(sink.clone());

    // Step 0 needs a customer name
    let err = session.advance().unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::MissingCustomerName)));
    let notices = session.drain_notices();
    assert_eq!(notices[0].title, "Missing information");
    assert_eq!(notices[0].description, "Please enter customer name");
    assert_eq!(notices[0].variant, NoticeVariant::Destructive);

    session.with_wizard(|w| {
        let info = quotation_wizard::CustomerInfoStep::new(1024).set_customer_name(&w.document().customer_info, "Acme");
        w.update_customer(info);
    });
    assert_eq!(session.advance().unwrap(), Step::Items);

    // Step 1 needs an item
    assert!(matches!(
        session.advance(),
        Err(Error::Validation(ValidationError::NoItems))
    ));
    assert_eq!(session.drain_notices()[0].description, "Please add at least one item");

    let mut dialog = ItemDialog::new();
    dialog.open_add();
    dialog.set_name("Widget");
    dialog.set_quantity(3);
    dialog.set_unit_price(100.0);
    let items = dialog.save(&session.snapshot().items).unwrap();
    assert!(!dialog.is_open());
    session.with_wizard(|w| w.update_items(items, String::new()));
    assert_eq!(session.advance().unwrap(), Step::Preview);

    let view = session.render_view();
    assert!(view.html.contains("Acme"));
    assert!(view.html.contains("300 EGP"));

    let artifact = session.export_pdf().await.unwrap();
    let number = session.snapshot().quotation_number;
    assert!(is_quotation_number(&number), "bad number {}", number);
    assert_eq!(artifact.file_name, format!("Quotation-{}.pdf", number));
    assert!(artifact.bytes.starts_with(b"%PDF"));
    assert_eq!(session.pipeline().host().mounted_count(), 0);
    assert_eq!(sink.artifacts().len(), 1);
}

#[test]
fn retreat_is_blocked_only_on_first_step() {
    let session = session_with(Arc::new(MemorySink::new()));
    assert!(matches!(session.retreat(), Err(Error::Navigation(_))));
    assert_eq!(session.step(), Step::CustomerInfo);

    session.with_wizard(|w| {
        let mut info = w.document().customer_info.clone();
        info.customer_name = "Acme".into();
        w.update_customer(info);
    });
    session.advance().unwrap();
    // clearing the name does not block going back
    session.with_wizard(|w| w.update_customer(Default::default()));
    assert_eq!(session.retreat().unwrap(), Step::CustomerInfo);
}

#[test]
fn advance_is_refused_while_submitting() {
    let session = session_with(Arc::new(MemorySink::new()));
    session.with_wizard(|w| {
        let mut info = w.document().customer_info.clone();
        info.customer_name = "Acme".into();
        w.update_customer(info);
        w.set_submitting(true);
    });
    assert!(matches!(session.advance(), Err(Error::Navigation(_))));
    assert_eq!(session.step(), Step::CustomerInfo);
}

#[test]
fn reorder_keeps_ids_and_total() {
    let session = session_with(Arc::new(MemorySink::new()));
    let items = vec![
        QuotationItem::new("A", 1, 10.0),
        QuotationItem::new("B", 2, 20.0),
        QuotationItem::new("C", 3, 30.0),
    ];
    let before = quotation_wizard::model::grand_total(&items);
    let moved = quotation_wizard::steps::move_item(&items, 2, MoveDirection::Up);
    assert_eq!(
        moved.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        vec!["A", "C", "B"]
    );
    assert_eq!(moved[1].id, items[2].id);
    session.with_wizard(|w| w.update_items(moved, String::new()));
    assert_eq!(session.snapshot().grand_total(), before);
}

#[test]
fn reset_starts_a_new_quotation() {
    let session = session_with(Arc::new(MemorySink::new()));
    session.with_wizard(|w| w.update_items(vec![QuotationItem::new("A", 1, 1.0)], "n".into()));
    session.reset();
    let doc = session.snapshot();
    assert!(doc.items.is_empty());
    assert!(doc.notes.is_empty());
    assert_eq!(session.step(), Step::CustomerInfo);
}
