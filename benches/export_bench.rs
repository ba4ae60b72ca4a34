use criterion::{criterion_group, criterion_main, Criterion};

// Run with:
//    cargo bench --bench export_bench

#[cfg(feature = "export")]
fn bench_capture_and_encode(c: &mut Criterion) {
    use chrono::Local;
    use quotation_wizard::export::pdf::encode_single_image_pdf;
    use quotation_wizard::model::{QuotationDocument, QuotationItem};
    use quotation_wizard::rendering::{capture, paint, CaptureTarget};
    use quotation_wizard::PreviewStep;

    let mut doc = QuotationDocument::new(7);
    doc.customer_info.customer_name = "Acme".into();
    doc.items = (1..=20)
        .map(|i| QuotationItem::new(format!("Item {}", i), i, 10.0 * i as f64))
        .collect();
    let view = PreviewStep::new("EGP").render(&doc);
    let target = CaptureTarget {
        html: view.html,
        window_width: 794,
        padding: 40,
        scale: 2,
        background: paint::WHITE,
        allow_cross_origin: true,
        max_height: None,
    };

    c.bench_function("capture_quotation", |b| {
        b.iter(|| capture(&target).unwrap());
    });

    let bitmap = capture(&target).unwrap();
    let now = Local::now();
    c.bench_function("encode_pdf", |b| {
        b.iter(|| encode_single_image_pdf(&bitmap, "Quotation", &now).unwrap());
    });
}

#[cfg(not(feature = "export"))]
fn bench_capture_and_encode(_c: &mut Criterion) {}

criterion_group!(benches, bench_capture_and_encode);
criterion_main!(benches);
