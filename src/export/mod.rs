//! Export pipeline: turns a rendered document view into downloadable files.
//!
//! A PDF export mounts an off-screen clone of the view, waits for images to
//! settle, rasterizes the clone and wraps the bitmap in a one-page A4 PDF.
//! The clone is released on every exit path, including errors and a dropped
//! future. Word export needs no rendering and wraps the markup directly.

pub mod download;
pub mod offscreen;
pub mod pdf;
pub mod word;

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use log::error;
use tokio::sync::Mutex;

use crate::rendering::{paint, BitmapRasterizer, CaptureTarget, Rasterizer};
use crate::steps::DocumentView;
use crate::{Error, ExportConfig, Result};

pub use download::{Artifact, DirectorySink, DownloadSink, MemorySink};
pub use offscreen::{OffscreenClone, OffscreenStyle, RenderHost};

pub struct ExportPipeline {
    config: ExportConfig,
    host: RenderHost,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn DownloadSink>,
    // Held for the whole export when `serialize_exports` is set
    gate: Mutex<()>,
}

impl ExportPipeline {
    pub fn new(config: ExportConfig, sink: Arc<dyn DownloadSink>) -> Self {
        Self {
            config,
            host: RenderHost::new(),
            rasterizer: Arc::new(BitmapRasterizer),
            sink,
            gate: Mutex::new(()),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_host(mut self, host: RenderHost) -> Self {
        self.host = host;
        self
    }

    pub fn host(&self) -> &RenderHost {
        &self.host
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Capture `view` and save it as `Quotation-<number>.pdf`.
    pub async fn export_pdf(&self, view: &DocumentView) -> Result<Artifact> {
        let _permit = if self.config.serialize_exports {
            Some(self.gate.lock().await)
        } else {
            None
        };
        self.render_pdf(view).await.map_err(|e| {
            error!("PDF export of {} failed: {}", view.quotation_number, e);
            e
        })
    }

    async fn render_pdf(&self, view: &DocumentView) -> Result<Artifact> {
        let style = OffscreenStyle::from(&self.config);
        let clone = self.host.mount_offscreen(view, &style);

        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let target = CaptureTarget {
            html: clone.html().to_string(),
            window_width: self.config.page_width_px,
            padding: self.config.padding_px,
            scale: self.config.scale,
            background: paint::WHITE,
            allow_cross_origin: self.config.allow_cross_origin,
            // Anything below the single page would be clipped by the PDF anyway
            max_height: Some(pdf::page_height_px(self.config.page_width_px)),
        };
        let rasterizer = Arc::clone(&self.rasterizer);
        let bitmap = tokio::task::spawn_blocking(move || rasterizer.rasterize(&target))
            .await
            .map_err(|e| Error::Render(format!("rasterizer task failed: {}", e)))??;
        drop(clone);

        let title = format!("Quotation {}", view.quotation_number);
        let bytes = pdf::encode_single_image_pdf(&bitmap, &title, &Local::now())?;
        let artifact = Artifact::pdf(&view.quotation_number, bytes);
        self.sink.save(&artifact)?;
        Ok(artifact)
    }

    /// Save `view` as a Word-readable `Quotation-<number>.doc`.
    pub async fn export_word(&self, view: &DocumentView) -> Result<Artifact> {
        let artifact = Artifact::word(&view.quotation_number, word::word_document(view));
        match self.sink.save(&artifact) {
            Ok(_) => Ok(artifact),
            Err(e) => {
                error!("Word export of {} failed: {}", view.quotation_number, e);
                Err(e)
            }
        }
    }
}
