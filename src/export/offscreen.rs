//! Off-screen render host.
//!
//! Exports capture a clone of the document view mounted outside the visible
//! area at a fixed width, so the result does not depend on the terminal or
//! window the preview was shown in. The clone is owned by an
//! [`OffscreenClone`] guard and unmounted when the guard is dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::steps::DocumentView;
use crate::ExportConfig;

/// Inline style applied to the off-screen container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffscreenStyle {
    pub width_px: u32,
    pub padding_px: u32,
    pub left_px: i32,
    pub top_px: i32,
    pub background: String,
}

impl OffscreenStyle {
    pub fn to_css(&self) -> String {
        format!(
            "width:{}px;padding:{}px;position:absolute;left:{}px;top:{}px;background-color:{}",
            self.width_px, self.padding_px, self.left_px, self.top_px, self.background
        )
    }
}

impl From<&ExportConfig> for OffscreenStyle {
    fn from(config: &ExportConfig) -> Self {
        Self {
            width_px: config.page_width_px,
            padding_px: config.padding_px,
            left_px: -9999,
            top_px: -9999,
            background: "white".to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct HostState {
    next_id: u64,
    mounted: Vec<(u64, String)>,
}

/// The shared insertion point clones are mounted into
#[derive(Debug, Clone, Default)]
pub struct RenderHost {
    state: Arc<Mutex<HostState>>,
}

impl RenderHost {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock must not stop later guards from cleaning up
    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mount a styled clone of `view` and return the guard that owns it.
    pub fn mount_offscreen(&self, view: &DocumentView, style: &OffscreenStyle) -> OffscreenClone {
        let html = format!(r#"<div class="offscreen-clone" style="{}">{}</div>"#, style.to_css(), view.html);
        let id = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.mounted.push((id, html.clone()));
            id
        };
        debug!("mounted off-screen clone #{} for {}", id, view.quotation_number);
        OffscreenClone {
            host: self.clone(),
            id,
            html,
            style: style.clone(),
        }
    }

    pub fn mounted_count(&self) -> usize {
        self.lock().mounted.len()
    }

    pub fn mounted_ids(&self) -> Vec<u64> {
        self.lock().mounted.iter().map(|(id, _)| *id).collect()
    }

    fn unmount(&self, id: u64) {
        let mut state = self.lock();
        state.mounted.retain(|(mounted, _)| *mounted != id);
    }
}

/// A mounted clone; unmounted on drop, whatever path the export took.
#[derive(Debug)]
pub struct OffscreenClone {
    host: RenderHost,
    id: u64,
    html: String,
    style: OffscreenStyle,
}

impl OffscreenClone {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Markup of the container and the cloned subtree
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn style(&self) -> &OffscreenStyle {
        &self.style
    }
}

impl Drop for OffscreenClone {
    fn drop(&mut self) {
        self.host.unmount(self.id);
        debug!("removed off-screen clone #{}", self.id);
    }
}
