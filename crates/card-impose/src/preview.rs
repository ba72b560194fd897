//! Preview rendering
//!
//! Renders a single physical page as low-quality vector markup for the
//! interactive view, reusing the export drawing path so previews match the
//! final document exactly. A revision-keyed cache joins concurrent
//! requests for the same page and lets callers prefetch neighbors.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use crate::export::{
    AverageBorderSampler, DrawContext, ImageStore, draw_records, sample_border_colors,
};
use crate::layout::paginate;
use crate::options::LayoutOptions;
use crate::render::{Quality, RenderAdapter, SvgRenderer};
use crate::types::{BindingMode, DeckState, PageRecord, PageSide};
use crate::{ImposeError, Result};

/// Render one physical page of the imposed deck as an SVG document.
///
/// `page_index` counts printed sheets, so a fold-in-half face and its back
/// land on the same index. Fails with [`ImposeError::NoContent`] for an
/// empty deck.
pub async fn render_preview_page(
    deck: &DeckState,
    opts: &LayoutOptions,
    store: &dyn ImageStore,
    page_index: usize,
) -> Result<String> {
    let records = paginate(deck, opts);
    if records.is_empty() {
        return Err(ImposeError::NoContent);
    }

    let pages = physical_pages(&records, opts);
    let Some(indices) = pages.get(page_index) else {
        return Err(ImposeError::Config(format!(
            "page {page_index} out of range ({} pages)",
            pages.len()
        )));
    };

    let subset: Vec<PageRecord> = indices.iter().map(|&i| records[i].clone()).collect();
    let face_total = records.iter().filter(|r| r.side == PageSide::Face).count();
    let face_offset = records[..indices[0]]
        .iter()
        .filter(|r| r.side == PageSide::Face)
        .count();

    let colors = if opts.margin_fill {
        sample_border_colors(&subset, store, Arc::new(AverageBorderSampler)).await?
    } else {
        HashMap::new()
    };

    let mut adapter = SvgRenderer::new(opts, Quality::Low, true);
    let ctx = DrawContext {
        opts,
        store,
        colors: &colors,
        face_total,
        face_offset,
    };
    draw_records(&mut adapter, &subset, &ctx, None)?;
    adapter.finalize().await?;
    Ok(adapter.pages().swap_remove(0))
}

/// Group record indices by the printed sheet they land on
fn physical_pages(records: &[PageRecord], opts: &LayoutOptions) -> Vec<Vec<usize>> {
    let mut pages: Vec<Vec<usize>> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let shares_page =
            record.side == PageSide::Back && opts.binding == BindingMode::FoldInHalf;
        if index == 0 || !shares_page {
            pages.push(Vec::new());
        }
        pages.last_mut().unwrap().push(index);
    }
    pages
}

/// Cache of rendered preview pages keyed by (deck revision, page index).
///
/// Concurrent requests for the same page share one in-flight render; a
/// revision bump (any deck or layout edit) invalidates by changing the
/// key, with `invalidate` available for explicit cleanup.
#[derive(Default)]
pub struct PreviewCache {
    entries: Mutex<HashMap<(u64, usize), Arc<OnceCell<String>>>>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached page, or render it once and cache the result.
    /// Failed renders leave the cell empty so a later call can retry.
    pub async fn get_or_render<F, Fut>(
        &self,
        revision: u64,
        page_index: usize,
        render: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry((revision, page_index)).or_default().clone()
        };
        let value = cell.get_or_try_init(render).await?;
        Ok(value.clone())
    }

    /// Kick off a background render so the page is warm when requested
    pub fn prefetch<F, Fut>(self: &Arc<Self>, revision: u64, page_index: usize, render: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = cache.get_or_render(revision, page_index, render).await {
                log::debug!("preview prefetch for page {page_index} failed: {err}");
            }
        });
    }

    pub async fn invalidate(&self) {
        self.entries.lock().await.clear();
    }
}
