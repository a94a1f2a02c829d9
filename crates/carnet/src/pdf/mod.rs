//! PDF report assembly.
//!
//! The report is built the way a person would print the logbook: show a
//! page, wait for it to settle, take a snapshot, move on. Thirteen pages,
//! strictly in order, whatever the record contains.

pub mod document;

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

pub use document::PdfDocument;

use crate::app::AppState;
use crate::backup;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::PlacementRecord;
use crate::render::Rasterizer;
use crate::view::PAGE_COUNT;

/// Label used when the record has no surname.
const FALLBACK_LABEL: &str = "Eleve";

/// Options for one export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Pause between switching page and taking the snapshot.
    pub settle_delay: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl ExportOptions {
    /// Options from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle_delay: config.settle_delay(),
        }
    }
}

/// Suggested report label: `Rapport_Stage_<surname>`.
#[must_use]
pub fn default_pdf_name(record: &PlacementRecord) -> String {
    let surname = if record.surname.is_empty() {
        FALLBACK_LABEL
    } else {
        record.surname.as_str()
    };
    format!("Rapport_Stage_{surname}")
}

/// Capture every page of the active record into a PDF document.
///
/// The export flag of `state` is raised for the duration of the run and
/// lowered when it ends, whether it succeeded or not. The page on screen is
/// left on the last page.
///
/// # Errors
///
/// Returns the first rasterization or PDF error; no partial document is
/// returned.
pub async fn assemble_pdf(
    state: &mut AppState,
    rasterizer: &dyn Rasterizer,
    options: ExportOptions,
) -> Result<PdfDocument> {
    state.begin_export();
    let result = capture_pages(state, rasterizer, options).await;
    state.finish_export();

    if let Err(e) = &result {
        warn!("PDF export aborted: {}", e);
    }
    result
}

async fn capture_pages(
    state: &mut AppState,
    rasterizer: &dyn Rasterizer,
    options: ExportOptions,
) -> Result<PdfDocument> {
    let mut pdf = PdfDocument::new();

    for index in 0..PAGE_COUNT {
        state.go_to_page(index);
        tokio::time::sleep(options.settle_delay).await;

        let view = state.view();
        let image = rasterizer
            .rasterize(&view)
            .await
            .map_err(|e| match e {
                e @ Error::Rasterize { .. } => e,
                other => Error::rasterize(index, other.to_string()),
            })?;
        pdf.add_page(&image)?;
        debug!(
            "Captured page {}/{} with {} rasterizer",
            index + 1,
            PAGE_COUNT,
            rasterizer.name()
        );
    }

    Ok(pdf)
}

/// Assemble the report and write it to `dir` as `CarnetDeStage_<label>.pdf`.
///
/// # Errors
///
/// Returns an error if assembly fails or the file cannot be written.
pub async fn export_pdf(
    state: &mut AppState,
    rasterizer: &dyn Rasterizer,
    options: ExportOptions,
    dir: &Path,
    label: &str,
) -> Result<PathBuf> {
    let pdf = assemble_pdf(state, rasterizer, options).await?;

    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let path = dir.join(backup::file_name(label, "pdf"));
    pdf.save(&path)?;

    info!(
        "Wrote {} page report for {} to {}",
        pdf.page_count(),
        state.record().display_name(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PageRasterizer, RasterImage};
    use crate::view::{PageView, LAST_PAGE};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on one page, records the pages it saw.
    struct FlakyRasterizer {
        fail_on: usize,
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Rasterizer for FlakyRasterizer {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn rasterize(&self, view: &PageView<'_>) -> Result<RasterImage> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if view.index == self.fail_on {
                return Err(Error::EncodedImage("canvas lost".to_string()));
            }
            PageRasterizer::new(10, 30).rasterize(view).await
        }
    }

    fn options() -> ExportOptions {
        ExportOptions {
            settle_delay: Duration::from_millis(1000),
        }
    }

    #[test]
    fn test_default_pdf_name() {
        let mut record = PlacementRecord::new();
        assert_eq!(default_pdf_name(&record), "Rapport_Stage_Eleve");
        record.surname = "Lefèvre".to_string();
        assert_eq!(default_pdf_name(&record), "Rapport_Stage_Lefèvre");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_record_yields_thirteen_pages() {
        let mut state = AppState::default();
        let rasterizer = PageRasterizer::new(10, 30);

        let pdf = assemble_pdf(&mut state, &rasterizer, options()).await.unwrap();
        assert_eq!(pdf.page_count(), 13);

        let loaded = lopdf::Document::load_mem(&pdf.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.get_pages().len(), 13);
        assert!(!state.generating());
        assert_eq!(state.current_page(), LAST_PAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_rasterizer_aborts_export() {
        let mut state = AppState::default();
        let rasterizer = FlakyRasterizer {
            fail_on: 4,
            seen: AtomicUsize::new(0),
        };

        let err = assemble_pdf(&mut state, &rasterizer, options())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Rasterize { page: 4, .. }));
        assert_eq!(rasterizer.seen.load(Ordering::SeqCst), 5);
        assert!(!state.generating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_is_applied_per_page() {
        let mut state = AppState::default();
        let rasterizer = PageRasterizer::new(10, 30);
        let started = tokio::time::Instant::now();

        assemble_pdf(&mut state, &rasterizer, options()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(13 * 1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cover_page_carries_identity_text() {
        let mut state = AppState::default();
        state.set_surname("Girard");
        let config = Config::default();
        let rasterizer = PageRasterizer::from_config(&config.pdf);

        let pdf = assemble_pdf(&mut state, &rasterizer, ExportOptions::from_config(&config))
            .await
            .unwrap();

        let loaded = lopdf::Document::load_mem(&pdf.to_bytes().unwrap()).unwrap();
        let cover = loaded.get_pages()[&1];
        let content = loaded.get_page_content(cover).unwrap();
        assert!(content.windows(8).any(|w| w == b"(Girard)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_pdf_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.set_surname("Masson");
        let rasterizer = PageRasterizer::new(10, 30);

        let label = default_pdf_name(state.record());
        let path = export_pdf(&mut state, &rasterizer, options(), dir.path(), &label)
            .await
            .unwrap();

        assert_eq!(
            path.file_name().unwrap(),
            "CarnetDeStage_Rapport_Stage_Masson.pdf"
        );
        let loaded = lopdf::Document::load(&path).unwrap();
        assert_eq!(loaded.get_pages().len(), 13);
    }
}
