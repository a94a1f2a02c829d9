//! `carnet` - Work-placement logbook with PDF export
//!
//! This library provides the logbook data model, local persistence of the
//! saved logbooks, JSON backups, page views and the PDF report assembled
//! from rasterized pages.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod backup;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pdf;
pub mod record;
pub mod render;
pub mod storage;
pub mod view;

pub use app::{AppState, Notice};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use pdf::{assemble_pdf, export_pdf, ExportOptions, PdfDocument};
pub use record::{DayEntry, EncodedImage, EvalOption, PlacementRecord, RecordId};
pub use render::{PageRasterizer, RasterImage, Rasterizer};
pub use storage::{RecordStore, SaveOutcome, StoreStats};
pub use view::{PageView, PAGE_COUNT};
