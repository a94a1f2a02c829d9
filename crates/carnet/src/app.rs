//! Application state.
//!
//! [`AppState`] is the one mutable object of a session: the record being
//! edited, the page on screen, the menu/export flags and the snapshot of
//! the saved collection. Every edit is a direct field replacement on the
//! active record.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backup;
use crate::error::{Error, Result};
use crate::record::{EncodedImage, EvalOption, PlacementRecord, RecordId};
use crate::storage::RecordStore;
use crate::view::{self, PageView, LAST_PAGE};

/// Warning shown before the active record is discarded.
pub const NEW_RECORD_WARNING: &str =
    "Voulez-vous vraiment créer un nouveau carnet ? Pensez à sauvegarder l'actuel !";

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The active record was written to the local store.
    Saved,
    /// A backup file was written.
    BackupWritten(PathBuf),
    /// A backup file replaced the active record.
    Imported,
    /// A backup file could not be read; nothing changed.
    ImportFailed,
    /// The PDF report was written.
    PdfWritten(PathBuf),
    /// The day already holds two photos.
    PhotoLimitReached,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "✔️ Progression enregistrée sur l'appareil !"),
            Self::BackupWritten(_) => write!(f, "Fichier de sauvegarde généré !"),
            Self::Imported => write!(f, "✔️ Données importées avec succès !"),
            Self::ImportFailed => write!(
                f,
                "Erreur lors de l'importation. Le fichier est peut-être corrompu."
            ),
            Self::PdfWritten(_) => write!(
                f,
                "✨ Votre PDF a été généré et envoyé vers vos téléchargements !"
            ),
            Self::PhotoLimitReached => write!(f, "Deux photos maximum par jour."),
        }
    }
}

/// State of one editing session.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    record: PlacementRecord,
    current_page: usize,
    menu_open: bool,
    generating: bool,
    saved: Vec<PlacementRecord>,
}

impl AppState {
    /// Start a session on `record` with an empty saved collection.
    #[must_use]
    pub fn new(record: PlacementRecord) -> Self {
        Self {
            record,
            ..Self::default()
        }
    }

    /// Start a session on a fresh record, with the saved collection read
    /// from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    pub fn from_store(store: &RecordStore) -> Result<Self> {
        let saved = store.load_all()?;
        debug!("Loaded {} saved records", saved.len());
        Ok(Self {
            saved,
            ..Self::default()
        })
    }

    /// The active record.
    #[must_use]
    pub fn record(&self) -> &PlacementRecord {
        &self.record
    }

    /// Index of the page on screen, 0..=12.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Whether the menu is open.
    #[must_use]
    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    /// Whether a PDF export is running.
    #[must_use]
    pub fn generating(&self) -> bool {
        self.generating
    }

    /// Snapshot of the saved collection.
    #[must_use]
    pub fn saved(&self) -> &[PlacementRecord] {
        &self.saved
    }

    /// View of the page on screen.
    #[must_use]
    pub fn view(&self) -> PageView<'_> {
        view::render(&self.record, self.current_page)
    }

    // Navigation

    /// Move forward one page, stopping at the last.
    pub fn next_page(&mut self) {
        self.go_to_page(self.current_page.saturating_add(1));
    }

    /// Move back one page, stopping at the cover.
    pub fn previous_page(&mut self) {
        self.go_to_page(self.current_page.saturating_sub(1));
    }

    /// Jump to `index`, clamped to the last page.
    pub fn go_to_page(&mut self, index: usize) {
        self.current_page = index.min(LAST_PAGE);
    }

    /// Open or close the menu.
    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    // Identity

    /// Set the family name.
    pub fn set_surname(&mut self, value: impl Into<String>) {
        self.record.surname = value.into();
    }

    /// Set the given name.
    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.record.first_name = value.into();
    }

    /// Set or clear the start date.
    pub fn set_start_date(&mut self, value: Option<NaiveDate>) {
        self.record.start_date = value;
    }

    /// Set or clear the end date.
    pub fn set_end_date(&mut self, value: Option<NaiveDate>) {
        self.record.end_date = value;
    }

    /// Set the placement location.
    pub fn set_location(&mut self, value: impl Into<String>) {
        self.record.location = value.into();
    }

    // Journal

    /// Replace the description of `day` (1..=10).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for an unknown day.
    pub fn set_description(&mut self, day: usize, text: impl Into<String>) -> Result<()> {
        self.record.entry_mut(day)?.description = text.into();
        Ok(())
    }

    /// Attach a photo to `day`. A day that already holds two photos is left
    /// unchanged and [`Notice::PhotoLimitReached`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for an unknown day.
    pub fn add_photo(&mut self, day: usize, photo: EncodedImage) -> Result<Option<Notice>> {
        if self.record.entry_mut(day)?.add_photo(photo) {
            Ok(None)
        } else {
            debug!("Day {} already has two photos", day);
            Ok(Some(Notice::PhotoLimitReached))
        }
    }

    /// Detach photo `position` (0-based) from `day`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for an unknown day or position.
    pub fn remove_photo(&mut self, day: usize, position: usize) -> Result<EncodedImage> {
        let entry = self.record.entry_mut(day)?;
        let count = entry.photos.len();
        entry.remove_photo(position).ok_or_else(|| {
            Error::out_of_range("photo", position, 0, count.saturating_sub(1))
        })
    }

    /// Select `option` for evaluation point `point` (0..=18).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for an unknown point.
    pub fn set_evaluation(&mut self, point: usize, option: EvalOption) -> Result<()> {
        self.record.set_evaluation(point, option)
    }

    /// Answer review prompt `prompt_id` (20..=28).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] for an unknown prompt.
    pub fn set_comment(&mut self, prompt_id: usize, text: impl Into<String>) -> Result<()> {
        self.record.set_comment(prompt_id, text)
    }

    // Record lifecycle

    /// Discard the active record for a blank one and return to the cover.
    pub fn new_record(&mut self) {
        self.record = PlacementRecord::new();
        self.current_page = 0;
        self.menu_open = false;
        info!("Started record {}", self.record.id);
    }

    /// Make the saved record `id` active and return to the cover.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if the snapshot has no such record.
    pub fn open_record(&mut self, id: &RecordId) -> Result<()> {
        let record = self
            .saved
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| Error::RecordNotFound { id: id.to_string() })?;
        self.record = record;
        self.current_page = 0;
        self.menu_open = false;
        Ok(())
    }

    /// Replace the active record wholesale.
    pub fn replace_record(&mut self, record: PlacementRecord) {
        self.record = record;
        self.menu_open = false;
    }

    /// Replace the active record with the backup at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Import`] if the file is unusable. The active record
    /// is untouched in that case.
    pub fn import_backup(&mut self, path: &Path) -> Result<Notice> {
        let record = backup::import(path)?;
        info!("Imported record {} from {}", record.id, path.display());
        self.replace_record(record);
        Ok(Notice::Imported)
    }

    /// Write the active record to a backup file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export_backup(&self, dir: &Path, label: &str) -> Result<Notice> {
        let path = backup::export(&self.record, dir, label)?;
        Ok(Notice::BackupWritten(path))
    }

    /// Save the active record to `store` and refresh the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn save(&mut self, store: &RecordStore) -> Result<Notice> {
        let outcome = store.save(&self.record)?;
        match self.saved.iter_mut().find(|r| r.id == self.record.id) {
            Some(existing) => existing.clone_from(&self.record),
            None => self.saved.push(self.record.clone()),
        }
        debug!("Saved record {} ({:?})", self.record.id, outcome);
        Ok(Notice::Saved)
    }

    /// Raise the export flag.
    pub(crate) fn begin_export(&mut self) {
        self.generating = true;
    }

    /// Lower the export flag.
    pub(crate) fn finish_export(&mut self) {
        self.generating = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_1X1: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

    fn photo() -> EncodedImage {
        EncodedImage::from_data_url(PNG_1X1).unwrap()
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut state = AppState::default();
        state.previous_page();
        assert_eq!(state.current_page(), 0);

        for _ in 0..20 {
            state.next_page();
        }
        assert_eq!(state.current_page(), LAST_PAGE);

        state.go_to_page(5);
        assert_eq!(state.current_page(), 5);
        state.go_to_page(400);
        assert_eq!(state.current_page(), 12);
    }

    #[test]
    fn test_third_photo_is_a_no_op() {
        let mut state = AppState::default();
        assert_eq!(state.add_photo(3, photo()).unwrap(), None);
        assert_eq!(state.add_photo(3, photo()).unwrap(), None);
        assert_eq!(
            state.add_photo(3, photo()).unwrap(),
            Some(Notice::PhotoLimitReached)
        );
        assert_eq!(state.record().entries[2].photos.len(), 2);
    }

    #[test]
    fn test_remove_photo() {
        let mut state = AppState::default();
        state.add_photo(1, photo()).unwrap();

        assert!(state.remove_photo(1, 1).is_err());
        assert_eq!(state.remove_photo(1, 0).unwrap(), photo());
        assert!(state.record().entries[0].photos.is_empty());
    }

    #[test]
    fn test_edits_reject_unknown_targets() {
        let mut state = AppState::default();
        assert!(state.set_description(0, "x").is_err());
        assert!(state.set_description(11, "x").is_err());
        assert!(state.set_evaluation(19, EvalOption::Jamais).is_err());
        assert!(state.set_comment(19, "x").is_err());
        assert!(state.add_photo(11, photo()).is_err());
    }

    #[test]
    fn test_identity_setters() {
        let mut state = AppState::default();
        state.set_surname("Petit");
        state.set_first_name("Lina");
        state.set_location("Atelier Morel");
        state.set_start_date(NaiveDate::from_ymd_opt(2024, 9, 2));

        let record = state.record();
        assert_eq!(record.surname, "Petit");
        assert_eq!(record.first_name, "Lina");
        assert_eq!(record.location, "Atelier Morel");
        assert_eq!(record.start_date, NaiveDate::from_ymd_opt(2024, 9, 2));
        assert_eq!(record.end_date, None);
    }

    #[test]
    fn test_new_record_resets_session() {
        let mut state = AppState::default();
        state.set_surname("Petit");
        state.go_to_page(7);
        state.toggle_menu();

        state.new_record();
        assert_eq!(state.record().surname, "");
        assert_eq!(state.current_page(), 0);
        assert!(!state.menu_open());
    }

    #[test]
    fn test_save_then_open() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut state = AppState::from_store(&store).unwrap();
        state.set_surname("Roux");
        let id = state.record().id.clone();

        assert_eq!(state.save(&store).unwrap(), Notice::Saved);
        state.set_surname("Roux-Martin");
        state.save(&store).unwrap();
        assert_eq!(state.saved().len(), 1);
        assert_eq!(state.saved()[0].surname, "Roux-Martin");
        assert_eq!(store.count().unwrap(), 1);

        state.new_record();
        state.go_to_page(4);
        state.open_record(&id).unwrap();
        assert_eq!(state.record().surname, "Roux-Martin");
        assert_eq!(state.current_page(), 0);

        let reloaded = AppState::from_store(&store).unwrap();
        assert_eq!(reloaded.saved().len(), 1);
    }

    #[test]
    fn test_open_unknown_record() {
        let mut state = AppState::default();
        let err = state.open_record(&RecordId::from("42")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_failed_import_leaves_record_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrompu.json");
        std::fs::write(&path, "pas du json").unwrap();

        let mut state = AppState::default();
        state.set_surname("Garnier");
        let before = state.record().clone();

        let err = state.import_backup(&path).unwrap_err();
        assert!(err.is_import_error());
        assert_eq!(state.record(), &before);
    }

    #[test]
    fn test_export_then_import_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::default();
        state.set_surname("Garnier");
        state.set_description(2, "Ponçage des portes").unwrap();
        let exported = state.record().clone();

        let Notice::BackupWritten(path) = state.export_backup(dir.path(), "Garnier").unwrap()
        else {
            panic!("expected a backup notice");
        };

        state.new_record();
        state.toggle_menu();
        assert_eq!(state.import_backup(&path).unwrap(), Notice::Imported);
        assert_eq!(state.record(), &exported);
        assert!(!state.menu_open());
    }

    #[test]
    fn test_view_follows_current_page() {
        let mut state = AppState::default();
        state.go_to_page(11);
        assert_eq!(state.view().index, 11);
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(
            Notice::ImportFailed.to_string(),
            "Erreur lors de l'importation. Le fichier est peut-être corrompu."
        );
        assert!(Notice::Saved.to_string().contains("Progression enregistrée"));
    }
}
