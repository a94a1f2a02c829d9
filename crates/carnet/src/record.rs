//! Core logbook types for carnet.
//!
//! This module defines the placement record, its ten daily entries, the
//! fixed self-evaluation catalogue and the inline photo encoding.
//!
//! The serialized field names follow the backup format (`nom`, `dateDebut`,
//! `evalComments`, ...) so files written by older versions import unchanged.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of daily entries in every record.
pub const DAY_COUNT: usize = 10;

/// Maximum number of photos attached to one day.
pub const MAX_PHOTOS_PER_DAY: usize = 2;

/// Date format used for identity dates, on the wire and on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The fixed self-assessment statements, addressed by index (0..=18).
pub const EVAL_POINTS: [&str; 19] = [
    "J’ai une présentation correcte",
    "Je respecte les horaires",
    "Je tiens compte des conseils et des remarques",
    "Je demande des explications",
    "Je suis poli et courtois",
    "Je fais l’effort pour m’intégrer facilement dans l’équipe",
    "J’adapte mon comportement à la situation",
    "Je me montre intéressé",
    "J’applique les consignes",
    "Je me mets rapidement au travail",
    "J’accomplis mon travail dans un temps imparti",
    "Je suis capable de réaliser une tâche seul",
    "Je travaille avec soin",
    "Je travaille avec précision",
    "Je termine le travail commencé",
    "Je suis capable d’auto-évaluer mon travail",
    "Je respecte les règles de l’entreprise",
    "Je trie et évacue les déchets",
    "Je respecte les règles de sécurité et d’hygiène",
];

/// A free-text prompt of the final review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPrompt {
    /// Stable prompt id (20..=28).
    pub id: u8,
    /// Prompt text shown above the answer.
    pub label: &'static str,
}

/// The fixed final-review prompts.
pub const REVIEW_PROMPTS: [ReviewPrompt; 9] = [
    ReviewPrompt { id: 20, label: "Mes points forts sont :" },
    ReviewPrompt { id: 21, label: "Mes difficultés sont :" },
    ReviewPrompt { id: 22, label: "Ce que je dois absolument améliorer :" },
    ReviewPrompt { id: 23, label: "Ce que j'ai découvert :" },
    ReviewPrompt { id: 24, label: "Ce qui m'a surpris :" },
    ReviewPrompt { id: 25, label: "Ce que j'ai appris :" },
    ReviewPrompt { id: 26, label: "J'ai été déçu par :" },
    ReviewPrompt { id: 27, label: "J'ai particulièrement apprécié :" },
    ReviewPrompt { id: 28, label: "J'aimerais travailler dans cette entreprise parce que :" },
];

const FIRST_PROMPT_ID: u8 = 20;
const LAST_PROMPT_ID: u8 = 28;

/// Answer to one evaluation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvalOption {
    /// Always.
    Toujours,
    /// Often.
    Souvent,
    /// Sometimes.
    Parfois,
    /// Never.
    Jamais,
}

impl EvalOption {
    /// All options in display order.
    pub const ALL: [Self; 4] = [Self::Toujours, Self::Souvent, Self::Parfois, Self::Jamais];

    /// The label shown to the student.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Toujours => "Toujours",
            Self::Souvent => "Souvent",
            Self::Parfois => "Parfois",
            Self::Jamais => "Jamais",
        }
    }
}

impl fmt::Display for EvalOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EvalOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|option| option.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown option '{s}', expected one of Toujours, Souvent, Parfois, Jamais")
            })
    }
}

/// Identifier of a placement record: its creation time in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generate an id from the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self(Utc::now().timestamp_millis().to_string())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A photo stored inline as a `data:<mime>;base64,<payload>` URL.
///
/// Images are immutable once attached; the value is only ever replaced
/// or removed as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Encode raw image bytes, sniffing the mime type from the content.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a recognised image format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)?;
        Ok(Self(format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            STANDARD.encode(bytes)
        )))
    }

    /// Wrap an existing data URL after checking its shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a base64 data URL.
    pub fn from_data_url(url: impl Into<String>) -> Result<Self> {
        let encoded = Self(url.into());
        encoded.split()?;
        Ok(encoded)
    }

    /// The full data URL.
    #[must_use]
    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// The declared mime type, if the URL is well formed.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.split().ok().map(|(mime, _)| mime)
    }

    /// Decode the payload back into raw image bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the payload is not base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, payload) = self.split()?;
        STANDARD
            .decode(payload)
            .map_err(|e| Error::EncodedImage(e.to_string()))
    }

    fn split(&self) -> Result<(&str, &str)> {
        let rest = self
            .0
            .strip_prefix("data:")
            .ok_or_else(|| Error::EncodedImage("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::EncodedImage("missing payload separator".to_string()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::EncodedImage("payload is not base64".to_string()))?;
        Ok((mime, payload))
    }
}

/// One daily journal page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayEntry {
    /// Day number, 1..=10.
    #[serde(rename = "id")]
    pub index: u8,
    /// Free-form date text carried by backups. Page labels are computed
    /// from the start date instead.
    #[serde(default)]
    pub date: String,
    /// What the student did that day.
    #[serde(default)]
    pub description: String,
    /// Attached photos, at most [`MAX_PHOTOS_PER_DAY`].
    #[serde(default)]
    pub photos: Vec<EncodedImage>,
}

impl DayEntry {
    /// Create an empty entry for the given day number.
    #[must_use]
    pub fn new(index: u8) -> Self {
        Self {
            index,
            date: String::new(),
            description: String::new(),
            photos: Vec::new(),
        }
    }

    /// Attach a photo. Returns `false` and leaves the entry unchanged when
    /// it already holds the maximum number of photos.
    pub fn add_photo(&mut self, photo: EncodedImage) -> bool {
        if self.photos.len() >= MAX_PHOTOS_PER_DAY {
            return false;
        }
        self.photos.push(photo);
        true
    }

    /// Remove the photo at `position`, if there is one.
    pub fn remove_photo(&mut self, position: usize) -> Option<EncodedImage> {
        (position < self.photos.len()).then(|| self.photos.remove(position))
    }

    /// Whether another photo can be attached.
    #[must_use]
    pub fn has_photo_slot(&self) -> bool {
        self.photos.len() < MAX_PHOTOS_PER_DAY
    }
}

/// The full logbook for one work placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Creation-time identifier; the storage key.
    pub id: RecordId,
    /// Family name.
    #[serde(rename = "nom", default)]
    pub surname: String,
    /// Given name.
    #[serde(rename = "prenom", default)]
    pub first_name: String,
    /// First day of the placement.
    #[serde(rename = "dateDebut", default, with = "blank_date")]
    pub start_date: Option<NaiveDate>,
    /// Last day of the placement.
    #[serde(rename = "dateFin", default, with = "blank_date")]
    pub end_date: Option<NaiveDate>,
    /// Where the placement takes place.
    #[serde(rename = "lieu", default)]
    pub location: String,
    /// Exactly [`DAY_COUNT`] daily entries, day 1 first.
    pub entries: [DayEntry; DAY_COUNT],
    /// Evaluation point index -> selected option.
    #[serde(default)]
    pub evaluation: BTreeMap<u8, EvalOption>,
    /// Review prompt id -> free-text answer.
    #[serde(rename = "evalComments", default)]
    pub comments: BTreeMap<u8, String>,
}

impl Default for PlacementRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementRecord {
    /// Create a blank record with a freshly generated id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(RecordId::generate())
    }

    /// Create a blank record with the given id.
    #[must_use]
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id,
            surname: String::new(),
            first_name: String::new(),
            start_date: None,
            end_date: None,
            location: String::new(),
            entries: std::array::from_fn(|i| DayEntry::new(day_number(i))),
            evaluation: BTreeMap::new(),
            comments: BTreeMap::new(),
        }
    }

    /// Borrow the entry for day `day` (1..=10).
    ///
    /// # Errors
    ///
    /// Returns an error if `day` is outside 1..=10.
    pub fn entry(&self, day: usize) -> Result<&DayEntry> {
        check_day(day)?;
        Ok(&self.entries[day - 1])
    }

    /// Mutably borrow the entry for day `day` (1..=10).
    ///
    /// # Errors
    ///
    /// Returns an error if `day` is outside 1..=10.
    pub fn entry_mut(&mut self, day: usize) -> Result<&mut DayEntry> {
        check_day(day)?;
        Ok(&mut self.entries[day - 1])
    }

    /// Select an option for evaluation point `point` (0..=18).
    ///
    /// # Errors
    ///
    /// Returns an error if `point` does not name an evaluation statement.
    pub fn set_evaluation(&mut self, point: usize, option: EvalOption) -> Result<()> {
        let key = eval_key(point)?;
        self.evaluation.insert(key, option);
        Ok(())
    }

    /// The option selected for `point`, if any.
    #[must_use]
    pub fn evaluation_for(&self, point: usize) -> Option<EvalOption> {
        u8::try_from(point)
            .ok()
            .and_then(|key| self.evaluation.get(&key).copied())
    }

    /// Store the answer to review prompt `prompt_id` (20..=28).
    ///
    /// # Errors
    ///
    /// Returns an error if `prompt_id` is not a review prompt.
    pub fn set_comment(&mut self, prompt_id: usize, text: impl Into<String>) -> Result<()> {
        let key = prompt_key(prompt_id)?;
        self.comments.insert(key, text.into());
        Ok(())
    }

    /// The answer to `prompt_id`, or an empty string.
    #[must_use]
    pub fn comment(&self, prompt_id: u8) -> &str {
        self.comments.get(&prompt_id).map_or("", String::as_str)
    }

    /// Name shown in record listings.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.surname.is_empty() {
            "Utilisateur"
        } else {
            &self.surname
        }
    }

    /// Total number of photos across all days.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.entries.iter().map(|e| e.photos.len()).sum()
    }

    /// Check the invariants deserialization alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if usize::from(entry.index) != i + 1 {
                return Err(Error::out_of_range("day id", entry.index.into(), i + 1, i + 1));
            }
            if entry.photos.len() > MAX_PHOTOS_PER_DAY {
                return Err(Error::out_of_range(
                    "photo count",
                    entry.photos.len(),
                    0,
                    MAX_PHOTOS_PER_DAY,
                ));
            }
        }
        for &key in self.evaluation.keys() {
            eval_key(key.into())?;
        }
        for &key in self.comments.keys() {
            prompt_key(key.into())?;
        }
        Ok(())
    }
}

/// Parse an identity date; an empty string clears the date.
///
/// # Errors
///
/// Returns an error if the input is neither empty nor `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Result<Option<NaiveDate>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| Error::InvalidDate {
            value: value.to_string(),
        })
}

fn day_number(position: usize) -> u8 {
    // DAY_COUNT is far below u8::MAX
    u8::try_from(position + 1).unwrap_or(u8::MAX)
}

fn check_day(day: usize) -> Result<()> {
    if (1..=DAY_COUNT).contains(&day) {
        Ok(())
    } else {
        Err(Error::out_of_range("day", day, 1, DAY_COUNT))
    }
}

fn eval_key(point: usize) -> Result<u8> {
    if point < EVAL_POINTS.len() {
        u8::try_from(point).map_err(|_| Error::out_of_range("evaluation point", point, 0, 18))
    } else {
        Err(Error::out_of_range(
            "evaluation point",
            point,
            0,
            EVAL_POINTS.len() - 1,
        ))
    }
}

fn prompt_key(prompt_id: usize) -> Result<u8> {
    let min = usize::from(FIRST_PROMPT_ID);
    let max = usize::from(LAST_PROMPT_ID);
    match u8::try_from(prompt_id) {
        Ok(key) if (FIRST_PROMPT_ID..=LAST_PROMPT_ID).contains(&key) => Ok(key),
        _ => Err(Error::out_of_range("review prompt", prompt_id, min, max)),
    }
}

/// Serde adapter mapping an absent date to the empty string.
mod blank_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}
