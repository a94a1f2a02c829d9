//! Page views of a placement record.
//!
//! The logbook is a fixed sequence of thirteen pages: the cover, one page
//! per day, the self-evaluation and the final review. A [`PageView`] is what
//! one of those pages shows for a given record; rasterizers and the CLI
//! consume views rather than the record itself.

use crate::calendar;
use crate::record::{
    EncodedImage, EvalOption, PlacementRecord, DAY_COUNT, EVAL_POINTS, REVIEW_PROMPTS,
};

/// Number of pages in the logbook.
pub const PAGE_COUNT: usize = DAY_COUNT + 3;

/// Index of the last page.
pub const LAST_PAGE: usize = PAGE_COUNT - 1;

const EVALUATION_PAGE: usize = DAY_COUNT + 1;

/// Which page of the logbook an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// Identity fields.
    Cover,
    /// Daily journal, day 1..=10.
    Day(usize),
    /// Fixed-form self-evaluation.
    Evaluation,
    /// Free-text final review.
    Review,
}

impl Page {
    /// Page for index 0..=12.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Cover),
            day @ 1..=DAY_COUNT => Some(Self::Day(day)),
            EVALUATION_PAGE => Some(Self::Evaluation),
            LAST_PAGE => Some(Self::Review),
            _ => None,
        }
    }

    /// Position of this page in the logbook.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Cover => 0,
            Self::Day(day) => day,
            Self::Evaluation => EVALUATION_PAGE,
            Self::Review => LAST_PAGE,
        }
    }

    /// Short title used in navigation and logs.
    #[must_use]
    pub fn title(self) -> String {
        match self {
            Self::Cover => "Couverture".to_string(),
            Self::Day(day) => format!("Jour {day}"),
            Self::Evaluation => "Auto-évaluation".to_string(),
            Self::Review => "Bilan final".to_string(),
        }
    }
}

/// What one page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    /// Position of the page, 0..=12.
    pub index: usize,
    /// Page-specific content.
    pub content: PageContent<'a>,
}

/// Content of a page, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent<'a> {
    /// The cover page.
    Cover(CoverView<'a>),
    /// A daily journal page.
    Day(DayView<'a>),
    /// The self-evaluation grid.
    Evaluation(Vec<EvaluationItem>),
    /// The final review answers.
    Review(Vec<ReviewItem<'a>>),
}

/// Identity fields as shown on the cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverView<'a> {
    /// Family name.
    pub surname: &'a str,
    /// Given name.
    pub first_name: &'a str,
    /// Start date as `dd/mm/yyyy`, empty when unset.
    pub start_date: String,
    /// End date as `dd/mm/yyyy`, empty when unset.
    pub end_date: String,
    /// Placement location.
    pub location: &'a str,
}

/// One day of the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView<'a> {
    /// Day number, 1..=10.
    pub day: usize,
    /// Working-day date label, or the no-date sentinel.
    pub date_label: String,
    /// Work done that day.
    pub description: &'a str,
    /// Attached photos.
    pub photos: &'a [EncodedImage],
}

/// One evaluation statement and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationItem {
    /// Displayed number (index + 1).
    pub number: usize,
    /// The statement.
    pub statement: &'static str,
    /// Selected option, if any.
    pub selected: Option<EvalOption>,
}

/// One review prompt and its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem<'a> {
    /// Prompt id, 20..=28.
    pub id: u8,
    /// The prompt.
    pub prompt: &'static str,
    /// The answer, possibly empty.
    pub answer: &'a str,
}

/// Render page `index` of `record`. Out-of-range indices clamp to the last page.
#[must_use]
pub fn render(record: &PlacementRecord, index: usize) -> PageView<'_> {
    let page = Page::from_index(index.min(LAST_PAGE)).unwrap_or(Page::Review);

    let content = match page {
        Page::Cover => PageContent::Cover(CoverView {
            surname: &record.surname,
            first_name: &record.first_name,
            start_date: short_date(record.start_date),
            end_date: short_date(record.end_date),
            location: &record.location,
        }),
        Page::Day(day) => {
            let entry = &record.entries[day - 1];
            PageContent::Day(DayView {
                day,
                date_label: calendar::working_day_label(record.start_date, day - 1),
                description: &entry.description,
                photos: &entry.photos,
            })
        }
        Page::Evaluation => PageContent::Evaluation(
            EVAL_POINTS
                .into_iter()
                .enumerate()
                .map(|(i, statement)| EvaluationItem {
                    number: i + 1,
                    statement,
                    selected: record.evaluation_for(i),
                })
                .collect(),
        ),
        Page::Review => PageContent::Review(
            REVIEW_PROMPTS
                .iter()
                .map(|prompt| ReviewItem {
                    id: prompt.id,
                    prompt: prompt.label,
                    answer: record.comment(prompt.id),
                })
                .collect(),
        ),
    };

    PageView {
        index: page.index(),
        content,
    }
}

impl PageView<'_> {
    /// Which page this is.
    #[must_use]
    pub fn page(&self) -> Page {
        Page::from_index(self.index).unwrap_or(Page::Review)
    }

    /// Plain-text rendering, one line per field.
    #[must_use]
    pub fn text_lines(&self) -> Vec<String> {
        match &self.content {
            PageContent::Cover(cover) => vec![
                "CARNET DE STAGE".to_string(),
                format!("Nom : {}", cover.surname),
                format!("Prénom : {}", cover.first_name),
                format!("Début : {}", cover.start_date),
                format!("Fin : {}", cover.end_date),
                format!("Lieu de stage : {}", cover.location),
            ],
            PageContent::Day(day) => {
                let mut lines = vec![
                    format!("JOUR {}", day.day),
                    day.date_label.clone(),
                    "Travaux réalisés aujourd'hui :".to_string(),
                ];
                lines.extend(day.description.lines().map(str::to_string));
                lines.push(format!("Photos : {}", day.photos.len()));
                lines
            }
            PageContent::Evaluation(items) => {
                let mut lines = vec!["AUTO-ÉVALUATION".to_string()];
                lines.extend(items.iter().map(|item| {
                    format!(
                        "{}. {} : {}",
                        item.number,
                        item.statement,
                        item.selected.map_or("-", EvalOption::label)
                    )
                }));
                lines
            }
            PageContent::Review(items) => {
                let mut lines = vec!["BILAN FINAL".to_string()];
                for item in items {
                    lines.push(format!("{}. {}", item.id, item.prompt));
                    lines.extend(item.answer.lines().map(|l| format!("  {l}")));
                }
                lines
            }
        }
    }
}

fn short_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}
