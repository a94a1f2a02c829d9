//! Page layout in millimetres on an A4 portrait sheet.
//!
//! Layout turns a [`PageView`] into positioned blocks. Raster backends paint
//! the fills, outlines and photos; text blocks become the page's text layer.

use image::Rgb;

use crate::record::{EncodedImage, EvalOption};
use crate::view::{CoverView, DayView, EvaluationItem, PageContent, PageView, ReviewItem};

/// A4 width in millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height in millimetres.
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const MARGIN: f32 = 15.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN;

/// Average Helvetica advance as a fraction of the font size.
const AVG_CHAR_WIDTH: f32 = 0.5;
const LINE_SPACING: f32 = 1.3;

pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const AMBER_50: Rgb<u8> = Rgb([255, 251, 235]);
pub(crate) const AMBER_100: Rgb<u8> = Rgb([254, 243, 199]);
pub(crate) const AMBER_200: Rgb<u8> = Rgb([253, 230, 138]);
pub(crate) const AMBER_500: Rgb<u8> = Rgb([245, 158, 11]);
pub(crate) const AMBER_600: Rgb<u8> = Rgb([217, 119, 6]);
pub(crate) const AMBER_900: Rgb<u8> = Rgb([120, 53, 15]);

/// Axis-aligned rectangle, origin at the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// A line of text placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Left edge of the run.
    pub x: f32,
    /// Baseline, measured from the top of the page.
    pub baseline: f32,
    /// Font size (em height).
    pub size: f32,
    /// Fill colour.
    pub color: Rgb<u8>,
    /// The text.
    pub text: String,
}

/// One positioned element of a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    /// Filled rectangle.
    Fill(Rect, Rgb<u8>),
    /// One-pixel outlined rectangle.
    Outline(Rect, Rgb<u8>),
    /// Photo scaled to cover the rectangle.
    Photo(Rect, &'a EncodedImage),
    /// Text line.
    Text(TextRun),
}

/// Lay out a page.
#[must_use]
pub fn layout<'a>(view: &PageView<'a>) -> Vec<Block<'a>> {
    let mut blocks = Vec::new();
    match &view.content {
        PageContent::Cover(cover) => layout_cover(cover, &mut blocks),
        PageContent::Day(day) => layout_day(day, &mut blocks),
        PageContent::Evaluation(items) => layout_evaluation(items, &mut blocks),
        PageContent::Review(items) => layout_review(items, &mut blocks),
    }
    blocks
}

/// The text layer of a page layout.
#[must_use]
pub fn text_runs(blocks: &[Block<'_>]) -> Vec<TextRun> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Text(run) => Some(run.clone()),
            _ => None,
        })
        .collect()
}

/// Greedy word wrap to the number of characters that fit in `width`.
#[must_use]
pub fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_chars = ((width / (size * AVG_CHAR_WIDTH)) as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if !line.is_empty() && needed > max_chars {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}

fn text(blocks: &mut Vec<Block<'_>>, x: f32, baseline: f32, size: f32, color: Rgb<u8>, s: &str) {
    if s.is_empty() {
        return;
    }
    blocks.push(Block::Text(TextRun {
        x,
        baseline,
        size,
        color,
        text: s.to_string(),
    }));
}

/// Wrapped paragraph clipped to `rect`.
fn paragraph(blocks: &mut Vec<Block<'_>>, rect: Rect, size: f32, color: Rgb<u8>, s: &str) {
    let step = size * LINE_SPACING;
    let mut baseline = rect.y + size;
    for line in wrap(s, rect.width, size) {
        if baseline > rect.bottom() {
            break;
        }
        text(blocks, rect.x, baseline, size, color, &line);
        baseline += step;
    }
}

fn header(blocks: &mut Vec<Block<'_>>, kicker: &str, title: &str) {
    blocks.push(Block::Fill(Rect::new(0.0, 0.0, PAGE_WIDTH_MM, 4.0), AMBER_900));
    text(blocks, MARGIN, 16.0, 3.0, AMBER_600, kicker);
    text(blocks, MARGIN, 28.0, 9.0, AMBER_900, title);
}

fn layout_cover<'a>(cover: &CoverView<'a>, blocks: &mut Vec<Block<'a>>) {
    blocks.push(Block::Fill(Rect::new(0.0, 0.0, PAGE_WIDTH_MM, 4.0), AMBER_900));
    text(blocks, 62.0, 60.0, 12.0, AMBER_900, "CARNET");
    text(blocks, 52.0, 76.0, 12.0, AMBER_600, "DE STAGE");
    blocks.push(Block::Fill(Rect::new(81.0, 84.0, 48.0, 3.0), AMBER_500));

    let panel = Rect::new(MARGIN, 110.0, CONTENT_WIDTH, 120.0);
    blocks.push(Block::Fill(panel, AMBER_50));
    blocks.push(Block::Outline(panel, AMBER_100));

    let half = (CONTENT_WIDTH - 30.0) / 2.0;
    let left = MARGIN + 10.0;
    let right = left + half + 10.0;
    let fields = [
        (left, 125.0, half, "NOM", cover.surname),
        (right, 125.0, half, "PRÉNOM", cover.first_name),
        (left, 160.0, half, "DÉBUT", cover.start_date.as_str()),
        (right, 160.0, half, "FIN", cover.end_date.as_str()),
        (left, 195.0, CONTENT_WIDTH - 20.0, "LIEU DE STAGE", cover.location),
    ];
    for (x, y, width, label, value) in fields {
        text(blocks, x, y, 3.0, AMBER_600, label);
        let field = Rect::new(x, y + 3.0, width, 14.0);
        blocks.push(Block::Fill(field, WHITE));
        blocks.push(Block::Outline(field, AMBER_100));
        text(blocks, x + 3.0, y + 12.5, 5.0, AMBER_900, value);
    }
}

fn layout_day<'a>(day: &DayView<'a>, blocks: &mut Vec<Block<'a>>) {
    header(blocks, "JOURNAL QUOTIDIEN", &format!("JOUR {}", day.day));
    text(blocks, MARGIN, 37.0, 4.0, AMBER_500, &day.date_label);

    let area = Rect::new(MARGIN, 45.0, CONTENT_WIDTH, 130.0);
    blocks.push(Block::Fill(area, AMBER_50));
    blocks.push(Block::Outline(area, AMBER_200));
    text(
        blocks,
        MARGIN + 6.0,
        54.0,
        3.0,
        AMBER_600,
        "TRAVAUX RÉALISÉS AUJOURD'HUI",
    );
    let body = Rect::new(MARGIN + 6.0, 59.0, CONTENT_WIDTH - 12.0, 112.0);
    blocks.push(Block::Fill(body, WHITE));
    paragraph(
        blocks,
        Rect::new(body.x + 3.0, body.y + 2.0, body.width - 6.0, body.height - 4.0),
        4.2,
        AMBER_900,
        day.description,
    );

    let slot = (CONTENT_WIDTH - 10.0) / 2.0;
    for (i, photo) in day.photos.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = MARGIN + i as f32 * (slot + 10.0);
        let rect = Rect::new(x, 185.0, slot, slot);
        blocks.push(Block::Photo(rect, photo));
        blocks.push(Block::Outline(rect, WHITE));
    }
}

fn layout_evaluation(items: &[EvaluationItem], blocks: &mut Vec<Block<'_>>) {
    header(blocks, "", "AUTO-ÉVALUATION");

    let top = 36.0;
    #[allow(clippy::cast_precision_loss)]
    let row = (PAGE_HEIGHT_MM - top - 8.0) / items.len().max(1) as f32;
    let cell = CONTENT_WIDTH / 4.0;

    for (i, item) in items.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = top + i as f32 * row;
        text(
            blocks,
            MARGIN,
            y + 3.2,
            2.9,
            AMBER_900,
            &format!("{}. {}", item.number, item.statement),
        );
        for (j, option) in EvalOption::ALL.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let rect = Rect::new(MARGIN + j as f32 * cell + 0.5, y + 4.8, cell - 1.0, row - 6.0);
            let selected = item.selected == Some(option);
            blocks.push(Block::Fill(rect, if selected { AMBER_600 } else { AMBER_50 }));
            blocks.push(Block::Outline(rect, AMBER_100));
            text(
                blocks,
                rect.x + 3.0,
                rect.y + rect.height * 0.7,
                2.5,
                if selected { WHITE } else { AMBER_500 },
                &option.label().to_uppercase(),
            );
        }
    }
}

fn layout_review<'a>(items: &[ReviewItem<'a>], blocks: &mut Vec<Block<'a>>) {
    header(blocks, "", "BILAN FINAL");

    let top = 36.0;
    #[allow(clippy::cast_precision_loss)]
    let row = (PAGE_HEIGHT_MM - top - 6.0) / items.len().max(1) as f32;

    for (i, item) in items.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = top + i as f32 * row;
        let card = Rect::new(MARGIN, y, CONTENT_WIDTH, row - 2.0);
        blocks.push(Block::Fill(card, WHITE));
        blocks.push(Block::Outline(card, AMBER_100));
        text(
            blocks,
            MARGIN + 4.0,
            y + 5.0,
            3.2,
            AMBER_900,
            &format!("{}. {}", item.id, item.prompt),
        );
        paragraph(
            blocks,
            Rect::new(MARGIN + 4.0, y + 7.0, CONTENT_WIDTH - 8.0, row - 10.0),
            3.0,
            AMBER_900,
            item.answer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PlacementRecord;
    use crate::view::render;

    fn within_page(rect: &Rect) -> bool {
        rect.x >= 0.0
            && rect.y >= 0.0
            && rect.x + rect.width <= PAGE_WIDTH_MM + 0.01
            && rect.bottom() <= PAGE_HEIGHT_MM + 0.01
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("un deux trois quatre cinq six sept huit", 20.0, 4.0);
        // 20 / (4 * 0.5) = 10 chars per line
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "un deux trois quatre cinq six sept huit");
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let lines = wrap("ligne un\nligne deux", 200.0, 4.0);
        assert_eq!(lines, vec!["ligne un", "ligne deux"]);
    }

    #[test]
    fn test_wrap_long_word_stays_whole() {
        let lines = wrap("anticonstitutionnellement", 10.0, 4.0);
        assert_eq!(lines, vec!["anticonstitutionnellement"]);
    }

    #[test]
    fn test_every_page_stays_on_sheet() {
        let mut record = PlacementRecord::new();
        record.entries[0].description = "mot ".repeat(2000);
        record.set_comment(20, "réponse ".repeat(500)).unwrap();

        for index in 0..crate::view::PAGE_COUNT {
            let view = render(&record, index);
            for block in layout(&view) {
                match block {
                    Block::Fill(r, _) | Block::Outline(r, _) | Block::Photo(r, _) => {
                        assert!(within_page(&r), "page {index}: {r:?}");
                    }
                    Block::Text(run) => {
                        assert!(run.baseline <= PAGE_HEIGHT_MM, "page {index}: {run:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_selected_option_is_highlighted() {
        let mut record = PlacementRecord::new();
        record.set_evaluation(0, EvalOption::Parfois).unwrap();
        let view = render(&record, 11);
        let blocks = layout(&view);

        let highlighted = blocks
            .iter()
            .filter(|b| matches!(b, Block::Fill(_, c) if *c == AMBER_600))
            .count();
        assert_eq!(highlighted, 1);
    }

    #[test]
    fn test_cover_text_layer_contains_identity() {
        let mut record = PlacementRecord::new();
        record.surname = "Girard".to_string();
        record.location = "Ébénisterie Morel".to_string();
        let runs = text_runs(&layout(&render(&record, 0)));

        assert!(runs.iter().any(|r| r.text == "Girard"));
        assert!(runs.iter().any(|r| r.text == "Ébénisterie Morel"));
    }

    #[test]
    fn test_empty_fields_emit_no_text() {
        let record = PlacementRecord::new();
        let runs = text_runs(&layout(&render(&record, 3)));
        assert!(runs.iter().all(|r| !r.text.is_empty()));
    }
}
