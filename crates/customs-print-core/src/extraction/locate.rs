use crate::extraction::{BoundingBox, PageContent, TextLine};

/// Finds where a literal term visually occurs on a page.
pub trait TermLocator {
    /// Boxes of every occurrence of `term` (case-sensitive). Empty when the
    /// term has no visual occurrence.
    fn find_boxes(&self, term: &str) -> Vec<BoundingBox>;
}

impl TermLocator for PageContent {
    fn find_boxes(&self, term: &str) -> Vec<BoundingBox> {
        if term.is_empty() {
            return Vec::new();
        }
        self.lines
            .iter()
            .flat_map(|line| find_in_line(line, term))
            .collect()
    }
}

/// Search a single line. Words are joined by one space, so a term may span
/// several words of the same line but never two lines.
fn find_in_line(line: &TextLine, term: &str) -> Vec<BoundingBox> {
    let mut joined = String::new();
    // (start, end) byte range of each word within `joined`
    let mut ranges = Vec::with_capacity(line.words.len());
    for word in &line.words {
        if !joined.is_empty() {
            joined.push(' ');
        }
        let start = joined.len();
        joined.push_str(&word.text);
        ranges.push((start, joined.len()));
    }

    let mut boxes = Vec::new();
    for (hit_start, matched) in joined.match_indices(term) {
        let hit_end = hit_start + matched.len();
        let mut hit_box: Option<BoundingBox> = None;

        for (word, &(word_start, word_end)) in line.words.iter().zip(&ranges) {
            if word_end <= hit_start || word_start >= hit_end {
                continue;
            }
            let part = covered_part(
                &word.text,
                &word.bbox,
                hit_start.max(word_start) - word_start,
                hit_end.min(word_end) - word_start,
            );
            hit_box = Some(match hit_box {
                Some(b) => b.union(&part),
                None => part,
            });
        }

        if let Some(b) = hit_box {
            boxes.push(b);
        }
    }
    boxes
}

/// Horizontal slice of a word box covering the byte range `[from, to)` of the
/// word, interpolated linearly per character.
fn covered_part(text: &str, bbox: &BoundingBox, from: usize, to: usize) -> BoundingBox {
    let total = text.chars().count().max(1) as f32;
    let before = text[..from].chars().count() as f32;
    let upto = text[..to].chars().count() as f32;
    let char_width = bbox.width() / total;

    BoundingBox {
        x_min: bbox.x_min + before * char_width,
        y_min: bbox.y_min,
        x_max: bbox.x_min + upto * char_width,
        y_max: bbox.y_max,
    }
}
