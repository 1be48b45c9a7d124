//! # Pagination Module
//!
//! Lays a sheet out as lines of text and groups lines into pages.
//!
//! ## Packing Rule
//! Every note, chord and rest renders as its notation text followed by one
//! separator character. Tokens are packed greedily: a token wraps to a new line
//! only when it would overflow `max_chars_per_line` **and** the current line
//! already holds something. A single token longer than the budget therefore sits
//! alone on an over-long line instead of wrapping forever.
//!
//! Page of a line = `line / lines_per_page`, both zero-based.
//!
//! Every query in this module goes through one `LinePacker`, so page counts,
//! per-position lookups and [`Layout`] tables always agree.
//!
//! ## Example
//! ```rust
//! use sheetplay::{calculate_page_for_position, parse_measures};
//!
//! let parsed = parse_measures("C4 D4 E4").unwrap();
//! // "C4 " + "D4 " fit in 7 characters, "E4 " wraps onto the second page
//! assert_eq!(calculate_page_for_position(&parsed.measures, 0, 1, 7, 1), 0);
//! assert_eq!(calculate_page_for_position(&parsed.measures, 0, 2, 7, 1), 1);
//! ```

use crate::config::LayoutConfig;
use crate::score::{Measure, Page};

/// One rendered note: its position in the score and its width including the separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayToken {
    pub measure: usize,
    pub note: usize,
    pub len: usize,
}

/// Flatten measures into display tokens in reading order.
pub fn display_tokens(measures: &[Measure]) -> impl Iterator<Item = DisplayToken> + '_ {
    measures.iter().enumerate().flat_map(|(m, measure)| {
        measure
            .notes
            .iter()
            .enumerate()
            .map(move |(n, note)| DisplayToken {
                measure: m,
                note: n,
                len: note.display_width() + 1,
            })
    })
}

/// Greedy line filler shared by every pagination query
#[derive(Debug, Clone)]
struct LinePacker {
    max_chars: usize,
    line: usize,
    used: usize,
}

impl LinePacker {
    fn new(max_chars: usize) -> Self {
        Self {
            max_chars,
            line: 0,
            used: 0,
        }
    }

    /// Place a token of `len` characters and return the line it lands on.
    fn place(&mut self, len: usize) -> usize {
        if self.used > 0 && self.used + len > self.max_chars {
            self.line += 1;
            self.used = 0;
        }
        self.used += len;
        self.line
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    max_chars_per_line: usize,
    lines_per_page: usize,
}

impl Paginator {
    /// Zero budgets are treated as 1.
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            max_chars_per_line: config.max_chars_per_line.max(1),
            lines_per_page: config.lines_per_page.max(1),
        }
    }

    fn page_of_line(&self, line: usize) -> usize {
        line / self.lines_per_page
    }

    /// Number of pages the sheet fills; an empty sheet still has one page.
    pub fn total_pages(&self, measures: &[Measure]) -> usize {
        let mut packer = LinePacker::new(self.max_chars_per_line);
        let last_line = display_tokens(measures).map(|t| packer.place(t.len)).last();
        match last_line {
            Some(line) => self.page_of_line(line) + 1,
            None => 1,
        }
    }

    /// Zero-based page holding note `note_idx` of measure `measure_idx`, or 0 if
    /// there is no such note.
    pub fn calculate_page_for_position(
        &self,
        measures: &[Measure],
        measure_idx: usize,
        note_idx: usize,
    ) -> usize {
        let mut packer = LinePacker::new(self.max_chars_per_line);
        for token in display_tokens(measures) {
            let line = packer.place(token.len);
            if token.measure == measure_idx && token.note == note_idx {
                return self.page_of_line(line);
            }
        }
        0
    }

    /// Precompute the page of every note.
    pub fn layout(&self, measures: &[Measure]) -> Layout {
        let mut packer = LinePacker::new(self.max_chars_per_line);
        let mut pages: Vec<Vec<usize>> = measures
            .iter()
            .map(|m| Vec::with_capacity(m.notes.len()))
            .collect();
        let mut last_line = None;

        for token in display_tokens(measures) {
            let line = packer.place(token.len);
            pages[token.measure].push(self.page_of_line(line));
            last_line = Some(line);
        }

        let total_pages = last_line.map_or(1, |line| self.page_of_line(line) + 1);
        Layout { pages, total_pages }
    }

    /// Group measures onto pages. A measure that crosses a page boundary is split
    /// into fragments, each keeping the measure's number.
    pub fn paginate(&self, measures: &[Measure]) -> Vec<Page> {
        let layout = self.layout(measures);
        let mut pages: Vec<Page> = (1..=layout.total_pages)
            .map(|number| Page {
                number,
                measures: Vec::new(),
            })
            .collect();

        for (m, measure) in measures.iter().enumerate() {
            for (n, note) in measure.notes.iter().enumerate() {
                let page = &mut pages[layout.pages[m][n]];
                if let Some(fragment) = page
                    .measures
                    .last_mut()
                    .filter(|fragment| fragment.number == measure.number)
                {
                    fragment.notes.push(note.clone());
                } else {
                    page.measures.push(Measure {
                        number: measure.number,
                        notes: vec![note.clone()],
                    });
                }
            }
        }

        pages
    }
}

/// Calculate the zero-based page of a (measure, note) position.
///
/// Unknown positions land on page 0.
pub fn calculate_page_for_position(
    measures: &[Measure],
    measure_idx: usize,
    note_idx: usize,
    max_chars_per_line: usize,
    lines_per_page: usize,
) -> usize {
    Paginator::new(LayoutConfig {
        max_chars_per_line,
        lines_per_page,
    })
    .calculate_page_for_position(measures, measure_idx, note_idx)
}

/// Page of every note in a sheet, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pages: Vec<Vec<usize>>,
    total_pages: usize,
}

impl Layout {
    pub fn page_of(&self, measure_idx: usize, note_idx: usize) -> Option<usize> {
        self.pages.get(measure_idx)?.get(note_idx).copied()
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }
}
