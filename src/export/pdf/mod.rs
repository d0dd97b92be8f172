//! Paginated-canvas renderer. The target has no reflow, so every line is
//! wrapped and positioned here and page breaks are taken before a block
//! that would overrun the bottom margin.

mod canvas;
mod metrics;

pub use canvas::{CanvasItem, CanvasPage, PageCanvas, Rgb};
pub use metrics::{PdfFont, text_width};

use crate::error::Result;
use crate::markdown::{InlineRun, strip_inline_markers};
use crate::template::{Template, hex_to_rgb};

use super::numbering::NumberedHeading;
use super::toc::TocEntry;
use super::{BlockRenderer, CoverPage, ExportOptions, ListMarker};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 56.0;

const CONTENT_TOP: f32 = MARGIN + 8.0;
const CONTENT_BOTTOM: f32 = PAGE_HEIGHT - MARGIN;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const LIST_MARKER_INDENT: f32 = 8.0;
const LIST_TEXT_INDENT: f32 = 24.0;
const TOC_SUBSECTION_INDENT: f32 = 18.0;
const CELL_PADDING: f32 = 4.0;
const CODE_PADDING: f32 = 6.0;
const TAB_WIDTH: usize = 4;

/// One wrapped line: consecutive segments that share a font are merged.
pub type Line = Vec<(PdfFont, String)>;

pub struct PdfRenderer {
    template: Template,
    title: String,
    canvas: PageCanvas,
    cursor_y: f32,
    undecorated_pages: usize,
}

impl PdfRenderer {
    pub fn new(options: &ExportOptions) -> Self {
        Self {
            template: options.template.clone(),
            title: options.title.trim().to_string(),
            canvas: PageCanvas::new(PAGE_WIDTH, PAGE_HEIGHT),
            cursor_y: CONTENT_TOP,
            undecorated_pages: 0,
        }
    }

    fn current_page(&mut self) -> &mut CanvasPage {
        if self.canvas.pages.is_empty() {
            self.canvas.pages.push(CanvasPage::default());
        }
        let last = self.canvas.pages.len() - 1;
        &mut self.canvas.pages[last]
    }

    fn new_page(&mut self) {
        self.canvas.pages.push(CanvasPage::default());
        self.cursor_y = CONTENT_TOP;
    }

    fn at_page_top(&self) -> bool {
        self.cursor_y <= CONTENT_TOP + 0.5
    }

    /// Break the page when `height` more points would overrun the bottom
    /// margin. Returns whether a break was taken.
    fn ensure_space(&mut self, height: f32) -> bool {
        if self.cursor_y + height > CONTENT_BOTTOM && !self.at_page_top() {
            self.new_page();
            return true;
        }
        false
    }

    fn line_height(&self, size: f32) -> f32 {
        size * self.template.line_spacing
    }

    fn color(&self, hex: &str) -> Rgb {
        hex_to_rgb(hex)
    }

    fn draw_text(&mut self, x: f32, baseline: f32, size: f32, font: PdfFont, color: Rgb, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current_page().items.push(CanvasItem::Text {
            x,
            y: baseline,
            size,
            font,
            color,
            text: text.to_string(),
        });
    }

    /// Draw one wrapped line with its top at the cursor, then advance.
    fn draw_line(&mut self, line: &Line, x: f32, size: f32, color: Rgb) {
        let baseline = self.cursor_y + size;
        let mut x = x;
        for (font, text) in line {
            self.draw_text(x, baseline, size, *font, color, text);
            x += text_width(text, *font, size);
        }
        self.cursor_y += self.line_height(size);
    }

    fn draw_lines(&mut self, lines: &[Line], x: f32, size: f32, color: Rgb) {
        for line in lines {
            self.ensure_space(self.line_height(size));
            self.draw_line(line, x, size, color);
        }
    }

    fn draw_centered(&mut self, text: &str, size: f32, font: PdfFont, color: Rgb) {
        let runs = [InlineRun {
            text: text.to_string(),
            bold: matches!(font, PdfFont::Bold | PdfFont::BoldItalic),
            italic: matches!(font, PdfFont::Italic | PdfFont::BoldItalic),
        }];
        for line in wrap_runs(&runs, size, CONTENT_WIDTH) {
            let width = line_width(&line, size);
            let x = MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0;
            self.draw_line(&line, x, size, color);
        }
    }

    fn rule(&mut self, y: f32, color: Rgb, width: f32) {
        self.current_page().items.push(CanvasItem::Line {
            from: (MARGIN, y),
            to: (MARGIN + CONTENT_WIDTH, y),
            width,
            color,
        });
    }

    fn table_row(&mut self, cells: &[String], columns: usize, header: bool) {
        let size = self.template.body_size - 1.0;
        let column_width = CONTENT_WIDTH / columns as f32;
        let wrapped = (0..columns)
            .map(|index| {
                let text = cells.get(index).map(|cell| strip_inline_markers(cell)).unwrap_or_default();
                let runs = [InlineRun {
                    text,
                    bold: header,
                    italic: false,
                }];
                wrap_runs(&runs, size, column_width - 2.0 * CELL_PADDING)
            })
            .collect::<Vec<Vec<Line>>>();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let row_height = line_count as f32 * self.line_height(size) + 2.0 * CELL_PADDING;

        let top = self.cursor_y;
        let border = self.color(&self.template.palette.muted);
        let fill = header.then(|| self.color(&self.template.palette.table_header_fill));
        let text_color = self.color(&self.template.palette.text);

        for (index, lines) in wrapped.iter().enumerate() {
            let x = MARGIN + index as f32 * column_width;
            self.current_page().items.push(CanvasItem::Rect {
                x,
                y: top,
                width: column_width,
                height: row_height,
                fill,
                stroke: Some(border),
            });
            self.cursor_y = top + CELL_PADDING;
            for line in lines {
                self.draw_line(line, x + CELL_PADDING, size, text_color);
            }
        }
        self.cursor_y = top + row_height;
    }

    fn row_height_estimate(&self, cells: &[String], columns: usize) -> f32 {
        let size = self.template.body_size - 1.0;
        let column_width = CONTENT_WIDTH / columns as f32;
        let line_count = cells
            .iter()
            .map(|cell| {
                let runs = [InlineRun {
                    text: strip_inline_markers(cell),
                    bold: true,
                    italic: false,
                }];
                wrap_runs(&runs, size, column_width - 2.0 * CELL_PADDING).len()
            })
            .max()
            .unwrap_or(0)
            .max(1);
        line_count as f32 * self.line_height(size) + 2.0 * CELL_PADDING
    }

    /// Running header and page numbers on every page after the cover.
    fn decorate(&mut self) {
        let total = self.canvas.pages.len();
        let muted = self.color(&self.template.palette.muted);
        let header_rule = self.template.header_rule;
        let title = truncate_to_width(&self.title, 8.0, CONTENT_WIDTH * 0.8);

        for (index, page) in self.canvas.pages.iter_mut().enumerate().skip(self.undecorated_pages) {
            page.items.push(CanvasItem::Text {
                x: MARGIN,
                y: MARGIN - 14.0,
                size: 8.0,
                font: PdfFont::Italic,
                color: muted,
                text: title.clone(),
            });
            if header_rule {
                page.items.push(CanvasItem::Line {
                    from: (MARGIN, MARGIN - 8.0),
                    to: (MARGIN + CONTENT_WIDTH, MARGIN - 8.0),
                    width: 0.5,
                    color: muted,
                });
            }
            let label = format!("Page {} of {total}", index + 1);
            let width = text_width(&label, PdfFont::Regular, 9.0);
            page.items.push(CanvasItem::Text {
                x: (PAGE_WIDTH - width) / 2.0,
                y: PAGE_HEIGHT - MARGIN + 24.0,
                size: 9.0,
                font: PdfFont::Regular,
                color: muted,
                text: label,
            });
        }
    }
}

impl BlockRenderer for PdfRenderer {
    type Output = PageCanvas;

    fn title_block(&mut self, title: &str, subtitle: &str) {
        let primary = self.color(&self.template.palette.primary);
        let muted = self.color(&self.template.palette.muted);
        let accent = self.color(&self.template.palette.accent);

        let runs = [InlineRun {
            text: title.to_string(),
            bold: true,
            italic: false,
        }];
        let lines = wrap_runs(&runs, self.template.title_size, CONTENT_WIDTH);
        self.draw_lines(&lines, MARGIN, self.template.title_size, primary);

        let runs = [InlineRun {
            text: subtitle.to_string(),
            bold: false,
            italic: true,
        }];
        let size = self.template.body_size - 1.0;
        let lines = wrap_runs(&runs, size, CONTENT_WIDTH);
        self.draw_lines(&lines, MARGIN, size, muted);

        self.cursor_y += 4.0;
        self.rule(self.cursor_y, accent, 1.0);
        self.cursor_y += 2.0 * self.template.paragraph_spacing;
    }

    fn cover_page(&mut self, cover: &CoverPage) {
        let body = self.template.body_size;
        let text = self.color(&self.template.palette.text);
        let primary = self.color(&self.template.palette.primary);

        self.cursor_y = MARGIN + 80.0;
        if let Some(institution) = &cover.institution {
            self.draw_centered(&institution.to_uppercase(), body + 5.0, PdfFont::Bold, primary);
        }
        if let Some(department) = &cover.department {
            self.cursor_y += 4.0;
            self.draw_centered(department, body + 2.0, PdfFont::Regular, text);
        }

        self.cursor_y = self.cursor_y.max(PAGE_HEIGHT * 0.33);
        self.draw_centered(&cover.title, self.template.title_size, PdfFont::Bold, primary);
        self.cursor_y += 8.0;
        self.draw_centered(&cover.report_type, body + 2.0, PdfFont::Italic, text);
        if let Some(course) = &cover.course {
            self.cursor_y += 4.0;
            self.draw_centered(course, body, PdfFont::Regular, text);
        }

        self.cursor_y = self.cursor_y.max(PAGE_HEIGHT * 0.6);
        if let Some(author) = &cover.author {
            self.draw_centered("Submitted by", body, PdfFont::Regular, text);
            self.draw_centered(author, body + 1.0, PdfFont::Bold, text);
        }
        if let Some(student_id) = &cover.student_id {
            self.draw_centered(&format!("Student ID: {student_id}"), body, PdfFont::Regular, text);
        }
        if let Some(supervisor) = &cover.supervisor {
            self.cursor_y += 12.0;
            self.draw_centered("Supervised by", body, PdfFont::Regular, text);
            self.draw_centered(supervisor, body + 1.0, PdfFont::Bold, text);
        }
        if let Some(date) = &cover.date {
            self.cursor_y += 12.0;
            self.draw_centered(date, body, PdfFont::Regular, text);
        }

        self.undecorated_pages = self.canvas.pages.len();
        self.new_page();
    }

    fn table_of_contents(&mut self, entries: &[TocEntry]) {
        let primary = self.color(&self.template.palette.primary);
        let text = self.color(&self.template.palette.text);
        let size = self.template.body_size;

        self.draw_centered("TABLE OF CONTENTS", self.template.heading_size(1), PdfFont::Bold, primary);
        self.cursor_y += self.template.paragraph_spacing * 2.0;

        for entry in entries {
            let line_height = self.line_height(size);
            self.ensure_space(line_height);
            let font = if entry.level == 1 {
                PdfFont::Bold
            } else {
                PdfFont::Regular
            };
            let indent = if entry.level > 1 { TOC_SUBSECTION_INDENT } else { 0.0 };
            let page = entry.page.to_string();
            let page_width = text_width(&page, PdfFont::Regular, size);
            let page_x = MARGIN + CONTENT_WIDTH - page_width;
            let label_x = MARGIN + indent;
            let label = truncate_to_width(&entry.label(), size, page_x - label_x - 24.0);
            let label_end = label_x + text_width(&label, font, size);

            let dot_width = text_width(".", PdfFont::Regular, size);
            let gap = page_x - label_end - 8.0;
            let dots = if gap > 0.0 { (gap / dot_width) as usize } else { 0 };

            let baseline = self.cursor_y + size;
            self.draw_text(label_x, baseline, size, font, text, &label);
            self.draw_text(label_end + 4.0, baseline, size, PdfFont::Regular, text, &".".repeat(dots));
            self.draw_text(page_x, baseline, size, PdfFont::Regular, text, &page);
            self.cursor_y += line_height;
        }

        self.new_page();
    }

    fn heading(&mut self, heading: &NumberedHeading) {
        let size = self.template.heading_size(heading.level);
        let primary = self.color(&self.template.palette.primary);
        let mut runs = Vec::with_capacity(heading.runs.len() + 1);
        if let Some(number) = heading.number {
            runs.push(InlineRun {
                text: format!("{number} "),
                bold: true,
                italic: false,
            });
        }
        runs.extend(heading.runs.iter().map(|run| InlineRun {
            bold: true,
            ..run.clone()
        }));

        let lines = wrap_runs(&runs, size, CONTENT_WIDTH);
        let space_before = if self.at_page_top() { 0.0 } else { size * 0.6 };
        // Keep the heading with at least two lines of what follows.
        let needed = space_before
            + lines.len() as f32 * self.line_height(size)
            + 2.0 * self.line_height(self.template.body_size);
        if !self.ensure_space(needed) {
            self.cursor_y += space_before;
        }
        self.draw_lines(&lines, MARGIN, size, primary);
        self.cursor_y += self.template.paragraph_spacing * 0.5;
    }

    fn paragraph(&mut self, runs: &[InlineRun]) {
        let size = self.template.body_size;
        let lines = wrap_runs(runs, size, CONTENT_WIDTH);
        if lines.is_empty() {
            return;
        }
        let height = lines.len() as f32 * self.line_height(size);
        self.ensure_space(height.min(CONTENT_BOTTOM - CONTENT_TOP));
        let color = self.color(&self.template.palette.text);
        self.draw_lines(&lines, MARGIN, size, color);
        self.cursor_y += self.template.paragraph_spacing;
    }

    fn list_item(&mut self, runs: &[InlineRun], marker: ListMarker) {
        let size = self.template.body_size;
        let lines = wrap_runs(runs, size, CONTENT_WIDTH - LIST_TEXT_INDENT);
        let height = lines.len().max(1) as f32 * self.line_height(size);
        self.ensure_space(height.min(CONTENT_BOTTOM - CONTENT_TOP));

        let color = self.color(&self.template.palette.text);
        let baseline = self.cursor_y + size;
        self.draw_text(
            MARGIN + LIST_MARKER_INDENT,
            baseline,
            size,
            PdfFont::Regular,
            color,
            &marker.label(),
        );
        if lines.is_empty() {
            self.cursor_y += self.line_height(size);
        }
        self.draw_lines(&lines, MARGIN + LIST_TEXT_INDENT, size, color);
        self.cursor_y += self.template.paragraph_spacing * 0.5;
    }

    fn table(&mut self, rows: &[Vec<String>]) {
        let Some(header) = rows.first() else {
            return;
        };
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }

        let header_height = self.row_height_estimate(header, columns);
        self.ensure_space(header_height * 2.0);
        self.table_row(header, columns, true);

        for row in rows.iter().skip(1) {
            let height = self.row_height_estimate(row, columns);
            if self.ensure_space(height) {
                self.table_row(header, columns, true);
            }
            self.table_row(row, columns, false);
        }
        self.cursor_y += self.template.paragraph_spacing;
    }

    fn code(&mut self, text: &str) {
        let size = self.template.code_size;
        let line_height = self.line_height(size);
        let fill = self.color(&self.template.palette.code_fill);
        let color = self.color(&self.template.palette.text);
        let lines = wrap_code(text, size, CONTENT_WIDTH - 2.0 * CODE_PADDING);

        let height = lines.len() as f32 * line_height + 2.0 * CODE_PADDING;
        self.ensure_space(height.min(CONTENT_BOTTOM - CONTENT_TOP));

        let mut first = true;
        for line in lines {
            let broke = self.ensure_space(line_height + CODE_PADDING);
            let pad = if first || broke { CODE_PADDING } else { 0.0 };
            first = false;
            let top = self.cursor_y;
            self.current_page().items.push(CanvasItem::Rect {
                x: MARGIN,
                y: top,
                width: CONTENT_WIDTH,
                height: line_height + pad,
                fill: Some(fill),
                stroke: None,
            });
            self.cursor_y = top + pad;
            let line = vec![(PdfFont::Mono, line)];
            self.draw_line(&line, MARGIN + CODE_PADDING, size, color);
        }
        let bottom = self.cursor_y;
        self.current_page().items.push(CanvasItem::Rect {
            x: MARGIN,
            y: bottom,
            width: CONTENT_WIDTH,
            height: CODE_PADDING,
            fill: Some(fill),
            stroke: None,
        });
        self.cursor_y += CODE_PADDING + self.template.paragraph_spacing;
    }

    fn blank(&mut self) {
        if !self.at_page_top() {
            self.cursor_y += self.line_height(self.template.body_size) * 0.5;
        }
    }

    fn references(&mut self, heading: &NumberedHeading, note: &str) {
        self.heading(heading);
        let runs = [InlineRun {
            text: note.to_string(),
            bold: false,
            italic: true,
        }];
        self.paragraph(&runs);
    }

    fn finish(mut self) -> Result<PageCanvas> {
        self.decorate();
        Ok(self.canvas)
    }
}

pub fn line_width(line: &Line, size: f32) -> f32 {
    line.iter().map(|(font, text)| text_width(text, *font, size)).sum()
}

/// Greedy word wrap over styled runs. Words are whitespace-separated and may
/// span run boundaries (`**bold**.` keeps the period on the same word). A
/// word wider than the line is split by characters.
pub fn wrap_runs(runs: &[InlineRun], size: f32, max_width: f32) -> Vec<Line> {
    let words = split_words(runs);
    let mut lines = Vec::new();
    let mut line = Line::new();
    let mut width = 0.0f32;

    for word in words {
        let word_width = word
            .iter()
            .map(|(font, text)| text_width(text, *font, size))
            .sum::<f32>();
        let space_font = line.last().map(|(font, _)| *font).unwrap_or(PdfFont::Regular);
        let space_width = text_width(" ", space_font, size);

        if !line.is_empty() && width + space_width + word_width > max_width {
            lines.push(std::mem::take(&mut line));
            width = 0.0;
        }

        if word_width > max_width {
            for (font, text) in word {
                for character in text.chars() {
                    let character_width = text_width(character.encode_utf8(&mut [0; 4]), font, size);
                    if !line.is_empty() && width + character_width > max_width {
                        lines.push(std::mem::take(&mut line));
                        width = 0.0;
                    }
                    append(&mut line, font, &character.to_string());
                    width += character_width;
                }
            }
            continue;
        }

        if !line.is_empty() {
            append(&mut line, space_font, " ");
            width += space_width;
        }
        for (font, text) in word {
            append(&mut line, font, &text);
        }
        width += word_width;
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn append(line: &mut Line, font: PdfFont, text: &str) {
    match line.last_mut() {
        Some((last_font, last_text)) if *last_font == font => last_text.push_str(text),
        _ => line.push((font, text.to_string())),
    }
}

fn split_words(runs: &[InlineRun]) -> Vec<Line> {
    let mut words: Vec<Line> = Vec::new();
    let mut open = false;

    for run in runs {
        let font = PdfFont::for_style(run.bold, run.italic);
        for (index, piece) in run.text.split(char::is_whitespace).enumerate() {
            if index > 0 {
                open = false;
            }
            if piece.is_empty() {
                continue;
            }
            match words.last_mut() {
                Some(word) if open => append(word, font, piece),
                _ => words.push(vec![(font, piece.to_string())]),
            }
            open = true;
        }
    }

    words
}

/// Code keeps its spacing; long lines are hard-wrapped at the column limit.
pub fn wrap_code(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let columns = ((max_width / text_width(" ", PdfFont::Mono, size)) as usize).max(1);
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        let expanded = raw.replace('\t', &" ".repeat(TAB_WIDTH));
        let characters = expanded.chars().collect::<Vec<char>>();
        if characters.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in characters.chunks(columns) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

fn truncate_to_width(text: &str, size: f32, max_width: f32) -> String {
    if text_width(text, PdfFont::Regular, size) <= max_width {
        return text.to_string();
    }
    let ellipsis_width = text_width("...", PdfFont::Regular, size);
    let mut truncated = String::new();
    let mut width = 0.0f32;
    for character in text.chars() {
        let character_width = text_width(character.encode_utf8(&mut [0; 4]), PdfFont::Regular, size);
        if width + character_width + ellipsis_width > max_width {
            break;
        }
        truncated.push(character);
        width += character_width;
    }
    format!("{}...", truncated.trim_end())
}
