//! LaTeX source renderer. LaTeX paginates and numbers sections itself, so
//! the estimated contents entries are replaced by `\tableofcontents` and
//! numbered headings map onto `\section`/`\subsection`.

use crate::error::Result;
use crate::markdown::{InlineRun, strip_inline_markers};

use super::numbering::NumberedHeading;
use super::toc::TocEntry;
use super::{BlockRenderer, CoverPage, ExportOptions, ListMarker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Itemize,
    Enumerate,
}

impl ListKind {
    fn environment(self) -> &'static str {
        match self {
            ListKind::Itemize => "itemize",
            ListKind::Enumerate => "enumerate",
        }
    }
}

pub struct LatexRenderer {
    title: String,
    body: String,
    open_list: Option<ListKind>,
}

impl LatexRenderer {
    pub fn new(options: &ExportOptions) -> Self {
        Self {
            title: options.title.trim().to_string(),
            body: String::new(),
            open_list: None,
        }
    }

    fn line(&mut self, text: &str) {
        self.body.push_str(text);
        self.body.push('\n');
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.open_list.take() {
            self.line(&format!("\\end{{{}}}", kind.environment()));
            self.line("");
        }
    }

    fn preamble(&self) -> String {
        let title = escape(&self.title);
        [
            "\\documentclass[12pt,a4paper]{article}",
            "\\usepackage[utf8]{inputenc}",
            "\\usepackage[T1]{fontenc}",
            "\\usepackage[margin=2.5cm]{geometry}",
            "\\usepackage{fancyhdr}",
            "\\usepackage{hyperref}",
            "",
            "\\pagestyle{fancy}",
            "\\fancyhf{}",
            format!("\\fancyhead[L]{{\\small\\itshape {title}}}").as_str(),
            "\\fancyfoot[C]{\\thepage}",
            "",
            format!("\\title{{{title}}}").as_str(),
            "\\date{}",
            "",
        ]
        .join("\n")
    }
}

impl BlockRenderer for LatexRenderer {
    type Output = String;

    fn title_block(&mut self, _title: &str, subtitle: &str) {
        self.line("\\maketitle");
        self.line(&format!("\\begin{{center}}\\small {}\\end{{center}}", escape(subtitle)));
        self.line("");
    }

    fn cover_page(&mut self, cover: &CoverPage) {
        self.line("\\begin{titlepage}");
        self.line("\\centering");
        if let Some(institution) = &cover.institution {
            self.line(&format!("{{\\Large\\bfseries {}\\par}}", escape(&institution.to_uppercase())));
        }
        if let Some(department) = &cover.department {
            self.line(&format!("{{\\large {}\\par}}", escape(department)));
        }
        self.line("\\vspace{3cm}");
        self.line(&format!("{{\\huge\\bfseries {}\\par}}", escape(&cover.title)));
        self.line("\\vspace{0.5cm}");
        self.line(&format!("{{\\large\\itshape {}\\par}}", escape(&cover.report_type)));
        if let Some(course) = &cover.course {
            self.line(&format!("{{\\normalsize {}\\par}}", escape(course)));
        }
        self.line("\\vfill");
        if let Some(author) = &cover.author {
            self.line("Submitted by\\par");
            self.line(&format!("{{\\large\\bfseries {}\\par}}", escape(author)));
        }
        if let Some(student_id) = &cover.student_id {
            self.line(&format!("Student ID: {}\\par", escape(student_id)));
        }
        if let Some(supervisor) = &cover.supervisor {
            self.line("\\vspace{0.8cm}");
            self.line("Supervised by\\par");
            self.line(&format!("{{\\large\\bfseries {}\\par}}", escape(supervisor)));
        }
        if let Some(date) = &cover.date {
            self.line("\\vspace{0.8cm}");
            self.line(&format!("{}\\par", escape(date)));
        }
        self.line("\\end{titlepage}");
        self.line("");
    }

    fn table_of_contents(&mut self, _entries: &[TocEntry]) {
        self.line("\\tableofcontents");
        self.line("\\newpage");
        self.line("");
    }

    fn heading(&mut self, heading: &NumberedHeading) {
        self.close_list();
        let command = match (heading.level, heading.number.is_some()) {
            (1, true) => "section",
            (1, false) => "section*",
            (2, true) => "subsection",
            (2, false) => "subsection*",
            (3, _) => "subsubsection*",
            _ => "paragraph*",
        };
        self.line(&format!("\\{command}{{{}}}", runs_to_latex(&heading.runs)));
        self.line("");
    }

    fn paragraph(&mut self, runs: &[InlineRun]) {
        self.close_list();
        self.line(&runs_to_latex(runs));
        self.line("");
    }

    fn list_item(&mut self, runs: &[InlineRun], marker: ListMarker) {
        let kind = match marker {
            ListMarker::Bullet => ListKind::Itemize,
            ListMarker::Ordinal(_) => ListKind::Enumerate,
        };
        if self.open_list != Some(kind) {
            self.close_list();
            self.line(&format!("\\begin{{{}}}", kind.environment()));
            self.open_list = Some(kind);
        }
        self.line(&format!("  \\item {}", runs_to_latex(runs)));
    }

    fn table(&mut self, rows: &[Vec<String>]) {
        self.close_list();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let spec = vec!["l"; columns].join("|");
        self.line("\\begin{center}");
        self.line(&format!("\\begin{{tabular}}{{|{spec}|}}"));
        self.line("\\hline");
        for (index, row) in rows.iter().enumerate() {
            let cells = (0..columns)
                .map(|column| {
                    let text = row
                        .get(column)
                        .map(|cell| escape(&strip_inline_markers(cell)))
                        .unwrap_or_default();
                    if index == 0 {
                        format!("\\textbf{{{text}}}")
                    } else {
                        text
                    }
                })
                .collect::<Vec<String>>();
            self.line(&format!("{} \\\\", cells.join(" & ")));
            self.line("\\hline");
        }
        self.line("\\end{tabular}");
        self.line("\\end{center}");
        self.line("");
    }

    fn code(&mut self, text: &str) {
        self.close_list();
        self.line("\\begin{verbatim}");
        // The kernel verbatim ends on the exact text `\end{verbatim}`; a space
        // before the brace keeps a quoted terminator literal.
        self.line(&text.replace("\\end{verbatim}", "\\end {verbatim}"));
        self.line("\\end{verbatim}");
        self.line("");
    }

    fn blank(&mut self) {}

    fn references(&mut self, heading: &NumberedHeading, note: &str) {
        self.heading(heading);
        self.line(&format!("\\textit{{{}}}", escape(note)));
        self.line("");
    }

    fn finish(mut self) -> Result<String> {
        self.close_list();
        let mut document = self.preamble();
        document.push_str("\\begin{document}\n\n");
        document.push_str(&self.body);
        document.push_str("\\end{document}\n");
        Ok(document)
    }
}

fn runs_to_latex(runs: &[InlineRun]) -> String {
    runs.iter()
        .map(|run| {
            let text = escape(&run.text);
            match (run.bold, run.italic) {
                (true, true) => format!("\\textbf{{\\textit{{{text}}}}}"),
                (true, false) => format!("\\textbf{{{text}}}"),
                (false, true) => format!("\\textit{{{text}}}"),
                (false, false) => text,
            }
        })
        .collect()
}

/// Escape LaTeX special characters in running text.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => escaped.push_str("\\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(character);
            }
            '~' => escaped.push_str("\\textasciitilde{}"),
            '^' => escaped.push_str("\\textasciicircum{}"),
            _ => escaped.push(character),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape("50% of $x_1 & {y}"), "50\\% of \\$x\\_1 \\& \\{y\\}");
        assert_eq!(escape("a\\b~c^d#"), "a\\textbackslash{}b\\textasciitilde{}c\\textasciicircum{}d\\#");
    }

    #[test]
    fn inline_runs_map_to_text_commands() {
        let runs = vec![
            InlineRun {
                text: "plain ".to_string(),
                bold: false,
                italic: false,
            },
            InlineRun {
                text: "bold".to_string(),
                bold: true,
                italic: false,
            },
            InlineRun {
                text: "it_".to_string(),
                bold: false,
                italic: true,
            },
        ];
        assert_eq!(runs_to_latex(&runs), "plain \\textbf{bold}\\textit{it\\_}");
    }
}
