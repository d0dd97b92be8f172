//! Positioned page model and its PDF encoding.
//!
//! Coordinates are points from the top-left corner; text `y` is the
//! baseline. The encoder flips to PDF user space.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use serde::Serialize;

use crate::error::{ReportError, Result};

use super::metrics::{PdfFont, encode_win_ansi};

pub type Rgb = (f32, f32, f32);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CanvasItem {
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: PdfFont,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanvasPage {
    pub items: Vec<CanvasItem>,
}

impl CanvasPage {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            CanvasItem::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCanvas {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<CanvasPage>,
}

impl PageCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pages: vec![CanvasPage::default()],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of every page joined by newlines, in drawing order.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(CanvasPage::texts)
            .collect::<Vec<&str>>()
            .join("\n")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut fonts = Dictionary::new();
        for font in PdfFont::ALL {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }
        let resources_id = document.add_object(dictionary! {
            "Font" => fonts,
        });

        let mut kids = Vec::<Object>::new();
        for page in &self.pages {
            let content = Content {
                operations: self.page_operations(page),
            };
            let encoded = content.encode().map_err(export_error)?;
            let content_id = document.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), self.width.into(), self.height.into()],
        };
        document.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);
        document.compress();

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).map_err(export_error)?;
        Ok(bytes)
    }

    fn page_operations(&self, page: &CanvasPage) -> Vec<Operation> {
        let mut operations = Vec::new();
        for item in &page.items {
            match item {
                CanvasItem::Text {
                    x,
                    y,
                    size,
                    font,
                    color,
                    text,
                } => {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new(
                        "Tf",
                        vec![font.resource_name().into(), (*size).into()],
                    ));
                    operations.push(fill_color(*color));
                    operations.push(Operation::new(
                        "Td",
                        vec![(*x).into(), (self.height - *y).into()],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
                CanvasItem::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                } => {
                    let rect = vec![
                        (*x).into(),
                        (self.height - *y - *height).into(),
                        (*width).into(),
                        (*height).into(),
                    ];
                    if let Some(color) = fill {
                        operations.push(fill_color(*color));
                        operations.push(Operation::new("re", rect.clone()));
                        operations.push(Operation::new("f", vec![]));
                    }
                    if let Some(color) = stroke {
                        operations.push(stroke_color(*color));
                        operations.push(Operation::new("w", vec![0.5_f32.into()]));
                        operations.push(Operation::new("re", rect));
                        operations.push(Operation::new("S", vec![]));
                    }
                }
                CanvasItem::Line {
                    from,
                    to,
                    width,
                    color,
                } => {
                    operations.push(stroke_color(*color));
                    operations.push(Operation::new("w", vec![(*width).into()]));
                    operations.push(Operation::new(
                        "m",
                        vec![from.0.into(), (self.height - from.1).into()],
                    ));
                    operations.push(Operation::new(
                        "l",
                        vec![to.0.into(), (self.height - to.1).into()],
                    ));
                    operations.push(Operation::new("S", vec![]));
                }
            }
        }
        operations
    }
}

fn fill_color((r, g, b): Rgb) -> Operation {
    Operation::new("rg", vec![r.into(), g.into(), b.into()])
}

fn stroke_color((r, g, b): Rgb) -> Operation {
    Operation::new("RG", vec![r.into(), g.into(), b.into()])
}

fn export_error(err: impl std::fmt::Display) -> ReportError {
    ReportError::Export {
        format: "pdf",
        cause: err.to_string(),
    }
}
