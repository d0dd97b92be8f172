use serde::{Deserialize, Serialize};
use tracing::warn;

/// RGB color as hex without the leading `#`, e.g. `"1F2937"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub accent: String,
    pub text: String,
    pub muted: String,
    pub table_header_fill: String,
    pub code_fill: String,
}

/// Presentational style tokens. Sizes are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub title_size: f32,
    pub heading_sizes: [f32; 4],
    pub body_size: f32,
    pub code_size: f32,
    pub line_spacing: f32,
    pub paragraph_spacing: f32,
    pub palette: Palette,
    pub numbered_sections: bool,
    pub header_rule: bool,
    pub uppercase_top_headings: bool,
}

pub const BUILTIN_TEMPLATE_IDS: [&str; 5] = ["standard", "academic", "business", "technical", "minimal"];

impl Template {
    pub fn builtin(id: &str) -> Option<Template> {
        let template = match id {
            "standard" => Template {
                id: "standard".to_string(),
                name: "Standard".to_string(),
                ..base()
            },
            "academic" => Template {
                id: "academic".to_string(),
                name: "Academic".to_string(),
                title_size: 20.0,
                heading_sizes: [14.0, 12.5, 11.5, 11.0],
                body_size: 11.0,
                line_spacing: 1.5,
                palette: Palette {
                    primary: "000000".to_string(),
                    accent: "333333".to_string(),
                    ..base().palette
                },
                numbered_sections: true,
                uppercase_top_headings: true,
                ..base()
            },
            "business" => Template {
                id: "business".to_string(),
                name: "Business".to_string(),
                palette: Palette {
                    primary: "1E3A8A".to_string(),
                    accent: "2563EB".to_string(),
                    table_header_fill: "DBEAFE".to_string(),
                    ..base().palette
                },
                header_rule: true,
                ..base()
            },
            "technical" => Template {
                id: "technical".to_string(),
                name: "Technical".to_string(),
                heading_sizes: [16.0, 13.0, 12.0, 11.0],
                body_size: 10.5,
                code_size: 8.5,
                palette: Palette {
                    primary: "0F766E".to_string(),
                    accent: "14B8A6".to_string(),
                    code_fill: "ECFDF5".to_string(),
                    ..base().palette
                },
                numbered_sections: true,
                ..base()
            },
            "minimal" => Template {
                id: "minimal".to_string(),
                name: "Minimal".to_string(),
                title_size: 18.0,
                heading_sizes: [14.0, 12.0, 11.0, 10.5],
                palette: Palette {
                    primary: "111111".to_string(),
                    accent: "111111".to_string(),
                    ..base().palette
                },
                header_rule: false,
                ..base()
            },
            _ => return None,
        };
        Some(template)
    }

    /// Built-in template by id, falling back to `standard`.
    pub fn resolve(id: &str) -> Template {
        match Template::builtin(id) {
            Some(template) => template,
            None => {
                warn!(template = %id, "unknown template, using standard");
                base()
            }
        }
    }

    /// Size for heading `level` (1..=4); deeper levels reuse level 4.
    pub fn heading_size(&self, level: u8) -> f32 {
        let index = usize::from(level.clamp(1, 4)) - 1;
        self.heading_sizes[index]
    }
}

fn base() -> Template {
    Template {
        id: "standard".to_string(),
        name: "Standard".to_string(),
        title_size: 22.0,
        heading_sizes: [16.0, 14.0, 12.0, 11.0],
        body_size: 11.0,
        code_size: 9.0,
        line_spacing: 1.35,
        paragraph_spacing: 6.0,
        palette: Palette {
            primary: "1F2937".to_string(),
            accent: "4F46E5".to_string(),
            text: "111827".to_string(),
            muted: "6B7280".to_string(),
            table_header_fill: "E5E7EB".to_string(),
            code_fill: "F3F4F6".to_string(),
        },
        numbered_sections: false,
        header_rule: true,
        uppercase_top_headings: false,
    }
}

/// `"1F2937"` → `(0.12, 0.16, 0.22)`; malformed input is black.
pub fn hex_to_rgb(hex: &str) -> (f32, f32, f32) {
    let hex = hex.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return (0.0, 0.0, 0.0);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map(|value| f32::from(value) / 255.0)
            .unwrap_or(0.0)
    };
    (channel(0..2), channel(2..4), channel(4..6))
}
