//! Glyph widths of the standard Type1 fonts and WinAnsi encoding.
//!
//! Widths are in 1/1000 em, taken from the Adobe core font metrics for
//! printable ASCII. Oblique variants share their upright widths.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PdfFont {
    Regular,
    Bold,
    Italic,
    BoldItalic,
    Mono,
}

impl PdfFont {
    pub const ALL: [PdfFont; 5] = [
        PdfFont::Regular,
        PdfFont::Bold,
        PdfFont::Italic,
        PdfFont::BoldItalic,
        PdfFont::Mono,
    ];

    pub fn for_style(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => PdfFont::BoldItalic,
            (true, false) => PdfFont::Bold,
            (false, true) => PdfFont::Italic,
            (false, false) => PdfFont::Regular,
        }
    }

    pub fn resource_name(self) -> &'static str {
        match self {
            PdfFont::Regular => "F1",
            PdfFont::Bold => "F2",
            PdfFont::Italic => "F3",
            PdfFont::BoldItalic => "F4",
            PdfFont::Mono => "F5",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            PdfFont::Regular => "Helvetica",
            PdfFont::Bold => "Helvetica-Bold",
            PdfFont::Italic => "Helvetica-Oblique",
            PdfFont::BoldItalic => "Helvetica-BoldOblique",
            PdfFont::Mono => "Courier",
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, PdfFont::Bold | PdfFont::BoldItalic)
    }
}

const MONO_WIDTH: u16 = 600;
const FALLBACK_WIDTH: u16 = 556;

// ' ' (32) through '~' (126).
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a'..'m'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n'..'z'
    389, 280, 389, 584, // '{'..'~'
];

pub fn char_width(character: char, font: PdfFont) -> u16 {
    if font == PdfFont::Mono {
        return MONO_WIDTH;
    }
    let table = if font.is_bold() {
        &HELVETICA_BOLD
    } else {
        &HELVETICA
    };
    match character {
        ' '..='~' => table[character as usize - 32],
        '\u{2022}' => 350,
        '\u{2013}' => 556,
        '\u{2014}' => 1000,
        '\u{2018}' | '\u{2019}' => 222,
        '\u{201C}' | '\u{201D}' => 333,
        '\u{2026}' => 1000,
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, font: PdfFont, size: f32) -> f32 {
    let units = text
        .chars()
        .map(|character| u32::from(char_width(character, font)))
        .sum::<u32>();
    units as f32 * size / 1000.0
}

/// Encode for a WinAnsi Type1 font. Characters outside the code page become
/// `?`; control characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(character: char) -> u8 {
    match character {
        '\t' | '\n' | '\r' => b' ',
        ' '..='~' => character as u8,
        '\u{00A0}'..='\u{00FF}' => character as u32 as u8,
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => b'?',
    }
}
