use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization as _;

/// The standard PDF font faces used by the form. They are referenced by name and never embedded,
/// so every conforming reader draws them with the same advance widths tabulated below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
}

impl StandardFont {
    pub const ALL: [StandardFont; 3] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
    ];

    /// The name of the font as expected in the `BaseFont` entry of the font dictionary.
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
        }
    }

    /// The key under which the font is registered in the resources of the page.
    pub fn resource_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::HelveticaBold => "F2",
            StandardFont::HelveticaOblique => "F3",
        }
    }

    fn widths(&self) -> &'static [u16; 224] {
        match self {
            // The oblique face shares the advance widths of the upright one
            StandardFont::Helvetica | StandardFont::HelveticaOblique => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// The advance width of a single WinAnsi code, in thousandths of the font size.
    fn code_width(&self, code: u8) -> u16 {
        if code < FIRST_CODE {
            return 0;
        }
        self.widths()[(code - FIRST_CODE) as usize]
    }

    /// Measures the width in points of `text` drawn with this font at `font_size`.
    ///
    /// The text goes through the same encoding as the one used when drawing it, so a character
    /// missing from the encoding is measured as the replacement that ends up on the page.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|code| u32::from(self.code_width(code)))
            .sum();
        units as f32 * font_size / 1000.0
    }
}

/// Encodes the text into WinAnsi bytes after normalizing it into the NFC form, the only encoding
/// the standard fonts understand without embedding anything. Characters outside of the encoding
/// are replaced by a question mark.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.nfc()
        .map(|character| {
            win_ansi_code(character).unwrap_or_else(|| {
                log::warn!(
                    "The character {:?} is not available in the standard fonts, replacing it",
                    character
                );
                b'?'
            })
        })
        .collect()
}

/// Maps a character to its WinAnsi code, if it has one.
pub fn win_ansi_code(character: char) -> Option<u8> {
    let codepoint = character as u32;
    match codepoint {
        0x20..=0x7e | 0xa0..=0xff => Some(codepoint as u8),
        _ => match character {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8a),
            '‹' => Some(0x8b),
            'Œ' => Some(0x8c),
            'Ž' => Some(0x8e),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9a),
            '›' => Some(0x9b),
            'œ' => Some(0x9c),
            'ž' => Some(0x9e),
            'Ÿ' => Some(0x9f),
            // Tabs and other control characters are drawn as plain spaces
            '\t' | '\n' | '\r' => Some(0x20),
            _ => None,
        },
    }
}

const FIRST_CODE: u8 = 32;

/// Advance widths of Helvetica (and Helvetica-Oblique) for the WinAnsi codes 32 to 255,
/// taken from the Adobe font metrics.
#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// Advance widths of Helvetica-Bold for the WinAnsi codes 32 to 255.
#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];
