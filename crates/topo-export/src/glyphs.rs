//! 5×7 bitmap glyphs for text drawn into raster exports.
//!
//! Each glyph row is a 5-bit pattern, most significant bit on the left.
//! Text is laid out on a cell grid scaled from the font size and turned
//! into a fill path, so it goes through the same transform and clip mask
//! as the rest of the overlay.

use tiny_skia::{Path, PathBuilder};
use topo_core::types::Point;

type Glyph = [u8; ROWS];

const ROWS: usize = 7;
const COLS: usize = 5;
/// Horizontal cells per character, one-cell gap included.
const ADVANCE: usize = COLS + 1;
/// Cell edge as a fraction of the font size; a capital spans 0.7 em.
const CELL_PER_EM: f64 = 0.1;
/// Horizontal shift per unit of height above the baseline.
const ITALIC_SLANT: f64 = 0.2;
/// Extra run width in cells for bold text.
const BOLD_WIDEN: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
}

const UPPER: [Glyph; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

const LOWER: [Glyph; 26] = [
    [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F], // a
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E], // b
    [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E], // c
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F], // d
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E], // e
    [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08], // f
    [0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E], // g
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11], // h
    [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E], // i
    [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C], // j
    [0x08, 0x08, 0x09, 0x0A, 0x0C, 0x0A, 0x09], // k
    [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // l
    [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11], // m
    [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11], // n
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E], // o
    [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10], // p
    [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01], // q
    [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10], // r
    [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E], // s
    [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06], // t
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D], // u
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04], // v
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A], // w
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11], // x
    [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E], // y
    [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F], // z
];

const DIGITS: [Glyph; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
];

const PUNCTUATION: [(char, Glyph); 11] = [
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    ('\'', [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('/', [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00]),
    ('&', [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D]),
    (':', [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('?', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04]),
];

/// Glyph rows for `c`. Accented Latin letters fall back to their base
/// letter; anything else without a glyph gives `None`.
pub fn glyph(c: char) -> Option<Glyph> {
    let c = fold_accent(c);
    match c {
        'A'..='Z' => Some(UPPER[(c as u8 - b'A') as usize]),
        'a'..='z' => Some(LOWER[(c as u8 - b'a') as usize]),
        '0'..='9' => Some(DIGITS[(c as u8 - b'0') as usize]),
        ' ' => Some([0; ROWS]),
        _ => PUNCTUATION.iter().find(|(p, _)| *p == c).map(|(_, g)| *g),
    }
}

fn fold_accent(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'ß' => 's',
        '’' | '‘' => '\'',
        '–' | '—' => '-',
        _ => c,
    }
}

/// Advance width of `text` at font size `size`, without the trailing gap.
pub fn text_width(text: &str, size: f64) -> f64 {
    let n = text.chars().count();
    if n == 0 {
        return 0.0;
    }
    (n * ADVANCE - 1) as f64 * size * CELL_PER_EM
}

/// Fill path for `text`, centered on `anchor.x` with its baseline at
/// `anchor.y` (the SVG `text-anchor="middle"` placement). Characters
/// without a glyph keep their advance but draw nothing. `None` when
/// nothing is lit.
pub fn text_path(text: &str, anchor: Point, size: f64, style: TextStyle) -> Option<Path> {
    if size.is_nan() || size <= 0.0 {
        return None;
    }
    let cell = size * CELL_PER_EM;
    let left = anchor.x - text_width(text, size) / 2.0;
    let top = anchor.y - ROWS as f64 * cell;
    let widen = if style.bold { BOLD_WIDEN * cell } else { 0.0 };
    let slant = if style.italic { ITALIC_SLANT } else { 0.0 };
    let shear = |x: f64, y: f64| ((x + slant * (anchor.y - y)) as f32, y as f32);

    let mut pb = PathBuilder::new();
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin = left + (i * ADVANCE) as f64 * cell;
        for (r, bits) in rows.iter().enumerate() {
            let y0 = top + r as f64 * cell;
            let y1 = y0 + cell;
            for (start, len) in lit_runs(*bits) {
                let x0 = origin + start as f64 * cell;
                let x1 = x0 + len as f64 * cell + widen;
                let (ax, ay) = shear(x0, y0);
                pb.move_to(ax, ay);
                let (bx, by) = shear(x1, y0);
                pb.line_to(bx, by);
                let (cx, cy) = shear(x1, y1);
                pb.line_to(cx, cy);
                let (dx, dy) = shear(x0, y1);
                pb.line_to(dx, dy);
                pb.close();
            }
        }
    }
    pb.finish()
}

/// `(first column, length)` of each run of lit cells in a glyph row.
fn lit_runs(bits: u8) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for col in 0..=COLS {
        let lit = col < COLS && (bits >> (COLS - 1 - col)) & 1 == 1;
        match (lit, start) {
            (true, None) => start = Some(col),
            (false, Some(s)) => {
                runs.push((s, col - s));
                start = None;
            }
            _ => {}
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumerics_have_glyphs() {
        for c in ('A'..='Z').chain('a'..='z').chain('0'..='9') {
            let rows = glyph(c).unwrap_or_else(|| panic!("No glyph for {c:?}"));
            assert!(rows.iter().any(|r| *r != 0), "Glyph for {c:?} is blank");
            assert!(rows.iter().all(|r| *r < 1 << COLS), "Glyph for {c:?} is too wide");
        }
        assert_eq!(glyph(' '), Some([0; ROWS]));
        assert_eq!(glyph('\''), glyph('’'));
    }

    #[test]
    fn test_accents_fold_to_base_letter() {
        assert_eq!(glyph('é'), glyph('e'));
        assert_eq!(glyph('Ö'), glyph('O'));
        assert_eq!(glyph('ñ'), glyph('n'));
        assert_eq!(glyph('★'), None);
    }

    #[test]
    fn test_lit_runs() {
        assert_eq!(lit_runs(0b10111), vec![(0, 1), (2, 3)]);
        assert_eq!(lit_runs(0b11111), vec![(0, 5)]);
        assert_eq!(lit_runs(0b01010), vec![(1, 1), (3, 1)]);
        assert!(lit_runs(0).is_empty());
    }

    #[test]
    fn test_text_is_centered_on_anchor() {
        let anchor = Point::new(50.0, 40.0);
        let path = text_path("HIH", anchor, 10.0, TextStyle::default()).unwrap();
        let bounds = path.bounds();
        // Three advances of 6 cells less the trailing gap, 1 mm per cell.
        assert!((bounds.width() - 17.0).abs() < 1e-3, "width {}", bounds.width());
        assert!((bounds.left() as f64 - 41.5).abs() < 1e-3);
        assert!((bounds.right() as f64 - 58.5).abs() < 1e-3);
        assert!((bounds.bottom() as f64 - 40.0).abs() < 1e-3, "Baseline at the anchor");
        assert!((bounds.top() as f64 - 33.0).abs() < 1e-3, "Capitals span 0.7 em");
        assert!((text_width("HIH", 10.0) - 17.0).abs() < 1e-9);
    }

    #[test]
    fn test_italic_leans_right() {
        let anchor = Point::new(0.0, 0.0);
        let upright = text_path("I", anchor, 10.0, TextStyle::default()).unwrap();
        let italic = text_path(
            "I",
            anchor,
            10.0,
            TextStyle {
                italic: true,
                ..TextStyle::default()
            },
        )
        .unwrap();
        assert_eq!(italic.bounds().bottom(), upright.bounds().bottom());
        assert!(italic.bounds().right() > upright.bounds().right());
    }

    #[test]
    fn test_blank_text_has_no_path() {
        let anchor = Point::new(10.0, 10.0);
        assert!(text_path("", anchor, 4.0, TextStyle::default()).is_none());
        assert!(text_path("   ", anchor, 4.0, TextStyle::default()).is_none());
        assert!(text_path("★", anchor, 4.0, TextStyle::default()).is_none());
        assert!(text_path("A", anchor, 0.0, TextStyle::default()).is_none());
    }
}
