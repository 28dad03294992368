//! Line geometry for box wireframes and 3D text labels

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// A line segment in world space
pub type Segment = [Point3<f32>; 2];

/// Horizontal distance between consecutive characters, in cell units
const GLYPH_ADVANCE: f32 = 1.5;
/// Height of the glyph cell, in cell units
const GLYPH_HEIGHT: f32 = 2.0;

/// The 12 edges of an oriented cuboid centered at `translation` with
/// extents `x`, `y`, `z` along its local axes.
pub fn cuboid_segments(
    translation: &Point3<f32>,
    rotation: &UnitQuaternion<f32>,
    x: f32,
    y: f32,
    z: f32,
) -> Vec<Segment> {
    let half = Vector3::new(x, y, z) * 0.5;
    let corner = |bits: usize| {
        let local = Vector3::new(
            if bits & 1 == 0 { -half.x } else { half.x },
            if bits & 2 == 0 { -half.y } else { half.y },
            if bits & 4 == 0 { -half.z } else { half.z },
        );
        translation + rotation * local
    };

    let mut segments = Vec::with_capacity(12);
    for a in 0..8usize {
        for axis in [1usize, 2, 4] {
            if a & axis == 0 {
                segments.push([corner(a), corner(a | axis)]);
            }
        }
    }
    segments
}

// Sixteen-segment cell, 1 wide and 2 tall, origin at the bottom left
const TL: (f32, f32) = (0.0, 2.0);
const TM: (f32, f32) = (0.5, 2.0);
const TR: (f32, f32) = (1.0, 2.0);
const ML: (f32, f32) = (0.0, 1.0);
const MM: (f32, f32) = (0.5, 1.0);
const MR: (f32, f32) = (1.0, 1.0);
const BL: (f32, f32) = (0.0, 0.0);
const BM: (f32, f32) = (0.5, 0.0);
const BR: (f32, f32) = (1.0, 0.0);

const STROKES: [((f32, f32), (f32, f32)); 16] = [
    (TL, TM), // 0  top left
    (TM, TR), // 1  top right
    (TR, MR), // 2  upper right
    (MR, BR), // 3  lower right
    (BR, BM), // 4  bottom right
    (BM, BL), // 5  bottom left
    (BL, ML), // 6  lower left
    (ML, TL), // 7  upper left
    (ML, MM), // 8  middle left
    (MM, MR), // 9  middle right
    (TL, MM), // 10 diagonal from top left
    (TM, MM), // 11 upper stem
    (TR, MM), // 12 diagonal from top right
    (MM, BL), // 13 diagonal to bottom left
    (MM, BM), // 14 lower stem
    (MM, BR), // 15 diagonal to bottom right
];

const OUTLINE: &[usize] = &[0, 1, 2, 3, 4, 5, 6, 7];

/// Stroke indices lighting up `c`. Lowercase letters share the uppercase
/// glyphs; anything without a glyph is drawn as an empty box.
fn glyph(c: char) -> &'static [usize] {
    match c.to_ascii_uppercase() {
        '0' => &[0, 1, 2, 3, 4, 5, 6, 7, 12, 13],
        '1' => &[2, 3],
        '2' => &[0, 1, 2, 9, 8, 6, 5, 4],
        '3' => &[0, 1, 2, 3, 4, 5, 9],
        '4' => &[7, 8, 9, 2, 3],
        '5' | 'S' => &[0, 1, 7, 8, 9, 3, 4, 5],
        '6' => &[0, 1, 7, 6, 5, 4, 3, 8, 9],
        '7' => &[0, 1, 2, 3],
        '8' => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        '9' => &[0, 1, 2, 3, 4, 5, 7, 8, 9],
        'A' => &[0, 1, 2, 3, 6, 7, 8, 9],
        'B' => &[0, 1, 2, 3, 4, 5, 9, 11, 14],
        'C' => &[0, 1, 7, 6, 5, 4],
        'D' => &[0, 1, 2, 3, 4, 5, 11, 14],
        'E' => &[0, 1, 7, 6, 5, 4, 8],
        'F' => &[0, 1, 7, 6, 8],
        'G' => &[0, 1, 7, 6, 5, 4, 3, 9],
        'H' => &[7, 6, 2, 3, 8, 9],
        'I' => &[0, 1, 11, 14, 5, 4],
        'J' => &[2, 3, 4, 5, 6],
        'K' => &[7, 6, 8, 12, 15],
        'L' => &[7, 6, 5, 4],
        'M' => &[7, 6, 2, 3, 10, 12],
        'N' => &[7, 6, 2, 3, 10, 15],
        'O' => OUTLINE,
        'P' => &[0, 1, 2, 7, 6, 8, 9],
        'Q' => &[0, 1, 2, 3, 4, 5, 6, 7, 15],
        'R' => &[0, 1, 2, 7, 6, 8, 9, 15],
        'T' => &[0, 1, 11, 14],
        'U' => &[7, 6, 5, 4, 3, 2],
        'V' => &[7, 6, 13, 12],
        'W' => &[7, 6, 2, 3, 13, 15],
        'X' => &[10, 12, 13, 15],
        'Y' => &[10, 12, 14],
        'Z' => &[0, 1, 12, 13, 5, 4],
        '-' => &[8, 9],
        '_' => &[5, 4],
        '.' => &[5],
        '/' => &[12, 13],
        '+' => &[8, 9, 11, 14],
        ' ' => &[],
        _ => OUTLINE,
    }
}

/// Line segments spelling `text` on the local XY plane of `rotation`,
/// starting at `origin` and reading along local +X. Characters are
/// `scale` tall.
pub fn text_segments(
    text: &str,
    origin: &Point3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale: f32,
) -> Vec<Segment> {
    let unit = scale / GLYPH_HEIGHT;
    let place = |column: usize, (x, y): (f32, f32)| {
        let local = Vector3::new((column as f32 * GLYPH_ADVANCE + x) * unit, y * unit, 0.0);
        origin + rotation * local
    };

    text.chars()
        .enumerate()
        .flat_map(|(column, c)| {
            glyph(c)
                .iter()
                .map(move |&stroke| {
                    let (from, to) = STROKES[stroke];
                    (column, from, to)
                })
        })
        .map(|(column, from, to)| [place(column, from), place(column, to)])
        .collect()
}
