use std::ops::Deref;

use tracing::trace;

use super::error::{QRError, QRResult};
use crate::builder::{Color, QR};

// Mask pattern
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord, Hash)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> QRResult<Self> {
        if pattern >= 8 {
            return Err(QRError::InvalidMaskingPattern);
        }
        Ok(Self(pattern))
    }

    pub fn all() -> impl Iterator<Item = MaskPattern> {
        (0..8).map(MaskPattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Mask functions take (row, column) and return true where the module flips
mod mask_functions {
    pub fn checkerboard(r: i16, c: i16) -> bool {
        (r + c) & 1 == 0
    }

    pub fn horizontal_lines(r: i16, _: i16) -> bool {
        r & 1 == 0
    }

    pub fn vertical_lines(_: i16, c: i16) -> bool {
        c % 3 == 0
    }

    pub fn diagonal_lines(r: i16, c: i16) -> bool {
        (r + c) % 3 == 0
    }

    pub fn large_checkerboard(r: i16, c: i16) -> bool {
        ((r >> 1) + (c / 3)) & 1 == 0
    }

    pub fn fields(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        (rc & 1) + (rc % 3) == 0
    }

    pub fn diamonds(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        ((rc & 1) + (rc % 3)) & 1 == 0
    }

    pub fn meadow(r: i16, c: i16) -> bool {
        let rc = r as i32 * c as i32;
        ((rc % 3) + ((r + c) as i32 & 1)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_functions(self) -> fn(i16, i16) -> bool {
        match *self {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Mask pattern is checked on construction"),
        }
    }
}


// Mask selection
//------------------------------------------------------------------------------

/// Tries all 8 masks on copies of `qr` and applies the one with the lowest
/// penalty. Ties go to the lowest mask index.
pub fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = MaskPattern::all()
        .min_by_key(|&m| {
            let mut qr = qr.clone();
            qr.apply_mask(m);
            let penalty = compute_total_penalty(&qr);
            trace!(mask = *m, penalty, "Scored mask");
            penalty
        })
        .unwrap_or(MaskPattern(0));
    qr.apply_mask(best_mask);
    best_mask
}

pub fn compute_total_penalty(qr: &QR) -> u32 {
    let w = qr.width();
    let grid = (0..w as i16)
        .flat_map(|r| (0..w as i16).map(move |c| (r, c)))
        .map(|(r, c)| *qr.get(r, c) == Color::Dark)
        .collect::<Vec<_>>();
    let grid = DarkGrid { w, h: w, grid: &grid };

    let adj_pen = compute_adjacent_penalty(&grid);
    let blk_pen = compute_block_penalty(&grid);
    let fp_pen = compute_finder_pattern_penalty(&grid);
    let bal_pen = compute_balance_penalty(&grid);
    adj_pen + blk_pen + fp_pen + bal_pen
}

// Row-major dark flags
struct DarkGrid<'a> {
    w: usize,
    h: usize,
    grid: &'a [bool],
}

impl DarkGrid<'_> {
    fn get(&self, r: usize, c: usize) -> bool {
        self.grid[r * self.w + c]
    }

    // Lines of the grid, rows first when `horizontal`
    fn line(&self, i: usize, horizontal: bool) -> Vec<bool> {
        if horizontal {
            (0..self.w).map(|c| self.get(i, c)).collect()
        } else {
            (0..self.h).map(|r| self.get(r, i)).collect()
        }
    }

    fn lines(&self) -> impl Iterator<Item = Vec<bool>> + '_ {
        let rows = (0..self.h).map(|r| self.line(r, true));
        let cols = (0..self.w).map(|c| self.line(c, false));
        rows.chain(cols)
    }
}

// N1: runs of 5 or more same colored modules cost (run length - 2)
fn compute_adjacent_penalty(grid: &DarkGrid) -> u32 {
    let run_penalty = |run: u32| if run >= 5 { run - 2 } else { 0 };
    let mut pen = 0;
    for line in grid.lines() {
        let mut run = 0;
        let mut last = None;
        for &dark in line.iter() {
            if last == Some(dark) {
                run += 1;
            } else {
                pen += run_penalty(run);
                run = 1;
                last = Some(dark);
            }
        }
        pen += run_penalty(run);
    }
    pen
}

// N2: 3 for every 2x2 block of a single color
fn compute_block_penalty(grid: &DarkGrid) -> u32 {
    let mut pen = 0;
    for r in 0..grid.h.saturating_sub(1) {
        for c in 0..grid.w.saturating_sub(1) {
            let clr = grid.get(r, c);
            if clr == grid.get(r, c + 1) && clr == grid.get(r + 1, c) && clr == grid.get(r + 1, c + 1)
            {
                pen += 3;
            }
        }
    }
    pen
}

// N3: 40 for every 1:1:3:1:1 pattern with 4 light modules inside the symbol on either side
fn compute_finder_pattern_penalty(grid: &DarkGrid) -> u32 {
    const PATTERN: [bool; 7] = [true, false, true, true, true, false, true];
    let is_light = |line: &[bool]| line.iter().all(|&d| !d);

    let mut pen = 0;
    for line in grid.lines() {
        let n = line.len();
        for x in 0..n.saturating_sub(6) {
            if line[x..x + 7] != PATTERN {
                continue;
            }
            let light_after = x + 10 < n && is_light(&line[x + 7..x + 11]);
            let light_before = x >= 4 && is_light(&line[x - 4..x]);
            if light_after || light_before {
                pen += 40;
            }
        }
    }
    pen
}

// N4: 10 for every full 5% the dark share deviates from 50%
fn compute_balance_penalty(grid: &DarkGrid) -> u32 {
    let total = grid.w * grid.h;
    let dark = grid.grid.iter().filter(|&&d| d).count();
    let five_percent_variances = (dark * 2).abs_diff(total) * 10 / total;
    five_percent_variances as u32 * 10
}

#[cfg(test)]
mod penalty_tests {
    use test_case::test_case;

    use super::{
        compute_adjacent_penalty, compute_balance_penalty, compute_block_penalty,
        compute_finder_pattern_penalty, DarkGrid,
    };

    fn parse(rows: &[&str]) -> (usize, usize, Vec<bool>) {
        let h = rows.len();
        let w = rows[0].len();
        let grid = rows.iter().flat_map(|r| r.chars().map(|c| c == '1')).collect();
        (w, h, grid)
    }

    #[test_case(&["000000"], 4)]
    #[test_case(&["000001"], 3)]
    #[test_case(&["100000"], 3)]
    #[test_case(&["0000011111"], 6)]
    #[test_case(&["01010101"], 0)]
    #[test_case(&["0", "0", "0", "0", "0"], 3)]
    fn test_adjacent_penalty(rows: &[&str], expected: u32) {
        let (w, h, grid) = parse(rows);
        assert_eq!(compute_adjacent_penalty(&DarkGrid { w, h, grid: &grid }), expected);
    }

    #[test_case(&["00", "00"], 3)]
    #[test_case(&["11", "11"], 3)]
    #[test_case(&["000", "000", "000"], 12)]
    #[test_case(&["01", "00"], 0)]
    fn test_block_penalty(rows: &[&str], expected: u32) {
        let (w, h, grid) = parse(rows);
        assert_eq!(compute_block_penalty(&DarkGrid { w, h, grid: &grid }), expected);
    }

    #[test_case(&["00001011101"], 40)]
    #[test_case(&["10111010000"], 40)]
    #[test_case(&["1011101"], 0)]
    #[test_case(&["0001011101"], 0)]
    #[test_case(&["1011101000"], 0)]
    #[test_case(&["000010111010000"], 40)]
    fn test_finder_pattern_penalty(rows: &[&str], expected: u32) {
        let (w, h, grid) = parse(rows);
        assert_eq!(compute_finder_pattern_penalty(&DarkGrid { w, h, grid: &grid }), expected);
    }

    #[test]
    fn test_finder_pattern_penalty_vertical() {
        let rows = ["0", "0", "0", "0", "1", "0", "1", "1", "1", "0", "1"];
        let (w, h, grid) = parse(&rows);
        assert_eq!(compute_finder_pattern_penalty(&DarkGrid { w, h, grid: &grid }), 40);
    }

    #[test_case(&["0"], 100)]
    #[test_case(&["01"], 0)]
    #[test_case(&["011110"], 30)]
    #[test_case(&["1111111111"], 100)]
    #[test_case(&["0000011111", "1111111111"], 50)]
    fn test_balance_penalty(rows: &[&str], expected: u32) {
        let (w, h, grid) = parse(rows);
        assert_eq!(compute_balance_penalty(&DarkGrid { w, h, grid: &grid }), expected);
    }
}
