use std::fmt;

use rand::Rng;

use crate::tables::{tables, Tables, CEILING_EXPONENT};

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Root iteration order; ties at the search root resolve to the earliest.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];
}

/// External board snapshot: 4x4 tile face values, row-major, 0 = empty.
/// Any identity/animation metadata belongs to the caller and must already be
/// stripped.
pub type Grid = [[u32; 4]; 4];

/// Rejection reasons for an external snapshot. These are contract errors:
/// coercing a bad value would corrupt the packed representation and poison
/// transposition-cache keys downstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell ({row},{col}) holds {value}, which is not a valid tile value")]
    NotPowerOfTwo { row: usize, col: usize, value: u32 },
    #[error("cell ({row},{col}) holds {value}, above the 32768 ceiling")]
    AboveCeiling { row: usize, col: usize, value: u32 },
}

/// Packed 4x4 board: 16 exponent nibbles in a `u64`.
///
/// Row r (top to bottom) occupies bits `[(3-r)*16, (4-r)*16)`, so the raw
/// value reads as the four row words concatenated top-first; within a row,
/// column c sits at bits `[4c, 4c+4)`. A nibble holds a tile's binary
/// exponent (0 = empty). Pure value type: two boards with equal raw words
/// are the same position, which is exactly what the transposition cache
/// keys on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(u64);

/// Result of applying one direction: the deterministic half of a turn.
/// No tile spawn happens here; that is the caller's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    pub moved: bool,
    pub points: u32,
}

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Board(raw)
    }

    /// The raw packed `u64` for this board (also the cache key).
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// The four 16-bit row words, top to bottom.
    #[inline]
    pub fn rows(self) -> [u16; 4] {
        [
            (self.0 >> 48) as u16,
            (self.0 >> 32) as u16,
            (self.0 >> 16) as u16,
            self.0 as u16,
        ]
    }

    #[inline]
    pub fn from_rows(rows: [u16; 4]) -> Self {
        Board(
            ((rows[0] as u64) << 48)
                | ((rows[1] as u64) << 32)
                | ((rows[2] as u64) << 16)
                | (rows[3] as u64),
        )
    }

    /// Convert an external snapshot, mapping face values to exponents.
    /// Fails fast on anything that is not an exact power of two in range.
    pub fn from_grid(grid: &Grid) -> Result<Self, GridError> {
        let mut rows = [0u16; 4];
        for (r, grid_row) in grid.iter().enumerate() {
            for (c, &value) in grid_row.iter().enumerate() {
                if value == 0 {
                    continue;
                }
                if value < 2 || !value.is_power_of_two() {
                    return Err(GridError::NotPowerOfTwo { row: r, col: c, value });
                }
                let exp = value.trailing_zeros() as u8;
                if exp > CEILING_EXPONENT {
                    return Err(GridError::AboveCeiling { row: r, col: c, value });
                }
                rows[r] |= (exp as u16) << (4 * c);
            }
        }
        Ok(Board::from_rows(rows))
    }

    /// Back out a face-value snapshot (0 = empty).
    pub fn to_grid(self) -> Grid {
        let mut grid = [[0u32; 4]; 4];
        for (r, &row) in self.rows().iter().enumerate() {
            for (c, cell) in grid[r].iter_mut().enumerate() {
                let exp = (row >> (4 * c)) & 0xf;
                if exp != 0 {
                    *cell = 1 << exp;
                }
            }
        }
        grid
    }

    /// Tile exponent at (row, col); 0 = empty.
    #[inline]
    pub fn exponent(self, row: usize, col: usize) -> u8 {
        ((self.rows()[row] >> (4 * col)) & 0xf) as u8
    }

    /// Slide/merge tiles in the given direction. Left reads the row table
    /// directly; Right goes reverse/left/reverse; Up and Down run the same
    /// two paths over the transposed board.
    pub fn shift(self, dir: Move) -> MoveOutcome {
        let t = tables();
        let rows = self.rows();
        let (board, points) = match dir {
            Move::Left => {
                let (out, points) = shift_rows_left(rows, t);
                (Board::from_rows(out), points)
            }
            Move::Right => {
                let (out, points) = shift_rows_right(rows, t);
                (Board::from_rows(out), points)
            }
            Move::Up => {
                let (out, points) = shift_rows_left(transpose(rows), t);
                (Board::from_rows(transpose(out)), points)
            }
            Move::Down => {
                let (out, points) = shift_rows_right(transpose(rows), t);
                (Board::from_rows(transpose(out)), points)
            }
        };
        MoveOutcome { board, moved: board != self, points }
    }

    /// Count the number of empty cells.
    // https://stackoverflow.com/questions/38225571/count-number-of-zero-nibbles-in-an-unsigned-64-bit-integer
    #[inline]
    pub fn count_empty(self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        x &= 0x1111_1111_1111_1111;
        16 - x.count_ones()
    }

    /// Highest exponent present anywhere on the board (0 if empty).
    #[inline]
    pub fn max_exponent(self) -> u8 {
        let mut raw = self.0;
        let mut max = 0u8;
        while raw != 0 {
            max = max.max((raw & 0xf) as u8);
            raw >>= 4;
        }
        max
    }

    /// Face value of the highest tile (0 on an empty board).
    #[inline]
    pub fn highest_tile(self) -> u32 {
        match self.max_exponent() {
            0 => 0,
            exp => 1 << exp,
        }
    }

    /// True if no direction changes the board: the position is terminal.
    pub fn is_game_over(self) -> bool {
        Move::ALL.iter().all(|&dir| !self.shift(dir).moved)
    }

    /// Insert a 2 (90%) or 4 (10%) tile into a uniformly-chosen empty cell.
    /// This is the caller's half of a turn; the search never spawns.
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.count_empty();
        if empty == 0 {
            return self;
        }
        let mut index = rng.gen_range(0..empty);
        let exp: u64 = if rng.gen_range(0..10) < 9 { 1 } else { 2 };
        for pos in 0..16 {
            if (self.0 >> (4 * pos)) & 0xf == 0 {
                if index == 0 {
                    return Board(self.0 | (exp << (4 * pos)));
                }
                index -= 1;
            }
        }
        self
    }
}

/// Reverse the order of the 4 nibbles within a row. Self-inverse; rightward
/// moves are reverse, leftward table, reverse again.
#[inline]
pub fn reverse_row(row: u16) -> u16 {
    ((row & 0x000f) << 12) | ((row & 0x00f0) << 4) | ((row & 0x0f00) >> 4) | ((row & 0xf000) >> 12)
}

/// Transpose the 4x4 nibble matrix: output row i, column j holds input row
/// j, column i. Self-inverse; vertical moves reuse the row machinery.
#[inline]
pub fn transpose(rows: [u16; 4]) -> [u16; 4] {
    let mut out = [0u16; 4];
    for (i, out_row) in out.iter_mut().enumerate() {
        for (j, &row) in rows.iter().enumerate() {
            *out_row |= ((row >> (4 * i)) & 0xf) << (4 * j);
        }
    }
    out
}

fn shift_rows_left(rows: [u16; 4], t: &Tables) -> ([u16; 4], u32) {
    let mut out = [0u16; 4];
    let mut points = 0u32;
    for (i, &row) in rows.iter().enumerate() {
        out[i] = t.moved[row as usize];
        points += t.score[row as usize];
    }
    (out, points)
}

fn shift_rows_right(rows: [u16; 4], t: &Tables) -> ([u16; 4], u32) {
    let mut out = [0u16; 4];
    let mut points = 0u32;
    for (i, &row) in rows.iter().enumerate() {
        let rev = reverse_row(row);
        out[i] = reverse_row(t.moved[rev as usize]);
        points += t.score[rev as usize];
    }
    (out, points)
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.to_grid();
        for (r, row) in grid.iter().enumerate() {
            if r > 0 {
                writeln!(f, "-----------------------------")?;
            }
            for (c, &value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, "|")?;
                }
                if value == 0 {
                    write!(f, "      ")?;
                } else {
                    write!(f, "{value:^6}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn reverse_row_is_an_involution() {
        for row in 0..=u16::MAX {
            assert_eq!(reverse_row(reverse_row(row)), row);
        }
    }

    #[test]
    fn reverse_row_reverses() {
        assert_eq!(reverse_row(0x4321), 0x1234);
        assert_eq!(reverse_row(0x000f), 0xf000);
    }

    #[test]
    fn transpose_is_an_involution() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let rows = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
            assert_eq!(transpose(transpose(rows)), rows);
        }
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let board = Board::from_grid(&[
            [2, 4, 8, 16],
            [0, 2, 0, 4],
            [8, 0, 2, 0],
            [16, 4, 0, 2],
        ])
        .unwrap();
        let t = Board::from_rows(transpose(board.rows()));
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(t.exponent(r, c), board.exponent(c, r));
            }
        }
    }

    #[test]
    fn grid_round_trip() {
        let grid: Grid = [
            [2, 0, 4, 0],
            [0, 8, 0, 16],
            [32, 0, 64, 0],
            [0, 128, 0, 32768],
        ];
        let board = Board::from_grid(&grid).unwrap();
        assert_eq!(board.to_grid(), grid);
    }

    #[test]
    fn from_grid_rejects_bad_values() {
        let mut grid: Grid = [[0; 4]; 4];
        grid[1][2] = 3;
        assert_eq!(
            Board::from_grid(&grid),
            Err(GridError::NotPowerOfTwo { row: 1, col: 2, value: 3 })
        );
        grid[1][2] = 1;
        assert_eq!(
            Board::from_grid(&grid),
            Err(GridError::NotPowerOfTwo { row: 1, col: 2, value: 1 })
        );
        grid[1][2] = 65536;
        assert_eq!(
            Board::from_grid(&grid),
            Err(GridError::AboveCeiling { row: 1, col: 2, value: 65536 })
        );
    }

    #[test]
    fn bottom_row_pair_merges_left() {
        let board = Board::from_grid(&[
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [2, 2, 0, 0],
        ])
        .unwrap();
        let out = board.shift(Move::Left);
        assert!(out.moved);
        assert_eq!(out.points, 4);
        assert_eq!(
            out.board.to_grid(),
            [[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [4, 0, 0, 0]]
        );
    }

    #[test]
    fn bottom_row_pair_slides_up_without_merging() {
        let board = Board::from_grid(&[
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [0, 0, 0, 0],
            [2, 2, 0, 0],
        ])
        .unwrap();
        let out = board.shift(Move::Up);
        assert!(out.moved);
        assert_eq!(out.points, 0);
        assert_eq!(
            out.board.to_grid(),
            [[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]
        );
    }

    #[test]
    fn right_equals_reverse_left_reverse() {
        let t = tables();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..2000 {
            let row: u16 = rng.gen();
            let board = Board::from_rows([row, 0, 0, 0]);
            let shifted = board.shift(Move::Right).board.rows()[0];
            assert_eq!(shifted, reverse_row(t.moved[reverse_row(row) as usize]));
        }
    }

    /// Slow per-column reference for a vertical move.
    fn column_move(board: Board, down: bool) -> Grid {
        let grid = board.to_grid();
        let mut out = [[0u32; 4]; 4];
        for c in 0..4 {
            let mut col: Vec<u32> = (0..4).map(|r| grid[r][c]).filter(|&v| v != 0).collect();
            if down {
                col.reverse();
            }
            let mut merged = Vec::new();
            let mut i = 0;
            while i < col.len() {
                if i + 1 < col.len() && col[i] == col[i + 1] && col[i] < 32768 {
                    merged.push(col[i] * 2);
                    i += 2;
                } else {
                    merged.push(col[i]);
                    i += 1;
                }
            }
            for (k, &v) in merged.iter().enumerate() {
                let r = if down { 3 - k } else { k };
                out[r][c] = v;
            }
        }
        out
    }

    #[test]
    fn vertical_moves_match_column_simulation() {
        let grid: Grid = [
            [2, 0, 2, 8],
            [2, 4, 0, 8],
            [0, 4, 2, 2],
            [4, 0, 2, 2],
        ];
        let board = Board::from_grid(&grid).unwrap();
        assert_eq!(board.shift(Move::Up).board.to_grid(), column_move(board, false));
        assert_eq!(board.shift(Move::Down).board.to_grid(), column_move(board, true));
    }

    #[test]
    fn count_empty_counts() {
        assert_eq!(Board::EMPTY.count_empty(), 16);
        let board = Board::from_grid(&[
            [2, 0, 0, 0],
            [0, 4, 0, 0],
            [0, 0, 8, 0],
            [0, 0, 0, 16],
        ])
        .unwrap();
        assert_eq!(board.count_empty(), 12);
    }

    #[test]
    fn checkerboard_with_no_neighbors_is_terminal() {
        let board = Board::from_grid(&[
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
        .unwrap();
        assert!(board.is_game_over());
        for dir in Move::ALL {
            let out = board.shift(dir);
            assert!(!out.moved);
            assert_eq!(out.board, board);
        }
    }

    #[test]
    fn random_tile_fills_the_board() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut board = Board::EMPTY;
        for expected in (0..16).rev() {
            board = board.with_random_tile(&mut rng);
            assert_eq!(board.count_empty(), expected);
        }
        // Saturated board is left untouched.
        assert_eq!(board.with_random_tile(&mut rng), board);
    }

    #[test]
    fn max_exponent_scans_all_cells() {
        let board = Board::from_grid(&[
            [0, 0, 0, 0],
            [0, 1024, 0, 0],
            [0, 0, 0, 2],
            [0, 0, 0, 0],
        ])
        .unwrap();
        assert_eq!(board.max_exponent(), 10);
        assert_eq!(board.highest_tile(), 1024);
        assert_eq!(Board::EMPTY.highest_tile(), 0);
    }
}
