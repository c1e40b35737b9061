//! Row/column sampling of the key matrix.
//!
//! One column is driven low at a time. After a settle delay every row is
//! read; a row pulled low through a closed switch means the key at that
//! row/column crossing is pressed.

use core::fmt::{self, Debug};

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal_async::delay::DelayNs;

/// Number of row inputs.
pub const ROWS: usize = 7;
/// Number of column outputs.
pub const COLS: usize = 5;

/// Pressed/released state of every matrix cell. `true` means pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyMatrixState {
    cells: [[bool; COLS]; ROWS],
}

impl KeyMatrixState {
    /// A matrix with every key released.
    pub const fn new() -> Self {
        Self {
            cells: [[false; COLS]; ROWS],
        }
    }

    /// Builds a state from a list of pressed `(row, col)` cells.
    pub fn from_pressed(pressed: &[(usize, usize)]) -> Self {
        let mut state = Self::new();
        for &(row, col) in pressed {
            state.set(row, col, true);
        }
        state
    }

    /// Returns `true` if the key at `row`/`col` is pressed.
    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        self.cells[row][col]
    }

    /// Marks the key at `row`/`col` as pressed or released.
    pub fn set(&mut self, row: usize, col: usize, pressed: bool) {
        self.cells[row][col] = pressed;
    }

    /// Returns `true` if at least one key is pressed.
    pub fn any_pressed(&self) -> bool {
        self.cells.iter().flatten().any(|&pressed| pressed)
    }

    /// Pressed cells as `(row, col)`, in column-major order.
    pub fn pressed_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..COLS)
            .flat_map(|col| (0..ROWS).map(move |row| (row, col)))
            .filter(|&(row, col)| self.cells[row][col])
    }
}

/// An error related to the matrix GPIOs.
pub enum MatrixError<TPINERR> {
    /// Reading a row input failed.
    Row(TPINERR),
    /// Driving a column output failed.
    Column(TPINERR),
}

impl<TPINERR: Debug> Debug for MatrixError<TPINERR> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(err) => write!(f, "Row({err:?})"),
            Self::Column(err) => write!(f, "Column({err:?})"),
        }
    }
}

/// The GPIO side of the keyboard: row inputs, column outputs and a delay
/// used to let the lines settle after switching a column.
pub struct Matrix<R, C, D> {
    rows: [R; ROWS],
    cols: [C; COLS],
    delay: D,
    settle_us: u32,
}

impl<R, C, D, TPINERR> Matrix<R, C, D>
where
    R: InputPin<Error = TPINERR>,
    C: OutputPin<Error = TPINERR>,
    D: DelayNs,
{
    /// Creates a new `Matrix`.
    ///
    /// # Arguments
    ///
    /// * `rows` - Row inputs, configured with pull-ups.
    /// * `cols` - Column outputs.
    /// * `delay` - Delay provider for the per-column settle time.
    /// * `settle_us` - Settle time in microseconds after pulling a column low.
    pub fn new(rows: [R; ROWS], cols: [C; COLS], delay: D, settle_us: u32) -> Self {
        Self {
            rows,
            cols,
            delay,
            settle_us,
        }
    }

    /// Drives every column high, so no key reads as pressed.
    pub fn init(&mut self) -> Result<(), MatrixError<TPINERR>> {
        for col in self.cols.iter_mut() {
            col.set_high().map_err(MatrixError::Column)?;
        }
        Ok(())
    }

    /// Samples the whole matrix once.
    pub async fn sample(&mut self) -> Result<KeyMatrixState, MatrixError<TPINERR>> {
        let mut state = KeyMatrixState::new();

        for col in 0..COLS {
            self.cols[col].set_low().map_err(MatrixError::Column)?;
            self.delay.delay_us(self.settle_us).await;

            let rows = Self::read_rows(&mut self.rows, col, &mut state);

            // Release the column before reporting a row error.
            self.cols[col].set_high().map_err(MatrixError::Column)?;
            rows?;
        }

        Ok(state)
    }

    fn read_rows(
        rows: &mut [R; ROWS],
        col: usize,
        state: &mut KeyMatrixState,
    ) -> Result<(), MatrixError<TPINERR>> {
        for (row, pin) in rows.iter_mut().enumerate() {
            let pressed = pin.is_low().map_err(MatrixError::Row)?;
            state.set(row, col, pressed);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embassy_futures::block_on;

    use super::fake::{pins, Board, CountingDelay};
    use super::*;

    #[test]
    fn sample_reads_closed_switches() {
        let board = Rc::new(RefCell::new(Board::default()));
        board.borrow_mut().closed[3][1] = true;
        board.borrow_mut().closed[6][4] = true;

        let (rows, cols) = pins(&board);
        let mut matrix = Matrix::new(rows, cols, CountingDelay(board.clone()), 1000);
        matrix.init().unwrap();

        let state = block_on(matrix.sample()).unwrap();

        assert_eq!(state, KeyMatrixState::from_pressed(&[(3, 1), (6, 4)]));
        assert_eq!(board.borrow().settle_calls, COLS);
        assert!(board.borrow().col_low.iter().all(|low| !low));
    }

    #[test]
    fn pressed_cells_are_column_major() {
        let state = KeyMatrixState::from_pressed(&[(0, 1), (5, 0), (1, 0)]);
        let cells: Vec<_> = state.pressed_cells().collect();
        assert_eq!(cells, [(1, 0), (5, 0), (0, 1)]);
        assert!(state.any_pressed());
        assert!(!KeyMatrixState::new().any_pressed());
    }
}
