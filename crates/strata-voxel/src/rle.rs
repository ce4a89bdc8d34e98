//! Run-length helpers shared by the disk codec and the wire protocol.
//!
//! Runs are capped at [`MAX_RUN`] so the count always fits in one byte; a
//! long stretch of one value becomes several consecutive runs.

/// Longest run a single `(count, value)` pair can describe.
pub const MAX_RUN: usize = u8::MAX as usize;

/// `count` consecutive copies of `value`, `count` in `1..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<T> {
    /// Number of repeated cells.
    pub count: u8,
    /// The repeated value.
    pub value: T,
}

/// Iterator over the runs of a slice. See [`runs`].
#[derive(Debug, Clone)]
pub struct Runs<'a, T> {
    cells: &'a [T],
    pos: usize,
}

/// Splits `cells` into runs of equal values, cutting every run at 255.
pub fn runs<T: Copy + PartialEq>(cells: &[T]) -> Runs<'_, T> {
    Runs { cells, pos: 0 }
}

impl<T: Copy + PartialEq> Iterator for Runs<'_, T> {
    type Item = Run<T>;

    fn next(&mut self) -> Option<Run<T>> {
        let value = *self.cells.get(self.pos)?;
        let count = self.cells[self.pos..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&c| c == value)
            .count();
        self.pos += count;
        Some(Run {
            count: count as u8,
            value,
        })
    }
}

/// Fills a fixed-size cell array run by run, ignoring overflow past the end.
#[derive(Debug)]
pub struct RunFiller<'a, T> {
    cells: &'a mut [T],
    filled: usize,
}

impl<'a, T: Copy> RunFiller<'a, T> {
    /// Starts filling `cells` from index 0.
    pub fn new(cells: &'a mut [T]) -> Self {
        Self { cells, filled: 0 }
    }

    /// Writes `count` copies of `value`; cells past the end are dropped.
    pub fn push(&mut self, count: u8, value: T) {
        let end = (self.filled + count as usize).min(self.cells.len());
        self.cells[self.filled..end].fill(value);
        self.filled = end;
    }

    /// True once every cell has been written.
    pub fn is_full(&self) -> bool {
        self.filled == self.cells.len()
    }

    /// Cells written so far.
    pub fn filled(&self) -> usize {
        self.filled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_input_splits_at_255() {
        let cells = vec![0u8; 32_768];
        let collected: Vec<_> = runs(&cells).collect();
        // 32768 = 128 * 255 + 128
        assert_eq!(collected.len(), 129);
        assert!(collected[..128].iter().all(|r| r.count == 255));
        assert_eq!(collected[128].count, 128);
    }

    #[test]
    fn test_runs_break_on_value_change() {
        let cells = [1, 1, 2, 3, 3, 3];
        let collected: Vec<_> = runs(&cells).collect();
        assert_eq!(
            collected,
            vec![
                Run { count: 2, value: 1 },
                Run { count: 1, value: 2 },
                Run { count: 3, value: 3 },
            ]
        );
    }

    #[test]
    fn test_exactly_max_run() {
        let cells = vec![9i32; MAX_RUN];
        let collected: Vec<_> = runs(&cells).collect();
        assert_eq!(collected, vec![Run { count: 255, value: 9 }]);
    }

    #[test]
    fn test_empty_input_has_no_runs() {
        let cells: [u8; 0] = [];
        assert_eq!(runs(&cells).count(), 0);
    }

    #[test]
    fn test_runs_cover_every_cell() {
        let cells: Vec<i32> = (0..10_000).map(|i| (i / 300) % 7).collect();
        let total: usize = runs(&cells).map(|r| r.count as usize).sum();
        assert_eq!(total, cells.len());
    }

    #[test]
    fn test_filler_clamps_overflow() {
        let mut cells = [0u8; 5];
        let mut filler = RunFiller::new(&mut cells);
        filler.push(3, 7);
        assert!(!filler.is_full());
        filler.push(10, 9);
        assert!(filler.is_full());
        assert_eq!(filler.filled(), 5);
        assert_eq!(cells, [7, 7, 7, 9, 9]);
    }

    #[test]
    fn test_filler_roundtrips_runs() {
        let source: Vec<i32> = (0..4096).map(|i| if i < 1000 { 5 } else { i % 3 }).collect();
        let mut out = vec![0i32; source.len()];
        let mut filler = RunFiller::new(&mut out);
        for run in runs(&source) {
            filler.push(run.count, run.value);
        }
        assert!(filler.is_full());
        assert_eq!(out, source);
    }
}
