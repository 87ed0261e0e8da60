use std::ops::{Index, IndexMut};

// Augmented matrix over GF(256)
//------------------------------------------------------------------------------

/// Row-major `rows x cols` matrix of field elements. Indexing is bounds checked
/// against the declared shape, not just the backing buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GfMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl GfMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![0; rows * cols] }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn row(&self, r: usize) -> &[u8] {
        assert!(r < self.rows, "Row {r} out of bounds for {} rows", self.rows);
        &self.cells[r * self.cols..(r + 1) * self.cols]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        assert!(a < self.rows && b < self.rows, "Row swap {a} <-> {b} out of bounds");
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.cells.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn offset(&self, r: usize, c: usize) -> usize {
        assert!(r < self.rows, "Row {r} out of bounds for {} rows", self.rows);
        assert!(c < self.cols, "Column {c} out of bounds for {} columns", self.cols);
        r * self.cols + c
    }
}

impl Index<(usize, usize)> for GfMatrix {
    type Output = u8;
    fn index(&self, (r, c): (usize, usize)) -> &Self::Output {
        &self.cells[self.offset(r, c)]
    }
}

impl IndexMut<(usize, usize)> for GfMatrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut Self::Output {
        let i = self.offset(r, c);
        &mut self.cells[i]
    }
}
