use super::metadata::Version;

// Iterator for placing data in encoding region of QR
//------------------------------------------------------------------------------

/// Walks column pairs right to left, alternating up and down, yielding the
/// right module of each row before the left one. The vertical timing column is
/// skipped. Function modules are yielded too; callers skip occupied cells.
pub struct EncRegionIter {
    r: i16,
    // Right column of the current pair
    c: i16,
    w: i16,
    upward: bool,
    left: bool,
}

impl EncRegionIter {
    pub const fn new(ver: Version) -> Self {
        let w = ver.width() as i16;
        Self { r: w - 1, c: w - 1, w, upward: true, left: false }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        if self.c < 0 {
            return None;
        }

        let res = if self.left { (self.r, self.c - 1) } else { (self.r, self.c) };

        if !self.left {
            self.left = true;
            return Some(res);
        }

        self.left = false;
        let next_r = if self.upward { self.r - 1 } else { self.r + 1 };
        if (0..self.w).contains(&next_r) {
            self.r = next_r;
        } else {
            self.upward = !self.upward;
            self.c -= 2;
            if self.c == VERT_TIMING_COL {
                self.c -= 1;
            }
        }
        Some(res)
    }
}


// Global constants
//------------------------------------------------------------------------------

const VERT_TIMING_COL: i16 = 6;
