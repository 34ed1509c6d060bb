use std::ops::Range;

/// A contiguous, half-open range of work items handled by one worker.
#[derive(Hash, Debug, Clone, PartialEq, Eq, Copy)]
pub struct Partition {
    start: usize,
    end: usize
}

impl Partition {
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "Partition start must not pass its end.");
        Self { start, end }
    }

    pub fn start(&self) -> usize { self.start }
    pub fn end(&self) -> usize { self.end }

    /// Returns number of items in the partition.
    pub fn size(&self) -> usize { self.end - self.start }

    pub fn is_empty(&self) -> bool { self.start == self.end }

    /// Range of item indices to process for this partition.
    pub fn range(&self) -> Range<usize> { self.start..self.end }
}
