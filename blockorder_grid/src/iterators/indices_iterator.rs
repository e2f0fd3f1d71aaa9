use std::iter::FusedIterator;

use crate::{ArrayIndicesTinyVec, ArraySubset};

/// The indices of the elements of an [`ArraySubset`] in row-major order.
///
/// The last axis turns fastest. The subset `[2..4, 1..3]` walks `[2, 1], [2, 2], [3, 1], [3, 2]`.
#[derive(Clone, Debug)]
pub struct Indices {
    subset: ArraySubset,
}

impl Indices {
    /// Walk the indices of `subset`.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        Self { subset }
    }

    /// The number of indices, saturating at [`usize::MAX`].
    #[must_use]
    pub fn len(&self) -> usize {
        saturating_len(self.subset.num_elements())
    }

    /// Returns true if the subset has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subset.num_elements() == 0
    }

    /// Walk the indices without consuming `self`.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator<'_> {
        IndicesIterator {
            odometer: Odometer::new(&self.subset),
            subset: &self.subset,
        }
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = ArrayIndicesTinyVec;
    type IntoIter = IndicesIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Indices {
    type Item = ArrayIndicesTinyVec;
    type IntoIter = IndicesIntoIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIntoIterator {
            odometer: Odometer::new(&self.subset),
            subset: self.subset,
        }
    }
}

/// Borrowing walk over [`Indices`].
#[derive(Clone, Debug)]
pub struct IndicesIterator<'a> {
    subset: &'a ArraySubset,
    odometer: Odometer,
}

/// Owning walk over [`Indices`].
#[derive(Clone, Debug)]
pub struct IndicesIntoIterator {
    subset: ArraySubset,
    odometer: Odometer,
}

fn saturating_len(count: u64) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// The next index of a walk and the number of indices left to yield.
#[derive(Clone, Debug)]
struct Odometer {
    next: ArrayIndicesTinyVec,
    remaining: u64,
}

impl Odometer {
    fn new(subset: &ArraySubset) -> Self {
        Self {
            next: subset.start().iter().copied().collect(),
            remaining: subset.num_elements(),
        }
    }

    fn turn(&mut self, subset: &ArraySubset) -> Option<ArrayIndicesTinyVec> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next.clone();
        for ((index, &start), &extent) in self
            .next
            .iter_mut()
            .zip(subset.start())
            .zip(subset.shape())
            .rev()
        {
            *index += 1;
            if *index < start + extent {
                break;
            }
            *index = start;
        }
        Some(current)
    }
}

impl Iterator for IndicesIterator<'_> {
    type Item = ArrayIndicesTinyVec;

    fn next(&mut self) -> Option<Self::Item> {
        self.odometer.turn(self.subset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = saturating_len(self.odometer.remaining);
        (len, Some(len))
    }
}

impl Iterator for IndicesIntoIterator {
    type Item = ArrayIndicesTinyVec;

    fn next(&mut self) -> Option<Self::Item> {
        self.odometer.turn(&self.subset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = saturating_len(self.odometer.remaining);
        (len, Some(len))
    }
}

impl ExactSizeIterator for IndicesIterator<'_> {}
impl ExactSizeIterator for IndicesIntoIterator {}
impl FusedIterator for IndicesIterator<'_> {}
impl FusedIterator for IndicesIntoIterator {}
