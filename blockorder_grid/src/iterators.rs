//! Array subset iterators.
//!
//! The iterators are:
//!  - [`Indices`]: iterate over the multidimensional indices of the elements in a region.
//!  - [`ContiguousLinearisedIndices`]: iterate over contiguous runs of elements in the region with the start a linearised index.
//!
//! These can be created with the [`ArraySubset`](crate::ArraySubset) methods
//! [`indices`](crate::ArraySubset::indices) and [`contiguous_linearised_indices`](crate::ArraySubset::contiguous_linearised_indices).

mod contiguous_linearised_indices_iterator;
mod indices_iterator;

pub use contiguous_linearised_indices_iterator::{
    ContiguousLinearisedIndices, ContiguousLinearisedIndicesIterator,
};
pub use indices_iterator::{Indices, IndicesIntoIterator, IndicesIterator};

#[cfg(test)]
mod tests {
    use crate::ArraySubset;

    #[test]
    fn array_subset_iter_indices() {
        let region = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let indices = region.indices();

        let mut iter = indices.iter();
        assert_eq!(iter.size_hint(), (4, Some(4)));
        assert_eq!(iter.next().unwrap().as_slice(), &[1, 1]);
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.nth(2).unwrap().as_slice(), &[2, 2]);
        assert_eq!(iter.next(), None);

        let expected: Vec<Vec<u64>> = vec![vec![1, 1], vec![1, 2], vec![2, 1], vec![2, 2]];
        let collect = |iter: &mut dyn Iterator<Item = crate::ArrayIndicesTinyVec>| {
            iter.map(|indices| indices.to_vec()).collect::<Vec<_>>()
        };
        assert_eq!(collect(&mut indices.iter()), expected);
        assert_eq!(collect(&mut indices.into_iter()), expected);
    }

    #[test]
    fn array_subset_iter_contiguous_linearised_indices() {
        let region = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        assert!(region.contiguous_linearised_indices(&[4, 4, 4]).is_err());
        assert!(region.contiguous_linearised_indices(&[2, 2]).is_err());
        let indices = region.contiguous_linearised_indices(&[4, 4]).unwrap();
        assert_eq!(indices.len(), 2);
        assert!(!indices.is_empty());
        assert_eq!(indices.contiguous_elements(), 2);
        //  0  1  2  3
        //  4  5  6  7
        //  8  9 10 11
        // 12 13 14 15
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(5, 2), (9, 2)]);
    }

    #[test]
    fn array_subset_iter_contiguous_linearised_indices_merged() {
        // Full trailing axes merge into a single run.
        let region = ArraySubset::new_with_ranges(&[1..3, 0..1, 0..2, 0..2]);
        let indices = region.contiguous_linearised_indices(&[3, 1, 2, 2]).unwrap();
        assert_eq!(indices.len(), 1);
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(4, 8)]);

        let region = ArraySubset::new_with_shape(vec![2, 2]);
        let indices = region.contiguous_linearised_indices(&[2, 2]).unwrap();
        assert_eq!(indices.iter().collect::<Vec<_>>(), vec![(0, 4)]);
    }
}
