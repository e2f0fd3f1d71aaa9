//! Region selection.
//!
//! A [`RegionSelector`] picks one [`AxisSelector`] per axis of an array.
//! An axis is either fixed at a single index or spans the complete blocks along it.

use std::fmt::Display;

/// The selection along one axis of a region read.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AxisSelector {
    /// A single element along the axis.
    Index(u64),
    /// Every element of the complete blocks along the axis.
    Full,
}

impl From<u64> for AxisSelector {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<Option<u64>> for AxisSelector {
    fn from(index: Option<u64>) -> Self {
        index.map_or(Self::Full, Self::Index)
    }
}

impl Display for AxisSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Full => write!(f, ".."),
        }
    }
}

/// A region of an array, one [`AxisSelector`] per axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionSelector(Vec<AxisSelector>);

impl RegionSelector {
    /// Create a new region selector.
    #[must_use]
    pub fn new(axes: Vec<AxisSelector>) -> Self {
        Self(axes)
    }

    /// Create a region selector spanning every axis of a `dimensionality` array.
    #[must_use]
    pub fn full(dimensionality: usize) -> Self {
        Self(vec![AxisSelector::Full; dimensionality])
    }

    /// The per-axis selectors.
    #[must_use]
    pub fn axes(&self) -> &[AxisSelector] {
        &self.0
    }

    /// The number of axes.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<AxisSelector>> for RegionSelector {
    fn from(axes: Vec<AxisSelector>) -> Self {
        Self(axes)
    }
}

impl<T: Into<AxisSelector>> FromIterator<T> for RegionSelector {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Display for RegionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, axis) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{axis}")?;
        }
        write!(f, "]")
    }
}
