//! Shape metadata for stacked frame batches.

use serde::{Deserialize, Serialize};

/// Shape of a stack of frame batches.
///
/// Follows the convention `(N, T, H, W, C)`:
/// - `N`: Number of stacked batches
/// - `T`: Horizon (time steps per batch)
/// - `H`, `W`: Frame height and width
/// - `C`: Channels
///
/// Flattening such a stack into a pixel table gives `N * H * W` rows of
/// `T * C` features each.
///
/// # Example
///
/// ```rust
/// use sitsgen_core::PixelShape;
///
/// let shape = PixelShape::new(1, 3, 2, 2, 2);
/// assert_eq!(shape.n_pixels(), 4);
/// assert_eq!(shape.n_features(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelShape {
    batches: usize,
    horizon: usize,
    height: usize,
    width: usize,
    channels: usize,
}

impl PixelShape {
    /// Create a new shape with the specified dimensions.
    #[must_use]
    pub const fn new(
        batches: usize,
        horizon: usize,
        height: usize,
        width: usize,
        channels: usize,
    ) -> Self {
        Self {
            batches,
            horizon,
            height,
            width,
            channels,
        }
    }

    /// Number of stacked batches.
    #[must_use]
    pub const fn batches(&self) -> usize {
        self.batches
    }

    /// Time steps per batch.
    #[must_use]
    pub const fn horizon(&self) -> usize {
        self.horizon
    }

    /// Frame height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Frame width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixel rows once flattened.
    #[must_use]
    pub const fn n_pixels(&self) -> usize {
        self.batches * self.height * self.width
    }

    /// Feature vector length per pixel row.
    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.horizon * self.channels
    }

    /// Shape of a single batch, `(T, H, W, C)`.
    #[must_use]
    pub const fn batch_dims(&self) -> [usize; 4] {
        [self.horizon, self.height, self.width, self.channels]
    }

    /// Check that a batch of dims `(T, H, W, C)` can be stacked under this shape.
    #[must_use]
    pub fn accepts_batch(&self, dims: &[usize]) -> bool {
        dims == self.batch_dims()
    }
}

impl std::fmt::Display for PixelShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(N={}, T={}, H={}, W={}, C={})",
            self.batches, self.horizon, self.height, self.width, self.channels
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_counts() {
        let shape = PixelShape::new(4, 5, 8, 6, 3);
        assert_eq!(shape.n_pixels(), 4 * 8 * 6);
        assert_eq!(shape.n_features(), 15);
        assert_eq!(shape.batch_dims(), [5, 8, 6, 3]);
    }

    #[test]
    fn test_accepts_batch() {
        let shape = PixelShape::new(0, 3, 2, 2, 2);
        assert!(shape.accepts_batch(&[3, 2, 2, 2]));
        assert!(!shape.accepts_batch(&[2, 2, 2, 2]));
    }

    #[test]
    fn test_shape_display() {
        let shape = PixelShape::new(1, 3, 2, 2, 2);
        assert_eq!(shape.to_string(), "(N=1, T=3, H=2, W=2, C=2)");
    }
}
