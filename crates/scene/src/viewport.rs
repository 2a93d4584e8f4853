/// Upper bound on the device pixel ratio used for the backing store.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Backing-store dimensions of the render surface, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Compute backing-store size from the window's logical (client) size.
    ///
    /// `floor(client * min(scale_factor, 2))`, clamped to at least one pixel
    /// so a minimised window never produces a zero-sized surface.
    pub fn from_logical(width: f64, height: f64, scale_factor: f64) -> Self {
        let ratio = scale_factor.clamp(f64::MIN_POSITIVE, MAX_PIXEL_RATIO);
        Self {
            width: ((width * ratio).floor() as u32).max(1),
            height: ((height * ratio).floor() as u32).max(1),
        }
    }

    /// Backing size from the physical size reported by the windowing system.
    /// Unchanged up to [`MAX_PIXEL_RATIO`]; scaled down above it.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        if scale <= MAX_PIXEL_RATIO {
            return Self {
                width: width.max(1),
                height: height.max(1),
            };
        }
        Self::from_logical(width as f64 / scale, height as f64 / scale, scale)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped() {
        let vp = Viewport::from_logical(800.0, 600.0, 3.0);
        assert_eq!(vp, Viewport { width: 1600, height: 1200 });
    }

    #[test]
    fn fractional_ratio_floors() {
        let vp = Viewport::from_logical(801.0, 601.0, 1.25);
        assert_eq!(vp, Viewport { width: 1001, height: 751 });
    }

    #[test]
    fn resize_is_idempotent() {
        let a = Viewport::from_physical(2560, 1440, 2.0);
        let b = Viewport::from_physical(2560, 1440, 2.0);
        assert_eq!(a, b);
        assert_eq!(a, Viewport { width: 2560, height: 1440 });
    }

    #[test]
    fn physical_size_kept_below_cap() {
        for scale in [1.0, 1.1, 1.25, 1.5, 1.75, 2.0] {
            for width in [61, 287, 1279, 1920, 3839] {
                let vp = Viewport::from_physical(width, 721, scale);
                assert_eq!(vp, Viewport { width, height: 721 }, "scale {scale}");
            }
        }
    }

    #[test]
    fn physical_size_shrinks_above_cap() {
        let vp = Viewport::from_physical(3000, 1500, 3.0);
        assert_eq!(vp, Viewport { width: 2000, height: 1000 });
    }

    #[test]
    fn zero_size_clamps_to_one_pixel() {
        let vp = Viewport::from_physical(0, 0, 1.0);
        assert_eq!(vp, Viewport { width: 1, height: 1 });
        assert_eq!(vp.aspect(), 1.0);
    }
}
