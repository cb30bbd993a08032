use ndarray::Array1;
use rand::Rng;

/// Inverted dropout. Masks are drawn only while training; inference uses
/// the activations unchanged because kept units are already rescaled by
/// `1 / (1 - rate)` during training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    rate: f64,
}

impl Dropout {
    /// `rate` is clamped into `[0, 1)`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: rate.clamp(0.0, 0.999),
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_active(&self) -> bool {
        self.rate > 0.0
    }

    pub fn mask<R: Rng>(&self, width: usize, rng: &mut R) -> Array1<f64> {
        if !self.is_active() {
            return Array1::ones(width);
        }
        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        Array1::from_shape_fn(width, |_| if rng.gen::<f64>() < keep { scale } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn inactive_dropout_keeps_everything() {
        let mut rng = StdRng::seed_from_u64(0);
        let mask = Dropout::new(0.0).mask(8, &mut rng);
        assert!(mask.iter().all(|&m| m == 1.0));
    }

    #[test]
    fn rate_is_clamped_below_one() {
        assert_eq!(Dropout::new(-0.3).rate(), 0.0);
        assert_eq!(Dropout::new(1.5).rate(), 0.999);
        assert_eq!(Dropout::new(0.2).rate(), 0.2);
        assert!(!Dropout::new(-0.3).is_active());
    }

    #[test]
    fn kept_units_are_rescaled() {
        let mut rng = StdRng::seed_from_u64(11);
        let dropout = Dropout::new(0.5);
        let mask = dropout.mask(2000, &mut rng);
        assert!(mask.iter().all(|&m| m == 0.0 || m == 2.0));

        let kept = mask.iter().filter(|&&m| m > 0.0).count();
        assert!((800..1200).contains(&kept), "kept {kept} of 2000");
    }
}
