/// Continuously differentiable exponential linear unit:
/// `max(0, z) + min(0, alpha * (exp(z / alpha) - 1))`.
#[derive(Clone, Debug)]
pub struct Celu {
    alpha: f32,
}

impl Default for Celu {
    fn default() -> Self {
        Self::new(1.)
    }
}

impl Celu {
    pub fn new(alpha: f32) -> Self {
        Self { alpha }
    }

    pub fn f(&self, z: f32) -> f32 {
        if z > 0. {
            z
        } else {
            self.alpha * ((z / self.alpha).exp() - 1.)
        }
    }

    pub fn df(&self, z: f32) -> f32 {
        if z > 0. { 1. } else { (z / self.alpha).exp() }
    }
}
