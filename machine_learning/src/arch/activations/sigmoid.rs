/// The logistic function, scaled by `amp`.
#[derive(Clone, Debug)]
pub struct Sigmoid {
    amp: f32,
}

impl Default for Sigmoid {
    fn default() -> Self {
        Self::new(1.)
    }
}

impl Sigmoid {
    pub fn new(amp: f32) -> Self {
        Self { amp }
    }

    pub fn f(&self, z: f32) -> f32 {
        self.amp / (1. + (-z).exp())
    }

    // Written in terms of the output so that a large negative `z` doesn't end up as inf / inf.
    pub fn df(&self, z: f32) -> f32 {
        let s = 1. / (1. + (-z).exp());
        self.amp * s * (1. - s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_output() {
        let sigmoid = Sigmoid::new(1.);

        assert_eq!(sigmoid.f(0.), 0.5);
        assert!(sigmoid.f(-200.) >= 0.);
        assert!(sigmoid.f(200.) <= 1.);
    }

    #[test]
    fn default_is_the_logistic_function() {
        let sigmoid = Sigmoid::default();

        assert_eq!(sigmoid.f(0.), 0.5);
        assert!(sigmoid.f(10.) > 0.99);
    }

    #[test]
    fn derivative_is_finite_on_saturation() {
        let sigmoid = Sigmoid::new(1.);

        assert_eq!(sigmoid.df(0.), 0.25);
        assert!(sigmoid.df(-200.).is_finite());
        assert!(sigmoid.df(200.).is_finite());
    }
}
