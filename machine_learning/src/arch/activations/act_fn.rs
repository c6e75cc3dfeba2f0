use super::{Celu, Relu, Sigmoid};

#[derive(Clone, Debug)]
pub enum ActFn {
    Sigmoid(Sigmoid),
    Relu(Relu),
    Celu(Celu),
}

impl ActFn {
    pub fn sigmoid(amp: f32) -> Self {
        Self::Sigmoid(Sigmoid::new(amp))
    }

    pub fn relu() -> Self {
        Self::Relu(Relu::new())
    }

    pub fn celu(alpha: f32) -> Self {
        Self::Celu(Celu::new(alpha))
    }

    /// A short name for this activation, used when describing a model.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sigmoid(_) => "sigmoid",
            Self::Relu(_) => "relu",
            Self::Celu(_) => "celu",
        }
    }

    pub fn f(&self, x: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.f(x),
            Self::Relu(a) => a.f(x),
            Self::Celu(a) => a.f(x),
        }
    }

    pub fn df(&self, x: f32) -> f32 {
        match self {
            Self::Sigmoid(a) => a.df(x),
            Self::Relu(a) => a.df(x),
            Self::Celu(a) => a.df(x),
        }
    }
}
