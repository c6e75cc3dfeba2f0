mod act_fn;
mod celu;
mod relu;
mod sigmoid;

pub use act_fn::ActFn;
pub use celu::Celu;
pub use relu::Relu;
pub use sigmoid::Sigmoid;
