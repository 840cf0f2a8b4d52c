// Domain layer: request/outcome models and the compiler port. No network or zip code here.

pub mod model;
pub mod ports;
