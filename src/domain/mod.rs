// Domain layer: migration models and ports (interfaces).

pub mod model;
pub mod ports;
