// Domain layer: response-analytics models and the ports the engine is driven through.

pub mod credential;
pub mod model;
pub mod ports;
