// Domain layer: the row/page/summary model and the ports the engine talks through.

pub mod model;
pub mod ports;
