// Domain layer: core models, Telegram wire types and ports (interfaces).

pub mod model;
pub mod ports;
pub mod telegram;
