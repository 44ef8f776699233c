//! Exchange-level container of mapping registries

mod exchanger;
mod pass;

pub use exchanger::{Exchanger, RegistrySummary};
pub use pass::ExchangePass;
