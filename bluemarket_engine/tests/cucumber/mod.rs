mod market_world;
mod setups;
mod steps;

pub use market_world::{MarketSystem, MarketWorld};
