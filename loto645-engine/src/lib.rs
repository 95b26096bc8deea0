pub mod config;
pub mod features;
pub mod generator;
pub mod hit_rate;
pub mod normalize;
pub mod recommend;
pub mod snapshot;
