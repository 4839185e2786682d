pub mod highlights;
pub mod http;
pub mod model;
pub mod persist;
pub mod rank;
pub mod ratios;
pub mod season_stats;
pub mod state;
pub mod store_feed;
pub mod store_fetch;
pub mod validate;
