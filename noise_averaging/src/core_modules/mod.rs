pub mod frame;
pub mod group_aggregator;
pub mod noise_injector;
pub mod noise_ratio;
pub mod sample_set;
pub mod stat_result;
pub mod utils;
