//! Pure post-processing over assembled benchmark results.

pub mod stats;

pub use stats::{
    lowest_route_build_time, measure_provider_stats, measure_report, most_profitable_all,
    HitStats, ProviderStats, StatsGroup, HIT_THRESHOLD,
};
