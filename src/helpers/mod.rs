pub mod simd_helpers;
pub mod stats_helpers;
