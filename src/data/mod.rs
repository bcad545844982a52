/// Data layer: core types, loading, filtering and statistics.
///
/// Architecture:
/// ```text
///  .dat (space-delimited) / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (Arrow RecordBatch)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  typed columns, numeric inventory, extents
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌─────────┐
///   │  filter   │ ───▶ │  stats   │  zero/viewport filters → summaries
///   └──────────┘      └─────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
pub mod stats;
