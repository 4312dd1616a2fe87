/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalesDataset (loaded once, never mutated)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<TransactionRow>, filter domains
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSelection → FilteredView (borrowed rows)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  group-by / reduce → ChartTable, Kpis
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
