/// Data layer: core types, loading, filtering and export.
///
/// Architecture:
/// ```text
///  .csv (path or URL)
///        │
///        ▼
///   ┌──────────┐
///   │ encoding  │  bytes → text (latin1 / cp1252 / utf8, strict)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  text → OpportunityTable, memoized per (source, encoding)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  fixed rules → options → user selection → row indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  rows → CSV / JSON
///   └──────────┘
/// ```

pub mod encoding;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
