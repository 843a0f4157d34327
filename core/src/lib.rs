//! Sales metrics core: dataset augmentation and the aggregation engine
//! behind the sales dashboard.
//!
//! Data flows one way:
//!   augmenter (seed file → expanded file)
//!   → session load (parse, derive, cache)
//!   → filter (date range + category)
//!   → metrics views (handed to the rendering layer)

pub mod augmenter;
pub mod config;
pub mod error;
pub mod flat_file;
pub mod metrics;
pub mod record;
pub mod rng;
pub mod session;
pub mod types;

pub use error::{SalesError, SalesResult};
