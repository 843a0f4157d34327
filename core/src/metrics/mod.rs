//! Aggregation views over a filtered selection of sales.
//!
//! RULES:
//!   - Every view is a pure function of a `SalesView`; nothing here
//!     mutates a record or keeps state between calls.
//!   - Grouping folds rows into accumulators in one pass. Groups keep
//!     first-seen order, and every sort is stable, so ties resolve to
//!     the order groups were first encountered.
//!   - An empty view yields empty results, never an error.

mod channels;
mod products;
mod satisfaction;
mod summary;

pub use channels::{
    channel_overview, channel_price_comparison, AvailabilityCount, CategoryChannelPrices,
    ChannelOverview,
};
pub use products::{margin_rotation, top_products_by_units, MarginRotation, ProductMargin, ProductUnits};
pub use satisfaction::{
    satisfaction_by_category, satisfaction_distribution, CategorySatisfaction, SatisfactionBucket,
};
pub use summary::{kpi_summary, revenue_trend, KpiSummary, TrendPoint};

use crate::{
    config::MetricsConfig,
    session::{SalesFilter, SalesTable},
    types::Granularity,
};
use serde::Serialize;
use std::collections::HashMap;

/// Every view the dashboard shows, computed from one filter invocation.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub filter:                    SalesFilter,
    pub row_count:                 usize,
    pub kpis:                      KpiSummary,
    pub top_products:              Vec<ProductUnits>,
    pub margin_rotation:           MarginRotation,
    pub top_by_margin:             Vec<ProductMargin>,
    pub top_by_rotation:           Vec<ProductMargin>,
    pub satisfaction_by_category:  Vec<CategorySatisfaction>,
    pub satisfaction_distribution: Vec<SatisfactionBucket>,
    pub channel_prices:            Vec<CategoryChannelPrices>,
    pub channel_overview:          Vec<ChannelOverview>,
    pub monthly_trend:             Vec<TrendPoint>,
}

impl DashboardReport {
    pub fn build(table: &SalesTable, filter: &SalesFilter, config: &MetricsConfig) -> Self {
        let view = table.filter(filter);
        if view.is_empty() {
            log::warn!("Filter {filter:?} selected no rows; every view will be empty");
        }
        let margin_rotation = margin_rotation(&view, config.min_rotation);
        Self {
            filter:                    filter.clone(),
            row_count:                 view.len(),
            kpis:                      kpi_summary(&view),
            top_products:              top_products_by_units(&view, config.top_products),
            top_by_margin:             margin_rotation.top_by_margin(config.ranking_size),
            top_by_rotation:           margin_rotation.top_by_rotation(config.ranking_size),
            margin_rotation,
            satisfaction_by_category:  satisfaction_by_category(&view),
            satisfaction_distribution: satisfaction_distribution(&view),
            channel_prices:            channel_price_comparison(&view),
            channel_overview:          channel_overview(&view),
            monthly_trend:             revenue_trend(&view, Granularity::Month),
        }
    }
}

/// Insertion-ordered map from group key to accumulator.
pub(crate) struct Groups<A> {
    index:   HashMap<String, usize>,
    entries: Vec<(String, A)>,
}

impl<A: Default> Groups<A> {
    pub(crate) fn new() -> Self {
        Self {
            index:   HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn entry(&mut self, key: &str) -> &mut A {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.entries.push((key.to_string(), A::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[slot].1
    }

    pub(crate) fn into_entries(self) -> Vec<(String, A)> {
        self.entries
    }
}

/// Running mean that ignores absent values.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Mean {
    sum:   f64,
    count: u64,
}

impl Mean {
    pub(crate) fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub(crate) fn add_opt(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.add(v);
        }
    }

    pub(crate) fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Median; even-length input averages the two middle values.
pub(crate) fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
