use super::Mean;
use crate::{session::SalesView, types::Granularity};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Headline numbers for the filtered window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_revenue:   f64,
    pub units_sold:      u64,
    /// Mean price across rows; None for an empty view.
    pub average_ticket:  Option<f64>,
    pub unique_products: usize,
    pub transactions:    usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub bucket:     String,
    pub revenue:    f64,
    pub units_sold: u64,
}

pub fn kpi_summary(view: &SalesView<'_>) -> KpiSummary {
    let mut ticket = Mean::default();
    let mut products = HashSet::new();
    let mut total_revenue = 0.0;
    let mut units_sold: u64 = 0;
    for rec in view.iter() {
        ticket.add(rec.price);
        products.insert(rec.product.as_str());
        total_revenue += rec.revenue;
        units_sold = units_sold.saturating_add(rec.units_sold);
    }
    KpiSummary {
        total_revenue,
        units_sold,
        average_ticket: ticket.value(),
        unique_products: products.len(),
        transactions: view.len(),
    }
}

/// Revenue and units per time bucket, oldest bucket first.
pub fn revenue_trend(view: &SalesView<'_>, granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
    for rec in view.iter() {
        let entry = buckets.entry(rec.bucket_key(granularity)).or_default();
        entry.0 += rec.revenue;
        entry.1 = entry.1.saturating_add(rec.units_sold);
    }
    buckets
        .into_iter()
        .map(|(bucket, (revenue, units_sold))| TrendPoint {
            bucket: bucket.to_string(),
            revenue,
            units_sold,
        })
        .collect()
}
