use super::{round_to, Groups, Mean};
use crate::session::SalesView;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySatisfaction {
    pub category:          String,
    /// Rounded to two decimals.
    pub mean_satisfaction: f64,
    pub sales_count:       u64,
    pub revenue:           f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SatisfactionBucket {
    pub score: u8,
    pub count: u64,
}

#[derive(Default)]
struct CategoryAcc {
    satisfaction: Mean,
    revenue:      f64,
}

/// Mean satisfaction per category, best first.
pub fn satisfaction_by_category(view: &SalesView<'_>) -> Vec<CategorySatisfaction> {
    let mut groups: Groups<CategoryAcc> = Groups::new();
    for rec in view.iter() {
        let acc = groups.entry(&rec.category);
        acc.satisfaction.add(rec.satisfaction as f64);
        acc.revenue += rec.revenue;
    }

    let mut rows: Vec<CategorySatisfaction> = groups
        .into_entries()
        .into_iter()
        .map(|(category, acc)| CategorySatisfaction {
            category,
            mean_satisfaction: round_to(acc.satisfaction.value().unwrap_or(0.0), 2),
            sales_count:       acc.satisfaction.count,
            revenue:           round_to(acc.revenue, 2),
        })
        .collect();
    rows.sort_by(|a, b| b.mean_satisfaction.total_cmp(&a.mean_satisfaction));
    rows
}

/// Count of each score present in the view, lowest score first.
pub fn satisfaction_distribution(view: &SalesView<'_>) -> Vec<SatisfactionBucket> {
    let mut counts: BTreeMap<u8, u64> = BTreeMap::new();
    for rec in view.iter() {
        *counts.entry(rec.satisfaction).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(score, count)| SatisfactionBucket { score, count })
        .collect()
}
