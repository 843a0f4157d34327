//! Per-product views: best sellers and the margin/rotation quadrant.

use super::{median, Groups, Mean};
use crate::session::SalesView;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductUnits {
    pub product:    String,
    pub category:   String,
    pub units_sold: u64,
    pub revenue:    f64,
    pub mean_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductMargin {
    pub product:             String,
    pub category:            String,
    /// Units sold in the window.
    pub rotation:            u64,
    /// None when every sale of the product had a zero price.
    pub mean_margin_percent: Option<f64>,
    pub revenue:             f64,
    pub mean_price:          f64,
}

/// Products with enough volume to plot, plus the quadrant reference lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginRotation {
    pub products:              Vec<ProductMargin>,
    pub median_rotation:       Option<f64>,
    pub median_margin_percent: Option<f64>,
}

#[derive(Default)]
struct ProductAcc {
    category: Option<String>,
    units:    u64,
    revenue:  f64,
    price:    Mean,
    margin:   Mean,
}

fn group_by_product(view: &SalesView<'_>) -> Vec<(String, ProductAcc)> {
    let mut groups: Groups<ProductAcc> = Groups::new();
    for rec in view.iter() {
        let acc = groups.entry(&rec.product);
        acc.category.get_or_insert_with(|| rec.category.clone());
        acc.units = acc.units.saturating_add(rec.units_sold);
        acc.revenue += rec.revenue;
        acc.price.add(rec.price);
        acc.margin.add_opt(rec.margin_percent);
    }
    groups.into_entries()
}

/// Best sellers by summed units, at most `n` of them.
pub fn top_products_by_units(view: &SalesView<'_>, n: usize) -> Vec<ProductUnits> {
    let mut rows: Vec<ProductUnits> = group_by_product(view)
        .into_iter()
        .map(|(product, acc)| ProductUnits {
            product,
            category:   acc.category.unwrap_or_default(),
            units_sold: acc.units,
            revenue:    acc.revenue,
            mean_price: acc.price.value().unwrap_or(0.0),
        })
        .collect();
    rows.sort_by(|a, b| b.units_sold.cmp(&a.units_sold));
    rows.truncate(n);
    rows
}

/// Products with at least `min_rotation` units, with medians taken over
/// the products that survive the cut.
pub fn margin_rotation(view: &SalesView<'_>, min_rotation: u64) -> MarginRotation {
    let products: Vec<ProductMargin> = group_by_product(view)
        .into_iter()
        .filter(|(_, acc)| acc.units >= min_rotation)
        .map(|(product, acc)| ProductMargin {
            product,
            category:            acc.category.unwrap_or_default(),
            rotation:            acc.units,
            mean_margin_percent: acc.margin.value(),
            revenue:             acc.revenue,
            mean_price:          acc.price.value().unwrap_or(0.0),
        })
        .collect();

    let median_rotation = median(products.iter().map(|p| p.rotation as f64).collect());
    let median_margin_percent = median(products.iter().filter_map(|p| p.mean_margin_percent).collect());
    log::debug!(
        "margin_rotation: {} products at or above {min_rotation} units",
        products.len()
    );

    MarginRotation {
        products,
        median_rotation,
        median_margin_percent,
    }
}

impl MarginRotation {
    /// Highest mean margin first; products without a margin are left out.
    pub fn top_by_margin(&self, n: usize) -> Vec<ProductMargin> {
        let mut ranked: Vec<ProductMargin> = self
            .products
            .iter()
            .filter(|p| p.mean_margin_percent.is_some())
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            let a = a.mean_margin_percent.unwrap_or(f64::NEG_INFINITY);
            let b = b.mean_margin_percent.unwrap_or(f64::NEG_INFINITY);
            b.total_cmp(&a)
        });
        ranked.truncate(n);
        ranked
    }

    pub fn top_by_rotation(&self, n: usize) -> Vec<ProductMargin> {
        let mut ranked = self.products.clone();
        ranked.sort_by(|a, b| b.rotation.cmp(&a.rotation));
        ranked.truncate(n);
        ranked
    }
}
