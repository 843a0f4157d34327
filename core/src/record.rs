//! Transaction records and their load-time derived fields.
//!
//! Derived fields are computed once in `SaleRecord::derive` and never
//! touched again; aggregations only read them.

use crate::types::{Availability, Channel, Granularity};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// What one channel advertises for the product of a sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelQuote {
    pub price:        f64,
    pub availability: Option<Availability>,
    pub rating:       Option<f64>,
}

/// Base fields of a sale as read from the flat file.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleInput {
    pub product:      String,
    pub category:     String,
    pub sale_date:    NaiveDate,
    pub price:        f64,
    pub units_sold:   u64,
    pub satisfaction: u8,
    /// Indexed by `Channel::index()`.
    pub channels:     [ChannelQuote; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaleRecord {
    pub product:        String,
    pub category:       String,
    pub sale_date:      NaiveDate,
    pub price:          f64,
    pub units_sold:     u64,
    pub satisfaction:   u8,
    pub channels:       [ChannelQuote; 3],
    // ── Derived ──────────────────────────────────────────────
    pub revenue:        f64,
    pub estimated_cost: f64,
    pub margin:         f64,
    /// None when the price is zero.
    pub margin_percent: Option<f64>,
    pub month_key:      String,
    pub week_key:       String,
    pub day_key:        String,
}

impl SaleRecord {
    pub fn derive(input: SaleInput, cost_ratio: f64) -> Self {
        let revenue = input.price * input.units_sold as f64;
        let estimated_cost = input.price * cost_ratio;
        let margin = input.price - estimated_cost;
        // Cost is a fixed share of price, so the percentage is too.
        let margin_percent = if input.price != 0.0 {
            Some((1.0 - cost_ratio) * 100.0)
        } else {
            None
        };
        Self {
            month_key: month_key(input.sale_date),
            week_key:  week_key(input.sale_date),
            day_key:   day_key(input.sale_date),
            product:        input.product,
            category:       input.category,
            sale_date:      input.sale_date,
            price:          input.price,
            units_sold:     input.units_sold,
            satisfaction:   input.satisfaction,
            channels:       input.channels,
            revenue,
            estimated_cost,
            margin,
            margin_percent,
        }
    }

    pub fn channel(&self, channel: Channel) -> &ChannelQuote {
        &self.channels[channel.index()]
    }

    pub fn bucket_key(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Month => &self.month_key,
            Granularity::Week  => &self.week_key,
            Granularity::Day   => &self.day_key,
        }
    }
}

/// `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Date of the Monday starting the week that contains `date`, as `YYYY-MM-DD`.
pub fn week_key(date: NaiveDate) -> String {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    monday.format("%Y-%m-%d").to_string()
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(price: f64) -> ChannelQuote {
        ChannelQuote { price, availability: None, rating: None }
    }

    fn input(price: f64, units: u64) -> SaleInput {
        SaleInput {
            product:      "Taladro".into(),
            category:     "Herramientas".into(),
            sale_date:    NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            price,
            units_sold:   units,
            satisfaction: 4,
            channels:     [quote(price), quote(price * 0.9), quote(price * 1.1)],
        }
    }

    #[test]
    fn derived_financials() {
        let rec = SaleRecord::derive(input(10_000.0, 3), 0.65);
        assert_eq!(rec.revenue, 30_000.0);
        assert_eq!(rec.estimated_cost, 6_500.0);
        assert_eq!(rec.margin, 3_500.0);
        assert_eq!(rec.margin_percent, Some(35.0));
    }

    #[test]
    fn margin_percent_is_exact_for_uneven_prices() {
        for price in [3.0, 7.0, 1_049.37, 1_234.56, 9_999.99] {
            let rec = SaleRecord::derive(input(price, 1), 0.65);
            assert_eq!(rec.margin_percent, Some(35.0), "price {price}");
        }
    }

    #[test]
    fn zero_price_has_no_margin_percent() {
        let rec = SaleRecord::derive(input(0.0, 3), 0.65);
        assert_eq!(rec.revenue, 0.0);
        assert_eq!(rec.margin_percent, None);
    }

    #[test]
    fn bucket_keys() {
        // 2024-03-14 is a Thursday.
        let rec = SaleRecord::derive(input(1.0, 1), 0.65);
        assert_eq!(rec.bucket_key(Granularity::Month), "2024-03");
        assert_eq!(rec.bucket_key(Granularity::Week), "2024-03-11");
        assert_eq!(rec.bucket_key(Granularity::Day), "2024-03-14");
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(week_key(monday), "2024-01-01");
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(week_key(sunday), "2024-01-01");
    }
}
