//! Cross-channel views: average prices per category and channel health.

use super::{round_to, Groups, Mean};
use crate::{
    session::SalesView,
    types::{Availability, Channel},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChannelPrices {
    pub category:                  String,
    pub homecenter:                f64,
    pub amazon:                    f64,
    pub mercadolibre:              f64,
    pub revenue:                   f64,
    /// Percent difference against homecenter; None when homecenter averages zero.
    pub amazon_diff_percent:       Option<f64>,
    pub mercadolibre_diff_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityCount {
    pub availability: Availability,
    pub count:        u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelOverview {
    pub channel:      Channel,
    pub mean_price:   Option<f64>,
    /// Over rows carrying a rating for this channel.
    pub mean_rating:  Option<f64>,
    pub availability: Vec<AvailabilityCount>,
}

#[derive(Default)]
struct PriceAcc {
    prices:  [Mean; 3],
    revenue: f64,
}

/// Average channel prices per category, sorted by category name.
///
/// Averages are rounded to whole currency units before the differences
/// are taken; differences are rounded to one decimal.
pub fn channel_price_comparison(view: &SalesView<'_>) -> Vec<CategoryChannelPrices> {
    let mut groups: Groups<PriceAcc> = Groups::new();
    for rec in view.iter() {
        let acc = groups.entry(&rec.category);
        for (mean, quote) in acc.prices.iter_mut().zip(rec.channels.iter()) {
            mean.add(quote.price);
        }
        acc.revenue += rec.revenue;
    }

    let mut rows: Vec<CategoryChannelPrices> = groups
        .into_entries()
        .into_iter()
        .map(|(category, acc)| {
            let [homecenter, amazon, mercadolibre] =
                acc.prices.map(|m| round_to(m.value().unwrap_or(0.0), 0));
            CategoryChannelPrices {
                category,
                homecenter,
                amazon,
                mercadolibre,
                revenue: round_to(acc.revenue, 0),
                amazon_diff_percent: percent_diff(amazon, homecenter),
                mercadolibre_diff_percent: percent_diff(mercadolibre, homecenter),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.category.cmp(&b.category));
    rows
}

/// `(value - reference) / reference * 100`, one decimal.
pub fn percent_diff(value: f64, reference: f64) -> Option<f64> {
    if reference == 0.0 {
        return None;
    }
    Some(round_to((value - reference) / reference * 100.0, 1))
}

/// Mean price, mean rating and availability counts for each channel.
pub fn channel_overview(view: &SalesView<'_>) -> Vec<ChannelOverview> {
    Channel::ALL
        .iter()
        .map(|&channel| {
            let mut price = Mean::default();
            let mut rating = Mean::default();
            let mut counts = [0u64; 4];
            for rec in view.iter() {
                let quote = rec.channel(channel);
                price.add(quote.price);
                rating.add_opt(quote.rating);
                if let Some(a) = quote.availability {
                    counts[a.index()] += 1;
                }
            }
            ChannelOverview {
                channel,
                mean_price: price.value(),
                mean_rating: rating.value().map(|r| round_to(r, 2)),
                availability: Availability::ALL
                    .iter()
                    .zip(counts)
                    .map(|(&availability, count)| AvailabilityCount { availability, count })
                    .collect(),
            }
        })
        .collect()
}
