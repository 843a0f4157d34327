//! Dataset augmenter: turns a small seed file into the expanded,
//! enriched file the engine reads.
//!
//! PIPELINE (fixed order):
//!   1. synthesize : satisfaction, channel prices, availability, ratings
//!   2. expand     : one shifted, jittered copy per month forward
//!   3. clamp      : every price column floored, elementwise
//!   4. write      : Latin-1 TSV, overwriting the target
//!
//! All draws come from per-concern streams of a single master seed, so
//! the same seed and seed file always produce the same output bytes.

use crate::{
    config::AugmentConfig,
    error::{SalesError, SalesResult},
    flat_file::{format_date, parse_day_first, parse_number, FlatTable},
    rng::{RngBank, StreamRng, StreamSlot},
    types::{columns, Availability, Channel},
};
use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;
use std::path::Path;

/// A channel's synthesized listing for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelListing {
    pub price:        f64,
    pub availability: Availability,
    pub rating:       f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    /// Seed cells in seed column order. Date and price cells are
    /// superseded by the typed fields when written.
    pub passthrough:  Vec<String>,
    /// None when the seed date could not be parsed.
    pub sale_date:    Option<NaiveDate>,
    pub price:        f64,
    pub satisfaction: u8,
    /// Indexed by `Channel::index()`.
    pub channels:     [ChannelListing; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTable {
    pub source_name:  String,
    pub seed_headers: Vec<String>,
    date_col:         usize,
    price_col:        usize,
    pub rows:         Vec<EnrichedRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AugmentReport {
    pub seed:          u64,
    pub seed_rows:     usize,
    pub output_rows:   usize,
    pub clamped_cells: usize,
    pub dropped_dates: usize,
}

/// Names of the columns the augmenter adds, in output order.
pub fn synthesized_columns() -> Vec<String> {
    let mut cols = vec![columns::SATISFACTION.to_string()];
    cols.extend(Channel::ALL.iter().map(|c| c.price_column()));
    cols.extend(Channel::ALL.iter().map(|c| c.availability_column()));
    cols.extend(Channel::ALL.iter().map(|c| c.rating_column()));
    cols
}

pub struct Augmenter {
    config:       AugmentConfig,
    satisfaction: StreamRng,
    prices:       StreamRng,
    availability: StreamRng,
    ratings:      StreamRng,
    expansion:    StreamRng,
}

impl Augmenter {
    pub fn new(config: AugmentConfig, seed: u64) -> Self {
        let bank = RngBank::new(seed);
        Self {
            config,
            satisfaction: bank.for_stream(StreamSlot::Satisfaction),
            prices:       bank.for_stream(StreamSlot::ChannelPrices),
            availability: bank.for_stream(StreamSlot::Availability),
            ratings:      bank.for_stream(StreamSlot::Ratings),
            expansion:    bank.for_stream(StreamSlot::Expansion),
        }
    }

    /// Full pipeline minus I/O: synthesize, expand by the configured
    /// number of months, then clamp.
    pub fn run(&mut self, seed_table: &FlatTable) -> SalesResult<EnrichedTable> {
        let enriched = self.synthesize(seed_table)?;
        let mut expanded = self.expand(&enriched, self.config.months_forward);
        clamp_prices(&mut expanded, self.config.price_floor);
        Ok(expanded)
    }

    /// Draw the synthetic columns for every seed row.
    pub fn synthesize(&mut self, seed_table: &FlatTable) -> SalesResult<EnrichedTable> {
        let date_col = seed_table.require_column(columns::SALE_DATE)?;
        let price_col = seed_table.require_column(columns::PRICE)?;

        let mut rows = Vec::with_capacity(seed_table.rows.len());
        for (i, cells) in seed_table.rows.iter().enumerate() {
            let raw_price = &cells[price_col];
            let price = parse_number(raw_price).ok_or_else(|| SalesError::MalformedValue {
                line:   i + 2,
                column: columns::PRICE.to_string(),
                value:  raw_price.clone(),
            })?;
            let sale_date = parse_day_first(&cells[date_col]);

            let satisfaction = self.draw_satisfaction();
            let channels = self.draw_channels(price);
            rows.push(EnrichedRow {
                passthrough: cells.clone(),
                sale_date,
                price,
                satisfaction,
                channels,
            });
        }

        let unparsed = rows.iter().filter(|r| r.sale_date.is_none()).count();
        if unparsed > 0 {
            log::warn!(
                "{unparsed} seed rows in {} have an unparseable {}",
                seed_table.source_name,
                columns::SALE_DATE
            );
        }
        log::debug!("Synthesized channel columns for {} seed rows", rows.len());

        Ok(EnrichedTable {
            source_name:  seed_table.source_name.clone(),
            seed_headers: seed_table.headers.clone(),
            date_col,
            price_col,
            rows,
        })
    }

    /// Append `months_forward` drifted copies after the original block.
    ///
    /// Copy `k` (1-based) has every date moved `k` months forward plus a
    /// random day jitter, all prices scaled by one per-row drift factor,
    /// and satisfaction re-drawn. Availability and ratings carry over.
    pub fn expand(&mut self, enriched: &EnrichedTable, months_forward: u32) -> EnrichedTable {
        let mut rows = Vec::with_capacity(enriched.rows.len() * (months_forward as usize + 1));
        rows.extend(enriched.rows.iter().cloned());

        for offset in 1..=months_forward {
            for original in &enriched.rows {
                let mut row = original.clone();
                let jitter = self.expansion.next_u64_below(self.config.max_day_jitter as u64);
                row.sale_date = original
                    .sale_date
                    .and_then(|d| shift_date(d, offset, jitter));

                let drift = self
                    .expansion
                    .uniform(self.config.price_drift.low, self.config.price_drift.high);
                row.price *= drift;
                for listing in row.channels.iter_mut() {
                    listing.price *= drift;
                }

                row.satisfaction = self.draw_satisfaction();
                rows.push(row);
            }
            log::debug!("Expanded month offset {offset}");
        }

        EnrichedTable {
            rows,
            ..enriched.clone_header()
        }
    }

    fn draw_satisfaction(&mut self) -> u8 {
        self.satisfaction
            .weighted_index(&self.config.satisfaction_weights) as u8
            + 1
    }

    fn draw_channels(&mut self, base_price: f64) -> [ChannelListing; 3] {
        let discount = self
            .prices
            .uniform(self.config.amazon_discount.low, self.config.amazon_discount.high);
        let variation = self.prices.uniform(
            self.config.mercadolibre_variation.low,
            self.config.mercadolibre_variation.high,
        );
        let channel_prices = [
            base_price,
            base_price * (1.0 - discount),
            base_price * (1.0 + variation),
        ];

        Channel::ALL.map(|channel| {
            let i = channel.index();
            let availability =
                Availability::ALL[self.availability.weighted_index(&self.config.availability_weights[i])];
            let params = self.config.rating_params[i];
            let rating = round_one_decimal(self.ratings.normal(params.mean, params.std_dev).clamp(1.0, 5.0));
            ChannelListing {
                price: channel_prices[i],
                availability,
                rating,
            }
        })
    }
}

/// Floor every price column at `floor`. Returns how many cells were raised.
pub fn clamp_prices(table: &mut EnrichedTable, floor: f64) -> usize {
    let mut clamped = 0;
    for row in &mut table.rows {
        let prices = std::iter::once(&mut row.price)
            .chain(row.channels.iter_mut().map(|l| &mut l.price));
        for price in prices {
            if *price < floor {
                *price = floor;
                clamped += 1;
            }
        }
    }
    if clamped > 0 {
        log::info!("Raised {clamped} price cells to the floor of {floor}");
    }
    clamped
}

/// Move a date `months` forward (clamping to month end) then `days` forward.
fn shift_date(date: NaiveDate, months: u32, days: u64) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))?
        .checked_add_signed(Duration::days(days as i64))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl EnrichedTable {
    fn clone_header(&self) -> Self {
        Self {
            source_name:  self.source_name.clone(),
            seed_headers: self.seed_headers.clone(),
            date_col:     self.date_col,
            price_col:    self.price_col,
            rows:         Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as a flat table: seed columns first (minus any the
    /// augmenter regenerates), then the synthesized columns.
    pub fn to_flat(&self, source_name: &str) -> FlatTable {
        let synthesized = synthesized_columns();
        let kept: Vec<usize> = (0..self.seed_headers.len())
            .filter(|i| !synthesized.contains(&self.seed_headers[*i]))
            .collect();

        let mut headers: Vec<String> = kept.iter().map(|i| self.seed_headers[*i].clone()).collect();
        headers.extend(synthesized);
        let mut flat = FlatTable::new(source_name, headers);

        for row in &self.rows {
            let mut cells: Vec<String> = kept
                .iter()
                .map(|&i| {
                    if i == self.date_col {
                        row.sale_date.map(format_date).unwrap_or_default()
                    } else if i == self.price_col {
                        row.price.to_string()
                    } else {
                        row.passthrough[i].clone()
                    }
                })
                .collect();
            cells.push(row.satisfaction.to_string());
            cells.extend(row.channels.iter().map(|l| l.price.to_string()));
            cells.extend(row.channels.iter().map(|l| l.availability.label().to_string()));
            cells.extend(row.channels.iter().map(|l| format!("{:.1}", l.rating)));
            flat.rows.push(cells);
        }
        flat
    }
}

/// Read `seed_path`, augment, and write the result to `out_path`.
pub fn augment_file(
    seed_path: &Path,
    out_path: &Path,
    config: &AugmentConfig,
    seed: u64,
) -> SalesResult<AugmentReport> {
    let seed_table = FlatTable::read(seed_path)?;
    let mut augmenter = Augmenter::new(config.clone(), seed);
    let enriched = augmenter.synthesize(&seed_table)?;
    let mut expanded = augmenter.expand(&enriched, config.months_forward);
    let clamped_cells = clamp_prices(&mut expanded, config.price_floor);
    let dropped_dates = expanded.rows.iter().filter(|r| r.sale_date.is_none()).count();

    expanded
        .to_flat(&out_path.display().to_string())
        .write(out_path)?;

    let report = AugmentReport {
        seed,
        seed_rows: seed_table.rows.len(),
        output_rows: expanded.len(),
        clamped_cells,
        dropped_dates,
    };
    log::info!(
        "Augmented {} seed rows into {} rows (seed {seed})",
        report.seed_rows,
        report.output_rows
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_table() -> FlatTable {
        FlatTable::parse(
            "producto\tcategoria\tfecha_venta\tprecio\tunidades_vendidas\n\
             Taladro\tHerramientas\t31/01/2024\t10000\t3\n\
             Martillo\tHerramientas\tnot a date\t5000\t1\n",
            "seed",
        )
        .unwrap()
    }

    #[test]
    fn month_shift_clamps_to_month_end() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(shift_date(jan31, 1, 0), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(shift_date(jan31, 1, 3), NaiveDate::from_ymd_opt(2024, 3, 3));
    }

    #[test]
    fn homecenter_tracks_base_price() {
        let mut aug = Augmenter::new(AugmentConfig::default(), 1);
        let enriched = aug.synthesize(&seed_table()).unwrap();
        for row in &enriched.rows {
            assert_eq!(row.channels[Channel::HomeCenter.index()].price, row.price);
            let amazon = row.channels[Channel::Amazon.index()].price;
            assert!(amazon <= row.price * 0.95 && amazon > row.price * 0.85);
        }
    }

    #[test]
    fn unparseable_seed_dates_survive_as_empty() {
        let mut aug = Augmenter::new(AugmentConfig::default(), 1);
        let expanded = aug.run(&seed_table()).unwrap();
        let flat = expanded.to_flat("out");
        let date_col = flat.require_column("fecha_venta").unwrap();
        assert_eq!(flat.rows[0][date_col], "2024-01-31");
        assert_eq!(flat.rows[1][date_col], "");
    }

    #[test]
    fn missing_price_column_is_rejected() {
        let table = FlatTable::parse("producto\tfecha_venta\nTaladro\t01/01/2024\n", "seed").unwrap();
        let mut aug = Augmenter::new(AugmentConfig::default(), 1);
        assert!(matches!(aug.synthesize(&table), Err(SalesError::MissingColumn { .. })));
    }

    #[test]
    fn regenerated_columns_are_not_duplicated() {
        let table = FlatTable::parse(
            "producto\tfecha_venta\tprecio\tsatisfaccion_cliente\nTaladro\t01/01/2024\t2000\t1\n",
            "seed",
        )
        .unwrap();
        let mut aug = Augmenter::new(AugmentConfig::default(), 1);
        let flat = aug.run(&table).unwrap().to_flat("out");
        let count = flat.headers.iter().filter(|h| *h == "satisfaccion_cliente").count();
        assert_eq!(count, 1);
        assert_eq!(flat.headers.len(), 3 + synthesized_columns().len());
    }
}
