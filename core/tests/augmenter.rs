//! Augmenter tests: expansion shape, price floor and written output.

use chrono::{Datelike, Months};
use sales_metrics_core::{
    augmenter::{augment_file, clamp_prices, synthesized_columns, Augmenter},
    config::AugmentConfig,
    flat_file::FlatTable,
    types::Channel,
};
use std::path::PathBuf;

const SEED_FILE: &str = "\
producto\tcategoria\tfecha_venta\tprecio\tunidades_vendidas\turl
Taladro percutor\tHerramientas\t15/01/2024\t250000\t3\thttps://example.test/1
Martillo\tHerramientas\t20/01/2024\t800\t7\thttps://example.test/2
Pintura blanca\tPinturas\t31/01/2024\t95000\t2\thttps://example.test/3
";

fn seed_table() -> FlatTable {
    FlatTable::parse(SEED_FILE, "seed").expect("seed parses")
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sales-metrics-aug-{}-{name}", std::process::id()))
}

#[test]
fn expand_produces_one_block_per_month_plus_original() {
    let mut aug = Augmenter::new(AugmentConfig::default(), 42);
    let enriched = aug.synthesize(&seed_table()).unwrap();
    let expanded = aug.expand(&enriched, 5);

    assert_eq!(expanded.len(), 6 * enriched.len());
    assert_eq!(&expanded.rows[..enriched.len()], &enriched.rows[..]);
}

#[test]
fn copies_are_shifted_by_their_offset() {
    let mut aug = Augmenter::new(AugmentConfig::default(), 7);
    let enriched = aug.synthesize(&seed_table()).unwrap();
    let expanded = aug.expand(&enriched, 5);
    let n = enriched.len();

    for offset in 1..=5u32 {
        for (i, original) in enriched.rows.iter().enumerate() {
            let copy = &expanded.rows[offset as usize * n + i];
            let base = original.sale_date.unwrap();
            let shifted = base.checked_add_months(Months::new(offset)).unwrap();
            let date = copy.sale_date.unwrap();
            let jitter = (date - shifted).num_days();
            assert!((0..28).contains(&jitter), "offset {offset} row {i}: jitter {jitter}");
            assert_eq!(copy.passthrough, original.passthrough);
            // Price drift is shared across every price column of the row.
            let ratio = copy.price / original.price;
            assert!((0.95..1.05).contains(&ratio), "drift {ratio}");
            for (c, o) in copy.channels.iter().zip(original.channels.iter()) {
                assert!((c.price / o.price - ratio).abs() < 1e-9);
                assert_eq!(c.availability, o.availability);
                assert_eq!(c.rating, o.rating);
            }
        }
    }
}

#[test]
fn month_end_dates_clamp_before_jitter() {
    let mut config = AugmentConfig::default();
    config.max_day_jitter = 1;
    let mut aug = Augmenter::new(config, 1);
    let enriched = aug.synthesize(&seed_table()).unwrap();
    let expanded = aug.expand(&enriched, 1);
    // 31/01/2024 + 1 month lands on the last day of February.
    let feb = expanded.rows[enriched.len() + 2].sale_date.unwrap();
    assert_eq!((feb.month(), feb.day()), (2, 29));
}

#[test]
fn every_price_respects_the_floor() {
    let mut aug = Augmenter::new(AugmentConfig::default(), 3);
    let expanded = aug.run(&seed_table()).unwrap();
    for row in &expanded.rows {
        assert!(row.price >= 1000.0, "base price {}", row.price);
        for listing in &row.channels {
            assert!(listing.price >= 1000.0, "channel price {}", listing.price);
        }
    }
    // The 800 seed row is lifted to exactly the floor.
    assert_eq!(expanded.rows[1].price, 1000.0);
}

#[test]
fn clamp_reports_raised_cells() {
    let mut aug = Augmenter::new(AugmentConfig::default(), 3);
    let mut enriched = aug.synthesize(&seed_table()).unwrap();
    // Only the 800 row is below the floor, on all four price columns.
    assert_eq!(clamp_prices(&mut enriched, 1000.0), 4);
    assert_eq!(clamp_prices(&mut enriched, 1000.0), 0);
}

#[test]
fn synthesized_values_stay_in_their_domains() {
    let mut aug = Augmenter::new(AugmentConfig::default(), 11);
    let expanded = aug.run(&seed_table()).unwrap();
    for row in &expanded.rows {
        assert!((1..=5).contains(&row.satisfaction));
        for listing in &row.channels {
            assert!((1.0..=5.0).contains(&listing.rating));
            assert_eq!((listing.rating * 10.0).round() / 10.0, listing.rating);
        }
        let hc = row.channels[Channel::HomeCenter.index()].price;
        assert!((hc - row.price).abs() < 1e-9 || row.price == 1000.0);
    }
}

#[test]
fn written_file_keeps_seed_columns_and_adds_channels() {
    let input = temp_path("seed.csv");
    let output = temp_path("out.csv");
    std::fs::write(&input, SEED_FILE).unwrap();

    let report = augment_file(&input, &output, &AugmentConfig::default(), 99).unwrap();
    assert_eq!(report.seed_rows, 3);
    assert_eq!(report.output_rows, 18);
    assert!(report.clamped_cells >= 4);

    let written = FlatTable::read(&output).unwrap();
    assert_eq!(written.rows.len(), 18);
    assert_eq!(&written.headers[..6], ["producto", "categoria", "fecha_venta", "precio", "unidades_vendidas", "url"]);
    assert_eq!(&written.headers[6..], &synthesized_columns()[..]);
    let url = written.require_column("url").unwrap();
    assert_eq!(written.rows[0][url], "https://example.test/1");

    std::fs::remove_file(input).ok();
    std::fs::remove_file(output).ok();
}
