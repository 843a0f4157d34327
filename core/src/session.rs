//! Engine session: owns loaded tables and hands out filtered views.
//!
//! RULES:
//!   - A file is parsed at most once per session; later loads of the
//!     same path return the cached table.
//!   - Tables are immutable once loaded. Filtering builds a new view
//!     of borrowed rows and never touches the table.

use crate::{
    config::MetricsConfig,
    error::{SalesError, SalesResult},
    flat_file::{parse_count, parse_day_first, parse_number, FlatTable},
    record::{ChannelQuote, SaleInput, SaleRecord},
    types::{columns, Availability, Channel, DateRange},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Every valid row of one loaded file.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    pub source_name:  String,
    pub records:      Vec<SaleRecord>,
    /// Rows discarded for an unparseable sale date.
    pub dropped_rows: usize,
}

/// Predicate applied by `SalesView::filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesFilter {
    pub dates:    DateRange,
    /// None means every category.
    pub category: Option<String>,
}

impl SalesFilter {
    pub fn new(dates: DateRange) -> Self {
        Self { dates, category: None }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, record: &SaleRecord) -> bool {
        self.dates.contains(record.sale_date)
            && self.category.as_deref().map_or(true, |c| record.category == c)
    }
}

/// An ordered selection of rows borrowed from a table.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesView<'a> {
    rows: Vec<&'a SaleRecord>,
}

impl<'a> SalesView<'a> {
    pub fn filter(&self, filter: &SalesFilter) -> SalesView<'a> {
        SalesView {
            rows: self.rows.iter().copied().filter(|r| filter.matches(r)).collect(),
        }
    }

    pub fn rows(&self) -> &[&'a SaleRecord] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a SaleRecord> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Choices a caller can offer for filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub first_date: NaiveDate,
    pub last_date:  NaiveDate,
    pub categories: Vec<String>,
}

impl FilterOptions {
    pub fn full_range(&self) -> DateRange {
        DateRange::new(self.first_date, self.last_date)
    }
}

impl SalesTable {
    pub fn view(&self) -> SalesView<'_> {
        SalesView { rows: self.records.iter().collect() }
    }

    pub fn filter(&self, filter: &SalesFilter) -> SalesView<'_> {
        self.view().filter(filter)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date bounds and distinct categories, sorted.
    pub fn filter_options(&self) -> Option<FilterOptions> {
        let first_date = self.records.iter().map(|r| r.sale_date).min()?;
        let last_date = self.records.iter().map(|r| r.sale_date).max()?;
        let categories: BTreeSet<&str> = self.records.iter().map(|r| r.category.as_str()).collect();
        Some(FilterOptions {
            first_date,
            last_date,
            categories: categories.into_iter().map(str::to_string).collect(),
        })
    }

    /// Build a table from a decoded flat file.
    pub fn from_flat(flat: &FlatTable, config: &MetricsConfig) -> SalesResult<Self> {
        let layout = ColumnLayout::resolve(flat)?;

        let mut records = Vec::with_capacity(flat.rows.len());
        let mut dropped_rows = 0;
        for (i, cells) in flat.rows.iter().enumerate() {
            let line = i + 2;
            let Some(sale_date) = parse_day_first(&cells[layout.sale_date]) else {
                dropped_rows += 1;
                continue;
            };
            let input = layout.read_row(cells, line, sale_date)?;
            records.push(SaleRecord::derive(input, config.cost_ratio));
        }

        if dropped_rows > 0 {
            log::warn!(
                "Dropped {dropped_rows} rows with an unparseable {} from {}",
                columns::SALE_DATE,
                flat.source_name
            );
        }
        if records.is_empty() {
            return Err(SalesError::NoValidDates {
                source_name: flat.source_name.clone(),
            });
        }

        Ok(Self {
            source_name: flat.source_name.clone(),
            records,
            dropped_rows,
        })
    }
}

/// Column positions resolved once per file.
struct ColumnLayout {
    product:        usize,
    category:       usize,
    sale_date:      usize,
    price:          usize,
    units_sold:     usize,
    satisfaction:   usize,
    channel_price:  [usize; 3],
    availability:   [Option<usize>; 3],
    rating:         [Option<usize>; 3],
}

impl ColumnLayout {
    fn resolve(flat: &FlatTable) -> SalesResult<Self> {
        let mut channel_price = [0; 3];
        let mut availability = [None; 3];
        let mut rating = [None; 3];
        for channel in Channel::ALL {
            let i = channel.index();
            channel_price[i] = flat.require_column(&channel.price_column())?;
            availability[i] = flat.column(&channel.availability_column());
            rating[i] = flat.column(&channel.rating_column());
        }
        Ok(Self {
            product:      flat.require_column(columns::PRODUCT)?,
            category:     flat.require_column(columns::CATEGORY)?,
            sale_date:    flat.require_column(columns::SALE_DATE)?,
            price:        flat.require_column(columns::PRICE)?,
            units_sold:   flat.require_column(columns::UNITS_SOLD)?,
            satisfaction: flat.require_column(columns::SATISFACTION)?,
            channel_price,
            availability,
            rating,
        })
    }

    fn read_row(&self, cells: &[String], line: usize, sale_date: NaiveDate) -> SalesResult<SaleInput> {
        let malformed = |column: &str, idx: usize| SalesError::MalformedValue {
            line,
            column: column.to_string(),
            value:  cells[idx].clone(),
        };

        let price = parse_number(&cells[self.price]).ok_or_else(|| malformed(columns::PRICE, self.price))?;
        let units_sold = parse_count(&cells[self.units_sold])
            .ok_or_else(|| malformed(columns::UNITS_SOLD, self.units_sold))?;
        let satisfaction = parse_count(&cells[self.satisfaction])
            .filter(|s| (1..=5).contains(s))
            .ok_or_else(|| malformed(columns::SATISFACTION, self.satisfaction))? as u8;

        let mut quotes = Vec::with_capacity(3);
        for channel in Channel::ALL {
            let i = channel.index();
            let col = self.channel_price[i];
            let price = parse_number(&cells[col]).ok_or_else(|| malformed(&channel.price_column(), col))?;
            let availability = self.availability[i].and_then(|c| Availability::from_label(&cells[c]));
            let rating = self.rating[i].and_then(|c| parse_number(&cells[c]));
            quotes.push(ChannelQuote { price, availability, rating });
        }
        let channels: [ChannelQuote; 3] = quotes
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected one quote per channel"))?;

        Ok(SaleInput {
            product:  cells[self.product].clone(),
            category: cells[self.category].clone(),
            sale_date,
            price,
            units_sold,
            satisfaction,
            channels,
        })
    }
}

/// Explicit handle owning every table loaded during one session.
pub struct SalesSession {
    config: MetricsConfig,
    cache:  HashMap<PathBuf, Arc<SalesTable>>,
    parses: usize,
}

impl SalesSession {
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            parses: 0,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Load `path`, parsing it only on the first call for that path.
    pub fn load(&mut self, path: &Path) -> SalesResult<Arc<SalesTable>> {
        if let Some(table) = self.cache.get(path) {
            log::debug!("Cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }

        let flat = FlatTable::read(path)?;
        let table = Arc::new(SalesTable::from_flat(&flat, &self.config)?);
        self.parses += 1;
        log::info!(
            "Loaded {} rows from {} ({} dropped)",
            table.len(),
            path.display(),
            table.dropped_rows
        );
        self.cache.insert(path.to_path_buf(), Arc::clone(&table));
        Ok(table)
    }

    /// How many files this session has actually parsed.
    pub fn parse_count(&self) -> usize {
        self.parses
    }
}
