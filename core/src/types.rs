//! Shared primitive types used across the augmenter and the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names of the flat transaction file.
pub mod columns {
    pub const PRODUCT:      &str = "producto";
    pub const CATEGORY:     &str = "categoria";
    pub const SALE_DATE:    &str = "fecha_venta";
    pub const PRICE:        &str = "precio";
    pub const UNITS_SOLD:   &str = "unidades_vendidas";
    pub const SATISFACTION: &str = "satisfaccion_cliente";
}

/// One of the three retail outlets quoting the same product.
///
/// `HomeCenter` is the reference channel: its price equals the base price
/// and price differences are expressed relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    HomeCenter,
    Amazon,
    MercadoLibre,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::HomeCenter, Channel::Amazon, Channel::MercadoLibre];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::HomeCenter   => "homecenter",
            Self::Amazon       => "amazon",
            Self::MercadoLibre => "mercadolibre",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::HomeCenter   => 0,
            Self::Amazon       => 1,
            Self::MercadoLibre => 2,
        }
    }

    pub fn price_column(&self) -> String {
        format!("precio_{}", self.slug())
    }

    pub fn availability_column(&self) -> String {
        format!("disponibilidad_{}", self.slug())
    }

    pub fn rating_column(&self) -> String {
        format!("calificacion_{}", self.slug())
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Stock state advertised by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    OnRequest,
    SoldOut,
    NextDayShipping,
}

impl Availability {
    /// Ordered as the augmenter's weight vectors are.
    pub const ALL: [Availability; 4] = [
        Availability::Available,
        Availability::OnRequest,
        Availability::SoldOut,
        Availability::NextDayShipping,
    ];

    /// Label as it appears in the flat file.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available       => "Disponible",
            Self::OnRequest       => "Consultar",
            Self::SoldOut         => "Agotado",
            Self::NextDayShipping => "Envío 24h",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::Available       => 0,
            Self::OnRequest       => 1,
            Self::SoldOut         => 2,
            Self::NextDayShipping => 3,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.label() == label.trim())
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Time-bucket granularity for trend grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Month,
    Week,
    Day,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_columns_follow_file_naming() {
        assert_eq!(Channel::Amazon.price_column(), "precio_amazon");
        assert_eq!(Channel::HomeCenter.availability_column(), "disponibilidad_homecenter");
        assert_eq!(Channel::MercadoLibre.rating_column(), "calificacion_mercadolibre");
    }

    #[test]
    fn availability_label_lookup() {
        assert_eq!(Availability::from_label("Envío 24h"), Some(Availability::NextDayShipping));
        assert_eq!(Availability::from_label(" Agotado "), Some(Availability::SoldOut));
        assert_eq!(Availability::from_label("unknown"), None);
    }

    #[test]
    fn availability_index_matches_all_order() {
        for (i, a) in Availability::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let range = DateRange::new(d(1), d(10));
        assert!(range.contains(d(1)));
        assert!(range.contains(d(10)));
        assert!(!range.contains(d(11)));
    }
}
