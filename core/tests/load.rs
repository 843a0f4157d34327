//! Engine load tests: caching, dropped rows and fatal errors.

use sales_metrics_core::{config::MetricsConfig, session::SalesSession, SalesError};
use std::path::PathBuf;
use std::sync::Arc;

const HEADER: &str = "producto\tcategoria\tfecha_venta\tprecio\tunidades_vendidas\tsatisfaccion_cliente\tprecio_homecenter\tprecio_amazon\tprecio_mercadolibre\tdisponibilidad_amazon\tcalificacion_amazon\n";

fn temp_file(name: &str, body: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sales-metrics-load-{}-{name}", std::process::id()));
    let mut bytes = HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(body);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn repeated_loads_hit_the_cache() {
    let path = temp_file(
        "cache.csv",
        b"Taladro\tHerramientas\t02/01/2024\t10000\t3\t4\t10000\t9000\t11000\tDisponible\t4.5\n",
    );
    let mut session = SalesSession::new(MetricsConfig::default());

    let first = session.load(&path).unwrap();
    let second = session.load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(session.parse_count(), 1);

    std::fs::remove_file(path).ok();
}

#[test]
fn dates_are_day_first_and_bad_ones_dropped() {
    let path = temp_file(
        "dates.csv",
        b"A\tHerramientas\t02/01/2024\t10000\t3\t4\t10000\t9000\t11000\tDisponible\t4.5\n\
          B\tHerramientas\t\t10000\t3\t4\t10000\t9000\t11000\tDisponible\t4.5\n\
          C\tHerramientas\t2024-02-10\t10000\t3\t4\t10000\t9000\t11000\tAgotado\t3.9\n",
    );
    let mut session = SalesSession::new(MetricsConfig::default());
    let table = session.load(&path).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.dropped_rows, 1);
    assert_eq!(table.records[0].day_key, "2024-01-02");
    assert_eq!(table.records[1].month_key, "2024-02");

    std::fs::remove_file(path).ok();
}

#[test]
fn latin1_text_is_decoded() {
    let path = temp_file(
        "latin1.csv",
        b"Cer\xe1mica\tPisos y ba\xf1os\t02/01/2024\t10000\t3\t4\t10000\t9000\t11000\tEnv\xedo 24h\t4.5\n",
    );
    let mut session = SalesSession::new(MetricsConfig::default());
    let table = session.load(&path).unwrap();
    let rec = &table.records[0];
    assert_eq!(rec.product, "Cerámica");
    assert_eq!(rec.category, "Pisos y baños");
    assert!(rec.channels[1].availability.is_some());

    std::fs::remove_file(path).ok();
}

#[test]
fn missing_file_is_fatal() {
    let mut session = SalesSession::new(MetricsConfig::default());
    let err = session.load(&PathBuf::from("/nonexistent/sales.csv")).unwrap_err();
    assert!(matches!(err, SalesError::Other(_)), "got {err}");
    assert_eq!(session.parse_count(), 0);
}

#[test]
fn missing_column_is_fatal() {
    let path = std::env::temp_dir().join(format!("sales-metrics-load-{}-nocol.csv", std::process::id()));
    std::fs::write(&path, "producto\tfecha_venta\nA\t01/01/2024\n").unwrap();
    let mut session = SalesSession::new(MetricsConfig::default());
    let err = session.load(&path).unwrap_err();
    assert!(matches!(err, SalesError::MissingColumn { .. }), "got {err}");
    std::fs::remove_file(path).ok();
}

#[test]
fn no_valid_dates_is_fatal() {
    let path = temp_file(
        "nodates.csv",
        b"A\tHerramientas\tsometime\t10000\t3\t4\t10000\t9000\t11000\tDisponible\t4.5\n",
    );
    let mut session = SalesSession::new(MetricsConfig::default());
    let err = session.load(&path).unwrap_err();
    assert!(matches!(err, SalesError::NoValidDates { .. }), "got {err}");
    std::fs::remove_file(path).ok();
}
