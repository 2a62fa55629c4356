//! Canned instrument configurations and datasets
//!
//! The underway pCO2 scenario models a typical ship system: a CO2 analyser
//! logging once a minute (the core kind), cycling through two gas standards
//! between seawater runs; a sea surface temperature sensor logging
//! continuously; two equilibrator temperature probes averaged into one
//! parent kind; and a pressure sensor that only wakes for short bursts.

use chrono::{DateTime, Duration, Utc};

use seaflux_core::config::{InstrumentConfig, SensorKind, Strategy, Variable};
use seaflux_core::index::{Measurement, MeasurementId};
use seaflux_core::memory::{MemoryCalibration, MemoryStore};
use seaflux_core::traits::CalibrationSet;
use seaflux_core::values::ColumnId;
use seaflux_core::QualityFlag;

use super::base_time;
use super::generators::{ReadingGenerator, DATASET};

/// Nominal concentration of the low standard
pub const STD_LOW: f64 = 250.0;
/// Nominal concentration of the high standard
pub const STD_HIGH: f64 = 450.0;

/// Instrument definition for the underway scenario
pub fn underway_config() -> InstrumentConfig {
    InstrumentConfig::new("underway-1")
        .with_kind(SensorKind::new("xco2").requiring_calibration())
        .with_kind(SensorKind::new("sst"))
        .with_kind(SensorKind::new("eqt").with_children(["eqt_a", "eqt_b"]))
        .with_kind(SensorKind::new("eqt_a"))
        .with_kind(SensorKind::new("eqt_b"))
        .with_kind(SensorKind::new("eq_pressure"))
        .with_kind(SensorKind::new("gauge_pressure"))
        .with_kind(SensorKind::new("ambient_pressure"))
        .with_column(ColumnId(1), "xco2")
        .with_column(ColumnId(2), "sst")
        .with_column(ColumnId(3), "eqt_a")
        .with_column(ColumnId(4), "eqt_b")
        .with_column(ColumnId(5), "gauge_pressure")
        .with_column(ColumnId(6), "ambient_pressure")
        .with_variable(
            Variable::new("underway_pco2", "xco2")
                .requiring("sst")
                .requiring("eqt")
                .requiring("eq_pressure")
                .with_strategy(
                    "eq_pressure",
                    Strategy::Summation {
                        left: "gauge_pressure".into(),
                        right: "ambient_pressure".into(),
                    },
                )
                .for_run_type("SW"),
        )
}

/// Calibration sets deployed for the scenario
pub fn underway_calibration() -> MemoryCalibration {
    MemoryCalibration::new().with_set(
        "underway-1",
        base_time() - Duration::days(30),
        CalibrationSet::new()
            .with_target("STD_LOW", STD_LOW)
            .with_target("STD_HIGH", STD_HIGH),
    )
}

fn minute(m: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(m)
}

/// Run schedule, one measurement per minute:
/// minutes 0-2 STD_LOW, 3-5 STD_HIGH, 6-15 SW, 16-18 STD_LOW, 19-21 STD_HIGH
pub fn run_type_at(m: i64) -> &'static str {
    match m {
        0..=2 | 16..=18 => "STD_LOW",
        3..=5 | 19..=21 => "STD_HIGH",
        _ => "SW",
    }
}

/// Analyser drift: standards read high by 2 ppm at the start, 4 ppm at the end
pub fn drift_at(m: i64) -> f64 {
    2.0 + 2.0 * m as f64 / 21.0
}

/// Store loaded with the underway scenario's readings and measurements
pub fn underway_store() -> MemoryStore {
    let mut xco2 = ReadingGenerator::new(1, 1_000);
    let mut sst = ReadingGenerator::new(2, 2_000);
    let mut eqt_a = ReadingGenerator::new(3, 3_000);
    let mut eqt_b = ReadingGenerator::new(4, 4_000);
    let mut gauge = ReadingGenerator::new(5, 5_000);
    let mut ambient = ReadingGenerator::new(6, 6_000);

    let mut points = Vec::new();
    let mut measurements = Vec::new();

    for m in 0..22 {
        let nominal = match run_type_at(m) {
            "STD_LOW" => STD_LOW,
            "STD_HIGH" => STD_HIGH,
            _ => 380.0,
        };
        points.push(xco2.reading(minute(m), nominal + drift_at(m), QualityFlag::Good));
        measurements.push(Measurement::new(MeasurementId(m as u64), minute(m), run_type_at(m)));
    }

    // SST every 30 seconds, offset from the analyser clock
    for i in 0..44 {
        let time = base_time() + Duration::seconds(15 + 30 * i);
        points.push(sst.reading(time, 15.0 + 0.01 * i as f64, QualityFlag::Good));
    }

    // Two equilibrator probes, one slightly warmer
    points.extend(eqt_a.continuous(base_time(), 60, &[15.5; 22]));
    points.extend(eqt_b.continuous(base_time(), 60, &[15.7; 22]));

    // Pressure sensors wake every 10 minutes for a 3-reading burst
    points.extend(gauge.bursts(base_time(), 3, 3, 10, 600, 2.0));
    points.extend(ambient.continuous(base_time(), 60, &[1013.0; 22]));

    MemoryStore::new()
        .with_points(DATASET, points)
        .with_measurements(DATASET, measurements)
}
