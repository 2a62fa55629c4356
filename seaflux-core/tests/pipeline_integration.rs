//! Integration tests for one-pass dataset processing
//!
//! Runs the underway pCO2 scenario through `process_dataset` against the
//! in-memory store and checks what ends up persisted.

#![cfg(test)]

mod common;

use seaflux_core::index::MeasurementId;
use seaflux_core::values::RawPointId;
use seaflux_core::{process_dataset, FlagUpdate, QualityFlag, ResolveError};

use common::generators::DATASET;
use common::scenarios::{underway_calibration, underway_config, underway_store};
use common::{assert_close, assert_has_value};

#[test]
fn test_underway_dataset_resolves_every_seawater_measurement() {
    let config = underway_config();
    let mut store = underway_store();

    let outcome = process_dataset(
        &config,
        "underway_pco2",
        DATASET,
        &mut store,
        &underway_calibration(),
    )
    .unwrap();

    // Minutes 6..=15 are seawater, four required kinds each
    assert!(outcome.is_complete(), "{:?}", outcome.failures);
    assert_eq!(outcome.values.len(), 40);
    assert_eq!(store.persisted_values(DATASET).len(), 40);

    for m in 6..=15u64 {
        let id = MeasurementId(m);

        // Drift is linear in time and identical for both standards, so the
        // correction recovers the true concentration
        let xco2 = outcome.value(id, &"xco2".into()).unwrap();
        assert_has_value(xco2);
        assert_close(xco2.calculated_value(), 380.0, 1e-9);
        assert_eq!(xco2.supporting().len(), 12);

        // SST logs every 30 s, 15 s off the analyser clock
        let sst = outcome.value(id, &"sst".into()).unwrap();
        assert_close(sst.calculated_value(), 15.0 + 0.01 * (2.0 * m as f64 - 0.5), 1e-9);
        assert_eq!(sst.member_count(), 2);

        let eqt = outcome.value(id, &"eqt".into()).unwrap();
        assert_close(eqt.calculated_value(), 15.6, 1e-9);
        assert_eq!(eqt.member_count(), 2);

        let pressure = outcome.value(id, &"eq_pressure".into()).unwrap();
        assert_has_value(pressure);
        assert!(pressure.calculated_value() > 1015.0 && pressure.calculated_value() < 1017.0);
    }

    // Standards are not seawater measurements
    assert!(outcome.value(MeasurementId(0), &"xco2".into()).is_none());
}

#[test]
fn test_bursty_pressure_interpolates_between_groups() {
    let config = underway_config();
    let mut store = underway_store();
    let outcome = process_dataset(&config, "underway_pco2", DATASET, &mut store, &underway_calibration())
        .unwrap();

    // Gauge bursts centred on 10 s (2.0) and 610 s (3.0); measurement at 360 s
    let pressure = outcome.value(MeasurementId(6), &"eq_pressure".into()).unwrap();
    assert_close(pressure.calculated_value(), 1013.0 + 2.0 + 350.0 / 600.0, 1e-9);
    assert_eq!(pressure.member_count(), 3 + 3 + 1);
}

#[test]
fn test_pending_flag_updates_are_applied_and_persisted() {
    let config = underway_config();
    // xco2 reading for minute 8 is id 1008
    let update = FlagUpdate::new(RawPointId(1008), QualityFlag::Flushing, "flushing");
    let mut store = underway_store().with_flag_updates(DATASET, vec![update.clone()]);

    let outcome = process_dataset(&config, "underway_pco2", DATASET, &mut store, &underway_calibration())
        .unwrap();

    assert_eq!(store.persisted_flags(DATASET), &[update][..]);
    let xco2 = outcome.value(MeasurementId(8), &"xco2".into()).unwrap();
    assert!(!xco2.has_value());
    assert_eq!(xco2.member_count(), 0);
}

#[test]
fn test_unknown_flag_update_stops_processing() {
    let config = underway_config();
    let mut store = underway_store().with_flag_updates(
        DATASET,
        vec![FlagUpdate::new(RawPointId(99_999), QualityFlag::Bad, "")],
    );

    let result = process_dataset(&config, "underway_pco2", DATASET, &mut store, &underway_calibration());
    assert_eq!(result, Err(ResolveError::UnknownRawPoint(RawPointId(99_999))));
    assert!(store.persisted_values(DATASET).is_empty());
}

#[test]
fn test_unknown_variable_is_rejected() {
    let config = underway_config();
    let mut store = underway_store();
    let result = process_dataset(&config, "salinity", DATASET, &mut store, &underway_calibration());
    assert!(matches!(result, Err(ResolveError::UnknownVariable(_))));
}
