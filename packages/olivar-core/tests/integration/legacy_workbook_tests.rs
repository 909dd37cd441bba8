//! Loading workbooks written by earlier releases.

use ntest::timeout;
use std::sync::Arc;
use tempfile::tempdir;

use olivar_core::persistence::xlsx::read_sheets;
use olivar_core::persistence::PersistenceManager;
use olivar_core::schema::{FINCA, GASTOS, LABORES};
use olivar_core::{farm_registry, RecordId, RecordRef, StoreError, Value, MAX_CELL_INTEGER};

use super::helpers::{config, header, open_session, write_workbook, Cell};

fn legacy_workbook(path: &std::path::Path) {
    write_workbook(
        path,
        &[
            (
                "Finca",
                vec![
                    header(&["ID Parcela", "Nombre", "Variedad", "Marco", "Hectáreas"]),
                    vec![
                        Cell::Number(1.0),
                        Cell::Text("Los Llanos"),
                        Cell::Text("Picual"),
                        Cell::Text("7x7"),
                        Cell::Number(12.5),
                    ],
                    vec![
                        Cell::Number(2.0),
                        Cell::Text("La Umbría"),
                        Cell::Text("Hojiblanca"),
                        Cell::Text("8x6"),
                        Cell::Text("4,5"),
                    ],
                ],
            ),
            (
                "Costes",
                vec![
                    header(&["ID", "Fecha", "Categoría", "Importe (€)", "Relacionado con"]),
                    vec![
                        Cell::Number(1.0),
                        Cell::Text("2024-02-01"),
                        Cell::Text("Gasoil"),
                        Cell::Text("12.50"),
                        Cell::Text("Los Llanos"),
                    ],
                    vec![
                        Cell::Number(2.0),
                        Cell::Text("05/02/2024"),
                        Cell::Text("Varios"),
                        Cell::Text("abc"),
                        Cell::Blank,
                    ],
                    vec![
                        Cell::Number(3.0),
                        Cell::Blank,
                        Cell::Text("Poda"),
                        Cell::Text("7"),
                        Cell::Text("La Umbría"),
                    ],
                ],
            ),
            (
                "Labores",
                vec![
                    header(&["ID", "Fecha", "Tipo", "Costo (€)", "Coste (€)"]),
                    vec![
                        Cell::Number(1.0),
                        Cell::Text("2023-12-01"),
                        Cell::Text("Poda"),
                        Cell::Number(90.0),
                        Cell::Blank,
                    ],
                    vec![
                        Cell::Number(2.0),
                        Cell::Text("2023-12-02"),
                        Cell::Text("Poda"),
                        Cell::Number(50.0),
                        Cell::Number(55.0),
                    ],
                ],
            ),
            ("Hoja1", vec![header(&["Notas"])]),
        ],
    );
}

#[timeout(5000)]
#[test]
fn test_legacy_finca_drops_obsolete_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    legacy_workbook(&path);

    let session = open_session(&path);
    let parcels = session.list(FINCA).unwrap();
    assert_eq!(parcels.len(), 2);
    for parcel in &parcels {
        assert_eq!(parcel.get("Marco"), None);
        assert_eq!(
            parcel.columns().collect::<Vec<_>>(),
            vec!["ID Parcela", "Nombre", "Variedad", "Hectáreas", "Riego", "Descripción"]
        );
    }
    assert_eq!(parcels[1].get("Hectáreas"), Some(&Value::Number(4.5)));
}

#[timeout(5000)]
#[test]
fn test_legacy_expense_sum_tolerates_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    legacy_workbook(&path);

    let session = open_session(&path);
    assert_eq!(session.sum(GASTOS, "Importe (€)").unwrap(), 19.5);

    let expenses = session.list(GASTOS).unwrap();
    assert_eq!(expenses[1].get("Importe (€)"), Some(&Value::Text("abc".into())));
    assert_eq!(
        expenses[1].get("Fecha"),
        Some(&Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 2, 5).unwrap()))
    );
    assert_eq!(
        expenses[2].get("Parcela"),
        Some(&Value::Text("La Umbría".into()))
    );
}

#[timeout(5000)]
#[test]
fn test_rename_keeps_existing_target_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    legacy_workbook(&path);

    let session = open_session(&path);
    let work = session.list(LABORES).unwrap();
    assert_eq!(work[0].get("Coste (€)"), Some(&Value::Number(90.0)));
    assert_eq!(work[1].get("Coste (€)"), Some(&Value::Number(55.0)));
    assert_eq!(work[0].get("Costo (€)"), None);
}

#[timeout(5000)]
#[test]
fn test_migrate_then_reload_is_stable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    legacy_workbook(&path);

    let persistence = PersistenceManager::new(&config(&path), Arc::new(farm_registry().unwrap()));
    let migrated = persistence.load().unwrap();
    persistence.save(&migrated).unwrap();
    let reloaded = persistence.load().unwrap();
    assert_eq!(reloaded, migrated);

    // The file now carries current sheet names and headers only.
    let sheets = read_sheets(&path).unwrap();
    let names: Vec<_> = sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Finca", "Labores", "Gastos", "Ingresos", "Inventario", "Rentabilidad"]
    );
    assert!(!sheets[0].header.iter().any(|column| column == "Marco"));
}

#[timeout(5000)]
#[test]
fn test_edit_after_migration_writes_current_shape() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    legacy_workbook(&path);

    let mut session = open_session(&path);
    session
        .update(FINCA, &RecordRef::id(2u64), &[("Riego", "Regadío".into())])
        .unwrap();
    let next = session.next_id(GASTOS).unwrap();

    let reopened = open_session(&path);
    assert_eq!(reopened.list(FINCA).unwrap(), session.list(FINCA).unwrap());
    assert_eq!(reopened.next_id(GASTOS).unwrap(), next);
    assert!(reopened.workbook().table("Costes").is_err());
}

#[timeout(5000)]
#[test]
fn test_parcel_codes_keep_their_prefix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    write_workbook(
        &path,
        &[(
            "Finca",
            vec![
                header(&["ID Parcela", "Nombre"]),
                vec![Cell::Text("ID7"), Cell::Text("Los Llanos")],
                vec![Cell::Text("ID8"), Cell::Text("La Umbría")],
            ],
        )],
    );

    let mut session = open_session(&path);
    let ids: Vec<_> = session
        .list(FINCA)
        .unwrap()
        .iter()
        .map(|parcel| parcel.get("ID Parcela").cloned().unwrap_or_default())
        .collect();
    assert_eq!(ids, vec![Value::Text("ID7".into()), Value::Text("ID8".into())]);
    assert_eq!(
        session.next_id(FINCA).unwrap(),
        Some(RecordId::prefixed("ID", 9))
    );

    let created = session.create(FINCA, &[("Nombre", "Cañada".into())]).unwrap();
    assert_eq!(created.get("ID Parcela"), Some(&Value::Text("ID9".into())));
    session
        .update(FINCA, &RecordRef::Id("id7".parse().unwrap()), &[("Riego", "Secano".into())])
        .unwrap();

    let reopened = open_session(&path);
    assert_eq!(reopened.list(FINCA).unwrap(), session.list(FINCA).unwrap());
}

#[timeout(5000)]
#[test]
fn test_ids_beyond_exact_cell_integers_are_not_repeated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    let beyond = (MAX_CELL_INTEGER + 1) as f64;
    write_workbook(
        &path,
        &[
            (
                "Finca",
                vec![
                    header(&["ID Parcela", "Nombre"]),
                    vec![Cell::Number(beyond), Cell::Text("Los Llanos")],
                ],
            ),
            (
                "Gastos",
                vec![
                    header(&["ID", "Categoría"]),
                    vec![Cell::Number(1.0), Cell::Text("Gasoil")],
                    vec![Cell::Number(beyond), Cell::Text("Poda")],
                ],
            ),
        ],
    );

    let mut session = open_session(&path);

    // Text identifiers hold the number exactly and keep counting.
    let parcel = session.create(FINCA, &[("Nombre", "La Umbría".into())]).unwrap();
    assert_eq!(
        parcel.get("ID Parcela"),
        Some(&Value::Text("9007199254740993".into()))
    );

    // Numeric cells at 2^53 are kept but skipped.
    let expense = session.create(GASTOS, &[("Categoría", "Abono".into())]).unwrap();
    assert_eq!(expense.get("ID"), Some(&Value::Number(2.0)));
    let expenses = session.list(GASTOS).unwrap();
    assert_eq!(expenses[1].get("ID"), Some(&Value::Number(beyond)));
}

#[timeout(5000)]
#[test]
fn test_exhausted_numeric_ids_fail_without_touching_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    write_workbook(
        &path,
        &[(
            "Gastos",
            vec![
                header(&["ID", "Categoría"]),
                vec![Cell::Number(MAX_CELL_INTEGER as f64), Cell::Text("Gasoil")],
            ],
        )],
    );
    let before = std::fs::read(&path).unwrap();

    let mut session = open_session(&path);
    assert!(matches!(
        session.next_id(GASTOS),
        Err(StoreError::IdentifiersExhausted { .. })
    ));
    assert!(matches!(
        session.create(GASTOS, &[("Categoría", "Poda".into())]),
        Err(StoreError::IdentifiersExhausted { .. })
    ));
    assert_eq!(session.list(GASTOS).unwrap().len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[timeout(5000)]
#[test]
fn test_early_1900_dates_survive_repeated_saves() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    let dates = ["1900-01-15", "1900-02-28", "2024-03-01"];

    let mut session = open_session(&path);
    for date in dates {
        session
            .create(LABORES, &[("Fecha", date.into()), ("Tipo", "Poda".into())])
            .unwrap();
    }

    for _ in 0..2 {
        session.reload().unwrap();
        session.save().unwrap();
    }
    let reopened = open_session(&path);
    let read: Vec<_> = reopened
        .list(LABORES)
        .unwrap()
        .iter()
        .map(|work| work.get("Fecha").map(ToString::to_string).unwrap_or_default())
        .collect();
    assert_eq!(read, dates);
}
