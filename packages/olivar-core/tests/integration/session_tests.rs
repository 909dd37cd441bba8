//! Session behavior over a real workbook file.

use ntest::timeout;
use std::fs;
use tempfile::tempdir;

use olivar_core::schema::{FINCA, GASTOS, INVENTARIO, LABORES, RENTABILIDAD};
use olivar_core::{RecordId, RecordRef, StoreError, Value};

use super::helpers::open_session;

/// Fresh file: every table is empty and the first parcel gets identifier 1.
#[timeout(5000)]
#[test]
fn test_first_parcel_on_new_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("finca_olivar_datos.xlsx");

    let mut session = open_session(&path);
    for table in session.workbook().tables() {
        assert!(table.is_empty(), "table '{}' not empty", table.name());
    }

    session
        .create(
            FINCA,
            &[
                ("Nombre", "Los Llanos".into()),
                ("Variedad", "Picual".into()),
                ("Hectáreas", 12.5.into()),
            ],
        )
        .unwrap();

    let parcels = session.list(FINCA).unwrap();
    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].get("ID Parcela"), Some(&Value::Text("1".into())));
}

#[timeout(5000)]
#[test]
fn test_delete_removes_exactly_one_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");
    let mut session = open_session(&path);

    for concept in ["Gasoil", "Poda", "Abono"] {
        session
            .create(GASTOS, &[("Categoría", concept.into()), ("Importe (€)", 10.0.into())])
            .unwrap();
    }

    let removed = session.delete(GASTOS, &RecordRef::id(2u64)).unwrap();
    assert_eq!(removed.get("Categoría"), Some(&Value::Text("Poda".into())));

    let remaining = session.list(GASTOS).unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|record| !record.matches("ID", "2")));

    // The deletion is on disk, not only in memory.
    let reopened = open_session(&path);
    assert_eq!(reopened.list(GASTOS).unwrap(), remaining);

    assert!(matches!(
        session.delete(GASTOS, &RecordRef::id(2u64)),
        Err(StoreError::NotFound { .. })
    ));
}

#[timeout(5000)]
#[test]
fn test_update_changes_only_listed_field() {
    let dir = tempdir().unwrap();
    let mut session = open_session(&dir.path().join("datos.xlsx"));

    let created = session
        .create(
            LABORES,
            &[
                ("Fecha", "15/01/2024".into()),
                ("Tipo", "poda".into()),
                ("Operario", "Antonio".into()),
                ("Horas", 6.0.into()),
            ],
        )
        .unwrap();
    let updated = session
        .update(LABORES, &RecordRef::id(1u64), &[("Horas", "7,5".into())])
        .unwrap();

    assert_eq!(updated.get("Horas"), Some(&Value::Number(7.5)));
    for column in ["ID", "Fecha", "Tipo", "Operario", "Parcela"] {
        assert_eq!(updated.get(column), created.get(column), "column {}", column);
    }
    assert_eq!(session.list(LABORES).unwrap(), vec![updated]);
}

#[timeout(5000)]
#[test]
fn test_sum_with_filter() {
    let dir = tempdir().unwrap();
    let mut session = open_session(&dir.path().join("datos.xlsx"));

    for (parcel, amount) in [("Los Llanos", 100.0), ("La Umbría", 40.0), ("los llanos", 25.5)] {
        session
            .create(GASTOS, &[("Parcela", parcel.into()), ("Importe (€)", amount.into())])
            .unwrap();
    }

    assert_eq!(session.sum(GASTOS, "Importe (€)").unwrap(), 165.5);
    let llanos = session
        .sum_where(GASTOS, "Importe (€)", |record| record.matches("Parcela", "Los Llanos"))
        .unwrap();
    assert_eq!(llanos, 125.5);
    assert_eq!(session.sum(RENTABILIDAD, "Margen (€)").unwrap(), 0.0);
}

#[timeout(5000)]
#[test]
fn test_prefixed_inventory_ids_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");

    let mut session = open_session(&path);
    session.create(INVENTARIO, &[("Producto", "Cobre".into())]).unwrap();
    session.create(INVENTARIO, &[("Producto", "Urea".into())]).unwrap();

    let reopened = open_session(&path);
    assert_eq!(
        reopened.next_id(INVENTARIO).unwrap(),
        Some(RecordId::prefixed("P", 3))
    );
}

#[timeout(5000)]
#[test]
fn test_failed_save_rolls_back_and_keeps_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("datos.xlsx");

    let mut session = open_session(&path);
    session.create(FINCA, &[("Nombre", "Los Llanos".into())]).unwrap();
    let on_disk = fs::read(&path).unwrap();

    // Swap the workbook for a directory so the rename cannot replace it.
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("keep"), b"x").unwrap();

    let err = session
        .create(FINCA, &[("Nombre", "La Umbría".into())])
        .unwrap_err();
    assert!(err.is_persistence_failure());
    assert_eq!(session.list(FINCA).unwrap().len(), 1);
    assert_eq!(session.next_id(FINCA).unwrap(), Some(RecordId::numeric(2)));

    // Restore the file; the session keeps working against it.
    fs::remove_dir_all(&path).unwrap();
    fs::write(&path, &on_disk).unwrap();
    session.create(FINCA, &[("Nombre", "La Umbría".into())]).unwrap();
    assert_eq!(open_session(&path).list(FINCA).unwrap().len(), 2);
}

#[timeout(5000)]
#[test]
fn test_records_serialize_in_column_order() {
    let dir = tempdir().unwrap();
    let mut session = open_session(&dir.path().join("datos.xlsx"));
    let record = session
        .create(GASTOS, &[("Fecha", "2024-03-01".into()), ("Importe (€)", 12.5.into())])
        .unwrap();

    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(
        json,
        r#"{"ID":1.0,"Fecha":"2024-03-01","Categoría":null,"Descripción":null,"Importe (€)":12.5,"Parcela":null}"#
    );
}
