//! Built-in tables of the olive-farm workbook.

use crate::error::Result;

use super::column::Column;
use super::migration::MigrationRule;
use super::registry::{SchemaRegistry, TableSchema};

/// Parcels of the farm.
pub const FINCA: &str = "Finca";
/// Field work log.
pub const LABORES: &str = "Labores";
/// Expenses.
pub const GASTOS: &str = "Gastos";
/// Income.
pub const INGRESOS: &str = "Ingresos";
/// Stock of supplies.
pub const INVENTARIO: &str = "Inventario";
/// Per-parcel, per-season margins.
pub const RENTABILIDAD: &str = "Rentabilidad";

/// Builds the registry with every farm table, in sheet order.
pub fn farm_registry() -> Result<SchemaRegistry> {
    SchemaRegistry::new()
        .with(finca())?
        .with(labores())?
        .with(gastos())?
        .with(ingresos())?
        .with(inventario())?
        .with(rentabilidad())
}

fn finca() -> TableSchema {
    TableSchema::new(FINCA)
        // Free text: parcels may carry their own codes such as "ID7".
        .column(Column::text("ID Parcela"))
        .column(Column::text("Nombre"))
        .column(Column::text("Variedad"))
        .column(Column::number("Hectáreas"))
        .column(Column::choice("Riego", ["Secano", "Regadío"]))
        .column(Column::text("Descripción"))
        .identifier("ID Parcela")
        // Planting layout ("7x7") moved out of the parcel sheet.
        .migration(MigrationRule::drop("Marco"))
}

fn labores() -> TableSchema {
    TableSchema::new(LABORES)
        .column(Column::number("ID"))
        .column(Column::date("Fecha"))
        .column(Column::text("Parcela"))
        .column(Column::choice(
            "Tipo",
            [
                "Poda",
                "Abonado",
                "Tratamiento",
                "Riego",
                "Recolección",
                "Laboreo",
                "Otro",
            ],
        ))
        .column(Column::text("Descripción"))
        .column(Column::text("Operario"))
        .column(Column::number("Horas"))
        .column(Column::number("Coste (€)"))
        .identifier("ID")
        .migration(MigrationRule::rename("Costo (€)", "Coste (€)"))
}

fn gastos() -> TableSchema {
    TableSchema::new(GASTOS)
        .column(Column::number("ID"))
        .column(Column::date("Fecha"))
        .column(Column::text("Categoría"))
        .column(Column::text("Descripción"))
        .column(Column::number("Importe (€)"))
        .column(Column::text("Parcela"))
        .identifier("ID")
        .legacy_name("Costes")
        .migration(MigrationRule::rename("Relacionado con", "Parcela"))
}

fn ingresos() -> TableSchema {
    TableSchema::new(INGRESOS)
        .column(Column::number("ID"))
        .column(Column::date("Fecha"))
        .column(Column::text("Concepto"))
        .column(Column::text("Descripción"))
        .column(Column::number("Importe (€)"))
        .column(Column::text("Tipo"))
        .identifier("ID")
}

fn inventario() -> TableSchema {
    TableSchema::new(INVENTARIO)
        .column(Column::text("ID"))
        .column(Column::text("Producto"))
        .column(Column::number("Inicial"))
        .column(Column::number("Entrada"))
        .column(Column::number("Salida"))
        .column(Column::number("Stock"))
        .column(Column::text("Unidad"))
        .prefixed_identifier("ID", "P")
}

fn rentabilidad() -> TableSchema {
    TableSchema::new(RENTABILIDAD)
        .column(Column::number("ID"))
        .column(Column::text("Parcela"))
        .column(Column::text("Campaña"))
        .column(Column::number("Ingresos (€)"))
        .column(Column::number("Costes (€)"))
        .column(Column::number("Margen (€)"))
        .column(Column::number("Margen €/ha"))
        .identifier("ID")
}
