//! Identifier allocation properties under random create/delete sequences.

use std::collections::HashSet;

use proptest::prelude::*;

use olivar_core::schema::{FINCA, INVENTARIO};
use olivar_core::{farm_registry, RecordId, RecordRef, Table, Value};

#[derive(Debug, Clone)]
enum Op {
    Create,
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Create),
        1 => any::<usize>().prop_map(Op::Delete),
    ]
}

fn table(name: &str) -> Table {
    let registry = farm_registry().unwrap();
    Table::new(registry.current_schema(name).unwrap().clone())
}

fn ids(table: &Table, column: &str) -> Vec<RecordId> {
    table
        .records()
        .iter()
        .map(|record| record.get(column).unwrap().to_string().parse().unwrap())
        .collect()
}

proptest! {
    #[test]
    fn prop_created_ids_are_unique_and_above_existing(ops in prop::collection::vec(op(), 1..60)) {
        for (name, column) in [(FINCA, "ID Parcela"), (INVENTARIO, "ID")] {
            let mut table = table(name);
            let mut previous: Option<u64> = None;

            for op in &ops {
                match op {
                    Op::Create => {
                        let max_before = ids(&table, column).iter().map(RecordId::number).max();
                        let announced = table.next_id().unwrap();
                        let record = table.create(&[("Stock", Value::Number(1.0))]).unwrap();
                        let id: RecordId = record.get(column).unwrap().to_string().parse().unwrap();

                        prop_assert_eq!(Some(id.clone()), announced);
                        if let Some(max) = max_before {
                            prop_assert!(id.number() > max);
                        }
                        if let Some(previous) = previous {
                            prop_assert!(id.number() > previous);
                        }
                        previous = Some(id.number());
                    }
                    Op::Delete(selector) => {
                        if !table.is_empty() {
                            let index = selector % table.len();
                            table.delete(&RecordRef::position(index)).unwrap();
                        }
                        previous = None;
                    }
                }

                let current = ids(&table, column);
                let unique: HashSet<_> = current.iter().cloned().collect();
                prop_assert_eq!(unique.len(), current.len());
            }
        }
    }

    #[test]
    fn prop_next_id_is_idempotent(creates in 0usize..20) {
        let mut table = table(FINCA);
        for _ in 0..creates {
            table.create(&[]).unwrap();
        }
        prop_assert_eq!(table.next_id().unwrap(), table.next_id().unwrap());
        prop_assert_eq!(table.next_id().unwrap().map(|id| id.number()), Some(creates as u64 + 1));
    }
}
