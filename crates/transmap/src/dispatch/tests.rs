//! Unit tests for the dispatch table.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use rstest::{fixture, rstest};

use super::*;

struct Invoice;
struct InvoiceDto;
struct Customer;
struct CustomerDto;
struct InvoiceHandler;
struct CustomerHandler;

fn descriptor<A: 'static, B: 'static, H: 'static>(lifetime: Lifetime) -> HandlerDescriptor {
    HandlerDescriptor::new(DispatchKey::of::<A, B>(), TypeKey::of::<H>(), lifetime)
}

#[fixture]
fn table() -> DispatchTable {
    let handlers = [
        descriptor::<Invoice, InvoiceDto, InvoiceHandler>(Lifetime::Singleton),
        descriptor::<Customer, CustomerDto, CustomerHandler>(Lifetime::Scoped),
    ]
    .into_iter()
    .map(|entry| (entry.key(), entry))
    .collect::<HashMap<_, _>>();
    DispatchTable::from_descriptors(handlers)
}

#[test]
fn default_table_is_empty() {
    let table = DispatchTable::default();
    assert!(table.is_empty());
    assert_eq!(table.len(), 0);
}

#[rstest]
fn lookup_returns_registered_handler(table: DispatchTable) {
    let found = table
        .lookup_pair::<Invoice, InvoiceDto>()
        .expect("invoice handler");
    assert_eq!(found.handler(), TypeKey::of::<InvoiceHandler>());
    assert_eq!(found.source(), TypeKey::of::<Invoice>());
    assert_eq!(found.destination(), TypeKey::of::<InvoiceDto>());
    assert_eq!(found.lifetime(), Lifetime::Singleton);
}

#[rstest]
#[case::reversed(DispatchKey::of::<InvoiceDto, Invoice>())]
#[case::crossed(DispatchKey::of::<Invoice, CustomerDto>())]
fn lookup_misses_unregistered_pairs(table: DispatchTable, #[case] key: DispatchKey) {
    assert!(table.lookup(&key).is_none());
    assert!(!table.contains(&key));
}

#[rstest]
fn descriptors_cover_every_pair(table: DispatchTable) {
    assert_eq!(table.len(), 2);
    let handlers: Vec<TypeKey> = table.descriptors().map(HandlerDescriptor::handler).collect();
    assert!(handlers.contains(&TypeKey::of::<InvoiceHandler>()));
    assert!(handlers.contains(&TypeKey::of::<CustomerHandler>()));
}

#[rstest]
fn concurrent_readers_see_the_same_entries(table: DispatchTable) {
    let shared = Arc::new(table);
    thread::scope(|threads| {
        for _ in 0..4 {
            let reader = Arc::clone(&shared);
            threads.spawn(move || {
                for _ in 0..100 {
                    assert!(reader.lookup_pair::<Customer, CustomerDto>().is_some());
                    assert!(reader.lookup_pair::<CustomerDto, Customer>().is_none());
                }
            });
        }
    });
}
