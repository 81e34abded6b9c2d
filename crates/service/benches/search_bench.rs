use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::context::CallContext;
use service::ids::SequentialIdGenerator;
use service::storage::MemoryMapStore;
use service::tickets::{NewTicketInput, Ticket, TicketService};

fn bench_search(c: &mut Criterion) {
    let store = Arc::new(MemoryMapStore::<String, Ticket>::new());
    let svc = TicketService::new(store, Arc::new(SequentialIdGenerator::default()));

    // populate outside of the measured loop
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ctx = CallContext::at_now("bench");
    for i in 0..1_000 {
        let input = NewTicketInput {
            title: format!("Ticket {i}"),
            description: if i % 10 == 0 { "intermittent Bug in parser".into() } else { "routine work".into() },
            priority: "medium".into(),
            assigned_to: "dev".into(),
            due_date: "2025-01-01".into(),
            ..Default::default()
        };
        rt.block_on(svc.create(&ctx, input)).unwrap();
    }

    c.bench_function("ticket_search_1k", |b| {
        b.iter(|| {
            let found = rt.block_on(svc.search("bug")).unwrap();
            assert_eq!(found.len(), 100);
        });
    });

    c.bench_function("ticket_page_1k", |b| {
        b.iter(|| rt.block_on(svc.list_page(service::pagination::Page::new(500, 50))).unwrap());
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
