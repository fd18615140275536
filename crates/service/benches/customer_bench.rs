use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use service::customer::domain::CustomerInput;
use service::customer::mailer::mock::RecordingMailer;
use service::customer::repository::mock::MockCustomerRepository;
use service::customer::service::{hash_password, verify_password};
use service::customer::{CustomerConfig, CustomerService};

fn bench_password(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let hash = rt.block_on(hash_password("Benchmark1".into())).unwrap();

    c.bench_function("customer_password_hash", |b| {
        b.iter(|| rt.block_on(hash_password("Benchmark1".into())).unwrap());
    });
    c.bench_function("customer_password_verify", |b| {
        b.iter(|| assert!(verify_password("Benchmark1", &hash).unwrap()));
    });
}

fn bench_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let svc = CustomerService::new(
        Arc::new(MockCustomerRepository::default()),
        Arc::new(RecordingMailer::default()),
        CustomerConfig::default(),
    );
    let mut n = 0u64;

    c.bench_function("customer_create", |b| {
        b.iter(|| {
            n += 1;
            let input = CustomerInput {
                email: format!("bench{n}@example.com"),
                username: format!("bench{n}"),
                password: "Benchmark1".into(),
                ..Default::default()
            };
            rt.block_on(svc.create_customer(input)).unwrap();
        });
    });
}

criterion_group!(benches, bench_password, bench_create);
criterion_main!(benches);
