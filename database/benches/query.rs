use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use database::{
    database::database::Database,
    model::person::Person,
    service::{
        person::PersonService,
        search::{PageRequest, SearchCriteria},
    },
};
use std::sync::{mpsc::channel, Arc};
use threadpool::ThreadPool;

const SAMPLE_SIZE: u64 = 1_000;

const PERSON_COUNT: u32 = 10_000;

const POOL_SIZE: [usize; 4] = [1, 2, 3, 4];

const CITIES: [&str; 5] = ["NYC", "LA", "Oslo", "Lima", "Pune"];

fn populated_service() -> PersonService {
    let service = PersonService::new(Arc::new(Database::new_test()));

    for i in 0..PERSON_COUNT {
        let person = Person::new(&i.to_string(), &format!("Name{}", i), i % 90)
            .with_cities(&[CITIES[i as usize % CITIES.len()]]);

        service.save(person).expect("Should save distinct ids");
    }

    service
}

pub fn person_search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("person_search");
    let mut pool = ThreadPool::new(1);

    let service = Arc::new(populated_service());

    for size in POOL_SIZE.iter() {
        pool.set_num_threads(*size);

        group.throughput(Throughput::Elements(SAMPLE_SIZE));

        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            size,
            |b, &thread_count| {
                b.iter_with_large_drop(|| {
                    let (test_tx, test_rx) = channel::<i32>();

                    for _ in 0..thread_count {
                        let test_tx = test_tx.clone();
                        let service = service.clone();

                        pool.execute(move || {
                            for i in 0..SAMPLE_SIZE / thread_count as u64 {
                                let criteria = SearchCriteria::default()
                                    .set_name_prefix("name1")
                                    .set_age_range(20, 60)
                                    .set_city(CITIES[i as usize % CITIES.len()])
                                    .set_page(PageRequest::new(1, 20));

                                let _ = service.search(&criteria);
                            }

                            test_tx.send(1).expect("Should not timeout");
                        });
                    }

                    test_rx
                        .iter()
                        .take(thread_count)
                        .fold(0, |a: i32, b: i32| a + b);
                })
            },
        );
    }

    group.finish();
}

pub fn person_save_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("person_save");

    group.throughput(Throughput::Elements(SAMPLE_SIZE));

    group.bench_function("save", |b| {
        b.iter_with_large_drop(|| {
            let service = PersonService::new(Arc::new(Database::new_test()));

            for i in 0..SAMPLE_SIZE {
                let person = Person::new(&i.to_string(), "Test", 30).with_cities(&["NYC"]);

                let _ = service.save(person);
            }

            service
        })
    });

    group.finish();
}

criterion_group!(benches, person_search_benchmark, person_save_benchmark);
criterion_main!(benches);
