use criterion::{criterion_group, criterion_main, Criterion};
use db2_engine::client::{BindSlot, Column, ColumnDescriptor, TypeCode};
use db2_engine::protocol::{build_row, column_value};
use std::hint::black_box;

fn mixed_columns() -> Vec<Column> {
    let specs = [
        ("id", TypeCode::Integer, "4242"),
        ("qty", TypeCode::SmallInt, "17"),
        ("price", TypeCode::Decimal, "19.25"),
        ("ratio", TypeCode::Numeric, "0.125"),
        ("name", TypeCode::Varchar, "heart of gold"),
        ("code", TypeCode::Char, "HOG-1"),
        ("seen", TypeCode::Timestamp, "2024-01-01 00:00:00.000000"),
        ("note", TypeCode::Varchar, "mostly harmless"),
    ];
    specs
        .iter()
        .map(|(name, type_code, text)| {
            let descriptor = ColumnDescriptor::new(*name, *type_code, 64, 0);
            let mut slot = BindSlot::new(65);
            slot.write(Some(text.as_bytes()));
            Column { descriptor, slot }
        })
        .collect()
}

fn bench_conversion(c: &mut Criterion) {
    let columns = mixed_columns();

    c.bench_function("column_value_mixed", |b| {
        b.iter(|| {
            for column in &columns {
                black_box(column_value(column));
            }
        })
    });

    c.bench_function("build_row_indexed", |b| {
        b.iter(|| black_box(build_row(&columns, false)))
    });

    c.bench_function("build_row_named", |b| {
        b.iter(|| black_box(build_row(&columns, true)))
    });
}

criterion_group!(benches, bench_conversion);
criterion_main!(benches);
