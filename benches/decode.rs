use civfive::MapFile;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn physical_map(width: u32, height: u32) -> Vec<u8> {
    let terrain = b"TERRAIN_GRASS\0TERRAIN_PLAINS\0TERRAIN_OCEAN\0";
    let mut buf = Vec::new();
    buf.push(11u8);
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.push(0);
    buf.extend_from_slice(&[0u8; 4]);
    buf.extend_from_slice(&(terrain.len() as u32).to_le_bytes());
    for _ in 0..6 {
        buf.extend_from_slice(&0u32.to_le_bytes());
    }
    buf.extend_from_slice(terrain);
    buf.extend_from_slice(&10u32.to_le_bytes());
    buf.extend_from_slice(b"WORLDSIZE_");
    for i in 0..(width * height) {
        buf.extend_from_slice(&[(i % 3) as u8, 0, 0, 0, 0, 0, 0, 0]);
    }
    buf
}

pub fn map_benchmark(c: &mut Criterion) {
    let data = physical_map(128, 80);
    let mut group = c.benchmark_group("map");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("decode", |b| {
        b.iter(|| MapFile::from_slice(&data).unwrap())
    });
    group.finish();
}

criterion_group!(benches, map_benchmark);
criterion_main!(benches);
