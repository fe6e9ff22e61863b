//! # Particle Stream Benchmark
//!
//! Measures pull throughput of the stream adapter for a typical shading
//! channel set (position, velocity, color, density).

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use plume_core::{
    AttributeInfo, AttributeType, AttributeValues, ChannelMappingTable, ParticleSource,
    ParticleStreamAdapter, PointAttributeSource,
};

struct SyntheticCloud {
    count: usize,
}

impl PointAttributeSource for SyntheticCloud {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn point_count(&self) -> usize {
        self.count
    }

    fn attributes(&self) -> Vec<AttributeInfo> {
        vec![
            AttributeInfo::per_point("PointPosition", AttributeType::Vec3),
            AttributeInfo::per_point("PointVelocity", AttributeType::Vec3),
            AttributeInfo::per_point("Color", AttributeType::Color4),
            AttributeInfo::per_point("Density", AttributeType::Float32),
        ]
    }

    fn values(&self, attribute: &str) -> Option<AttributeValues> {
        let n = self.count;
        match attribute {
            "PointPosition" | "PointVelocity" => {
                Some(AttributeValues::Vec3((0..n).map(|i| [i as f32, 0.0, 1.0]).collect()))
            }
            "Color" => Some(AttributeValues::Color4(vec![[0.5, 0.5, 0.5, 1.0]; n])),
            "Density" => Some(AttributeValues::Float32(vec![1.0; n])),
            _ => None,
        }
    }
}

fn bench_pull(c: &mut Criterion) {
    let mut group = c.benchmark_group("particle_stream_pull");

    for count in [10_000usize, 100_000, 1_000_000] {
        let cloud = SyntheticCloud { count };
        let mut stream = ParticleStreamAdapter::from_source(&cloud, ChannelMappingTable::global());
        let layout = stream.packed_layout();
        let mut record = vec![0u8; layout.record_size()];

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                stream.close();
                while stream.next_particle(&layout, &mut record) {
                    black_box(&record);
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pull);
criterion_main!(benches);
