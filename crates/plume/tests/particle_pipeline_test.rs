//! Integration test for the particle pipeline: host attributes through a
//! full render session into engine records.

use plume::core::{AttributeType, AxisAngle, StorageType};
use plume::session::testing::{CollectingTileSink, MemoryPointCloud, MemoryScene, RecordingEngine};
use plume::{
    AttributeInfo, AttributeValues, ChannelDescriptor, ParticleSource, ParticleStreamAdapter,
    RecordLayout, RenderOutcome, RenderSession, RenderSettings, SceneLock,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const COUNT: usize = 257;

struct Columns {
    bools: Vec<bool>,
    ints: Vec<i32>,
    floats: Vec<f32>,
    vec2: Vec<[f32; 2]>,
    vec3: Vec<[f32; 3]>,
    vec4: Vec<[f32; 4]>,
    quats: Vec<[f32; 4]>,
    colors: Vec<[f32; 4]>,
    rotations: Vec<AxisAngle>,
}

fn random_columns(seed: u64) -> Columns {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut f = move || rng.gen_range(-1000.0f32..1000.0);
    let mut columns = Columns {
        bools: Vec::new(),
        ints: Vec::new(),
        floats: Vec::new(),
        vec2: Vec::new(),
        vec3: Vec::new(),
        vec4: Vec::new(),
        quats: Vec::new(),
        colors: Vec::new(),
        rotations: Vec::new(),
    };
    for i in 0..COUNT {
        columns.bools.push(i % 3 == 0);
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        columns.ints.push((i as i32).wrapping_mul(-7919));
        columns.floats.push(f());
        columns.vec2.push([f(), f()]);
        columns.vec3.push([f(), f(), f()]);
        columns.vec4.push([f(), f(), f(), f()]);
        columns.quats.push([f(), f(), f(), f()]);
        columns.colors.push([f(), f(), f(), f()]);
        columns.rotations.push(AxisAngle {
            axis: [f(), f(), f()],
            angle: f() / 100.0,
        });
    }
    columns
}

fn cloud(columns: &Columns) -> MemoryPointCloud {
    MemoryPointCloud::new("everything", COUNT)
        .with("Absorption", AttributeValues::Bool(columns.bools.clone()))
        .with("Emission", AttributeValues::Int32(columns.ints.clone()))
        .with("Density", AttributeValues::Float32(columns.floats.clone()))
        .with_info(
            AttributeInfo::per_point("Lighting", AttributeType::Matrix4),
            AttributeValues::Float32(columns.floats.clone()),
        )
        .with("Tangent", AttributeValues::Vec2(columns.vec2.clone()))
        .with("PointPosition", AttributeValues::Vec3(columns.vec3.clone()))
        .with("PointVelocity", AttributeValues::Vec4(columns.vec4.clone()))
        .with("Eccentricity", AttributeValues::Quat(columns.quats.clone()))
        .with("Color", AttributeValues::Color4(columns.colors.clone()))
        .with("PointNormal", AttributeValues::Rotation(columns.rotations.clone()))
}

fn field<'a>(record: &'a [u8], channels: &[ChannelDescriptor], name: &str) -> &'a [u8] {
    let mut offset = 0;
    for channel in channels {
        if channel.name() == name {
            return &record[offset..offset + channel.byte_width()];
        }
        offset += channel.byte_width();
    }
    panic!("channel {name} not in record");
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() <= e.abs() * f32::EPSILON * 4.0 + 1e-6, "{a} != {e}");
    }
}

#[test]
fn test_every_attribute_type_round_trips_through_a_render() {
    let columns = random_columns(0x5eed);
    let scene = SceneLock::new(MemoryScene::with_camera().cloud(cloud(&columns)));
    let mut session = RenderSession::new(RecordingEngine::new());
    session.init();

    let outcome = session.process(
        &scene,
        &RenderSettings::default(),
        1,
        &mut CollectingTileSink::new(),
    );
    assert_eq!(outcome, RenderOutcome::Ok);

    let engine = session.engine();
    assert_eq!(engine.sources.len(), 1);
    let channels = &engine.sources[0].channels;
    let names: Vec<_> = channels.iter().map(ChannelDescriptor::name).collect();
    assert_eq!(
        names,
        vec![
            "Absorption",
            "Emission",
            "Density",
            "Tangent",
            "Position",
            "Velocity",
            "Eccentricity",
            "Color",
            "Normal",
        ]
    );
    assert_eq!(channels[0].storage(), StorageType::UInt8);
    assert_eq!(channels[7].arity(), 3);

    let records = &engine.pulled[0];
    assert_eq!(records.len(), COUNT);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(field(record, channels, "Absorption"), &[u8::from(columns.bools[i])]);
        assert_eq!(
            field(record, channels, "Emission"),
            &columns.ints[i].to_ne_bytes()
        );
        assert_eq!(
            field(record, channels, "Density"),
            &columns.floats[i].to_ne_bytes()
        );
        assert_close(&floats(field(record, channels, "Tangent")), &columns.vec2[i]);
        assert_close(&floats(field(record, channels, "Position")), &columns.vec3[i]);
        assert_close(&floats(field(record, channels, "Velocity")), &columns.vec4[i]);
        assert_close(&floats(field(record, channels, "Eccentricity")), &columns.quats[i]);
        assert_close(&floats(field(record, channels, "Color")), &columns.colors[i][..3]);
        assert_close(
            &floats(field(record, channels, "Normal")),
            &columns.rotations[i].to_quat_xyzw(),
        );
    }
}

#[test]
fn test_pull_count_matches_particle_count() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let count = rng.gen_range(1..200usize);
        let mut stream = ParticleStreamAdapter::from_source(
            &MemoryPointCloud::line("line", count),
            plume::ChannelMappingTable::global(),
        );
        assert_eq!(stream.particle_count().unwrap(), count as u64);

        let layout = stream.packed_layout();
        let mut record = vec![0u8; layout.record_size()];
        let mut pulled = 0;
        while stream.next_particle(&layout, &mut record) {
            pulled += 1;
        }
        assert_eq!(pulled, count);
        assert!(!stream.next_particle(&layout, &mut record));
    }
}

#[test]
fn test_close_replays_identical_records_with_padded_layout() {
    let columns = random_columns(99);
    let source = cloud(&columns);
    let mut stream =
        ParticleStreamAdapter::from_source(&source, plume::ChannelMappingTable::global());

    // engine layout with 4 bytes of padding in front of every channel
    let channels = stream.channels().to_vec();
    let mut offsets = Vec::new();
    let mut cursor = 0;
    for channel in &channels {
        cursor += 4;
        offsets.push(cursor);
        cursor += channel.byte_width();
    }
    let layout = RecordLayout::new(&channels, offsets, cursor).unwrap();

    let mut record = vec![0u8; layout.record_size()];
    let mut first = Vec::new();
    while stream.next_particle(&layout, &mut record) {
        first.push(record.clone());
    }
    stream.close();
    stream.close();
    let mut second = Vec::new();
    while stream.next_particle(&layout, &mut record) {
        second.push(record.clone());
    }

    assert_eq!(first.len(), COUNT);
    assert_eq!(first, second);
}

#[test]
fn test_unsupported_attribute_leaves_others_intact() {
    let positions = vec![[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]];
    let with_matrix = MemoryPointCloud::new("m", 2)
        .with_info(
            AttributeInfo::per_point("PointPosition", AttributeType::Matrix3),
            AttributeValues::Float32(vec![0.0, 0.0]),
        )
        .with("Density", AttributeValues::Float32(vec![0.25, 0.5]));
    let plain = MemoryPointCloud::new("p", 2)
        .with("PointPosition", AttributeValues::Vec3(positions))
        .with("Density", AttributeValues::Float32(vec![0.25, 0.5]));

    let table = plume::ChannelMappingTable::global();
    let mut a = ParticleStreamAdapter::from_source(&with_matrix, table);
    let b = ParticleStreamAdapter::from_source(&plain, table);

    assert_eq!(a.channels().len(), 1);
    assert_eq!(a.channels()[0].name(), "Density");
    assert_eq!(b.channels().len(), 2);

    let layout = a.packed_layout();
    let mut record = vec![0u8; layout.record_size()];
    assert!(a.next_particle(&layout, &mut record));
    assert_eq!(record, 0.25f32.to_ne_bytes());
}
