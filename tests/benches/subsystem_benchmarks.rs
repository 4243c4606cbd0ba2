//! # Rumor-Mesh Subsystem Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | shared-types | packet encode and decode |
//! | rm-03 File Sharing | metafile construction |
//! | rm-04 File Chain | block hashing and nonce search |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rm_03_file_sharing::domain::build_metafile;
use rm_04_file_chain::{sign_ownership, Blockchain};
use shared_crypto::testing::fixture_keypair;
use shared_types::{
    decode_packet, encode_packet, DataReply, FileRecord, GossipPacket, RumorMessage, CHUNK_SIZE,
};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-types-codec");

    let rumor = GossipPacket::Rumor(RumorMessage::new("nodeA", 42, "a short rumor"));
    group.bench_function("encode_rumor", |b| b.iter(|| encode_packet(black_box(&rumor))));

    let reply = GossipPacket::DataReply(DataReply {
        origin: "nodeA".into(),
        destination: "nodeB".into(),
        hop_limit: 10,
        hash_value: [7; 32],
        data: vec![0xab; CHUNK_SIZE],
    });
    let bytes = encode_packet(&reply).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode_data_reply", |b| b.iter(|| encode_packet(black_box(&reply))));
    group.bench_function("decode_data_reply", |b| b.iter(|| decode_packet(black_box(&bytes))));
    group.finish();
}

fn bench_metafile(c: &mut Criterion) {
    let mut group = c.benchmark_group("rm-03-metafile");
    for size in [CHUNK_SIZE, 64 * CHUNK_SIZE, 256 * CHUNK_SIZE] {
        let content: Vec<u8> = (0..size).map(|i| i as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("build", size), &content, |b, content| {
            b.iter(|| build_metafile(black_box(content)))
        });
    }
    group.finish();
}

fn bench_pow(c: &mut Criterion) {
    let mut group = c.benchmark_group("rm-04-pow");
    let keypair = fixture_keypair(0);
    let mut chain = Blockchain::new(1);
    for i in 0..8 {
        let tx = sign_ownership(FileRecord::new(format!("file{i}"), 1024, [i as u8; 32]), &keypair)
            .unwrap();
        chain.add_transaction(tx);
    }
    let template = chain.mining_template().unwrap();

    group.bench_function("nonce_search_one_zero_byte", |b| {
        let mut rng = StdRng::seed_from_u64(7);
        b.iter(|| template.search(1 << 16, &mut rng))
    });

    let block = template.search(1 << 16, &mut StdRng::seed_from_u64(1)).unwrap();
    group.bench_function("block_hash", |b| b.iter(|| black_box(&block).hash()));
    group.finish();
}

criterion_group!(benches, bench_codec, bench_metafile, bench_pow);
criterion_main!(benches);
