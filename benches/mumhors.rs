#[macro_use]
extern crate criterion;
use criterion::{BatchSize, Criterion};
use mumhors::sampler::IndexSampler;
use mumhors::traits::HashOracle;
use mumhors::{Blake2b256, HorsParams, PublicKeyMatrix, Seed, Signer, Verifier};

fn harness_params() -> HorsParams {
    HorsParams::new(1024, 16, 256, 256, 64).unwrap()
}

fn messages(count: usize) -> Vec<[u8; 32]> {
    let mut message = Blake2b256::digest(&[&[0u8; 32]]);
    (0..count)
        .map(|_| {
            let current = message;
            message = Blake2b256::digest(&[&message]);
            current
        })
        .collect()
}

fn keygen(c: &mut Criterion) {
    let params = HorsParams::new(1024, 16, 256, 16, 16).unwrap();
    c.bench_function("KeyGen of 16 rows of 1024 keys", |b| {
        b.iter(|| PublicKeyMatrix::from_seed(&Seed::zero(), &params))
    });
}

fn discover(c: &mut Criterion) {
    let sampler: IndexSampler = IndexSampler::new(&harness_params());
    let messages = messages(64);
    c.bench_function("Index discovery, t = 1024, k = 16", |b| {
        b.iter(|| {
            for message in messages.iter() {
                sampler.discover(message).unwrap();
            }
        })
    });
}

fn sign(c: &mut Criterion) {
    let messages = messages(256);
    c.bench_function("Sign 256 messages", |b| {
        b.iter_batched(
            || Signer::new(Seed::zero(), harness_params()),
            |mut signer: Signer| {
                for message in messages.iter() {
                    signer.sign(message).unwrap();
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn verify(c: &mut Criterion) {
    let params = harness_params();
    let messages = messages(256);
    let (mut signer, matrix) = Signer::keygen(Seed::zero(), params);
    let signatures: Vec<_> = messages
        .iter()
        .map(|message| signer.sign(message).unwrap())
        .collect();

    c.bench_function("Verify 256 messages", |b| {
        b.iter_batched(
            || Verifier::new(matrix.clone(), params).unwrap(),
            |mut verifier: Verifier| {
                for (message, sigma) in messages.iter().zip(signatures.iter()) {
                    verifier.verify(message, sigma).unwrap();
                }
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(name = benches; config = Criterion::default().sample_size(10); targets = keygen, discover, sign, verify);
criterion_main!(benches);
