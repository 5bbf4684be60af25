use criterion::{criterion_group, criterion_main, Criterion};
use raven_pixel::{Decoder, Encoder, QuantizationOptions, RgbaImage};

fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0u8; (width as usize) * (height as usize) * 4];
    for (i, chunk) in data.chunks_exact_mut(4).enumerate() {
        chunk[0] = (i % 256) as u8;
        chunk[1] = ((i / 7) % 256) as u8;
        chunk[2] = ((i / 13) % 256) as u8;
        chunk[3] = 255;
    }
    let image = RgbaImage::new(width, height, data).unwrap();
    Encoder::default().encode(&image, &QuantizationOptions::default()).unwrap()
}

fn decode_benchmark(c: &mut Criterion) {
    let small = sample_jpeg(64, 64);
    let large = sample_jpeg(512, 512);
    let decoder = Decoder::new();

    c.bench_function("decode 64x64", |b| {
        b.iter(|| decoder.decode(&small).unwrap());
    });
    c.bench_function("decode 512x512", |b| {
        b.iter(|| decoder.decode(&large).unwrap());
    });
    c.bench_function("decode_headers 512x512", |b| {
        b.iter(|| decoder.decode_headers(&large).unwrap());
    });
}

criterion_group!(benches, decode_benchmark);
criterion_main!(benches);
