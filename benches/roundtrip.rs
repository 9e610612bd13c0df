//! Call round-trip benchmark suite.
//!
//! Benchmarks the envelope codec and full bridge round-trips at
//! different pipelining depths against an in-process echo host.
//!
//! Run with: cargo bench --bench roundtrip
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use tokio::runtime::Runtime;

use host_bridge::protocol::{
    AppInstallDialogCommand, Command, Envelope, OpenAppInstallDialogParams, ResponseEnvelope,
};
use host_bridge::transport::FrameChannel;
use host_bridge::{Bridge, transport};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const PIPELINE_DEPTHS: &[usize] = &[1, 64, 256];

// ============================================================================
// Benchmark: Envelope Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let envelope = Envelope::new(
        "appInstallDialog.openAppInstallDialog",
        vec![json!({"appId": "0"})],
    );
    let encoded = envelope.encode().expect("encode");

    group.bench_function("encode", |b| {
        b.iter(|| envelope.encode().expect("encode"));
    });
    group.bench_function("decode", |b| {
        b.iter(|| Envelope::decode(&encoded).expect("decode"));
    });

    group.finish();
}

// ============================================================================
// Benchmark: Bridge Round-Trip
// ============================================================================

fn bench_roundtrip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("roundtrip");

    for &depth in PIPELINE_DEPTHS {
        group.bench_with_input(BenchmarkId::new("pipelined", depth), &depth, |b, &depth| {
            let bridge = rt.block_on(ready_bridge());
            b.to_async(&rt)
                .iter(|| run_pipelined_calls(bridge.clone(), depth));
        });
    }

    group.finish();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds a ready bridge with an echo host answering every call.
async fn ready_bridge() -> Bridge {
    let (guest, host) = transport::pair();
    spawn_echo_host(host);

    let bridge = Bridge::new(guest);
    bridge.initialize().await.expect("handshake");
    bridge
}

/// Host task: completes the handshake, then echoes null to every call.
fn spawn_echo_host(channel: FrameChannel) {
    let (tx, mut rx) = channel.split();
    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            let Ok(envelope) = Envelope::decode(&text) else {
                continue;
            };
            let result = if envelope.func == "initialize" {
                json!({"apiVersion": 2, "supports": {"appInstallDialog": {}}})
            } else {
                json!(null)
            };
            let response = ResponseEnvelope::success(envelope.id, Some(result));
            if tx.send(response.encode().expect("encode")).is_err() {
                return;
            }
        }
    });
}

async fn run_pipelined_calls(bridge: Bridge, depth: usize) {
    let replies: Vec<_> = (0..depth)
        .map(|_| {
            bridge
                .call(Command::AppInstallDialog(AppInstallDialogCommand::Open(
                    OpenAppInstallDialogParams {
                        app_id: "0".to_string(),
                    },
                )))
                .expect("call")
        })
        .collect();

    for reply in replies {
        reply.response().await.expect("resolved");
    }
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_codec, bench_roundtrip);
criterion_main!(benches);
