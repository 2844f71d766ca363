use criterion::{Criterion, black_box, criterion_group, criterion_main};

use basename_mint::app::{BASE_SEPOLIA_CHAIN_ID, MintSession};
use basename_mint::domain::{CandidateName, WalletStatus, format_native, quote};
use basename_mint::presentation::{Renderer, PlainTextRenderer, ViewModel};

fn bench_price_policy(c: &mut Criterion) {
    let names: Vec<CandidateName> = ["ab", "alice", "a-much-longer-name"]
        .iter()
        .map(|n| CandidateName::from_input(n))
        .collect();

    c.bench_function("quote_and_format", |b| {
        b.iter(|| {
            for name in &names {
                let q = quote(black_box(name), None);
                black_box(format_native(q.native_fee));
            }
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut session = MintSession::new(BASE_SEPOLIA_CHAIN_ID);
    session.set_name("alice");
    if let Ok(ticket) = session.availability.begin_check() {
        session.availability.resolve(&ticket, Ok(true));
    }
    let wallet = WalletStatus {
        connected: true,
        address: Some("0x00000000000000000000000000000000000000a1".to_string()),
        chain_id: Some(BASE_SEPOLIA_CHAIN_ID),
    };

    c.bench_function("snapshot_and_render", |b| {
        b.iter(|| {
            let snapshot = black_box(&session).snapshot(wallet.clone(), None);
            black_box(PlainTextRenderer.render(&ViewModel::from_snapshot(&snapshot)))
        })
    });
}

criterion_group!(benches, bench_price_policy, bench_snapshot);
criterion_main!(benches);
