//! CTF Benchmark Suite
//!
//! Targets:
//!   plan_circle_16_teams ............. < 10μs
//!   prepare_stop_16_teams_memory ..... < 5ms
//!   pickup_capture_cycle_sqlite ...... < 500μs
//!   sqlite_increment ................. < 50μs

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use ctf_core::config::{CtfConfig, PersistenceConfig, PlacementConfig};
use ctf_core::placement::plan_circle;
use ctf_core::{
    Broadcaster, ChatMessage, Collaborators, FlagEventEngine, KeyValueStore, MemoryStore,
    OnlinePlayers, Player, PlayerId, Position, Scoreboard, SqliteStore, StoreExt, TeamColour,
    TeamId, VoxelWorld, WorldId,
};

struct Silent;

impl Broadcaster for Silent {
    fn tell(&self, _: &PlayerId, _: &ChatMessage) {}
    fn tell_team(&self, _: &TeamId, _: &ChatMessage) {}
    fn announce(&self, _: &ChatMessage) {}
}

/// An engine with one single-member team per colour in `colours`.
fn engine(
    config: &CtfConfig,
    colours: &[TeamColour],
    store: Arc<dyn KeyValueStore>,
) -> FlagEventEngine {
    let board = Arc::new(Scoreboard::new());
    for colour in colours {
        let team = TeamId::new(colour.internal_name());
        board.add_team(team.clone(), Some(*colour));
        board.join(PlayerId::new(colour.internal_name()), &team);
    }
    FlagEventEngine::with_seed(
        config,
        Collaborators {
            store,
            teams: board,
            world: Arc::new(VoxelWorld::flat(64, &config.placement)),
            roster: Arc::new(OnlinePlayers::new()),
            chat: Arc::new(Silent),
        },
        7,
    )
}

/// Benchmark: circle layout for every colour (target: < 10μs).
fn bench_plan_circle(c: &mut Criterion) {
    let config = PlacementConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    c.bench_function("plan_circle_16_teams", |b| {
        b.iter(|| {
            let layout = plan_circle(
                black_box(&TeamColour::ALL),
                Position::new(0, 64, 0),
                &config,
                &mut rng,
            );
            black_box(layout)
        });
    });
}

/// Benchmark: deploy and remove all flags (target: < 5ms).
fn bench_prepare_stop(c: &mut Criterion) {
    let engine = engine(&CtfConfig::default(), &TeamColour::ALL, Arc::new(MemoryStore::new()));
    c.bench_function("prepare_stop_16_teams_memory", |b| {
        b.iter(|| {
            engine.prepare().expect("prepare");
            engine.stop().expect("stop");
        });
    });
}

/// Benchmark: one pick-up plus capture against SQLite (target: < 500μs).
fn bench_pickup_capture(c: &mut Criterion) {
    let config = CtfConfig {
        rules: ctf_core::config::RulesConfig {
            max_captures: u32::MAX,
            ..Default::default()
        },
        ..CtfConfig::default()
    };
    let store = Arc::new(SqliteStore::open_in_memory(&config.persistence).expect("store"));
    let engine = engine(&config, &[TeamColour::Red, TeamColour::Blue], store);
    engine.prepare().expect("prepare");
    engine.start().expect("start");

    let red = Player::new(PlayerId::new("red"), WorldId::OVERWORLD, Position::new(0, 64, 0));
    c.bench_function("pickup_capture_cycle_sqlite", |b| {
        b.iter(|| {
            let blue = engine.flag_state(TeamColour::Blue).expect("state");
            engine
                .interact(TeamColour::Blue, &red, blue.current.world, blue.current.pos)
                .expect("pickup");
            engine
                .interact(TeamColour::Red, &red, WorldId::OVERWORLD, Position::default())
                .expect("capture");
        });
    });
}

/// Benchmark: single-statement increment (target: < 50μs).
fn bench_sqlite_increment(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory(&PersistenceConfig::default()).expect("store");
    c.bench_function("sqlite_increment", |b| {
        b.iter(|| black_box(store.increment("ctf:num_captures(red,blue)", 1).expect("inc")));
    });
}

criterion_group!(
    benches,
    bench_plan_circle,
    bench_prepare_stop,
    bench_pickup_capture,
    bench_sqlite_increment,
);
criterion_main!(benches);
