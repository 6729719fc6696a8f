//! Server Tests — host events driving a full event.

use ctf_core::config::{CtfConfig, PersistenceConfig};
use ctf_core::{
    CtfError, InteractOutcome, Phase, Player, PlayerId, Position, Rejection, Roster, TeamColour,
    TeamId, VoxelWorld, WorldId,
};
use ctf_server::{CtfServer, EventOutcome, ServerEvent};

const GROUND: i32 = 64;

fn world(config: &CtfConfig) -> VoxelWorld {
    VoxelWorld::flat(GROUND, &config.placement)
}

fn server() -> CtfServer {
    let config = CtfConfig::default();
    let server = CtfServer::in_memory(config.clone(), world(&config), 11).expect("server");
    for (team, colour, members) in [
        ("reds", TeamColour::Red, ["alice", "arthur"]),
        ("blues", TeamColour::Blue, ["bob", "beth"]),
    ] {
        server.teams().add_team(TeamId::new(team), Some(colour));
        for name in members {
            server.teams().join(PlayerId::new(name), &TeamId::new(team));
            server
                .handle(ServerEvent::Login(Player::new(
                    PlayerId::new(name),
                    WorldId::OVERWORLD,
                    Position::new(0, GROUND, 0),
                )))
                .expect("login");
        }
    }
    server
}

fn op(server: &CtfServer) -> EventOutcome {
    server
        .handle(ServerEvent::Command {
            sender: PlayerId::new("admin"),
            permission_level: 4,
        })
        .expect("command")
}

fn click(server: &CtfServer, who: &str, colour: TeamColour) -> EventOutcome {
    let state = server.engine().flag_state(colour).expect("state");
    server
        .handle(ServerEvent::FlagClicked {
            player: PlayerId::new(who),
            colour,
            world: state.current.world,
            position: state.current.pos,
        })
        .expect("click")
}

fn inbox_text(server: &CtfServer, who: &str) -> Vec<String> {
    server
        .chat()
        .inbox(&PlayerId::new(who))
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn command_requires_permission() {
    let server = server();
    let err = server
        .handle(ServerEvent::Command {
            sender: PlayerId::new("alice"),
            permission_level: 0,
        })
        .expect_err("not an operator");
    assert!(matches!(err, CtfError::PermissionDenied { required: 2, actual: 0 }));
    assert_eq!(server.engine().phase().expect("phase"), Phase::Inactive);
}

#[test]
fn command_cycles_phases() {
    let server = server();
    assert_eq!(op(&server), EventOutcome::PhaseChanged(Phase::Preparation));
    assert_eq!(op(&server), EventOutcome::PhaseChanged(Phase::Active));
    assert_eq!(op(&server), EventOutcome::PhaseChanged(Phase::Inactive));
}

#[test]
fn teams_hear_only_their_own_flag_during_preparation() {
    let server = server();
    op(&server);
    let alice = inbox_text(&server, "alice");
    let red = server.engine().flag_state(TeamColour::Red).expect("state");
    assert!(alice.contains(&format!("Your flag has been deployed at {}.", red.current.pos)));
    assert_eq!(alice.iter().filter(|l| l.contains("deployed")).count(), 1);
    assert!(alice.contains(&"Capture the Flag will begin soon.".to_string()));
}

#[test]
fn click_pickup_and_death_drop() {
    let server = server();
    op(&server);
    op(&server);

    assert_eq!(
        click(&server, "bob", TeamColour::Red),
        EventOutcome::Interacted(InteractOutcome::PickedUp)
    );
    assert_eq!(
        click(&server, "beth", TeamColour::Red),
        EventOutcome::Interacted(InteractOutcome::Rejected(Rejection::FlagGone))
    );

    server
        .handle(ServerEvent::Moved {
            player: PlayerId::new("bob"),
            world: WorldId::OVERWORLD,
            position: Position::new(7, GROUND, 7),
        })
        .expect("move");
    match server.handle(ServerEvent::Death(PlayerId::new("bob"))).expect("death") {
        EventOutcome::Dropped(Some(dropped)) => {
            assert_eq!(dropped.colour, TeamColour::Red);
            assert_eq!(dropped.at.pos, Position::new(7, GROUND, 7));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(
        inbox_text(&server, "alice")
            .contains(&"bob has dropped the Red Flag at [X:7, Y:64, Z:7].".to_string())
    );
}

#[test]
fn capture_scores_through_the_server() {
    let server = server();
    op(&server);
    op(&server);

    click(&server, "alice", TeamColour::Blue);
    assert_eq!(
        click(&server, "alice", TeamColour::Red),
        EventOutcome::Interacted(InteractOutcome::Captured { count: 1 })
    );
    assert_eq!(server.teams().score(&TeamId::new("reds")), 20);
    assert_eq!(server.teams().score(&TeamId::new("blues")), -10);
    assert!(
        inbox_text(&server, "arthur").contains(&"Your team has been awarded 20 points.".to_string())
    );
    assert!(inbox_text(&server, "beth").contains(&"Your team has lost 10 points.".to_string()));
}

#[test]
fn failed_logout_drop_keeps_the_carrier_online() {
    let server = server();
    op(&server);
    op(&server);
    click(&server, "bob", TeamColour::Red);

    let bob = PlayerId::new("bob");
    server
        .handle(ServerEvent::Moved {
            player: bob.clone(),
            world: WorldId::OVERWORLD,
            position: Position::new(0, 10_000, 0),
        })
        .expect("move");
    let err = server
        .handle(ServerEvent::Logout(bob.clone()))
        .expect_err("nowhere to drop");
    assert!(matches!(err, CtfError::PlacementFailed { .. }));
    assert!(server.roster().player(&bob).is_some());
    assert_eq!(
        server.engine().carried_flag(&bob).expect("carried"),
        Some(TeamColour::Red)
    );

    server
        .handle(ServerEvent::Moved {
            player: bob.clone(),
            world: WorldId::OVERWORLD,
            position: Position::new(5, GROUND, 5),
        })
        .expect("move");
    assert!(matches!(
        server.handle(ServerEvent::Logout(bob.clone())).expect("logout"),
        EventOutcome::Dropped(Some(_))
    ));
    assert!(server.roster().player(&bob).is_none());
}

#[test]
fn logout_of_unknown_player_is_ignored() {
    let server = server();
    assert_eq!(
        server
            .handle(ServerEvent::Logout(PlayerId::new("nobody")))
            .expect("logout"),
        EventOutcome::Ignored
    );
}

#[test]
fn file_backed_server_keeps_phase_and_backs_up() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = CtfConfig {
        persistence: PersistenceConfig {
            path: dir.path().join("ctf.db"),
            ..PersistenceConfig::default()
        },
        ..CtfConfig::default()
    };

    {
        let server = CtfServer::open(config.clone(), world(&config)).expect("open");
        server.teams().add_team(TeamId::new("reds"), Some(TeamColour::Red));
        server.teams().join(PlayerId::new("alice"), &TeamId::new("reds"));
        op(&server);
        assert!(server.maintain().expect("maintain"));
    }

    assert!(dir.path().join("ctf.db.bak.1").exists());
    let server = CtfServer::open(config.clone(), world(&config)).expect("reopen");
    assert_eq!(server.engine().phase().expect("phase"), Phase::Preparation);
}
