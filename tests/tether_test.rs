//! Tether deploy/retract cycles against rapier3d bodies and spring joints.
//!
//! Run with: cargo test --test tether_test -- --nocapture

use nalgebra::Vector3;
use ropewalk::config::{PlayerConfig, TetherConfig};
use ropewalk::game::constants::physics::TIMESTEP;
use ropewalk::game::{InputEvent, PhysicsBackend, PhysicsWorld, Player};

const NODES: usize = 5;

fn setup() -> (PhysicsWorld, Player<PhysicsWorld>) {
    let mut world = PhysicsWorld::new();
    world.add_static_block([0.0, -0.5, 0.0], [100.0, 1.0, 10.0]);
    let body = world.add_player([0.0, 0.0, 0.0], 0.5, 2.0);
    let config = PlayerConfig {
        tether: Some(TetherConfig {
            node_count: NODES,
            ..TetherConfig::default()
        }),
        ..PlayerConfig::default()
    };
    let player = Player::new(&mut world, body, &config);
    world.refresh_queries();
    (world, player)
}

fn step(world: &mut PhysicsWorld, player: &mut Player<PhysicsWorld>) {
    player.step(world, TIMESTEP);
    world.step(TIMESTEP);
}

fn toggle(world: &mut PhysicsWorld, player: &mut Player<PhysicsWorld>) {
    player.push_input(InputEvent::TetherToggle);
    step(world, player);
}

#[test]
fn test_first_deploy_spawns_chain() {
    let (mut world, mut player) = setup();
    assert_eq!(world.rigid_body_set.len(), 2);

    toggle(&mut world, &mut player);
    let rig = player.tether().unwrap();
    assert!(rig.is_deployed());
    assert_eq!(world.rigid_body_set.len(), 2 + NODES);
    // NODES - 1 links between nodes plus the player spring
    assert_eq!(world.joint_count(), NODES);

    let anchor = world.body_position(rig.node_bodies()[0]).unwrap();
    assert!((anchor - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-4, "anchor at {:?}", anchor);
}

#[test]
fn test_anchor_holds_while_player_walks_away() {
    let (mut world, mut player) = setup();
    toggle(&mut world, &mut player);
    player.push_input(InputEvent::Move { axis: 1.0 });
    for _ in 0..30 {
        step(&mut world, &mut player);
    }

    let rig = player.tether().unwrap();
    let nodes = rig.node_bodies();
    let anchor = world.body_position(nodes[0]).unwrap();
    assert!((anchor - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-4, "anchor drifted to {:?}", anchor);
    let player_x = world.body_position(player.body()).unwrap().x;
    assert!(player_x > 1.0);

    let frame = rig.render_frame(&world, player.body());
    assert!(frame.visible);
    assert_eq!(frame.points.len(), NODES + 1);
    assert!((Vector3::from(frame.points[0]) - anchor).norm() < 1e-6);
    assert_eq!(frame.color, [1.0, 1.0, 0.0, 1.0]);
}

#[test]
fn test_retract_disables_nodes_and_keeps_them() {
    let (mut world, mut player) = setup();
    toggle(&mut world, &mut player);
    toggle(&mut world, &mut player);

    let rig = player.tether().unwrap();
    assert!(!rig.is_deployed());
    assert!(rig.player_link().is_none());
    assert_eq!(world.rigid_body_set.len(), 2 + NODES);
    assert_eq!(world.joint_count(), NODES - 1);
    for node in rig.node_bodies() {
        assert!(!world.rigid_body_set[node].is_enabled());
    }
    assert!(!rig.render_frame(&world, player.body()).visible);
}

#[test]
fn test_redeploy_reuses_nodes_at_new_anchor() {
    let (mut world, mut player) = setup();
    toggle(&mut world, &mut player);
    let first_nodes = player.tether().unwrap().node_bodies();
    toggle(&mut world, &mut player);

    world.set_body_position(player.body(), Vector3::new(10.0, 0.0, 0.0));
    world.refresh_queries();
    player.push_input(InputEvent::TetherToggle);
    player.step(&mut world, TIMESTEP);

    let rig = player.tether().unwrap();
    assert!(rig.is_deployed());
    assert_eq!(rig.node_bodies(), first_nodes);
    assert_eq!(world.rigid_body_set.len(), 2 + NODES);
    assert_eq!(world.joint_count(), NODES);

    let player_x = world.body_position(player.body()).unwrap().x;
    let expected = Vector3::new(player_x, 1.0, 0.0);
    for node in first_nodes {
        assert!(world.rigid_body_set[node].is_enabled());
        let position = world.body_position(node).unwrap();
        assert!((position - expected).norm() < 1e-4, "node at {:?}", position);
    }
}

#[test]
fn test_despawn_clears_rope_and_body() {
    let (mut world, mut player) = setup();
    toggle(&mut world, &mut player);
    player.despawn(&mut world);

    assert_eq!(world.rigid_body_set.len(), 1);
    assert_eq!(world.joint_count(), 0);
}
