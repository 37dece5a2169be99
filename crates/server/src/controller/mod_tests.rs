use std::sync::Arc;

use super::*;
use crate::aggregator::Aggregator;
use crate::gateway::registry::{AgentConnection, AgentSettings};
use pankha_protocol::{AgentOutbound, DataPayload, FanReport, SensorReport};
use pankha_storage::types::{FanUpsert, NewSystem, SensorUpsert};
use tokio::sync::mpsc;

fn sample_system(agent_id: &str) -> NewSystem {
    NewSystem {
        agent_id: agent_id.into(),
        name: "Rig".into(),
        auth_token: None,
        agent_version: None,
        capabilities: "{}".into(),
        update_interval_ms: 2000,
        fan_step_percent: 5,
        hysteresis_temp: 3.0,
        emergency_temp: 90.0,
        failsafe_speed: 60,
        log_level: "info".into(),
    }
}

fn sample_settings() -> AgentSettings {
    AgentSettings {
        name: "Rig".into(),
        update_interval_ms: 2000,
        fan_step_percent: 5,
        hysteresis_temp: 3.0,
        emergency_temp: 90.0,
        failsafe_speed: 60,
        log_level: "info".into(),
        enable_fan_control: true,
    }
}

async fn online_agent(registry: &AgentRegistry, agent_id: &str, system_id: i64) -> mpsc::Receiver<AgentOutbound> {
    let (tx, rx) = mpsc::channel(32);
    registry.register(agent_id, system_id, sample_settings(), AgentConnection { outbound_tx: tx, cancel: CancellationToken::new() }).await;
    rx
}

async fn report(aggregator: &Aggregator, storage: &Storage, system_id: i64, agent_id: &str, sensor_id: &str, temperature: f64) {
    aggregator
        .ingest(
            storage,
            system_id,
            agent_id,
            &DataPayload {
                agent_id: agent_id.into(),
                timestamp: "2026-07-27T00:00:00Z".into(),
                sensors: vec![SensorReport { id: sensor_id.into(), temperature, status: None }],
                fans: vec![FanReport { id: "fan1".into(), rpm: 1000, speed: 30, status: None }],
                system_health: None,
            },
        )
        .await
        .unwrap();
}

struct Fixture {
    storage: Storage,
    registry: Arc<AgentRegistry>,
    aggregator: Aggregator,
    dispatcher: Dispatcher,
    controller: ControllerRegistry,
    system: pankha_storage::types::System,
    fan: pankha_storage::types::Fan,
    outbound: mpsc::Receiver<AgentOutbound>,
}

async fn setup(min_speed: i64, max_speed: i64) -> Fixture {
    let storage = Storage::open_in_memory().await.unwrap();
    let system = storage.systems.register(sample_system("rig-1")).await.unwrap();
    storage
        .sensors
        .upsert(system.id, &SensorUpsert { sensor_name: "cpu0".into(), sensor_label: "cpu0".into(), sensor_type: "cpu".into(), temp_max: None, temp_crit: None })
        .await
        .unwrap();
    let fan = storage
        .fans
        .upsert(system.id, &FanUpsert { fan_name: "fan1".into(), fan_label: "fan1".into(), min_speed, max_speed, has_pwm_control: true })
        .await
        .unwrap();
    let profile = storage
        .profiles
        .create(None, "ramp", "", &[(30.0, 20), (50.0, 40), (70.0, 70), (85.0, 100)])
        .await
        .unwrap();
    storage.assignments.set_active(fan.id, profile.id, None, Some("cpu0")).await.unwrap();

    let registry = Arc::new(AgentRegistry::new());
    let outbound = online_agent(&registry, "rig-1", system.id).await;
    let aggregator = Aggregator::new();
    let dispatcher = Dispatcher::new(Arc::clone(&registry));
    let controller = ControllerRegistry::new();

    Fixture { storage, registry, aggregator, dispatcher, controller, system, fan, outbound }
}

#[tokio::test]
async fn offline_systems_are_skipped_entirely() {
    let storage = Storage::open_in_memory().await.unwrap();
    storage.systems.register(sample_system("rig-1")).await.unwrap();
    let registry = AgentRegistry::new();
    let aggregator = Aggregator::new();
    let dispatcher = Dispatcher::new(Arc::new(AgentRegistry::new()));
    let controller = ControllerRegistry::new();

    run_tick(&storage, &registry, &aggregator, &dispatcher, &controller).await.unwrap();
}

#[tokio::test]
async fn an_assigned_fan_gets_a_curve_driven_write() {
    let mut fx = setup(30, 100).await;
    report(&fx.aggregator, &fx.storage, fx.system.id, "rig-1", "cpu0", 45.0).await;

    run_tick(&fx.storage, &fx.registry, &fx.aggregator, &fx.dispatcher, &fx.controller).await.unwrap();

    let frame = fx.outbound.recv().await.unwrap();
    match frame.command {
        OutboundCommand::SetFanSpeed(payload) => {
            assert_eq!(payload.fan_id, "fan1");
            assert_eq!(payload.speed, 35);
        }
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(fx.controller.state_of(fx.fan.id).await, FanControlState::Controlled);
}

#[tokio::test]
async fn repeated_temperature_within_the_bucket_does_not_write_again() {
    let mut fx = setup(30, 100).await;
    report(&fx.aggregator, &fx.storage, fx.system.id, "rig-1", "cpu0", 45.0).await;
    run_tick(&fx.storage, &fx.registry, &fx.aggregator, &fx.dispatcher, &fx.controller).await.unwrap();
    fx.outbound.recv().await.unwrap();

    report(&fx.aggregator, &fx.storage, fx.system.id, "rig-1", "cpu0", 45.9).await;
    run_tick(&fx.storage, &fx.registry, &fx.aggregator, &fx.dispatcher, &fx.controller).await.unwrap();

    assert!(fx.outbound.try_recv().is_err(), "a reading inside the hysteresis band must not re-trigger a write");
}

#[tokio::test]
async fn a_sensor_over_the_emergency_threshold_forces_full_speed_even_when_unassigned() {
    let storage = Storage::open_in_memory().await.unwrap();
    let system = storage.systems.register(sample_system("rig-1")).await.unwrap();
    storage
        .sensors
        .upsert(system.id, &SensorUpsert { sensor_name: "cpu0".into(), sensor_label: "cpu0".into(), sensor_type: "cpu".into(), temp_max: None, temp_crit: None })
        .await
        .unwrap();
    storage
        .fans
        .upsert(system.id, &FanUpsert { fan_name: "fan1".into(), fan_label: "fan1".into(), min_speed: 30, max_speed: 100, has_pwm_control: true })
        .await
        .unwrap();

    let registry = Arc::new(AgentRegistry::new());
    let mut outbound = online_agent(&registry, "rig-1", system.id).await;
    let aggregator = Aggregator::new();
    let dispatcher = Dispatcher::new(Arc::clone(&registry));
    let controller = ControllerRegistry::new();

    report(&aggregator, &storage, system.id, "rig-1", "cpu0", 95.0).await;
    run_tick(&storage, &registry, &aggregator, &dispatcher, &controller).await.unwrap();

    let frame = outbound.recv().await.unwrap();
    match frame.command {
        OutboundCommand::SetFanSpeed(payload) => assert_eq!(payload.speed, 100),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[tokio::test]
async fn clearing_a_fan_forces_an_unconditional_write_next_tick() {
    let mut fx = setup(30, 100).await;
    report(&fx.aggregator, &fx.storage, fx.system.id, "rig-1", "cpu0", 45.0).await;
    run_tick(&fx.storage, &fx.registry, &fx.aggregator, &fx.dispatcher, &fx.controller).await.unwrap();
    fx.outbound.recv().await.unwrap();

    fx.controller.clear(fx.fan.id).await;
    report(&fx.aggregator, &fx.storage, fx.system.id, "rig-1", "cpu0", 45.9).await;
    run_tick(&fx.storage, &fx.registry, &fx.aggregator, &fx.dispatcher, &fx.controller).await.unwrap();

    assert!(fx.outbound.recv().await.is_some());
}
