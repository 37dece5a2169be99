use super::*;

#[test]
fn priority_ordering_matches_spec() {
    assert!(Priority::Emergency > Priority::High);
    assert!(Priority::High > Priority::Normal);
    assert!(Priority::Normal > Priority::Low);
}

#[test]
fn emergency_never_outranked_by_multiple_normals() {
    let mut heap = std::collections::BinaryHeap::new();
    heap.push(Priority::Low);
    heap.push(Priority::Normal);
    heap.push(Priority::Normal);
    heap.push(Priority::High);
    heap.push(Priority::Emergency);
    assert_eq!(heap.pop(), Some(Priority::Emergency));
}

#[test]
fn set_fan_speed_round_trips_through_json() {
    let cmd = OutboundCommand::SetFanSpeed(SetFanSpeedPayload { fan_id: "fan1".into(), speed: 62 });
    let json = serde_json::to_string(&cmd).unwrap();
    assert_eq!(json, r#"{"type":"setFanSpeed","payload":{"fanId":"fan1","speed":62}}"#);
    let back: OutboundCommand = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cmd);
}

#[test]
fn every_command_variant_round_trips() {
    let variants = vec![
        OutboundCommand::Registered,
        OutboundCommand::SetFanSpeed(SetFanSpeedPayload { fan_id: "f".into(), speed: 10 }),
        OutboundCommand::SetUpdateInterval(SetUpdateIntervalPayload { update_interval_ms: 1000 }),
        OutboundCommand::ApplyFanProfile(ApplyFanProfilePayload {
            fan_id: "f".into(),
            profile_name: "silent".into(),
        }),
        OutboundCommand::SetFanStep(SetFanStepPayload { fan_step_percent: 5 }),
        OutboundCommand::SetHysteresis(SetHysteresisPayload { hysteresis_temp: 3.0 }),
        OutboundCommand::SetEmergencyTemp(SetEmergencyTempPayload { emergency_temp: 85.0 }),
        OutboundCommand::SetFailsafeSpeed(SetFailsafeSpeedPayload { failsafe_speed: 100 }),
        OutboundCommand::SetLogLevel(SetLogLevelPayload { log_level: "debug".into() }),
        OutboundCommand::SetEnableFanControl(SetEnableFanControlPayload { enabled: true }),
        OutboundCommand::SetAgentName(SetAgentNamePayload { name: "rig-1".into() }),
        OutboundCommand::EmergencyStop(EmergencyStopPayload { reason: None }),
        OutboundCommand::SelfUpdate(SelfUpdatePayload { target_version: Some("1.2.0".into()) }),
        OutboundCommand::RescanSensors(RescanSensorsPayload {}),
        OutboundCommand::UpdateSensorMapping(UpdateSensorMappingPayload {
            sensor_id: "s1".into(),
            mapped_label: "CPU Package".into(),
        }),
    ];

    for cmd in variants {
        let json = serde_json::to_string(&cmd).unwrap();
        let back: OutboundCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd, "round trip failed for {}", cmd.kind_name());
    }
}

#[test]
fn fan_id_only_present_for_set_fan_speed() {
    let cmd = OutboundCommand::SetFanSpeed(SetFanSpeedPayload { fan_id: "fan7".into(), speed: 50 });
    assert_eq!(cmd.fan_id(), Some("fan7"));

    let other = OutboundCommand::SetFanStep(SetFanStepPayload { fan_step_percent: 10 });
    assert_eq!(other.fan_id(), None);
}
