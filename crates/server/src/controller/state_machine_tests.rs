use super::*;

#[test]
fn starts_unassigned() {
    assert_eq!(FanController::new().state(), FanControlState::Unassigned);
}

#[test]
fn assignment_creation_moves_to_controlled() {
    let mut fan = FanController::new();
    fan.on_assignment_created();
    assert_eq!(fan.state(), FanControlState::Controlled);
}

#[test]
fn deletion_returns_to_unassigned() {
    let mut fan = FanController::new();
    fan.on_assignment_created();
    fan.on_assignment_deleted();
    assert_eq!(fan.state(), FanControlState::Unassigned);
}

#[test]
fn manual_write_then_next_tick_resumes_control() {
    let mut fan = FanController::new();
    fan.on_assignment_created();
    fan.on_manual_write();
    assert_eq!(fan.state(), FanControlState::Manual);
    fan.tick_advance();
    assert_eq!(fan.state(), FanControlState::Controlled);
}

#[test]
fn manual_write_on_an_unassigned_fan_is_a_no_op() {
    let mut fan = FanController::new();
    fan.on_manual_write();
    assert_eq!(fan.state(), FanControlState::Unassigned);
}

#[test]
fn emergency_overrides_controlled_and_returns_to_it() {
    let mut fan = FanController::new();
    fan.on_assignment_created();
    fan.on_temperature(true, false);
    assert_eq!(fan.state(), FanControlState::Emergency);

    fan.on_temperature(true, false);
    assert_eq!(fan.state(), FanControlState::Emergency, "stays in emergency while still over the band");

    fan.on_temperature(false, true);
    assert_eq!(fan.state(), FanControlState::Controlled);
}

#[test]
fn emergency_overrides_manual_and_restores_manual_after() {
    let mut fan = FanController::new();
    fan.on_assignment_created();
    fan.on_manual_write();
    fan.on_temperature(true, false);
    assert_eq!(fan.state(), FanControlState::Emergency);

    fan.on_temperature(false, true);
    assert_eq!(fan.state(), FanControlState::Manual);
}

#[test]
fn unassigned_fan_can_still_enter_emergency() {
    let mut fan = FanController::new();
    fan.on_temperature(true, false);
    assert_eq!(fan.state(), FanControlState::Emergency);
    fan.on_temperature(false, true);
    assert_eq!(fan.state(), FanControlState::Unassigned);
}

#[test]
fn only_controlled_state_is_controllable() {
    let mut fan = FanController::new();
    assert!(!fan.is_controllable());
    fan.on_assignment_created();
    assert!(fan.is_controllable());
    fan.on_manual_write();
    assert!(!fan.is_controllable());
}
