use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> ServerConfig {
    #[derive(clap::Parser)]
    struct Wrapper {
        #[command(flatten)]
        config: ServerConfig,
    }
    Wrapper::try_parse_from(args).unwrap().config
}

#[test]
fn controller_tick_interval_clamps_below_floor() {
    let config = parse(&["pankhad", "--controller-tick-ms", "10"]);
    assert_eq!(config.controller_tick_interval(), Duration::from_millis(500));
}

#[test]
fn controller_tick_interval_clamps_above_ceiling() {
    let config = parse(&["pankhad", "--controller-tick-ms", "999999"]);
    assert_eq!(config.controller_tick_interval(), Duration::from_millis(60_000));
}

#[test]
fn heartbeat_deadline_has_a_15s_floor() {
    let config = parse(&["pankhad"]);
    assert_eq!(config.heartbeat_deadline(1000), Duration::from_secs(15));
}

#[test]
fn heartbeat_deadline_scales_with_update_interval() {
    let config = parse(&["pankhad"]);
    assert_eq!(config.heartbeat_deadline(10_000), Duration::from_millis(30_000));
}
