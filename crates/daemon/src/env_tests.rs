// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn addr_defaults_and_overrides() {
    std::env::remove_var("ADDR");
    assert_eq!(addr(), "0.0.0.0:9090");
    std::env::set_var("ADDR", "127.0.0.1:7000");
    assert_eq!(addr(), "127.0.0.1:7000");
    std::env::remove_var("ADDR");
}

#[test]
#[serial]
fn state_path_prefers_explicit_override() {
    std::env::set_var("STATE_PATH", "/tmp/sx-state.json");
    assert_eq!(state_path(), PathBuf::from("/tmp/sx-state.json"));
    std::env::remove_var("STATE_PATH");

    std::env::set_var("DATA_DIR", "/tmp/sx-data");
    assert_eq!(state_path(), PathBuf::from("/tmp/sx-data/manager_state.json"));
    std::env::remove_var("DATA_DIR");
}

#[test]
#[serial]
fn max_open_per_dyad_defaults_to_ten() {
    std::env::remove_var("DYAD_MAX_OPEN_PER_DYAD");
    assert_eq!(max_open_per_dyad(), 10);
    std::env::set_var("DYAD_MAX_OPEN_PER_DYAD", "3");
    assert_eq!(max_open_per_dyad(), 3);
    std::env::remove_var("DYAD_MAX_OPEN_PER_DYAD");
}

#[test]
#[serial]
fn bool_vars_accept_true_forms() {
    for value in ["1", "true", "yes"] {
        std::env::set_var("CODEX_RESET_ON_COOLDOWN", value);
        assert!(reset_on_cooldown(), "{value} should enable");
    }
    std::env::set_var("CODEX_RESET_ON_COOLDOWN", "off");
    assert!(!reset_on_cooldown());
    std::env::remove_var("CODEX_RESET_ON_COOLDOWN");
}

#[test]
#[serial]
fn digest_interval_parses_durations() {
    std::env::set_var("DYAD_TASK_DIGEST_INTERVAL", "5m");
    assert_eq!(digest_interval(), Duration::from_secs(300));
    std::env::remove_var("DYAD_TASK_DIGEST_INTERVAL");
    assert_eq!(digest_interval(), Duration::from_secs(600));
}
