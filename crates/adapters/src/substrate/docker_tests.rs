// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::substrate::spec::DyadSpec;

fn spec() -> DyadSpec {
    DyadSpec::build(&EnsureOptions {
        dyad: "alpha".to_string(),
        actor_image: "silexa/actor:1".to_string(),
        critic_image: "silexa/critic:1".to_string(),
        workspace_dir: "/srv/ws".to_string(),
        configs_dir: "/srv/cfg".to_string(),
        substrate_socket: "/var/run/docker.sock".to_string(),
    })
}

#[test]
fn run_args_carry_restart_policy_and_alias() {
    let args = docker_run_args(&spec(), Member::Actor);
    let joined = args.join(" ");
    assert!(joined.contains("--restart unless-stopped"));
    assert!(joined.contains("--network silexa-net-alpha"));
    assert!(joined.contains("--network-alias silexa-actor-alpha"));
}

#[test]
fn run_args_carry_labels() {
    let args = docker_run_args(&spec(), Member::Critic);
    let joined = args.join(" ");
    assert!(joined.contains("--label silexa.dyad=alpha"));
    assert!(joined.contains("--label silexa.member=critic"));
}

#[test]
fn run_args_mount_socket_into_critic_only() {
    let critic = docker_run_args(&spec(), Member::Critic).join(" ");
    let actor = docker_run_args(&spec(), Member::Actor).join(" ");
    assert!(critic.contains("/var/run/docker.sock:/var/run/docker.sock"));
    assert!(!actor.contains("docker.sock"));
}

#[test]
fn run_args_end_with_image_and_entrypoint() {
    let args = docker_run_args(&spec(), Member::Actor);
    let image_pos = args.iter().position(|a| a == "silexa/actor:1").unwrap();
    assert!(image_pos < args.len() - 1, "entrypoint follows the image");
    assert_eq!(args[image_pos + 1], "sh");
}

#[test]
fn interactive_argv_wraps_docker_exec() {
    let docker = DockerSubstrate::new();
    let argv = docker.interactive_exec_argv("abc123", &["codex".to_string()]);
    assert_eq!(argv, vec!["docker", "exec", "-it", "abc123", "codex"]);
}
