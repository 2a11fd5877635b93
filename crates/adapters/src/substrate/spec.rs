// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dyad spec construction.
//!
//! The spec is fully determined by [`EnsureOptions`]: both runtimes derive
//! their concrete objects (docker run args, pod manifests) from the same
//! names, labels, and mounts so a dyad looks identical regardless of
//! substrate.

use super::EnsureOptions;
use sx_core::Member;

/// Label key identifying the dyad a container belongs to.
pub const LABEL_DYAD: &str = "silexa.dyad";
/// Label key identifying which member of the dyad a container is.
pub const LABEL_MEMBER: &str = "silexa.member";

/// Stable network alias for one member: `silexa-<member>-<dyad>`.
pub fn member_alias(dyad: &str, member: Member) -> String {
    format!("silexa-{}-{}", member, dyad)
}

/// The dyad's private network name.
pub fn network_name(dyad: &str) -> String {
    format!("silexa-net-{}", dyad)
}

/// Per-dyad persistent volume holding the assistant profile.
pub fn profile_volume(dyad: &str) -> String {
    format!("silexa-profile-{}", dyad)
}

/// `key=value` label pairs for a member container.
pub fn member_labels(dyad: &str, member: Member) -> [(String, String); 2] {
    [
        (LABEL_DYAD.to_string(), dyad.to_string()),
        (LABEL_MEMBER.to_string(), member.to_string()),
    ]
}

/// One member's resolved container spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    pub name: String,
    pub image: String,
    pub alias: String,
    pub labels: Vec<(String, String)>,
    pub mounts: Vec<(String, String)>,
    /// Blocks after profile init (actor) or runs the control loop (critic).
    pub entrypoint: Vec<String>,
}

/// The full dyad spec both runtimes materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DyadSpec {
    pub dyad: String,
    pub network: String,
    pub profile_volume: String,
    pub actor: MemberSpec,
    pub critic: MemberSpec,
    /// The options this spec was built from, so a runtime can rebuild it
    /// later (pod restart) without the caller re-supplying them.
    pub options: EnsureOptions,
}

impl DyadSpec {
    /// Build the spec from ensure options.
    pub fn build(opts: &EnsureOptions) -> DyadSpec {
        let dyad = opts.dyad.clone();
        let network = network_name(&dyad);
        let volume = profile_volume(&dyad);

        let shared_mounts = vec![
            (opts.workspace_dir.clone(), "/workspace".to_string()),
            (opts.configs_dir.clone(), "/configs".to_string()),
            (volume.clone(), "/home/agent/.codex".to_string()),
        ];

        let actor = MemberSpec {
            name: member_alias(&dyad, Member::Actor),
            image: opts.actor_image.clone(),
            alias: member_alias(&dyad, Member::Actor),
            labels: member_labels(&dyad, Member::Actor).to_vec(),
            mounts: shared_mounts.clone(),
            entrypoint: vec![
                "sh".to_string(),
                "-c".to_string(),
                "silexa-profile-init && exec sleep infinity".to_string(),
            ],
        };

        let mut critic_mounts = shared_mounts;
        // The critic controls sibling containers through the substrate socket.
        critic_mounts.push((opts.substrate_socket.clone(), opts.substrate_socket.clone()));

        let critic = MemberSpec {
            name: member_alias(&dyad, Member::Critic),
            image: opts.critic_image.clone(),
            alias: member_alias(&dyad, Member::Critic),
            labels: member_labels(&dyad, Member::Critic).to_vec(),
            mounts: critic_mounts,
            entrypoint: Vec::new(),
        };

        DyadSpec { dyad, network, profile_volume: volume, actor, critic, options: opts.clone() }
    }

    pub fn member(&self, member: Member) -> &MemberSpec {
        match member {
            Member::Actor => &self.actor,
            Member::Critic => &self.critic,
        }
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
