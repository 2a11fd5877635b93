// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sx-adapters: Container-substrate adapters for the Silexa dyad manager.
//!
//! The [`Substrate`] trait abstracts the container runtime behind a small
//! capability set keyed by (dyad, member). Two implementations exist: a
//! Docker runtime driven through the docker CLI, and a Kubernetes runtime
//! driven through the cluster API. The rest of the system never depends on
//! which one is active.

pub mod substrate;

pub use substrate::{
    DockerSubstrate, DyadIds, EnsureOptions, ExecOutput, K8sSubstrate, Substrate, SubstrateError,
};

#[cfg(any(test, feature = "test-support"))]
pub use substrate::fake::{FakeSubstrate, SubstrateCall};
