// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes substrate — drives the cluster orchestrator through the
//! cluster API.
//!
//! Each dyad member is one single-container pod named after its network
//! alias. Pods are discovered by the same labels the docker substrate uses,
//! so the controller cannot tell the runtimes apart. Pod restart policy is
//! `Always` (the cluster's analogue of `unless-stopped`); the per-dyad
//! profile volume is a pre-provisioned claim named like the docker volume.

use super::spec::{member_alias, DyadSpec, MemberSpec, LABEL_DYAD, LABEL_MEMBER};
use super::{DyadIds, EnsureOptions, ExecOutput, Substrate, SubstrateError};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, HostPathVolumeSource, PersistentVolumeClaimVolumeSource, Pod, PodSpec, Volume,
    VolumeMount,
};
use futures_util::SinkExt;
use kube::api::{Api, AttachParams, DeleteParams, ListParams, PostParams, TerminalSize};
use kube::Client;
use sx_core::Member;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Grace period before the cluster force-kills a deleted pod.
const RESTART_GRACE_SECS: u32 = 10;

/// Substrate adapter over the Kubernetes API.
#[derive(Clone)]
pub struct K8sSubstrate {
    client: Client,
    namespace: String,
}

impl K8sSubstrate {
    pub async fn new(namespace: impl Into<String>) -> Result<Self, SubstrateError> {
        let client = Client::try_default().await.map_err(|e| {
            SubstrateError::Runtime(format!("failed to create kube client: {}", e))
        })?;
        Ok(Self { client, namespace: namespace.into() })
    }

    fn pods(&self) -> Api<Pod> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Find one member's pod by label. `None` when absent.
    async fn member_pod(
        &self,
        dyad: &str,
        member: Member,
    ) -> Result<Option<Pod>, SubstrateError> {
        let selector = format!("{}={},{}={}", LABEL_DYAD, dyad, LABEL_MEMBER, member);
        let lp = ListParams::default().labels(&selector);
        let list = self
            .pods()
            .list(&lp)
            .await
            .map_err(|e| SubstrateError::Runtime(e.to_string()))?;
        Ok(list.items.into_iter().next())
    }

    async fn recreate_member(
        &self,
        spec: &DyadSpec,
        member: Member,
    ) -> Result<String, SubstrateError> {
        let pods = self.pods();
        let name = member_alias(&spec.dyad, member);
        let dp = DeleteParams::default().grace_period(RESTART_GRACE_SECS);
        match pods.delete(&name, &dp).await {
            Ok(_) => {}
            Err(kube::Error::Api(e)) if e.code == 404 => {}
            Err(e) => return Err(SubstrateError::Runtime(e.to_string())),
        }
        let pod = build_member_pod(spec, member);
        pods.create(&PostParams::default(), &pod)
            .await
            .map_err(|e| SubstrateError::Runtime(e.to_string()))?;
        tracing::info!(dyad = %spec.dyad, %member, pod = %name, "recreated dyad member pod");
        Ok(name)
    }
}

#[async_trait]
impl Substrate for K8sSubstrate {
    async fn dyad_ready(&self, dyad: &str) -> Result<(bool, bool), SubstrateError> {
        let actor = self.member_pod(dyad, Member::Actor).await?;
        let critic = self.member_pod(dyad, Member::Critic).await?;
        let exists = actor.is_some() && critic.is_some();
        let ready = pod_running(&actor) && pod_running(&critic);
        Ok((exists, ready))
    }

    async fn resolve_member(
        &self,
        dyad: &str,
        member: Member,
    ) -> Result<String, SubstrateError> {
        let pod = self
            .member_pod(dyad, member)
            .await?
            .ok_or_else(|| SubstrateError::NotFound(format!("{} {} pod", dyad, member)))?;
        pod.metadata
            .name
            .ok_or_else(|| SubstrateError::NotFound(format!("{} {} pod has no name", dyad, member)))
    }

    async fn restart_dyad(&self, dyad: &str) -> Result<(), SubstrateError> {
        // A bare pod cannot be restarted in place; delete with the graceful
        // window and recreate from the spec the pod carries in its labels.
        let opts = self.ensure_options_from_labels(dyad).await?;
        let spec = DyadSpec::build(&opts);
        for member in Member::ALL {
            self.recreate_member(&spec, member).await?;
        }
        Ok(())
    }

    async fn remove_dyad(&self, dyad: &str, force: bool) -> Result<(), SubstrateError> {
        let pods = self.pods();
        let dp = if force {
            DeleteParams::default().grace_period(0)
        } else {
            DeleteParams::default()
        };
        for member in Member::ALL {
            let name = member_alias(dyad, member);
            match pods.delete(&name, &dp).await {
                Ok(_) => {}
                Err(kube::Error::Api(e)) if e.code == 404 => {}
                Err(e) => return Err(SubstrateError::Runtime(e.to_string())),
            }
        }
        Ok(())
    }

    async fn ensure_dyad(&self, opts: &EnsureOptions) -> Result<DyadIds, SubstrateError> {
        let spec = DyadSpec::build(opts);
        let pods = self.pods();
        let mut ids = Vec::with_capacity(2);

        for member in Member::ALL {
            match self.member_pod(&spec.dyad, member).await? {
                Some(pod) => {
                    let phase = pod
                        .status
                        .as_ref()
                        .and_then(|s| s.phase.clone())
                        .unwrap_or_default();
                    let name = pod.metadata.name.clone().unwrap_or_default();
                    // Terminal pods are replaced; Pending/Running are left alone.
                    if phase == "Failed" || phase == "Succeeded" {
                        ids.push(self.recreate_member(&spec, member).await?);
                    } else {
                        ids.push(name);
                    }
                }
                None => {
                    let pod = build_member_pod(&spec, member);
                    let created = pods
                        .create(&PostParams::default(), &pod)
                        .await
                        .map_err(|e| SubstrateError::Runtime(e.to_string()))?;
                    ids.push(created.metadata.name.unwrap_or_default());
                }
            }
        }

        let critic = ids.pop().unwrap_or_default();
        let actor = ids.pop().unwrap_or_default();
        Ok(DyadIds { actor, critic })
    }

    async fn exec(
        &self,
        container_id: &str,
        argv: &[String],
        stdin: &[u8],
    ) -> Result<ExecOutput, SubstrateError> {
        let pods = self.pods();
        let ap = AttachParams::default().stdin(true).stdout(true).stderr(true);
        let mut attached = pods
            .exec(container_id, argv.to_vec(), &ap)
            .await
            .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;

        if let Some(mut writer) = attached.stdin() {
            writer
                .write_all(stdin)
                .await
                .map_err(|e| SubstrateError::ExecFailed(format!("stdin write failed: {}", e)))?;
            drop(writer);
        }

        let mut stdout = Vec::new();
        if let Some(mut reader) = attached.stdout() {
            reader
                .read_to_end(&mut stdout)
                .await
                .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        }
        let mut stderr = Vec::new();
        if let Some(mut reader) = attached.stderr() {
            reader
                .read_to_end(&mut stderr)
                .await
                .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        }
        attached.join().await.map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        Ok(ExecOutput { stdout, stderr, exit_code: None })
    }

    async fn exec_with_size(
        &self,
        container_id: &str,
        argv: &[String],
        rows: u16,
        cols: u16,
    ) -> Result<ExecOutput, SubstrateError> {
        let pods = self.pods();
        let ap = AttachParams::default().stdout(true).tty(true);
        let mut attached = pods
            .exec(container_id, argv.to_vec(), &ap)
            .await
            .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;

        if let Some(mut size_tx) = attached.terminal_size() {
            let _ = size_tx.send(TerminalSize { height: rows, width: cols }).await;
        }

        let mut stdout = Vec::new();
        if let Some(mut reader) = attached.stdout() {
            reader
                .read_to_end(&mut stdout)
                .await
                .map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        }
        attached.join().await.map_err(|e| SubstrateError::ExecFailed(e.to_string()))?;
        Ok(ExecOutput { stdout, stderr: Vec::new(), exit_code: None })
    }

    fn interactive_exec_argv(&self, container_id: &str, argv: &[String]) -> Vec<String> {
        let mut full = vec![
            "kubectl".to_string(),
            "exec".to_string(),
            "-n".to_string(),
            self.namespace.clone(),
            "-it".to_string(),
            container_id.to_string(),
            "--".to_string(),
        ];
        full.extend(argv.iter().cloned());
        full
    }
}

impl K8sSubstrate {
    /// Rebuild ensure options from an existing pod's annotations so restart
    /// can recreate members without the caller re-supplying them.
    async fn ensure_options_from_labels(
        &self,
        dyad: &str,
    ) -> Result<EnsureOptions, SubstrateError> {
        let pod = self
            .member_pod(dyad, Member::Actor)
            .await?
            .or(self.member_pod(dyad, Member::Critic).await?)
            .ok_or_else(|| SubstrateError::NotFound(format!("{} has no pods", dyad)))?;
        let annotations = pod.metadata.annotations.unwrap_or_default();
        let get = |key: &str| annotations.get(key).cloned().unwrap_or_default();
        Ok(EnsureOptions {
            dyad: dyad.to_string(),
            actor_image: get("silexa.io/actor-image"),
            critic_image: get("silexa.io/critic-image"),
            workspace_dir: get("silexa.io/workspace-dir"),
            configs_dir: get("silexa.io/configs-dir"),
            substrate_socket: get("silexa.io/substrate-socket"),
        })
    }
}

fn pod_running(pod: &Option<Pod>) -> bool {
    pod.as_ref()
        .and_then(|p| p.status.as_ref())
        .and_then(|s| s.phase.as_deref())
        .map(|phase| phase == "Running")
        .unwrap_or(false)
}

/// Build the pod manifest for one member of a dyad spec.
pub(crate) fn build_member_pod(spec: &DyadSpec, member: Member) -> Pod {
    let member_spec: &MemberSpec = spec.member(member);

    let mut volumes = Vec::new();
    let mut mounts = Vec::new();
    for (index, (src, dst)) in member_spec.mounts.iter().enumerate() {
        let volume_name = format!("m{}", index);
        if src == &spec.profile_volume {
            volumes.push(Volume {
                name: volume_name.clone(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: spec.profile_volume.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            });
        } else {
            volumes.push(Volume {
                name: volume_name.clone(),
                host_path: Some(HostPathVolumeSource {
                    path: src.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
        mounts.push(VolumeMount {
            name: volume_name,
            mount_path: dst.clone(),
            ..Default::default()
        });
    }

    let container = Container {
        name: member.to_string(),
        image: Some(member_spec.image.clone()),
        command: if member_spec.entrypoint.is_empty() {
            None
        } else {
            Some(member_spec.entrypoint.clone())
        },
        volume_mounts: Some(mounts),
        ..Default::default()
    };

    Pod {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(member_spec.name.clone()),
            labels: Some(member_spec.labels.iter().cloned().collect()),
            annotations: Some(
                [
                    ("silexa.io/actor-image".to_string(), spec.options.actor_image.clone()),
                    ("silexa.io/critic-image".to_string(), spec.options.critic_image.clone()),
                    (
                        "silexa.io/workspace-dir".to_string(),
                        spec.options.workspace_dir.clone(),
                    ),
                    ("silexa.io/configs-dir".to_string(), spec.options.configs_dir.clone()),
                    (
                        "silexa.io/substrate-socket".to_string(),
                        spec.options.substrate_socket.clone(),
                    ),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            restart_policy: Some("Always".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "k8s_tests.rs"]
mod tests;
