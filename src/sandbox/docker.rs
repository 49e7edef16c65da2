//! Docker Engine implementation of [`ContainerRuntime`]
//!
//! Talks to the local daemon through bollard. Containers are created detached
//! with CPU and memory limits and labelled so leftovers can be found.

use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogOutput, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::Docker;
use futures_util::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::runtime::{
    ContainerRuntime, ContainerSpec, ContainerState, ContainerStatus, SandboxError,
};

/// Prefix of generated container names
const NAME_PREFIX: &str = "chatgate-sandbox";

/// Container runtime backed by the local Docker daemon
#[derive(Clone)]
pub struct DockerRuntime {
    client: Docker,
}

impl DockerRuntime {
    /// Connect using the platform defaults (DOCKER_HOST or the local socket)
    pub fn connect() -> Result<Self, SandboxError> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self { client })
    }

    /// Check that the daemon answers
    pub async fn ping(&self) -> Result<(), SandboxError> {
        self.client.ping().await?;
        Ok(())
    }

    fn container_config(spec: &ContainerSpec) -> Config<String> {
        let host_config = HostConfig {
            memory: Some(spec.limits.memory_bytes as i64),
            nano_cpus: Some(spec.limits.nano_cpus()),
            ..Default::default()
        };

        Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.command.clone()),
            labels: Some(spec.labels.clone()),
            host_config: Some(host_config),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn image_exists(&self, image: &str) -> Result<bool, SandboxError> {
        match self.client.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), SandboxError> {
        info!(image, "Pulling image");

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut progress = self.client.create_image(Some(options), None, None);

        let mut last_status = String::new();
        while let Some(update) = progress.next().await {
            let update = update.map_err(|e| SandboxError::ImagePull {
                image: image.to_string(),
                reason: e.to_string(),
            })?;
            if let Some(error) = update.error {
                return Err(SandboxError::ImagePull {
                    image: image.to_string(),
                    reason: error,
                });
            }
            if let Some(status) = update.status {
                if status != last_status {
                    debug!(image, status = %status, "Pull progress");
                    last_status = status;
                }
            }
        }

        info!(image, "Image pulled");
        Ok(())
    }

    async fn run_detached(&self, spec: &ContainerSpec) -> Result<String, SandboxError> {
        let options = CreateContainerOptions {
            name: format!("{}-{}", NAME_PREFIX, Uuid::now_v7()),
            platform: None,
        };
        let container = self
            .client
            .create_container(Some(options), Self::container_config(spec))
            .await?;
        debug!(container_id = %container.id, image = %spec.image, "Container created");

        if let Err(e) = self
            .client
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
        {
            warn!(container_id = %container.id, error = %e, "Start failed, removing container");
            if let Err(cleanup) = self.remove(&container.id).await {
                warn!(container_id = %container.id, error = %cleanup, "Cleanup after failed start also failed");
            }
            return Err(e.into());
        }

        Ok(container.id)
    }

    async fn inspect(&self, id: &str) -> Result<ContainerStatus, SandboxError> {
        let inspect = self.client.inspect_container(id, None).await?;
        let state = inspect
            .state
            .as_ref()
            .ok_or_else(|| SandboxError::NoState(id.to_string()))?;

        let status = state
            .status
            .as_ref()
            .map(|s| s.as_ref())
            .unwrap_or("unknown");

        Ok(ContainerStatus {
            state: ContainerState::from_docker(status),
            exit_code: state.exit_code,
        })
    }

    async fn logs(&self, id: &str) -> Result<String, SandboxError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut output = Vec::new();
        let mut stream = self.client.logs(id, Some(options));
        while let Some(chunk) = stream.next().await {
            match chunk? {
                LogOutput::StdOut { message }
                | LogOutput::StdErr { message }
                | LogOutput::Console { message } => output.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }

        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    async fn stop(&self, id: &str, grace: Duration) -> Result<(), SandboxError> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.client.stop_container(id, Some(options)).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), SandboxError> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        self.client.remove_container(id, Some(options)).await?;
        Ok(())
    }
}
