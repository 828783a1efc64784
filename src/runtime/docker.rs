use super::ContainerRuntime;
use crate::error::{Error, Result};
use crate::types::{Container, RuntimeEvent};
use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerInspectResponse;
use bollard::system::EventsOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures_util::stream::{BoxStream, StreamExt};
use log::{debug, info};

pub struct DockerRuntime {
    docker: Docker,
    network_name: Option<String>,
}

impl DockerRuntime {
    /// Connects to the Docker daemon at `endpoint` and asks for its version, so an
    /// unreachable daemon is reported here instead of on the first pass.
    ///
    /// `unix://` URLs and bare paths use the Unix socket; `tcp://` and
    /// `http://` use plain HTTP.
    pub async fn connect(
        endpoint: &str,
        network_name: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let docker = match Endpoint::parse(endpoint)? {
            Endpoint::Unix(path) => {
                Docker::connect_with_unix(&path, timeout_secs, API_DEFAULT_VERSION)?
            }
            Endpoint::Http(addr) => {
                Docker::connect_with_http(&addr, timeout_secs, API_DEFAULT_VERSION)?
            }
        };
        let version = docker.version().await?;
        info!(
            "Connected to Docker {} at {}",
            version.version.unwrap_or_default(),
            endpoint
        );
        Ok(Self {
            docker,
            network_name,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Endpoint {
    Unix(String),
    Http(String),
}

impl Endpoint {
    fn parse(endpoint: &str) -> Result<Self> {
        if let Some(path) = endpoint.strip_prefix("unix://") {
            Ok(Endpoint::Unix(path.to_string()))
        } else if let Some(addr) = endpoint.strip_prefix("tcp://") {
            Ok(Endpoint::Http(format!("http://{}", addr)))
        } else if endpoint.starts_with("http://") {
            Ok(Endpoint::Http(endpoint.to_string()))
        } else if endpoint.starts_with('/') {
            Ok(Endpoint::Unix(endpoint.to_string()))
        } else {
            Err(Error::Config(format!(
                "Unsupported Docker endpoint: {}",
                endpoint
            )))
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_running(&self) -> Result<Vec<Container>> {
        let opts = ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        };
        let summaries = self.docker.list_containers(Some(opts)).await?;

        let mut containers = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let Some(id) = summary.id else { continue };

            let inspect = self.docker.inspect_container(&id, None).await;
            if let Some(container) = resolve(&id, inspect, self.network_name.as_deref())? {
                containers.push(container);
            }
        }
        Ok(containers)
    }

    fn events(&self) -> BoxStream<'static, Result<RuntimeEvent>> {
        self.docker
            .events(None::<EventsOptions<String>>)
            .map(|msg| {
                let event = msg.map_err(|e| Error::EventStream(e.to_string()))?;
                let actor = event
                    .actor
                    .map(|actor| {
                        actor
                            .attributes
                            .and_then(|mut attrs| attrs.remove("name"))
                            .or(actor.id)
                            .unwrap_or_default()
                    })
                    .unwrap_or_default();
                Ok(RuntimeEvent {
                    kind: event.typ.map(|t| t.to_string()).unwrap_or_default(),
                    action: event.action.unwrap_or_default(),
                    actor,
                })
            })
            .boxed()
    }
}

/// Turns one inspect result into a container. A 404 means the container
/// went away after listing, which is expected and skipped.
fn resolve(
    id: &str,
    inspect: std::result::Result<ContainerInspectResponse, bollard::errors::Error>,
    network_name: Option<&str>,
) -> Result<Option<Container>> {
    let detail = match inspect {
        Ok(detail) => detail,
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Container {} disappeared before inspection, skipping", id);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let name = match &detail.name {
        Some(name) => name.trim_start_matches('/').to_string(),
        None => return Ok(None),
    };
    match primary_address(&detail, network_name) {
        Some(address) => Ok(Some(Container::new(name, address))),
        None => {
            debug!("Container {} has no usable address, skipping", name);
            Ok(None)
        }
    }
}

/// Picks the address backends are reached on.
///
/// With a network configured, only that network counts. Otherwise the
/// default bridge address is used, falling back to the first attached
/// network (by name) that has one, since user-defined networks leave the
/// top-level address empty.
fn primary_address(
    detail: &ContainerInspectResponse,
    network_name: Option<&str>,
) -> Option<String> {
    let settings = detail.network_settings.as_ref()?;

    if let Some(network_name) = network_name {
        let net = settings.networks.as_ref()?.get(network_name)?;
        return non_empty(&net.ip_address).or_else(|| non_empty(&net.global_ipv6_address));
    }

    if let Some(ip) = non_empty(&settings.ip_address) {
        return Some(ip);
    }

    let networks = settings.networks.as_ref()?;
    let mut names: Vec<&String> = networks.keys().collect();
    names.sort();
    names.into_iter().find_map(|name| {
        let net = &networks[name];
        non_empty(&net.ip_address).or_else(|| non_empty(&net.global_ipv6_address))
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
