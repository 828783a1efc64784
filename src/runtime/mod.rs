use crate::error::Result;
use crate::types::{Container, RuntimeEvent};
use async_trait::async_trait;
use futures_util::stream::BoxStream;

pub mod docker;
pub use docker::DockerRuntime;

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Snapshot of the running containers. Containers that vanish while
    /// being inspected are left out rather than reported as errors.
    async fn list_running(&self) -> Result<Vec<Container>>;

    /// Unfiltered stream of runtime events. The stream is not restartable;
    /// an error item or the end of the stream means the subscription is
    /// gone.
    fn events(&self) -> BoxStream<'static, Result<RuntimeEvent>>;
}
