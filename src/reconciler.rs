//! The reconciliation loop.
//!
//! A pass lists running containers, aggregates them with the bindings and
//! publishes the resulting table. Passes recompute everything from
//! scratch, so running one more than needed is harmless and a failed pass
//! is repaired by the next one.

use std::time::{Duration, Instant};

use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::aggregate::aggregate;
use crate::error::{Error, Result};
use crate::publisher::{publish, PublishReport};
use crate::runtime::ContainerRuntime;
use crate::store::RoutingStore;
use crate::types::{Binding, RuntimeEvent};

/// Summary of one successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub containers: usize,
    pub report: PublishReport,
    pub elapsed: Duration,
}

/// Owns everything a pass needs. There is one per process.
pub struct Reconciler<R, S> {
    bindings: Vec<Binding>,
    runtime: R,
    store: S,
}

impl<R, S> Reconciler<R, S>
where
    R: ContainerRuntime,
    S: RoutingStore,
{
    pub fn new(bindings: Vec<Binding>, runtime: R, store: S) -> Self {
        Self {
            bindings,
            runtime,
            store,
        }
    }

    /// Runs a single pass.
    pub async fn reconcile(&self) -> Result<PassSummary> {
        let started = Instant::now();
        let containers = self.runtime.list_running().await?;
        let table = aggregate(&self.bindings, &containers);
        debug!("Computed routes: {:?}", table);

        let report = publish(&self.store, &table).await?;
        Ok(PassSummary {
            containers: containers.len(),
            report,
            elapsed: started.elapsed(),
        })
    }

    /// Runs a pass right away, then one per received event until the queue
    /// closes. Events already queued when a pass starts are folded into it.
    ///
    /// Only returns on a fatal error; the closed queue is reported as
    /// [`Error::EventStreamEnded`].
    pub async fn run(&self, mut events: mpsc::Receiver<RuntimeEvent>) -> Result<()> {
        self.run_pass("startup").await?;

        while let Some(event) = events.recv().await {
            let mut coalesced = 0usize;
            while events.try_recv().is_ok() {
                coalesced += 1;
            }
            if coalesced > 0 {
                debug!("Coalesced {} queued events", coalesced);
            }
            self.run_pass(&event.to_string()).await?;
        }
        Err(Error::EventStreamEnded)
    }

    async fn run_pass(&self, reason: &str) -> Result<()> {
        match self.reconcile().await {
            Ok(summary) => {
                info!(
                    "Reconciled ({}): {} containers, {} domains published, {} removed in {:?}",
                    reason,
                    summary.containers,
                    summary.report.published,
                    summary.report.removed.len(),
                    summary.elapsed
                );
                Ok(())
            }
            Err(e) if e.is_pass_failure() => {
                error!("Reconciliation pass failed ({}): {}", reason, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
