//! Create-or-update driver for a directory of table specs.
//!
//! Every table is reconciled on its own task, with a semaphore bounding how
//! many talk to the store at once. Failure handling is per severity: settings
//! updates only log, a failed lookup skips that table but lets the rest of
//! the batch finish, and a failed creation aborts the whole run.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::ProvisionConfig;

use super::spec::{self, TableSpec};
use super::store::{StoreError, TableStore};
use super::ProvisionError;

/// Attribute that carries the expiry timestamp on every table.
const TIME_TO_LIVE_ATTRIBUTE: &str = "ttl";

/// Reconciles declared table specs against the backing store.
pub struct Reconciler<S> {
    store: Arc<S>,
    table_prefix: String,
    point_in_time_recovery: bool,
    concurrency: usize,
}

impl<S> Clone for Reconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table_prefix: self.table_prefix.clone(),
            point_in_time_recovery: self.point_in_time_recovery,
            concurrency: self.concurrency,
        }
    }
}

impl<S: TableStore + 'static> Reconciler<S> {
    /// Point-in-time recovery is only maintained for production deployments;
    /// everything else about the reconciler is environment independent.
    pub fn new(store: S, config: &ProvisionConfig) -> Self {
        Self {
            store: Arc::new(store),
            table_prefix: config.table_prefix(),
            point_in_time_recovery: config.production(),
            concurrency: config.concurrency,
        }
    }

    /// Reconcile every spec in `dir` and return the number of tables this
    /// run created. A creation failure aborts the run immediately; any other
    /// table failure is reported after the remaining tables have finished.
    pub async fn reconcile_dir(&self, dir: &Path) -> Result<usize, ProvisionError> {
        let specs = spec::load_table_specs(dir)?;
        info!("reconciling {} tables", specs.len());

        // The counter is scoped to the run so a rerun starts from zero.
        let created = Arc::new(AtomicUsize::new(0));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for table_spec in specs {
            let semaphore = Arc::clone(&semaphore);
            let created = Arc::clone(&created);
            let reconciler = self.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = semaphore.acquire_owned().await.ok();
                reconciler.reconcile_spec(table_spec, &created).await
            });
        }

        let mut failure: Option<ProvisionError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if err.batch_fatal() {
                        return Err(err);
                    }
                    error!("{err}");
                    failure.get_or_insert(err);
                }
                Err(err) => return Err(ProvisionError::Task(err)),
            }
        }

        match failure {
            None => Ok(created.load(Ordering::Relaxed)),
            Some(err) => Err(err),
        }
    }

    /// Bring a single declared table in line with the store. The spec's name
    /// is bare; the deployment prefix is applied here.
    async fn reconcile_spec(
        &self,
        mut spec: TableSpec,
        created: &AtomicUsize,
    ) -> Result<(), ProvisionError> {
        spec.table_name = format!("{}{}", self.table_prefix, spec.table_name);

        match self.store.find_table(&spec.table_name).await? {
            Some(identity) => {
                info!("table exists: {} {:?}", spec.table_name, identity);
                self.reconcile_settings(&spec.table_name).await;
            }
            None => {
                let identity = self.store.create_table(&spec).await?;
                info!("table created: {} {:?}", spec.table_name, identity);
                created.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(())
    }

    /// Settings are converged on a best-effort basis. A failure here leaves
    /// the table itself intact, so it is logged and swallowed.
    async fn reconcile_settings(&self, name: &str) {
        if let Err(err) = self.reconcile_time_to_live(name).await {
            error!("{err}");
        }
        if !self.point_in_time_recovery {
            return;
        }
        if let Err(err) = self.reconcile_point_in_time_recovery(name).await {
            error!("{err}");
        }
    }

    async fn reconcile_time_to_live(&self, name: &str) -> Result<(), StoreError> {
        if self.store.time_to_live_disabled(name).await? {
            info!("enable time to live for table {name}");
            self.store
                .enable_time_to_live(name, TIME_TO_LIVE_ATTRIBUTE)
                .await?;
        }
        Ok(())
    }

    async fn reconcile_point_in_time_recovery(&self, name: &str) -> Result<(), StoreError> {
        if self.store.point_in_time_recovery_disabled(name).await? {
            info!("enable point-in-time recovery for table {name}");
            self.store.enable_point_in_time_recovery(name).await?;
        }
        Ok(())
    }
}
