//! Reconciliation
//!
//! Drives the rule controller from declared rules and tracked state:
//! refresh, plan, apply, destroy and import. State is saved after every
//! completed step so a failure never loses finished work.

use crate::dataarts::{RuleResource, RuleState};
use crate::manifest::{valid_address, Manifest};
use crate::plan::{plan_rule, Plan, PlanAction};
use crate::state::StateStore;
use anyhow::{bail, Context, Result};
use std::fmt;

/// Outcome of a refresh
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    /// Rules that no longer exist remotely and were dropped from state
    pub dropped: Vec<String>,
}

/// Counts of applied changes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Apply complete! Resources: {} created, {} updated, {} replaced, {} destroyed.",
            self.created, self.updated, self.replaced, self.deleted
        )
    }
}

pub struct Reconciler<'a> {
    resource: RuleResource<'a>,
    store: StateStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(resource: RuleResource<'a>, store: StateStore) -> Self {
        Self { resource, store }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Re-read every tracked rule, dropping the ones that are gone
    pub async fn refresh(&mut self) -> Result<RefreshReport> {
        let mut report = RefreshReport::default();

        for address in self.store.addresses() {
            let Some(prior) = self.store.get(&address).cloned() else {
                continue;
            };

            match self.resource.read(&prior.locator()).await {
                Ok(mut current) => {
                    if current.secrecy_level_id.is_empty() {
                        current.secrecy_level_id = prior.secrecy_level_id;
                    }
                    self.store.insert(&address, current);
                    report.refreshed.push(address);
                }
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Rule {} ({}) no longer exists, removing from state", address, prior.id);
                    self.store.remove(&address);
                    report.dropped.push(address);
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e).context(format!("Failed to refresh {}", address)));
                }
            }
        }

        self.store.save()?;
        Ok(report)
    }

    /// Plan every declared rule, plus deletes for tracked rules no longer declared
    pub fn plan(&self, manifest: &Manifest) -> Vec<Plan> {
        let default_region = self.resource.config().default_region();

        let deletes = self
            .store
            .addresses()
            .into_iter()
            .filter(|address| !manifest.rules.contains_key(address))
            .map(|address| Plan {
                address,
                action: PlanAction::Delete,
            });

        let declared = manifest.rules.iter().map(|(address, rule)| Plan {
            address: address.clone(),
            action: plan_rule(rule, self.store.get(address), default_region),
        });

        deletes.chain(declared).collect()
    }

    /// Refresh, plan and execute every change
    pub async fn apply(&mut self, manifest: &Manifest) -> Result<ApplySummary> {
        self.refresh().await?;

        let mut summary = ApplySummary::default();
        for plan in self.plan(manifest) {
            match plan.action {
                PlanAction::NoChange => {}
                PlanAction::Create => {
                    let rule = &manifest.rules[&plan.address];
                    let state = self
                        .resource
                        .create(rule)
                        .await
                        .with_context(|| format!("Failed to create {}", plan.address))?;
                    self.track(&plan.address, state)?;
                    summary.created += 1;
                }
                PlanAction::Update { .. } => {
                    let rule = &manifest.rules[&plan.address];
                    let locator = self.tracked(&plan.address)?.locator();
                    let state = self
                        .resource
                        .update(&locator, rule)
                        .await
                        .with_context(|| format!("Failed to update {}", plan.address))?;
                    self.track(&plan.address, state)?;
                    summary.updated += 1;
                }
                PlanAction::Replace { .. } => {
                    let rule = &manifest.rules[&plan.address];
                    self.delete_tracked(&plan.address).await?;
                    let state = self
                        .resource
                        .create(rule)
                        .await
                        .with_context(|| format!("Failed to create {}", plan.address))?;
                    self.track(&plan.address, state)?;
                    summary.replaced += 1;
                }
                PlanAction::Delete => {
                    self.delete_tracked(&plan.address).await?;
                    summary.deleted += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Delete every tracked rule, or only `target`
    ///
    /// Rules already gone remotely are dropped by the refresh and not counted.
    pub async fn destroy(&mut self, target: Option<&str>) -> Result<usize> {
        self.refresh().await?;

        let addresses = match target {
            Some(address) => {
                self.tracked(address)?;
                vec![address.to_string()]
            }
            None => self.store.addresses(),
        };

        for address in &addresses {
            self.delete_tracked(address).await?;
        }
        Ok(addresses.len())
    }

    /// Import an existing rule (`<workspace_id>/<id>`) under `address`
    pub async fn import(&mut self, address: &str, external_id: &str) -> Result<&RuleState> {
        if !valid_address(address) {
            bail!("invalid rule address {:?}: use letters, digits, '_' and '-'", address);
        }
        if self.store.get(address).is_some() {
            bail!("{} is already tracked; destroy or remove it before importing", address);
        }

        let locator = self.resource.import(external_id)?;
        let state = match self.resource.read(&locator).await {
            Ok(state) => state,
            Err(e) if e.is_not_found() => {
                bail!("Cannot import non-existent remote object {}", external_id)
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context(format!("Failed to import {}", external_id)))
            }
        };

        self.track(address, state)?;
        self.tracked(address)
    }

    fn tracked(&self, address: &str) -> Result<&RuleState> {
        self.store
            .get(address)
            .with_context(|| format!("{} is not tracked in {}", address, self.store.path().display()))
    }

    fn track(&mut self, address: &str, state: RuleState) -> Result<()> {
        self.store.insert(address, state);
        self.store.save()
    }

    async fn delete_tracked(&mut self, address: &str) -> Result<()> {
        let locator = self.tracked(address)?.locator();
        self.resource
            .delete(&locator)
            .await
            .with_context(|| format!("Failed to delete {}", address))?;
        self.store.remove(address);
        self.store.save()
    }
}
