//! # Consistency Auditor
//!
//! Standalone batch pass over every persisted cart record.
//!
//! Each record is read, repaired through the same decode-with-defaults
//! rules the live path uses, and written back independently; one record's
//! failure never aborts the batch. Unlike the live path it never surfaces
//! per-record errors to a caller: it repairs, deletes, or logs, and
//! returns an aggregate report. Running it twice over the same store makes
//! zero further writes on the second pass.

use crate::domain::{
    decode, location_shape_valid, CartError, CartId, CartStatus, EngineConfig, RawCart,
};
use crate::ports::{CartStore, TimeSource, UserDirectory, Versioned};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One record the audit could not process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditErrorDetail {
    /// The record's cart id, when it had one.
    pub cart_id: Option<CartId>,
    /// What went wrong.
    pub message: String,
}

/// Aggregate result of one audit pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Records examined.
    pub processed: usize,
    /// Records repaired and written back.
    pub fixed: usize,
    /// Records deleted as invalid or abandoned.
    pub deleted: usize,
    /// Records already clean.
    pub skipped: usize,
    /// Per-record failures the batch continued past.
    pub errors: Vec<AuditErrorDetail>,
}

impl AuditReport {
    /// Number of records that failed.
    pub fn errored(&self) -> usize {
        self.errors.len()
    }
}

enum Outcome {
    Fixed,
    Deleted,
    Skipped,
}

/// The consistency-repair batch job.
///
/// Intended to run one instance at a time, decoupled from live traffic;
/// interleaved live writes are safe because both paths converge on the
/// same target invariants.
pub struct ConsistencyAuditor<S, U, T> {
    store: Arc<S>,
    users: Arc<U>,
    clock: Arc<T>,
    config: EngineConfig,
}

impl<S, U, T> ConsistencyAuditor<S, U, T>
where
    S: CartStore,
    U: UserDirectory,
    T: TimeSource,
{
    /// Creates an auditor with the default engine configuration.
    pub fn new(store: Arc<S>, users: Arc<U>, clock: Arc<T>) -> Self {
        Self::with_config(store, users, clock, EngineConfig::default())
    }

    /// Creates an auditor with a custom engine configuration.
    pub fn with_config(store: Arc<S>, users: Arc<U>, clock: Arc<T>, config: EngineConfig) -> Self {
        Self {
            store,
            users,
            clock,
            config,
        }
    }

    /// Scans every cart record, repairing or deleting as needed.
    ///
    /// Fails only when the store cannot list records at all; every
    /// per-record failure lands in the report instead.
    pub async fn run(&self) -> Result<AuditReport, CartError> {
        let records = self.store.find_all().await?;
        info!("Consistency audit over {} cart records", records.len());

        let mut report = AuditReport {
            processed: records.len(),
            ..AuditReport::default()
        };

        for record in records {
            let cart_id = record.value.id;
            match self.audit_record(&record).await {
                Ok(Outcome::Fixed) => report.fixed += 1,
                Ok(Outcome::Deleted) => report.deleted += 1,
                Ok(Outcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    warn!("Audit of cart {:?} failed: {}", cart_id, err);
                    report.errors.push(AuditErrorDetail {
                        cart_id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Audit complete: {} fixed, {} deleted, {} skipped, {} errored",
            report.fixed,
            report.deleted,
            report.skipped,
            report.errored()
        );
        Ok(report)
    }

    async fn audit_record(&self, record: &Versioned<RawCart>) -> Result<Outcome, CartError> {
        let raw = &record.value;
        let now = self.clock.now();
        let id = raw.id.ok_or_else(|| CartError::MalformedRecord {
            reason: "record without id".to_string(),
        })?;

        // Creator must exist; a cart without one is removed, not repaired.
        let creator = match raw.creator_ref {
            Some(creator) if self.users.exists(creator).await? => creator,
            _ => {
                info!("Cart {} has no valid creator - deleting", id);
                self.store.delete(id).await?;
                return Ok(Outcome::Deleted);
            }
        };

        // Retention: an old cart that never reached an exempt status is
        // abandoned and deleted rather than repaired.
        let created_at = raw.created_at.unwrap_or(now);
        let stored_status = raw
            .status
            .as_deref()
            .and_then(CartStatus::parse)
            .unwrap_or_default();
        if self.config.is_abandoned(created_at, stored_status, now) {
            info!(
                "Cart {} abandoned in status '{}' - deleting",
                id, stored_status
            );
            self.store.delete(id).await?;
            return Ok(Outcome::Deleted);
        }

        // A cart with an unusable location borrows the creator's.
        let creator_location = if location_shape_valid(raw.location.as_ref()) {
            None
        } else {
            match self.users.get_location(creator).await {
                Ok(location) => location,
                Err(err) => {
                    warn!("Profile location for user {} unavailable: {}", creator, err);
                    None
                }
            }
        };

        let normalized =
            decode::normalize_cart(raw, creator_location.as_ref(), now, &self.config)?;
        if normalized.fixes.is_empty() {
            return Ok(Outcome::Skipped);
        }

        debug!("Cart {} repairs: {:?}", id, normalized.fixes);
        self.store.update(&normalized.cart, record.version).await?;
        Ok(Outcome::Fixed)
    }
}
