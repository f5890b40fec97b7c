// src/buckets.rs
//
// Process-wide bucket existence cache
//
// Check-then-create runs under one async mutex held across the probe and the
// create, so two actors sharing a bucket never race to create it, and each
// bucket gets at most one create attempt per process.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct BucketRegistry {
    known: Mutex<HashSet<String>>,
    creation_attempts: AtomicU64,
}

impl BucketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `bucket` is usable.
    ///
    /// `probe` reports whether the bucket already exists; `create` attempts
    /// to make it. A failed create is logged and the bucket is still marked
    /// as existing (the usual cause is a concurrent owner or an
    /// already-owned bucket), so this always resolves to true.
    pub async fn ensure_exists<P, PF, C, CF, E>(&self, bucket: &str, probe: P, create: C) -> bool
    where
        P: FnOnce() -> PF,
        PF: Future<Output = bool>,
        C: FnOnce() -> CF,
        CF: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        let mut known = self.known.lock().await;
        if known.contains(bucket) {
            debug!(bucket, "bucket already confirmed");
            return true;
        }

        if probe().await {
            debug!(bucket, "bucket exists");
            known.insert(bucket.to_string());
            return true;
        }

        info!(bucket, "creating bucket");
        self.creation_attempts.fetch_add(1, Ordering::Relaxed);
        match create().await {
            Ok(()) => info!(bucket, "created bucket"),
            Err(e) => debug!(bucket, "bucket creation failed, assuming it exists: {}", e),
        }
        known.insert(bucket.to_string());
        true
    }

    pub async fn is_known(&self, bucket: &str) -> bool {
        self.known.lock().await.contains(bucket)
    }

    pub fn creation_attempts(&self) -> u64 {
        self.creation_attempts.load(Ordering::Relaxed)
    }
}
