// tests/common/mod.rs
//
// Shared fixtures: an in-process storage backend standing in for the client
// binary, a settable free-space probe and a small fast configuration.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use traffic_gen::client::{CommandOutput, StorageClient};
use traffic_gen::config::{ActorProfile, DeliveryMode, FileType, FileTypeSpec, GeneratorConfig, SizeRange};
use traffic_gen::disk::SpaceProbe;
use traffic_gen::error::CommandError;
use traffic_gen::schedule::{PeakWindow, VolumeBand};

/// Bucket/object store driven by the same verbs as the real client
#[derive(Default)]
pub struct FakeClient {
    buckets: Mutex<HashSet<String>>,
    objects: Mutex<HashMap<(String, String), u64>>,
    calls: Mutex<Vec<Vec<String>>>,
    fail_uploads: AtomicBool,
    upload_delay_ms: AtomicU64,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        self.upload_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn put_object(&self, bucket: &str, key: &str, size: u64) {
        self.buckets.lock().insert(bucket.to_string());
        self.objects.lock().insert((bucket.to_string(), key.to_string()), size);
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.objects.lock().keys().filter(|(b, _)| b == bucket).count()
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.lock().contains(bucket)
    }

    pub fn calls_with(&self, verb: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.first().map(String::as_str) == Some(verb)).count()
    }

    fn fail(args: &[String], stderr: &str) -> CommandError {
        CommandError::Failed {
            command: args.join(" "),
            exit_code: Some(1),
            stderr: stderr.to_string(),
        }
    }

    fn listing(&self, bucket: &str) -> String {
        let objects = self.objects.lock();
        let mut lines = vec![format!("Listing s3://{}/", bucket)];
        for ((b, key), size) in objects.iter() {
            if b == bucket {
                lines.push(format!("2026-10-19 12:00:00 {:>10} s3://{}/{}", size, bucket, key));
            }
        }
        lines.push(format!("Total: {} objects", lines.len() - 1));
        lines.join("\n")
    }
}

fn split_uri(uri: &str) -> Option<(String, String)> {
    let rest = uri.strip_prefix("s3://")?;
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    Some((bucket.to_string(), key.to_string()))
}

#[async_trait]
impl StorageClient for FakeClient {
    async fn execute(
        &self,
        args: &[String],
        _env: &[(String, String)],
        _timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        self.calls.lock().push(args.to_vec());
        let ok = |stdout: String| {
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout,
                stderr: String::new(),
            })
        };

        match args.first().map(String::as_str) {
            Some("mb") => {
                let (bucket, _) = split_uri(&args[1]).ok_or_else(|| Self::fail(args, "bad uri"))?;
                self.buckets.lock().insert(bucket);
                ok(String::new())
            }
            Some("ls") if args.len() == 2 => {
                let (bucket, _) = split_uri(&args[1]).ok_or_else(|| Self::fail(args, "bad uri"))?;
                if self.has_bucket(&bucket) {
                    ok(String::new())
                } else {
                    Err(Self::fail(args, "NoSuchBucket"))
                }
            }
            Some("ls") => {
                let uri = args.last().cloned().unwrap_or_default();
                let (bucket, _) = split_uri(&uri).ok_or_else(|| Self::fail(args, "bad uri"))?;
                ok(self.listing(&bucket))
            }
            Some("cp") if args[1].starts_with("s3://") => {
                let (bucket, key) = split_uri(&args[1]).ok_or_else(|| Self::fail(args, "bad uri"))?;
                let size = self
                    .objects
                    .lock()
                    .get(&(bucket, key))
                    .copied()
                    .ok_or_else(|| Self::fail(args, "NoSuchKey"))?;
                std::fs::write(&args[2], vec![0u8; size as usize]).map_err(|e| Self::fail(args, &e.to_string()))?;
                ok(String::new())
            }
            Some("cp") => {
                let delay = self.upload_delay_ms.load(Ordering::SeqCst);
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                if self.fail_uploads.load(Ordering::SeqCst) {
                    return Err(Self::fail(args, "InternalError"));
                }
                let size = std::fs::metadata(&args[1])
                    .map_err(|e| Self::fail(args, &e.to_string()))?
                    .len();
                let (bucket, key) = split_uri(&args[2]).ok_or_else(|| Self::fail(args, "bad uri"))?;
                self.objects.lock().insert((bucket, key), size);
                ok(String::new())
            }
            _ => Err(Self::fail(args, "unknown command")),
        }
    }
}

/// Free space fixed at a settable number of GB
#[derive(Clone, Default)]
pub struct StaticProbe(pub Arc<AtomicU64>);

impl StaticProbe {
    pub fn gb(gb: f64) -> Self {
        let p = Self::default();
        p.set_gb(gb);
        p
    }

    pub fn set_gb(&self, gb: f64) {
        self.0.store((gb * 1024.0 * 1024.0 * 1024.0) as u64, Ordering::SeqCst);
    }
}

impl SpaceProbe for StaticProbe {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}

fn actor(id: &str, bucket: &str, delivery: DeliveryMode) -> ActorProfile {
    let mut prefs = BTreeMap::new();
    prefs.insert(FileType::Code, 0.6);
    prefs.insert(FileType::Images, 0.4);
    ActorProfile {
        id: id.to_string(),
        description: format!("{} test persona", id),
        bucket: bucket.to_string(),
        tz_offset_hours: 0.0,
        peak_hours: PeakWindow::new(0, 24).unwrap(),
        activity_multiplier: 1.0,
        file_preferences: prefs,
        delivery,
        subfolder_templates: vec!["projects/{project}/src".to_string(), "assets/{category}".to_string()],
    }
}

/// Two actors, tiny files, ~20 actions per second each, short timeouts
pub fn fast_config(dir: &Path) -> GeneratorConfig {
    let mut file_types = BTreeMap::new();
    file_types.insert(
        FileType::Code,
        FileTypeSpec {
            extensions: vec![".rs".into(), ".py".into()],
            sizes: vec![SizeRange {
                min: 64,
                max: 2048,
                weight: 1.0,
            }],
        },
    );
    file_types.insert(
        FileType::Images,
        FileTypeSpec {
            extensions: vec![".png".into()],
            sizes: vec![SizeRange {
                min: 1024,
                max: 8192,
                weight: 1.0,
            }],
        },
    );

    let mut config = GeneratorConfig {
        duration: Duration::from_secs(2),
        temp_root: dir.join("traffic"),
        lock_path: dir.join("traffic.lock"),
        check_interval: Duration::from_millis(100),
        report_interval: Duration::from_millis(500),
        startup_timeout: Duration::from_secs(5),
        file_types,
        actors: vec![
            actor("alice", "alice-bucket", DeliveryMode::Env),
            actor("bob", "shared-bucket", DeliveryMode::Files),
        ],
        ..GeneratorConfig::default()
    };
    config.traffic.peak_ops_per_minute = VolumeBand {
        min: 1200.0,
        max: 1200.0,
    };
    config.traffic.off_peak_ops_per_minute = VolumeBand {
        min: 1200.0,
        max: 1200.0,
    };
    config.traffic.upload_ratio = 0.7;
    config.disk.check_interval = Duration::from_millis(50);
    config.shutdown.drain_timeout = Duration::from_millis(500);
    config.shutdown.actor_stop_timeout = Duration::from_secs(5);
    config.shutdown.grace_period = Duration::ZERO;
    config.client.upload_timeout = Duration::from_secs(5);
    config.client.list_timeout = Duration::from_secs(5);
    config
}
