// src/config.rs
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::{PeakWindow, VolumeBand};

/// Top-level generator configuration.
///
/// Every field has a default, so an empty YAML document (or no file at all)
/// yields the built-in ten-persona setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total wall time to run (e.g. "30m", "12h"). Defaults to 12h.
    #[serde(default = "default_duration", with = "humantime_serde")]
    pub duration: Duration,

    /// Shared temp root; one subdirectory per actor
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// Advisory lock file guaranteeing one generator per host
    #[serde(default = "default_lock_path")]
    pub lock_path: PathBuf,

    /// How often the supervisor checks the run deadline
    #[serde(default = "default_check_interval", with = "humantime_serde")]
    pub check_interval: Duration,

    /// Periodic metrics report interval
    #[serde(default = "default_report_interval", with = "humantime_serde")]
    pub report_interval: Duration,

    /// Upper bound on waiting for all actors to finish setup
    #[serde(default = "default_startup_timeout", with = "humantime_serde")]
    pub startup_timeout: Duration,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub traffic: TrafficConfig,

    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub high_volume: HighVolumeConfig,

    #[serde(default)]
    pub disk: DiskConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    /// Extensions and size distribution per file type
    #[serde(default = "default_file_types")]
    pub file_types: BTreeMap<FileType, FileTypeSpec>,

    /// Simulated users
    #[serde(default = "default_actors")]
    pub actors: Vec<ActorProfile>,
}

/// Artifact content families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Code,
    Documents,
    Images,
    Archives,
    Media,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Code,
        FileType::Documents,
        FileType::Images,
        FileType::Archives,
        FileType::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Code => "code",
            FileType::Documents => "documents",
            FileType::Images => "images",
            FileType::Archives => "archives",
            FileType::Media => "media",
        }
    }

    /// Text types get templated content; the rest get random bytes
    pub fn is_text(&self) -> bool {
        matches!(self, FileType::Code | FileType::Documents)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive byte range with a relative selection weight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypeSpec {
    pub extensions: Vec<String>,
    pub sizes: Vec<SizeRange>,
}

/// How an actor hands credentials and telemetry settings to the storage client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Environment variables on each child process
    #[default]
    #[serde(alias = "env_vars")]
    Env,
    /// Isolated credential/config files under the actor directory
    #[serde(alias = "config_file")]
    Files,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Env => f.write_str("env"),
            DeliveryMode::Files => f.write_str("files"),
        }
    }
}

/// One simulated user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorProfile {
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Destination bucket (created on first use)
    pub bucket: String,

    /// Hours east of UTC; fractional offsets like 5.5 are allowed
    #[serde(default)]
    pub tz_offset_hours: f64,

    /// `[start, end)` in local hours; `start > end` wraps past midnight
    pub peak_hours: PeakWindow,

    #[serde(default = "default_activity_multiplier")]
    pub activity_multiplier: f64,

    /// Relative weights; need not sum to 1
    pub file_preferences: BTreeMap<FileType, f64>,

    #[serde(default)]
    pub delivery: DeliveryMode,

    /// Ordered `{placeholder}` templates; empty means a single `files` folder
    #[serde(default)]
    pub subfolder_templates: Vec<String>,
}

/// Storage client invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_access_key")]
    pub access_key: String,

    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    #[serde(default = "default_true")]
    pub otel_enabled: bool,

    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,

    #[serde(default = "default_loki_endpoint")]
    pub loki_endpoint: String,

    /// Timeout for `cp` (both directions)
    #[serde(default = "default_transfer_timeout", with = "humantime_serde")]
    pub upload_timeout: Duration,

    /// Timeout for `ls` and `mb`
    #[serde(default = "default_list_timeout", with = "humantime_serde")]
    pub list_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            binary: default_client_binary(),
            endpoint: default_endpoint(),
            region: default_region(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            otel_enabled: true,
            otlp_endpoint: default_otlp_endpoint(),
            loki_endpoint: default_loki_endpoint(),
            upload_timeout: default_transfer_timeout(),
            list_timeout: default_list_timeout(),
        }
    }
}

/// Request-rate shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Ops/min band used when activity is above 1.0
    #[serde(default = "default_peak_band")]
    pub peak_ops_per_minute: VolumeBand,

    #[serde(default = "default_off_peak_band")]
    pub off_peak_ops_per_minute: VolumeBand,

    /// Probability that an action is an upload
    #[serde(default = "default_upload_ratio")]
    pub upload_ratio: f64,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            peak_ops_per_minute: default_peak_band(),
            off_peak_ops_per_minute: default_off_peak_band(),
            upload_ratio: default_upload_ratio(),
        }
    }
}

/// Size-derived retention classes (labelled and counted, never enforced)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Files strictly larger than this many bytes are `large`
    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,

    #[serde(default = "default_regular_ttl", with = "humantime_serde")]
    pub regular_ttl: Duration,

    #[serde(default = "default_large_ttl", with = "humantime_serde")]
    pub large_ttl: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: default_large_file_threshold(),
            regular_ttl: default_regular_ttl(),
            large_ttl: default_large_ttl(),
        }
    }
}

/// Bucket population settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighVolumeConfig {
    /// Successful uploads per actor after which uploads are skipped
    #[serde(default = "default_target_files")]
    pub target_files_per_bucket: u64,

    /// Boost for the smallest size range: weight x (1 + bias)
    #[serde(default = "default_small_file_bias")]
    pub small_file_bias: f64,

    #[serde(default = "default_true")]
    pub subfolders_enabled: bool,

    #[serde(default = "default_files_per_subfolder")]
    pub files_per_subfolder: u64,
}

impl Default for HighVolumeConfig {
    fn default() -> Self {
        Self {
            target_files_per_bucket: default_target_files(),
            small_file_bias: default_small_file_bias(),
            subfolders_enabled: true,
            files_per_subfolder: default_files_per_subfolder(),
        }
    }
}

/// Free-space thresholds in GB (1024^3 bytes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskConfig {
    #[serde(default = "default_disk_warning_gb")]
    pub warning_gb: f64,

    #[serde(default = "default_disk_stop_gb")]
    pub stop_gb: f64,

    #[serde(default = "default_disk_emergency_gb")]
    pub emergency_gb: f64,

    #[serde(default = "default_disk_check_interval", with = "humantime_serde")]
    pub check_interval: Duration,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            warning_gb: default_disk_warning_gb(),
            stop_gb: default_disk_stop_gb(),
            emergency_gb: default_disk_emergency_gb(),
            check_interval: default_disk_check_interval(),
        }
    }
}

/// Bounded waits used by the shutdown sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    #[serde(default = "default_drain_timeout", with = "humantime_serde")]
    pub drain_timeout: Duration,

    #[serde(default = "default_actor_stop_timeout", with = "humantime_serde")]
    pub actor_stop_timeout: Duration,

    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout: default_drain_timeout(),
            actor_stop_timeout: default_actor_stop_timeout(),
            grace_period: default_grace_period(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            temp_root: default_temp_root(),
            lock_path: default_lock_path(),
            check_interval: default_check_interval(),
            report_interval: default_report_interval(),
            startup_timeout: default_startup_timeout(),
            client: ClientConfig::default(),
            traffic: TrafficConfig::default(),
            retention: RetentionConfig::default(),
            high_volume: HighVolumeConfig::default(),
            disk: DiskConfig::default(),
            shutdown: ShutdownConfig::default(),
            file_types: default_file_types(),
            actors: default_actors(),
        }
    }
}

impl GeneratorConfig {
    /// Load from a YAML file, or fall back to the built-in configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {}", p.display()))?;
                Self::from_yaml(&text)
                    .with_context(|| format!("failed to parse config file {}", p.display()))?
            }
            None => Self::default(),
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn file_type(&self, t: FileType) -> Option<&FileTypeSpec> {
        self.file_types.get(&t)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actors.is_empty() {
            return Err(ConfigError::NoActors);
        }

        for (t, spec) in &self.file_types {
            validate_file_type(*t, spec)?;
        }

        let mut seen = HashSet::new();
        for actor in &self.actors {
            if !seen.insert(actor.id.as_str()) {
                return Err(ConfigError::DuplicateActor(actor.id.clone()));
            }
            self.validate_actor(actor)?;
        }

        for (name, band) in [
            ("peak_ops_per_minute", &self.traffic.peak_ops_per_minute),
            ("off_peak_ops_per_minute", &self.traffic.off_peak_ops_per_minute),
        ] {
            if !(band.min > 0.0 && band.min.is_finite() && band.max.is_finite()) || band.min > band.max {
                return Err(ConfigError::Invalid(format!(
                    "traffic.{}: need 0 < min <= max, got {}..{}",
                    name, band.min, band.max
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.traffic.upload_ratio) {
            return Err(ConfigError::Invalid(format!(
                "traffic.upload_ratio must be within [0, 1], got {}",
                self.traffic.upload_ratio
            )));
        }

        let d = &self.disk;
        if !(d.emergency_gb >= 0.0 && d.emergency_gb <= d.stop_gb && d.stop_gb <= d.warning_gb) {
            return Err(ConfigError::Invalid(format!(
                "disk thresholds must satisfy 0 <= emergency <= stop <= warning, got {}/{}/{}",
                d.emergency_gb, d.stop_gb, d.warning_gb
            )));
        }

        let hv = &self.high_volume;
        if !(hv.small_file_bias >= 0.0 && hv.small_file_bias.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "high_volume.small_file_bias must be >= 0, got {}",
                hv.small_file_bias
            )));
        }
        if hv.files_per_subfolder == 0 {
            return Err(ConfigError::Invalid("high_volume.files_per_subfolder must be > 0".into()));
        }

        for (name, value) in [
            ("check_interval", self.check_interval),
            ("report_interval", self.report_interval),
            ("disk.check_interval", self.disk.check_interval),
            ("client.upload_timeout", self.client.upload_timeout),
            ("client.list_timeout", self.client.list_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::Invalid(format!("{} must be non-zero", name)));
            }
        }

        Ok(())
    }

    fn validate_actor(&self, actor: &ActorProfile) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidActor {
            actor: actor.id.clone(),
            reason,
        };

        // The id becomes a directory name under the temp root
        if actor.id.is_empty()
            || actor.id == "."
            || actor.id == ".."
            || actor.id.contains(['/', '\\'])
        {
            return Err(invalid("id must be a non-empty single path component".into()));
        }
        if actor.bucket.is_empty() {
            return Err(invalid("bucket must not be empty".into()));
        }
        if !(actor.activity_multiplier > 0.0 && actor.activity_multiplier.is_finite()) {
            return Err(invalid(format!(
                "activity_multiplier must be > 0, got {}",
                actor.activity_multiplier
            )));
        }
        if !(-12.0..=14.0).contains(&actor.tz_offset_hours) {
            return Err(invalid(format!(
                "tz_offset_hours {} outside -12..=14",
                actor.tz_offset_hours
            )));
        }

        let mut any_positive = false;
        for (t, w) in &actor.file_preferences {
            if !w.is_finite() || *w < 0.0 {
                return Err(invalid(format!("preference weight for {} must be >= 0", t)));
            }
            if !self.file_types.contains_key(t) {
                return Err(invalid(format!("preference for {} has no file type definition", t)));
            }
            any_positive |= *w > 0.0;
        }
        if !any_positive {
            return Err(invalid("file_preferences need at least one positive weight".into()));
        }
        Ok(())
    }
}

fn validate_file_type(t: FileType, spec: &FileTypeSpec) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidFileType {
        file_type: t.to_string(),
        reason,
    };
    if spec.extensions.is_empty() {
        return Err(invalid("at least one extension required".into()));
    }
    if spec.sizes.is_empty() {
        return Err(invalid("at least one size range required".into()));
    }
    for r in &spec.sizes {
        if r.min > r.max {
            return Err(invalid(format!("size range {}..{} is inverted", r.min, r.max)));
        }
        if !r.weight.is_finite() || r.weight < 0.0 {
            return Err(invalid(format!("size range weight {} must be >= 0", r.weight)));
        }
    }
    if !spec.sizes.iter().any(|r| r.weight > 0.0) {
        return Err(invalid("size ranges need at least one positive weight".into()));
    }
    Ok(())
}

// Default value functions

fn default_duration() -> Duration {
    crate::constants::DEFAULT_RUN_DURATION
}

fn default_temp_root() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_TEMP_ROOT)
}

fn default_lock_path() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_LOCK_PATH)
}

fn default_check_interval() -> Duration {
    crate::constants::DEFAULT_CHECK_INTERVAL
}

fn default_report_interval() -> Duration {
    crate::constants::DEFAULT_REPORT_INTERVAL
}

fn default_startup_timeout() -> Duration {
    crate::constants::DEFAULT_STARTUP_TIMEOUT
}

fn default_client_binary() -> PathBuf {
    PathBuf::from(crate::constants::DEFAULT_CLIENT_BINARY)
}

fn default_endpoint() -> String {
    crate::constants::DEFAULT_ENDPOINT.to_string()
}

fn default_region() -> String {
    crate::constants::DEFAULT_REGION.to_string()
}

fn default_access_key() -> String {
    crate::constants::DEFAULT_ACCESS_KEY.to_string()
}

fn default_secret_key() -> String {
    crate::constants::DEFAULT_SECRET_KEY.to_string()
}

fn default_otlp_endpoint() -> String {
    crate::constants::DEFAULT_OTLP_ENDPOINT.to_string()
}

fn default_loki_endpoint() -> String {
    crate::constants::DEFAULT_LOKI_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_transfer_timeout() -> Duration {
    crate::constants::DEFAULT_TRANSFER_TIMEOUT
}

fn default_list_timeout() -> Duration {
    crate::constants::DEFAULT_LIST_TIMEOUT
}

fn default_peak_band() -> VolumeBand {
    VolumeBand {
        min: crate::constants::PEAK_VOLUME_MIN,
        max: crate::constants::PEAK_VOLUME_MAX,
    }
}

fn default_off_peak_band() -> VolumeBand {
    VolumeBand {
        min: crate::constants::OFF_PEAK_VOLUME_MIN,
        max: crate::constants::OFF_PEAK_VOLUME_MAX,
    }
}

fn default_upload_ratio() -> f64 {
    crate::constants::DEFAULT_UPLOAD_RATIO
}

fn default_large_file_threshold() -> u64 {
    crate::constants::LARGE_FILE_THRESHOLD
}

fn default_regular_ttl() -> Duration {
    crate::constants::REGULAR_FILE_TTL
}

fn default_large_ttl() -> Duration {
    crate::constants::LARGE_FILE_TTL
}

fn default_target_files() -> u64 {
    crate::constants::DEFAULT_TARGET_FILES_PER_BUCKET
}

fn default_small_file_bias() -> f64 {
    crate::constants::DEFAULT_SMALL_FILE_BIAS
}

fn default_files_per_subfolder() -> u64 {
    crate::constants::DEFAULT_FILES_PER_SUBFOLDER
}

fn default_disk_warning_gb() -> f64 {
    crate::constants::DEFAULT_DISK_WARNING_GB
}

fn default_disk_stop_gb() -> f64 {
    crate::constants::DEFAULT_DISK_STOP_GB
}

fn default_disk_emergency_gb() -> f64 {
    crate::constants::DEFAULT_DISK_EMERGENCY_GB
}

fn default_disk_check_interval() -> Duration {
    crate::constants::DEFAULT_DISK_CHECK_INTERVAL
}

fn default_drain_timeout() -> Duration {
    crate::constants::DEFAULT_DRAIN_TIMEOUT
}

fn default_actor_stop_timeout() -> Duration {
    crate::constants::DEFAULT_ACTOR_STOP_TIMEOUT
}

fn default_grace_period() -> Duration {
    crate::constants::DEFAULT_GRACE_PERIOD
}

fn default_activity_multiplier() -> f64 {
    1.0
}

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

fn file_type_spec(extensions: &[&str], sizes: [(u64, u64, f64); 3]) -> FileTypeSpec {
    FileTypeSpec {
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        sizes: sizes
            .iter()
            .map(|&(min, max, weight)| SizeRange { min, max, weight })
            .collect(),
    }
}

/// Built-in file type table
pub fn default_file_types() -> BTreeMap<FileType, FileTypeSpec> {
    BTreeMap::from([
        (
            FileType::Images,
            file_type_spec(
                &[".jpg", ".png", ".gif", ".svg", ".bmp", ".webp", ".tiff"],
                [(KB, 500 * KB, 0.80), (500 * KB, 5 * MB, 0.15), (5 * MB, 20 * MB, 0.05)],
            ),
        ),
        (
            FileType::Documents,
            file_type_spec(
                &[".pdf", ".docx", ".txt", ".md", ".xlsx", ".pptx", ".csv", ".rtf"],
                [(KB, 100 * KB, 0.80), (100 * KB, 2 * MB, 0.15), (2 * MB, 10 * MB, 0.05)],
            ),
        ),
        (
            FileType::Code,
            file_type_spec(
                &[
                    ".py", ".js", ".html", ".css", ".rs", ".go", ".java", ".cpp", ".c", ".json",
                    ".xml", ".yaml", ".toml",
                ],
                [(100, 10 * KB, 0.85), (10 * KB, 100 * KB, 0.12), (100 * KB, 500 * KB, 0.03)],
            ),
        ),
        (
            FileType::Archives,
            file_type_spec(
                &[".zip", ".tar.gz", ".rar", ".7z", ".tar", ".gz"],
                [(100 * KB, 5 * MB, 0.70), (5 * MB, 50 * MB, 0.25), (50 * MB, 200 * MB, 0.05)],
            ),
        ),
        (
            FileType::Media,
            file_type_spec(
                &[".mp4", ".avi", ".mov", ".mkv", ".mp3", ".wav", ".flac", ".ogg"],
                [(500 * KB, 10 * MB, 0.75), (10 * MB, 100 * MB, 0.20), (100 * MB, 500 * MB, 0.05)],
            ),
        ),
    ])
}

#[allow(clippy::too_many_arguments)]
fn persona(
    id: &str,
    description: &str,
    bucket: &str,
    tz_offset_hours: f64,
    peak: (u8, u8),
    activity_multiplier: f64,
    prefs: [(FileType, f64); 5],
    delivery: DeliveryMode,
    templates: &[&str],
) -> ActorProfile {
    ActorProfile {
        id: id.to_string(),
        description: description.to_string(),
        bucket: bucket.to_string(),
        tz_offset_hours,
        peak_hours: PeakWindow {
            start: peak.0,
            end: peak.1,
        },
        activity_multiplier,
        file_preferences: prefs.into_iter().collect(),
        delivery,
        subfolder_templates: templates.iter().map(|t| t.to_string()).collect(),
    }
}

/// Built-in personas
pub fn default_actors() -> Vec<ActorProfile> {
    use DeliveryMode::{Env, Files};
    use FileType::*;

    vec![
        persona(
            "alice-dev",
            "Software developer - code, docs, small images",
            "alice-dev-workspace",
            0.0,
            (9, 17),
            1.5,
            [(Code, 0.4), (Documents, 0.3), (Images, 0.1), (Archives, 0.1), (Media, 0.1)],
            Env,
            &["projects/{project}/src", "projects/{project}/docs", "experiments/{experiment_id}"],
        ),
        persona(
            "bob-marketing",
            "Marketing manager - media, presentations",
            "bob-marketing-assets",
            -5.0,
            (8, 16),
            1.2,
            [(Media, 0.4), (Images, 0.3), (Documents, 0.2), (Code, 0.05), (Archives, 0.05)],
            Files,
            &["campaigns/{campaign}/{quarter}", "brand/{category}", "events/{year}/{month}"],
        ),
        persona(
            "carol-data",
            "Data scientist - large datasets, analysis",
            "carol-analytics",
            -8.0,
            (10, 18),
            2.0,
            [(Archives, 0.4), (Documents, 0.3), (Code, 0.2), (Images, 0.05), (Media, 0.05)],
            Env,
            &["datasets/{dataset}/{date}", "models/{model}/{version}", "studies/{study}"],
        ),
        persona(
            "david-backup",
            "IT admin - automated backups",
            "david-backups",
            0.0,
            (2, 6),
            3.0,
            [(Archives, 0.6), (Documents, 0.2), (Code, 0.1), (Images, 0.05), (Media, 0.05)],
            Files,
            &["{system}/{year}/{month}/{day}", "snapshots/{env}/{week}"],
        ),
        persona(
            "eve-design",
            "Creative designer - images, media files",
            "eve-creative-work",
            1.0,
            (9, 17),
            1.8,
            [(Images, 0.5), (Media, 0.3), (Documents, 0.1), (Code, 0.05), (Archives, 0.05)],
            Env,
            &["clients/{client}/{project}", "portfolio/{category}/{subcategory}"],
        ),
        persona(
            "frank-research",
            "Research scientist - papers, data",
            "frank-research-data",
            -3.0,
            (14, 22),
            1.3,
            [(Documents, 0.4), (Archives, 0.3), (Code, 0.2), (Images, 0.05), (Media, 0.05)],
            Files,
            &["papers/{topic}/{year}", "experiments/{experiment_id}/raw", "collab/{partner}"],
        ),
        persona(
            "grace-sales",
            "Sales manager - presentations, materials",
            "grace-sales-materials",
            -6.0,
            (8, 16),
            1.1,
            [(Documents, 0.4), (Images, 0.3), (Media, 0.2), (Code, 0.05), (Archives, 0.05)],
            Env,
            &["regions/{region}/{quarter}", "clients/{client}/proposals"],
        ),
        persona(
            "henry-ops",
            "DevOps engineer - logs, configs",
            "henry-operations",
            0.0,
            (0, 8),
            2.5,
            [(Code, 0.4), (Archives, 0.3), (Documents, 0.2), (Images, 0.05), (Media, 0.05)],
            Files,
            &["logs/{service}/{env}/{date}", "configs/{platform}/{service}", "releases/{version}"],
        ),
        persona(
            "iris-content",
            "Content manager - web assets",
            "iris-content-library",
            9.0,
            (9, 17),
            1.7,
            [(Media, 0.4), (Images, 0.3), (Documents, 0.2), (Archives, 0.05), (Code, 0.05)],
            Env,
            &["library/{category}/{subcategory}", "published/{year}/{month}/{topic}"],
        ),
        persona(
            "jack-mobile",
            "Mobile developer - app assets",
            "jack-mobile-apps",
            5.5,
            (10, 18),
            1.6,
            [(Code, 0.4), (Images, 0.3), (Media, 0.2), (Documents, 0.05), (Archives, 0.05)],
            Files,
            &["apps/{app}/{platform}/{version}", "builds/{app}/{env}", "assets/{app}/{category}"],
        ),
    ]
}
