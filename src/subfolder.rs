// src/subfolder.rs
//
// Subfolder naming for uploaded objects
//
// Templates such as `projects/{project}/src` are rendered by replacing each
// `{placeholder}` with a value drawn from a fixed vocabulary. Each rendered
// subfolder holds at most `files_per_subfolder` objects per actor.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use regex::{Captures, Regex};

use crate::constants::SUBFOLDER_RETRY_ATTEMPTS;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid")
});

/// Folder used when an actor has no templates
pub const FALLBACK_SUBFOLDER: &str = "files";

fn vocabulary(name: &str) -> Option<&'static [&'static str]> {
    let values: &'static [&'static str] = match name {
        "project" => &["apollo", "hermes", "atlas", "phoenix", "orion", "zephyr"],
        "campaign" => &["spring-launch", "summer-sale", "holiday-push", "brand-refresh"],
        "dataset" => &["customers", "transactions", "telemetry", "clickstream", "inventory"],
        "model" => &["churn", "forecast", "recommender", "classifier"],
        "system" => &["db-primary", "web-frontend", "auth-service", "mail", "fileserver"],
        "client" => &["acme", "globex", "initech", "umbrella", "wayne-ent"],
        "app" => &["shopper", "fitlog", "chatter", "wallet"],
        "service" => &["api-gateway", "billing", "search", "ingest", "scheduler"],
        "env" => &["prod", "staging", "dev", "qa"],
        "platform" => &["ios", "android", "web", "linux"],
        "category" => &["logos", "banners", "icons", "photos", "videos", "templates"],
        "subcategory" => &["draft", "final", "archive", "review"],
        "region" => &["north-america", "emea", "apac", "latam"],
        "topic" => &["ml", "storage", "networking", "genomics", "climate"],
        "study" => &["cohort-a", "cohort-b", "pilot", "longitudinal"],
        "partner" => &["mit", "cern", "eth", "stanford"],
        _ => return None,
    };
    Some(values)
}

/// Render `template`, substituting every known placeholder.
///
/// Date placeholders (`year`, `month`, `day`, `week`, `date`, `quarter`) come
/// from `now`; `version` and `experiment_id` are generated. Unknown
/// placeholders are left verbatim.
pub fn render_template<R: Rng + ?Sized>(template: &str, now: DateTime<Utc>, rng: &mut R) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            substitute(name, now, rng).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn substitute<R: Rng + ?Sized>(name: &str, now: DateTime<Utc>, rng: &mut R) -> Option<String> {
    let value = match name {
        "year" => format!("{:04}", now.year()),
        "month" => format!("{:02}", now.month()),
        "day" => format!("{:02}", now.day()),
        "week" => format!("week-{:02}", now.iso_week().week()),
        "date" => now.format("%Y-%m-%d").to_string(),
        "quarter" => format!("q{}", (now.month() - 1) / 3 + 1),
        "version" => format!(
            "v{}.{}.{}",
            rng.random_range(1..=5),
            rng.random_range(0..=12),
            rng.random_range(0..=20)
        ),
        "experiment_id" => format!("exp-{:04}", rng.random_range(1..=9999)),
        other => vocabulary(other)?.choose(rng)?.to_string(),
    };
    Some(value)
}

/// Per-actor subfolder chooser with object caps
pub struct SubfolderPlanner {
    templates: Vec<String>,
    cap: u64,
    counts: HashMap<String, u64>,
}

impl SubfolderPlanner {
    pub fn new(templates: &[String], files_per_subfolder: u64) -> Self {
        let templates = if templates.is_empty() {
            vec![FALLBACK_SUBFOLDER.to_string()]
        } else {
            templates.to_vec()
        };
        Self {
            templates,
            cap: files_per_subfolder.max(1),
            counts: HashMap::new(),
        }
    }

    /// Pick a rendered subfolder still under its cap.
    ///
    /// Retries a few times on a full folder; if all attempts land on full
    /// folders, a fresh suffixed folder is returned instead.
    pub fn choose<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> String {
        let mut last = String::new();
        for _ in 0..SUBFOLDER_RETRY_ATTEMPTS {
            let Some(template) = self.templates.choose(rng) else {
                break;
            };
            let rendered = render_template(template, now, rng);
            if self.count(&rendered) < self.cap {
                return rendered;
            }
            last = rendered;
        }
        if last.is_empty() {
            last = FALLBACK_SUBFOLDER.to_string();
        }
        let mut n = 2u64;
        loop {
            let candidate = format!("{}-{}", last, n);
            if self.count(&candidate) < self.cap {
                return candidate;
            }
            n += 1;
        }
    }

    /// Record one successful upload into `subfolder`.
    /// Returns true when this is the first object in that subfolder.
    pub fn record_upload(&mut self, subfolder: &str) -> bool {
        let entry = self.counts.entry(subfolder.to_string()).or_insert(0);
        *entry += 1;
        *entry == 1
    }

    pub fn count(&self, subfolder: &str) -> u64 {
        self.counts.get(subfolder).copied().unwrap_or(0)
    }

    pub fn subfolders_used(&self) -> usize {
        self.counts.len()
    }
}
