// src/synth.rs
//
// Synthetic artifact writer
//
// Text types get templated content repeated and cut to the exact size;
// binary types get random bytes. A failed write never leaves a partial file.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::config::FileType;
use crate::constants::SYNTH_CHUNK_SIZE;
use crate::error::SynthesisError;

/// Size-derived retention label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionClass {
    Regular,
    Large,
}

impl RetentionClass {
    /// Strictly greater than the threshold is `Large`
    pub fn classify(size_bytes: u64, large_file_threshold: u64) -> Self {
        if size_bytes > large_file_threshold {
            RetentionClass::Large
        } else {
            RetentionClass::Regular
        }
    }
}

impl fmt::Display for RetentionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionClass::Regular => f.write_str("regular"),
            RetentionClass::Large => f.write_str("large"),
        }
    }
}

/// A file on local disk, owned by the actor that created it
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub file_name: String,
    pub file_type: FileType,
    pub size_bytes: u64,
}

impl Artifact {
    pub fn retention(&self, large_file_threshold: u64) -> RetentionClass {
        RetentionClass::classify(self.size_bytes, large_file_threshold)
    }
}

/// Who the content claims to be written by
#[derive(Debug, Clone)]
pub struct Author {
    pub id: String,
    pub description: String,
}

/// `{actor}_{type}_{unix_ts}_{seq}{ext}`
pub fn object_name(actor_id: &str, file_type: FileType, unix_ts: i64, seq: u64, extension: &str) -> String {
    format!("{}_{}_{}_{}{}", actor_id, file_type, unix_ts, seq, extension)
}

/// Write an artifact of exactly `size_bytes` at `dir/file_name`.
pub async fn synthesize(
    file_type: FileType,
    size_bytes: u64,
    dir: &Path,
    file_name: &str,
    author: &Author,
) -> Result<Artifact, SynthesisError> {
    let path = dir.join(file_name);
    let template = file_type.is_text().then(|| text_template(file_type, author));

    let write_path = path.clone();
    let joined = tokio::task::spawn_blocking(move || {
        write_exact(&write_path, size_bytes, template.as_deref())
    })
    .await;

    let result = match joined {
        Ok(r) => r,
        Err(e) => Err(io::Error::other(e)),
    };

    match result {
        Ok(()) => Ok(Artifact {
            path,
            file_name: file_name.to_string(),
            file_type,
            size_bytes,
        }),
        Err(source) => {
            let _ = fs::remove_file(&path);
            Err(SynthesisError { path, source })
        }
    }
}

fn write_exact(path: &Path, size_bytes: u64, template: Option<&str>) -> io::Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    let mut remaining = size_bytes;

    match template {
        Some(text) => {
            let bytes = text.as_bytes();
            if bytes.is_empty() && remaining > 0 {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty text template"));
            }
            while remaining > 0 {
                let n = remaining.min(bytes.len() as u64) as usize;
                out.write_all(&bytes[..n])?;
                remaining -= n as u64;
            }
        }
        None => {
            let mut rng = rand::rng();
            let mut buf = vec![0u8; SYNTH_CHUNK_SIZE];
            while remaining > 0 {
                let n = remaining.min(SYNTH_CHUNK_SIZE as u64) as usize;
                rng.fill(&mut buf[..n]);
                out.write_all(&buf[..n])?;
                remaining -= n as u64;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn text_template(file_type: FileType, author: &Author) -> String {
    match file_type {
        FileType::Code => format!(
            "# Generated by {id}: {desc}\n\
             def process_batch(items):\n    \
                 results = []\n    \
                 for item in items:\n        \
                     if item.is_valid():\n            \
                         results.append(item.transform())\n    \
                 return results\n\n\
             class {cls}Handler:\n    \
                 def __init__(self, config):\n        \
                     self.config = config\n        \
                     self.owner = \"{id}\"\n\n",
            id = author.id,
            desc = author.description,
            cls = camel_case(&author.id),
        ),
        _ => format!(
            "Document prepared by {id} ({desc}). \
             The quarterly review covers storage usage, access patterns and retention. \
             Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor \
             incididunt ut labore et dolore magna aliqua.\n",
            id = author.id,
            desc = author.description,
        ),
    }
}

fn camel_case(id: &str) -> String {
    id.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut chars = p.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
