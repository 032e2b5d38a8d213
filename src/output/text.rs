//! Plain-text result files
//!
//! One file per seed domain, named after the domain with dots replaced by
//! underscores (`www.example.com` → `www_example_com_urls.txt`), holding one
//! product URL per line.

use crate::output::traits::{OutputResult, ResultSink};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes `<domain>_urls.txt` files into a directory
#[derive(Debug, Clone)]
pub struct TextFileSink {
    directory: PathBuf,
}

impl TextFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path of the result file for a domain
    pub fn path_for(&self, domain: &str) -> PathBuf {
        self.directory.join(file_name_for(domain))
    }
}

/// Result file name for a domain
pub fn file_name_for(domain: &str) -> String {
    format!("{}_urls.txt", domain.replace(['.', ':'], "_"))
}

impl ResultSink for TextFileSink {
    fn write_results(&self, domain: &str, urls: &[String]) -> OutputResult<()> {
        if !self.directory.as_os_str().is_empty() && !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
        }

        let path = self.path_for(domain);
        write_lines(&path, urls)?;
        tracing::info!("Saved {} URLs for {} to {}", urls.len(), domain, path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "text"
    }
}

fn write_lines(path: &Path, urls: &[String]) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for url in urls {
        writeln!(writer, "{}", url)?;
    }
    writer.flush()?;
    Ok(())
}
