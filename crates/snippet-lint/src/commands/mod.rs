//! Command implementations.

use std::io::Read;

use anyhow::Context;
use camino::Utf8Path;

pub mod check;
pub mod info;
#[cfg(feature = "http")]
pub mod serve;

/// Path argument meaning "read from stdin".
pub const STDIN_PATH: &str = "-";

/// Read a file (or stdin for `-`) and validate its size against the configured limit.
pub fn read_input(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let content = if path.as_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        // Preflight: check file size via metadata before reading into memory.
        let metadata = std::fs::metadata(path.as_std_path())
            .with_context(|| format!("failed to read {path}"))?;
        if let Some(max) = max_bytes {
            let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
            if size > max {
                anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
            }
        }
        std::fs::read_to_string(path.as_std_path())
            .with_context(|| format!("failed to read {path}"))?
    };

    if let Some(max) = max_bytes
        && content.len() > max
    {
        anyhow::bail!(
            "input too large: {path} is {} bytes (limit: {max} bytes)",
            content.len()
        );
    }
    Ok(content)
}
