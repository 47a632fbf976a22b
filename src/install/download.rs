use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use reqwest::blocking::Client;

use super::error::{Context, InstallError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// Copies `reader` into `writer`, calling `on_progress` with the percentage done whenever it
/// changes. Percentages are only reported when `total` is known, except for the final 100, which
/// is reported once the stream ends with everything received.
fn copy_with_progress(
    mut reader: impl Read,
    total: Option<u64>,
    writer: &mut impl Write,
    on_progress: &mut dyn FnMut(u8),
) -> std::io::Result<u64> {
    let mut buffer = vec![0; CHUNK_SIZE];
    let mut written = 0u64;
    let mut last_percent = None;

    let total = total.filter(|&total| total > 0);

    if total.is_some() {
        on_progress(0);
        last_percent = Some(0);
    }

    loop {
        let count = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        writer.write_all(&buffer[..count])?;
        written += count as u64;

        if let Some(total) = total {
            let percent = (written.saturating_mul(100) / total).min(100) as u8;

            if last_percent != Some(percent) {
                on_progress(percent);
                last_percent = Some(percent);
            }
        }
    }

    // A short stream never reaches 100.
    let complete = total.map_or(true, |total| written >= total);

    if complete && last_percent != Some(100) {
        on_progress(100);
    }

    Ok(written)
}

/// Writes everything from `reader` to a new file at `dest`. If the stream fails part way, the
/// partial file is left where it is and the error is returned.
pub fn save_stream(
    reader: impl Read,
    total: Option<u64>,
    dest: &Path,
    on_progress: &mut dyn FnMut(u8),
) -> Result<u64> {
    let file = File::create(dest).context(format!("unable to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);

    let written = copy_with_progress(reader, total, &mut writer, on_progress)
        .context("download interrupted")?;

    writer
        .flush()
        .context(format!("unable to write {}", dest.display()))?;

    if let Some(total) = total {
        if written < total {
            return Err(InstallError::new(format!(
                "download ended early ({written} of {total} bytes)"
            )));
        }
    }

    Ok(written)
}

/// Downloads `url` to `dest`, reporting progress as it goes.
pub fn download(
    client: &Client,
    url: &str,
    dest: &Path,
    on_progress: &mut dyn FnMut(u8),
) -> Result<u64> {
    log::info!("downloading {} to {}", url, dest.display());

    let response = client
        .get(url)
        .send()
        .context("unable to start the download")?
        .error_for_status()
        .context("the download was refused")?;

    let total = response.content_length();
    let written = save_stream(response, total, dest, on_progress)?;

    log::info!("downloaded {} bytes", written);
    Ok(written)
}
