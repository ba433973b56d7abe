//! Zip export of captured pages

use super::{OutputError, OutputResult};
use crate::jobs::{Job, JobStatus, Screenshot};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Characters never allowed in an exported file name
const ILLEGAL_CHARS: &[char] = &['/', '\\', '?', '<', '>', ':', '*', '|', '"'];

/// Longest file name produced, in bytes
const MAX_NAME_LEN: usize = 255;

/// Makes `name` safe to use as a file name on common filesystems
///
/// Path separators, reserved punctuation and control characters are removed,
/// trailing dots and spaces are trimmed, and the result is cut to 255 bytes.
/// Names that end up empty or reserved (`.`/`..`) become an empty string.
pub fn sanitize_file_name(name: &str) -> String {
    let mut cleaned: String = name
        .chars()
        .filter(|c| !c.is_control() && !ILLEGAL_CHARS.contains(c))
        .collect();

    let trimmed_len = cleaned.trim_end_matches(['.', ' ']).len();
    cleaned.truncate(trimmed_len);

    if cleaned.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
    }

    if cleaned == "." || cleaned == ".." {
        return String::new();
    }
    cleaned
}

/// Archive entry name of a screenshot: `<title or "screenshot">-<id>.png`
pub fn entry_name(screenshot: &Screenshot) -> String {
    let title = screenshot.title.trim();
    let stem = if title.is_empty() { "screenshot" } else { title };
    let name = sanitize_file_name(&format!("{}-{}.png", stem, screenshot.id));

    if name.ends_with(".png") {
        name
    } else {
        // Title long enough to push the suffix out.
        format!("screenshot-{}.png", screenshot.id)
    }
}

/// File name of a job's archive: `<domain>-screenshots.zip`
pub fn archive_file_name(job: &Job) -> String {
    sanitize_file_name(&format!("{}-screenshots.zip", job.domain))
}

/// Writes the full-size images of a completed job into a zip
///
/// Entries appear in capture order. Fails with [`OutputError::NotReady`]
/// unless the job has completed.
pub fn write_archive<W: Write + Seek>(job: &Job, writer: W) -> OutputResult<W> {
    if job.status != JobStatus::Completed {
        return Err(OutputError::NotReady(job.status));
    }

    let mut zip = ZipWriter::new(writer);

    for screenshot in &job.screenshots {
        let bytes = std::fs::read(&screenshot.full_image_path)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(entry_name(screenshot), options)?;
        zip.write_all(&bytes)?;
    }

    Ok(zip.finish()?)
}

/// Exports a completed job's archive into `dest_dir`
///
/// Returns the path of the written file.
pub fn export_archive(job: &Job, dest_dir: &Path) -> OutputResult<PathBuf> {
    if job.status != JobStatus::Completed {
        return Err(OutputError::NotReady(job.status));
    }

    std::fs::create_dir_all(dest_dir)?;
    let path = dest_dir.join(archive_file_name(job));

    let file = BufWriter::new(File::create(&path)?);
    let mut file = write_archive(job, file)?;
    file.flush()?;

    tracing::info!(
        "Wrote {} screenshots to {}",
        job.screenshots.len(),
        path.display()
    );
    Ok(path)
}
