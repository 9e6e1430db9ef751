//! ZIP packaging for web-markup output.
//!
//! The engine writes `<stem>.html` next to a `<stem>_html_files` directory of
//! images and stylesheets. Both are folded into one archive: the markup at the
//! root and every resource under `html_files/`.

use deck_core::{Error, LogConfig, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Suffix of the engine's resource directory, appended to the markup's stem.
pub const RESOURCE_DIR_SUFFIX: &str = "_html_files";

/// Directory inside the archive that holds the resources.
pub const ARCHIVE_RESOURCE_DIR: &str = "html_files";

#[derive(Debug, Clone, Copy)]
pub struct PackageBuilder {
    log: LogConfig,
}

impl PackageBuilder {
    pub fn new(log: LogConfig) -> Self {
        Self { log }
    }

    /// Write `archive` holding `primary` (stored as `primary_name`) and the
    /// files of its resource directory, if any.
    ///
    /// Returns the archive entry names of the resources. The archive is
    /// built under a `.partial` name and only renamed once complete.
    pub async fn package(
        &self,
        primary: &Path,
        archive: &Path,
        primary_name: &str,
    ) -> Result<Vec<String>> {
        let primary = primary.to_path_buf();
        let archive = archive.to_path_buf();
        let primary_name = primary_name.to_string();
        let log = self.log;

        tokio::task::spawn_blocking(move || build(&primary, &archive, &primary_name, log))
            .await
            .map_err(|e| Error::Packaging(format!("packaging task failed: {}", e)))?
    }
}

/// Resource directory the engine pairs with `primary`.
pub fn resource_dir(primary: &Path) -> PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    primary.with_file_name(format!("{}{}", stem, RESOURCE_DIR_SUFFIX))
}

fn build(primary: &Path, archive: &Path, primary_name: &str, log: LogConfig) -> Result<Vec<String>> {
    let resources_root = resource_dir(primary);
    let mut resources = Vec::new();
    if resources_root.is_dir() {
        collect_files(&resources_root, "", &mut resources).map_err(packaging)?;
        resources.sort_by(|a, b| a.name.cmp(&b.name));
    } else {
        log.debug(format_args!(
            "No resource directory at {}",
            resources_root.display()
        ));
    }

    let partial = partial_path(archive);
    let written = write_archive(&partial, primary, primary_name, &resources)
        .and_then(|()| std::fs::rename(&partial, archive).map_err(packaging));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&partial);
        return Err(e);
    }

    log.info(format_args!(
        "Packaged {} with {} resource(s) into {}",
        primary_name,
        resources.len(),
        archive.display()
    ));
    Ok(resources
        .iter()
        .map(|resource| format!("{}/{}", ARCHIVE_RESOURCE_DIR, resource.name))
        .collect())
}

fn write_archive(
    partial: &Path,
    primary: &Path,
    primary_name: &str,
    resources: &[Resource],
) -> Result<()> {
    let file = File::create(partial).map_err(packaging)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(primary_name, options).map_err(packaging)?;
    copy_file(primary, &mut zip)?;

    for resource in resources {
        zip.start_file(format!("{}/{}", ARCHIVE_RESOURCE_DIR, resource.name), options)
            .map_err(packaging)?;
        copy_file(&resource.path, &mut zip)?;
    }

    let mut inner = zip.finish().map_err(packaging)?;
    inner.flush().map_err(packaging)?;
    Ok(())
}

fn copy_file<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    let mut source = File::open(path)
        .map_err(|e| Error::Packaging(format!("{}: {}", path.display(), e)))?;
    io::copy(&mut source, out).map_err(packaging)?;
    Ok(())
}

/// A file under the resource directory.
struct Resource {
    /// On-disk location, opened as is.
    path: PathBuf,
    /// Relative, `/`-separated entry name; lossy for non-UTF-8 file names.
    name: String,
}

/// Every file under `dir`.
fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<Resource>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, &rel, out)?;
        } else {
            out.push(Resource { path, name: rel });
        }
    }
    Ok(())
}

pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

fn packaging(e: impl std::fmt::Display) -> Error {
    Error::Packaging(e.to_string())
}
