//! Materializing a guest's root filesystem and runtime spec
//!
//! Installation is transactional with respect to the final guest path:
//! all work happens in a staging directory next to it, which is renamed
//! into place only after the rootfs is unpacked and the patched spec is
//! written. A failed install removes the staging directory (best
//! effort) so nothing half-built ever sits at the path a guest record
//! would point at.
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::Command;

use flate2::read::GzDecoder;
use tar::Archive;
use xz2::read::XzDecoder;

use crate::spec::{RuntimeSpec, SpecError};
use crate::state::ImageDescriptor;

/// Directory below the guest path holding the unpacked root filesystem.
pub const ROOTFS_DIR: &str = "rootfs";

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("failed to fetch rootfs archive from {url}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("failed to spool rootfs archive from {url}")]
    Spool {
        url: String,
        source: std::io::Error,
    },
    #[error("failed to stage guest directory {path:?}")]
    Stage {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to extract rootfs archive from {url}")]
    Extract {
        url: String,
        source: std::io::Error,
    },
    #[error("failed to run {runtime:?} spec in {path:?}")]
    SpecGenerate {
        runtime: PathBuf,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{runtime:?} spec exited with {status} in {path:?}")]
    SpecGenerateFailed {
        runtime: PathBuf,
        path: PathBuf,
        status: std::process::ExitStatus,
    },
    #[error(transparent)]
    SpecPatch(#[from] SpecError),
    #[error("failed to move installed guest into place at {path:?}")]
    Commit {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Compression of a rootfs archive, sniffed from its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Xz,
    None,
}

impl Compression {
    const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
    const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

    fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&Self::XZ_MAGIC) {
            Self::Xz
        } else if magic.starts_with(&Self::GZIP_MAGIC) {
            Self::Gzip
        } else {
            Self::None
        }
    }
}

/// Turns a resolved image descriptor into an on-disk guest directory
/// containing `rootfs/` and a patched `config.json`.
pub struct Installer {
    http: reqwest::blocking::Client,
    runtime: PathBuf,
    init: PathBuf,
    netns_hook: PathBuf,
}

impl Installer {
    pub fn new(runtime: PathBuf, init: PathBuf, netns_hook: PathBuf) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            runtime,
            init,
            netns_hook,
        }
    }

    /// Installs the image into `path`. On success `path` exists with a
    /// complete rootfs and spec; on failure it is untouched.
    pub fn install(
        &self,
        name: &str,
        path: &Path,
        image_root: &str,
        image: &ImageDescriptor,
    ) -> Result<(), InstallError> {
        let staging = staging_path(path);
        if staging.exists() {
            // Leftover from an interrupted install of the same name.
            tracing::debug!(path = %staging.display(), "removing stale staging directory");
            fs::remove_dir_all(&staging).map_err(|err| InstallError::Stage {
                path: staging.clone(),
                source: err,
            })?;
        }

        if let Err(err) = self.install_into(name, &staging, image_root, image) {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        fs::rename(&staging, path).map_err(|err| InstallError::Commit {
            path: path.to_owned(),
            source: err,
        })
    }

    fn install_into(
        &self,
        name: &str,
        staging: &Path,
        image_root: &str,
        image: &ImageDescriptor,
    ) -> Result<(), InstallError> {
        let url = format!("{image_root}/{}", image.archive);
        let archive = self.fetch_archive(&url)?;
        extract_rootfs(archive, &url, &staging.join(ROOTFS_DIR))?;
        self.generate_spec(staging)?;

        let mut spec = RuntimeSpec::load(staging)?;
        spec.patch(name, &image.command, &self.init, &self.netns_hook)?;
        spec.save(staging)?;
        Ok(())
    }

    /// Downloads the archive into an unlinked temporary file, so the
    /// download is discarded automatically whether or not extraction
    /// succeeds.
    fn fetch_archive(&self, url: &str) -> Result<File, InstallError> {
        tracing::debug!(url = %url, "retrieving rootfs archive");
        let mut response = self
            .http
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| InstallError::Fetch {
                url: url.to_owned(),
                source: err,
            })?;

        let spool_err = |err| InstallError::Spool {
            url: url.to_owned(),
            source: err,
        };
        let mut spool = tempfile::tempfile().map_err(spool_err)?;
        response.copy_to(&mut spool).map_err(|err| InstallError::Fetch {
            url: url.to_owned(),
            source: err,
        })?;
        spool.seek(SeekFrom::Start(0)).map_err(spool_err)?;
        Ok(spool)
    }

    fn generate_spec(&self, guest_dir: &Path) -> Result<(), InstallError> {
        tracing::debug!(path = %guest_dir.display(), "generating baseline runtime spec");
        let status = Command::new(&self.runtime)
            .arg("spec")
            .current_dir(guest_dir)
            .status()
            .map_err(|err| InstallError::SpecGenerate {
                runtime: self.runtime.clone(),
                path: guest_dir.to_owned(),
                source: err,
            })?;
        if !status.success() {
            return Err(InstallError::SpecGenerateFailed {
                runtime: self.runtime.clone(),
                path: guest_dir.to_owned(),
                status,
            });
        }
        Ok(())
    }
}

fn extract_rootfs(mut archive: File, url: &str, rootfs: &Path) -> Result<(), InstallError> {
    fs::create_dir_all(rootfs).map_err(|err| InstallError::Stage {
        path: rootfs.to_owned(),
        source: err,
    })?;

    let extract_err = |err| InstallError::Extract {
        url: url.to_owned(),
        source: err,
    };
    let mut magic = [0u8; 6];
    let sniffed = archive.read(&mut magic).map_err(extract_err)?;
    archive.seek(SeekFrom::Start(0)).map_err(extract_err)?;

    tracing::debug!(path = %rootfs.display(), "extracting rootfs");
    match Compression::sniff(&magic[..sniffed]) {
        Compression::Gzip => Archive::new(GzDecoder::new(archive)).unpack(rootfs),
        Compression::Xz => Archive::new(XzDecoder::new(archive)).unpack(rootfs),
        Compression::None => Archive::new(archive).unpack(rootfs),
    }
    .map_err(extract_err)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".install");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;

    #[test]
    fn test_sniff_compression() {
        assert_eq!(Compression::sniff(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(
            Compression::sniff(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]),
            Compression::Xz
        );
        assert_eq!(Compression::sniff(b"ustar"), Compression::None);
        assert_eq!(Compression::sniff(&[]), Compression::None);
    }

    #[test]
    fn test_staging_path_is_a_sibling() {
        assert_eq!(
            staging_path(Path::new("/var/lib/oryx-guests/g")),
            Path::new("/var/lib/oryx-guests/g.install")
        );
    }

    fn tar_with_hello() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let body = b"hello\n";
        let mut header = tar::Header::new_gnu();
        header.set_path("etc/hello").unwrap();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, body.as_slice()).unwrap();
        builder.into_inner().unwrap()
    }

    fn spool(data: &[u8]) -> File {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(data).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file
    }

    #[test]
    fn test_extract_gzip_compressed_rootfs() -> Result<()> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&tar_with_hello())?;
        let compressed = encoder.finish()?;

        let dir = tempfile::tempdir()?;
        let rootfs = dir.path().join(ROOTFS_DIR);
        extract_rootfs(spool(&compressed), "http://h/a.tar.gz", &rootfs)?;
        assert_eq!(fs::read_to_string(rootfs.join("etc/hello"))?, "hello\n");
        Ok(())
    }

    #[test]
    fn test_extract_xz_compressed_rootfs() -> Result<()> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        encoder.write_all(&tar_with_hello())?;
        let compressed = encoder.finish()?;

        let dir = tempfile::tempdir()?;
        let rootfs = dir.path().join(ROOTFS_DIR);
        extract_rootfs(spool(&compressed), "http://h/a.tar.xz", &rootfs)?;
        assert_eq!(fs::read_to_string(rootfs.join("etc/hello"))?, "hello\n");
        Ok(())
    }

    #[test]
    fn test_extract_rejects_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let rootfs = dir.path().join(ROOTFS_DIR);
        // Gzip magic with garbage behind it.
        let err = extract_rootfs(
            spool(&[0x1f, 0x8b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
            "http://h/a.tar.gz",
            &rootfs,
        )
        .unwrap_err();
        assert!(matches!(err, InstallError::Extract { .. }));
    }
}
