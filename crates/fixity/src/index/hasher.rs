use crate::error::{FixityError, Result};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

const BUFFER_SIZE: usize = 8192;

/// Digest algorithms a record can be tracked under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Md5,
    Sha1,
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest.
    pub fn hex_len(&self) -> usize {
        match self {
            Algorithm::Md5 => 32,
            Algorithm::Sha1 => 40,
            Algorithm::Sha224 => 56,
            Algorithm::Sha256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }
}

impl FromStr for Algorithm {
    type Err = FixityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha1" => Ok(Algorithm::Sha1),
            "sha224" => Ok(Algorithm::Sha224),
            "sha256" => Ok(Algorithm::Sha256),
            "sha384" => Ok(Algorithm::Sha384),
            "sha512" => Ok(Algorithm::Sha512),
            _ => Err(FixityError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes the hex digest of a file's contents.
///
/// The file is streamed through the hasher in 8KB chunks, so memory use does
/// not depend on file size. Open failures are classified into
/// `PathNotFound` / `PermissionDenied`; anything else surfaces as `Io`.
pub fn digest_file<P: AsRef<Path>>(path: P, algorithm: Algorithm) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        log::error!("Failed to open file for hashing: {}: {}", path.display(), e);
        FixityError::from_io(path, e)
    })?;
    let reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let digest = digest_reader(reader, algorithm).map_err(|e| match e {
        FixityError::Io(io) => FixityError::from_io(path, io),
        other => other,
    })?;

    log::debug!("{} {} {}", algorithm, digest, path.display());
    Ok(digest)
}

/// Computes the hex digest of everything readable from `reader`.
pub fn digest_reader<R: Read>(reader: R, algorithm: Algorithm) -> Result<String> {
    match algorithm {
        Algorithm::Md5 => stream::<md5::Md5, R>(reader),
        Algorithm::Sha1 => stream::<sha1::Sha1, R>(reader),
        Algorithm::Sha224 => stream::<sha2::Sha224, R>(reader),
        Algorithm::Sha256 => stream::<sha2::Sha256, R>(reader),
        Algorithm::Sha384 => stream::<sha2::Sha384, R>(reader),
        Algorithm::Sha512 => stream::<sha2::Sha512, R>(reader),
    }
}

fn stream<D: Digest, R: Read>(mut reader: R) -> Result<String>
where
    sha2::digest::Output<D>: fmt::LowerHex,
{
    let mut hasher = D::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Case-insensitive comparison of two hex digests.
pub fn digests_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
