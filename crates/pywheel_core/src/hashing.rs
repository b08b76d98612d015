//! Copying a stream while hashing it.

use std::io::{self, Read, Write};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use digest::DynDigest;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use strum::{AsRefStr, Display, EnumString};

use crate::consts::COPY_CHUNK_SIZE;

/// Hash algorithms that can be used for `RECORD` entries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn hasher(self) -> Box<dyn DynDigest> {
        match self {
            HashAlgorithm::Sha224 => Box::new(Sha224::default()),
            HashAlgorithm::Sha256 => Box::new(Sha256::default()),
            HashAlgorithm::Sha384 => Box::new(Sha384::default()),
            HashAlgorithm::Sha512 => Box::new(Sha512::default()),
        }
    }

    /// Hash a complete buffer and return the `RECORD` encoded digest.
    pub fn digest(self, bytes: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(bytes);
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

/// The result of [`copy_with_hashing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedCopy {
    pub algorithm: HashAlgorithm,
    /// URL-safe base64 encoding of the digest without padding.
    pub digest: String,
    /// The raw bytes of the digest.
    pub raw_digest: Vec<u8>,
    /// The number of bytes that were copied.
    pub size: u64,
}

impl HashedCopy {
    /// The digest as a lowercase hex string.
    pub fn hex_digest(&self) -> String {
        hex::encode(&self.raw_digest)
    }
}

/// Copy everything from `reader` to `writer` in fixed size chunks, computing
/// the digest and size of the copied bytes along the way.
///
/// The stream is never held in memory as a whole. An error from either side
/// is returned immediately, the contents of `writer` are unspecified in that
/// case.
pub fn copy_with_hashing<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    algorithm: HashAlgorithm,
) -> io::Result<HashedCopy> {
    let mut hasher = algorithm.hasher();
    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        let chunk = &buffer[..read];
        writer.write_all(chunk)?;
        hasher.update(chunk);
        size += read as u64;
    }

    let raw_digest = hasher.finalize().into_vec();
    Ok(HashedCopy {
        algorithm,
        digest: URL_SAFE_NO_PAD.encode(&raw_digest),
        raw_digest,
        size,
    })
}
