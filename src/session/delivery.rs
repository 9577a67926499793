// SPDX-License-Identifier: GPL-3.0-only

//! Session delivery: public hashes and the printer hand-off

use crate::constants::session as consts;
use crate::errors::{BoothResult, PrinterError};
use md5::{Digest, Md5};
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

/// Public lookup hash for a session
///
/// The download side recomputes this independently to resolve a session
/// from its numeric id, so the derivation is a cross-process contract:
/// the first 12 lowercase hex characters of the MD5 digest of the decimal
/// id string.
pub fn session_hash(session_id: u64) -> String {
    let digest = Md5::digest(session_id.to_string().as_bytes());
    let mut hash = String::with_capacity(consts::HASH_LEN);
    for byte in digest.iter() {
        if hash.len() >= consts::HASH_LEN {
            break;
        }
        hash.push_str(&format!("{:02x}", byte));
    }
    hash.truncate(consts::HASH_LEN);
    hash
}

/// External print spooler
pub trait PrintService {
    /// Queue a file for printing; returns once the job is handed off
    fn print(&self, printer_name: &str, path: &Path) -> BoothResult<()>;
}

/// Prints by shelling out to `lpr -P <printer>`
///
/// No retry and no job tracking: a failed hand-off is reported to the
/// guest, the session is complete either way since the download QR code
/// is already on the image.
pub struct LprPrintService;

impl PrintService for LprPrintService {
    fn print(&self, printer_name: &str, path: &Path) -> BoothResult<()> {
        info!(printer = printer_name, file = %path.display(), "Submitting print job");

        let status = Command::new("lpr")
            .arg("-P")
            .arg(printer_name)
            .arg(path)
            .status()
            .map_err(|e| PrinterError::SpoolFailed(format!("lpr: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            warn!(printer = printer_name, code = ?status.code(), "lpr exited non-zero");
            Err(PrinterError::SpoolFailed(format!(
                "lpr exited with {:?}",
                status.code()
            ))
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_shape() {
        let hash = session_hash(20240101_123000);
        assert_eq!(hash.len(), 12);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn test_hash_matches_external_derivation() {
        // The download server computes md5(str(id))[:12] on its own;
        // these digests pin the shared contract
        assert_eq!(session_hash(42), "a1d0c6e83f02");
        assert_eq!(session_hash(1), "c4ca4238a0b9");
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(session_hash(42), session_hash(42));
    }

    #[test]
    fn test_hash_differs_per_session() {
        assert_ne!(session_hash(1), session_hash(2));
    }
}
