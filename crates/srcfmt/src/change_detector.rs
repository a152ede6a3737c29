use sha2::Digest;
use sha2::Sha256;

pub fn get_sha256_checksum(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Gets if the formatted bytes are identical to the original bytes by
/// comparing SHA-256 fingerprints of each.
pub fn is_unchanged(original: &[u8], formatted: &[u8]) -> bool {
  get_sha256_checksum(original) == get_sha256_checksum(formatted)
}
