use sha2::{Digest, Sha256};

/// Canonical text form of a page before hashing.
///
/// Line endings are unified, trailing whitespace on each line is dropped and
/// the document is trimmed, so transport-level whitespace noise does not count
/// as drift. Markup itself is left untouched.
pub fn normalize(content: &[u8]) -> String {
    let text = String::from_utf8_lossy(content);
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    lines.join("\n").trim().to_string()
}

/// Lowercase hex SHA-256 of the normalized content.
pub fn fingerprint(content: &[u8]) -> String {
    let digest = Sha256::digest(normalize(content).as_bytes());
    format!("{:x}", digest)
}
