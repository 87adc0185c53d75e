//! Platform identifier normalization and fallback resolution.
//!
//! Clients report platform strings in a handful of historical spellings
//! (`macos-aarch64`, `win64`, ...). Artifacts are stored under canonical
//! `{os}-{arch}` ids, so every inbound string is normalized before lookup.
//! Some platforms can also run artifacts built for a looser target (an Apple
//! Silicon client can run a universal macOS build); the fallback table
//! captures those relationships.

/// Canonical platform ids the server is documented to accept.
///
/// The alias and fallback tables below must stay exhaustive over this list;
/// `test_tables_are_exhaustive` enforces it.
pub const KNOWN_PLATFORMS: &[&str] = &[
    "darwin-aarch64",
    "darwin-x86_64",
    "darwin-universal",
    "windows-aarch64",
    "windows-x86_64",
    "windows-x86",
    "linux-aarch64",
    "linux-x86_64",
    "linux-x86",
];

/// Normalize a raw client-reported platform string to its canonical id.
///
/// Lowercases, trims, and maps known aliases. Unrecognized strings pass
/// through lowercased and trimmed rather than being rejected, so an unknown
/// platform is still comparable against stored artifact platforms.
pub fn normalize(raw: &str) -> String {
    let cleaned = raw.trim().to_ascii_lowercase();
    match cleaned.as_str() {
        "macos-aarch64" | "macos-arm64" | "osx-aarch64" | "darwin-arm64" => {
            "darwin-aarch64".to_string()
        }
        "macos-x86_64" | "macos-amd64" | "osx-x86_64" | "darwin-amd64" => {
            "darwin-x86_64".to_string()
        }
        "macos-universal" | "osx-universal" => "darwin-universal".to_string(),
        "win64" | "windows-amd64" | "win-x86_64" => "windows-x86_64".to_string(),
        "win32" | "windows-i686" | "win-x86" => "windows-x86".to_string(),
        "windows-arm64" | "win-arm64" => "windows-aarch64".to_string(),
        "linux64" | "linux-amd64" => "linux-x86_64".to_string(),
        "linux32" | "linux-i686" => "linux-x86".to_string(),
        "linux-arm64" => "linux-aarch64".to_string(),
        _ => cleaned,
    }
}

/// The ordered list of looser platforms a canonical platform can also run.
///
/// Hand-authored, finite. A platform with no entry has an empty chain; that
/// is the normal case, not an error.
pub fn fallback_chain(canonical: &str) -> &'static [&'static str] {
    match canonical {
        "darwin-aarch64" => &["darwin-universal"],
        "darwin-x86_64" => &["darwin-universal"],
        "windows-aarch64" => &["windows-x86_64", "windows-x86"],
        _ => &[],
    }
}

/// Normalize a raw platform string and expand it into the ordered candidate
/// list used for artifact lookup: the exact canonical id first, then each
/// fallback in chain order.
pub fn candidates(raw: &str) -> Vec<String> {
    let canonical = normalize(raw);
    let mut out = vec![canonical.clone()];
    for fallback in fallback_chain(&canonical) {
        out.push((*fallback).to_string());
    }
    out
}
