use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in the image version.
const SHORT_HASH_LEN: usize = 8;

/// Compose the image version for a build: `<base_version>-sha.<hash8>`.
///
/// The hash covers the build arguments when they are present and non-empty,
/// otherwise the base version itself. An empty `build_args` is treated the
/// same as `None`.
pub fn image_version(base_version: &str, build_args: Option<&str>) -> String {
    let source = match build_args {
        Some(args) if !args.is_empty() => args,
        _ => base_version,
    };

    format!("{}-sha.{}", base_version, short_hash(source))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..SHORT_HASH_LEN].to_string()
}
