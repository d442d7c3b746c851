/// Produces strictly increasing discriminators from wall-clock readings.
///
/// Two completions inside the same millisecond (or a clock stepping backwards)
/// still yield distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheBuster {
    last: u64,
}

impl CacheBuster {
    pub fn next(&mut self, now_ms: u64) -> u64 {
        let value = now_ms.max(self.last.saturating_add(1));
        self.last = value;
        value
    }
}

/// Appends `t=<discriminator>` to an artifact reference, keeping any fragment last.
pub fn bust_cache(artifact_ref: &str, discriminator: u64) -> String {
    let (base, fragment) = match artifact_ref.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (artifact_ref, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{base}{separator}t={discriminator}#{fragment}"),
        None => format!("{base}{separator}t={discriminator}"),
    }
}
