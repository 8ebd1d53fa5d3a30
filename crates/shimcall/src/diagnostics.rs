//! Per-instance bookkeeping of anomalies and call volume.

use std::collections::BTreeMap;

/// Counters that decide what gets logged once and what gets summarised.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    coerced: BTreeMap<String, u64>,
    unsupported: BTreeMap<String, u64>,
    calls: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a result-slot coercion. Returns `true` on the first one for `func`.
    pub fn record_coercion(&mut self, func: &str) -> bool {
        bump(&mut self.coerced, func)
    }

    /// Counts a call to an unsupported function. Returns `true` on the first one for `func`.
    pub fn record_unsupported(&mut self, func: &str) -> bool {
        bump(&mut self.unsupported, func)
    }

    pub fn record_call(&mut self) {
        self.calls += 1;
    }

    pub fn total_calls(&self) -> u64 {
        self.calls
    }

    pub fn coercions(&self, func: &str) -> u64 {
        self.coerced.get(func).copied().unwrap_or(0)
    }

    pub fn unsupported_calls(&self, func: &str) -> u64 {
        self.unsupported.get(func).copied().unwrap_or(0)
    }

    /// Functions whose result slot was ever coerced, sorted.
    pub fn coerced_functions(&self) -> Vec<&str> {
        self.coerced.keys().map(String::as_str).collect()
    }

    /// Unsupported functions the guest called, with call counts, sorted by name.
    pub fn unsupported(&self) -> impl Iterator<Item = (&str, u64)> {
        self.unsupported.iter().map(|(name, count)| (name.as_str(), *count))
    }
}

fn bump(counts: &mut BTreeMap<String, u64>, func: &str) -> bool {
    match counts.get_mut(func) {
        Some(count) => {
            *count += 1;
            false
        }
        None => {
            counts.insert(func.to_string(), 1);
            true
        }
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} host calls", self.calls)?;
        if !self.unsupported.is_empty() {
            let list: Vec<String> = self
                .unsupported
                .iter()
                .map(|(name, count)| format!("{} x{}", name, count))
                .collect();
            write!(f, "; unsupported: {}", list.join(", "))?;
        }
        if !self.coerced.is_empty() {
            write!(f, "; coerced results: {}", self.coerced_functions().join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_occurrence_only() {
        let mut d = Diagnostics::new();
        assert!(d.record_unsupported("path_open"));
        assert!(!d.record_unsupported("path_open"));
        assert!(d.record_unsupported("fd_readdir"));
        assert_eq!(d.unsupported_calls("path_open"), 2);
        assert_eq!(d.unsupported_calls("fd_pwrite"), 0);
        let seen: Vec<_> = d.unsupported().collect();
        assert_eq!(seen, vec![("fd_readdir", 1), ("path_open", 2)]);
    }

    #[test]
    fn test_summary() {
        let mut d = Diagnostics::new();
        assert_eq!(d.to_string(), "0 host calls");
        d.record_call();
        d.record_call();
        d.record_unsupported("poll_oneoff");
        d.record_coercion("fd_write");
        assert_eq!(
            d.to_string(),
            "2 host calls; unsupported: poll_oneoff x1; coerced results: fd_write"
        );
    }
}
