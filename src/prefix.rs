// src/prefix.rs

use std::collections::{BTreeSet, HashMap};

/// Width each release window needs so that all of its version strings line up
/// when printed in a column.
///
/// Windows are tried in descending order so that a window which is a textual
/// prefix of another (`1.0` and `1.0.1`) only claims versions the longer one
/// does not. Versions outside every window are ignored.
pub fn prefix_length_per_primary_version<V, P>(versions: V, primary_versions: P) -> HashMap<String, usize>
where
    V: IntoIterator,
    V::Item: AsRef<str>,
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let ordered: BTreeSet<String> = primary_versions
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect();

    let mut lengths: HashMap<String, usize> = HashMap::new();
    for version in versions {
        let version = version.as_ref();
        let Some(primary) = ordered.iter().rev().find(|p| version.starts_with(p.as_str())) else {
            continue;
        };

        let length = version.trim().chars().count();
        let stored = lengths.entry(primary.clone()).or_insert(length);
        *stored = (*stored).max(length);
    }
    lengths
}
