// src/exec/env.rs

//! Environment handling for spawned processes.
//!
//! Children get the supervisor's own environment with the configured
//! `KEY=VALUE` entries applied on top. Entries are applied in order, so a
//! later entry replaces an earlier one with the same key, whether that
//! earlier one was inherited or configured.

use std::collections::HashMap;
use std::ffi::OsString;

/// Merge `extra` (`KEY=VALUE` strings) onto `base`.
///
/// The result keeps the position of the first occurrence of each key and the
/// value of the last one. Entries without `=` are ignored. Keys and values
/// from `base` are passed through byte for byte, UTF-8 or not.
pub fn merge_env<I>(base: I, extra: &[String]) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut merged: Vec<(OsString, OsString)> = Vec::new();
    let mut index: HashMap<OsString, usize> = HashMap::new();

    let extra_pairs = extra.iter().filter_map(|entry| {
        entry
            .split_once('=')
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
    });

    for (key, value) in base.into_iter().chain(extra_pairs) {
        match index.get(&key) {
            Some(&i) => merged[i].1 = value,
            None => {
                index.insert(key.clone(), merged.len());
                merged.push((key, value));
            }
        }
    }

    merged
}

/// The supervisor's own environment, as raw OS strings.
pub fn inherited_env() -> Vec<(OsString, OsString)> {
    std::env::vars_os().collect()
}

/// `inherited_env()` with `extra` merged on top.
pub fn child_env(extra: &[String]) -> Vec<(OsString, OsString)> {
    merge_env(inherited_env(), extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::ffi::OsStringExt;

    fn pair(k: &str, v: &str) -> (OsString, OsString) {
        (k.into(), v.into())
    }

    #[test]
    fn extra_entries_are_appended() {
        let merged = merge_env(vec![pair("PATH", "/bin")], &["MODE=prod".to_string()]);
        assert_eq!(merged, vec![pair("PATH", "/bin"), pair("MODE", "prod")]);
    }

    #[test]
    fn later_entries_shadow_earlier_keys() {
        let merged = merge_env(
            vec![pair("MODE", "dev"), pair("HOME", "/root")],
            &["MODE=prod".to_string(), "X=1".to_string(), "X=2".to_string()],
        );
        assert_eq!(
            merged,
            vec![pair("MODE", "prod"), pair("HOME", "/root"), pair("X", "2")]
        );
    }

    #[test]
    fn values_may_contain_equals_and_malformed_entries_are_dropped() {
        let merged = merge_env(
            Vec::<(OsString, OsString)>::new(),
            &["OPTS=a=b".to_string(), "NOEQUALS".to_string(), "EMPTY=".to_string()],
        );
        assert_eq!(merged, vec![pair("OPTS", "a=b"), pair("EMPTY", "")]);
    }

    #[test]
    fn non_utf8_inherited_entries_survive_the_merge() {
        let raw_value = OsString::from_vec(vec![0x66, 0xff, 0x6f]);
        let raw_key = OsString::from_vec(vec![0x4b, 0xfe]);
        let base = vec![
            (OsString::from("BIN"), raw_value.clone()),
            (raw_key.clone(), OsString::from("x")),
        ];

        let merged = merge_env(base, &["MODE=prod".to_string()]);

        assert_eq!(
            merged,
            vec![
                (OsString::from("BIN"), raw_value),
                (raw_key, OsString::from("x")),
                pair("MODE", "prod"),
            ]
        );
    }

    #[test]
    fn configured_entry_replaces_non_utf8_inherited_value() {
        let base = vec![(OsString::from("BIN"), OsString::from_vec(vec![0xff]))];

        let merged = merge_env(base, &["BIN=clean".to_string()]);

        assert_eq!(merged, vec![pair("BIN", "clean")]);
    }
}
