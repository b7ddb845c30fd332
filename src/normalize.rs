// src/normalize.rs
//! Hostname canonicalization and scope checking

use crate::types::Subdomain;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;

/// Canonicalize `raw` and keep it only if it belongs to `target`.
///
/// Lowercases, trims, drops a leading `*.` and a single trailing dot. The
/// result must equal `target` or end with `"." + target`; a plain substring
/// match is not enough, so `notexample.com` is rejected for `example.com`.
pub fn normalize(raw: &str, target: &str) -> Option<Subdomain> {
    let mut name = raw.trim().to_ascii_lowercase();

    if let Some(rest) = name.strip_prefix("*.") {
        name = rest.to_string();
    }
    if name.ends_with('.') {
        name.pop();
    }

    if !is_valid_hostname(&name) {
        return None;
    }

    let target = target.trim().trim_end_matches('.').to_ascii_lowercase();
    if target.is_empty() || !in_scope(&name, &target) {
        return None;
    }

    Some(Subdomain::new_unchecked(name))
}

/// Label-boundary suffix match. Both sides must already be lowercase.
pub fn in_scope(name: &str, target: &str) -> bool {
    match name.strip_suffix(target) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// Structural check on an already-lowercased name
pub fn is_valid_hostname(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return false;
    }

    name.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    // '_' shows up in real SRV/DKIM owner names returned by CT and AXFR
    label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}
