//! Parser for `git status --porcelain=v1 --branch -z`
//!
//! Records are NUL-terminated. The first record is the branch header
//! (`## main...origin/main [ahead 1, behind 2]`); each following record is
//! `XY path`, and renames or copies carry the source path as an extra record.

use std::collections::BTreeMap;

use mdnote_core::domain::FileStatus;

/// Parsed output of one porcelain status call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PorcelainStatus {
    /// Current branch, `None` on a detached HEAD
    pub branch: Option<String>,
    /// Upstream tracking ref, e.g. `origin/main`
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
    pub entries: BTreeMap<String, FileStatus>,
}

pub fn parse_porcelain(raw: &str) -> PorcelainStatus {
    let mut status = PorcelainStatus::default();
    let mut records = raw.split('\0').filter(|r| !r.is_empty());

    while let Some(record) = records.next() {
        if let Some(header) = record.strip_prefix("## ") {
            parse_branch_header(header, &mut status);
            continue;
        }

        let mut chars = record.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        // "XY " prefix is three bytes
        let Some(path) = record.get(3..) else {
            continue;
        };

        if matches!(x, 'R' | 'C') || matches!(y, 'R' | 'C') {
            // source path of the rename/copy
            records.next();
        }

        status
            .entries
            .insert(path.to_string(), FileStatus::new(x, y));
    }

    status
}

fn parse_branch_header(header: &str, status: &mut PorcelainStatus) {
    if let Some(name) = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
    {
        status.branch = Some(name.trim().to_string());
        return;
    }
    if header.starts_with("HEAD (no branch)") {
        return;
    }

    let (refs, tracking) = match header.find(" [") {
        Some(idx) => (&header[..idx], Some(&header[idx + 2..])),
        None => (header, None),
    };

    match refs.split_once("...") {
        Some((branch, upstream)) => {
            status.branch = Some(branch.to_string());
            status.upstream = Some(upstream.trim().to_string());
        }
        None => status.branch = Some(refs.trim().to_string()),
    }

    if let Some(tracking) = tracking {
        for part in tracking.trim_end_matches(']').split(',') {
            let part = part.trim();
            if let Some(n) = part.strip_prefix("ahead ") {
                status.ahead = n.parse().unwrap_or(0);
            } else if let Some(n) = part.strip_prefix("behind ") {
                status.behind = n.parse().unwrap_or(0);
            }
        }
    }
}
