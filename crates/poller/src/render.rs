#![forbid(unsafe_code)]

use crate::client::SnapshotView;
use std::fmt::Write as _;

/// Terminal rendering of the attending/waitlist split. Pure so the watch
/// loop stays trivially testable.
pub(crate) fn render_snapshot(snapshot: &SnapshotView, capacity: usize) -> String {
    let mut out = String::new();
    let names = &snapshot.names;
    let cut = names.len().min(capacity);

    let status = if snapshot.is_open { "OPEN" } else { "CLOSED" };
    let _ = writeln!(
        out,
        "list {status} — {} attending, {} waitlisted",
        cut,
        names.len() - cut
    );

    for (i, name) in names[..cut].iter().enumerate() {
        let _ = writeln!(out, "  {:>2}. {name}", i + 1);
    }
    if names.len() > cut {
        let _ = writeln!(out, "waitlist:");
        for (i, name) in names[cut..].iter().enumerate() {
            let _ = writeln!(out, "  {:>2}. {name}", i + 1);
        }
    }
    out
}
