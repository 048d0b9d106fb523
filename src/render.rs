use std::io;

use crate::query::{GroupReport, KeyValue};

/// Print the whole report: per-pattern search summaries first, then one block
/// per entry.
pub fn render_report<W: io::Write>(out: &mut W, report: &GroupReport) -> io::Result<()> {
    for scan in &report.patterns {
        writeln!(out)?;
        writeln!(out, "Searching for keys matching pattern: {}", scan.pattern)?;
        if let Some(err) = &scan.error {
            writeln!(out, "Error getting keys: {}", err)?;
        }
        if scan.found == 0 {
            writeln!(out, "No keys found for pattern: {}", scan.pattern)?;
        } else {
            writeln!(out, "Found {} keys for pattern: {}", scan.found, scan.pattern)?;
        }
    }

    if report.entries.is_empty() {
        writeln!(out)?;
        writeln!(out, "No group information found in Redis.")?;
        return Ok(());
    }

    writeln!(out)?;
    writeln!(
        out,
        "--- Found {} group-related entries ---",
        report.entries.len()
    )?;

    for entry in &report.entries {
        writeln!(out)?;
        writeln!(out, "Key: {}", entry.key)?;
        writeln!(out, "Type: {}", entry.value.type_name())?;
        render_value(out, &entry.value)?;
        writeln!(out, "{}", "-".repeat(40))?;
    }

    Ok(())
}

fn render_value<W: io::Write>(out: &mut W, value: &KeyValue) -> io::Result<()> {
    match value {
        KeyValue::String(s) => render_string(out, s),
        KeyValue::Hash(pairs) => {
            writeln!(out, "Value:")?;
            for (field, val) in pairs {
                writeln!(out, "  {}: {}", field, val)?;
            }
            Ok(())
        }
        KeyValue::List(items) | KeyValue::Set(items) => {
            writeln!(out, "Value:")?;
            for item in items {
                writeln!(out, "  - {}", item)?;
            }
            Ok(())
        }
        KeyValue::SortedSet(members) => {
            writeln!(out, "Value:")?;
            for (member, score) in members {
                writeln!(out, "  - {} (score: {})", member, score)?;
            }
            Ok(())
        }
        KeyValue::Unknown(_) => writeln!(out, "  Value: Unknown type"),
        KeyValue::Error(msg) => writeln!(out, "Error: {}", msg),
    }
}

/// Strings that look like embedded JSON get pretty-printed; anything else is
/// echoed verbatim. Best effort only: near-JSON text falls through unchanged.
fn render_string<W: io::Write>(out: &mut W, raw: &str) -> io::Result<()> {
    if raw.starts_with('{') || raw.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(raw) {
            let pretty =
                serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| raw.to_string());
            writeln!(out, "Value (JSON):")?;
            writeln!(out, "{}", pretty)?;
            return Ok(());
        }
    }
    writeln!(out, "  Value: {}", raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{GroupEntry, GroupReport, PatternScan};

    fn rendered(report: &GroupReport) -> String {
        let mut buf = Vec::new();
        render_report(&mut buf, report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn report_with(entries: Vec<GroupEntry>) -> GroupReport {
        GroupReport {
            patterns: vec![PatternScan {
                pattern: "group:*".to_string(),
                found: entries.len(),
                error: None,
            }],
            entries,
        }
    }

    fn entry(key: &str, value: KeyValue) -> GroupEntry {
        GroupEntry {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn empty_patterns_report_no_keys_and_run_continues() {
        let report = GroupReport {
            patterns: vec![
                PatternScan {
                    pattern: "group:*".to_string(),
                    found: 0,
                    error: None,
                },
                PatternScan {
                    pattern: "groups:*".to_string(),
                    found: 2,
                    error: None,
                },
            ],
            entries: vec![
                entry("groups:a", KeyValue::String("x".to_string())),
                entry("groups:b", KeyValue::String("y".to_string())),
            ],
        };
        let out = rendered(&report);
        assert!(out.contains("No keys found for pattern: group:*"));
        assert!(out.contains("Found 2 keys for pattern: groups:*"));
        assert!(out.contains("--- Found 2 group-related entries ---"));
    }

    #[test]
    fn empty_report_prints_nothing_found_notice() {
        let report = GroupReport {
            patterns: vec![PatternScan {
                pattern: "group:*".to_string(),
                found: 0,
                error: None,
            }],
            entries: vec![],
        };
        let out = rendered(&report);
        assert!(out.contains("No group information found in Redis."));
        assert!(!out.contains("group-related entries"));
    }

    #[test]
    fn scan_error_is_reported_inline() {
        let report = GroupReport {
            patterns: vec![PatternScan {
                pattern: "group:*".to_string(),
                found: 0,
                error: Some("connection reset".to_string()),
            }],
            entries: vec![],
        };
        let out = rendered(&report);
        assert!(out.contains("Error getting keys: connection reset"));
        assert!(out.contains("No keys found for pattern: group:*"));
    }

    #[test]
    fn hash_prints_one_line_per_field() {
        let report = report_with(vec![entry(
            "group:cfg",
            KeyValue::Hash(vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]),
        )]);
        let out = rendered(&report);
        assert!(out.contains("Type: hash"));
        assert!(out.contains("\n  a: 1\n"));
        assert!(out.contains("\n  b: 2\n"));
    }

    #[test]
    fn list_and_set_print_dashed_elements() {
        let report = report_with(vec![
            entry(
                "group:members",
                KeyValue::List(vec!["alice".to_string(), "bob".to_string()]),
            ),
            entry("group:tags", KeyValue::Set(vec!["ops".to_string()])),
        ]);
        let out = rendered(&report);
        assert!(out.contains("\n  - alice\n  - bob\n"));
        assert!(out.contains("\n  - ops\n"));
    }

    #[test]
    fn zset_prints_member_with_score() {
        let report = report_with(vec![entry(
            "group:ranks",
            KeyValue::SortedSet(vec![("alice".to_string(), 3.0), ("bob".to_string(), 5.5)]),
        )]);
        let out = rendered(&report);
        assert!(out.contains("Type: zset"));
        assert!(out.contains("  - alice (score: 3)"));
        assert!(out.contains("  - bob (score: 5.5)"));
    }

    #[test]
    fn json_object_string_is_pretty_printed() {
        let report = report_with(vec![entry(
            "group:meta",
            KeyValue::String("{\"name\":\"ops\",\"size\":4}".to_string()),
        )]);
        let out = rendered(&report);
        assert!(out.contains("Value (JSON):"));
        assert!(out.contains("\"name\": \"ops\""));
        assert!(out.contains("\"size\": 4"));
    }

    #[test]
    fn json_array_string_is_pretty_printed() {
        let report = report_with(vec![entry(
            "group:ids",
            KeyValue::String("[1,2,3]".to_string()),
        )]);
        let out = rendered(&report);
        assert!(out.contains("Value (JSON):"));
        assert!(out.contains("\n  1,\n  2,\n  3\n"));
    }

    #[test]
    fn near_json_string_falls_back_to_raw() {
        let report = report_with(vec![entry(
            "group:broken",
            KeyValue::String("{not json at all".to_string()),
        )]);
        let out = rendered(&report);
        assert!(out.contains("  Value: {not json at all"));
        assert!(!out.contains("Value (JSON):"));
    }

    #[test]
    fn plain_string_prints_verbatim() {
        let report = report_with(vec![entry(
            "group:name",
            KeyValue::String("engineering".to_string()),
        )]);
        let out = rendered(&report);
        assert!(out.contains("  Value: engineering"));
    }

    #[test]
    fn error_entry_shows_message_and_others_still_render() {
        let report = report_with(vec![
            entry("group:bad", KeyValue::Error("boom".to_string())),
            entry("group:ok", KeyValue::String("fine".to_string())),
        ]);
        let out = rendered(&report);
        assert!(out.contains("Key: group:bad"));
        assert!(out.contains("Type: error"));
        assert!(out.contains("Error: boom"));
        assert!(out.contains("Key: group:ok"));
        assert!(out.contains("  Value: fine"));
    }

    #[test]
    fn unknown_type_prints_reported_name_and_marker() {
        let report = report_with(vec![entry(
            "group:events",
            KeyValue::Unknown("stream".to_string()),
        )]);
        let out = rendered(&report);
        assert!(out.contains("Type: stream"));
        assert!(out.contains("  Value: Unknown type"));
    }

    #[test]
    fn each_entry_ends_with_separator() {
        let report = report_with(vec![
            entry("group:a", KeyValue::String("1".to_string())),
            entry("group:b", KeyValue::String("2".to_string())),
        ]);
        let out = rendered(&report);
        let separators = out.matches(&"-".repeat(40)).count();
        assert_eq!(separators, 2);
    }
}
