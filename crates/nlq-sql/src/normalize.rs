//! Dialect normalization: a fixed, ordered list of idempotent text transforms
//! applied to a raw candidate before parsing, so near-miss dialect drift
//! from the generator (backtick identifiers, `IFNULL`, a trailing semicolon)
//! doesn't by itself fail structural validation.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

type Pass = fn(&str) -> Cow<'_, str>;

/// The ordered transform list. Order matters: later passes may assume
/// earlier ones already ran (e.g. backtick-to-quote before whitespace
/// collapse).
pub const PASSES: &[Pass] = &[
    strip_trailing_semicolons,
    backticks_to_double_quotes,
    ifnull_to_coalesce,
    year_to_extract,
    date_add_to_interval,
    datediff_to_subtraction,
    group_concat_to_string_agg,
    mysql_limit_offset_fix,
    collapse_whitespace,
];

/// Runs every pass in order, returning the fully normalized SQL.
pub fn normalize(sql: &str) -> String {
    let mut current = Cow::Borrowed(sql);
    for pass in PASSES {
        current = Cow::Owned(pass(&current).into_owned());
    }
    current.into_owned()
}

fn strip_trailing_semicolons(sql: &str) -> Cow<'_, str> {
    let trimmed = sql.trim_end();
    let stripped = trimmed.trim_end_matches(|c| c == ';' || c.is_whitespace());
    if stripped.len() == sql.len() {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(stripped.to_string())
    }
}

fn backticks_to_double_quotes(sql: &str) -> Cow<'_, str> {
    if !sql.contains('`') {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(sql.replace('`', "\""))
    }
}

fn ifnull_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bIFNULL\s*\(").unwrap())
}

fn ifnull_to_coalesce(sql: &str) -> Cow<'_, str> {
    if ifnull_re().is_match(sql) {
        Cow::Owned(ifnull_re().replace_all(sql, "COALESCE(").into_owned())
    } else {
        Cow::Borrowed(sql)
    }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bYEAR\s*\(\s*([^()]+?)\s*\)").unwrap())
}

/// `YEAR(x) -> EXTRACT(YEAR FROM x)`.
fn year_to_extract(sql: &str) -> Cow<'_, str> {
    if year_re().is_match(sql) {
        Cow::Owned(year_re().replace_all(sql, "EXTRACT(YEAR FROM $1)").into_owned())
    } else {
        Cow::Borrowed(sql)
    }
}

fn date_add_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)DATE_ADD\s*\(\s*([^,()]+?)\s*,\s*INTERVAL\s+(-?\d+)\s+(\w+)\s*\)").unwrap()
    })
}

/// `DATE_ADD(d, INTERVAL n unit) -> (d + INTERVAL 'n unit')`.
fn date_add_to_interval(sql: &str) -> Cow<'_, str> {
    if date_add_re().is_match(sql) {
        Cow::Owned(
            date_add_re()
                .replace_all(sql, "($1 + INTERVAL '$2 $3')")
                .into_owned(),
        )
    } else {
        Cow::Borrowed(sql)
    }
}

fn datediff_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)DATEDIFF\s*\(\s*([^,()]+?)\s*,\s*([^()]+?)\s*\)").unwrap())
}

/// `DATEDIFF(a, b) -> (a - b)`.
fn datediff_to_subtraction(sql: &str) -> Cow<'_, str> {
    if datediff_re().is_match(sql) {
        Cow::Owned(datediff_re().replace_all(sql, "($1 - $2)").into_owned())
    } else {
        Cow::Borrowed(sql)
    }
}

fn group_concat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)GROUP_CONCAT\s*\(\s*([^()]+?)\s*\)").unwrap())
}

/// `GROUP_CONCAT(x) -> STRING_AGG(x, ',')`.
fn group_concat_to_string_agg(sql: &str) -> Cow<'_, str> {
    if group_concat_re().is_match(sql) {
        Cow::Owned(group_concat_re().replace_all(sql, "STRING_AGG($1, ',')").into_owned())
    } else {
        Cow::Borrowed(sql)
    }
}

fn mysql_limit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)\b").unwrap())
}

/// MySQL-style `LIMIT offset, count -> LIMIT count OFFSET offset`.
fn mysql_limit_offset_fix(sql: &str) -> Cow<'_, str> {
    if mysql_limit_re().is_match(sql) {
        Cow::Owned(mysql_limit_re().replace_all(sql, "LIMIT $2 OFFSET $1").into_owned())
    } else {
        Cow::Borrowed(sql)
    }
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t]+").unwrap())
}

fn collapse_whitespace(sql: &str) -> Cow<'_, str> {
    let collapsed = whitespace_re().replace_all(sql, " ");
    if collapsed == sql {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(collapsed.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_semicolon() {
        assert_eq!(normalize("SELECT 1;"), "SELECT 1");
        assert_eq!(normalize("SELECT 1;  \n"), "SELECT 1");
    }

    #[test]
    fn converts_backticks() {
        assert_eq!(normalize("SELECT `id` FROM `orders`"), "SELECT \"id\" FROM \"orders\"");
    }

    #[test]
    fn converts_ifnull() {
        assert_eq!(normalize("SELECT IFNULL(a, 0) FROM t"), "SELECT COALESCE(a, 0) FROM t");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(normalize("SELECT   id   FROM   orders"), "SELECT id FROM orders");
    }

    #[test]
    fn converts_year_to_extract() {
        assert_eq!(
            normalize("SELECT YEAR(placed_at) FROM orders"),
            "SELECT EXTRACT(YEAR FROM placed_at) FROM orders"
        );
    }

    #[test]
    fn converts_date_add_to_interval() {
        assert_eq!(
            normalize("SELECT DATE_ADD(placed_at, INTERVAL 7 day) FROM orders"),
            "SELECT (placed_at + INTERVAL '7 day') FROM orders"
        );
    }

    #[test]
    fn converts_datediff_to_subtraction() {
        assert_eq!(
            normalize("SELECT DATEDIFF(shipped_at, placed_at) FROM orders"),
            "SELECT (shipped_at - placed_at) FROM orders"
        );
    }

    #[test]
    fn converts_group_concat_to_string_agg() {
        assert_eq!(
            normalize("SELECT GROUP_CONCAT(name) FROM customers"),
            "SELECT STRING_AGG(name, ',') FROM customers"
        );
    }

    #[test]
    fn converts_mysql_limit_offset_form() {
        assert_eq!(normalize("SELECT id FROM orders LIMIT 20, 10"), "SELECT id FROM orders LIMIT 10 OFFSET 20");
    }

    #[test]
    fn every_pass_is_idempotent() {
        let samples = [
            "SELECT `id` FROM `orders`;",
            "SELECT IFNULL(a, 0)   FROM   t;;;",
            "SELECT id FROM orders",
            "SELECT YEAR(placed_at) FROM orders",
            "SELECT DATE_ADD(placed_at, INTERVAL 7 day) FROM orders",
            "SELECT DATEDIFF(shipped_at, placed_at) FROM orders",
            "SELECT GROUP_CONCAT(name) FROM customers",
            "SELECT id FROM orders LIMIT 20, 10",
        ];
        for sample in samples {
            for pass in PASSES {
                let once = pass(sample).into_owned();
                let twice = pass(&once).into_owned();
                assert_eq!(once, twice, "pass not idempotent for {sample:?}");
            }
            let once = normalize(sample);
            let twice = normalize(&once);
            assert_eq!(once, twice);
        }
    }
}
