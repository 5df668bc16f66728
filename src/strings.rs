//! Localized string resolution and display formatting.
//!
//! String tables map an sno to per-language text. All tables from a snapshot
//! are merged into one lookup; Chinese is preferred, Korean and English are
//! fallbacks, and a missing sno renders a `?sno?` placeholder so callers
//! never have to special-case holes in the data.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::tables::StringRow;

/// Merged sno → text lookup built from all string tables in a snapshot.
#[derive(Debug, Default)]
pub struct LocalizedStrings {
    map: HashMap<i64, String>,
}

impl LocalizedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a string table. Earlier tables win on sno collisions.
    pub fn merge(&mut self, rows: &[StringRow]) {
        for row in rows {
            let text = row
                .zh_cn
                .as_deref()
                .or(row.kr.as_deref())
                .or(row.en.as_deref());
            if let Some(text) = text {
                self.map.entry(row.no).or_insert_with(|| text.to_string());
            }
        }
    }

    /// Resolve an sno, stripping display markup.
    pub fn get(&self, sno: i64) -> String {
        match self.map.get(&sno) {
            Some(text) => clean_tags(text),
            None => format!("?{}?", sno),
        }
    }

    /// Resolve an sno without the missing-placeholder fallback.
    pub fn try_get(&self, sno: i64) -> Option<String> {
        self.map.get(&sno).map(|t| clean_tags(t))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Strip client markup from localized text: `<color=...>` / `</color>`
/// spans and `<effect:none>` markers, in any case and with optional quotes.
/// Literal `\n` sequences become real newlines.
pub fn clean_tags(text: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| {
        Regex::new(r#"(?i)<\s*color\s*=\s*"?[#0-9a-z]*"?\s*>|<\s*/\s*color\s*>|<\s*effect\s*:\s*"?none"?\s*>"#)
            .unwrap()
    });
    re.replace_all(text, "").replace("\\n", "\n")
}

/// Format a number with CJK magnitude units. Values of at least 10^4 divide
/// down through 万, 亿, 兆, 京, rendered with one decimal place and a
/// trailing `.0` dropped.
pub fn format_number(n: f64) -> String {
    const UNITS: [&str; 4] = ["万", "亿", "兆", "京"];

    if n.abs() < 10_000.0 {
        return trim_decimal(n);
    }

    let mut value = n;
    let mut unit = "";
    for u in UNITS {
        if value.abs() < 10_000.0 {
            break;
        }
        value /= 10_000.0;
        unit = u;
    }
    format!("{}{}", trim_decimal((value * 10.0).round() / 10.0), unit)
}

/// Render with one decimal at most, dropping `.0`.
pub fn trim_decimal(v: f64) -> String {
    if (v - v.trunc()).abs() < 1e-9 {
        format!("{}", v.trunc() as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// Render a raw stat value the way the client does: fractional values are
/// percentages, whole values are flat amounts.
pub fn format_stat_value(v: f64) -> String {
    if v.abs() < 1.0 && v != 0.0 {
        format_percent(v)
    } else {
        trim_decimal(v)
    }
}

/// Render a ratio as a percentage with one decimal, dropping `.0`.
pub fn format_percent(ratio: f64) -> String {
    let pct = (ratio * 1000.0).round() / 10.0;
    format!("{}%", trim_decimal(pct))
}
