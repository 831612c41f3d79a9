//! Configuration validation with unknown field detection.

use serde_json::Value;

use super::Config;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["telegram", "forward", "storage", "logging"];

/// Known fields for each section. Nested as section.field.
const KNOWN_TELEGRAM: &[&str] = &["bot_token", "api_base", "timeout_secs"];

const KNOWN_FORWARD: &[&str] = &[
    "inter_message_delay_ms",
    "default_retry_after_secs",
    "status_clear_secs",
    "checkpoint_every",
    "anchor_text",
];

const KNOWN_STORAGE: &[&str] = &["dir"];

const KNOWN_LOGGING: &[&str] = &["format", "level", "file"];

/// Unknown keys further than this from every known key get no suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl DiagnosticLevel {
    fn tag(self) -> &'static str {
        match self {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        }
    }
}

/// One finding of `tgrelay config check`. An empty `path` means the whole file.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn ok(message: &str) -> Self {
        Self {
            level: DiagnosticLevel::Ok,
            path: String::new(),
            message: message.to_string(),
        }
    }

    fn warn(path: &str, message: &str) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.level.tag())?;
        if !self.path.is_empty() {
            write!(f, " {}:", self.path)?;
        }
        write!(f, " {}", self.message)
    }
}

/// Character-level edit distance, computed one row at a time.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=target.len()).collect();
    let mut row = vec![0; target.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        row[0] = i + 1;
        for (j, cb) in target.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != *cb);
            row[j + 1] = substitute.min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[target.len()]
}

/// The known key nearest to `unknown`, if any is close enough to be a typo.
pub fn closest_field<'a>(unknown: &str, known: &[&'a str]) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in known {
        let distance = edit_distance(unknown, candidate);
        if distance > MAX_SUGGESTION_DISTANCE {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(name, _)| name)
}

fn check_keys(
    obj: &serde_json::Map<String, Value>,
    prefix: &str,
    known: &[&str],
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let before = diagnostics.len();
    for key in obj.keys().filter(|k| !known.contains(&k.as_str())) {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let message = match closest_field(key, known) {
            Some(near) => format!("Unknown field '{}' (did you mean '{}'?)", key, near),
            None => format!("Unknown field '{}'", key),
        };
        diagnostics.push(Diagnostic::error(path, message));
    }
    diagnostics.len() > before
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::error("", "Config must be a JSON object"));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::ok("Valid JSON"));

    let mut has_unknown = check_keys(obj, "", KNOWN_TOP_LEVEL, &mut diagnostics);

    let sections: [(&str, &[&str]); 4] = [
        ("telegram", KNOWN_TELEGRAM),
        ("forward", KNOWN_FORWARD),
        ("storage", KNOWN_STORAGE),
        ("logging", KNOWN_LOGGING),
    ];
    for (section, known) in sections {
        if let Some(section_obj) = obj.get(section).and_then(|v| v.as_object()) {
            has_unknown |= check_keys(section_obj, section, known, &mut diagnostics);
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::ok("All fields recognized"));
    }

    diagnostics
}

/// Validate semantic values of a loaded config.
///
/// Returns warnings (not errors): every value here has a usable fallback.
pub fn validate_values(config: &Config) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let token = config.telegram.bot_token.trim();
    if token.is_empty() {
        diagnostics.push(Diagnostic::warn("telegram.bot_token", "Empty, forwarding cannot start"));
    } else if config.telegram.bot_id().is_none() {
        diagnostics.push(Diagnostic::warn(
            "telegram.bot_token",
            "Does not look like '<bot id>:<secret>'",
        ));
    }

    if !config.telegram.api_base.starts_with("http://")
        && !config.telegram.api_base.starts_with("https://")
    {
        diagnostics.push(Diagnostic::warn("telegram.api_base", "Should be an http(s) URL"));
    }

    if config.forward.inter_message_delay_ms < 50 {
        diagnostics.push(Diagnostic::warn(
            "forward.inter_message_delay_ms",
            "Below 50ms, expect frequent throttling",
        ));
    }

    if config.forward.anchor_text.trim().is_empty() {
        diagnostics.push(Diagnostic::warn(
            "forward.anchor_text",
            "Empty anchor text is rejected by the Bot API",
        ));
    }

    diagnostics
}
