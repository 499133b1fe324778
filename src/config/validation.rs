//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Unknown keys are found on the raw `toml::Value` tree before serde runs, so
//! a typo surfaces as a warning instead of silently falling back to a default.

use super::RenderConfig;
use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `RenderConfig`.
///
/// Keep in step with the structs in `render_config.rs`. Entries of
/// `layout.actuators` are array elements and are not walked.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "layout",
        "layout.actuators",
        "triangulation",
        "triangulation.min_triangle_area",
        "phantom",
        "phantom.min_distance",
        "timing",
        "timing.soa_slope",
        "timing.soa_base_s",
        "timing.sequential_pause_ratio",
        "timing.resample_max_interval_s",
        "timing.resample_speed",
        "frequency",
        "frequency.min_hz",
        "frequency.max_hz",
        "frequency.steps",
        "protocol",
        "protocol.variant",
        "protocol.max_frame_bytes",
        "protocol.duty_gamma",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect dotted key paths of every table and value.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties go to the
/// lexicographically smallest key so the suggestion is stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (levenshtein(unknown, k), k))
        .filter(|&(d, _)| d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation
// ============================================================================

/// Warnings for every key in `raw_toml` that `RenderConfig` does not know.
///
/// Never fails; TOML syntax errors are left to the serde pass.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check a parsed config.
///
/// Returns (errors, warnings): errors are values the pipeline cannot run
/// with; warnings are legal but outside the usual calibration.
pub fn validate_ranges(config: &RenderConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let descriptor = config.protocol.variant.descriptor();

    // Layout
    let layout = &config.layout;
    if layout.actuators.is_empty() {
        errors.push("layout.actuators is empty".to_string());
    }
    for id in layout.duplicate_ids() {
        errors.push(format!("layout.actuators: id {id} appears more than once"));
    }
    for a in &layout.actuators {
        if !(a.x.is_finite() && a.y.is_finite()) {
            errors.push(format!("layout.actuators: id {} has non-finite position ({}, {})", a.id, a.x, a.y));
        }
        if u32::from(a.id) > descriptor.address_max() {
            errors.push(format!(
                "layout.actuators: id {} exceeds the {} address range (0-{})",
                a.id,
                descriptor.name,
                descriptor.address_max()
            ));
        }
    }
    if !layout.actuators.is_empty() && layout.actuators.len() < 3 {
        warnings.push(ValidationWarning {
            field: "layout.actuators".to_string(),
            message: format!(
                "layout has {} actuator(s); phantom points need at least 3",
                layout.actuators.len()
            ),
            suggestion: None,
        });
    }

    check_positive(&mut errors, "triangulation.min_triangle_area", config.triangulation.min_triangle_area);
    check_positive(&mut errors, "phantom.min_distance", config.phantom.min_distance);

    // Timing
    let t = &config.timing;
    // Negative constants would start a step before the one it follows.
    check_non_negative(&mut errors, "timing.soa_slope", t.soa_slope);
    check_non_negative(&mut errors, "timing.soa_base_s", t.soa_base_s);
    check_non_negative(&mut errors, "timing.sequential_pause_ratio", t.sequential_pause_ratio);
    if let Some(v) = t.resample_max_interval_s {
        check_positive(&mut errors, "timing.resample_max_interval_s", v);
    }
    if let Some(v) = t.resample_speed {
        check_positive(&mut errors, "timing.resample_speed", v);
    }
    if t.resample_max_interval_s.is_some() != t.resample_speed.is_some() {
        warnings.push(ValidationWarning {
            field: "timing".to_string(),
            message: "resampling needs both resample_max_interval_s and resample_speed; it stays disabled".to_string(),
            suggestion: None,
        });
    }

    // Frequency
    let f = &config.frequency;
    if !(f.min_hz.is_finite() && f.max_hz.is_finite() && f.min_hz > 0.0 && f.min_hz < f.max_hz) {
        errors.push(format!(
            "frequency: need 0 < min_hz < max_hz (got {} - {})",
            f.min_hz, f.max_hz
        ));
    }
    if f.steps < 2 {
        errors.push(format!("frequency.steps = {} must be >= 2", f.steps));
    } else if f.steps - 1 > descriptor.freq_index_max() as usize {
        errors.push(format!(
            "frequency.steps = {} does not fit the {} frequency field (max {} steps)",
            f.steps,
            descriptor.name,
            descriptor.freq_index_max() + 1
        ));
    }
    if f.min_hz < 20.0 || f.max_hz > 1000.0 {
        warnings.push(ValidationWarning {
            field: "frequency".to_string(),
            message: format!(
                "frequency range {} - {} Hz is outside the usual tactile band (20-1000 Hz)",
                f.min_hz, f.max_hz
            ),
            suggestion: None,
        });
    }

    // Protocol
    let p = &config.protocol;
    if p.max_frame_bytes < descriptor.width_bytes {
        errors.push(format!(
            "protocol.max_frame_bytes = {} cannot hold one {}-byte {} command",
            p.max_frame_bytes, descriptor.width_bytes, descriptor.name
        ));
    } else if p.max_frame_bytes % descriptor.width_bytes != 0 {
        warnings.push(ValidationWarning {
            field: "protocol.max_frame_bytes".to_string(),
            message: format!(
                "protocol.max_frame_bytes = {} is not a multiple of the {}-byte command width; the remainder is never used",
                p.max_frame_bytes, descriptor.width_bytes
            ),
            suggestion: None,
        });
    }
    check_positive(&mut errors, "protocol.duty_gamma", p.duty_gamma);

    (errors, warnings)
}

fn check_non_negative(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(format!("{name} = {value} must be finite and >= 0"));
    }
}

fn check_positive(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(format!("{name} = {value} must be finite and > 0"));
    }
}

// ============================================================================
// Tests
// ============================================================================
