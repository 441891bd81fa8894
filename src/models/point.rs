use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One sample from `video_view_retention` or `engagement_likes` as the API sends it.
///
/// Both fields usually arrive as strings, but numbers are accepted too.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawPoint {
    #[serde(default)]
    pub second: Option<Value>,
    #[serde(default)]
    pub percentage: Option<Value>,
}

impl RawPoint {
    /// Build a point from the string form used by the analytics API
    pub fn from_strs(second: &str, percentage: &str) -> Self {
        Self {
            second: Some(Value::String(second.to_string())),
            percentage: Some(Value::String(percentage.to_string())),
        }
    }

    /// Build a point from already-numeric values
    pub fn new(second: i64, percentage: f64) -> Self {
        Self {
            second: Some(Value::from(second)),
            percentage: Some(Value::from(percentage)),
        }
    }

    /// Parse into a typed sample, degrading malformed fields to zero
    pub fn parse(&self) -> SamplePoint {
        SamplePoint {
            second: lenient_int(self.second.as_ref()),
            percentage: lenient_float(self.percentage.as_ref()),
        }
    }
}

/// A parsed sample: `percentage` is a ratio in [0, 1], not pre-multiplied by 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub second: i64,
    pub percentage: f64,
}

/// Parse an integer the way the analytics consumers always have: longest
/// leading integer prefix, zero for anything missing or unparsable.
pub fn lenient_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::String(s)) => integer_prefix(s).unwrap_or(0),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
                    .unwrap_or(0)
            }
        }
        _ => 0,
    }
}

/// Parse a float from its longest leading decimal prefix, zero on failure
pub fn lenient_float(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::String(s)) => float_prefix(s),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

fn integer_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse().ok()
}

fn float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}
