pub mod csv;
pub mod json;

/// Shortest representation that parses back to the same `f64`; non-finite
/// values become empty fields.
pub fn format_f64(v: f64) -> String {
    if v.is_finite() {
        format!("{}", v)
    } else {
        String::new()
    }
}

/// Probabilities are `f32` values widened to `f64`; print them at `f32` precision.
pub fn format_proba(p: f64) -> String {
    if p.is_finite() {
        format!("{}", p as f32)
    } else {
        String::new()
    }
}
