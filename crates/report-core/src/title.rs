//! Block title synthesis.

use crate::catalog::capitalize;

/// Synthesizes a title such as `"Revenue, Sales, and Orders by Region"`.
///
/// Metrics are joined with `and` for two, and with commas plus a final
/// `, and` for three or more. The dimension label is capitalized. With no
/// metrics the title reads `"Data by <D>"`.
#[must_use]
pub fn synthesize_title(metrics: &[String], dimension_label: &str) -> String {
    let metrics_label = match metrics {
        [] => "Data".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    };
    format!("{} by {}", metrics_label, capitalize(dimension_label))
}
