//! Layer names and colors that do not collide with existing layers.

use crate::color::Color;

/// Returns `name` if no existing layer has it, otherwise the first of `name (1)`, `name (2)`, ... that is free.
///
/// The suffix is always appended to the requested name as is: asking for `X (1)` when it is taken gives
/// `X (1) (1)`.
pub fn unique_name<'a>(existing: impl IntoIterator<Item = &'a str> + Clone, name: &str) -> String {
    let is_taken = |candidate: &str| existing.clone().into_iter().any(|n| n == candidate);

    if !is_taken(name) {
        return name.to_string();
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{name} ({counter})");
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Returns the first palette color not used by any existing layer, or a random color if the palette is exhausted.
///
/// Uniqueness is best-effort: a random color may coincide with an existing one.
pub fn pick_color(used: &[Color], palette: &[Color], seed: u64) -> Color {
    palette
        .iter()
        .find(|color| !used.contains(color))
        .copied()
        .unwrap_or_else(|| Color::random(seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_str(names: &[String]) -> Vec<&str> {
        names.iter().map(String::as_str).collect()
    }

    #[test]
    fn unique_name_appends_counter() {
        let mut names = vec!["Roads".to_string()];

        assert_eq!(unique_name(as_str(&names), "Rivers"), "Rivers");

        let first = unique_name(as_str(&names), "Roads");
        assert_eq!(first, "Roads (1)");
        names.push(first);

        let second = unique_name(as_str(&names), "Roads");
        assert_eq!(second, "Roads (2)");
    }

    #[test]
    fn unique_name_fills_gaps() {
        let names = ["Roads", "Roads (2)"];
        assert_eq!(unique_name(names, "Roads"), "Roads (1)");
    }

    #[test]
    fn palette_colors_are_used_first() {
        let palette = [Color::RED, Color::GREEN, Color::BLUE];
        assert_eq!(pick_color(&[], &palette, 0), Color::RED);
        assert_eq!(pick_color(&[Color::RED, Color::BLUE], &palette, 0), Color::GREEN);
    }
}
