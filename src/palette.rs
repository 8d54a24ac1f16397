//! Memoised silo colours for charts, tables and selection lists.

use std::collections::HashMap;

/// Fixed palette, assigned round-robin in first-seen order.
pub const SILO_COLORS: [&str; 10] = [
    "#F97316", "#0EA5E9", "#10B981", "#8B5CF6", "#F59E0B", "#EF4444", "#84CC16", "#06B6D4",
    "#EC4899", "#78716C",
];

/// Colour cache keyed by silo display name.
///
/// Keyed by display name, not device id: silos with the same generated name
/// in different branches share a colour.
#[derive(Debug, Default)]
pub struct ColorPalette {
    assigned: HashMap<String, &'static str>,
}

impl ColorPalette {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour for `name`, assigning the next palette entry on first sight.
    pub fn color_for(&mut self, name: &str) -> &'static str {
        if let Some(color) = self.assigned.get(name).copied() {
            return color;
        }
        let color = SILO_COLORS[self.assigned.len() % SILO_COLORS.len()];
        self.assigned.insert(name.to_string(), color);
        color
    }

    /// Forget every assignment.
    pub fn reset(&mut self) {
        self.assigned.clear();
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_color_is_idempotent() {
        // ---
        let mut palette = ColorPalette::new();
        let first = palette.color_for("ไซโล 1");
        assert_eq!(palette.color_for("ไซโล 1"), first);
        assert_eq!(palette.assigned.len(), 1);
    }

    #[test]
    fn test_round_robin_in_first_seen_order() {
        // ---
        let mut palette = ColorPalette::new();
        let names: Vec<String> = (0..SILO_COLORS.len() + 3)
            .map(|i| format!("silo-{}", i))
            .collect();

        for (i, name) in names.iter().enumerate() {
            assert_eq!(palette.color_for(name), SILO_COLORS[i % SILO_COLORS.len()]);
        }
        // Re-asking in a different order changes nothing.
        for (i, name) in names.iter().enumerate().rev() {
            assert_eq!(palette.color_for(name), SILO_COLORS[i % SILO_COLORS.len()]);
        }
    }

    #[test]
    fn test_reset_restarts_assignment() {
        // ---
        let mut palette = ColorPalette::new();
        palette.color_for("a");
        palette.color_for("b");
        palette.reset();

        assert!(palette.assigned.is_empty());
        assert_eq!(palette.color_for("b"), SILO_COLORS[0]);
    }

    #[test]
    fn test_same_display_name_shares_color_across_branches() {
        // ---
        // Known quirk: "ไซโล 1" in two provinces is one cache entry.
        let mut palette = ColorPalette::new();
        let saraburi = palette.color_for("ไซโล 1");
        palette.color_for("ไซโล 2");
        let ratchaburi = palette.color_for("ไซโล 1");
        assert_eq!(saraburi, ratchaburi);
    }
}
