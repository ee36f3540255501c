//! Task color management for terminal output

use colored::*;

/// Get a consistent color for a task name
pub fn get_task_color(task_name: &str) -> Color {
    let hash = task_name
        .bytes()
        .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

    // Jewel tones, kept clear of the red/yellow/green used for status
    let colors = [
        Color::TrueColor {
            r: 147,
            g: 112,
            b: 219,
        }, // Medium slate blue
        Color::TrueColor {
            r: 64,
            g: 224,
            b: 208,
        }, // Turquoise
        Color::TrueColor {
            r: 255,
            g: 140,
            b: 0,
        }, // Dark orange
        Color::TrueColor {
            r: 199,
            g: 21,
            b: 133,
        }, // Medium violet red
        Color::TrueColor {
            r: 72,
            g: 209,
            b: 204,
        }, // Medium turquoise
        Color::TrueColor {
            r: 138,
            g: 43,
            b: 226,
        }, // Blue violet
    ];

    colors[(hash % colors.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_color_is_stable() {
        assert_eq!(get_task_color("copyLibs"), get_task_color("copyLibs"));
    }
}
