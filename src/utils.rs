use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod), chosen by `--dev`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "todo-canvas-dev",
            Profile::Prod => "todo-canvas",
        }
    }
}

fn project_dirs(profile: Profile) -> Option<ProjectDirs> {
    ProjectDirs::from("com", "todo-canvas", profile.app_name())
}

/// Configuration directory for the profile
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Data directory for the profile (storage and log file)
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    project_dirs(profile).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parsed key binding information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyBinding {
    pub key_code: KeyCode,
    pub requires_ctrl: bool,
}

impl ParsedKeyBinding {
    /// Whether a key event triggers this binding.
    /// Shift is ignored so that symbols like `+` match on every layout.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        if has_primary_modifier(key.modifiers) != self.requires_ctrl {
            return false;
        }
        self.key_code == key.code
    }
}

/// Check if a key event has the primary modifier (Ctrl on Windows/Linux, Ctrl or Option/Alt on macOS)
pub fn has_primary_modifier(modifiers: KeyModifiers) -> bool {
    #[cfg(target_os = "macos")]
    {
        modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::ALT)
    }

    #[cfg(not(target_os = "macos"))]
    {
        modifiers.contains(KeyModifiers::CONTROL)
    }
}

/// Format a key binding string for display, showing the platform-appropriate modifier
pub fn format_key_binding_for_display(key_binding: &str) -> String {
    #[cfg(target_os = "macos")]
    {
        key_binding.replace("Ctrl+", "Opt+")
    }

    #[cfg(not(target_os = "macos"))]
    {
        key_binding.to_string()
    }
}

/// Parse a key binding string from config into a ParsedKeyBinding
/// Supports: single keys ("q", "+"), special keys ("Enter", "Tab", "BackTab", "F1"),
/// and the Ctrl modifier ("Ctrl+a")
pub fn parse_key_binding(key_str: &str) -> Result<ParsedKeyBinding, String> {
    let key_str = key_str.trim();

    if let Some(key_part) = key_str.strip_prefix("Ctrl+") {
        return Ok(ParsedKeyBinding {
            key_code: parse_key_code(key_part)?,
            requires_ctrl: true,
        });
    }

    Ok(ParsedKeyBinding {
        key_code: parse_key_code(key_str)?,
        requires_ctrl: false,
    })
}

/// Parse a key code from a string (without modifiers)
fn parse_key_code(key_str: &str) -> Result<KeyCode, String> {
    match key_str {
        "Enter" => Ok(KeyCode::Enter),
        "Esc" | "Escape" => Ok(KeyCode::Esc),
        "Backspace" => Ok(KeyCode::Backspace),
        "Tab" => Ok(KeyCode::Tab),
        "BackTab" | "Shift+Tab" => Ok(KeyCode::BackTab),
        "Space" | " " => Ok(KeyCode::Char(' ')),
        "Left" => Ok(KeyCode::Left),
        "Right" => Ok(KeyCode::Right),
        "Up" => Ok(KeyCode::Up),
        "Down" => Ok(KeyCode::Down),
        "Home" => Ok(KeyCode::Home),
        "End" => Ok(KeyCode::End),
        "PageUp" => Ok(KeyCode::PageUp),
        "PageDown" => Ok(KeyCode::PageDown),
        "Delete" => Ok(KeyCode::Delete),
        "Insert" => Ok(KeyCode::Insert),
        _ => {
            if let Some(n) = key_str.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=12).contains(&n) {
                    return Ok(KeyCode::F(n));
                }
            }
            let mut chars = key_str.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(KeyCode::Char(c)),
                _ => Err(format!("Unknown key binding: {}", key_str)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn parses_plain_special_and_ctrl_keys() {
        assert_eq!(parse_key_binding("q").unwrap().key_code, KeyCode::Char('q'));
        assert_eq!(parse_key_binding("Space").unwrap().key_code, KeyCode::Char(' '));
        assert_eq!(parse_key_binding("BackTab").unwrap().key_code, KeyCode::BackTab);
        assert_eq!(parse_key_binding("F12").unwrap().key_code, KeyCode::F(12));

        let ctrl = parse_key_binding("Ctrl+a").unwrap();
        assert!(ctrl.requires_ctrl);
        assert_eq!(ctrl.key_code, KeyCode::Char('a'));
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(parse_key_binding("Hyper").is_err());
        assert!(parse_key_binding("F13").is_err());
        assert!(parse_key_binding("").is_err());
    }

    #[test]
    fn matching_respects_ctrl_and_ignores_shift_on_symbols() {
        let plus = parse_key_binding("+").unwrap();
        assert!(plus.matches(&key(KeyCode::Char('+'), KeyModifiers::SHIFT)));

        let a = parse_key_binding("a").unwrap();
        assert!(a.matches(&key(KeyCode::Char('a'), KeyModifiers::NONE)));
        assert!(!a.matches(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert!(!a.matches(&key(KeyCode::Char('a'), KeyModifiers::CONTROL)));

        let ctrl_a = parse_key_binding("Ctrl+a").unwrap();
        assert!(ctrl_a.matches(&key(KeyCode::Char('a'), KeyModifiers::CONTROL)));
    }

    #[test]
    fn expands_home_prefix_only() {
        assert_eq!(expand_path("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
        assert_eq!(expand_path("rel/x.db"), PathBuf::from("rel/x.db"));
    }
}
