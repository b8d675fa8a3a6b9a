//! Viewer configuration: keybindings and feed tunables.
//!
//! Stored as a simple key-value text file at
//! `$XDG_CONFIG_HOME/waterfall/config.toml` (default
//! `~/.config/waterfall/config.toml`).  Unknown keys and unparsable values
//! are skipped; whatever is missing falls back to the built-in defaults.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use waterfall::core::config::FeedConfig;

// ───────────────────────────────────────── actions ───────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    Reload,
    Quit,
}

impl Action {
    /// Ordered list of all actions (config file order).
    pub const ALL: &[Action] = &[
        Action::ScrollUp,
        Action::ScrollDown,
        Action::PageUp,
        Action::PageDown,
        Action::Top,
        Action::Bottom,
        Action::Reload,
        Action::Quit,
    ];

    fn config_key(self) -> &'static str {
        match self {
            Action::ScrollUp => "scroll_up",
            Action::ScrollDown => "scroll_down",
            Action::PageUp => "page_up",
            Action::PageDown => "page_down",
            Action::Top => "top",
            Action::Bottom => "bottom",
            Action::Reload => "reload",
            Action::Quit => "quit",
        }
    }

    fn from_config_key(s: &str) -> Option<Self> {
        Action::ALL.iter().copied().find(|a| a.config_key() == s)
    }
}

// ───────────────────────────────────────── key bind ──────────

/// A single key binding: key code + modifier combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBind {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Only CTRL/ALT/SHIFT are compared, and SHIFT is ignored for
    /// characters since their case already carries it.
    pub fn matches(&self, event: KeyEvent) -> bool {
        let mut mask = KeyModifiers::CONTROL | KeyModifiers::ALT;
        if !matches!(self.code, KeyCode::Char(_)) {
            mask |= KeyModifiers::SHIFT;
        }
        self.code == event.code && (self.modifiers & mask) == (event.modifiers & mask)
    }

    /// Config-file form (e.g. `"Ctrl+d"`, `"PageDown"`, `"j"`), also used
    /// in the status bar.
    pub fn to_config_string(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            s.push_str("Ctrl+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            s.push_str("Alt+");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            s.push_str("Shift+");
        }
        s.push_str(&match self.code {
            KeyCode::Char(' ') => "Space".into(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "Up".into(),
            KeyCode::Down => "Down".into(),
            KeyCode::Home => "Home".into(),
            KeyCode::End => "End".into(),
            KeyCode::PageUp => "PageUp".into(),
            KeyCode::PageDown => "PageDown".into(),
            KeyCode::Enter => "Enter".into(),
            KeyCode::Esc => "Esc".into(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        });
        s
    }

    /// Parse a key string like `"Ctrl+d"`, `"PageDown"`, `"g"`.
    fn parse(s: &str) -> Option<Self> {
        let mut modifiers = KeyModifiers::NONE;
        let parts: Vec<&str> = s.split('+').collect();
        let key_part = parts.last()?;

        for &part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
        }

        // Single characters keep their case ("G" and "g" differ).
        if key_part.chars().count() == 1 {
            let c = key_part.chars().next()?;
            return Some(KeyBind::new(KeyCode::Char(c), modifiers));
        }

        let code = match key_part.to_lowercase().as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            s if s.starts_with('f') => KeyCode::F(s[1..].parse().ok()?),
            _ => return None,
        };
        Some(KeyBind::new(code, modifiers))
    }
}

// ───────────────────────────────────────── config ────────────

/// Viewer configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bindings: HashMap<Action, Vec<KeyBind>>,
    /// Tunables handed to the feed engine.
    pub feed: FeedConfig,
    /// Smooth-scroll damping per frame (0.05–0.95).
    pub scroll_speed: f64,
    /// Rows moved by one scroll step or wheel notch.
    pub scroll_step_rows: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bindings: Self::default_bindings(),
            feed: FeedConfig::default(),
            scroll_speed: 0.35,
            scroll_step_rows: 3,
        }
    }
}

impl AppConfig {
    pub fn default_bindings() -> HashMap<Action, Vec<KeyBind>> {
        use Action::*;
        let n = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let bind = KeyBind::new;
        let mut m = HashMap::new();

        m.insert(ScrollUp, vec![bind(KeyCode::Up, n), bind(KeyCode::Char('k'), n)]);
        m.insert(ScrollDown, vec![bind(KeyCode::Down, n), bind(KeyCode::Char('j'), n)]);
        m.insert(PageUp, vec![bind(KeyCode::PageUp, n), bind(KeyCode::Char('u'), ctrl)]);
        m.insert(PageDown, vec![bind(KeyCode::PageDown, n), bind(KeyCode::Char('d'), ctrl)]);
        m.insert(Top, vec![bind(KeyCode::Home, n), bind(KeyCode::Char('g'), n)]);
        m.insert(Bottom, vec![bind(KeyCode::End, n), bind(KeyCode::Char('G'), n)]);
        m.insert(Reload, vec![bind(KeyCode::Char('r'), n)]);
        m.insert(Quit, vec![bind(KeyCode::Char('q'), n), bind(KeyCode::Esc, n)]);

        m
    }

    /// Find the action that matches a key event.  When several bindings
    /// match, the one with the most modifiers wins.
    pub fn match_key(&self, event: KeyEvent) -> Option<Action> {
        let mut best: Option<Action> = None;
        let mut best_mod_count = 0;

        for (&action, binds) in &self.bindings {
            for bind in binds {
                if bind.matches(event) {
                    let mc = bind.modifiers.bits().count_ones();
                    if best.is_none() || mc > best_mod_count {
                        best = Some(action);
                        best_mod_count = mc;
                    }
                }
            }
        }
        best
    }

    fn short_binding(&self, action: Action) -> String {
        match self.bindings.get(&action) {
            Some(binds) if !binds.is_empty() => binds[0].to_config_string(),
            _ => "?".into(),
        }
    }

    /// Status-bar hint built from the current bindings.
    pub fn status_bar_hint(&self) -> String {
        format!(
            "{}/{}: scroll | {}: page | {}: reload | {}: quit",
            self.short_binding(Action::ScrollUp),
            self.short_binding(Action::ScrollDown),
            self.short_binding(Action::PageDown),
            self.short_binding(Action::Reload),
            self.short_binding(Action::Quit),
        )
    }

    // ── persistence ─────────────────────────────────────────────

    /// Load config from disk, falling back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                tracing::debug!("config: loaded {}", path.display());
                Self::parse(&contents)
            }
            Err(_) => Self::default(),
        }
    }

    /// Persist current config to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.serialise())?;
        Ok(())
    }

    /// Parse config text.  Values that would make the feed config invalid
    /// are dropped in favour of the defaults.
    pub fn parse(s: &str) -> Self {
        let mut config = Self::default();

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if config.apply_setting(key, value) {
                continue;
            }

            let Some(action) = Action::from_config_key(key) else {
                tracing::debug!("config: ignoring unknown key `{key}`");
                continue;
            };
            let parsed: Vec<KeyBind> = value
                .split(',')
                .filter_map(|part| KeyBind::parse(part.trim().trim_matches('"')))
                .collect();
            if !parsed.is_empty() {
                config.bindings.insert(action, parsed);
            }
        }

        if let Err(err) = config.feed.validate() {
            tracing::warn!("config: {err}; using default feed settings");
            config.feed = FeedConfig::default();
        }
        config
    }

    /// Returns `true` if `key` is a setting (whether or not `value` parsed).
    fn apply_setting(&mut self, key: &str, value: &str) -> bool {
        let px = || value.parse::<f64>().ok();
        let ms = || value.parse::<u64>().ok().map(Duration::from_millis);
        let feed = &mut self.feed;
        match key {
            "column_gap" => set(&mut feed.column_gap, px()),
            "row_gap" => set(&mut feed.row_gap, px()),
            "min_column_width" => set(&mut feed.min_column_width, px()),
            "min_columns" => set(&mut feed.min_columns, value.parse().ok()),
            "buffer" => set(&mut feed.buffer, px()),
            "pagination_threshold" => set(&mut feed.pagination_threshold, px()),
            "resize_debounce_ms" => set(&mut feed.resize_debounce, ms()),
            "scroll_quiet_ms" => set(&mut feed.scroll_quiet, ms()),
            "pagination_cooldown_ms" => set(&mut feed.pagination_cooldown, ms()),
            "scroll_speed" => set(&mut self.scroll_speed, px().map(|v| v.clamp(0.05, 0.95))),
            "scroll_step_rows" => set(&mut self.scroll_step_rows, value.parse().ok()),
            _ => return false,
        }
        true
    }

    fn serialise(&self) -> String {
        let feed = &self.feed;
        let mut lines = vec![
            "# waterfall configuration".to_string(),
            String::new(),
            "# Feed layout (pixels; one terminal cell is 8x16)".to_string(),
            format!("column_gap = {}", feed.column_gap),
            format!("row_gap = {}", feed.row_gap),
            format!("min_column_width = {}", feed.min_column_width),
            format!("min_columns = {}", feed.min_columns),
            format!("buffer = {}", feed.buffer),
            format!("pagination_threshold = {}", feed.pagination_threshold),
            format!("resize_debounce_ms = {}", feed.resize_debounce.as_millis()),
            format!("scroll_quiet_ms = {}", feed.scroll_quiet.as_millis()),
            format!("pagination_cooldown_ms = {}", feed.pagination_cooldown.as_millis()),
            String::new(),
            "# Scrolling".to_string(),
            format!("scroll_speed = {}", self.scroll_speed),
            format!("scroll_step_rows = {}", self.scroll_step_rows),
            String::new(),
            "# Key bindings".to_string(),
            "# Format: action = Key1, Key2, ...".to_string(),
            "# Modifiers: Ctrl+, Alt+, Shift+ (prefix)".to_string(),
            String::new(),
        ];

        for &action in Action::ALL {
            if let Some(binds) = self.bindings.get(&action) {
                let keys: Vec<String> = binds.iter().map(|b| b.to_config_string()).collect();
                lines.push(format!("{} = {}", action.config_key(), keys.join(", ")));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Return the config file path (`$XDG_CONFIG_HOME/waterfall/config.toml`).
fn config_path() -> PathBuf {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
    config_dir.join("waterfall").join("config.toml")
}
