//! Schema registry: the static list of recognized settings.
//!
//! Each [`Descriptor`] ties a logical name (`"theme"`) to a storage key path
//! (`"application.theme"`), a value kind, a compiled-in default, an optional
//! validator and a pair of accessors onto the typed [`Settings`] struct.
//! The registry keeps descriptors in declaration order; that order drives
//! listing, template rendering and the initial push to UI surfaces.

use std::fmt;
use std::str::FromStr;

use crate::document::{Document, Node, Scalar};
use crate::error::DeskfigError;

/// The kind of value a setting holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Str,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "boolean"),
            ValueKind::Int => write!(f, "integer"),
            ValueKind::Str => write!(f, "string"),
        }
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Str(_) => ValueKind::Str,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_scalar(&self) -> Scalar {
        match self {
            Value::Bool(b) => Scalar::Boolean(*b),
            Value::Int(i) => Scalar::Integer(*i),
            Value::Str(s) => Scalar::String(s.clone()),
        }
    }

    /// Convert a stored scalar to a value of `kind`.
    ///
    /// Booleans also accept `"true"`/`"false"` strings and `0`/`1`. Integers
    /// accept numeric strings and whole floats. Strings accept any boolean
    /// or number rendered as text.
    pub fn convert(kind: ValueKind, scalar: &Scalar) -> Result<Value, String> {
        let converted = match (kind, scalar) {
            (ValueKind::Bool, Scalar::Boolean(b)) => Some(Value::Bool(*b)),
            (ValueKind::Bool, Scalar::String(s)) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(Value::Bool(true))
                } else if s.eq_ignore_ascii_case("false") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            (ValueKind::Bool, Scalar::Integer(0)) => Some(Value::Bool(false)),
            (ValueKind::Bool, Scalar::Integer(1)) => Some(Value::Bool(true)),

            (ValueKind::Int, Scalar::Integer(i)) => Some(Value::Int(*i)),
            (ValueKind::Int, Scalar::String(s)) => s.trim().parse().ok().map(Value::Int),
            (ValueKind::Int, Scalar::Float(f))
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f <= i64::MAX as f64 =>
            {
                Some(Value::Int(*f as i64))
            }

            (ValueKind::Str, Scalar::String(s)) => Some(Value::Str(s.clone())),
            (ValueKind::Str, Scalar::Integer(_) | Scalar::Float(_) | Scalar::Boolean(_)) => {
                Some(Value::Str(scalar.to_string()))
            }

            _ => None,
        };

        converted.ok_or_else(|| {
            format!(
                "expected {kind}, found {} '{scalar}'",
                scalar.type_name()
            )
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

/// Window color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}', expected 'light' or 'dark'")),
        }
    }
}

/// The typed settings the application reads at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub show_notifications: bool,
    pub log_retention_days: i64,
    pub log_rotation: String,
    pub debug_mode: bool,
    pub auto_start: bool,
    pub close_to_tray: bool,
    pub theme: Theme,
    pub check_update_on_start: bool,
    pub window_width: i64,
    pub window_height: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_notifications: true,
            log_retention_days: 7,
            log_rotation: "1 day".to_string(),
            debug_mode: false,
            auto_start: false,
            close_to_tray: true,
            theme: Theme::Light,
            check_update_on_start: true,
            window_width: 700,
            window_height: 800,
        }
    }
}

/// Reads a setting off the typed struct.
pub type Reader = fn(&Settings) -> Value;
/// Writes an already-accepted value into the typed struct.
pub type Writer = fn(&mut Settings, Value);
/// Returns the (possibly normalized) value, or `None` to reject it.
pub type Validator = fn(Value) -> Option<Value>;

/// One recognized setting.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub name: &'static str,
    pub path: &'static str,
    pub kind: ValueKind,
    pub default: Value,
    pub doc: &'static str,
    pub validator: Option<Validator>,
    pub read: Reader,
    pub write: Writer,
}

impl Descriptor {
    /// Convert a stored scalar and run the validator. Either both succeed or
    /// nothing is produced.
    pub fn accept(&self, scalar: &Scalar) -> Result<Value, String> {
        let value = Value::convert(self.kind, scalar)?;
        self.validate(value)
    }

    /// Check an already-typed value against this descriptor.
    pub fn accept_value(&self, value: Value) -> Result<Value, String> {
        if value.kind() != self.kind {
            return Value::convert(self.kind, &value.to_scalar()).and_then(|v| self.validate(v));
        }
        self.validate(value)
    }

    fn validate(&self, value: Value) -> Result<Value, String> {
        match self.validator {
            Some(validator) => {
                let shown = value.to_string();
                validator(value).ok_or_else(|| format!("'{shown}' is not accepted"))
            }
            None => Ok(value),
        }
    }
}

fn theme_validator(value: Value) -> Option<Value> {
    let theme: Theme = value.as_str()?.parse().ok()?;
    Some(Value::Str(theme.as_str().to_string()))
}

/// Ordered, validated set of descriptors.
#[derive(Debug, Clone)]
pub struct Registry {
    descriptors: Vec<Descriptor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// The settings every application shell carries.
    pub fn builtin() -> Self {
        let descriptors = vec![
            Descriptor {
                name: "show_notifications",
                path: "notifications.enabled",
                kind: ValueKind::Bool,
                default: Value::Bool(true),
                doc: "Show tray notifications",
                validator: None,
                read: |s| Value::Bool(s.show_notifications),
                write: |s, v| {
                    if let Value::Bool(b) = v {
                        s.show_notifications = b;
                    }
                },
            },
            Descriptor {
                name: "log_retention_days",
                path: "logging.retention_days",
                kind: ValueKind::Int,
                default: Value::Int(7),
                doc: "Number of rotated log files to keep",
                validator: None,
                read: |s| Value::Int(s.log_retention_days),
                write: |s, v| {
                    if let Value::Int(i) = v {
                        s.log_retention_days = i;
                    }
                },
            },
            Descriptor {
                name: "log_rotation",
                path: "logging.rotation",
                kind: ValueKind::Str,
                default: Value::Str("1 day".to_string()),
                doc: "Log rotation interval (\"1 day\", \"1 hour\", \"1 minute\" or \"never\")",
                validator: None,
                read: |s| Value::Str(s.log_rotation.clone()),
                write: |s, v| {
                    if let Value::Str(r) = v {
                        s.log_rotation = r;
                    }
                },
            },
            Descriptor {
                name: "debug_mode",
                path: "logging.debug_mode",
                kind: ValueKind::Bool,
                default: Value::Bool(false),
                doc: "Log at debug level",
                validator: None,
                read: |s| Value::Bool(s.debug_mode),
                write: |s, v| {
                    if let Value::Bool(b) = v {
                        s.debug_mode = b;
                    }
                },
            },
            Descriptor {
                name: "auto_start",
                path: "application.auto_start",
                kind: ValueKind::Bool,
                default: Value::Bool(false),
                doc: "Start the application at login",
                validator: None,
                read: |s| Value::Bool(s.auto_start),
                write: |s, v| {
                    if let Value::Bool(b) = v {
                        s.auto_start = b;
                    }
                },
            },
            Descriptor {
                name: "close_to_tray",
                path: "application.close_to_tray",
                kind: ValueKind::Bool,
                default: Value::Bool(true),
                doc: "Hide to the tray instead of quitting when the window is closed",
                validator: None,
                read: |s| Value::Bool(s.close_to_tray),
                write: |s, v| {
                    if let Value::Bool(b) = v {
                        s.close_to_tray = b;
                    }
                },
            },
            Descriptor {
                name: "theme",
                path: "application.theme",
                kind: ValueKind::Str,
                default: Value::Str("light".to_string()),
                doc: "Color scheme: \"light\" or \"dark\"",
                validator: Some(theme_validator),
                read: |s| Value::Str(s.theme.as_str().to_string()),
                write: |s, v| {
                    if let Some(theme) = v.as_str().and_then(|t| t.parse().ok()) {
                        s.theme = theme;
                    }
                },
            },
            Descriptor {
                name: "check_update_on_start",
                path: "application.check_update_on_start",
                kind: ValueKind::Bool,
                default: Value::Bool(true),
                doc: "Check for a newer release at startup",
                validator: None,
                read: |s| Value::Bool(s.check_update_on_start),
                write: |s, v| {
                    if let Value::Bool(b) = v {
                        s.check_update_on_start = b;
                    }
                },
            },
            Descriptor {
                name: "window_width",
                path: "window.width",
                kind: ValueKind::Int,
                default: Value::Int(700),
                doc: "Main window width in pixels",
                validator: None,
                read: |s| Value::Int(s.window_width),
                write: |s, v| {
                    if let Value::Int(i) = v {
                        s.window_width = i;
                    }
                },
            },
            Descriptor {
                name: "window_height",
                path: "window.height",
                kind: ValueKind::Int,
                default: Value::Int(800),
                doc: "Main window height in pixels",
                validator: None,
                read: |s| Value::Int(s.window_height),
                write: |s, v| {
                    if let Value::Int(i) = v {
                        s.window_height = i;
                    }
                },
            },
        ];

        Self { descriptors }
    }

    /// Build a registry from custom descriptors.
    ///
    /// Names and paths must be unique, paths must be well-formed, and no
    /// path may sit inside another setting's path.
    pub fn new(descriptors: Vec<Descriptor>) -> Result<Self, DeskfigError> {
        for (i, d) in descriptors.iter().enumerate() {
            crate::document::split_path(d.path)
                .map_err(|_| DeskfigError::InvalidRegistry(format!("malformed path '{}'", d.path)))?;
            if d.default.kind() != d.kind {
                return Err(DeskfigError::InvalidRegistry(format!(
                    "default for '{}' is not a {}",
                    d.name, d.kind
                )));
            }

            for other in &descriptors[i + 1..] {
                if d.name == other.name {
                    return Err(DeskfigError::InvalidRegistry(format!(
                        "duplicate name '{}'",
                        d.name
                    )));
                }
                if d.path == other.path {
                    return Err(DeskfigError::InvalidRegistry(format!(
                        "duplicate path '{}'",
                        d.path
                    )));
                }
                if is_nested(d.path, other.path) || is_nested(other.path, d.path) {
                    return Err(DeskfigError::InvalidRegistry(format!(
                        "'{}' and '{}' overlap",
                        d.path, other.path
                    )));
                }
            }
        }
        Ok(Self { descriptors })
    }

    /// Look up a descriptor by logical name.
    pub fn describe(&self, name: &str) -> Result<&Descriptor, DeskfigError> {
        self.descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| DeskfigError::UnknownSetting(name.to_string()))
    }

    /// Look up a descriptor by logical name or key path.
    pub fn lookup(&self, key: &str) -> Result<&Descriptor, DeskfigError> {
        self.descriptors
            .iter()
            .find(|d| d.name == key || d.path == key)
            .ok_or_else(|| DeskfigError::UnknownSetting(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.name).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Settings with every registered field at its default.
    pub fn default_settings(&self) -> Settings {
        let mut settings = Settings::default();
        for d in &self.descriptors {
            (d.write)(&mut settings, d.default.clone());
        }
        settings
    }

    /// Document holding every descriptor's default at its key path.
    pub fn default_document(&self) -> Document {
        self.document_from(&self.default_settings())
    }

    /// Document holding the current value of every descriptor.
    pub fn document_from(&self, settings: &Settings) -> Document {
        let mut doc = Document::new();
        for d in &self.descriptors {
            let value = (d.read)(settings);
            // Paths were checked when the registry was built.
            if let Err(e) = doc.set(d.path, Node::Leaf(value.to_scalar())) {
                tracing::error!(key = d.path, error = %e, "unable to place setting");
            }
        }
        doc
    }

    /// Render the defaults as a commented TOML document.
    pub fn template(&self) -> String {
        let mut sections: Vec<(&str, Vec<&Descriptor>)> = Vec::new();
        for d in &self.descriptors {
            let section = d.path.rsplit_once('.').map(|(s, _)| s).unwrap_or("");
            match sections.iter_mut().find(|(s, _)| *s == section) {
                Some((_, items)) => items.push(d),
                None => sections.push((section, vec![d])),
            }
        }
        // Top-level keys must precede the first table header.
        sections.sort_by_key(|(section, _)| !section.is_empty());

        let mut out = String::new();
        for (section, items) in sections {
            if !section.is_empty() {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("[{section}]\n"));
            }
            for d in items {
                let leaf = d.path.rsplit('.').next().unwrap_or(d.path);
                out.push_str(&format!("# {}\n", d.doc));
                out.push_str(&format!("{leaf} = {}\n", d.default.to_scalar().to_toml()));
            }
        }
        out
    }
}

fn is_nested(inner: &str, outer: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_ten_settings_in_order() {
        let registry = Registry::builtin();
        assert_eq!(
            registry.names(),
            vec![
                "show_notifications",
                "log_retention_days",
                "log_rotation",
                "debug_mode",
                "auto_start",
                "close_to_tray",
                "theme",
                "check_update_on_start",
                "window_width",
                "window_height",
            ]
        );
    }

    #[test]
    fn builtin_passes_its_own_checks() {
        let descriptors: Vec<Descriptor> = Registry::builtin().iter().cloned().collect();
        assert!(Registry::new(descriptors).is_ok());
    }

    #[test]
    fn describe_unknown_name() {
        match Registry::builtin().describe("colour") {
            Err(DeskfigError::UnknownSetting(name)) => assert_eq!(name, "colour"),
            other => panic!("Expected UnknownSetting, got {other:?}"),
        }
    }

    #[test]
    fn lookup_by_path_or_name() {
        let registry = Registry::builtin();
        assert_eq!(registry.lookup("application.theme").unwrap().name, "theme");
        assert_eq!(registry.lookup("theme").unwrap().path, "application.theme");
    }

    #[test]
    fn default_document_matches_table() {
        let doc = Registry::builtin().default_document();
        assert_eq!(
            doc.get_scalar("notifications.enabled"),
            Some(&Scalar::Boolean(true))
        );
        assert_eq!(doc.get_scalar("logging.rotation"), Some(&Scalar::from("1 day")));
        assert_eq!(doc.get_scalar("application.theme"), Some(&Scalar::from("light")));
        assert_eq!(doc.get_scalar("window.height"), Some(&Scalar::Integer(800)));
        assert_eq!(doc.leaves().len(), 10);
    }

    #[test]
    fn default_settings_equal_struct_default() {
        assert_eq!(Registry::builtin().default_settings(), Settings::default());
    }

    #[test]
    fn theme_rejects_unknown_color() {
        let theme = Registry::builtin().describe("theme").unwrap().clone();
        assert_eq!(theme.accept(&Scalar::from("dark")), Ok(Value::from("dark")));
        let err = theme.accept(&Scalar::from("blue")).unwrap_err();
        assert!(err.contains("blue"));
    }

    #[test]
    fn bool_conversion_rules() {
        let k = ValueKind::Bool;
        assert_eq!(Value::convert(k, &Scalar::Boolean(true)), Ok(Value::Bool(true)));
        assert_eq!(Value::convert(k, &Scalar::from("FALSE")), Ok(Value::Bool(false)));
        assert_eq!(Value::convert(k, &Scalar::Integer(1)), Ok(Value::Bool(true)));
        assert!(Value::convert(k, &Scalar::Integer(2)).is_err());
        assert!(Value::convert(k, &Scalar::from("yes")).is_err());
    }

    #[test]
    fn int_conversion_rules() {
        let k = ValueKind::Int;
        assert_eq!(Value::convert(k, &Scalar::Integer(5)), Ok(Value::Int(5)));
        assert_eq!(Value::convert(k, &Scalar::from(" 42 ")), Ok(Value::Int(42)));
        assert_eq!(Value::convert(k, &Scalar::Float(3.0)), Ok(Value::Int(3)));
        assert!(Value::convert(k, &Scalar::Float(3.5)).is_err());
        assert!(Value::convert(k, &Scalar::Boolean(true)).is_err());
        assert!(Value::convert(k, &Scalar::from("wide")).is_err());
    }

    #[test]
    fn str_conversion_rules() {
        let k = ValueKind::Str;
        assert_eq!(Value::convert(k, &Scalar::from("x")), Ok(Value::from("x")));
        assert_eq!(Value::convert(k, &Scalar::Integer(7)), Ok(Value::from("7")));
        let array = Scalar::Other(toml::Value::Array(vec![]));
        assert!(Value::convert(k, &array).is_err());
    }

    #[test]
    fn accept_value_coerces_other_kinds() {
        let width = Registry::builtin().describe("window_width").unwrap().clone();
        assert_eq!(width.accept_value(Value::from("640")), Ok(Value::Int(640)));
        assert!(width.accept_value(Value::Bool(true)).is_err());
    }

    fn descriptor(name: &'static str, path: &'static str) -> Descriptor {
        let mut d = Registry::builtin().describe("debug_mode").unwrap().clone();
        d.name = name;
        d.path = path;
        d
    }

    #[test]
    fn new_rejects_duplicate_names() {
        let result = Registry::new(vec![descriptor("a", "x.a"), descriptor("a", "x.b")]);
        assert!(matches!(result, Err(DeskfigError::InvalidRegistry(_))));
    }

    #[test]
    fn new_rejects_duplicate_paths() {
        let result = Registry::new(vec![descriptor("a", "x.a"), descriptor("b", "x.a")]);
        assert!(matches!(result, Err(DeskfigError::InvalidRegistry(_))));
    }

    #[test]
    fn new_rejects_overlapping_paths() {
        let result = Registry::new(vec![descriptor("a", "x"), descriptor("b", "x.a")]);
        assert!(matches!(result, Err(DeskfigError::InvalidRegistry(_))));
        // A shared prefix that is not a group boundary is fine.
        assert!(Registry::new(vec![descriptor("a", "x"), descriptor("b", "xy")]).is_ok());
    }

    #[test]
    fn new_rejects_mismatched_default() {
        let mut d = descriptor("a", "x.a");
        d.default = Value::Int(1);
        assert!(matches!(
            Registry::new(vec![d]),
            Err(DeskfigError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn template_parses_back_to_defaults() {
        let registry = Registry::builtin();
        let template = registry.template();
        assert!(template.contains("# Color scheme"));
        assert!(template.contains("[application]"));
        let parsed = Document::parse(&template).unwrap();
        assert_eq!(parsed, registry.default_document());
    }

    #[test]
    fn template_puts_top_level_keys_first() {
        let registry = Registry::new(vec![descriptor("a", "group.a"), descriptor("b", "top")])
            .unwrap();
        let template = registry.template();
        assert!(template.starts_with("# "));
        let parsed = Document::parse(&template).unwrap();
        assert!(parsed.get_scalar("top").is_some());
        assert!(parsed.get_scalar("group.a").is_some());
    }
}
