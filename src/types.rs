//! Core types and constants for the cmpc compiler

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Recognized member annotations
pub const ANNOTATION_COMPONENT: &str = "Component";
pub const ANNOTATION_PROP: &str = "Prop";
pub const ANNOTATION_STATE: &str = "State";
pub const ANNOTATION_EVENT: &str = "Event";
pub const ANNOTATION_ELEMENT: &str = "Element";

/// Reserved name of the default (unnamed) style mode.
pub const DEFAULT_MODE: &str = "";

/// Literal emitted for fields declared without an initial value.
pub const UNDEFINED_SENTINEL: &str = "undefined";

/// Defensive bound on the style import graph walk.
pub const MAX_IMPORT_WALK_DEPTH: usize = 64;

/// Extensions the rebuild pre-filter treats as style-related.
pub const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less", "styl", "pcss"];

/// How a component's styles are isolated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encapsulation {
    None,
    Shadow,
    Scoped,
}

impl Encapsulation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encapsulation::None => "none",
            Encapsulation::Shadow => "shadow",
            Encapsulation::Scoped => "scoped",
        }
    }
}

impl Default for Encapsulation {
    fn default() -> Self {
        Encapsulation::None
    }
}

/// Target module convention for emitted style imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// Ahead-of-time static `import` statements.
    Esm,
    /// Inline `require(...)` declarations.
    CommonJs,
}

/// Options captured from a `@Prop` annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PropOptions {
    /// Declared type text, e.g. `string` or `number`.
    pub type_text: String,
    pub mutable: bool,
    /// Resolved attribute name (defaults to the dash-cased field name).
    pub attribute: String,
    pub reflect: bool,
}

/// Options captured from an `@Event` annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOptions {
    /// Emitted event name (defaults to the field name).
    pub event_name: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    /// Resolved event detail type text.
    pub type_text: String,
}

impl Default for EventOptions {
    fn default() -> Self {
        Self {
            event_name: String::new(),
            bubbles: true,
            cancelable: true,
            composed: true,
            type_text: "any".to_string(),
        }
    }
}

/// Category of a recognized member annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Prop(PropOptions),
    State,
    Event(EventOptions),
    /// Recognized but uncategorized (`@Element`); initialized in the
    /// constructor, absent from accessor metadata.
    Other,
}

impl FieldKind {
    /// Event fields are descriptors, not instance state, and never get a
    /// constructor assignment.
    pub fn initializes_in_constructor(&self) -> bool {
        !matches!(self, FieldKind::Event(_))
    }
}

/// One class member carrying a recognized annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedField {
    pub kind: FieldKind,
    /// Member name, unique within the class.
    pub name: String,
    /// Literal expression text captured from the declaration, if any.
    pub initial_value: Option<String>,
}

impl AnnotatedField {
    /// The value assigned in the synthesized constructor statement.
    pub fn initial_value_text(&self) -> &str {
        self.initial_value.as_deref().unwrap_or(UNDEFINED_SENTINEL)
    }
}

/// One style source for a (component, mode) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEntry {
    /// Bound name used by the generated import/require statement. Set if
    /// and only if `external_assets` is non-empty.
    pub identifier: Option<String>,
    /// Absolute paths of the external style assets, in declaration order.
    pub external_assets: Vec<PathBuf>,
    /// Mode name; [`DEFAULT_MODE`] for the unnamed default.
    pub mode: String,
}

impl StyleEntry {
    /// Inline-only entries contribute no import statements.
    pub fn requires_import(&self) -> bool {
        !self.external_assets.is_empty()
    }
}

/// Everything known about one detected component class. Built once during
/// annotation discovery, immutable for the rest of the build.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentMeta {
    /// Component tag name, unique per build.
    pub tag: String,
    pub encapsulation: Encapsulation,
    /// One entry per rendering mode, declaration order.
    pub styles: Vec<StyleEntry>,
    /// Annotated members in declaration order.
    pub fields: Vec<AnnotatedField>,
}

impl ComponentMeta {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            encapsulation: Encapsulation::None,
            styles: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Style entries that need a generated import statement.
    pub fn linked_styles(&self) -> impl Iterator<Item = &StyleEntry> {
        self.styles.iter().filter(|s| s.requires_import())
    }
}

/// Serialized descriptor for one `@Prop` field, exposed through the static
/// `properties` accessor.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    #[serde(rename = "type")]
    pub type_text: String,
    pub mutable: bool,
    pub attribute: String,
    pub reflect: bool,
    pub default_value: String,
}

/// Serialized descriptor for one `@State` field. Intentionally empty.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StateDescriptor {}

/// Serialized descriptor for one `@Event` field, exposed through the static
/// `events` accessor.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    pub method: String,
    pub event: String,
    pub bubbles: bool,
    pub cancelable: bool,
    pub composed: bool,
    #[serde(rename = "type")]
    pub type_text: String,
}

/// Per-rebuild facts the incremental style cache decides against. Created
/// fresh per build and discarded at build end.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Paths touched since the previous build.
    pub files_changed: Vec<PathBuf>,
    /// False only for the very first build in a session.
    pub is_rebuild: bool,
    /// Forces cache invalidation regardless of graph analysis.
    pub requires_full_build: bool,
    /// Cheap pre-filter: any change in this rebuild is style-related.
    pub has_style_changes: bool,
}

impl BuildContext {
    /// Context for the first build of a session.
    pub fn first_build() -> Self {
        Self {
            files_changed: Vec::new(),
            is_rebuild: false,
            requires_full_build: true,
            has_style_changes: true,
        }
    }

    /// Context for an incremental rebuild; the style pre-filter is derived
    /// from the changed paths' extensions.
    pub fn rebuild(files_changed: Vec<PathBuf>) -> Self {
        let has_style_changes = files_changed.iter().any(|p| is_style_file(p));
        Self {
            files_changed,
            is_rebuild: true,
            requires_full_build: false,
            has_style_changes,
        }
    }

    pub fn has_changed(&self, path: &Path) -> bool {
        self.files_changed.iter().any(|p| p == path)
    }
}

/// Extension-based pre-filter for style-related files.
pub fn is_style_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| STYLE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_entry_import_invariant() {
        let inline = StyleEntry {
            identifier: None,
            external_assets: Vec::new(),
            mode: DEFAULT_MODE.to_string(),
        };
        assert!(!inline.requires_import());

        let external = StyleEntry {
            identifier: Some("cmpAStyle0".to_string()),
            external_assets: vec![PathBuf::from("/proj/cmp-a.css")],
            mode: DEFAULT_MODE.to_string(),
        };
        assert!(external.requires_import());
    }

    #[test]
    fn test_event_fields_skip_constructor() {
        assert!(FieldKind::State.initializes_in_constructor());
        assert!(FieldKind::Other.initializes_in_constructor());
        assert!(FieldKind::Prop(PropOptions {
            type_text: "string".to_string(),
            mutable: false,
            attribute: "value".to_string(),
            reflect: false,
        })
        .initializes_in_constructor());
        assert!(!FieldKind::Event(EventOptions::default()).initializes_in_constructor());
    }

    #[test]
    fn test_initial_value_sentinel() {
        let field = AnnotatedField {
            kind: FieldKind::State,
            name: "count".to_string(),
            initial_value: None,
        };
        assert_eq!(field.initial_value_text(), "undefined");

        let field = AnnotatedField {
            initial_value: Some("0".to_string()),
            ..field
        };
        assert_eq!(field.initial_value_text(), "0");
    }

    #[test]
    fn test_rebuild_context_style_prefilter() {
        let ctx = BuildContext::rebuild(vec![PathBuf::from("src/app.ts")]);
        assert!(ctx.is_rebuild);
        assert!(!ctx.has_style_changes);

        let ctx = BuildContext::rebuild(vec![
            PathBuf::from("src/app.ts"),
            PathBuf::from("src/theme.SCSS"),
        ]);
        assert!(ctx.has_style_changes);
    }

    #[test]
    fn test_first_build_context() {
        let ctx = BuildContext::first_build();
        assert!(!ctx.is_rebuild);
        assert!(ctx.requires_full_build);
    }
}
