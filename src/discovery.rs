//! Annotation discovery
//!
//! First pass over a parsed module: find every `@Component`-annotated class
//! and build its [`ComponentMeta`]. Metadata is built once here and stays
//! immutable for the rest of the build.

use crate::ast::*;
use crate::types::*;
use crate::utils::{camel_to_dash, dash_to_camel, normalize_path};
use std::path::{Path, PathBuf};

/// One detected component class and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredComponent {
    pub class_name: String,
    pub meta: ComponentMeta,
}

/// Find all component classes in `module`. Style asset paths are resolved
/// against the directory of `module_path`.
pub fn discover_components(module: &Module, module_path: &Path) -> Vec<DiscoveredComponent> {
    let mut discovered = Vec::new();

    for class in module.classes() {
        let annotation = match class.annotation(ANNOTATION_COMPONENT) {
            Some(a) => a,
            None => continue,
        };
        let tag = match annotation.str_arg("tag") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                log::warn!(
                    "class '{}' has a component annotation without a tag, skipping",
                    class.name
                );
                continue;
            }
        };
        if discovered
            .iter()
            .any(|d: &DiscoveredComponent| d.meta.tag == tag)
        {
            log::warn!("duplicate component tag '{}' in module, skipping", tag);
            continue;
        }

        let mut meta = ComponentMeta::new(&tag);
        meta.encapsulation = read_encapsulation(annotation);
        meta.styles = read_style_entries(annotation, &tag, module_path);
        meta.fields = read_annotated_fields(class);

        log::debug!(
            "discovered component '{}' ({} styles, {} annotated fields)",
            tag,
            meta.styles.len(),
            meta.fields.len()
        );
        discovered.push(DiscoveredComponent {
            class_name: class.name.clone(),
            meta,
        });
    }

    discovered
}

fn read_encapsulation(annotation: &Annotation) -> Encapsulation {
    if annotation.bool_arg("shadow").unwrap_or(false) {
        Encapsulation::Shadow
    } else if annotation.bool_arg("scoped").unwrap_or(false) {
        Encapsulation::Scoped
    } else {
        Encapsulation::None
    }
}

/// Build the ordered style entries: `styles` (inline), `styleUrl` (single
/// default-mode asset), and `styleUrls` (per-mode map or plain list).
/// Identifiers are generated only for entries with external assets.
fn read_style_entries(annotation: &Annotation, tag: &str, module_path: &Path) -> Vec<StyleEntry> {
    let mut entries = Vec::new();

    if annotation.str_arg("styles").is_some() {
        // Inline style text; no import, no identifier
        entries.push(StyleEntry {
            identifier: None,
            external_assets: Vec::new(),
            mode: DEFAULT_MODE.to_string(),
        });
    }

    if let Some(url) = annotation.str_arg("styleUrl") {
        entries.push(StyleEntry {
            identifier: None,
            external_assets: vec![resolve_asset(url, module_path)],
            mode: DEFAULT_MODE.to_string(),
        });
    }

    match annotation.arg("styleUrls") {
        Some(LitValue::Object(modes)) => {
            for (mode, value) in modes {
                let assets = collect_assets(value, module_path);
                if !assets.is_empty() {
                    entries.push(StyleEntry {
                        identifier: None,
                        external_assets: assets,
                        mode: mode.clone(),
                    });
                }
            }
        }
        Some(value @ LitValue::Array(_)) | Some(value @ LitValue::Str(_)) => {
            let assets = collect_assets(value, module_path);
            if !assets.is_empty() {
                entries.push(StyleEntry {
                    identifier: None,
                    external_assets: assets,
                    mode: DEFAULT_MODE.to_string(),
                });
            }
        }
        _ => {}
    }

    let ident_prefix = dash_to_camel(tag);
    for (index, entry) in entries.iter_mut().enumerate() {
        if entry.requires_import() {
            entry.identifier = Some(format!("{}Style{}", ident_prefix, index));
        }
    }
    entries
}

fn collect_assets(value: &LitValue, module_path: &Path) -> Vec<PathBuf> {
    match value {
        LitValue::Str(url) => vec![resolve_asset(url, module_path)],
        LitValue::Array(items) => items
            .iter()
            .filter_map(LitValue::as_str)
            .map(|url| resolve_asset(url, module_path))
            .collect(),
        _ => Vec::new(),
    }
}

fn resolve_asset(url: &str, module_path: &Path) -> PathBuf {
    let path = Path::new(url);
    if path.is_absolute() {
        return normalize_path(path);
    }
    let dir = module_path.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&dir.join(path))
}

fn read_annotated_fields(class: &ClassDecl) -> Vec<AnnotatedField> {
    let mut fields = Vec::new();
    for member in &class.members {
        let field = match member {
            ClassMember::Field(f) => f,
            _ => continue,
        };
        let kind = match recognized_kind(field) {
            Some(k) => k,
            None => continue,
        };
        fields.push(AnnotatedField {
            kind,
            name: field.name.clone(),
            initial_value: field.initial_value.clone(),
        });
    }
    fields
}

fn recognized_kind(field: &FieldDecl) -> Option<FieldKind> {
    if let Some(annotation) = field.annotation(ANNOTATION_PROP) {
        return Some(FieldKind::Prop(PropOptions {
            type_text: field
                .type_text
                .clone()
                .unwrap_or_else(|| "any".to_string()),
            mutable: annotation.bool_arg("mutable").unwrap_or(false),
            attribute: annotation
                .str_arg("attribute")
                .map(str::to_string)
                .unwrap_or_else(|| camel_to_dash(&field.name)),
            reflect: annotation.bool_arg("reflect").unwrap_or(false),
        }));
    }
    if field.annotation(ANNOTATION_STATE).is_some() {
        return Some(FieldKind::State);
    }
    if let Some(annotation) = field.annotation(ANNOTATION_EVENT) {
        return Some(FieldKind::Event(EventOptions {
            event_name: annotation
                .str_arg("eventName")
                .map(str::to_string)
                .unwrap_or_else(|| field.name.clone()),
            bubbles: annotation.bool_arg("bubbles").unwrap_or(true),
            cancelable: annotation.bool_arg("cancelable").unwrap_or(true),
            composed: annotation.bool_arg("composed").unwrap_or(true),
            type_text: event_type_text(field.type_text.as_deref()),
        }));
    }
    if field.annotation(ANNOTATION_ELEMENT).is_some() {
        return Some(FieldKind::Other);
    }
    None
}

/// Resolve the event detail type from an `EventEmitter<T>` declaration.
fn event_type_text(type_text: Option<&str>) -> String {
    let text = match type_text {
        Some(t) => t,
        None => return "any".to_string(),
    };
    if let (Some(open), Some(close)) = (text.find('<'), text.rfind('>')) {
        if open < close {
            return text[open + 1..close].trim().to_string();
        }
    }
    "any".to_string()
}
