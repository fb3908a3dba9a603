//! Annotation-to-static class rewrite
//!
//! Turns a component class with annotated members into a plain class:
//! annotated fields move into constructor assignments (declaration order,
//! before any user-written statement, after a leading superclass call) and
//! each populated category gains a static accessor exposing serialized
//! metadata. The rewrite is a pure tree-to-tree function; input trees are
//! never mutated.

use crate::ast::*;
use crate::discovery::DiscoveredComponent;
use crate::types::*;
use std::borrow::Cow;
use std::collections::HashSet;

/// Rewrite every discovered component class in `module`. Returns
/// `Cow::Borrowed` when the module contains no component classes, so
/// callers can skip downstream re-emission.
pub fn rewrite_module<'a>(
    module: &'a Module,
    discovered: &[DiscoveredComponent],
) -> Cow<'a, Module> {
    if discovered.is_empty() {
        return Cow::Borrowed(module);
    }

    let statements = module
        .statements
        .iter()
        .map(|statement| match statement {
            Statement::Class(class) => {
                match discovered.iter().find(|d| d.class_name == class.name) {
                    Some(component) => {
                        Statement::Class(rewrite_class(class, &component.meta, module))
                    }
                    None => statement.clone(),
                }
            }
            other => other.clone(),
        })
        .collect();

    Cow::Owned(Module::new(statements))
}

/// Rewrite one class against its metadata. `module` provides local class
/// lookup for the superclass-call analysis.
pub fn rewrite_class(class: &ClassDecl, meta: &ComponentMeta, module: &Module) -> ClassDecl {
    let removed: HashSet<&str> = meta.fields.iter().map(|f| f.name.as_str()).collect();

    let init_fields: Vec<&AnnotatedField> = meta
        .fields
        .iter()
        .filter(|f| f.kind.initializes_in_constructor())
        .collect();

    let constructor = build_constructor(class, module, &init_fields);

    let mut members: Vec<ClassMember> = Vec::new();
    if let Some(ctor) = constructor {
        members.push(ClassMember::Constructor(ctor));
    }
    members.extend(build_accessors(meta));
    for member in &class.members {
        match member {
            ClassMember::Constructor(_) => {}
            ClassMember::Field(field) if removed.contains(field.name.as_str()) => {}
            other => members.push(other.clone()),
        }
    }

    // The component annotation is consumed by the rewrite; anything else
    // on the class stays.
    let annotations = class
        .annotations
        .iter()
        .filter(|a| a.name != ANNOTATION_COMPONENT)
        .cloned()
        .collect();

    ClassDecl {
        name: class.name.clone(),
        extends: class.extends.clone(),
        exported: class.exported,
        annotations,
        members,
    }
}

/// Build the rewritten constructor, or `None` when the class needs no
/// constructor at all.
fn build_constructor(
    class: &ClassDecl,
    module: &Module,
    init_fields: &[&AnnotatedField],
) -> Option<ConstructorDecl> {
    let assignments: Vec<CtorStatement> = init_fields
        .iter()
        .map(|field| CtorStatement::FieldAssign {
            name: field.name.clone(),
            value: field.initial_value_text().to_string(),
        })
        .collect();

    match class.constructor() {
        Some(existing) => {
            // Synthesized assignments lead; user statements follow verbatim
            // so a user re-assignment always wins at runtime. A leading
            // superclass call keeps its place ahead of everything.
            let mut body = Vec::with_capacity(existing.body.len() + assignments.len());
            let mut rest = existing.body.as_slice();
            if let Some(first @ CtorStatement::SuperCall { .. }) = existing.body.first() {
                body.push(first.clone());
                rest = &existing.body[1..];
            }
            body.extend(assignments);
            body.extend(rest.iter().cloned());
            Some(ConstructorDecl {
                params: existing.params.clone(),
                body,
            })
        }
        None if assignments.is_empty() => None,
        None => {
            let mut body = Vec::with_capacity(assignments.len() + 1);
            if needs_super_call(class, module) {
                body.push(CtorStatement::SuperCall {
                    args: String::new(),
                });
            }
            body.extend(assignments);
            Some(ConstructorDecl {
                params: String::new(),
                body,
            })
        }
    }
}

/// A synthesized constructor for a subclass starts with a bare superclass
/// call unless the parent is declared in this module and is provably
/// call-free. A parent that cannot be resolved locally always gets the
/// call; the rewriter never assumes anything about foreign classes.
fn needs_super_call(class: &ClassDecl, module: &Module) -> bool {
    let parent_name = match &class.extends {
        Some(name) => name,
        None => return false,
    };
    match module.find_class(parent_name) {
        Some(parent) => !parent.is_provably_call_free(),
        None => true,
    }
}

/// The static accessors for each populated metadata category. `is` is
/// always present; the others only when at least one field of the category
/// exists.
fn build_accessors(meta: &ComponentMeta) -> Vec<ClassMember> {
    let mut accessors = Vec::new();

    accessors.push(ClassMember::StaticGetter {
        name: "is".to_string(),
        return_expr: format!("'{}'", meta.tag),
    });

    let properties = serialize_properties(meta);
    if let Some(expr) = properties {
        accessors.push(ClassMember::StaticGetter {
            name: "properties".to_string(),
            return_expr: expr,
        });
    }

    let states = serialize_states(meta);
    if let Some(expr) = states {
        accessors.push(ClassMember::StaticGetter {
            name: "states".to_string(),
            return_expr: expr,
        });
    }

    let events = serialize_events(meta);
    if let Some(expr) = events {
        accessors.push(ClassMember::StaticGetter {
            name: "events".to_string(),
            return_expr: expr,
        });
    }

    accessors
}

/// Render the `properties` mapping in field declaration order. Built by
/// hand instead of through a map type so the order is the declaration
/// order, not a hash or sort order.
fn serialize_properties(meta: &ComponentMeta) -> Option<String> {
    let mut entries = Vec::new();
    for field in &meta.fields {
        if let FieldKind::Prop(options) = &field.kind {
            let descriptor = PropertyDescriptor {
                type_text: options.type_text.clone(),
                mutable: options.mutable,
                attribute: options.attribute.clone(),
                reflect: options.reflect,
                default_value: field.initial_value_text().to_string(),
            };
            entries.push(format!(
                "{}: {}",
                json_string(&field.name),
                serde_json::to_string(&descriptor).expect("descriptor serializes")
            ));
        }
    }
    if entries.is_empty() {
        None
    } else {
        Some(format!("{{ {} }}", entries.join(", ")))
    }
}

fn serialize_states(meta: &ComponentMeta) -> Option<String> {
    let entries: Vec<String> = meta
        .fields
        .iter()
        .filter(|f| f.kind == FieldKind::State)
        .map(|f| format!("{}: {{}}", json_string(&f.name)))
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(format!("{{ {} }}", entries.join(", ")))
    }
}

fn serialize_events(meta: &ComponentMeta) -> Option<String> {
    let descriptors: Vec<EventDescriptor> = meta
        .fields
        .iter()
        .filter_map(|field| match &field.kind {
            FieldKind::Event(options) => Some(EventDescriptor {
                method: field.name.clone(),
                event: options.event_name.clone(),
                bubbles: options.bubbles,
                cancelable: options.cancelable,
                composed: options.composed,
                type_text: options.type_text.clone(),
            }),
            _ => None,
        })
        .collect();
    if descriptors.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&descriptors).expect("descriptors serialize"))
    }
}

fn json_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover_components;
    use crate::parser::parse_module_source;
    use std::path::Path;

    fn rewrite(source: &str) -> (Module, Module) {
        let module = parse_module_source(source, "cmp.tsx").unwrap();
        let discovered = discover_components(&module, Path::new("/proj/src/cmp.tsx"));
        let rewritten = rewrite_module(&module, &discovered).into_owned();
        (module, rewritten)
    }

    fn only_class(module: &Module) -> &ClassDecl {
        module.classes().next().expect("one class")
    }

    fn ctor_of(class: &ClassDecl) -> &ConstructorDecl {
        class.constructor().expect("constructor present")
    }

    #[test]
    fn test_non_component_module_returned_borrowed() {
        let source = "class Helper {}\nconst x = 1;\n";
        let module = parse_module_source(source, "m.tsx").unwrap();
        let discovered = discover_components(&module, Path::new("/proj/m.tsx"));
        let result = rewrite_module(&module, &discovered);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result.as_ref(), &module);
    }

    #[test]
    fn test_fields_removed_and_assigned_in_order() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Prop() a: string = '1';
  @Prop() b: number = 2;
}
"#,
        );
        let class = only_class(&rewritten);
        // Annotated fields are gone from the body
        assert!(!class
            .members
            .iter()
            .any(|m| matches!(m, ClassMember::Field(_))));
        let ctor = ctor_of(class);
        assert_eq!(
            ctor.body,
            vec![
                CtorStatement::FieldAssign {
                    name: "a".to_string(),
                    value: "'1'".to_string(),
                },
                CtorStatement::FieldAssign {
                    name: "b".to_string(),
                    value: "2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_ordering_with_user_constructor_and_super() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA extends Base {
  @Prop() a = 1;
  @Prop() b = 2;
  constructor() {
    super();
    doSomething();
  }
}
"#,
        );
        let ctor = ctor_of(only_class(&rewritten));
        assert_eq!(ctor.body.len(), 4);
        assert!(matches!(&ctor.body[0], CtorStatement::SuperCall { .. }));
        assert_eq!(
            ctor.body[1],
            CtorStatement::FieldAssign {
                name: "a".to_string(),
                value: "1".to_string(),
            }
        );
        assert_eq!(
            ctor.body[2],
            CtorStatement::FieldAssign {
                name: "b".to_string(),
                value: "2".to_string(),
            }
        );
        assert!(matches!(&ctor.body[3], CtorStatement::Raw(s) if s.starts_with("doSomething")));
    }

    #[test]
    fn test_user_value_wins_by_running_later() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Prop() x;
  constructor() {
    this.x = 3;
  }
}
"#,
        );
        let ctor = ctor_of(only_class(&rewritten));
        assert_eq!(
            ctor.body,
            vec![
                CtorStatement::FieldAssign {
                    name: "x".to_string(),
                    value: "undefined".to_string(),
                },
                CtorStatement::FieldAssign {
                    name: "x".to_string(),
                    value: "3".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_no_constructor_synthesized_without_fields() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  render() { return null; }
}
"#,
        );
        let class = only_class(&rewritten);
        assert!(class.constructor().is_none());
        // `is` accessor is still emitted
        assert!(class.members.iter().any(|m| matches!(
            m,
            ClassMember::StaticGetter { name, .. } if name == "is"
        )));
    }

    #[test]
    fn test_super_call_for_unknown_parent() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA extends HTMLElement {
  @State() open = false;
}
"#,
        );
        let ctor = ctor_of(only_class(&rewritten));
        assert!(matches!(&ctor.body[0], CtorStatement::SuperCall { args } if args.is_empty()));
    }

    #[test]
    fn test_super_call_omitted_for_local_call_free_parent() {
        let (_, rewritten) = rewrite(
            r#"
class Base {
  helper() { return 1; }
}
@Component({ tag: 'cmp-a' })
class CmpA extends Base {
  @State() open = false;
}
"#,
        );
        let class = rewritten.find_class("CmpA").unwrap();
        let ctor = class.constructor().unwrap();
        assert!(matches!(&ctor.body[0], CtorStatement::FieldAssign { .. }));
    }

    #[test]
    fn test_super_call_kept_for_local_parent_with_constructor() {
        let (_, rewritten) = rewrite(
            r#"
class Base {
  constructor() { register(this); }
}
@Component({ tag: 'cmp-a' })
class CmpA extends Base {
  @State() open = false;
}
"#,
        );
        let class = rewritten.find_class("CmpA").unwrap();
        let ctor = class.constructor().unwrap();
        assert!(matches!(&ctor.body[0], CtorStatement::SuperCall { .. }));
    }

    #[test]
    fn test_accessors_only_for_populated_categories() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Prop() first: string;
}
"#,
        );
        let class = only_class(&rewritten);
        let getters: Vec<&str> = class
            .members
            .iter()
            .filter_map(|m| match m {
                ClassMember::StaticGetter { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(getters, vec!["is", "properties"]);
    }

    #[test]
    fn test_properties_descriptor_shape() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Prop({ mutable: true, reflect: true }) userName: string = 'anon';
}
"#,
        );
        let class = only_class(&rewritten);
        let expr = class
            .members
            .iter()
            .find_map(|m| match m {
                ClassMember::StaticGetter { name, return_expr } if name == "properties" => {
                    Some(return_expr.clone())
                }
                _ => None,
            })
            .unwrap();
        assert!(expr.contains("\"userName\""));
        assert!(expr.contains("\"type\":\"string\""));
        assert!(expr.contains("\"mutable\":true"));
        assert!(expr.contains("\"attribute\":\"user-name\""));
        assert!(expr.contains("\"reflect\":true"));
        assert!(expr.contains("\"defaultValue\":\"'anon'\""));
    }

    #[test]
    fn test_events_descriptor_order_and_no_assignment() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Event() opened: EventEmitter<void>;
  @Event({ eventName: 'cmp-closed', bubbles: false }) closed: EventEmitter<string>;
}
"#,
        );
        let class = only_class(&rewritten);
        // Event fields never reach the constructor
        assert!(class.constructor().is_none());
        let expr = class
            .members
            .iter()
            .find_map(|m| match m {
                ClassMember::StaticGetter { name, return_expr } if name == "events" => {
                    Some(return_expr.clone())
                }
                _ => None,
            })
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&expr).unwrap();
        let list = parsed.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["method"], "opened");
        assert_eq!(list[0]["event"], "opened");
        assert_eq!(list[1]["event"], "cmp-closed");
        assert_eq!(list[1]["bubbles"], false);
        assert_eq!(list[1]["type"], "string");
    }

    #[test]
    fn test_component_annotation_consumed() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {}
"#,
        );
        let class = only_class(&rewritten);
        assert!(class.annotations.is_empty());
    }

    #[test]
    fn test_rewrite_is_idempotent_over_its_own_output() {
        let (_, rewritten) = rewrite(
            r#"
@Component({ tag: 'cmp-a' })
class CmpA {
  @Prop() a = 1;
}
"#,
        );
        // The output carries no component annotation, so a second pass
        // discovers nothing and leaves the tree untouched.
        let discovered = discover_components(&rewritten, Path::new("/proj/src/cmp.tsx"));
        let second = rewrite_module(&rewritten, &discovered);
        assert!(matches!(second, Cow::Borrowed(_)));
        assert_eq!(second.as_ref(), &rewritten);
    }
}
