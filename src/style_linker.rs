//! Style import linking
//!
//! Binds every component style entry with external assets into the
//! module's import graph, under the convention of the output module
//! format: appended static imports for ESM, prepended require declarations
//! for CommonJS. The derived module path comes from the configured
//! serializer and is used verbatim.

use crate::ast::{Module, Statement};
use crate::discovery::DiscoveredComponent;
use crate::platform::{StyleImportConfig, StyleImportRequest, StylePathSerializer};
use crate::types::ModuleFormat;
use std::borrow::Cow;
use std::path::Path;

/// Link the style imports for all components of one module. Returns
/// `Cow::Borrowed` when no component requires linking, so callers can skip
/// rewriting downstream.
pub fn link_style_imports<'a>(
    module: &'a Module,
    components: &[DiscoveredComponent],
    module_path: &Path,
    format: ModuleFormat,
    serializer: &dyn StylePathSerializer,
    config: &StyleImportConfig,
) -> Cow<'a, Module> {
    // (identifier, derived path) pairs in component/style iteration order
    let mut links: Vec<(String, String)> = Vec::new();
    for component in components {
        for entry in component.meta.linked_styles() {
            let identifier = match &entry.identifier {
                Some(id) => id.clone(),
                None => continue,
            };
            let request = StyleImportRequest {
                importee_path: entry.external_assets[0].clone(),
                importer_path: module_path.to_path_buf(),
                tag: component.meta.tag.clone(),
                encapsulation: component.meta.encapsulation,
                mode: entry.mode.clone(),
            };
            links.push((identifier, serializer.serialize(&request, config)));
        }
    }

    if links.is_empty() {
        return Cow::Borrowed(module);
    }

    let statements = match format {
        ModuleFormat::Esm => link_static_imports(module, links),
        ModuleFormat::CommonJs => link_eager_requires(module, links),
    };
    Cow::Owned(Module::new(statements))
}

/// Static-import convention: rewrite the path of an existing binding in
/// place, or append a fresh import after the last existing import.
fn link_static_imports(module: &Module, links: Vec<(String, String)>) -> Vec<Statement> {
    let mut statements = module.statements.clone();

    let mut insert_at = statements
        .iter()
        .rposition(|s| matches!(s, Statement::Import { .. }))
        .map(|i| i + 1)
        .unwrap_or(0);

    for (identifier, source) in links {
        let existing = statements.iter().position(|s| {
            matches!(s, Statement::Import { binding: Some(b), .. } if *b == identifier)
        });
        match existing {
            Some(index) => {
                // Keep the binding and its position, swap the module path
                statements[index] = Statement::Import {
                    binding: Some(identifier),
                    source,
                };
            }
            None => {
                statements.insert(
                    insert_at,
                    Statement::Import {
                        binding: Some(identifier),
                        source,
                    },
                );
                insert_at += 1;
            }
        }
    }
    statements
}

/// Eager-require convention: prepend one declaration per entry, ahead of
/// all original statements, in iteration order.
fn link_eager_requires(module: &Module, links: Vec<(String, String)>) -> Vec<Statement> {
    let mut statements: Vec<Statement> = links
        .into_iter()
        .map(|(binding, source)| Statement::Require { binding, source })
        .collect();
    statements.extend(module.statements.iter().cloned());
    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover_components;
    use crate::parser::parse_module_source;
    use crate::platform::QueryStringSerializer;
    use std::path::PathBuf;

    fn parse(source: &str) -> Module {
        parse_module_source(source, "cmp-a.tsx").unwrap()
    }

    fn link<'a>(module: &'a Module, format: ModuleFormat) -> Cow<'a, Module> {
        let module_path = PathBuf::from("/proj/src/cmp-a.tsx");
        let components = discover_components(module, &module_path);
        link_style_imports(
            module,
            &components,
            &module_path,
            format,
            &QueryStringSerializer,
            &StyleImportConfig { query_data: false },
        )
    }

    #[test]
    fn test_module_without_linking_returned_borrowed() {
        let module = parse("class Helper {}\n");
        assert!(matches!(link(&module, ModuleFormat::Esm), Cow::Borrowed(_)));

        // Inline styles need no import either
        let module = parse("@Component({ tag: 'cmp-a', styles: ':host {}' })\nclass CmpA {}\n");
        assert!(matches!(link(&module, ModuleFormat::Esm), Cow::Borrowed(_)));
    }

    #[test]
    fn test_static_import_appended_after_last_import() {
        let source = r#"
import { h } from 'runtime';
import util from './util';
@Component({ tag: 'cmp-a', styleUrl: './cmp-a.css' })
class CmpA {}
"#;
        let original = parse(source);
        let linked = link(&original, ModuleFormat::Esm).into_owned();
        assert_eq!(linked.statements.len(), original.statements.len() + 1);

        // Prior imports keep their order and text
        assert_eq!(linked.statements[0], original.statements[0]);
        assert_eq!(linked.statements[1], original.statements[1]);
        assert_eq!(
            linked.statements[2],
            Statement::Import {
                binding: Some("cmpAStyle0".to_string()),
                source: "./cmp-a.css".to_string(),
            }
        );
    }

    #[test]
    fn test_static_import_added_at_top_when_no_imports_exist() {
        let source = "@Component({ tag: 'cmp-a', styleUrl: './cmp-a.css' })\nclass CmpA {}\n";
        let original = parse(source);
        let linked = link(&original, ModuleFormat::Esm).into_owned();
        assert!(matches!(
            &linked.statements[0],
            Statement::Import { binding: Some(b), .. } if b == "cmpAStyle0"
        ));
    }

    #[test]
    fn test_existing_binding_rewritten_in_place() {
        let source = r#"
import cmpAStyle0 from './stale-path.css';
import other from './other';
@Component({ tag: 'cmp-a', styleUrl: './cmp-a.css' })
class CmpA {}
"#;
        let original = parse(source);
        let linked = link(&original, ModuleFormat::Esm).into_owned();
        // No statement added, binding stays at index 0
        assert_eq!(linked.statements.len(), original.statements.len());
        assert_eq!(
            linked.statements[0],
            Statement::Import {
                binding: Some("cmpAStyle0".to_string()),
                source: "./cmp-a.css".to_string(),
            }
        );
        assert_eq!(linked.statements[1], original.statements[1]);
    }

    #[test]
    fn test_eager_requires_prepended_in_order() {
        let source = r#"
import { h } from 'runtime';
@Component({ tag: 'cmp-a', styleUrls: { ios: './ios.css', md: './md.css' } })
class CmpA {}
"#;
        let original = parse(source);
        let linked = link(&original, ModuleFormat::CommonJs).into_owned();
        assert_eq!(linked.statements.len(), original.statements.len() + 2);
        assert_eq!(
            linked.statements[0],
            Statement::Require {
                binding: "cmpAStyle0".to_string(),
                source: "./ios.css".to_string(),
            }
        );
        assert_eq!(
            linked.statements[1],
            Statement::Require {
                binding: "cmpAStyle1".to_string(),
                source: "./md.css".to_string(),
            }
        );
        assert_eq!(linked.statements[2], original.statements[0]);
    }

    #[test]
    fn test_multi_mode_static_imports() {
        let source = r#"
import { h } from 'runtime';
@Component({ tag: 'cmp-a', styleUrls: { ios: './ios.css', md: './md.css' } })
class CmpA {}
"#;
        let original = parse(source);
        let linked = link(&original, ModuleFormat::Esm).into_owned();
        assert!(matches!(
            &linked.statements[1],
            Statement::Import { binding: Some(b), .. } if b == "cmpAStyle0"
        ));
        assert!(matches!(
            &linked.statements[2],
            Statement::Import { binding: Some(b), .. } if b == "cmpAStyle1"
        ));
    }
}
