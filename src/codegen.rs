//! Output module emitter
//!
//! Renders a [`Module`] tree back to JavaScript source text. Raw statements
//! and method bodies come out verbatim; structured nodes (imports,
//! requires, rewritten classes) are rendered in a fixed normalized form.

use crate::ast::*;

const INDENT: &str = "  ";

pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn emit_module(&self, module: &Module) -> String {
        let mut out = String::new();
        for statement in &module.statements {
            self.emit_statement(statement, &mut out);
            out.push('\n');
        }
        out
    }

    fn emit_statement(&self, statement: &Statement, out: &mut String) {
        match statement {
            Statement::Import { binding, source } => match binding {
                Some(clause) => {
                    out.push_str(&format!("import {} from '{}';", clause, source));
                }
                None => {
                    out.push_str(&format!("import '{}';", source));
                }
            },
            Statement::Require { binding, source } => {
                out.push_str(&format!("const {} = require('{}');", binding, source));
            }
            Statement::Class(class) => self.emit_class(class, out),
            Statement::Raw(text) => out.push_str(text),
        }
    }

    fn emit_class(&self, class: &ClassDecl, out: &mut String) {
        for annotation in &class.annotations {
            out.push_str(&emit_annotation(annotation));
            out.push('\n');
        }
        if class.exported {
            out.push_str("export ");
        }
        out.push_str("class ");
        out.push_str(&class.name);
        if let Some(parent) = &class.extends {
            out.push_str(" extends ");
            out.push_str(parent);
        }
        out.push_str(" {\n");

        for (index, member) in class.members.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            self.emit_member(member, out);
        }
        out.push('}');
    }

    fn emit_member(&self, member: &ClassMember, out: &mut String) {
        match member {
            ClassMember::Field(field) => {
                for annotation in &field.annotations {
                    out.push_str(INDENT);
                    out.push_str(&emit_annotation(annotation));
                    out.push('\n');
                }
                out.push_str(INDENT);
                out.push_str(&field.name);
                if let Some(ty) = &field.type_text {
                    out.push_str(": ");
                    out.push_str(ty);
                }
                if let Some(value) = &field.initial_value {
                    out.push_str(" = ");
                    out.push_str(value);
                }
                out.push_str(";\n");
            }
            ClassMember::Constructor(ctor) => {
                out.push_str(INDENT);
                out.push_str("constructor(");
                out.push_str(&ctor.params);
                out.push_str(") {\n");
                for statement in &ctor.body {
                    self.emit_ctor_statement(statement, out);
                }
                out.push_str(INDENT);
                out.push_str("}\n");
            }
            ClassMember::StaticGetter { name, return_expr } => {
                out.push_str(INDENT);
                out.push_str(&format!(
                    "static get {}() {{ return {}; }}\n",
                    name, return_expr
                ));
            }
            ClassMember::Method(method) => {
                out.push_str(INDENT);
                out.push_str(&method.text);
                out.push('\n');
            }
        }
    }

    fn emit_ctor_statement(&self, statement: &CtorStatement, out: &mut String) {
        out.push_str(INDENT);
        out.push_str(INDENT);
        match statement {
            CtorStatement::SuperCall { args } => {
                out.push_str(&format!("super({});", args));
            }
            CtorStatement::FieldAssign { name, value } => {
                out.push_str(&format!("this.{} = {};", name, value));
            }
            CtorStatement::Raw(text) => out.push_str(text),
        }
        out.push('\n');
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_annotation(annotation: &Annotation) -> String {
    if annotation.args.is_empty() {
        return format!("@{}()", annotation.name);
    }
    format!("@{}({})", annotation.name, emit_object(&annotation.args))
}

fn emit_object(pairs: &[(String, LitValue)]) -> String {
    let rendered: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}: {}", key, emit_lit(value)))
        .collect();
    format!("{{ {} }}", rendered.join(", "))
}

fn emit_lit(value: &LitValue) -> String {
    match value {
        LitValue::Str(s) => format!("'{}'", s),
        LitValue::Bool(b) => b.to_string(),
        LitValue::Num(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        LitValue::Array(items) => {
            let rendered: Vec<String> = items.iter().map(emit_lit).collect();
            format!("[{}]", rendered.join(", "))
        }
        LitValue::Object(pairs) => emit_object(pairs),
    }
}
