//! Parser for annotated component modules
//!
//! Statement-granular: import/require statements, class declarations, and
//! constructor bodies are parsed into structure; every other statement is
//! captured verbatim as raw text so the emitter can reproduce it untouched.
//! The scanner is byte-position based over the source string and tracks
//! line numbers for error reporting.

use crate::ast::*;
use crate::error::{CompilerError, Result};

pub struct Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    file: String,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, file: impl Into<String>) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            file: file.into(),
        }
    }

    /// Parse the whole module.
    pub fn parse_module(&mut self) -> Result<Module> {
        let mut statements = Vec::new();
        loop {
            self.skip_trivia();
            if self.at_end() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(Module::new(statements))
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let annotations = self.parse_annotations()?;

        if !annotations.is_empty() {
            // Annotations only precede class declarations at top level
            return Ok(Statement::Class(self.parse_class(annotations)?));
        }

        if self.lookahead_keyword("import") {
            return self.parse_import();
        }
        if self.lookahead_require() {
            return self.parse_require();
        }
        if self.lookahead_keyword("class")
            || (self.lookahead_keyword("export") && self.lookahead_second_keyword("class"))
        {
            return Ok(Statement::Class(self.parse_class(Vec::new())?));
        }

        Ok(Statement::Raw(self.capture_raw_statement()?))
    }

    // ---- imports -----------------------------------------------------

    fn parse_import(&mut self) -> Result<Statement> {
        self.expect_keyword("import")?;
        self.skip_trivia();

        if self.peek() == Some(b'\'') || self.peek() == Some(b'"') {
            // Bare side-effect import
            let source = self.parse_string_literal()?;
            self.eat_semicolon();
            return Ok(Statement::Import {
                binding: None,
                source,
            });
        }

        // Everything between `import` and `from` is the binding clause,
        // usually a single identifier for generated style imports.
        let clause_start = self.pos;
        while !self.at_end() && !self.lookahead_keyword("from") {
            if self.peek() == Some(b'\'') || self.peek() == Some(b'"') {
                return Err(self.error("expected 'from' in import statement"));
            }
            self.bump();
        }
        let clause = self.source[clause_start..self.pos].trim().to_string();
        self.expect_keyword("from")?;
        self.skip_trivia();
        let source = self.parse_string_literal()?;
        self.eat_semicolon();

        Ok(Statement::Import {
            binding: Some(clause),
            source,
        })
    }

    fn lookahead_require(&self) -> bool {
        let rest = &self.source[self.pos..];
        if !rest.starts_with("const") {
            return false;
        }
        // const <ident> = require(
        let after = rest["const".len()..].trim_start();
        let ident_len = after
            .char_indices()
            .take_while(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '$')
            .count();
        if ident_len == 0 {
            return false;
        }
        let after_ident = after[ident_len..].trim_start();
        after_ident.starts_with('=') && after_ident[1..].trim_start().starts_with("require")
    }

    fn parse_require(&mut self) -> Result<Statement> {
        self.expect_keyword("const")?;
        self.skip_trivia();
        let binding = self.parse_identifier()?;
        self.skip_trivia();
        self.expect_byte(b'=')?;
        self.skip_trivia();
        self.expect_keyword("require")?;
        self.skip_trivia();
        self.expect_byte(b'(')?;
        self.skip_trivia();
        let source = self.parse_string_literal()?;
        self.skip_trivia();
        self.expect_byte(b')')?;
        self.eat_semicolon();
        Ok(Statement::Require { binding, source })
    }

    // ---- classes -----------------------------------------------------

    fn parse_class(&mut self, annotations: Vec<Annotation>) -> Result<ClassDecl> {
        let mut exported = false;
        if self.lookahead_keyword("export") {
            self.expect_keyword("export")?;
            self.skip_trivia();
            exported = true;
        }
        self.expect_keyword("class")?;
        self.skip_trivia();
        let name = self.parse_identifier()?;
        self.skip_trivia();

        let mut extends = None;
        if self.lookahead_keyword("extends") {
            self.expect_keyword("extends")?;
            self.skip_trivia();
            extends = Some(self.parse_identifier()?);
            self.skip_trivia();
        }

        self.expect_byte(b'{')?;
        let mut members = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(b'}') {
                self.bump();
                break;
            }
            if self.at_end() {
                return Err(self.error(format!("unterminated class body for '{}'", name)));
            }
            members.push(self.parse_class_member()?);
        }

        Ok(ClassDecl {
            name,
            extends,
            exported,
            annotations,
            members,
        })
    }

    fn parse_class_member(&mut self) -> Result<ClassMember> {
        let annotations = self.parse_annotations()?;
        self.skip_trivia();

        let member_start = self.pos;
        let mut is_static = false;
        if self.lookahead_keyword("static") {
            self.expect_keyword("static")?;
            self.skip_trivia();
            is_static = true;
        }

        if !is_static && self.lookahead_keyword("constructor") {
            return Ok(ClassMember::Constructor(self.parse_constructor()?));
        }

        let mut accessor = None;
        if self.lookahead_keyword("get") || self.lookahead_keyword("set") {
            let checkpoint = self.pos;
            let word = self.parse_identifier()?;
            self.skip_trivia();
            // `get` may also be a plain member name
            if self.peek() == Some(b'(') || self.peek() == Some(b'=') || self.peek() == Some(b';') {
                self.pos = checkpoint;
            } else {
                accessor = Some(word);
            }
        }

        let name = self.parse_identifier()?;
        self.skip_trivia();

        if self.peek() == Some(b'(') {
            // Method or accessor: capture verbatim through its body
            self.capture_balanced(b'(', b')')?;
            self.skip_trivia();
            if self.peek() == Some(b':') {
                // Declared return type, part of the verbatim member text
                self.capture_until_any(&[b'{'])?;
            }
            let body = self.capture_balanced(b'{', b'}')?;

            if is_static && accessor.as_deref() == Some("get") {
                if let Some(expr) = single_return_expr(&body) {
                    return Ok(ClassMember::StaticGetter {
                        name,
                        return_expr: expr,
                    });
                }
            }
            let text = self.source[member_start..self.pos].trim_end().to_string();
            return Ok(ClassMember::Method(MethodDecl {
                name,
                is_static,
                text,
            }));
        }

        // Field: optional `: type`, optional `= value`, terminated by `;`
        let mut type_text = None;
        if self.peek() == Some(b':') {
            self.bump();
            let ty = self.capture_until_any(&[b'=', b';', b'\n'])?;
            type_text = Some(ty.trim().to_string());
        }
        let mut initial_value = None;
        self.skip_trivia();
        if self.peek() == Some(b'=') {
            self.bump();
            let value = self.capture_expression_until_semicolon()?;
            initial_value = Some(value.trim().to_string());
        }
        self.eat_semicolon();

        Ok(ClassMember::Field(FieldDecl {
            annotations,
            name,
            type_text,
            initial_value,
        }))
    }

    fn parse_constructor(&mut self) -> Result<ConstructorDecl> {
        self.expect_keyword("constructor")?;
        self.skip_trivia();
        let params_raw = self.capture_balanced(b'(', b')')?;
        let params = params_raw[1..params_raw.len() - 1].trim().to_string();
        self.skip_trivia();
        let body_raw = self.capture_balanced(b'{', b'}')?;
        let inner = &body_raw[1..body_raw.len() - 1];
        let body = parse_ctor_body(inner);
        Ok(ConstructorDecl { params, body })
    }

    // ---- annotations -------------------------------------------------

    fn parse_annotations(&mut self) -> Result<Vec<Annotation>> {
        let mut annotations = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() != Some(b'@') {
                break;
            }
            self.bump();
            let name = self.parse_identifier()?;
            self.skip_trivia();
            let mut args = Vec::new();
            if self.peek() == Some(b'(') {
                self.bump();
                self.skip_trivia();
                match self.peek() {
                    Some(b'{') => {
                        args = self.parse_object_literal()?;
                        self.skip_trivia();
                    }
                    Some(b'\'') | Some(b'"') => {
                        // Single string argument (`@Watch('prop')` shape)
                        let value = self.parse_string_literal()?;
                        args.push(("value".to_string(), LitValue::Str(value)));
                        self.skip_trivia();
                    }
                    _ => {}
                }
                self.expect_byte(b')')?;
            }
            annotations.push(Annotation { name, args });
        }
        Ok(annotations)
    }

    fn parse_object_literal(&mut self) -> Result<Vec<(String, LitValue)>> {
        self.expect_byte(b'{')?;
        let mut pairs = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() == Some(b'}') {
                self.bump();
                break;
            }
            let key = if self.peek() == Some(b'\'') || self.peek() == Some(b'"') {
                self.parse_string_literal()?
            } else {
                self.parse_identifier()?
            };
            self.skip_trivia();
            self.expect_byte(b':')?;
            self.skip_trivia();
            let value = self.parse_lit_value()?;
            pairs.push((key, value));
            self.skip_trivia();
            if self.peek() == Some(b',') {
                self.bump();
            }
        }
        Ok(pairs)
    }

    fn parse_lit_value(&mut self) -> Result<LitValue> {
        match self.peek() {
            Some(b'\'') | Some(b'"') | Some(b'`') => Ok(LitValue::Str(self.parse_string_literal()?)),
            Some(b'{') => Ok(LitValue::Object(self.parse_object_literal()?)),
            Some(b'[') => {
                self.bump();
                let mut items = Vec::new();
                loop {
                    self.skip_trivia();
                    if self.peek() == Some(b']') {
                        self.bump();
                        break;
                    }
                    items.push(self.parse_lit_value()?);
                    self.skip_trivia();
                    if self.peek() == Some(b',') {
                        self.bump();
                    }
                }
                Ok(LitValue::Array(items))
            }
            _ => {
                let word_start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_ascii_alphanumeric() || c == b'.' || c == b'-' || c == b'_' {
                        self.bump();
                    } else {
                        break;
                    }
                }
                let word = &self.source[word_start..self.pos];
                match word {
                    "true" => Ok(LitValue::Bool(true)),
                    "false" => Ok(LitValue::Bool(false)),
                    _ => word
                        .parse::<f64>()
                        .map(LitValue::Num)
                        .map_err(|_| self.error(format!("unsupported annotation value '{}'", word))),
                }
            }
        }
    }

    // ---- raw capture -------------------------------------------------

    /// Capture one unmodeled statement verbatim: up to a top-level `;`, or
    /// the end of a balanced brace block when one opens first.
    fn capture_raw_statement(&mut self) -> Result<String> {
        let start = self.pos;
        let mut paren_depth = 0usize;
        let mut brace_depth = 0usize;
        let mut saw_brace = false;

        while let Some(c) = self.peek() {
            match c {
                b'\'' | b'"' | b'`' => {
                    self.parse_string_literal()?;
                    continue;
                }
                b'/' if self.peek_at(1) == Some(b'/') || self.peek_at(1) == Some(b'*') => {
                    self.skip_comment()?;
                    continue;
                }
                b'(' | b'[' => paren_depth += 1,
                b')' | b']' => paren_depth = paren_depth.saturating_sub(1),
                b'{' => {
                    brace_depth += 1;
                    saw_brace = true;
                }
                b'}' => {
                    brace_depth = brace_depth.saturating_sub(1);
                    if saw_brace && brace_depth == 0 && paren_depth == 0 {
                        self.bump();
                        // Trailing semicolon belongs to the statement
                        if self.peek() == Some(b';') {
                            self.bump();
                        }
                        return Ok(self.source[start..self.pos].trim_end().to_string());
                    }
                }
                b';' if paren_depth == 0 && brace_depth == 0 => {
                    self.bump();
                    return Ok(self.source[start..self.pos].trim_end().to_string());
                }
                b'\n' if paren_depth == 0 && brace_depth == 0 => {
                    // Statement without a semicolon ends at the line break
                    let text = self.source[start..self.pos].trim_end().to_string();
                    self.bump();
                    return Ok(text);
                }
                _ => {}
            }
            self.bump();
        }
        Ok(self.source[start..self.pos].trim_end().to_string())
    }

    /// Capture a balanced region including its delimiters.
    fn capture_balanced(&mut self, open: u8, close: u8) -> Result<String> {
        let start = self.pos;
        self.expect_byte(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(self.error("unexpected end of input in balanced block")),
                Some(b'\'') | Some(b'"') | Some(b'`') => {
                    self.parse_string_literal()?;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') || self.peek_at(1) == Some(b'*') => {
                    self.skip_comment()?;
                }
                Some(c) => {
                    if c == open {
                        depth += 1;
                    } else if c == close {
                        depth -= 1;
                    }
                    self.bump();
                }
            }
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn capture_until_any(&mut self, stops: &[u8]) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.bump();
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// Capture an initializer expression up to a top-level `;` or the end
    /// of the line when no nesting remains open.
    fn capture_expression_until_semicolon(&mut self) -> Result<String> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                b'\'' | b'"' | b'`' => {
                    self.parse_string_literal()?;
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                b';' if depth == 0 => break,
                b'\n' if depth == 0 => break,
                _ => {}
            }
            self.bump();
        }
        Ok(self.source[start..self.pos].to_string())
    }

    // ---- scanner primitives ------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        if let Some(b'\n') = self.peek() {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if (c as char).is_whitespace() => self.bump(),
                Some(b'/') if self.peek_at(1) == Some(b'/') || self.peek_at(1) == Some(b'*') => {
                    let _ = self.skip_comment();
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        if self.peek_at(1) == Some(b'/') {
            while let Some(c) = self.peek() {
                if c == b'\n' {
                    break;
                }
                self.bump();
            }
        } else {
            self.bump();
            self.bump();
            loop {
                match self.peek() {
                    None => return Err(self.error("unterminated block comment")),
                    Some(b'*') if self.peek_at(1) == Some(b'/') => {
                        self.bump();
                        self.bump();
                        break;
                    }
                    _ => self.bump(),
                }
            }
        }
        Ok(())
    }

    fn lookahead_keyword(&self, keyword: &str) -> bool {
        let rest = &self.source[self.pos..];
        rest.starts_with(keyword)
            && !rest[keyword.len()..]
                .chars()
                .next()
                .map(|c| c.is_alphanumeric() || c == '_' || c == '$')
                .unwrap_or(false)
    }

    fn lookahead_second_keyword(&self, keyword: &str) -> bool {
        let rest = self.source[self.pos..]
            .split_whitespace()
            .nth(1)
            .unwrap_or("");
        rest == keyword || rest.starts_with(keyword)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if !self.lookahead_keyword(keyword) {
            return Err(self.error(format!("expected '{}'", keyword)));
        }
        self.pos += keyword.len();
        Ok(())
    }

    fn expect_byte(&mut self, byte: u8) -> Result<()> {
        if self.peek() != Some(byte) {
            return Err(self.error(format!("expected '{}'", byte as char)));
        }
        self.bump();
        Ok(())
    }

    fn eat_semicolon(&mut self) {
        self.skip_trivia();
        if self.peek() == Some(b';') {
            self.bump();
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == b'_' || c == b'$' || c == b'#' => self.bump(),
            _ => return Err(self.error("expected identifier")),
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' {
                self.bump();
            } else {
                break;
            }
        }
        Ok(self.source[start..self.pos].to_string())
    }

    /// Parse a quoted string and return its unquoted content. Template
    /// literals are returned with their contents verbatim.
    fn parse_string_literal(&mut self) -> Result<String> {
        let quote = self.peek().ok_or_else(|| self.error("expected string"))?;
        if quote != b'\'' && quote != b'"' && quote != b'`' {
            return Err(self.error("expected string literal"));
        }
        self.bump();
        let start = self.pos;
        let mut escaped = false;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) => {
                    if escaped {
                        escaped = false;
                        self.bump();
                    } else if c == b'\\' {
                        escaped = true;
                        self.bump();
                    } else if c == quote {
                        let content = self.source[start..self.pos].to_string();
                        self.bump();
                        return Ok(content);
                    } else {
                        self.bump();
                    }
                }
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> CompilerError {
        CompilerError::parse(&self.file, self.line, message)
    }
}

/// Split a constructor body into classified statements. Statements with
/// nested braces or parenthesized semicolons stay intact as raw text.
fn parse_ctor_body(body: &str) -> Vec<CtorStatement> {
    let mut statements = Vec::new();
    for text in split_statements(body) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        statements.push(classify_ctor_statement(trimmed));
    }
    statements
}

fn classify_ctor_statement(text: &str) -> CtorStatement {
    if let Some(rest) = text.strip_prefix("super") {
        let rest = rest.trim_start();
        if rest.starts_with('(') {
            if let Some(close) = rest.rfind(')') {
                let args = rest[1..close].trim().to_string();
                return CtorStatement::SuperCall { args };
            }
        }
    }
    if let Some(rest) = text.strip_prefix("this.") {
        // this.<ident> = <value>;
        let ident_len = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
            .count();
        if ident_len > 0 {
            let (name, after) = rest.split_at(ident_len);
            let after = after.trim_start();
            if let Some(value) = after.strip_prefix('=') {
                if !value.starts_with('=') {
                    let value = value.trim().trim_end_matches(';').trim_end().to_string();
                    return CtorStatement::FieldAssign {
                        name: name.to_string(),
                        value,
                    };
                }
            }
        }
    }
    CtorStatement::Raw(text.to_string())
}

/// Split a block body at top-level statement boundaries, keeping strings,
/// comments, and nested blocks intact.
fn split_statements(body: &str) -> Vec<String> {
    let bytes = body.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    let mut depth = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' | b'`' => {
                let quote = bytes[i];
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\\' {
                        i += 2;
                    } else if bytes[i] == quote {
                        i += 1;
                        break;
                    } else {
                        i += 1;
                    }
                }
                continue;
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    // A block statement ends here without a semicolon
                    statements.push(body[start..=i].to_string());
                    start = i + 1;
                }
            }
            b';' if depth == 0 => {
                statements.push(body[start..=i].to_string());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < body.len() {
        statements.push(body[start..].to_string());
    }
    statements
}

/// Extract `EXPR` from a getter body of the exact shape `{ return EXPR; }`.
fn single_return_expr(body: &str) -> Option<String> {
    let inner = body
        .trim()
        .strip_prefix('{')?
        .strip_suffix('}')?
        .trim();
    let expr = inner.strip_prefix("return")?.trim();
    let expr = expr.strip_suffix(';').unwrap_or(expr).trim();
    if expr.is_empty() || expr.contains("return") {
        return None;
    }
    Some(expr.to_string())
}

/// Convenience wrapper for one-shot parses.
pub fn parse_module_source(source: &str, file: &str) -> Result<Module> {
    Parser::new(source, file).parse_module()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        parse_module_source(source, "test.tsx").unwrap()
    }

    #[test]
    fn test_parse_imports() {
        let module = parse("import { h } from 'runtime';\nimport './polyfill';\n");
        assert_eq!(module.statements.len(), 2);
        assert_eq!(
            module.statements[0],
            Statement::Import {
                binding: Some("{ h }".to_string()),
                source: "runtime".to_string(),
            }
        );
        assert_eq!(
            module.statements[1],
            Statement::Import {
                binding: None,
                source: "./polyfill".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_require() {
        let module = parse("const cmpAStyle0 = require('./cmp-a.css');\n");
        assert_eq!(
            module.statements[0],
            Statement::Require {
                binding: "cmpAStyle0".to_string(),
                source: "./cmp-a.css".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_component_class() {
        let source = r#"
@Component({ tag: 'cmp-a', styleUrl: './cmp-a.css', shadow: true })
export class CmpA extends HTMLElement {
  @Prop() first: string;
  @State() count = 0;

  render() {
    return this.first;
  }
}
"#;
        let module = parse(source);
        let class = module.find_class("CmpA").expect("class parsed");
        assert!(class.exported);
        assert_eq!(class.extends.as_deref(), Some("HTMLElement"));

        let component = class.annotation("Component").expect("annotation");
        assert_eq!(component.str_arg("tag"), Some("cmp-a"));
        assert_eq!(component.bool_arg("shadow"), Some(true));

        assert_eq!(class.members.len(), 3);
        match &class.members[0] {
            ClassMember::Field(f) => {
                assert_eq!(f.name, "first");
                assert_eq!(f.type_text.as_deref(), Some("string"));
                assert!(f.initial_value.is_none());
                assert!(f.annotation("Prop").is_some());
            }
            other => panic!("expected field, got {:?}", other),
        }
        match &class.members[1] {
            ClassMember::Field(f) => {
                assert_eq!(f.initial_value.as_deref(), Some("0"));
            }
            other => panic!("expected field, got {:?}", other),
        }
        assert!(matches!(&class.members[2], ClassMember::Method(m) if m.name == "render"));
    }

    #[test]
    fn test_parse_constructor_statements() {
        let source = r#"
class CmpB extends Base {
  constructor() {
    super();
    this.count = 5;
    if (this.count > 3) { this.count = 3; }
  }
}
"#;
        let module = parse(source);
        let class = module.find_class("CmpB").unwrap();
        let ctor = class.constructor().expect("constructor parsed");
        assert_eq!(ctor.body.len(), 3);
        assert_eq!(ctor.body[0], CtorStatement::SuperCall { args: String::new() });
        assert_eq!(
            ctor.body[1],
            CtorStatement::FieldAssign {
                name: "count".to_string(),
                value: "5".to_string(),
            }
        );
        assert!(matches!(&ctor.body[2], CtorStatement::Raw(text) if text.starts_with("if")));
    }

    #[test]
    fn test_style_urls_annotation() {
        let source = r#"
@Component({ tag: 'cmp-c', styleUrls: { ios: './ios.css', md: './md.css' } })
class CmpC {}
"#;
        let module = parse(source);
        let class = module.find_class("CmpC").unwrap();
        let annotation = class.annotation("Component").unwrap();
        match annotation.arg("styleUrls") {
            Some(LitValue::Object(pairs)) => {
                assert_eq!(pairs.len(), 2);
                assert_eq!(pairs[0].0, "ios");
                assert_eq!(pairs[1].1, LitValue::Str("./md.css".to_string()));
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_static_getter_parsed() {
        let source = r#"
class CmpD {
  static get is() { return 'cmp-d'; }
  get instanceThing() { return 1; }
}
"#;
        let module = parse(source);
        let class = module.find_class("CmpD").unwrap();
        assert_eq!(
            class.members[0],
            ClassMember::StaticGetter {
                name: "is".to_string(),
                return_expr: "'cmp-d'".to_string(),
            }
        );
        // Instance getters stay unstructured
        assert!(matches!(&class.members[1], ClassMember::Method(_)));
    }

    #[test]
    fn test_raw_statements_preserved() {
        let source = "const answer = 40 + 2;\nfunction helper() { return answer; }\n";
        let module = parse(source);
        assert_eq!(module.statements.len(), 2);
        assert_eq!(
            module.statements[0],
            Statement::Raw("const answer = 40 + 2;".to_string())
        );
        assert!(matches!(
            &module.statements[1],
            Statement::Raw(text) if text.starts_with("function helper")
        ));
    }

    #[test]
    fn test_strings_with_braces_do_not_confuse_scanner() {
        let source = "const template = \"if { nested } braces; here\";\nclass CmpE {}\n";
        let module = parse(source);
        assert_eq!(module.statements.len(), 2);
        assert!(module.find_class("CmpE").is_some());
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = parse_module_source("import broken", "mod.tsx").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("mod.tsx"));
        assert!(rendered.contains("line 1"));
    }
}
