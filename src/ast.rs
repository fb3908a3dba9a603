//! Syntax tree types for annotated component modules
//!
//! The tree is deliberately shallow: the rewrite passes only need structure
//! for imports, requires, class declarations, and constructor statements.
//! Everything else is carried verbatim as raw text. All nodes are plain
//! values; rewrites build new trees instead of splicing in place.

/// A parsed source module.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Module {
    pub statements: Vec<Statement>,
}

impl Module {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Index of the last top-level import statement, if any.
    pub fn last_import_position(&self) -> Option<usize> {
        self.statements
            .iter()
            .rposition(|s| matches!(s, Statement::Import { .. }))
    }

    /// True if `name` is already bound by an import statement.
    pub fn has_import_binding(&self, name: &str) -> bool {
        self.statements.iter().any(|s| {
            matches!(s, Statement::Import { binding: Some(b), .. } if b == name)
        })
    }

    /// All class declarations, in source order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Class(decl) => Some(decl),
            _ => None,
        })
    }

    /// Look up a class declared in this module by name.
    pub fn find_class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes().find(|c| c.name == name)
    }
}

/// One top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `import binding from 'source';` (binding absent for bare imports).
    Import {
        binding: Option<String>,
        source: String,
    },
    /// `const binding = require('source');`
    Require { binding: String, source: String },
    Class(ClassDecl),
    /// Unmodeled statement, preserved verbatim.
    Raw(String),
}

/// A class declaration with its annotations and members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    /// Parent class name when the declaration has an `extends` clause.
    pub extends: Option<String>,
    pub exported: bool,
    /// Class-level annotations (`@Component({...})`).
    pub annotations: Vec<Annotation>,
    pub members: Vec<ClassMember>,
}

impl ClassDecl {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn constructor(&self) -> Option<&ConstructorDecl> {
        self.members.iter().find_map(|m| match m {
            ClassMember::Constructor(ctor) => Some(ctor),
            _ => None,
        })
    }

    /// True if no member is a constructor or initialized field, and the
    /// class has no parent of its own. Used to prove a bare superclass
    /// call is unnecessary for subclasses of this class.
    pub fn is_provably_call_free(&self) -> bool {
        self.extends.is_none()
            && self.members.iter().all(|m| match m {
                ClassMember::Constructor(_) => false,
                ClassMember::Field(f) => f.initial_value.is_none(),
                _ => true,
            })
    }
}

/// One class member.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Field(FieldDecl),
    Constructor(ConstructorDecl),
    /// `static get name() { return <expr>; }`
    StaticGetter { name: String, return_expr: String },
    /// Any other method or accessor, carried verbatim.
    Method(MethodDecl),
}

/// A class field declaration, annotated or not.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub annotations: Vec<Annotation>,
    pub name: String,
    /// Declared type text (`count: number`), if present.
    pub type_text: Option<String>,
    /// Initializer expression text, captured verbatim.
    pub initial_value: Option<String>,
}

impl FieldDecl {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }
}

/// A constructor with a structured statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    /// Parameter list text, verbatim.
    pub params: String,
    pub body: Vec<CtorStatement>,
}

/// One constructor body statement.
#[derive(Debug, Clone, PartialEq)]
pub enum CtorStatement {
    /// `super(<args>);` — kept distinct so synthesized field assignments
    /// can be placed after it.
    SuperCall { args: String },
    /// `this.<name> = <value>;`
    FieldAssign { name: String, value: String },
    /// Anything else, verbatim.
    Raw(String),
}

/// A method, getter, or setter carried without internal structure.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub is_static: bool,
    /// Full member text including signature and braces, verbatim.
    pub text: String,
}

/// A recognized `@Name(...)` annotation with its optional object argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    /// Key/value pairs of the object-literal argument, declaration order.
    pub args: Vec<(String, LitValue)>,
}

impl Annotation {
    pub fn arg(&self, key: &str) -> Option<&LitValue> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arg(key).and_then(LitValue::as_str)
    }

    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        self.arg(key).and_then(LitValue::as_bool)
    }
}

/// Literal values supported inside annotation arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Str(String),
    Bool(bool),
    Num(f64),
    Array(Vec<LitValue>),
    Object(Vec<(String, LitValue)>),
}

impl LitValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LitValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LitValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
