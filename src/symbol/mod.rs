//! Walks the AST once and emits richly annotated function and variable
//! records: canonical names, scope chains, path signatures, spans,
//! digests, enclosing-context stacks, and replaceability flags.
//!
//! Unlike a per-language tree-sitter query table, this collector is a
//! single recursive descent that matches on `node.kind()` directly and
//! threads an immutable visitor context (scope chain, enclosing stack,
//! path segments, export kind) by value at each descent — cheap
//! copy-on-push slices rather than back-pointers into the tree.

use crate::bytemap::{ByteMapper, Span};
use crate::digest::{compute_hash, HashConfig};
use crate::error::Result;
use crate::lang;
use std::collections::{HashMap, HashSet};
use tree_sitter::Node;

const TEST_CALLBACK_NAMES: &[&str] = &[
    "describe", "test", "it", "beforeEach", "beforeAll", "afterEach", "afterAll", "context",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    FunctionDeclaration,
    FunctionExpression,
    ArrowFunction,
    Class,
    ClassMethod,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::FunctionDeclaration => "function-declaration",
            FunctionKind::FunctionExpression => "function-expression",
            FunctionKind::ArrowFunction => "arrow-function",
            FunctionKind::Class => "class",
            FunctionKind::ClassMethod => "class-method",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    None,
    Named,
    Default,
    CommonjsDefault,
    CommonjsNamed,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::None => "none",
            ExportKind::Named => "named",
            ExportKind::Default => "default",
            ExportKind::CommonjsDefault => "commonjs-default",
            ExportKind::CommonjsNamed => "commonjs-named",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
    ClassField,
    Assignment,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
            VariableKind::ClassField => "class-field",
            VariableKind::Assignment => "assignment",
        }
    }
}

/// One scope-chain entry: an owner name plus an optional role marker
/// (`exports`, `module.exports`, `#method`, `static name`, `get name`,
/// `set name`, `call:callee:label`).
#[derive(Debug, Clone)]
pub struct ScopeEntry {
    pub name: String,
    pub role: Option<String>,
}

/// An enclosing wrapper around a record: class, function, export, or call.
#[derive(Debug, Clone)]
pub struct EnclosingContext {
    pub kind: String,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, Default)]
pub struct TypeScriptPayload {
    pub class_modifiers: Vec<String>,
    pub member_modifiers: Vec<String>,
    pub parameter_properties: Vec<String>,
    pub type_annotation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub span: Span,
    pub identifier_span: Option<Span>,
    pub original_name: String,
    pub canonical_name: String,
    pub kind: FunctionKind,
    pub export_kind: ExportKind,
    pub replaceable: bool,
    pub scope_chain: Vec<ScopeEntry>,
    pub path_signature: String,
    pub digest: String,
    pub enclosing: Vec<EnclosingContext>,
    pub line: usize,
    pub column: usize,
    pub byte_length: usize,
    pub ts: TypeScriptPayload,
    pub selector_tokens: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct VariableRecord {
    pub binding_span: Span,
    pub declarator_span: Span,
    pub declaration_span: Span,
    pub binding_digest: String,
    pub declarator_digest: String,
    pub declaration_digest: String,
    pub binding_path: String,
    pub declarator_path: String,
    pub declaration_path: String,
    pub name: String,
    pub kind: VariableKind,
    pub export_kind: ExportKind,
    pub scope_chain: Vec<ScopeEntry>,
    pub initializer_type: String,
    pub enclosing: Vec<EnclosingContext>,
    pub selector_tokens: HashSet<String>,
}

/// Per-class metadata: name, superclass, implements list, constructor
/// parameter descriptors, keyed by the class's own span.
#[derive(Debug, Clone, Default)]
pub struct ClassMetadata {
    pub name: String,
    pub superclass: Option<String>,
    pub implements: Vec<String>,
    pub constructors: HashMap<String, Vec<String>>,
}

/// The record pools produced by one collection pass, plus the mapper
/// and source they were derived from (needed for re-digesting and
/// re-slicing during guard checks).
pub struct SymbolPool {
    pub mapper: ByteMapper,
    pub functions: Vec<FunctionRecord>,
    pub variables: Vec<VariableRecord>,
    pub classes: HashMap<String, ClassMetadata>,
    pub hash_config: HashConfig,
}

impl SymbolPool {
    pub fn collect(source: &str, hash_config: HashConfig) -> Result<Self> {
        let mapper = ByteMapper::new(source);
        let tree = lang::parse(source)?;
        let mut pool = SymbolPool {
            mapper,
            functions: Vec::new(),
            variables: Vec::new(),
            classes: HashMap::new(),
            hash_config,
        };
        let root = tree.root_node();
        let ctx = WalkCtx::default();
        pool.walk(root, &ctx);
        Ok(pool)
    }

    fn digest_span(&self, span: &Span) -> String {
        compute_hash(&self.mapper, span, &self.hash_config)
    }

    fn make_span(&self, node: Node) -> Span {
        self.mapper
            .span_from_byte_range(node.start_byte(), node.end_byte())
    }

    fn walk(&mut self, node: Node, ctx: &WalkCtx) {
        let mut cursor = node.walk();
        for (idx, child) in node.named_children(&mut cursor).enumerate() {
            self.visit(child, node, idx, ctx);
        }
    }

    fn child_label(&self, parent: Node, child: Node, index: usize) -> String {
        if let Some(field) = parent.field_name_for_child(child.id() as u32) {
            field.to_string()
        } else {
            format!("body[{index}]")
        }
    }

    fn visit(&mut self, node: Node, parent: Node, index: usize, ctx: &WalkCtx) {
        let label = self.child_label(parent, node, index);
        let mut child_path = ctx.path.clone();
        child_path.push(label);

        match node.kind() {
            "function_declaration" => {
                self.emit_function_declaration(node, ctx, &child_path);
                self.descend_into_body(node, ctx, &child_path, None);
            }
            "class_declaration" | "class" => {
                self.emit_class(node, ctx, &child_path);
            }
            "lexical_declaration" | "variable_declaration" => {
                self.emit_variable_declaration(node, ctx, &child_path);
            }
            "export_statement" => {
                self.emit_export_statement(node, ctx, &child_path);
            }
            "expression_statement" => {
                if let Some(expr) = node.named_child(0) {
                    if expr.kind() == "assignment_expression" {
                        self.emit_assignment(expr, ctx, &child_path);
                    }
                }
                self.walk(node, &ctx.with_path(child_path));
            }
            "call_expression" => {
                self.emit_call_if_test_callback(node, ctx, &child_path);
                self.walk(node, &ctx.with_path(child_path));
            }
            _ => {
                self.walk(node, &ctx.with_path(child_path));
            }
        }
    }

    fn descend_into_body(
        &mut self,
        node: Node,
        ctx: &WalkCtx,
        path: &[String],
        owner: Option<ScopeEntry>,
    ) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.mapper.slice_string(&self.make_span(n)).to_string())
            .unwrap_or_else(|| "(anonymous)".to_string());
        let span = self.make_span(node);
        let mut next_enclosing = ctx.enclosing.clone();
        next_enclosing.push(EnclosingContext {
            kind: "function-declaration".to_string(),
            name: name.clone(),
            span,
        });
        let mut next_scope = ctx.scope_chain.clone();
        if let Some(owner) = owner {
            next_scope.push(owner);
        } else {
            next_scope.push(ScopeEntry {
                name,
                role: None,
            });
        }
        let next_ctx = WalkCtx {
            scope_chain: next_scope,
            export_kind: ExportKind::None,
            enclosing: next_enclosing,
            path: path.to_vec(),
        };
        self.walk(node, &next_ctx);
    }

    fn emit_function_declaration(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let name_node = node.child_by_field_name("name");
        let original_name = name_node
            .map(|n| self.mapper.slice_string(&self.make_span(n)).to_string())
            .unwrap_or_else(|| "(anonymous)".to_string());
        let identifier_span = name_node.map(|n| self.make_span(n));
        let span = self.make_span(node);
        let canonical_name = canonical_for(&original_name, ctx, ExportKind::None);
        let digest = self.digest_span(&span);

        let mut path_signature = path.join(".");
        path_signature.push_str(".FunctionDeclaration");

        let record = FunctionRecord {
            span,
            identifier_span,
            original_name: original_name.clone(),
            canonical_name: canonical_name.clone(),
            kind: FunctionKind::FunctionDeclaration,
            export_kind: ExportKind::None,
            replaceable: true,
            scope_chain: ctx.scope_chain.clone(),
            path_signature,
            digest,
            enclosing: ctx.enclosing.clone(),
            line: node.start_position().row + 1,
            column: node.start_position().column,
            byte_length: span.len_bytes(),
            ts: TypeScriptPayload::default(),
            selector_tokens: selector_tokens(&canonical_name, &original_name, &[]),
        };
        self.functions.push(record);
    }

    fn emit_class(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let name_node = node.child_by_field_name("name");
        let original_name = name_node
            .map(|n| self.mapper.slice_string(&self.make_span(n)).to_string())
            .unwrap_or_else(|| "(anonymous)".to_string());
        let span = self.make_span(node);
        let canonical_name = canonical_for(&original_name, ctx, ExportKind::None);
        let digest = self.digest_span(&span);

        let mut path_signature = path.join(".");
        path_signature.push_str(".ClassDeclaration");

        let mut meta = ClassMetadata {
            name: original_name.clone(),
            ..Default::default()
        };
        if let Some(heritage) = node.child_by_field_name("superclass") {
            meta.superclass = Some(
                self.mapper
                    .slice_string(&self.make_span(heritage))
                    .to_string(),
            );
        }
        self.classes.insert(canonical_name.clone(), meta);

        let record = FunctionRecord {
            span,
            identifier_span: name_node.map(|n| self.make_span(n)),
            original_name: original_name.clone(),
            canonical_name: canonical_name.clone(),
            kind: FunctionKind::Class,
            export_kind: ExportKind::None,
            // Classes are locatable but not replaceable: their interior is
            // structured and editing the class as a unit is out of scope.
            replaceable: false,
            scope_chain: ctx.scope_chain.clone(),
            path_signature,
            digest,
            enclosing: ctx.enclosing.clone(),
            line: node.start_position().row + 1,
            column: node.start_position().column,
            byte_length: span.len_bytes(),
            ts: TypeScriptPayload::default(),
            selector_tokens: selector_tokens(&canonical_name, &original_name, &[]),
        };
        self.functions.push(record);

        let mut next_enclosing = ctx.enclosing.clone();
        next_enclosing.push(EnclosingContext {
            kind: "class".to_string(),
            name: original_name.clone(),
            span,
        });
        let next_ctx = WalkCtx {
            scope_chain: ctx.scope_chain.clone(),
            export_kind: ExportKind::None,
            enclosing: next_enclosing,
            path: path.to_vec(),
        };

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for (idx, member) in body.named_children(&mut cursor).enumerate() {
                if member.kind() == "method_definition" {
                    let mut member_path = next_ctx.path.clone();
                    member_path.push(format!("body[{idx}]"));
                    self.emit_method(member, &next_ctx, &original_name, &member_path);
                }
            }
        }
    }

    fn emit_method(&mut self, node: Node, ctx: &WalkCtx, class_name: &str, path: &[String]) {
        let name_node = node.child_by_field_name("name");
        let original_name = name_node
            .map(|n| self.mapper.slice_string(&self.make_span(n)).to_string())
            .unwrap_or_else(|| "(anonymous)".to_string());

        let is_static = has_kind_child(node, "static");
        let is_get = has_kind_child(node, "get");
        let is_set = has_kind_child(node, "set");
        let is_private = original_name.starts_with('#');

        let role = if is_static {
            format!("static {original_name}")
        } else if is_get {
            format!("get {original_name}")
        } else if is_set {
            format!("set {original_name}")
        } else if is_private {
            original_name.clone()
        } else {
            format!("#{original_name}")
        };

        let mut scope_chain = ctx.scope_chain.clone();
        scope_chain.push(ScopeEntry {
            name: class_name.to_string(),
            role: Some(role.clone()),
        });

        let canonical_name = if is_static {
            format!("{class_name}.static {original_name}")
        } else if is_get {
            format!("{class_name}::get {original_name}")
        } else if is_set {
            format!("{class_name}::set {original_name}")
        } else {
            format!("{class_name}#{}", original_name.trim_start_matches('#'))
        };

        let span = self.make_span(node);
        let digest = self.digest_span(&span);
        let mut path_signature = path.join(".");
        path_signature.push_str(".MethodDefinition");

        let mut modifiers = Vec::new();
        if is_static {
            modifiers.push("static".to_string());
        }
        if is_get {
            modifiers.push("get".to_string());
        }
        if is_set {
            modifiers.push("set".to_string());
        }

        let record = FunctionRecord {
            span,
            identifier_span: name_node.map(|n| self.make_span(n)),
            original_name: original_name.clone(),
            canonical_name: canonical_name.clone(),
            kind: FunctionKind::ClassMethod,
            export_kind: ExportKind::None,
            replaceable: true,
            scope_chain,
            path_signature,
            digest,
            enclosing: ctx.enclosing.clone(),
            line: node.start_position().row + 1,
            column: node.start_position().column,
            byte_length: span.len_bytes(),
            ts: TypeScriptPayload {
                member_modifiers: modifiers,
                ..Default::default()
            },
            selector_tokens: selector_tokens(
                &canonical_name,
                &original_name,
                &[
                    format!("{class_name}.{original_name}"),
                    format!("{class_name}#{original_name}"),
                    format!("{class_name}::{original_name}"),
                ],
            ),
        };
        self.functions.push(record);
    }

    fn emit_variable_declaration(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let var_kind = match node.child(0).map(|c| c.kind()) {
            Some("var") => VariableKind::Var,
            Some("let") => VariableKind::Let,
            _ => VariableKind::Const,
        };
        let declaration_span = self.make_span(node);
        let declaration_digest = self.digest_span(&declaration_span);
        let mut declaration_path = path.join(".");
        declaration_path.push_str(".VariableDeclaration");

        let mut cursor = node.walk();
        for (idx, declarator) in node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .enumerate()
        {
            let mut decl_path = path.to_vec();
            decl_path.push(format!("declarations[{idx}]"));
            self.emit_declarator(
                declarator,
                ctx,
                var_kind,
                &decl_path,
                declaration_span,
                &declaration_digest,
                &declaration_path,
            );
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_declarator(
        &mut self,
        node: Node,
        ctx: &WalkCtx,
        var_kind: VariableKind,
        path: &[String],
        declaration_span: Span,
        declaration_digest: &str,
        declaration_path: &str,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        if name_node.kind() != "identifier" {
            // Destructuring pattern: emit one record per extracted
            // identifier, sharing the declarator/declaration spans.
            let mut id_cursor = name_node.walk();
            for id in collect_identifiers(name_node, &mut id_cursor) {
                self.emit_single_variable(
                    node,
                    id,
                    ctx,
                    var_kind,
                    path,
                    declaration_span,
                    declaration_digest,
                    declaration_path,
                );
            }
            return;
        }
        self.emit_single_variable(
            node,
            name_node,
            ctx,
            var_kind,
            path,
            declaration_span,
            declaration_digest,
            declaration_path,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_single_variable(
        &mut self,
        declarator: Node,
        name_node: Node,
        ctx: &WalkCtx,
        var_kind: VariableKind,
        path: &[String],
        declaration_span: Span,
        declaration_digest: &str,
        declaration_path: &str,
    ) {
        let name = self
            .mapper
            .slice_string(&self.make_span(name_node))
            .to_string();
        let binding_span = self.make_span(name_node);
        let declarator_span = self.make_span(declarator);
        let binding_digest = self.digest_span(&binding_span);
        let declarator_digest = self.digest_span(&declarator_span);

        let mut binding_path = path.join(".");
        binding_path.push_str(".name.Identifier");
        let mut declarator_path = path.join(".");
        declarator_path.push_str(".VariableDeclarator");

        let initializer_type = declarator
            .child_by_field_name("value")
            .map(|v| v.kind().to_string())
            .unwrap_or_else(|| "none".to_string());

        let init_node = declarator.child_by_field_name("value");

        // A variable initialized with a function/arrow expression also
        // contributes a function record, scoped under this binding's name.
        if let Some(init) = init_node {
            if init.kind() == "function_expression" || init.kind() == "arrow_function" {
                self.emit_function_expression(init, ctx, &name, path, ExportKind::None);
            }
        }

        let record = VariableRecord {
            binding_span,
            declarator_span,
            declaration_span,
            binding_digest,
            declarator_digest,
            declaration_digest: declaration_digest.to_string(),
            binding_path,
            declarator_path,
            declaration_path: declaration_path.to_string(),
            name: name.clone(),
            kind: var_kind,
            export_kind: ctx.export_kind,
            scope_chain: ctx.scope_chain.clone(),
            initializer_type,
            enclosing: ctx.enclosing.clone(),
            selector_tokens: selector_tokens(&name, &name, &[]),
        };
        self.variables.push(record);
    }

    fn emit_function_expression(
        &mut self,
        node: Node,
        ctx: &WalkCtx,
        binding_name: &str,
        path: &[String],
        export_kind: ExportKind,
    ) {
        let kind = if node.kind() == "arrow_function" {
            FunctionKind::ArrowFunction
        } else {
            FunctionKind::FunctionExpression
        };
        let span = self.make_span(node);
        let canonical_name = canonical_for(binding_name, ctx, export_kind);
        let digest = self.digest_span(&span);

        let mut path_signature = path.join(".");
        path_signature.push_str(if kind == FunctionKind::ArrowFunction {
            ".init.ArrowFunctionExpression"
        } else {
            ".init.FunctionExpression"
        });

        let record = FunctionRecord {
            span,
            identifier_span: None,
            original_name: binding_name.to_string(),
            canonical_name: canonical_name.clone(),
            kind,
            export_kind,
            replaceable: true,
            scope_chain: ctx.scope_chain.clone(),
            path_signature,
            digest,
            enclosing: ctx.enclosing.clone(),
            line: node.start_position().row + 1,
            column: node.start_position().column,
            byte_length: span.len_bytes(),
            ts: TypeScriptPayload::default(),
            selector_tokens: selector_tokens(&canonical_name, binding_name, &[]),
        };
        self.functions.push(record);
    }

    fn emit_export_statement(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let is_default = has_kind_child(node, "default");
        let export_kind = if is_default {
            ExportKind::Default
        } else {
            ExportKind::Named
        };

        if let Some(decl) = node.child_by_field_name("declaration") {
            match decl.kind() {
                "function_declaration" => {
                    let next_ctx = WalkCtx {
                        export_kind,
                        ..ctx.clone()
                    };
                    self.emit_function_declaration(decl, &next_ctx, path);
                    self.descend_into_body(decl, &next_ctx, path, None);
                    if let Some(last) = self.functions.last_mut() {
                        last.export_kind = export_kind;
                        last.canonical_name = canonical_for(&last.original_name, ctx, export_kind);
                    }
                }
                "class_declaration" | "class" => {
                    self.emit_class(decl, ctx, path);
                }
                "lexical_declaration" | "variable_declaration" => {
                    let next_ctx = WalkCtx {
                        export_kind,
                        ..ctx.clone()
                    };
                    self.emit_variable_declaration(decl, &next_ctx, path);
                }
                _ if is_default => {
                    // `export default <expression>`
                    if decl.kind() == "function_expression" || decl.kind() == "arrow_function" {
                        self.emit_function_expression(decl, ctx, "default", path, ExportKind::Default);
                    }
                }
                _ => {
                    self.walk(node, &ctx.with_path(path.to_vec()));
                }
            }
        } else {
            self.walk(node, &ctx.with_path(path.to_vec()));
        }
    }

    fn emit_assignment(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let Some(right) = node.child_by_field_name("right") else {
            return;
        };

        let left_text = self.mapper.slice_string(&self.make_span(left)).to_string();

        let (target_name, export_kind, scope_role) = if left_text == "module.exports" {
            ("module.exports".to_string(), ExportKind::CommonjsDefault, "module.exports".to_string())
        } else if let Some(member) = left_text.strip_prefix("exports.") {
            (
                format!("exports.{member}"),
                ExportKind::CommonjsNamed,
                "exports".to_string(),
            )
        } else if let Some(member) = left_text.strip_prefix("module.exports.") {
            (
                format!("module.exports.{member}"),
                ExportKind::CommonjsNamed,
                "module.exports".to_string(),
            )
        } else {
            // Ordinary assignment; record as an assignment-kind variable
            // if the left-hand side is a plain identifier.
            if left.kind() == "identifier" {
                let declaration_span = self.make_span(node);
                let declaration_digest = self.digest_span(&declaration_span);
                let mut declaration_path = path.join(".");
                declaration_path.push_str(".AssignmentExpression");
                self.emit_single_variable(
                    node,
                    left,
                    ctx,
                    VariableKind::Assignment,
                    path,
                    declaration_span,
                    &declaration_digest,
                    &declaration_path,
                );
            }
            return;
        };

        if right.kind() == "function_expression" || right.kind() == "arrow_function" {
            let mut scoped_ctx = ctx.clone();
            scoped_ctx.scope_chain.push(ScopeEntry {
                name: target_name.clone(),
                role: Some(scope_role),
            });
            self.emit_function_expression(right, &scoped_ctx, &target_name, path, export_kind);
        }
    }

    fn emit_call_if_test_callback(&mut self, node: Node, ctx: &WalkCtx, path: &[String]) {
        let Some(callee) = node.child_by_field_name("function") else {
            return;
        };
        let callee_name = self.mapper.slice_string(&self.make_span(callee)).to_string();
        if !TEST_CALLBACK_NAMES.contains(&callee_name.as_str()) {
            return;
        }
        let Some(args) = node.child_by_field_name("arguments") else {
            return;
        };
        let mut label = String::new();
        let mut cursor = args.walk();
        let mut callback = None;
        for arg in args.named_children(&mut cursor) {
            match arg.kind() {
                "string" => {
                    label = self
                        .mapper
                        .slice_string(&self.make_span(arg))
                        .trim_matches(|c| c == '\'' || c == '"' || c == '`')
                        .to_string();
                }
                "function_expression" | "arrow_function" => callback = Some(arg),
                _ => {}
            }
        }
        let Some(callback) = callback else { return };

        let mut scoped_ctx = ctx.clone();
        let role_label = format!("call:{callee_name}:{label}");
        scoped_ctx.scope_chain.push(ScopeEntry {
            name: format!("{callee_name} callback \"{label}\""),
            role: Some(role_label),
        });
        scoped_ctx.enclosing.push(EnclosingContext {
            kind: "call".to_string(),
            name: callee_name.clone(),
            span: self.make_span(node),
        });

        let binding_name = format!("{callee_name} callback \"{label}\"");
        self.emit_function_expression(callback, &scoped_ctx, &binding_name, path, ExportKind::None);
        if let Some(last) = self.functions.last_mut() {
            // Indexed for locate/list, but only recognized capture sites
            // (not an arbitrary call argument) are editable.
            last.replaceable = true;
        }
    }
}

#[derive(Debug, Clone, Default)]
struct WalkCtx {
    scope_chain: Vec<ScopeEntry>,
    export_kind: ExportKind,
    enclosing: Vec<EnclosingContext>,
    path: Vec<String>,
}

impl Default for ExportKind {
    fn default() -> Self {
        ExportKind::None
    }
}

impl WalkCtx {
    fn with_path(&self, path: Vec<String>) -> Self {
        WalkCtx {
            scope_chain: self.scope_chain.clone(),
            export_kind: self.export_kind,
            enclosing: self.enclosing.clone(),
            path,
        }
    }
}

fn has_kind_child(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == kind)
}

fn collect_identifiers<'a>(node: Node<'a>, cursor: &mut tree_sitter::TreeCursor<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    collect_identifiers_inner(node, cursor, &mut out);
    out
}

fn collect_identifiers_inner<'a>(
    node: Node<'a>,
    cursor: &mut tree_sitter::TreeCursor<'a>,
    out: &mut Vec<Node<'a>>,
) {
    if node.kind() == "identifier" || node.kind() == "shorthand_property_identifier_pattern" {
        out.push(node);
        return;
    }
    for child in node.named_children(cursor) {
        let mut child_cursor = child.walk();
        collect_identifiers_inner(child, &mut child_cursor, out);
    }
}

/// Composes a canonical display name from scope chain and export kind.
fn canonical_for(name: &str, ctx: &WalkCtx, export_kind: ExportKind) -> String {
    if let Some(entry) = ctx.scope_chain.last() {
        if let Some(role) = &entry.role {
            if role == "exports" {
                return format!("exports.{name}");
            }
            if role == "module.exports" {
                return "module.exports".to_string();
            }
            if role.starts_with("call:") {
                return entry.name.clone();
            }
            return role.clone();
        }
    }
    match export_kind {
        ExportKind::Default | ExportKind::CommonjsDefault => "exports.default".to_string(),
        ExportKind::Named => format!("exports.{name}"),
        ExportKind::CommonjsNamed => format!("exports.{name}"),
        ExportKind::None => name.to_string(),
    }
}

fn selector_tokens(canonical: &str, original: &str, extra: &[String]) -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert(canonical.to_string());
    set.insert(canonical.to_lowercase());
    set.insert(original.to_string());
    set.insert(original.to_lowercase());
    for e in extra {
        set.insert(e.clone());
        set.insert(e.to_lowercase());
    }
    // owner-prefix variants: A.B <-> A#B <-> A::B
    if let Some((owner, member)) = canonical.split_once('#') {
        set.insert(format!("{owner}.{member}"));
        set.insert(format!("{owner}::{member}"));
    }
    if let Some((owner, member)) = canonical.split_once("::") {
        set.insert(format!("{owner}.{member}"));
        set.insert(format!("{owner}#{member}"));
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::HashConfig;

    fn collect(source: &str) -> SymbolPool {
        SymbolPool::collect(source, HashConfig::default()).unwrap()
    }

    #[test]
    fn collects_function_declaration() {
        let pool = collect("function alpha() { return 1; }");
        assert_eq!(pool.functions.len(), 1);
        assert_eq!(pool.functions[0].canonical_name, "alpha");
        assert!(pool.functions[0].replaceable);
    }

    #[test]
    fn collects_exports_assignment() {
        let pool = collect("exports.alpha = function alpha() { return 1; };");
        let f = pool
            .functions
            .iter()
            .find(|f| f.canonical_name == "exports.alpha")
            .expect("function not found");
        assert!(f.replaceable);
    }

    #[test]
    fn collects_module_exports_default() {
        let pool = collect("module.exports = function() { return 1; };");
        assert!(pool.functions.iter().any(|f| f.canonical_name == "module.exports"));
    }

    #[test]
    fn collects_arrow_variable() {
        let pool = collect("const handler = () => { return 2; };");
        assert!(pool.functions.iter().any(|f| f.original_name == "handler"));
        assert!(pool.variables.iter().any(|v| v.name == "handler"));
    }

    #[test]
    fn collects_class_methods_with_roles() {
        let source = "class Widget { static create() {} get value() {} #hidden() {} }";
        let pool = collect(source);
        let names: Vec<_> = pool.functions.iter().map(|f| f.canonical_name.clone()).collect();
        assert!(names.contains(&"Widget.static create".to_string()));
        assert!(names.contains(&"Widget::get value".to_string()));
        assert!(names.iter().any(|n| n.starts_with("Widget#")));
    }

    #[test]
    fn class_itself_is_not_replaceable() {
        let pool = collect("class Widget {}");
        let class = pool.functions.iter().find(|f| f.kind == FunctionKind::Class).unwrap();
        assert!(!class.replaceable);
    }

    #[test]
    fn collects_test_callback() {
        let pool = collect("describe('suite', function() { it('works', () => {}); });");
        assert!(pool.functions.iter().any(|f| f.original_name.contains("describe callback")));
    }

    #[test]
    fn digest_is_stable_across_collections() {
        let source = "function alpha() { return 1; }";
        let a = collect(source);
        let b = collect(source);
        assert_eq!(a.functions[0].digest, b.functions[0].digest);
    }

    #[test]
    fn empty_source_yields_empty_pools() {
        let pool = collect("");
        assert!(pool.functions.is_empty());
        assert!(pool.variables.is_empty());
    }

    #[test]
    fn destructured_declarator_yields_one_record_per_identifier() {
        let pool = collect("const { a, b } = obj;");
        assert!(pool.variables.iter().any(|v| v.name == "a"));
        assert!(pool.variables.iter().any(|v| v.name == "b"));
        assert_eq!(
            pool.variables.iter().find(|v| v.name == "a").unwrap().declarator_span,
            pool.variables.iter().find(|v| v.name == "b").unwrap().declarator_span
        );
    }
}
