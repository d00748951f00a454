//! Arena-based syntax trees for method bodies.
//!
//! Trees are described with the [`Syntax`] builder and frozen into a
//! [`SyntaxTree`]: all nodes live in one indextree arena, tokens are small
//! inline strings. Node handles ([`SyntaxRef`]) carry a reference to their
//! tree, so nodes from the old and new versions of a body never compare equal.

use core::fmt;
use core::hash::{Hash, Hasher};

use compact_str::CompactString;
use facet::Facet;
use indextree::{Arena, NodeId};
use smallvec::SmallVec;

/// Token storage for a single node.
pub type Tokens = SmallVec<[CompactString; 4]>;

/// Kinds of syntax nodes.
///
/// Expressions are not modelled beyond their token stream; the only structure
/// kept inside an [`SyntaxKind::Expression`] are the lambdas it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// Root of a method, property accessor or constructor body
    MethodBody,
    Block,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    /// Expression list in a `for` header, before the condition
    ForInitializer,
    /// Expression list in a `for` header, after the condition
    ForIncrementor,
    ForEachStatement,
    SwitchStatement,
    SwitchSection,
    TryStatement,
    CatchClause,
    /// `(Exception e)` part of a catch clause
    CatchDeclaration,
    /// `when (...)` part of a catch clause
    CatchFilter,
    FinallyClause,
    UsingStatement,
    LockStatement,
    LocalDeclaration,
    VariableDeclarator,
    ExpressionStatement,
    ReturnStatement,
    ThrowStatement,
    YieldStatement,
    BreakStatement,
    ContinueStatement,
    LabeledStatement,
    EmptyStatement,
    Expression,
    Lambda,
    LocalFunction,
}

impl SyntaxKind {
    /// Short lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            SyntaxKind::MethodBody => "method_body",
            SyntaxKind::Block => "block",
            SyntaxKind::IfStatement => "if",
            SyntaxKind::ElseClause => "else",
            SyntaxKind::WhileStatement => "while",
            SyntaxKind::DoStatement => "do",
            SyntaxKind::ForStatement => "for",
            SyntaxKind::ForInitializer => "for_initializer",
            SyntaxKind::ForIncrementor => "for_incrementor",
            SyntaxKind::ForEachStatement => "foreach",
            SyntaxKind::SwitchStatement => "switch",
            SyntaxKind::SwitchSection => "switch_section",
            SyntaxKind::TryStatement => "try",
            SyntaxKind::CatchClause => "catch",
            SyntaxKind::CatchDeclaration => "catch_declaration",
            SyntaxKind::CatchFilter => "catch_filter",
            SyntaxKind::FinallyClause => "finally",
            SyntaxKind::UsingStatement => "using",
            SyntaxKind::LockStatement => "lock",
            SyntaxKind::LocalDeclaration => "local_declaration",
            SyntaxKind::VariableDeclarator => "variable_declarator",
            SyntaxKind::ExpressionStatement => "expression_statement",
            SyntaxKind::ReturnStatement => "return",
            SyntaxKind::ThrowStatement => "throw",
            SyntaxKind::YieldStatement => "yield",
            SyntaxKind::BreakStatement => "break",
            SyntaxKind::ContinueStatement => "continue",
            SyntaxKind::LabeledStatement => "labeled_statement",
            SyntaxKind::EmptyStatement => "empty_statement",
            SyntaxKind::Expression => "expression",
            SyntaxKind::Lambda => "lambda",
            SyntaxKind::LocalFunction => "local_function",
        }
    }

    /// Whether the kind can stand in a statement list.
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            SyntaxKind::Block
                | SyntaxKind::IfStatement
                | SyntaxKind::WhileStatement
                | SyntaxKind::DoStatement
                | SyntaxKind::ForStatement
                | SyntaxKind::ForEachStatement
                | SyntaxKind::SwitchStatement
                | SyntaxKind::TryStatement
                | SyntaxKind::UsingStatement
                | SyntaxKind::LockStatement
                | SyntaxKind::LocalDeclaration
                | SyntaxKind::ExpressionStatement
                | SyntaxKind::ReturnStatement
                | SyntaxKind::ThrowStatement
                | SyntaxKind::YieldStatement
                | SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::LabeledStatement
                | SyntaxKind::EmptyStatement
                | SyntaxKind::LocalFunction
        )
    }

    /// Kinds that own a separately matched body.
    pub const fn is_body_root(self) -> bool {
        matches!(
            self,
            SyntaxKind::MethodBody | SyntaxKind::Lambda | SyntaxKind::LocalFunction
        )
    }

    /// Kinds that never have children.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SyntaxKind::BreakStatement
                | SyntaxKind::ContinueStatement
                | SyntaxKind::EmptyStatement
                | SyntaxKind::CatchDeclaration
        )
    }

    /// The only parent kind this kind may appear under, if restricted.
    const fn required_parent(self) -> Option<SyntaxKind> {
        match self {
            SyntaxKind::ElseClause => Some(SyntaxKind::IfStatement),
            SyntaxKind::ForInitializer | SyntaxKind::ForIncrementor => {
                Some(SyntaxKind::ForStatement)
            }
            SyntaxKind::SwitchSection => Some(SyntaxKind::SwitchStatement),
            SyntaxKind::CatchClause | SyntaxKind::FinallyClause => Some(SyntaxKind::TryStatement),
            SyntaxKind::CatchDeclaration | SyntaxKind::CatchFilter => {
                Some(SyntaxKind::CatchClause)
            }
            SyntaxKind::VariableDeclarator => Some(SyntaxKind::LocalDeclaration),
            _ => None,
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from [`SyntaxTree::build`].
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum BuildError {
    /// {kind} cannot be the root of a tree, expected a method body, lambda or local function
    InvalidRoot { kind: String },

    /// method bodies can only appear at the root, found one under {parent}
    NestedMethodBody { parent: String },

    /// {kind} must be a child of {expected}, found under {parent}
    MisplacedNode {
        kind: String,
        expected: String,
        parent: String,
    },

    /// {kind} cannot have children
    UnexpectedChildren { kind: String },
}

/// Split source text into tokens.
///
/// Identifiers and numbers form one token each, string literals are kept
/// whole, a handful of two-character operators are recognised and every other
/// non-whitespace character is its own token.
pub fn tokenize(text: &str) -> Tokens {
    const PAIRS: [&str; 15] = [
        "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "=>", "??", "::",
    ];

    let mut tokens = Tokens::new();
    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if c == '"' {
            let mut end = text.len();
            let mut escaped = false;
            for (i, ch) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    end = i + 1;
                    break;
                }
            }
            tokens.push(CompactString::from(&text[start..end]));
            continue;
        }
        if c.is_alphanumeric() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(i, ch)) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                end = i + ch.len_utf8();
                chars.next();
            }
            tokens.push(CompactString::from(&text[start..end]));
            continue;
        }
        let end = start + c.len_utf8();
        if let Some(&(_, next)) = chars.peek() {
            let pair_end = end + next.len_utf8();
            if PAIRS.contains(&&text[start..pair_end]) {
                chars.next();
                tokens.push(CompactString::from(&text[start..pair_end]));
                continue;
            }
        }
        tokens.push(CompactString::from(&text[start..end]));
    }
    tokens
}

/// Owned description of a syntax subtree, frozen with [`SyntaxTree::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub kind: SyntaxKind,
    /// Declared name: variable, label, loop variable, local function
    pub name: Option<CompactString>,
    pub tokens: Tokens,
    pub children: Vec<Syntax>,
}

impl Syntax {
    pub fn new(kind: SyntaxKind) -> Self {
        Self {
            kind,
            name: None,
            tokens: Tokens::new(),
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(CompactString::from(name));
        self
    }

    /// Append the tokens of `text`.
    pub fn with_tokens(mut self, text: &str) -> Self {
        self.tokens.extend(tokenize(text));
        self
    }

    pub fn child(mut self, child: Syntax) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Syntax>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn method_body(statements: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::MethodBody).with_children(statements)
    }

    pub fn block(statements: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::Block).with_children(statements)
    }

    /// Bare expression, with no structure besides its tokens.
    pub fn expression(text: &str) -> Self {
        Self::new(SyntaxKind::Expression).with_tokens(text)
    }

    /// Expression containing lambdas, in source order.
    pub fn expression_with(text: &str, lambdas: impl IntoIterator<Item = Syntax>) -> Self {
        Self::expression(text).with_children(lambdas)
    }

    /// `text;`
    pub fn statement(text: &str) -> Self {
        Self::new(SyntaxKind::ExpressionStatement).child(Self::expression(text))
    }

    pub fn if_then(condition: &str, then: Syntax) -> Self {
        Self::new(SyntaxKind::IfStatement)
            .child(Self::expression(condition))
            .child(then)
    }

    pub fn if_else(condition: &str, then: Syntax, otherwise: Syntax) -> Self {
        Self::if_then(condition, then).child(Self::new(SyntaxKind::ElseClause).child(otherwise))
    }

    pub fn while_loop(condition: &str, body: Syntax) -> Self {
        Self::new(SyntaxKind::WhileStatement)
            .child(Self::expression(condition))
            .child(body)
    }

    pub fn do_while(body: Syntax, condition: &str) -> Self {
        Self::new(SyntaxKind::DoStatement)
            .child(body)
            .child(Self::expression(condition))
    }

    /// `for (initializer; condition; incrementor) body`
    ///
    /// The initializer is either a [`Syntax::local`] declaration or a
    /// [`Syntax::for_initializer`] expression list.
    pub fn for_loop(
        initializer: Option<Syntax>,
        condition: Option<&str>,
        incrementor: Option<&str>,
        body: Syntax,
    ) -> Self {
        let mut node = Self::new(SyntaxKind::ForStatement);
        node.children.extend(initializer);
        node.children.extend(condition.map(Self::expression));
        node.children.extend(incrementor.map(|text| {
            Self::new(SyntaxKind::ForIncrementor).child(Self::expression(text))
        }));
        node.child(body)
    }

    pub fn for_initializer(text: &str) -> Self {
        Self::new(SyntaxKind::ForInitializer).child(Self::expression(text))
    }

    pub fn foreach(variable: &str, collection: &str, body: Syntax) -> Self {
        Self::new(SyntaxKind::ForEachStatement)
            .named(variable)
            .child(Self::expression(collection))
            .child(body)
    }

    pub fn switch(expression: &str, sections: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::SwitchStatement)
            .child(Self::expression(expression))
            .with_children(sections)
    }

    /// `case 1: case 2: statements`, with the case labels given as text.
    pub fn section(labels: &str, statements: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::SwitchSection)
            .with_tokens(labels)
            .with_children(statements)
    }

    pub fn try_catch(block: Syntax, catches: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::TryStatement)
            .child(block)
            .with_children(catches)
    }

    pub fn try_finally(
        block: Syntax,
        catches: impl IntoIterator<Item = Syntax>,
        finally: Syntax,
    ) -> Self {
        Self::try_catch(block, catches).child(Self::new(SyntaxKind::FinallyClause).child(finally))
    }

    /// `catch (ty variable) when (filter) block`
    pub fn catch(
        ty: Option<&str>,
        variable: Option<&str>,
        filter: Option<&str>,
        block: Syntax,
    ) -> Self {
        let mut node = Self::new(SyntaxKind::CatchClause);
        if let Some(ty) = ty {
            let mut declaration = Self::new(SyntaxKind::CatchDeclaration).with_tokens(ty);
            if let Some(variable) = variable {
                declaration = declaration.named(variable);
            }
            node = node.child(declaration);
        }
        if let Some(filter) = filter {
            node = node.child(Self::new(SyntaxKind::CatchFilter).child(Self::expression(filter)));
        }
        node.child(block)
    }

    /// `using (resource) body`, the resource being an expression or a declaration.
    pub fn using(resource: Syntax, body: Syntax) -> Self {
        Self::new(SyntaxKind::UsingStatement)
            .child(resource)
            .child(body)
    }

    pub fn lock(expression: &str, body: Syntax) -> Self {
        Self::new(SyntaxKind::LockStatement)
            .child(Self::expression(expression))
            .child(body)
    }

    pub fn local(ty: &str, declarators: impl IntoIterator<Item = Syntax>) -> Self {
        Self::new(SyntaxKind::LocalDeclaration)
            .with_tokens(ty)
            .with_children(declarators)
    }

    /// `ty name = initializer;` with a single declarator.
    pub fn declare(ty: &str, name: &str, initializer: Option<&str>) -> Self {
        Self::local(
            ty,
            [Self::declarator(name, initializer.map(Self::expression))],
        )
    }

    pub fn declarator(name: &str, initializer: Option<Syntax>) -> Self {
        let mut node = Self::new(SyntaxKind::VariableDeclarator).named(name);
        node.children.extend(initializer);
        node
    }

    pub fn return_value(expression: Option<&str>) -> Self {
        let mut node = Self::new(SyntaxKind::ReturnStatement);
        node.children.extend(expression.map(Self::expression));
        node
    }

    pub fn throw(expression: Option<&str>) -> Self {
        let mut node = Self::new(SyntaxKind::ThrowStatement);
        node.children.extend(expression.map(Self::expression));
        node
    }

    pub fn yield_return(expression: &str) -> Self {
        Self::new(SyntaxKind::YieldStatement)
            .with_tokens("return")
            .child(Self::expression(expression))
    }

    pub fn yield_break() -> Self {
        Self::new(SyntaxKind::YieldStatement).with_tokens("break")
    }

    pub fn break_statement() -> Self {
        Self::new(SyntaxKind::BreakStatement)
    }

    pub fn continue_statement() -> Self {
        Self::new(SyntaxKind::ContinueStatement)
    }

    pub fn labeled(label: &str, statement: Syntax) -> Self {
        Self::new(SyntaxKind::LabeledStatement)
            .named(label)
            .child(statement)
    }

    pub fn empty() -> Self {
        Self::new(SyntaxKind::EmptyStatement)
    }

    /// `(parameters) => body`, where body is a block or an expression.
    pub fn lambda(parameters: &str, body: Syntax) -> Self {
        Self::new(SyntaxKind::Lambda)
            .with_tokens(parameters)
            .child(body)
    }

    pub fn local_function(name: &str, parameters: &str, body: Syntax) -> Self {
        Self::new(SyntaxKind::LocalFunction)
            .named(name)
            .with_tokens(parameters)
            .child(body)
    }
}

/// What goes in each arena slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub name: Option<CompactString>,
    pub tokens: Tokens,
}

/// Immutable syntax tree of one body version.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    arena: Arena<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// Freeze a [`Syntax`] description into a tree, checking its structure.
    pub fn build(syntax: Syntax) -> Result<Self, BuildError> {
        if !syntax.kind.is_body_root() {
            return Err(BuildError::InvalidRoot {
                kind: syntax.kind.to_string(),
            });
        }

        let mut arena = Arena::new();
        let Syntax {
            kind,
            name,
            tokens,
            children,
        } = syntax;
        let root = arena.new_node(NodeData { kind, name, tokens });

        let mut stack = vec![(root, kind, children)];
        while let Some((parent, parent_kind, children)) = stack.pop() {
            if parent_kind.is_terminal() && !children.is_empty() {
                return Err(BuildError::UnexpectedChildren {
                    kind: parent_kind.to_string(),
                });
            }
            for child in children {
                check_placement(child.kind, parent_kind)?;
                let Syntax {
                    kind,
                    name,
                    tokens,
                    children,
                } = child;
                let id = arena.new_node(NodeData { kind, name, tokens });
                parent.append(id, &mut arena);
                stack.push((id, kind, children));
            }
        }

        crate::debug!(nodes = arena.count(), "built syntax tree");
        Ok(Self { arena, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_ref(&self) -> SyntaxRef<'_> {
        self.node(self.root)
    }

    /// Handle to a node of this tree.
    pub fn node(&self, id: NodeId) -> SyntaxRef<'_> {
        SyntaxRef { tree: self, id }
    }

    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    pub fn kind(&self, id: NodeId) -> SyntaxKind {
        self.get(id).kind
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Pre-order walk of the subtree at `id`, including `id` itself.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.descendants(&self.arena)
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// All tokens of the subtree at `id`, names included, separated by spaces.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            let data = self.get(node);
            for token in data.name.iter().chain(data.tokens.iter()) {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(token);
            }
        }
        out
    }

    /// First node in pre-order of the given kind whose subtree text has the
    /// same tokens as `text`.
    pub fn find(&self, kind: SyntaxKind, text: &str) -> Option<SyntaxRef<'_>> {
        let wanted = tokenize(text).join(" ");
        self.descendants(self.root)
            .find(|&id| self.kind(id) == kind && self.text(id) == wanted)
            .map(|id| self.node(id))
    }

    /// First node in pre-order of the given kind declaring `name`.
    pub fn find_named(&self, kind: SyntaxKind, name: &str) -> Option<SyntaxRef<'_>> {
        self.descendants(self.root)
            .find(|&id| {
                let data = self.get(id);
                data.kind == kind && data.name.as_deref() == Some(name)
            })
            .map(|id| self.node(id))
    }

    /// All nodes of the given kind, in pre-order.
    pub fn find_all(&self, kind: SyntaxKind) -> Vec<SyntaxRef<'_>> {
        self.descendants(self.root)
            .filter(|&id| self.kind(id) == kind)
            .map(|id| self.node(id))
            .collect()
    }
}

fn check_placement(kind: SyntaxKind, parent: SyntaxKind) -> Result<(), BuildError> {
    if kind == SyntaxKind::MethodBody {
        return Err(BuildError::NestedMethodBody {
            parent: parent.to_string(),
        });
    }
    match kind.required_parent() {
        Some(expected) if expected != parent => Err(BuildError::MisplacedNode {
            kind: kind.to_string(),
            expected: expected.to_string(),
            parent: parent.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Handle to a node of a [`SyntaxTree`].
///
/// Equality and hashing include the tree's identity.
#[derive(Clone, Copy)]
pub struct SyntaxRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxRef<'t> {
    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn data(self) -> &'t NodeData {
        self.tree.get(self.id)
    }

    pub fn kind(self) -> SyntaxKind {
        self.data().kind
    }

    pub fn name(self) -> Option<&'t str> {
        self.data().name.as_deref()
    }

    pub fn tokens(self) -> &'t [CompactString] {
        &self.data().tokens
    }

    pub fn parent(self) -> Option<SyntaxRef<'t>> {
        self.tree.parent(self.id).map(|id| self.tree.node(id))
    }

    pub fn children(self) -> impl Iterator<Item = SyntaxRef<'t>> + 't {
        let tree = self.tree;
        tree.children(self.id).map(move |id| tree.node(id))
    }

    /// Whether the node belongs to `tree`.
    pub fn is_in(self, tree: &SyntaxTree) -> bool {
        core::ptr::eq(self.tree, tree)
    }

    pub fn text(self) -> String {
        self.tree.text(self.id)
    }
}

impl PartialEq for SyntaxRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxRef<'_> {}

impl Hash for SyntaxRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::ptr::from_ref(self.tree).hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for SyntaxRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), usize::from(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize(r#"x += Foo(a_1, "b \" c") => y=="#);
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(
            tokens,
            ["x", "+=", "Foo", "(", "a_1", ",", r#""b \" c""#, ")", "=>", "y", "=="]
        );
    }

    #[test]
    fn test_build_keeps_child_order() {
        let tree = SyntaxTree::build(Syntax::method_body([
            Syntax::statement("A()"),
            Syntax::statement("B()"),
            Syntax::statement("C()"),
        ]))
        .unwrap();

        let texts: Vec<String> = tree
            .root_ref()
            .children()
            .map(|child| child.text())
            .collect();
        assert_eq!(texts, ["A ( )", "B ( )", "C ( )"]);
        assert_eq!(tree.node_count(), 7);
    }

    #[test]
    fn test_build_rejects_statement_root() {
        let err = SyntaxTree::build(Syntax::statement("A()")).unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidRoot {
                kind: "expression_statement".to_string()
            }
        );
    }

    #[test]
    fn test_build_rejects_misplaced_else() {
        let body = Syntax::method_body([Syntax::block([
            Syntax::new(SyntaxKind::ElseClause).child(Syntax::statement("A()"))
        ])]);
        let err = SyntaxTree::build(body).unwrap_err();
        assert_eq!(
            err,
            BuildError::MisplacedNode {
                kind: "else".to_string(),
                expected: "if".to_string(),
                parent: "block".to_string(),
            }
        );
    }

    #[test]
    fn test_build_rejects_children_of_break() {
        let body = Syntax::method_body([Syntax::break_statement().child(Syntax::empty())]);
        let err = SyntaxTree::build(body).unwrap_err();
        assert_eq!(
            err,
            BuildError::UnexpectedChildren {
                kind: "break".to_string()
            }
        );
    }

    #[test]
    fn test_build_rejects_nested_method_body() {
        let body = Syntax::method_body([Syntax::method_body([])]);
        let err = SyntaxTree::build(body).unwrap_err();
        assert_eq!(
            err,
            BuildError::NestedMethodBody {
                parent: "method_body".to_string()
            }
        );
    }

    #[test]
    fn test_refs_from_different_trees_differ() {
        let body = Syntax::method_body([Syntax::statement("A()")]);
        let old = SyntaxTree::build(body.clone()).unwrap();
        let new = SyntaxTree::build(body).unwrap();

        assert_ne!(old.root_ref(), new.root_ref());
        assert_eq!(old.root_ref(), old.node(old.root()));
        assert!(old.root_ref().is_in(&old));
        assert!(!old.root_ref().is_in(&new));
    }

    #[test]
    fn test_find() {
        let tree = SyntaxTree::build(Syntax::method_body([
            Syntax::declare("int", "x", Some("1")),
            Syntax::if_then("x > 0", Syntax::block([Syntax::statement("Print(x)")])),
        ]))
        .unwrap();

        let print = tree
            .find(SyntaxKind::ExpressionStatement, "Print(x)")
            .unwrap();
        assert_eq!(print.parent().unwrap().kind(), SyntaxKind::Block);
        assert!(tree.find(SyntaxKind::ExpressionStatement, "Print(y)").is_none());

        let x = tree.find_named(SyntaxKind::VariableDeclarator, "x").unwrap();
        assert_eq!(x.text(), "x 1");
        assert_eq!(tree.find_all(SyntaxKind::Expression).len(), 3);
    }
}
