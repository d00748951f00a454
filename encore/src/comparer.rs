//! Statement-level adapter: labels, equality and distance for [`SyntaxTree`]s.
//!
//! Every statement form gets its own label; expressions are transparent. The
//! distance of compound statements is a weighted mix of their header and
//! their body, the same way a reader would judge "is this still the same
//! loop".

use core::marker::PhantomData;
use std::sync::LazyLock;

use tether::distance::{combine, sequence_distance, sequence_distance_by, set_distance, weighted};
use tether::{Label, LabelInfo, LabelTable, TreeComparer};

use crate::syntax::{SyntaxKind, SyntaxRef, SyntaxTree};

/// Labels handed to the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum StatementLabel {
    Body,
    Block,
    IfStatement,
    ElseClause,
    WhileStatement,
    DoStatement,
    ForStatement,
    ForInitializer,
    ForIncrementor,
    ForEachStatement,
    SwitchStatement,
    SwitchSection,
    TryStatement,
    CatchClause,
    CatchDeclaration,
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
    /// `break` and `continue`
    JumpStatement,
    LabeledStatement,
    Lambda,
    LocalFunction,
}

impl StatementLabel {
    /// Every label, in index order.
    pub const ALL: [StatementLabel; 29] = [
        StatementLabel::Body,
        StatementLabel::Block,
        StatementLabel::IfStatement,
        StatementLabel::ElseClause,
        StatementLabel::WhileStatement,
        StatementLabel::DoStatement,
        StatementLabel::ForStatement,
        StatementLabel::ForInitializer,
        StatementLabel::ForIncrementor,
        StatementLabel::ForEachStatement,
        StatementLabel::SwitchStatement,
        StatementLabel::SwitchSection,
        StatementLabel::TryStatement,
        StatementLabel::CatchClause,
        StatementLabel::CatchDeclaration,
        StatementLabel::CatchFilter,
        StatementLabel::FinallyClause,
        StatementLabel::UsingStatement,
        StatementLabel::LockStatement,
        StatementLabel::LocalDeclaration,
        StatementLabel::VariableDeclarator,
        StatementLabel::ExpressionStatement,
        StatementLabel::ReturnStatement,
        StatementLabel::ThrowStatement,
        StatementLabel::YieldStatement,
        StatementLabel::JumpStatement,
        StatementLabel::LabeledStatement,
        StatementLabel::Lambda,
        StatementLabel::LocalFunction,
    ];

    pub const fn info(self) -> LabelInfo {
        match self {
            StatementLabel::Body => LabelInfo::node("body"),
            StatementLabel::Block => LabelInfo::node("block"),
            StatementLabel::IfStatement => LabelInfo::node("if"),
            StatementLabel::ElseClause => LabelInfo::node("else").tied(),
            StatementLabel::WhileStatement => LabelInfo::node("while"),
            StatementLabel::DoStatement => LabelInfo::node("do"),
            StatementLabel::ForStatement => LabelInfo::node("for"),
            StatementLabel::ForInitializer => LabelInfo::node("for_initializer").tied(),
            StatementLabel::ForIncrementor => LabelInfo::node("for_incrementor").tied(),
            StatementLabel::ForEachStatement => LabelInfo::node("foreach"),
            StatementLabel::SwitchStatement => LabelInfo::node("switch"),
            StatementLabel::SwitchSection => LabelInfo::node("switch_section"),
            StatementLabel::TryStatement => LabelInfo::node("try"),
            StatementLabel::CatchClause => LabelInfo::node("catch"),
            StatementLabel::CatchDeclaration => LabelInfo::leaf("catch_declaration").tied(),
            StatementLabel::CatchFilter => LabelInfo::node("catch_filter").tied(),
            StatementLabel::FinallyClause => LabelInfo::node("finally").tied(),
            StatementLabel::UsingStatement => LabelInfo::node("using"),
            StatementLabel::LockStatement => LabelInfo::node("lock"),
            StatementLabel::LocalDeclaration => LabelInfo::node("local_declaration"),
            StatementLabel::VariableDeclarator => LabelInfo::node("variable_declarator"),
            StatementLabel::ExpressionStatement => LabelInfo::node("expression_statement"),
            StatementLabel::ReturnStatement => LabelInfo::node("return"),
            StatementLabel::ThrowStatement => LabelInfo::node("throw"),
            StatementLabel::YieldStatement => LabelInfo::node("yield"),
            StatementLabel::JumpStatement => LabelInfo::leaf("jump"),
            StatementLabel::LabeledStatement => LabelInfo::node("labeled_statement"),
            StatementLabel::Lambda => LabelInfo::leaf("lambda"),
            StatementLabel::LocalFunction => LabelInfo::leaf("local_function"),
        }
    }

    #[inline]
    pub const fn label(self) -> Label {
        Label::new(self as u16)
    }

    pub fn from_label(label: Label) -> Option<Self> {
        Self::ALL.get(label.index()).copied()
    }

    /// Label of a node of `kind` sitting under a node of `parent` kind.
    /// `None` means the node is transparent.
    pub fn classify(kind: SyntaxKind, parent: Option<SyntaxKind>) -> Option<Self> {
        use SyntaxKind as K;

        let label = match kind {
            K::MethodBody => Self::Body,
            K::Block => Self::Block,
            K::IfStatement => Self::IfStatement,
            K::ElseClause => Self::ElseClause,
            K::WhileStatement => Self::WhileStatement,
            K::DoStatement => Self::DoStatement,
            K::ForStatement => Self::ForStatement,
            K::ForInitializer => Self::ForInitializer,
            K::ForIncrementor => Self::ForIncrementor,
            K::ForEachStatement => Self::ForEachStatement,
            K::SwitchStatement => Self::SwitchStatement,
            K::SwitchSection => Self::SwitchSection,
            K::TryStatement => Self::TryStatement,
            K::CatchClause => Self::CatchClause,
            K::CatchDeclaration => Self::CatchDeclaration,
            K::CatchFilter => Self::CatchFilter,
            K::FinallyClause => Self::FinallyClause,
            K::UsingStatement => Self::UsingStatement,
            K::LockStatement => Self::LockStatement,
            K::LocalDeclaration if parent == Some(K::ForStatement) => Self::ForInitializer,
            K::LocalDeclaration => Self::LocalDeclaration,
            K::VariableDeclarator => Self::VariableDeclarator,
            K::ExpressionStatement => Self::ExpressionStatement,
            K::ReturnStatement => Self::ReturnStatement,
            K::ThrowStatement => Self::ThrowStatement,
            K::YieldStatement => Self::YieldStatement,
            K::BreakStatement | K::ContinueStatement => Self::JumpStatement,
            K::LabeledStatement => Self::LabeledStatement,
            K::Lambda => Self::Lambda,
            K::LocalFunction => Self::LocalFunction,
            K::EmptyStatement | K::Expression => return None,
        };
        Some(label)
    }

    /// Label of a tree node.
    pub fn of(node: SyntaxRef<'_>) -> Option<Self> {
        Self::classify(node.kind(), node.parent().map(SyntaxRef::kind))
    }
}

static LABELS: LazyLock<LabelTable> =
    LazyLock::new(|| LabelTable::new(StatementLabel::ALL.iter().map(|label| label.info())));

/// The statement label table.
pub fn label_table() -> &'static LabelTable {
    &LABELS
}

/// [`TreeComparer`] over two [`SyntaxTree`]s living at least as long as `'t`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementComparer<'t> {
    _trees: PhantomData<&'t SyntaxTree>,
}

impl<'t> StatementComparer<'t> {
    pub const fn new() -> Self {
        Self {
            _trees: PhantomData,
        }
    }

    /// Name and tokens of `node` and of its transparent descendants.
    fn value_tokens(&self, node: SyntaxRef<'t>) -> Vec<&'t str> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            push_tokens(current, &mut out);
            let transparent: Vec<_> = current
                .children()
                .filter(|child| StatementLabel::of(*child).is_none())
                .collect();
            stack.extend(transparent.into_iter().rev());
        }
        out
    }

    /// Every token of the subtree at `node`, not looking inside closures.
    fn subtree_tokens(&self, node: SyntaxRef<'t>) -> Vec<&'t str> {
        let mut out = Vec::new();
        self.walk(node, |n| push_tokens(n, &mut out));
        out
    }

    /// Names declared in the subtree at `node`, not looking inside closures.
    fn declared_names(&self, node: SyntaxRef<'t>) -> Vec<&'t str> {
        let mut out = Vec::new();
        self.walk(node, |n| {
            if matches!(
                n.kind(),
                SyntaxKind::VariableDeclarator
                    | SyntaxKind::ForEachStatement
                    | SyntaxKind::CatchDeclaration
                    | SyntaxKind::LocalFunction
            ) {
                out.extend(n.name());
            }
        });
        out
    }

    fn walk(&self, node: SyntaxRef<'t>, mut visit: impl FnMut(SyntaxRef<'t>)) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            visit(current);
            if current != node && self.is_opaque(current) {
                continue;
            }
            let children: Vec<_> = current.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    fn token_distance(&self, old: SyntaxRef<'t>, new: SyntaxRef<'t>) -> f64 {
        text_distance(&self.value_tokens(old), &self.value_tokens(new))
    }

    /// Token distance of two optional parts.
    fn part_distance(&self, old: Option<SyntaxRef<'t>>, new: Option<SyntaxRef<'t>>) -> f64 {
        match (old, new) {
            (None, None) => 0.0,
            (Some(old), Some(new)) => {
                text_distance(&self.subtree_tokens(old), &self.subtree_tokens(new))
            }
            _ => 1.0,
        }
    }

    /// Distance of two embedded statements.
    fn body_distance(&self, old: Option<SyntaxRef<'t>>, new: Option<SyntaxRef<'t>>) -> f64 {
        match (old, new) {
            (Some(old), Some(new)) if old.kind() == new.kind() => self.distance(old, new),
            _ => self.part_distance(old, new),
        }
    }

    /// Mix of the token distance, the share of statements kept as they were,
    /// and the share of declared names that survived.
    fn block_distance(&self, old: SyntaxRef<'t>, new: SyntaxRef<'t>) -> f64 {
        let tokens = text_distance(&self.subtree_tokens(old), &self.subtree_tokens(new));
        let old_statements: Vec<_> = old.children().filter(|c| c.kind().is_statement()).collect();
        let new_statements: Vec<_> = new.children().filter(|c| c.kind().is_statement()).collect();
        let statements = sequence_distance_by(&old_statements, &new_statements, |a, b| {
            self.values_equal(*a, *b)
        });
        let old_names = self.declared_names(old);
        let new_names = self.declared_names(new);
        if old_names.is_empty() && new_names.is_empty() {
            return combine(tokens, statements, 0.5);
        }
        weighted(&[
            (1.0, tokens),
            (1.0, statements),
            (1.0, set_distance(old_names, new_names)),
        ])
    }
}

/// Token distance where identifiers and literals outweigh punctuation, so
/// `X()` and `Q()` do not look alike.
fn text_distance(old: &[&str], new: &[&str]) -> f64 {
    combine(
        sequence_distance(&words(old), &words(new)),
        sequence_distance(old, new),
        0.7,
    )
}

fn words<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    tokens.iter().copied().filter(|token| is_word(token)).collect()
}

fn is_word(token: &str) -> bool {
    token.starts_with(|c: char| c.is_alphanumeric() || c == '_' || c == '"')
}

fn push_tokens<'t>(node: SyntaxRef<'t>, out: &mut Vec<&'t str>) {
    out.extend(node.name());
    out.extend(node.tokens().iter().map(|token| token.as_str()));
}

fn name_distance(old: SyntaxRef<'_>, new: SyntaxRef<'_>) -> f64 {
    if old.name() == new.name() { 0.0 } else { 1.0 }
}

fn child_of_kind(node: SyntaxRef<'_>, kind: SyntaxKind) -> Option<SyntaxRef<'_>> {
    node.children().find(|child| child.kind() == kind)
}

/// The embedded statement of a compound statement: its last statement child.
fn body_of(node: SyntaxRef<'_>) -> Option<SyntaxRef<'_>> {
    node.children().filter(|child| child.kind().is_statement()).last()
}

impl<'t> TreeComparer for StatementComparer<'t> {
    type Node = SyntaxRef<'t>;

    fn labels(&self) -> &LabelTable {
        label_table()
    }

    fn label(&self, node: Self::Node) -> Label {
        StatementLabel::of(node).map_or(Label::IGNORED, StatementLabel::label)
    }

    fn children(&self, node: Self::Node) -> impl Iterator<Item = Self::Node> + '_ {
        node.children()
    }

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        node.parent()
    }

    fn is_opaque(&self, node: Self::Node) -> bool {
        matches!(node.kind(), SyntaxKind::Lambda | SyntaxKind::LocalFunction)
    }

    fn values_equal(&self, old: Self::Node, new: Self::Node) -> bool {
        old.kind() == new.kind() && self.value_tokens(old) == self.value_tokens(new)
    }

    fn distance(&self, old: Self::Node, new: Self::Node) -> f64 {
        use StatementLabel as L;

        let Some(label) = StatementLabel::of(old) else {
            return self.token_distance(old, new);
        };
        let expression = |node| child_of_kind(node, SyntaxKind::Expression);

        match label {
            L::Body | L::Block | L::SwitchSection => self.block_distance(old, new),
            L::ForStatement => weighted(&[
                (0.4, self.part_distance(expression(old), expression(new))),
                (
                    0.2,
                    self.part_distance(
                        child_of_kind(old, SyntaxKind::ForIncrementor),
                        child_of_kind(new, SyntaxKind::ForIncrementor),
                    ),
                ),
                (0.4, self.body_distance(body_of(old), body_of(new))),
            ]),
            L::WhileStatement | L::DoStatement | L::LockStatement => combine(
                self.part_distance(expression(old), expression(new)),
                self.body_distance(body_of(old), body_of(new)),
                0.6,
            ),
            L::UsingStatement => combine(
                self.part_distance(old.children().next(), new.children().next()),
                self.body_distance(body_of(old), body_of(new)),
                0.6,
            ),
            L::SwitchStatement => combine(
                self.part_distance(expression(old), expression(new)),
                text_distance(&self.subtree_tokens(old), &self.subtree_tokens(new)),
                0.6,
            ),
            L::ForEachStatement => {
                let header = combine(
                    name_distance(old, new),
                    self.part_distance(expression(old), expression(new)),
                    0.5,
                );
                combine(header, self.body_distance(body_of(old), body_of(new)), 0.6)
            }
            L::IfStatement => combine(
                self.part_distance(expression(old), expression(new)),
                self.body_distance(body_of(old), body_of(new)),
                0.6,
            ),
            L::VariableDeclarator => combine(
                name_distance(old, new),
                self.part_distance(expression(old), expression(new)),
                0.7,
            ),
            L::CatchClause => combine(
                self.part_distance(
                    child_of_kind(old, SyntaxKind::CatchDeclaration),
                    child_of_kind(new, SyntaxKind::CatchDeclaration),
                ),
                self.body_distance(
                    child_of_kind(old, SyntaxKind::Block),
                    child_of_kind(new, SyntaxKind::Block),
                ),
                0.6,
            ),
            _ => self.token_distance(old, new),
        }
    }

    fn describe(&self, node: Self::Node) -> String {
        let text = node.text();
        match text.char_indices().nth(40) {
            Some((cut, _)) => format!("{node:?} `{}…`", &text[..cut]),
            None => format!("{node:?} `{text}`"),
        }
    }
}
