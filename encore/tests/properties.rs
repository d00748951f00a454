//! Invariants that must hold for every matching, whatever the edit.

use std::collections::HashSet;

use encore::tether::{Match, compute_match};
use encore::{
    Classification, MatchingConfig, StatementComparer, StatementLabel, Syntax, SyntaxKind,
    SyntaxTree, diff_bodies,
};
use facet_testhelpers::test;

fn build(syntax: Syntax) -> SyntaxTree {
    SyntaxTree::build(syntax).unwrap()
}

fn run_lambda(statements: Vec<Syntax>) -> Syntax {
    Syntax::new(SyntaxKind::ExpressionStatement).child(Syntax::expression_with(
        "Run(() => { })",
        [Syntax::lambda("()", Syntax::block(statements))],
    ))
}

/// A body exercising every statement form.
fn rich_body() -> Syntax {
    Syntax::method_body([
        Syntax::declare("int", "total", Some("0")),
        Syntax::for_loop(
            Some(Syntax::declare("int", "i", Some("0"))),
            Some("i < n"),
            Some("i++"),
            Syntax::block([
                Syntax::statement("total += i"),
                Syntax::statement("total += i"),
            ]),
        ),
        Syntax::foreach(
            "item",
            "items",
            Syntax::block([Syntax::if_else(
                "item == null",
                Syntax::continue_statement(),
                Syntax::block([Syntax::statement("Use(item)")]),
            )]),
        ),
        Syntax::try_finally(
            Syntax::block([Syntax::statement("Open()")]),
            [Syntax::catch(
                Some("IOException"),
                Some("e"),
                Some("e.Retry"),
                Syntax::block([Syntax::throw(None)]),
            )],
            Syntax::block([Syntax::statement("Close()")]),
        ),
        Syntax::switch(
            "total",
            [
                Syntax::section(
                    "case 0 :",
                    [Syntax::statement("Zero()"), Syntax::break_statement()],
                ),
                Syntax::section("default :", [Syntax::break_statement()]),
            ],
        ),
        Syntax::using(
            Syntax::declare("var", "s", Some("Open()")),
            Syntax::block([Syntax::statement("s.Read()")]),
        ),
        Syntax::lock("gate", Syntax::block([Syntax::statement("total++")])),
        Syntax::local_function(
            "Helper",
            "(int x)",
            Syntax::block([Syntax::return_value(Some("x * 2"))]),
        ),
        run_lambda(vec![Syntax::statement("Work(total)")]),
        Syntax::labeled("done", Syntax::empty()),
        Syntax::do_while(Syntax::block([Syntax::statement("total--")]), "total > 0"),
        Syntax::yield_return("total"),
        Syntax::yield_break(),
    ])
}

/// Pairs of (old, new) bodies covering insertions, deletions, moves, label
/// changes and tied clauses.
fn edits() -> Vec<(Syntax, Syntax)> {
    vec![
        (
            rich_body(),
            Syntax::method_body([
                Syntax::statement("Prelude()"),
                Syntax::declare("int", "total", Some("1")),
                Syntax::while_loop("i < n", Syntax::block([Syntax::statement("total += i")])),
                Syntax::try_catch(
                    Syntax::block([Syntax::statement("Open()")]),
                    [Syntax::catch(
                        Some("Exception"),
                        None,
                        None,
                        Syntax::block([Syntax::statement("Close()")]),
                    )],
                ),
                Syntax::return_value(Some("total")),
            ]),
        ),
        (
            Syntax::method_body([
                Syntax::if_else(
                    "a",
                    Syntax::block([Syntax::statement("A()")]),
                    Syntax::if_else(
                        "b",
                        Syntax::block([Syntax::statement("B()")]),
                        Syntax::block([Syntax::statement("C()")]),
                    ),
                ),
                Syntax::statement("D()"),
            ]),
            Syntax::method_body([
                Syntax::statement("D()"),
                Syntax::if_else(
                    "b",
                    Syntax::block([Syntax::statement("B()")]),
                    Syntax::if_else(
                        "a",
                        Syntax::block([Syntax::statement("A()")]),
                        Syntax::block([Syntax::statement("C()")]),
                    ),
                ),
            ]),
        ),
        (
            Syntax::method_body([Syntax::block([
                Syntax::statement("A()"),
                Syntax::block([Syntax::statement("B()"), Syntax::statement("C()")]),
            ])]),
            Syntax::method_body([
                Syntax::statement("C()"),
                Syntax::block([Syntax::statement("A()"), Syntax::statement("B()")]),
            ]),
        ),
        (
            Syntax::method_body([run_lambda(vec![
                Syntax::statement("X()"),
                run_lambda(vec![Syntax::statement("Y()")]),
            ])]),
            Syntax::method_body([
                run_lambda(vec![Syntax::statement("Y()")]),
                Syntax::statement("X()"),
            ]),
        ),
    ]
}

fn check_invariants(m: &Match<StatementComparer<'_>>) {
    assert_eq!(m.verify(), Ok(()));

    let pairs: Vec<_> = m.matching().pairs().collect();
    let olds: HashSet<_> = pairs.iter().map(|(old, _)| *old).collect();
    let news: HashSet<_> = pairs.iter().map(|(_, new)| *new).collect();
    assert_eq!(olds.len(), pairs.len(), "an old node is matched twice");
    assert_eq!(news.len(), pairs.len(), "a new node is matched twice");

    let view = m.view();
    for &(old, new) in &pairs {
        if old == m.old_root() {
            assert_eq!(new, m.new_root());
            continue;
        }
        let label = StatementLabel::of(old);
        assert_eq!(label, StatementLabel::of(new), "{old:?} / {new:?}");
        let Some(label) = label else {
            panic!("unlabeled node {old:?} was matched");
        };
        if view.tied_to_ancestor(label.label()) {
            let old_parent = view.parent(old).unwrap();
            let new_parent = view.parent(new).unwrap();
            assert_eq!(m.map_old_to_new(old_parent), Some(new_parent));
        }
    }
}

#[test]
fn test_invariants_hold_for_every_edit() {
    for (old, new) in edits() {
        let old = build(old);
        let new = build(new);
        for config in [MatchingConfig::default(), MatchingConfig::top_down()] {
            let m = compute_match(
                StatementComparer::new(),
                old.root_ref(),
                new.root_ref(),
                &config,
            );
            check_invariants(&m);

            // and for every closure region as well
            let diff = diff_bodies(&old, &new, &config);
            for region in diff.regions().iter().skip(1) {
                let m = compute_match(
                    StatementComparer::new(),
                    region.old_root(),
                    region.new_root(),
                    &config,
                );
                check_invariants(&m);
            }
        }
    }
}

#[test]
fn test_matching_is_deterministic() {
    for (old, new) in edits() {
        let old = build(old);
        let new = build(new);
        let first = diff_bodies(&old, &new, &MatchingConfig::default());
        let second = diff_bodies(&old, &new, &MatchingConfig::default());
        let a: Vec<_> = first.edits().collect();
        let b: Vec<_> = second.edits().collect();
        assert_eq!(a, b);
    }
}

#[test]
fn test_identity_matches_everything() {
    let old = build(rich_body());
    let new = build(rich_body());
    let diff = diff_bodies(&old, &new, &MatchingConfig::default());

    assert!(!diff.has_changes());
    assert_eq!(diff.regions().len(), 3);

    let labeled: Vec<_> = old
        .descendants(old.root())
        .map(|id| old.node(id))
        .filter(|node| StatementLabel::of(*node).is_some())
        .collect();
    assert!(labeled.len() > 40);
    for node in labeled {
        assert_eq!(
            diff.map_old_to_new(node),
            Some(new.node(node.id())),
            "{node:?} is not matched to its copy"
        );
        assert_eq!(diff.classify_old(node), Some(Classification::Unchanged));
    }

    for region in diff.regions() {
        let stats = region.stats();
        assert_eq!(stats.residual_passes, 0);
        assert_eq!(stats.residual_matches, 0);
        assert_eq!(stats.cross_parent_matches, 0);
        assert_eq!(stats.distance_calls, 0);
        assert!(region.script().is_subtree_unchanged(region.old_root()));
    }
}

#[test]
fn test_unchanged_list_needs_no_ranking() {
    let old = build(Syntax::method_body([
        Syntax::statement("A()"),
        Syntax::while_loop("x", Syntax::block([Syntax::statement("P()")])),
        Syntax::statement("B()"),
    ]));
    let new = build(Syntax::method_body([
        Syntax::statement("A()"),
        Syntax::while_loop("x", Syntax::block([Syntax::statement("Q()")])),
        Syntax::statement("B()"),
    ]));
    let diff = diff_bodies(&old, &new, &MatchingConfig::default());
    let stats = diff.root().stats();

    // only the edited inner list falls back to distance ranking
    assert_eq!(stats.residual_passes, 1);
    assert_eq!(stats.residual_matches, 1);
    assert_eq!(stats.distance_calls, 1);
    assert_eq!(stats.lcs_matches, 4);
}
