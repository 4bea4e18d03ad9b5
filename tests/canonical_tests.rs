// tests/canonical_tests.rs

use std::collections::HashSet;
use std::sync::Arc;

use fql::ast::{
    Aggregate, AliasId, ClassOp, ClassOperand, Comparator, ConstraintId, ContainsOp, Direction,
    ExprOp, MembershipOp, NodeId, Operand, Query, QueryBuilder, ReferenceKind, Source,
};
use fql::{QueryError, Value, constraint_to_canonical, to_canonical};

fn person_query() -> (QueryBuilder, AliasId, NodeId) {
    let mut builder = QueryBuilder::new();
    let p = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let p_node = builder.class_node(p).unwrap();
    builder.add_selected(p_node).unwrap();
    (builder, p, p_node)
}

fn literal(value: impl Into<Value>) -> Option<Operand> {
    Some(Operand::Literal(value.into()))
}

/// Person query with `age > "30"` and `name = "Smith"` leaves.
fn two_leaves() -> (QueryBuilder, ConstraintId, ConstraintId) {
    let (mut builder, p, _) = person_query();
    let age = builder.field(p, "age").unwrap();
    let name = builder.field(p, "name").unwrap();
    let a = builder.compare(age, Comparator::GreaterThan, literal(30i64)).unwrap();
    let b = builder.compare(name, Comparator::Equal, literal("Smith")).unwrap();
    (builder, a, b)
}

fn single_column(class: &str, field: &str) -> Arc<Query> {
    let mut builder = QueryBuilder::new();
    let a = builder.bind_source(&Source::class(class).unwrap()).unwrap();
    let node = builder.field(a, field).unwrap();
    builder.add_selected(node).unwrap();
    builder.build().unwrap()
}

fn assert_leaf_consistent(query: &Query, id: ConstraintId) {
    let parts = query.decompose(id).unwrap().expect("leaf");
    assert_eq!(parts.to_string(), constraint_to_canonical(query, id).unwrap());
}

// ============================================================================
// Leaves
// ============================================================================

#[test]
fn test_comparison_with_literal() {
    let (mut builder, a, _) = two_leaves();
    builder.set_root_constraint(a).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, a).unwrap(), r#"age > "30""#);
    let parts = query.decompose(a).unwrap().unwrap();
    assert_eq!(parts.left(), "age");
    assert_eq!(parts.op(), ">");
    assert_eq!(parts.right(), Some(r#""30""#));
}

#[test]
fn test_does_not_contain() {
    let mut builder = QueryBuilder::new();
    let person = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let dog = builder.bind_source_as(&Source::class("Dog").unwrap(), "Dog").unwrap();
    let pets = builder.reference(person, "pets", ReferenceKind::Collection).unwrap();
    let dog_node = builder.class_node(dog).unwrap();
    let p = builder.class_node(person).unwrap();
    builder.add_selected(p).unwrap();
    let c = builder.contains(pets, ContainsOp::DoesNotContain, dog_node).unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, c).unwrap(), "pets DOES NOT CONTAIN Dog");
    assert_leaf_consistent(&query, c);
}

#[test]
fn test_field_path_left_omits_alias() {
    let (mut builder, p, _) = person_query();
    let city = builder.field_path(p, "address", "city").unwrap();
    let c = builder.compare(city, Comparator::Like, literal("Cam%")).unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, c).unwrap(), r#"address.city LIKE "Cam%""#);
}

#[test]
fn test_node_right_keeps_alias() {
    let mut builder = QueryBuilder::new();
    let a = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let b = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let a_age = builder.field(a, "age").unwrap();
    let b_age = builder.field(b, "age").unwrap();
    let a_node = builder.class_node(a).unwrap();
    builder.add_selected(a_node).unwrap();
    let c = builder
        .compare(a_age, Comparator::LessThan, Some(Operand::Node(b_age)))
        .unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        "SELECT a1_ FROM Person AS a1_, Person AS a2_ WHERE age < a2_.age"
    );
}

#[test]
fn test_expression_left_uses_node_text() {
    let (mut builder, p, _) = person_query();
    let name = builder.field(p, "name").unwrap();
    let lower = builder.expression(ExprOp::Lower, vec![name]).unwrap();
    let smith = builder.value("smith");
    let c = builder
        .compare(lower, Comparator::Equal, Some(Operand::Node(smith)))
        .unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, c).unwrap(), "LOWER(a1_.name) = 'smith'");
    assert_leaf_consistent(&query, c);
}

#[test]
fn test_class_identity() {
    let mut builder = QueryBuilder::new();
    let dog = builder.bind_source(&Source::class("Dog").unwrap()).unwrap();
    let person = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let dog_node = builder.class_node(dog).unwrap();
    let owner = builder.reference(dog, "owner", ReferenceKind::Object).unwrap();
    let person_node = builder.class_node(person).unwrap();
    builder.add_selected(dog_node).unwrap();

    let is_dog = builder
        .class_identity(dog_node, ClassOp::Equal, ClassOperand::Type("org.model.Dog".into()))
        .unwrap();
    let not_owner = builder
        .class_identity(owner, ClassOp::NotEqual, ClassOperand::Node(person_node))
        .unwrap();
    let root = builder.and(vec![is_dog, not_owner]).unwrap();
    builder.set_root_constraint(root).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, is_dog).unwrap(), r#"a1_ = "org.model.Dog""#);
    let parts = query.decompose(is_dog).unwrap().unwrap();
    assert_eq!(parts.right(), Some(r#""org.model.Dog""#));
    assert_eq!(constraint_to_canonical(&query, not_owner).unwrap(), "owner != a2_");
    assert_leaf_consistent(&query, is_dog);
    assert_leaf_consistent(&query, not_owner);
}

#[test]
fn test_literal_quotes_are_not_escaped() {
    let (mut builder, p, _) = person_query();
    let name = builder.field(p, "name").unwrap();
    let c = builder
        .compare(name, Comparator::Equal, literal(r#"say "hi""#))
        .unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, c).unwrap(), r#"name = "say "hi"""#);
}

// ============================================================================
// Subqueries
// ============================================================================

#[test]
fn test_subquery_membership() {
    let (mut builder, p, _) = person_query();
    let name = builder.field(p, "name").unwrap();
    let sub = single_column("Employee", "name");
    let c = builder.subquery(name, MembershipOp::NotIn, sub).unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        "SELECT a1_ FROM Person AS a1_ WHERE name IS NOT IN (SELECT a1_.name FROM Employee AS a1_)"
    );
    let parts = query.decompose(c).unwrap().unwrap();
    assert_eq!(parts.right(), Some("SELECT a1_.name FROM Employee AS a1_"));
    assert_leaf_consistent(&query, c);
}

#[test]
fn test_two_column_subquery_rejected() {
    let mut sub = QueryBuilder::new();
    let e = sub.bind_source(&Source::class("Employee").unwrap()).unwrap();
    let name = sub.field(e, "name").unwrap();
    let age = sub.field(e, "age").unwrap();
    sub.add_selected(name).unwrap();
    sub.add_selected(age).unwrap();
    let sub = sub.build().unwrap();

    let (mut builder, p, _) = person_query();
    let left = builder.field(p, "name").unwrap();
    let err = builder.subquery(left, MembershipOp::In, Arc::clone(&sub)).unwrap_err();
    assert_eq!(err, QueryError::InvalidSubqueryShape { selected: 2 });

    let err = builder
        .compare(left, Comparator::Equal, Some(Operand::Query(sub)))
        .unwrap_err();
    assert_eq!(err, QueryError::InvalidSubqueryShape { selected: 2 });
}

#[test]
fn test_scalar_subquery_comparison() {
    let mut sub = QueryBuilder::new();
    let e = sub.bind_source(&Source::class("Person").unwrap()).unwrap();
    let age = sub.field(e, "age").unwrap();
    let max = sub.function(Aggregate::Max, Some(age)).unwrap();
    sub.add_selected(max).unwrap();
    let sub = sub.build().unwrap();

    let (mut builder, p, _) = person_query();
    let age = builder.field(p, "age").unwrap();
    let c = builder
        .compare(age, Comparator::GreaterEqual, Some(Operand::Query(sub)))
        .unwrap();
    builder.set_root_constraint(c).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        constraint_to_canonical(&query, c).unwrap(),
        "age >= (SELECT MAX(a1_.age) FROM Person AS a1_)"
    );
    assert_leaf_consistent(&query, c);
}

#[test]
fn test_subquery_source() {
    let inner = single_column("Person", "age");
    let mut builder = QueryBuilder::new();
    let s = builder.bind_source(&Source::subquery(inner)).unwrap();
    let node = builder.class_node(s).unwrap();
    builder.add_selected(node).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        "SELECT a1_ FROM (SELECT a1_.age FROM Person AS a1_) AS a1_"
    );
}

// ============================================================================
// Sets
// ============================================================================

#[test]
fn test_and_and_not() {
    let (mut builder, a, b) = two_leaves();
    let and = builder.and(vec![a, b]).unwrap();
    let not = builder.not(and).unwrap();
    builder.set_root_constraint(not).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        constraint_to_canonical(&query, and).unwrap(),
        r#"age > "30" AND name = "Smith""#
    );
    assert_eq!(
        constraint_to_canonical(&query, not).unwrap(),
        r#"NOT (age > "30" AND name = "Smith")"#
    );
}

#[test]
fn test_not_of_leaf() {
    let (mut builder, a, _) = two_leaves();
    let not = builder.not(a).unwrap();
    builder.set_root_constraint(not).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, not).unwrap(), r#"NOT (age > "30")"#);
}

#[test]
fn test_nested_set_is_parenthesized() {
    let (mut builder, a, b) = two_leaves();
    let p = builder.alias("a1_").unwrap();
    let height = builder.field(p, "height").unwrap();
    let c = builder.compare(height, Comparator::IsNull, None).unwrap();
    let or = builder.or(vec![a, b]).unwrap();
    let and = builder.and(vec![or, c]).unwrap();
    builder.set_root_constraint(and).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        constraint_to_canonical(&query, and).unwrap(),
        r#"(age > "30" OR name = "Smith") AND height IS NULL"#
    );
}

#[test]
fn test_constants_inside_sets() {
    let (mut builder, a, _) = two_leaves();
    let never = builder.always_false();
    let or = builder.or(vec![never, a]).unwrap();
    builder.set_root_constraint(or).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(constraint_to_canonical(&query, or).unwrap(), r#"false OR age > "30""#);
}

#[test]
fn test_sets_do_not_decompose() {
    let (mut builder, a, b) = two_leaves();
    let and = builder.and(vec![a, b]).unwrap();
    let not = builder.not(and).unwrap();
    builder.set_root_constraint(not).unwrap();
    let query = builder.build().unwrap();

    assert!(query.decompose(and).unwrap().is_none());
    assert!(query.decompose(not).unwrap().is_none());
    for leaf in query.leaves(query.root()).unwrap() {
        assert_leaf_consistent(&query, leaf);
    }
}

// ============================================================================
// Whole queries
// ============================================================================

#[test]
fn test_full_query() {
    let mut builder = QueryBuilder::new();
    let person = builder.bind_source(&Source::class("Person").unwrap()).unwrap();
    let dog = builder.bind_source(&Source::class("Dog").unwrap()).unwrap();
    let p = builder.class_node(person).unwrap();
    let name = builder.field(person, "name").unwrap();
    let pets = builder.reference(person, "pets", ReferenceKind::Collection).unwrap();
    let d = builder.class_node(dog).unwrap();
    builder.add_selected(p).unwrap();
    builder.add_selected(name).unwrap();
    builder.set_distinct(true);

    let has_dog = builder.contains(pets, ContainsOp::Contains, d).unwrap();
    let like = builder.compare(name, Comparator::Like, literal("S%")).unwrap();
    let root = builder.and(vec![has_dog, like]).unwrap();
    builder.set_root_constraint(root).unwrap();
    builder.add_order_by(name, Direction::Descending).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        r#"SELECT DISTINCT a1_, a1_.name FROM Person AS a1_, Dog AS a2_ WHERE pets CONTAINS a2_ AND name LIKE "S%" ORDER BY a1_.name DESC"#
    );
}

#[test]
fn test_group_by_and_order_by() {
    let mut builder = QueryBuilder::new();
    let e = builder.bind_source(&Source::class("Employee").unwrap()).unwrap();
    let dept = builder.field(e, "department").unwrap();
    let count = builder.function(Aggregate::Count, None).unwrap();
    builder.add_selected(dept).unwrap();
    builder.add_selected(count).unwrap();
    builder.add_group_by(dept).unwrap();
    builder.add_order_by(dept, Direction::Ascending).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        "SELECT a1_.department, COUNT(*) FROM Employee AS a1_ GROUP BY a1_.department ORDER BY a1_.department"
    );
}

#[test]
fn test_trivial_root_is_omitted() {
    let (builder, _, _) = person_query();
    let query = builder.build().unwrap();
    assert_eq!(to_canonical(&query).unwrap(), "SELECT a1_ FROM Person AS a1_");
}

#[test]
fn test_explicit_aliases_in_registration_order() {
    let mut builder = QueryBuilder::new();
    let z = builder.bind_source_as(&Source::class("Zoo").unwrap(), "z").unwrap();
    builder.bind_source_as(&Source::class("Animal").unwrap(), "a").unwrap();
    builder.bind_source(&Source::class("Keeper").unwrap()).unwrap();
    let node = builder.class_node(z).unwrap();
    builder.add_selected(node).unwrap();
    let query = builder.build().unwrap();

    assert_eq!(
        to_canonical(&query).unwrap(),
        "SELECT z FROM Zoo AS z, Animal AS a, Keeper AS a1_"
    );
}

#[test]
fn test_rendering_is_idempotent() {
    let (mut builder, a, b) = two_leaves();
    let or = builder.or(vec![a, b]).unwrap();
    builder.set_root_constraint(or).unwrap();
    let query = builder.build().unwrap();

    let first = to_canonical(&query).unwrap();
    let second = to_canonical(&query).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_rendering() {
    let (mut builder, a, b) = two_leaves();
    let or = builder.or(vec![a, b]).unwrap();
    builder.set_root_constraint(or).unwrap();
    let query = builder.build().unwrap();
    let expected = to_canonical(&query).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let query = Arc::clone(&query);
                scope.spawn(move || to_canonical(&query).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

// ============================================================================
// Identity equality
// ============================================================================

fn build_or_query() -> (Arc<Query>, ConstraintId) {
    let (mut builder, a, b) = two_leaves();
    let or = builder.or(vec![a, b]).unwrap();
    builder.set_root_constraint(or).unwrap();
    (builder.build().unwrap(), or)
}

#[test]
fn test_printable_equality_is_identity() {
    let (first, first_root) = build_or_query();
    let (second, second_root) = build_or_query();

    let x = first.printable(first_root).unwrap();
    let y = second.printable(second_root).unwrap();

    // same text, different trees
    assert_eq!(x.render().unwrap(), y.render().unwrap());
    assert_ne!(x, y);

    let again = first.printable(first_root).unwrap();
    assert_eq!(x, again);

    let set: HashSet<_> = [x.clone(), again, y].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_printable_parts() {
    let (query, root) = build_or_query();
    let leaves = query.leaves(root).unwrap();
    let leaf = query.printable(leaves[1]).unwrap();
    assert_eq!(leaf.left().unwrap().as_deref(), Some("name"));
    assert_eq!(leaf.op().unwrap(), Some("="));
    assert_eq!(leaf.right().unwrap().as_deref(), Some(r#""Smith""#));

    let set = query.printable(root).unwrap();
    assert_eq!(set.left().unwrap(), None);
    assert_eq!(set.op().unwrap(), None);
    assert_eq!(set.right().unwrap(), None);
    assert!(set.decompose().unwrap().is_none());
}

#[test]
fn test_printable_rejects_unknown_id() {
    let (query, _) = build_or_query();
    let (mut builder, a, b) = two_leaves();
    let and = builder.and(vec![a, b]).unwrap();
    let not = builder.not(and).unwrap();
    builder.set_root_constraint(not).unwrap();
    let other = builder.build().unwrap();

    // index 3 belongs to the other query
    assert!(matches!(
        query.printable(other.root()),
        Err(QueryError::UnknownConstraint(3))
    ));
}
