use super::resolver::{self, Resolver, Slot};
use super::*;
use crate::dict::{ArgDict, FieldArgs, ParamKind};
use crate::error::ErrorKind;
use crate::param::{Arg, IntoArg, Param};
use crate::{args, named};

fn params_debug(built: &Built) -> String {
    format!("{:?}", built.params)
}

// ==================== Renumbering ====================

#[test]
fn renumbers_and_dedups_across_appends() {
    let mut q = Sql::compose("one = $1 and two = $2", args![10, 20]);
    q.append("and three = $1 and four = $1", args![30]);
    q.append("and five = $1 and six = $2", args![40, 50]);

    let built = q.build().unwrap();
    assert_eq!(
        built.sql,
        "one = $1 and two = $2 and three = $3 and four = $3 and five = $4 and six = $5"
    );
    assert_eq!(params_debug(&built), "[10, 20, 30, 40, 50]");
}

#[test]
fn out_of_order_ordinals_bind_in_reference_order() {
    let built = Sql::compose("b = $2 and a = $1 and again = $2", args!["a", "b"])
        .build()
        .unwrap();
    assert_eq!(built.sql, "b = $1 and a = $2 and again = $1");
    assert_eq!(params_debug(&built), r#"["b", "a"]"#);
}

#[test]
fn named_parameters_are_reused() {
    let built = Sql::compose(
        "select * from t where a = :id or b = :id and c = :name",
        named! { "id" => 7_i64, "name" => "x" },
    )
    .build()
    .unwrap();
    assert_eq!(built.sql, "select * from t where a = $1 or b = $1 and c = $2");
    assert_eq!(params_debug(&built), r#"[7, "x"]"#);
}

#[test]
fn named_parameters_from_map() {
    let mut map = std::collections::HashMap::new();
    map.insert("id".to_string(), Arg::value(1_i32));
    let built = Sql::compose("id = :id", map).build().unwrap();
    assert_eq!(built.sql, "id = $1");
}

#[test]
fn struct_fields_as_named_arguments() {
    struct Filter {
        status: &'static str,
        min_total: i64,
    }

    impl FieldArgs for Filter {
        fn field_names() -> &'static [&'static str] {
            &["status", "min_total"]
        }

        fn field_arg(&self, name: &str) -> Option<Arg> {
            match name {
                "status" => Some(self.status.into_arg()),
                "min_total" => Some(self.min_total.into_arg()),
                _ => None,
            }
        }
    }

    let filter = Filter {
        status: "paid",
        min_total: 10,
    };
    // Struct sources are not checked for unused fields.
    let built = Sql::compose("status = :status", filter.as_args())
        .build()
        .unwrap();
    assert_eq!(built.sql, "status = $1");
    assert_eq!(params_debug(&built), r#"["paid"]"#);

    let err = Sql::compose("missing = :nope", filter.as_args())
        .build()
        .unwrap_err();
    assert!(err.is_missing_argument());
}

// ==================== Sub-queries ====================

#[test]
fn subquery_is_flattened() {
    let inner = Sql::compose("select id from users where status = $1", args!["active"]);
    let built = Sql::compose(
        "select * from orders where total > $1 and user_id in ($2) and created > $3",
        args![100_i64, inner, "2024"],
    )
    .build()
    .unwrap();

    assert_eq!(
        built.sql,
        "select * from orders where total > $1 and user_id in \
         (select id from users where status = $2) and created > $3"
    );
    assert_eq!(params_debug(&built), r#"[100, "active", "2024"]"#);
}

#[test]
fn subquery_is_duplicated_at_each_reference() {
    let inner = Sql::compose("select id from u where s = $1", args![1]);
    let built = Sql::compose("a in ($1) or b in ($1)", args![inner])
        .build()
        .unwrap();

    assert_eq!(
        built.sql,
        "a in (select id from u where s = $1) or b in (select id from u where s = $2)"
    );
    assert_eq!(params_debug(&built), "[1, 1]");
}

#[test]
fn nested_subqueries_flatten_recursively() {
    let innermost = Sql::compose("select org_id from admins where level > $1", args![3]);
    let middle = Sql::compose(
        "select id from users where org_id in ($1) and name = $2",
        args![innermost, "bob"],
    );
    let built = Sql::compose("select * from orders where id = $1 and user_id in ($2)", args![9, middle])
        .build()
        .unwrap();

    assert_eq!(
        built.sql,
        "select * from orders where id = $1 and user_id in (select id from users where org_id in \
         (select org_id from admins where level > $2) and name = $3)"
    );
    assert_eq!(params_debug(&built), r#"[9, 3, "bob"]"#);
}

#[test]
fn subquery_error_propagates_to_outer() {
    let broken = sql("select id from users where id = $1");
    assert!(broken.error().is_some());

    let err = Sql::compose("x in ($1)", args![broken]).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingArgument);
}

// ==================== Validation ====================

#[test]
fn unused_ordinal_argument_is_rejected() {
    let err = Sql::compose("a = $1", args![1, 2]).build().unwrap_err();
    assert!(err.is_unused_argument());
    assert!(err.cause().contains("$2"));
}

#[test]
fn unused_named_argument_is_rejected() {
    let err = Sql::compose("x = :a", named! { "a" => 1, "b" => 2 })
        .build()
        .unwrap_err();
    assert!(err.is_unused_argument());
    assert!(err.cause().contains("`b`"));
}

#[test]
fn lenient_skips_unused_validation() {
    let mut q = Sql::empty().lenient();
    q.append("a = $1", args![1, 2]);
    let built = q.build().unwrap();
    assert_eq!(built.sql, "a = $1");
    assert_eq!(params_debug(&built), "[1]");
}

#[test]
fn missing_named_argument() {
    let err = Sql::compose("x = :a and y = :b", named! { "a" => 1 })
        .build()
        .unwrap_err();
    assert!(err.is_missing_argument());
}

#[test]
fn ordinal_past_the_end() {
    let err = Sql::compose("x = $2", args![1]).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrdinalOutOfBounds);
}

#[test]
fn ordinal_hole_is_missing() {
    struct Holey;

    impl ArgDict for Holey {
        fn len(&self) -> usize {
            2
        }

        fn accepts(&self, kind: ParamKind) -> bool {
            kind == ParamKind::Ordinal
        }

        fn by_ordinal(&self, index: usize) -> Option<Arg> {
            (index == 1).then(|| Arg::value(5_i32))
        }
    }

    let err = Sql::compose("a = $1", Holey).build().unwrap_err();
    assert!(err.is_missing_argument());

    let built = Sql::compose("a = $2", Holey).build().unwrap();
    assert_eq!(built.sql, "a = $1");
}

#[test]
fn params_without_arguments() {
    let err = sql("x = $1").build().unwrap_err();
    assert!(err.is_missing_argument());
    assert_eq!(
        err.to_string(),
        "missing argument while composing `x = $1`: \
         template has parameters but no arguments were supplied"
    );
}

#[test]
fn arguments_without_params() {
    let err = Sql::compose("select 1", args![1]).build().unwrap_err();
    assert!(err.is_invalid_input());

    // An empty source counts as no source.
    let built = Sql::compose("select 1", args![]).build().unwrap();
    assert_eq!(built.sql, "select 1");
}

#[test]
fn mixed_parameter_kinds_are_rejected() {
    let err = Sql::compose("a = $1 and b = :b", args![1]).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedParameter);
}

#[test]
fn wrong_source_kind_is_rejected() {
    let err = Sql::compose("a = :a", args![1]).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedParameter);

    let err = Sql::compose("a = $1", named! { "a" => 1 }).build().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedParameter);
}

#[test]
fn first_error_is_sticky_and_output_rolled_back() {
    let mut q = sql("select 1");
    q.append("and x = :missing", named! { "other" => 1 });
    q.append("and y = $1", args![2]);

    assert!(q.error().unwrap().is_missing_argument());
    assert_eq!(q.to_sql(), "select 1");
    assert!(q.build().is_err());
}

#[test]
fn builder_append_rolls_back_on_error() {
    let mut b = Builder::new();
    b.text("select 1");
    let dict = args![1];
    assert!(b.append("where a = $1 and b = $2", Some(&dict)).is_err());
    assert_eq!(b.to_sql(), "select 1");
    assert_eq!(b.param_count(), 0);
}

// ==================== Spacing ====================

#[derive(Clone, Copy)]
enum Frag {
    Text(&'static str),
    Bind(i32),
}

fn write(frags: &[Frag]) -> Builder {
    let mut b = Builder::new();
    for frag in frags {
        match *frag {
            Frag::Text(text) => b.text(text),
            Frag::Bind(value) => b.bind(value),
        };
    }
    b
}

#[test]
fn spacing_rules() {
    let b = write(&[
        Frag::Text("select"),
        Frag::Text("("),
        Frag::Text("a"),
        Frag::Text(","),
        Frag::Text("b"),
        Frag::Text(")"),
        Frag::Text("from t where x ="),
        Frag::Bind(1),
        Frag::Text(";"),
    ]);
    assert_eq!(b.to_sql(), "select (a, b) from t where x = $1;");

    let b = write(&[Frag::Text("f("), Frag::Bind(1), Frag::Text(")")]);
    assert_eq!(b.to_sql(), "f($1)");

    let b = write(&[Frag::Text("a "), Frag::Text(" b")]);
    assert_eq!(b.to_sql(), "a  b");
}

#[test]
fn spacing_is_associative() {
    let frags = [
        Frag::Text("select"),
        Frag::Text("["),
        Frag::Bind(1),
        Frag::Text("]"),
        Frag::Text("from t where a ="),
        Frag::Bind(2),
        Frag::Text("and b in ("),
        Frag::Bind(3),
        Frag::Text(","),
        Frag::Bind(4),
        Frag::Text(")"),
        Frag::Text(";"),
    ];
    let whole = write(&frags);

    for split in 0..=frags.len() {
        let mut left = write(&frags[..split]);
        let right = write(&frags[split..]);
        left.inline(&right);
        assert_eq!(left.to_sql(), whole.to_sql(), "split at {split}");
        assert_eq!(left.param_count(), whole.param_count());
    }
}

#[test]
fn template_fragments_after_the_first_are_verbatim() {
    let built = Sql::compose("f($1)", args![1]).build().unwrap();
    assert_eq!(built.sql, "f($1)");

    let mut q = sql("select count(*)");
    q.append("from t where id = any($1)", args![vec![1_i32, 2]]);
    assert_eq!(q.build().unwrap().sql, "select count(*) from t where id = any($1)");
}

#[test]
fn expression_arguments_are_spaced_like_values() {
    let built = Sql::compose("a.$1 and f($2)", args![Raw::new("b"), Raw::new("c")])
        .build()
        .unwrap();
    assert_eq!(built.sql, "a.b and f(c)");

    let built = Sql::compose("a.$1 and f($2)", args!["b", "c"]).build().unwrap();
    assert_eq!(built.sql, "a.$1 and f($2)");

    // Placeholders inside the spliced expression are still re-based.
    let inner = Sql::compose("x = $1", args![7]);
    let built = Sql::compose("where y = $1 and($2)", args![1, inner])
        .build()
        .unwrap();
    assert_eq!(built.sql, "where y = $1 and(x = $2)");
    assert_eq!(params_debug(&built), "[1, 7]");

    // A leading expression is still spaced against the buffer.
    let mut q = sql("select");
    q.append("$1 from t", args![Raw::new("a")]);
    assert_eq!(q.build().unwrap().sql, "select a from t");
}

// ==================== Expressions ====================

#[test]
fn join_skips_empty_items() {
    let mut filter = Join::and();
    filter
        .push(Raw::new("a = 1"))
        .push(Join::or())
        .push(Sql::compose("b = $1", args![2]));

    let mut b = Builder::new();
    b.text("where");
    b.expr(&filter).unwrap();
    assert_eq!(b.to_sql(), "where a = 1 and b = $1");

    let mut b = Builder::new();
    b.text("where");
    b.expr(&Join::and().with(Join::or()).with(Raw::new("c"))).unwrap();
    assert_eq!(b.to_sql(), "where c");
}

#[test]
fn join_comma_and_paren() {
    let list = Join::comma().with(Raw::new("a")).with(Raw::new("b"));
    let mut b = Builder::new();
    b.text("select");
    b.expr(&list).unwrap();
    b.text("where not");
    b.expr(&Paren(Raw::new("a or b"))).unwrap();
    assert_eq!(b.to_sql(), "select a, b where not (a or b)");
}

#[test]
fn push_helpers() {
    let mut q = Sql::empty();
    q.push("select * from t where a =")
        .push_bind(1_i64)
        .push("and b in")
        .push_sub(Sql::compose("select id from u where x = $1", args![2]))
        .push("and c =")
        .push_any(3_i32)
        .push("and")
        .push_expr(Raw::new("d is null"));

    let built = q.build().unwrap();
    assert_eq!(
        built.sql,
        "select * from t where a = $1 and b in (select id from u where x = $2) and c = $3 and d is null"
    );
    assert_eq!(built.params_ref().len(), 3);
}

#[test]
fn builder_any_dispatches() {
    let mut b = Builder::new();
    b.text("x =");
    b.any(&Arg::Value(Param::new(1_i32))).unwrap();
    b.text("and");
    b.any(&Raw::new("y").into_arg()).unwrap();
    assert_eq!(b.to_sql(), "x = $1 and y");
}

#[test]
fn tag_does_not_change_output() {
    let built = sql("select 1").tagged("health").build().unwrap();
    assert_eq!(built.sql, "select 1");
    assert!(built.params.is_empty());
}

// ==================== Resolver pool ====================

// The pool is process-wide; these tests take turns with each other.
static POOL_TESTS: std::sync::Mutex<()> = std::sync::Mutex::new(());

fn assert_returned_since(before: usize) {
    assert!(
        resolver::returned_count() > before || resolver::pool_len() >= resolver::POOL_LIMIT,
        "resolver was not handed back to the pool"
    );
}

#[test]
fn resolver_is_cleared_when_returned() {
    let _guard = POOL_TESTS.lock().unwrap_or_else(|e| e.into_inner());
    let before = resolver::returned_count();
    {
        let mut r = Resolver::acquire();
        r.set_ordinal(1, Slot::Bound(1));
        r.set_named("a", Slot::Inlined);
        assert_eq!(r.ordinal(1), Some(Slot::Bound(1)));
        assert_eq!(r.named("a"), Some(Slot::Inlined));
    }
    assert_returned_since(before);
    for _ in 0..4 {
        assert!(Resolver::acquire().is_empty());
    }
}

#[test]
fn resolver_is_returned_after_compose() {
    let _guard = POOL_TESTS.lock().unwrap_or_else(|e| e.into_inner());
    let before = resolver::returned_count();
    let built = Sql::compose("a = $1 and b = $1", args![1]).build().unwrap();
    assert_eq!(built.sql, "a = $1 and b = $1");
    assert_returned_since(before);
}

#[test]
fn resolver_is_returned_on_panic() {
    let _guard = POOL_TESTS.lock().unwrap_or_else(|e| e.into_inner());
    let before = resolver::returned_count();
    let result = std::panic::catch_unwind(|| {
        let mut r = Resolver::acquire();
        r.set_ordinal(3, Slot::Bound(9));
        panic!("boom");
    });
    assert!(result.is_err());
    assert_returned_since(before);
    for _ in 0..4 {
        assert!(Resolver::acquire().is_empty());
    }
}

#[test]
fn resolver_is_returned_on_error() {
    let _guard = POOL_TESTS.lock().unwrap_or_else(|e| e.into_inner());
    for _ in 0..64 {
        let before = resolver::returned_count();
        let err = Sql::compose("a = $1 and b = $2", args![1]).build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OrdinalOutOfBounds);
        assert_returned_since(before);
    }
}
