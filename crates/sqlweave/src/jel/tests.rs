use super::*;
use crate::args;
use crate::error::ErrorKind;
use crate::schema::FieldDesc;
use crate::sql::Sql;

struct Profile;

impl Schema for Profile {
    fn describe() -> SchemaDesc {
        SchemaDesc::new(
            "Profile",
            vec![
                FieldDesc::scalar::<String>("bio", "bio"),
                FieldDesc::scalar::<bool>("verified", "is_verified"),
            ],
        )
    }
}

struct Person;

impl Schema for Person {
    fn describe() -> SchemaDesc {
        SchemaDesc::new(
            "Person",
            vec![
                FieldDesc::scalar::<String>("name", "name"),
                FieldDesc::scalar::<i64>("age", "age"),
                FieldDesc::scalar::<Vec<String>>("tags", "tags"),
                FieldDesc::nested::<Profile>("profile", "profile"),
            ],
        )
    }
}

fn render(json: &str) -> (String, String) {
    let jel = Jel::parse::<Person>(json).unwrap();
    let mut out = Builder::new();
    out.expr(&jel).unwrap();
    (out.to_sql(), format!("{:?}", out.params()))
}

fn parse_err(json: &str) -> ErrorKind {
    Jel::parse::<Person>(json).unwrap_err().kind()
}

#[test]
fn and_of_casts() {
    let (sql, params) =
        render(r#"["and", ["=", "name", ["name", "x"]], ["<", "age", ["age", 10]]]"#);
    assert_eq!(sql, r#"("name" = $1) and ("age" < $2)"#);
    assert_eq!(params, r#"["x", 10]"#);
}

#[test]
fn and_of_comparisons() {
    let (sql, params) = render(r#"["and", ["=", "name", ["name", "x"]], ["<", "age", 10]]"#);
    assert_eq!(sql, r#"("name" = $1) and ("age" < $2)"#);
    assert_eq!(params, r#"["x", 10]"#);
}

#[test]
fn empty_and_null_render_true() {
    for json in ["", "   \n\t", "null"] {
        let jel = Jel::parse::<Person>(json).unwrap();
        assert!(jel.is_trivial());
        let (sql, params) = render(json);
        assert_eq!(sql, "true");
        assert_eq!(params, "[]");
    }
}

#[test]
fn prefix_and_postfix() {
    let (sql, _) = render(r#"["not", ["is null", "name"]]"#);
    assert_eq!(sql, r#"not ("name" is null)"#);

    let (sql, _) = render(r#"["is not true", "profile.verified"]"#);
    assert_eq!(sql, r#"("profile")."is_verified" is not true"#);
}

#[test]
fn chained_infix() {
    let (sql, params) = render(r#"["or", ["<=", 1, "age", 5], ["~*", "name", ["name", "^a"]]]"#);
    assert_eq!(sql, r#"($1 <= "age" <= $2) or ("name" ~* $3)"#);
    assert_eq!(params, r#"[1, 5, "^a"]"#);
}

#[test]
fn any_and_between() {
    let (sql, params) = render(r#"["any", ["name", "rust"], "tags"]"#);
    assert_eq!(sql, r#"$1 = any("tags")"#);
    assert_eq!(params, r#"["rust"]"#);

    let (sql, params) = render(r#"["between", "age", 18, 65.5]"#);
    assert_eq!(sql, r#""age" between $1 and $2"#);
    assert_eq!(params, "[18, 65.5]");
}

#[test]
fn distinct_from() {
    let (sql, params) = render(r#"["is not distinct from", "name", null]"#);
    assert_eq!(sql, r#""name" is not distinct from $1"#);
    assert_eq!(params, "[SqlNull]");
}

#[test]
fn literals_are_bound() {
    let (sql, params) = render(r#"["=", true, false]"#);
    assert_eq!(sql, "$1 = $2");
    assert_eq!(params, "[true, false]");
}

#[test]
fn cast_decodes_declared_type() {
    let (sql, params) = render(r#"["@@", "tags", ["tags", ["a", "b"]]]"#);
    assert_eq!(sql, r#""tags" @@ $1"#);
    assert_eq!(params, r#"[["a", "b"]]"#);

    let (_, params) = render(r#"["=", "profile.bio", ["profile.bio", "hi"]]"#);
    assert_eq!(params, r#"["hi"]"#);
}

#[test]
fn unknown_fields_and_operators() {
    assert_eq!(parse_err(r#"["=", "nope", 1]"#), ErrorKind::UnknownField);
    assert_eq!(parse_err(r#"["=", "name", "x"]"#), ErrorKind::UnknownField);
    assert_eq!(parse_err(r#"["like", "name", 1]"#), ErrorKind::UnknownField);
    assert_eq!(parse_err(r#""profile.nope""#), ErrorKind::UnknownField);
}

#[test]
fn arity_violations() {
    assert_eq!(parse_err(r#"["not", "name", "age"]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["and", ["is null", "name"]]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["is distinct from", 1, 2, 3]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["between", "age", 1]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["any", "tags"]"#), ErrorKind::InvalidInput);

    let err = Jel::parse::<Person>(r#"["not", "name", "age"]"#).unwrap_err();
    assert_eq!(err.cause(), "`not` takes exactly 1 argument, got 2");
}

#[test]
fn malformed_documents() {
    assert_eq!(parse_err("[]"), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"{"=": ["name", 1]}"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["and", {}, 1]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err("[1, 2]"), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["and", "#), ErrorKind::InvalidInput);
    assert_eq!(parse_err("18446744073709551615"), ErrorKind::InvalidInput);

    let err = Jel::parse::<Person>(r#"["and", "#).unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(err.context(), "parsing JEL");
}

#[test]
fn bad_casts() {
    // Wrong element count.
    assert_eq!(parse_err(r#"["age"]"#), ErrorKind::InvalidInput);
    assert_eq!(parse_err(r#"["age", 1, 2]"#), ErrorKind::InvalidInput);
    // Composite field.
    assert_eq!(parse_err(r#"["profile", {"bio": "x"}]"#), ErrorKind::InvalidInput);
    // Undecodable value.
    assert_eq!(parse_err(r#"["age", "ten"]"#), ErrorKind::InvalidInput);
}

#[test]
fn composes_as_subexpression() {
    let filter = Jel::parse::<Person>(r#"["and", ["=", "name", ["name", "x"]], ["<", "age", 10]]"#)
        .unwrap();
    let built = Sql::compose(
        "select * from people where org = $1 and $2 limit $3",
        args![7_i64, filter, 20_i64],
    )
    .build()
    .unwrap();

    assert_eq!(
        built.sql,
        r#"select * from people where org = $1 and ("name" = $2) and ("age" < $3) limit $4"#
    );
    assert_eq!(format!("{:?}", built.params), r#"[7, "x", 10, 20]"#);
}

#[test]
fn from_value_matches_parse() {
    let value = serde_json::json!(["is null", "name"]);
    let jel = Jel::from_value::<Person>(&value).unwrap();
    let mut out = Builder::new();
    out.expr(&jel).unwrap();
    assert_eq!(out.to_sql(), r#""name" is null"#);
}
