use super::*;
use crate::sql::Sql;
use crate::{args, ErrorKind};

struct Address;

impl Schema for Address {
    fn describe() -> SchemaDesc {
        SchemaDesc::new(
            "Address",
            vec![
                FieldDesc::scalar::<String>("city", "city"),
                FieldDesc::scalar::<Option<String>>("zipCode", "zip_code"),
            ],
        )
    }
}

struct User;

impl Schema for User {
    fn describe() -> SchemaDesc {
        SchemaDesc::new(
            "User",
            vec![
                FieldDesc::scalar::<i64>("id", "id"),
                FieldDesc::scalar::<String>("name", "display_name"),
                FieldDesc::nested::<Address>("address", "address"),
            ],
        )
    }
}

#[test]
fn schema_is_cached_per_type() {
    let a = User::schema();
    let b = User::schema();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.type_name, "User");
    assert!(!Arc::ptr_eq(&Address::schema(), &a));
}

#[test]
fn resolves_top_level_and_nested_paths() {
    let schema = User::schema();

    let name = schema.resolve("name").unwrap();
    assert_eq!(name.columns, vec!["display_name"]);
    assert_eq!(name.to_sql(), r#""display_name""#);
    assert!(name.decode.is_some());
    assert!(!name.is_nested());

    let zip = schema.resolve("address.zipCode").unwrap();
    assert_eq!(zip.to_sql(), r#"("address")."zip_code""#);
    assert!(zip.is_nested());
    assert!(zip.decode.is_some());

    let address = schema.resolve("address").unwrap();
    assert_eq!(address.to_sql(), r#""address""#);
    assert!(address.decode.is_none());
}

#[test]
fn unknown_paths_are_rejected() {
    let schema = User::schema();
    for path in ["nope", "address.nope", "id.more", "", "address."] {
        let err = schema.resolve(path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownField, "{path}");
    }
    // Columns are not external names.
    assert!(schema.resolve("display_name").is_err());
}

#[test]
fn decode_uses_declared_type() {
    let schema = User::schema();
    let id = schema.resolve("id").unwrap();
    let decode = id.decode.unwrap();

    let param = decode(&serde_json::json!(42)).unwrap();
    assert_eq!(format!("{param:?}"), "42");

    let err = decode(&serde_json::json!("forty-two")).unwrap_err();
    assert!(err.is_invalid_input());

    let zip = schema.resolve("address.zipCode").unwrap();
    let param = (zip.decode.unwrap())(&serde_json::Value::Null).unwrap();
    assert_eq!(format!("{param:?}"), "None");
}

#[test]
fn column_lists() {
    let schema = User::schema();
    assert_eq!(schema.columns(), r#""id", "display_name", "address""#);
    assert_eq!(
        schema.deep_columns(),
        r#""id", "display_name", ("address")."city" as "address.city", ("address")."zip_code" as "address.zip_code""#
    );
    // Memoized.
    assert!(std::ptr::eq(schema.columns(), schema.columns()));
}

#[test]
fn cols_expression() {
    let built = Sql::compose("select $1 from users where id = $2", args![Cols::of::<User>(), 1_i64])
        .build()
        .unwrap();
    assert_eq!(
        built.sql,
        r#"select "id", "display_name", "address" from users where id = $1"#
    );

    let built = Sql::compose("select $1 from users", args![Cols::deep::<Address>()])
        .build()
        .unwrap();
    assert_eq!(built.sql, r#"select "city", "zip_code" from users"#);
}
