use super::*;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};
use base64::Engine;
use poem::error::ResponseError;
use poem::http::StatusCode;
use std::sync::Arc;
use strum::IntoEnumIterator;

// Small library graph: books have one author and many reviews, reviews point back at their book.

static AUTHOR_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::scalar("id", "id", SemanticType::Uuid),
    FieldDescriptor::scalar("name", "name", SemanticType::Text),
    FieldDescriptor::collection(
        "books",
        &BOOKS,
        Join {
            local: "id",
            remote: "author_id",
        },
    ),
];

static AUTHORS: EntityDescriptor = EntityDescriptor {
    name: "Author",
    table: "authors",
    fields: &AUTHOR_FIELDS,
};

static BOOK_FIELDS: [FieldDescriptor; 9] = [
    FieldDescriptor::scalar("id", "id", SemanticType::Uuid),
    FieldDescriptor::scalar("title", "title", SemanticType::Text),
    FieldDescriptor::scalar("pages", "pages", SemanticType::Integer),
    FieldDescriptor::scalar("price", "price", SemanticType::Real),
    FieldDescriptor::scalar("in_print", "in_print", SemanticType::Boolean),
    FieldDescriptor::scalar("published_at", "published_at_ns", SemanticType::Timestamp),
    FieldDescriptor::scalar("genre", "genre", SemanticType::Enum("genre")),
    FieldDescriptor::object(
        "author",
        &AUTHORS,
        Join {
            local: "author_id",
            remote: "id",
        },
    ),
    FieldDescriptor::collection(
        "reviews",
        &REVIEWS,
        Join {
            local: "id",
            remote: "book_id",
        },
    ),
];

static BOOKS: EntityDescriptor = EntityDescriptor {
    name: "Book",
    table: "books",
    fields: &BOOK_FIELDS,
};

static REVIEW_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::scalar("stars", "stars", SemanticType::Integer),
    FieldDescriptor::scalar("body", "body", SemanticType::Text),
    FieldDescriptor::object(
        "book",
        &BOOKS,
        Join {
            local: "book_id",
            remote: "id",
        },
    ),
];

static REVIEWS: EntityDescriptor = EntityDescriptor {
    name: "Review",
    table: "reviews",
    fields: &REVIEW_FIELDS,
};

#[derive(Debug, Clone, PartialEq)]
struct Books;

impl Entity for Books {
    fn descriptor() -> &'static EntityDescriptor {
        &BOOKS
    }
}

fn registry_without(skip: Option<SemanticType>) -> StrategyRegistry {
    let keep = |leaf_type: SemanticType| skip != Some(leaf_type);
    let mut builder = StrategyRegistry::builder();
    if keep(SemanticType::Text) {
        builder = builder.register(TextStrategy);
    }
    if keep(SemanticType::Integer) {
        builder = builder.register(IntegerStrategy);
    }
    if keep(SemanticType::Real) {
        builder = builder.register(RealStrategy);
    }
    if keep(SemanticType::Boolean) {
        builder = builder.register(BooleanStrategy);
    }
    if keep(SemanticType::Timestamp) {
        builder = builder.register(TimestampStrategy);
    }
    if keep(SemanticType::Uuid) {
        builder = builder.register(UuidStrategy);
    }
    if keep(SemanticType::Enum("genre")) {
        builder = builder.register(EnumStrategy::new("genre", &["fiction", "poetry"]));
    }
    builder.build()
}

fn compiler() -> PredicateCompiler {
    PredicateCompiler::new(Arc::new(registry_without(None)))
}

fn search(json: &str) -> Search<Books> {
    decode_search_json(json.as_bytes()).unwrap()
}

fn compile(json: &str) -> Result<Predicate, SearchError> {
    compiler().compile(&search(json))
}

fn sql(json: &str) -> SqlFragment {
    build_sql(&compile(json).unwrap())
}

fn field(member: &str) -> FieldRef {
    match resolve(member, &BOOKS).unwrap() {
        ResolvedPath::Leaf(field) => field,
        other => panic!("expected a leaf for {}, got {:?}", member, other),
    }
}

// ---- wire format ----

#[test]
fn test_decode_deduces_variant_from_keys() {
    let parsed = search(
        r#"{"filters":[
            {"member":"title","operator":"eq","values":["Dune"]},
            {"or":[{"member":"pages","operator":"gt","values":["100"]}]},
            {"and":[]}
        ]}"#,
    );
    assert_eq!(parsed.filters.len(), 3);
    assert_eq!(
        parsed.filters[0],
        SearchOperator::filter("title", SearchFilterOperator::Equals, ["Dune"])
    );
    assert!(matches!(&parsed.filters[1], SearchOperator::Or(group) if group.or.len() == 1));
    assert!(matches!(&parsed.filters[2], SearchOperator::And(group) if group.and.is_empty()));
}

#[test]
fn test_decode_defaults() {
    assert!(search(r#"{}"#).is_empty());

    let parsed = search(r#"{"filters":[{"member":"title","operator":"set"}]}"#);
    match &parsed.filters[0] {
        SearchOperator::Filtering(filter) => assert!(filter.values.is_empty()),
        other => panic!("expected a filter, got {:?}", other),
    }
}

#[test]
fn test_decode_rejects_malformed_documents() {
    let cases = [
        r#"{"filters":[{"member":"title","operator":"like","values":["x"]}]}"#,
        r#"{"filters":[{"operator":"eq","values":["x"]}]}"#,
        r#"{"filters":[{"member":"title","operator":"eq","value":["x"]}]}"#,
        r#"{"filters":[{"member":"title","operator":"eq","values":[1]}]}"#,
        r#"{"filters":[{"member":"title","operator":"eq","or":[]}]}"#,
        r#"{"filters":["title"]}"#,
        r#"{"filter":[]}"#,
        r#"[1, 2]"#,
    ];
    for json in cases {
        let result = decode_search_json::<Books>(json.as_bytes());
        assert!(
            matches!(result, Err(SearchError::MalformedPayload(_))),
            "expected malformed payload for {}, got {:?}",
            json,
            result
        );
    }
}

#[test]
fn test_operator_tokens_agree_between_serde_and_strum() {
    for op in SearchFilterOperator::iter() {
        let token = op.to_string();
        assert_eq!(serde_json::to_string(&op).unwrap(), format!("\"{}\"", token));
        assert_eq!(token.parse::<SearchFilterOperator>().unwrap(), op);
    }
    assert_eq!(SearchFilterOperator::NotEquals.to_string(), "notEquals");
    assert_eq!(SearchFilterOperator::NotSet.to_string(), "notSet");
    assert!(SearchFilterOperator::Set.ignores_values());
    assert!(SearchFilterOperator::LessThan.is_ordering());
    assert!(!SearchFilterOperator::Between.is_ordering());
}

#[test]
fn test_decode_param_accepts_json_and_base64() {
    let json = r#"{"filters":[{"member":"title","operator":"contains","values":[">>>"]}]}"#;
    let expected = search(json);

    assert_eq!(decode_search_param::<Books>(json).unwrap(), expected);
    assert_eq!(decode_search_param::<Books>(&format!("  {}  ", json)).unwrap(), expected);

    let standard = STANDARD.encode(json);
    assert!(standard.contains('+'));
    assert_eq!(decode_search_param::<Books>(&standard).unwrap(), expected);
    // unencoded '+' turns into a space in query strings
    assert_eq!(
        decode_search_param::<Books>(&standard.replace('+', " ")).unwrap(),
        expected
    );

    let unpadded = STANDARD_NO_PAD.encode(json);
    assert!(unpadded.contains('+') && unpadded.len() % 4 != 0);
    assert_eq!(decode_search_param::<Books>(&unpadded).unwrap(), expected);
    assert_eq!(
        decode_search_param::<Books>(&unpadded.replace('+', " ")).unwrap(),
        expected
    );
    assert_eq!(decode_search_param::<Books>(&URL_SAFE.encode(json)).unwrap(), expected);

    let encoded = encode_search_param(&expected).unwrap();
    assert!(!encoded.contains('='));
    assert_eq!(decode_search_param::<Books>(&encoded).unwrap(), expected);
}

#[test]
fn test_decode_param_rejects_garbage() {
    assert!(matches!(
        decode_search_param::<Books>("not base64 at all!"),
        Err(SearchError::MalformedPayload(_))
    ));
    let encoded_non_json = STANDARD.encode("hello");
    assert!(matches!(
        decode_search_param::<Books>(&encoded_non_json),
        Err(SearchError::MalformedPayload(_))
    ));
    let too_long = "A".repeat(MAX_SEARCH_PARAM_LEN + 1);
    assert!(matches!(
        decode_search_param::<Books>(&too_long),
        Err(SearchError::MalformedPayload(msg)) if msg.contains("too long")
    ));
}

#[test]
fn test_decode_value() {
    let value = serde_json::json!({"filters":[{"member":"pages","operator":"lt","values":["10"]}]});
    let parsed = decode_search_value::<Books>(value).unwrap();
    assert_eq!(parsed.filters.len(), 1);
    assert!(decode_search_value::<Books>(serde_json::json!("text")).is_err());
}

// ---- path resolution ----

#[test]
fn test_resolve_scalar_on_root() {
    let field = field("title");
    assert!(field.hops.is_empty());
    assert_eq!(field.column, "title");
    assert_eq!(field.semantic_type, SemanticType::Text);
    assert!(!field.is_quantified());
}

#[test]
fn test_resolve_maps_field_name_to_column() {
    let field = field("published_at");
    assert_eq!(field.column, "published_at_ns");
    assert_eq!(field.path, "published_at");
}

#[test]
fn test_resolve_object_and_collection_hops() {
    let author = field("author.name");
    assert_eq!(author.hops.len(), 1);
    assert_eq!(author.hops[0].cardinality, Cardinality::One);
    assert_eq!(author.hops[0].table, "authors");
    assert!(!author.is_quantified());

    let review = field("reviews.book.title");
    let cardinalities: Vec<_> = review.hops.iter().map(|h| h.cardinality).collect();
    assert_eq!(cardinalities, vec![Cardinality::Many, Cardinality::One]);
    assert!(review.is_quantified());
}

#[test]
fn test_resolve_relation_path() {
    match resolve("author", &BOOKS).unwrap() {
        ResolvedPath::Relation(relation) => {
            assert_eq!(relation.path, "author");
            assert_eq!(relation.hops.len(), 1);
        }
        other => panic!("expected a relation, got {:?}", other),
    }
}

#[test]
fn test_resolve_errors() {
    assert_eq!(
        resolve("isbn", &BOOKS).unwrap_err(),
        SearchError::FieldNotFound {
            member: "isbn".to_string(),
            segment: "isbn".to_string(),
            entity: "Book",
        }
    );
    assert_eq!(
        resolve("author.email", &BOOKS).unwrap_err(),
        SearchError::FieldNotFound {
            member: "author.email".to_string(),
            segment: "email".to_string(),
            entity: "Author",
        }
    );
    assert!(matches!(
        resolve("title.length", &BOOKS),
        Err(SearchError::InvalidPath { .. })
    ));
    assert_eq!(
        resolve("reviews.book.reviews.stars", &BOOKS).unwrap_err(),
        SearchError::NestedCollection {
            member: "reviews.book.reviews.stars".to_string(),
            segment: "reviews".to_string(),
        }
    );
    assert!(matches!(
        resolve("author.books.reviews", &BOOKS),
        Err(SearchError::NestedCollection { .. })
    ));
}

#[test]
fn test_resolve_rejects_malformed_paths() {
    let long_path = vec!["author"; MAX_PATH_SEGMENTS + 1].join(".");
    for member in ["", "  ", "author..name", ".title", "title.", "ti tle", "1title", "title;--", long_path.as_str()] {
        assert!(
            matches!(resolve(member, &BOOKS), Err(SearchError::InvalidPath { .. })),
            "expected invalid path for {:?}",
            member
        );
    }
}

// ---- strategies ----

#[test]
fn test_numeric_conversions() {
    assert_eq!(IntegerStrategy.convert("pages", " 42 "), Ok(SqlValue::Integer(42)));
    assert!(matches!(
        IntegerStrategy.convert("pages", "4.2"),
        Err(SearchError::InvalidValue { .. })
    ));
    assert_eq!(RealStrategy.convert("price", "9.5"), Ok(SqlValue::Float(9.5)));
    assert!(RealStrategy.convert("price", "NaN").is_err());
    assert!(RealStrategy.convert("price", "inf").is_err());
}

#[test]
fn test_boolean_conversion() {
    assert_eq!(BooleanStrategy.convert("in_print", "True"), Ok(SqlValue::Bool(true)));
    assert_eq!(BooleanStrategy.convert("in_print", "false"), Ok(SqlValue::Bool(false)));
    assert!(BooleanStrategy.convert("in_print", "yes").is_err());
}

#[test]
fn test_timestamp_conversion() {
    assert_eq!(
        TimestampStrategy.convert("published_at", "2024-01-01T00:00:00Z"),
        Ok(SqlValue::Integer(1_704_067_200_000_000_000))
    );
    assert_eq!(
        TimestampStrategy.convert("published_at", "2024-01-01T00:00:00+01:00"),
        Ok(SqlValue::Integer(1_704_063_600_000_000_000))
    );
    assert_eq!(
        TimestampStrategy.convert("published_at", "1700000000000000000"),
        Ok(SqlValue::Integer(1_700_000_000_000_000_000))
    );
    assert!(TimestampStrategy.convert("published_at", "yesterday").is_err());
}

#[test]
fn test_uuid_conversion_normalizes() {
    assert_eq!(
        UuidStrategy.convert("id", "67E55044-10B1-426F-9247-BB680E5FE0C8"),
        Ok(SqlValue::String("67e55044-10b1-426f-9247-bb680e5fe0c8".to_string()))
    );
    assert!(UuidStrategy.convert("id", "67e55044").is_err());
}

#[test]
fn test_enum_conversion() {
    let strategy = EnumStrategy::new("genre", &["fiction", "poetry"]);
    assert_eq!(strategy.leaf_type(), SemanticType::Enum("genre"));
    assert_eq!(strategy.convert("genre", "poetry"), Ok(SqlValue::String("poetry".to_string())));

    let err = strategy.convert("genre", "Poetry").unwrap_err();
    assert!(err.to_string().contains("fiction, poetry"), "{}", err);
}

#[test]
fn test_unsupported_operators() {
    assert_eq!(
        compile(r#"{"filters":[{"member":"pages","operator":"contains","values":["1"]}]}"#).unwrap_err(),
        SearchError::UnsupportedOperator {
            member: "pages".to_string(),
            operator: SearchFilterOperator::Contains,
            leaf_type: SemanticType::Integer,
        }
    );
    for op in ["gt", "between", "contains"] {
        let json = format!(
            r#"{{"filters":[{{"member":"in_print","operator":"{}","values":["true","false"]}}]}}"#,
            op
        );
        assert!(matches!(
            compile(&json),
            Err(SearchError::UnsupportedOperator { .. })
        ));
    }
    assert!(matches!(
        compile(r#"{"filters":[{"member":"genre","operator":"lt","values":["poetry"]}]}"#),
        Err(SearchError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_value_counts() {
    let between_one = compile(r#"{"filters":[{"member":"pages","operator":"between","values":["1"]}]}"#);
    assert_eq!(
        between_one.unwrap_err(),
        SearchError::InvalidValueCount {
            member: "pages".to_string(),
            operator: SearchFilterOperator::Between,
            expected: "exactly 2 values",
            actual: 1,
        }
    );
    assert!(compile(r#"{"filters":[{"member":"pages","operator":"between","values":["1","2","3"]}]}"#).is_err());
    assert!(compile(r#"{"filters":[{"member":"title","operator":"eq"}]}"#).is_err());
    assert!(compile(r#"{"filters":[{"member":"title","operator":"in","values":[]}]}"#).is_err());
    assert!(compile(r#"{"filters":[{"member":"title","operator":"set","values":["ignored"]}]}"#).is_ok());
}

#[test]
fn test_single_value_operators_read_first_value() {
    let predicate =
        compile(r#"{"filters":[{"member":"title","operator":"eq","values":["Dune","Emma"]}]}"#)
            .unwrap();
    match predicate {
        Predicate::Leaf(leaf) => assert_eq!(
            leaf.condition,
            Condition::Compare(CompareOp::Eq, SqlValue::String("Dune".to_string()))
        ),
        other => panic!("expected a leaf, got {:?}", other),
    }
}

#[test]
fn test_invalid_value_reports_member() {
    let err = compile(r#"{"filters":[{"member":"reviews.stars","operator":"in","values":["5","five"]}]}"#)
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::InvalidValue {
            member: "reviews.stars".to_string(),
            value: "five".to_string(),
            expected: "integer".to_string(),
        }
    );
    assert_eq!(err.member(), Some("reviews.stars"));
}

// ---- compiler ----

#[test]
fn test_compile_empty_search_is_true() {
    assert_eq!(compile(r#"{"filters":[]}"#).unwrap(), Predicate::True);
    assert_eq!(compiler().compile(&Search::<Books>::default()).unwrap(), Predicate::True);
    assert_eq!(compile(r#"{"filters":[{"or":[]},{"and":[]}]}"#).unwrap(), Predicate::True);
}

#[test]
fn test_compile_filters_with_combinator() {
    let filters = vec![SearchOperator::<Books>::filter(
        "title",
        SearchFilterOperator::Equals,
        ["Dune"],
    )];
    let compiler = compiler();

    let single = compiler.compile_filters(&filters, &BOOKS, Combinator::Or).unwrap();
    assert!(matches!(single, Predicate::Leaf(_)));

    let empty = compiler
        .compile_filters::<Books>(&[], &BOOKS, Combinator::Or)
        .unwrap();
    assert_eq!(empty, Predicate::True);
}

#[test]
fn test_compile_preserves_nested_structure() {
    let predicate = compile(
        r#"{"filters":[
            {"member":"title","operator":"contains","values":["war"]},
            {"or":[
                {"member":"pages","operator":"gt","values":["500"]},
                {"and":[
                    {"member":"genre","operator":"eq","values":["poetry"]},
                    {"member":"in_print","operator":"eq","values":["true"]}
                ]}
            ]},
            {"member":"price","operator":"lte","values":["20"]}
        ]}"#,
    )
    .unwrap();

    let Predicate::And(items) = &predicate else {
        panic!("expected AND at the root, got {:?}", predicate);
    };
    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0], Predicate::Leaf(_)));
    assert!(matches!(&items[2], Predicate::Leaf(_)));
    let Predicate::Or(alternatives) = &items[1] else {
        panic!("expected OR in the middle, got {:?}", items[1]);
    };
    assert!(matches!(&alternatives[0], Predicate::Leaf(_)));
    assert!(matches!(&alternatives[1], Predicate::And(inner) if inner.len() == 2));
    assert_eq!(predicate.condition_count(), 5);
}

#[test]
fn test_compile_keeps_siblings_of_logical_groups() {
    // every sibling contributes, no later group replaces earlier ones
    let predicate = compile(
        r#"{"filters":[
            {"member":"title","operator":"eq","values":["A"]},
            {"or":[{"member":"pages","operator":"eq","values":["1"]},{"member":"pages","operator":"eq","values":["2"]}]},
            {"or":[{"member":"price","operator":"eq","values":["1"]},{"member":"price","operator":"eq","values":["2"]}]}
        ]}"#,
    )
    .unwrap();
    assert_eq!(predicate.condition_count(), 5);
    assert!(matches!(&predicate, Predicate::And(items) if items.len() == 3));
}

#[test]
fn test_compile_unknown_field_fails_whole_search() {
    let err = compile(
        r#"{"filters":[
            {"member":"title","operator":"eq","values":["A"]},
            {"or":[{"member":"isbn","operator":"eq","values":["1"]}]}
        ]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, SearchError::FieldNotFound { ref segment, .. } if segment == "isbn"));
    assert!(err.is_client_error());
}

#[test]
fn test_compile_unregistered_type_is_server_error() {
    let compiler = PredicateCompiler::new(Arc::new(registry_without(Some(SemanticType::Boolean))));
    let err = compiler
        .compile(&search(r#"{"filters":[{"member":"in_print","operator":"eq","values":["true"]}]}"#))
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::UnregisteredType {
            member: "in_print".to_string(),
            leaf_type: SemanticType::Boolean,
        }
    );
    assert!(!err.is_client_error());
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_compile_relation_presence() {
    let predicate = compile(r#"{"filters":[{"member":"reviews","operator":"notSet"}]}"#).unwrap();
    assert!(matches!(predicate, Predicate::Related { present: false, .. }));

    let err = compile(r#"{"filters":[{"member":"author","operator":"eq","values":["x"]}]}"#)
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidPath { .. }));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_compile_is_deterministic() {
    let json = r#"{"filters":[{"or":[
        {"member":"reviews.stars","operator":"gte","values":["4"]},
        {"member":"author.name","operator":"contains","values":["an"]}
    ]}]}"#;
    assert_eq!(compile(json).unwrap(), compile(json).unwrap());
    assert_eq!(sql(json), sql(json));
}

#[test]
fn test_predicate_fold() {
    let leaf = compile(r#"{"filters":[{"member":"title","operator":"set"}]}"#).unwrap();

    assert_eq!(
        Predicate::fold(Combinator::And, vec![Predicate::True, leaf.clone()]),
        leaf
    );
    assert_eq!(
        Predicate::fold(Combinator::Or, vec![leaf.clone(), Predicate::True]),
        Predicate::True
    );
    assert_eq!(
        Predicate::fold(Combinator::Or, vec![leaf.clone(), leaf.clone()]),
        Predicate::Or(vec![leaf.clone(), leaf])
    );
    assert_eq!(Predicate::fold(Combinator::And, vec![]), Predicate::True);
}

// ---- SQL rendering ----

#[test]
fn test_sql_true() {
    let fragment = build_sql(&Predicate::True);
    assert_eq!(fragment.sql, "1 = 1");
    assert!(fragment.binds.is_empty());
}

#[test]
fn test_sql_scalar_conditions() {
    let fragment = sql(r#"{"filters":[{"member":"title","operator":"notEquals","values":["Dune"]}]}"#);
    assert_eq!(fragment.sql, "t0.title IS NOT ?");
    assert_eq!(fragment.binds, vec![SqlValue::String("Dune".to_string())]);

    let fragment = sql(r#"{"filters":[{"member":"pages","operator":"in","values":["1","2"]}]}"#);
    assert_eq!(fragment.sql, "t0.pages IN (?, ?)");
    assert_eq!(fragment.binds, vec![SqlValue::Integer(1), SqlValue::Integer(2)]);

    let fragment = sql(r#"{"filters":[{"member":"price","operator":"between","values":["1.5","3"]}]}"#);
    assert_eq!(fragment.sql, "t0.price BETWEEN ? AND ?");
    assert_eq!(fragment.binds, vec![SqlValue::Float(1.5), SqlValue::Float(3.0)]);

    let fragment = sql(r#"{"filters":[{"member":"published_at","operator":"notSet"}]}"#);
    assert_eq!(fragment.sql, "t0.published_at_ns IS NULL");
    assert!(fragment.binds.is_empty());
}

#[test]
fn test_sql_contains_escapes_wildcards() {
    let fragment = sql(r#"{"filters":[{"member":"title","operator":"contains","values":["50%_off\\"]}]}"#);
    assert_eq!(fragment.sql, "t0.title LIKE ? ESCAPE '\\'");
    assert_eq!(
        fragment.binds,
        vec![SqlValue::String("%50\\%\\_off\\\\%".to_string())]
    );
}

#[test]
fn test_sql_object_path_uses_scalar_subquery() {
    let fragment = sql(r#"{"filters":[{"member":"author.name","operator":"eq","values":["Ann"]}]}"#);
    assert_eq!(
        fragment.sql,
        "(SELECT t1.name FROM authors t1 WHERE t1.id = t0.author_id) = ?"
    );
}

#[test]
fn test_sql_collection_path_uses_exists() {
    let fragment = sql(r#"{"filters":[{"member":"reviews.stars","operator":"gte","values":["4"]}]}"#);
    assert_eq!(
        fragment.sql,
        "EXISTS (SELECT 1 FROM reviews t1 WHERE t1.book_id = t0.id AND t1.stars >= ?)"
    );

    let fragment = sql(r#"{"filters":[{"member":"reviews.book.title","operator":"eq","values":["Dune"]}]}"#);
    assert_eq!(
        fragment.sql,
        "EXISTS (SELECT 1 FROM reviews t1 LEFT JOIN books t2 ON t2.id = t1.book_id WHERE t1.book_id = t0.id AND t2.title = ?)"
    );
}

#[test]
fn test_sql_relation_presence() {
    let fragment = sql(r#"{"filters":[{"member":"author","operator":"notSet"}]}"#);
    assert_eq!(
        fragment.sql,
        "NOT EXISTS (SELECT 1 FROM authors t1 WHERE t1.id = t0.author_id)"
    );
    let fragment = sql(r#"{"filters":[{"member":"reviews","operator":"set"}]}"#);
    assert_eq!(
        fragment.sql,
        "EXISTS (SELECT 1 FROM reviews t1 WHERE t1.book_id = t0.id)"
    );
    let fragment = sql(r#"{"filters":[{"member":"reviews.book.author","operator":"set"}]}"#);
    assert_eq!(
        fragment.sql,
        "EXISTS (SELECT 1 FROM reviews t1 JOIN books t2 ON t2.id = t1.book_id JOIN authors t3 ON t3.id = t2.author_id WHERE t1.book_id = t0.id)"
    );
}

#[test]
fn test_sql_groups_bind_in_text_order() {
    let fragment = sql(
        r#"{"filters":[
            {"member":"pages","operator":"gt","values":["100"]},
            {"or":[
                {"member":"reviews.stars","operator":"gte","values":["4"]},
                {"member":"author.name","operator":"eq","values":["Ann"]}
            ]}
        ]}"#,
    );
    assert_eq!(
        fragment.sql,
        "(t0.pages > ? AND (EXISTS (SELECT 1 FROM reviews t1 WHERE t1.book_id = t0.id AND t1.stars >= ?) OR (SELECT t2.name FROM authors t2 WHERE t2.id = t0.author_id) = ?))"
    );
    assert_eq!(
        fragment.binds,
        vec![
            SqlValue::Integer(100),
            SqlValue::Integer(4),
            SqlValue::String("Ann".to_string())
        ]
    );
}

// ---- registry ----

#[test]
fn test_registry_lookup() {
    let registry = registry_without(None);
    assert_eq!(registry.len(), 7);
    assert!(registry.contains(SemanticType::Enum("genre")));
    assert!(!registry.contains(SemanticType::Enum("colour")));
    assert!(matches!(
        registry.get(SemanticType::Enum("colour"), "colour"),
        Err(SearchError::UnregisteredType { .. })
    ));
    assert!(StrategyRegistry::default().is_empty());
}

#[test]
fn test_registry_later_registration_wins() {
    let registry = StrategyRegistry::builder()
        .register(EnumStrategy::new("genre", &["fiction"]))
        .register(EnumStrategy::new("genre", &["poetry"]))
        .build();
    assert_eq!(registry.len(), 1);
    let strategy = registry.get(SemanticType::Enum("genre"), "genre").unwrap();
    assert!(strategy.convert("genre", "poetry").is_ok());
    assert!(strategy.convert("genre", "fiction").is_err());
}

#[test]
fn test_validate_entity() {
    registry_without(None).validate_entity(&BOOKS).unwrap();
    registry_without(None).validate_entity(&AUTHORS).unwrap();

    assert_eq!(
        registry_without(Some(SemanticType::Enum("genre")))
            .validate_entity(&BOOKS)
            .unwrap_err(),
        SearchError::UnregisteredType {
            member: "genre".to_string(),
            leaf_type: SemanticType::Enum("genre"),
        }
    );
    // genre is reached from authors only through the books collection
    assert_eq!(
        registry_without(Some(SemanticType::Enum("genre")))
            .validate_entity(&AUTHORS)
            .unwrap_err()
            .member(),
        Some("books.genre")
    );
}

#[test]
fn test_error_status_codes() {
    let err = SearchError::MalformedPayload("x".to_string());
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.member(), None);
}
