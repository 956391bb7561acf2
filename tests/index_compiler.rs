//! Index Compiler Tests
//!
//! Tests for composite index compilation:
//! - Discriminator fields always come first
//! - ORDER BY fields precede WHERE fields
//! - A descending sort rewrites every field
//! - CONTAINS contributes the array and any nested condition fields

use std::sync::Arc;

use qryc::ast::{Expr, Operator, QueryAst, QueryFileAst, SelectAst, SortAst};
use qryc::compiler::IndexCompiler;
use qryc::model::{ModelManager, ModelRegistry};
use qryc::query::{QueryFile, QueryManager};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

const ASSET: &str = "org.acme.sample.SampleAsset";

fn sample_model() -> ModelManager {
    let mut manager = ModelManager::new();
    manager
        .add_model_json(
            "sample.json",
            &json!({
                "namespace": "org.acme.sample",
                "declarations": [
                    { "name": "SampleConcept", "kind": "concept", "properties": [
                        { "name": "value", "type": "String" }
                    ]},
                    { "name": "Meow", "kind": "concept", "properties": [
                        { "name": "woof", "type": "String" },
                        { "name": "tweet", "type": "String" }
                    ]},
                    { "name": "Neigh", "kind": "concept", "properties": [
                        { "name": "meow", "type": "Meow" }
                    ]},
                    { "name": "Moo", "kind": "concept", "properties": [
                        { "name": "neigh", "type": "Neigh" }
                    ]},
                    { "name": "Baa", "kind": "concept", "properties": [
                        { "name": "moo", "type": "Moo" }
                    ]},
                    { "name": "SampleAsset", "kind": "asset", "identifiedBy": "assetId", "properties": [
                        { "name": "assetId", "type": "String" },
                        { "name": "owner", "type": "SampleParticipant", "relationship": true },
                        { "name": "value", "type": "String" },
                        { "name": "foo", "type": "String" },
                        { "name": "bar", "type": "String" },
                        { "name": "baa", "type": "Baa" },
                        { "name": "noises", "type": "String", "array": true },
                        { "name": "meows", "type": "Meow", "array": true }
                    ]},
                    { "name": "SampleParticipant", "kind": "participant", "identifiedBy": "participantId", "properties": [
                        { "name": "participantId", "type": "String" },
                        { "name": "firstName", "type": "String" },
                        { "name": "lastName", "type": "String" }
                    ]},
                    { "name": "SampleTransaction", "kind": "transaction", "properties": [
                        { "name": "newValue", "type": "String" }
                    ]}
                ]
            })
            .to_string(),
        )
        .unwrap();
    manager
}

fn eq(left: Expr, right: Expr) -> Expr {
    Expr::binary(Operator::Eq, left, right)
}

fn contains(left: Expr, right: Expr) -> Expr {
    Expr::binary(Operator::Contains, left, right)
}

fn asset() -> SelectAst {
    SelectAst::resource(ASSET)
}

fn sample_queries() -> QueryFileAst {
    let queries = vec![
        QueryAst::new("Q1", asset().with_where(eq(Expr::ident("value"), Expr::literal("Green hat")))),
        QueryAst::new("Q2", asset()),
        QueryAst::new("Q3", asset().with_limit(Expr::literal(5))),
        QueryAst::new("Q4", asset().with_skip(Expr::literal(10))),
        QueryAst::new("Q5", asset().with_limit(Expr::literal(5)).with_skip(Expr::literal(10))),
        QueryAst::new("Q6", asset().with_limit(Expr::ident("_$mylimit"))),
        QueryAst::new("Q7", asset().with_skip(Expr::ident("_$myskip"))),
        QueryAst::new("Q8", asset().with_where(eq(Expr::ident("value"), Expr::ident("_$foo")))),
        QueryAst::new("Q9", asset().with_from("DogesSampleAssets")),
        QueryAst::new("Q10", SelectAst::resource("org.acme.sample.SampleParticipant")),
        QueryAst::new("Q11", SelectAst::resource("org.acme.sample.SampleTransaction")),
        QueryAst::new("Q12", asset().with_sort(SortAst::desc("foo"))),
        QueryAst::new(
            "Q13",
            asset().with_sort(SortAst::asc("foo")).with_sort(SortAst::asc("bar")),
        ),
        QueryAst::new(
            "Q14",
            asset().with_where(eq(
                Expr::path("baa.moo.neigh.meow.woof"),
                Expr::ident("_$animalNoise"),
            )),
        ),
        QueryAst::new("Q16", asset().with_where(contains(Expr::ident("noises"), Expr::literal("baa")))),
        QueryAst::new(
            "Q17",
            asset().with_where(contains(
                Expr::ident("noises"),
                Expr::array(vec![Expr::literal("baa"), Expr::literal("moo")]),
            )),
        ),
        QueryAst::new(
            "Q18",
            asset().with_where(contains(
                Expr::ident("meows"),
                eq(Expr::ident("woof"), Expr::literal("foo")),
            )),
        ),
        QueryAst::new(
            "Q19",
            asset().with_where(contains(
                Expr::ident("meows"),
                Expr::binary(
                    Operator::Or,
                    eq(Expr::ident("woof"), Expr::literal("foo")),
                    eq(Expr::ident("woof"), Expr::literal("noo")),
                ),
            )),
        ),
        QueryAst::new(
            "Q20",
            asset().with_where(contains(
                Expr::ident("meows"),
                Expr::binary(
                    Operator::Or,
                    eq(Expr::ident("woof"), Expr::literal("foo")),
                    eq(Expr::ident("tweet"), Expr::literal("bar")),
                ),
            )),
        ),
    ];
    QueryFileAst { queries }
}

fn sample_file() -> QueryFile {
    let registry: Arc<dyn ModelRegistry> = Arc::new(sample_model());
    let file = QueryFile::new("test.qry", registry, &sample_queries()).unwrap();
    file.validate().unwrap();
    file
}

fn compile(name: &str) -> Value {
    let file = sample_file();
    let query = file.query(name).unwrap();
    serde_json::to_value(IndexCompiler::new().compile(query).unwrap()).unwrap()
}

fn index(name: &str, fields: Value) -> Value {
    json!({
        "name": name,
        "ddoc": format!("{}Doc", name),
        "type": "json",
        "index": { "fields": fields }
    })
}

// =============================================================================
// Discriminator-only Tests
// =============================================================================

/// Queries without WHERE or ORDER BY index only the discriminators.
#[test]
fn test_no_conditions_yield_discriminators() {
    for name in ["Q2", "Q3", "Q4", "Q5", "Q6", "Q7", "Q9", "Q10", "Q11"] {
        assert_eq!(
            compile(name),
            index(name, json!(["\\$class", "\\$registryType", "\\$registryId"])),
            "query {}",
            name
        );
    }
}

// =============================================================================
// WHERE Tests
// =============================================================================

/// A single equality indexes the property name.
#[test]
fn test_where_literal() {
    assert_eq!(
        compile("Q1"),
        index("Q1", json!(["\\$class", "\\$registryType", "\\$registryId", "value"]))
    );
}

/// Parameters contribute nothing; the property they bind to does.
#[test]
fn test_where_parameter() {
    assert_eq!(
        compile("Q8"),
        index("Q8", json!(["\\$class", "\\$registryType", "\\$registryId", "value"]))
    );
}

/// Member paths are indexed as dotted names.
#[test]
fn test_where_nested_path() {
    assert_eq!(
        compile("Q14"),
        index(
            "Q14",
            json!(["\\$class", "\\$registryType", "\\$registryId", "baa.moo.neigh.meow.woof"])
        )
    );
}

// =============================================================================
// ORDER BY Tests
// =============================================================================

/// DESC rewrites every field, discriminators included.
#[test]
fn test_order_by_desc() {
    assert_eq!(
        compile("Q12"),
        index(
            "Q12",
            json!([
                { "\\$class": "desc" },
                { "\\$registryType": "desc" },
                { "\\$registryId": "desc" },
                { "foo": "desc" }
            ])
        )
    );
}

/// ASC keeps the discriminators as plain strings.
#[test]
fn test_order_by_asc() {
    assert_eq!(
        compile("Q13"),
        index(
            "Q13",
            json!(["\\$class", "\\$registryType", "\\$registryId", { "foo": "asc" }, { "bar": "asc" }])
        )
    );
}

/// A WHERE property repeated from ORDER BY keeps its ORDER BY position.
#[test]
fn test_order_by_precedes_where() {
    let registry: Arc<dyn ModelRegistry> = Arc::new(sample_model());
    let ast = QueryFileAst {
        queries: vec![QueryAst::new(
            "Q1",
            asset()
                .with_where(Expr::binary(
                    Operator::And,
                    eq(Expr::ident("bar"), Expr::ident("_$bar")),
                    eq(Expr::ident("foo"), Expr::literal("x")),
                ))
                .with_sort(SortAst::desc("foo")),
        )],
    };
    let file = QueryFile::new("test.qry", registry, &ast).unwrap();
    file.validate().unwrap();

    let compiled = IndexCompiler::new().compile(&file.queries()[0]).unwrap();
    assert_eq!(
        serde_json::to_value(compiled.index.fields).unwrap(),
        json!([
            { "\\$class": "desc" },
            { "\\$registryType": "desc" },
            { "\\$registryId": "desc" },
            { "foo": "desc" },
            { "bar": "desc" }
        ])
    );
}

// =============================================================================
// CONTAINS Tests
// =============================================================================

/// CONTAINS against values indexes the array property.
#[test]
fn test_contains_values() {
    let expected = json!(["\\$class", "\\$registryType", "\\$registryId", "noises"]);
    assert_eq!(compile("Q16"), index("Q16", expected.clone()));
    assert_eq!(compile("Q17"), index("Q17", expected));
}

/// CONTAINS with a nested condition adds the condition's fields once each.
#[test]
fn test_contains_nested_condition() {
    assert_eq!(
        compile("Q18"),
        index("Q18", json!(["\\$class", "\\$registryType", "\\$registryId", "meows", "woof"]))
    );
    assert_eq!(
        compile("Q19"),
        index("Q19", json!(["\\$class", "\\$registryType", "\\$registryId", "meows", "woof"]))
    );
    assert_eq!(
        compile("Q20"),
        index(
            "Q20",
            json!(["\\$class", "\\$registryType", "\\$registryId", "meows", "woof", "tweet"])
        )
    );
}

// =============================================================================
// File and Manager Tests
// =============================================================================

/// Compiling twice yields identical output.
#[test]
fn test_compile_deterministic() {
    let file = sample_file();
    let compiler = IndexCompiler::new();

    let first = serde_json::to_string(&compiler.compile_file(&file).unwrap()).unwrap();
    let second = serde_json::to_string(&compiler.compile_file(&file).unwrap()).unwrap();
    assert_eq!(first, second);
}

/// One index per query, in declaration order.
#[test]
fn test_compile_file_order() {
    let file = sample_file();
    let indexes = IndexCompiler::new().compile_file(&file).unwrap();

    let names: Vec<&str> = indexes.iter().map(|i| i.name.as_str()).collect();
    let declared: Vec<&str> = file.queries().iter().map(|q| q.name()).collect();
    assert_eq!(names, declared);
}

/// A manager without a query file compiles to nothing.
#[test]
fn test_compile_manager() {
    let registry: Arc<dyn ModelRegistry> = Arc::new(sample_model());
    let mut manager = QueryManager::new(registry.clone());
    assert!(IndexCompiler::new().compile_manager(&manager).unwrap().is_empty());

    manager
        .set_query_file(QueryFile::new("test.qry", registry, &sample_queries()).unwrap())
        .unwrap();
    assert_eq!(
        IndexCompiler::new().compile_manager(&manager).unwrap().len(),
        sample_queries().queries.len()
    );
}
