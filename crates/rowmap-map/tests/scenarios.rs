//! End-to-end mapping behaviour for a simple result type.

use rowmap_ingest::MemoryCursor;
use rowmap_map::{
    BindingCause, CommandId, DeclaredProperties, MapTarget, MappingError, MappingRuleSet,
    ProjectorCache, PropertyDescriptor, map,
};
use rowmap_model::{Value, ValueKind};

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    name: String,
    age: i32,
}

impl MapTarget for Person {
    fn properties() -> Vec<PropertyDescriptor<Self>> {
        vec![
            PropertyDescriptor::field("Name", |p: &Person| p.name.clone(), |p, v| p.name = v),
            PropertyDescriptor::field("Age", |p: &Person| p.age, |p, v| p.age = v),
        ]
    }
}

fn person(name: &str, age: i32) -> Person {
    Person {
        name: name.to_string(),
        age,
    }
}

fn alice_row(age: Value) -> MemoryCursor {
    MemoryCursor::new(
        ["Name", "Age", "Extra"],
        vec![vec![Value::text("Alice"), age, Value::text("x")]],
    )
}

/// Every message in the source chain, outermost first.
fn error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut messages = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages
}

fn run(rules: &MappingRuleSet<Person>, cursor: MemoryCursor) -> Result<Vec<Person>, MappingError> {
    let cache = ProjectorCache::new();
    let projector = cache
        .compile_or_fetch(rules, &CommandId::new("people"))
        .expect("compile");
    map(cursor, &projector)
}

#[test]
fn default_rules_map_matching_columns_and_ignore_extras() {
    let rules = MappingRuleSet::<Person>::from_extractor(&DeclaredProperties).expect("rules");
    let people = run(&rules, alice_row(Value::Int(30))).expect("map");
    assert_eq!(people, vec![person("Alice", 30)]);
}

#[test]
fn null_value_leaves_default() {
    let rules = MappingRuleSet::<Person>::from_extractor(&DeclaredProperties).expect("rules");
    let people = run(&rules, alice_row(Value::Null)).expect("map");
    assert_eq!(people, vec![person("Alice", 0)]);
}

#[test]
fn alias_without_matching_column_leaves_default() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Age", |rule| {
            rule.set_alias("Years");
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let people = run(&rules, alice_row(Value::Int(30))).expect("map");
    assert_eq!(people, vec![person("Alice", 0)]);
}

#[test]
fn false_condition_wins_over_present_value() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Age", |rule| {
            rule.map_if("column-is-not-age", |_, column| column != "Age");
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let people = run(&rules, alice_row(Value::Int(30))).expect("map");
    assert_eq!(people, vec![person("Alice", 0)]);
}

#[test]
fn condition_can_inspect_the_row() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Age", |rule| {
            rule.map_if("no-skip-age-column", |row, _| {
                row.get_ordinal("SkipAge").is_none()
            });
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let cursor = MemoryCursor::new(
        ["Name", "Age", "SkipAge"],
        vec![vec![Value::text("Alice"), Value::Int(30), Value::Bool(true)]],
    );
    assert_eq!(run(&rules, cursor).expect("map"), vec![person("Alice", 0)]);
    assert_eq!(
        run(&rules, alice_row(Value::Int(30))).expect("map"),
        vec![person("Alice", 30)]
    );
}

#[test]
fn processor_failure_aborts_with_binding_failure() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Age", |rule| {
            rule.process_value("reject-negative", |_, raw, _| match raw {
                Value::Int(v) if v < 0 => Err(format!("negative age {v}").into()),
                other => Ok(other),
            });
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let err = run(&rules, alice_row(Value::Int(-5))).expect_err("negative age");
    let failure = err.as_binding().expect("binding failure");
    assert_eq!(failure.property, "Age");
    assert_eq!(failure.alias, "Age");
    assert_eq!(failure.target_type, "Person");
    assert_eq!(failure.kind, ValueKind::Int);
    assert_eq!(failure.row_index, Some(0));
    match &failure.cause {
        BindingCause::Processor { key, source } => {
            assert_eq!(key, "reject-negative");
            assert_eq!(source.to_string(), "negative age -5");
        }
        other => panic!("unexpected cause: {other:?}"),
    }
    assert_eq!(
        error_chain(&err),
        vec![
            "Age encountered an error on column [Age] when binding into property Age of \
             Person (int) at row 0",
            "value processor 'reject-negative' failed",
            "negative age -5",
        ]
    );
}

#[test]
fn processor_sees_kind_and_prior_value() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Name", |rule| {
            rule.process_value("annotate", |kind, raw, prior| {
                Ok(Value::text(format!("{raw}:{kind}:{}", prior.is_null())))
            });
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let people = run(&rules, alice_row(Value::Int(30))).expect("map");
    assert_eq!(people[0].name, "Alice:text:false");
}

#[test]
fn processors_run_in_attachment_order() {
    let rules = MappingRuleSet::<Person>::builder()
        .configure("Name", |rule| {
            rule.process_value("first", |_, raw, _| Ok(Value::text(format!("{raw}1"))))
                .process_value("second", |_, raw, _| Ok(Value::text(format!("{raw}2"))));
        })
        .build(&DeclaredProperties)
        .expect("rules");
    let people = run(&rules, alice_row(Value::Int(30))).expect("map");
    assert_eq!(people[0].name, "Alice12");
}

#[test]
fn repeated_compile_and_map_is_deterministic() {
    let build = || {
        MappingRuleSet::<Person>::builder()
            .configure("Age", |rule| {
                rule.set_alias("years");
            })
            .build(&DeclaredProperties)
            .expect("rules")
    };
    let rows = || {
        MemoryCursor::new(
            ["NAME", "Years"],
            vec![
                vec![Value::text("Alice"), Value::text("30")],
                vec![Value::text("Bob"), Value::Null],
            ],
        )
    };
    let first = run(&build(), rows()).expect("map");
    for _ in 0..5 {
        assert_eq!(run(&build(), rows()).expect("map"), first);
    }
    assert_eq!(first, vec![person("Alice", 30), person("Bob", 0)]);
}

#[test]
fn conversion_error_names_offending_property() {
    let rules = MappingRuleSet::<Person>::from_extractor(&DeclaredProperties).expect("rules");
    let err = run(&rules, alice_row(Value::text("thirty"))).expect_err("bad age");
    let failure = err.as_binding().expect("binding failure");
    assert_eq!(failure.property, "Age");
    assert!(matches!(failure.cause, BindingCause::Conversion(_)));
}

#[test]
fn processors_sharing_a_key_get_separate_projectors() {
    let build = |doubling: bool| {
        MappingRuleSet::<Person>::builder()
            .configure("Age", move |rule| {
                if doubling {
                    rule.process_value("adjust", |_, raw, _| match raw {
                        Value::Int(age) => Ok(Value::Int(age * 2)),
                        other => Ok(other),
                    });
                } else {
                    rule.process_value("adjust", |_, raw, _| match raw {
                        Value::Int(age) => Ok(Value::Int(-age)),
                        other => Ok(other),
                    });
                }
            })
            .build(&DeclaredProperties)
            .expect("rules")
    };
    let cache = ProjectorCache::new();
    let command = CommandId::new("people");
    let doubling = cache.compile_or_fetch(&build(true), &command).expect("compile");
    let negating = cache.compile_or_fetch(&build(false), &command).expect("compile");

    assert_eq!(cache.compilations(), 2);
    assert_eq!(
        map(alice_row(Value::Int(10)), &doubling).expect("map"),
        vec![person("Alice", 20)]
    );
    assert_eq!(
        map(alice_row(Value::Int(10)), &negating).expect("map"),
        vec![person("Alice", -10)]
    );
}
