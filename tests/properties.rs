use json_record::{
    Fields, Mode, RecordType, Schema, Ty, Value, ViolationKind, check, check_all, conforms, fields_from_plain,
};
use proptest::prelude::*;
use serde_json::json;

/// Arbitrary plain JSON, floats included.
fn plain_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6..1.0e6f64).prop_map(|f| json!(f)),
        "[a-zA-Z0-9_ ]{0,12}".prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..6)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    })
}

fn descriptor() -> impl Strategy<Value = Ty> {
    let leaf = prop_oneof![
        Just(Ty::string()),
        Just(Ty::boolean()),
        Just(Ty::integer()),
        Just(Ty::float()),
        Just(Ty::any()),
        Just(Ty::Null),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Ty::optional),
            inner.clone().prop_map(Ty::list),
            inner.clone().prop_map(Ty::string_map),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Ty::union),
            prop::collection::vec(inner, 0..3).prop_map(Ty::tuple),
        ]
    })
}

fn inner_type() -> RecordType {
    RecordType::new("Inner", Schema::new().field("foo", Ty::string()))
}

fn outer_type(inner: &RecordType) -> RecordType {
    RecordType::new(
        "Outer",
        Schema::new()
            .field("name", Ty::string())
            .field("score", Ty::float())
            .field("nick", Ty::optional(Ty::string()))
            .field("inner", Ty::record(inner))
            .field("items", Ty::list(Ty::record(inner)))
            .field("counts", Ty::string_map(Ty::integer()))
            .field("pair", Ty::tuple([Ty::string(), Ty::integer()]))
            .field("either", Ty::union([Ty::integer(), Ty::record(inner)])),
    )
}

/// Plain documents that `outer_type` accepts.
fn valid_outer() -> impl Strategy<Value = serde_json::Value> {
    let inner = "[a-z]{0,8}".prop_map(|foo| json!({"foo": foo}));
    let either = prop_oneof![any::<i64>().prop_map(|n| json!(n)), inner.clone()];
    (
        "[a-z]{0,8}",
        prop_oneof![any::<i32>().prop_map(|n| json!(n)), (-1.0e6..1.0e6f64).prop_map(|f| json!(f))],
        prop::option::of("[a-z]{0,8}"),
        inner.clone(),
        prop::collection::vec(inner, 0..4),
        prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 0..4),
        ("[a-z]{0,4}", any::<i64>()),
        either,
    )
        .prop_map(|(name, score, nick, inner, items, counts, pair, either)| {
            let mut doc = json!({
                "name": name,
                "score": score,
                "inner": inner,
                "items": items,
                "counts": counts,
                "pair": [pair.0, pair.1],
                "either": either,
            });
            if let Some(nick) = nick {
                doc["nick"] = json!(nick);
            }
            doc
        })
}

fn fields(plain: &serde_json::Value) -> Fields {
    fields_from_plain(plain).unwrap()
}

proptest! {
    #[test]
    fn booleans_never_conform_to_integer(b in any::<bool>()) {
        prop_assert!(!conforms(&Value::from(b), &Ty::integer()));
        prop_assert!(!conforms(&Value::from(b), &Ty::float()));
    }

    #[test]
    fn integers_conform_to_float(n in any::<i64>(), u in any::<u64>()) {
        prop_assert!(conforms(&Value::from(n), &Ty::float()));
        prop_assert!(conforms(&Value::from(u), &Ty::float()));
    }

    #[test]
    fn optional_accepts_null_and_otherwise_delegates(ty in descriptor(), plain in plain_json()) {
        let optional = Ty::optional(ty.clone());
        prop_assert!(conforms(&Value::Null, &optional));
        let value = Value::from(plain);
        if !value.is_null() {
            prop_assert_eq!(conforms(&value, &optional), conforms(&value, &ty));
        }
    }

    #[test]
    fn fail_fast_reports_the_first_exhaustive_violation(ty in descriptor(), plain in plain_json()) {
        let value = Value::from(plain);
        match (check(&value, &ty), check_all(&value, &ty)) {
            (Ok(()), Ok(())) => {}
            (Err(first), Err(all)) => prop_assert_eq!(all.first(), Some(&first)),
            (fast, full) => prop_assert!(false, "modes disagree: {:?} vs {:?}", fast, full),
        }
    }

    #[test]
    fn construction_equals_construction_from_the_flattened_merge(
        sources in prop::collection::vec(
            prop::collection::btree_map(prop_oneof![Just("name"), Just("score"), Just("nick"), Just("zz")], plain_json(), 0..4),
            0..4,
        ),
        overrides in prop::collection::btree_map(prop_oneof![Just("name"), Just("nick")], plain_json(), 0..2),
    ) {
        let rt = RecordType::with_mode(
            "Flat",
            Schema::new()
                .field("name", Ty::string())
                .field("score", Ty::optional(Ty::float()))
                .field("nick", Ty::optional(Ty::string())),
            Mode::Exhaustive,
        );
        let lift = |m: &std::collections::BTreeMap<&str, serde_json::Value>| -> Fields {
            m.iter().map(|(k, v)| ((*k).to_owned(), Value::from(v))).collect()
        };

        let mut flattened = Fields::new();
        for source in sources.iter().chain(std::iter::once(&overrides)) {
            flattened.extend(lift(source));
        }

        let merged = rt.construct(sources.iter().map(lift), lift(&overrides));
        prop_assert_eq!(merged, rt.from_fields(flattened));
    }

    #[test]
    fn undeclared_keys_always_fail(plain in plain_json(), mode in prop_oneof![Just(Mode::FailFast), Just(Mode::Exhaustive)]) {
        let rt = RecordType::with_mode("Named", Schema::new().field("name", Ty::string()), mode);
        let mut doc = json!({"name": "ok"});
        doc["undeclared"] = plain;
        let err = rt.from_plain(&doc).unwrap_err();
        prop_assert!(err.kinds().contains(&ViolationKind::UnknownField));
    }

    #[test]
    fn absent_required_fields_always_fail(nick in prop::option::of(plain_json())) {
        let rt = RecordType::new(
            "Named",
            Schema::new().field("name", Ty::string()).field("nick", Ty::optional(Ty::any())),
        );
        let mut doc = json!({});
        if let Some(nick) = nick {
            doc["nick"] = nick;
        }
        let err = rt.from_plain(&doc).unwrap_err();
        prop_assert_eq!(err.kinds(), vec![ViolationKind::MissingRequiredField]);
    }

    #[test]
    fn plain_round_trip_preserves_records(doc in valid_outer()) {
        let inner = inner_type();
        let outer = outer_type(&inner);
        let record = outer.from_plain(&doc).unwrap();
        prop_assert!(record.validate().is_ok());
        let again = outer.from_fields(fields(&record.to_plain())).unwrap();
        prop_assert_eq!(again, record);
    }
}
