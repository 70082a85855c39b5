//! Trait composition tests
//!
//! Conflict detection and resolution, alias/suppression plans, and
//! required-interface gating.

use conformal::{
    adopt, compose, AdoptOptions, CompositionPlan, ContractError, InterfaceSpec, Surface,
    TraitBundle, Value,
};

fn summing_trait(name: &str) -> TraitBundle {
    TraitBundle::builder(name)
        .func("sum", 1, |_, args| {
            let items = args[0].as_seq().unwrap_or(&[]);
            Ok(Value::Int(items.iter().filter_map(Value::as_int).sum()))
        })
        .func("describe", 0, |_, _| Ok(Value::from("a summing trait")))
        .build()
}

#[test]
fn composition_requires_an_opened_target() {
    let closed = Surface::builder("Closed").build();
    let err = compose(&closed, &summing_trait("Sums"), CompositionPlan::new()).unwrap_err();
    assert!(matches!(err, ContractError::CompositionNotAllowed { .. }));

    let open = closed.open_for_composition();
    assert!(compose(&open, &summing_trait("Sums"), CompositionPlan::new()).is_ok());
}

#[test]
fn composed_capabilities_are_callable() {
    let target = Surface::builder("Host").build().open_for_composition();
    let composed = compose(&target, &summing_trait("Sums"), CompositionPlan::new()).unwrap();
    let result = composed
        .invoke("sum", &[Value::Seq(vec![Value::Int(2), Value::Int(3)])])
        .unwrap();
    assert_eq!(result, Value::Int(5));
    // The source target is unchanged.
    assert!(!target.has("sum"));
}

#[test]
fn target_own_definition_wins_silently() {
    let target = Surface::builder("Host")
        .public_fn("sum", 1, |_, _| Ok(Value::from("mine")))
        .build()
        .open_for_composition();

    // Two traits also defining `sum`: both merges succeed, the target's
    // own definition survives both.
    let once = compose(&target, &summing_trait("First"), CompositionPlan::new()).unwrap();
    let twice = compose(
        &once.open_for_composition(),
        &TraitBundle::builder("Second")
            .func("sum", 1, |_, _| Ok(Value::from("second")))
            .build(),
        CompositionPlan::new(),
    )
    .unwrap();

    assert_eq!(
        twice.invoke("sum", &[Value::Seq(vec![])]).unwrap(),
        Value::from("mine")
    );
}

#[test]
fn trait_on_trait_conflicts_are_collected() {
    let target = Surface::builder("Host").build().open_for_composition();
    let first = compose(&target, &summing_trait("First"), CompositionPlan::new()).unwrap();

    // `sum` and `describe` both collide, and neither is target-owned.
    let err = compose(
        &first.open_for_composition(),
        &summing_trait("Second"),
        CompositionPlan::new(),
    )
    .unwrap_err();
    match err {
        ContractError::CapabilityConflict { names } => {
            assert_eq!(names, vec!["describe".to_string(), "sum".to_string()]);
        }
        other => panic!("expected CapabilityConflict, got {other:?}"),
    }
}

#[test]
fn aliases_and_suppressions_resolve_conflicts() {
    let target = Surface::builder("Host").build().open_for_composition();
    let first = compose(&target, &summing_trait("First"), CompositionPlan::new()).unwrap();

    let plan = CompositionPlan::new()
        .alias("sum", "sum_again")
        .suppress("describe");
    let second = compose(&first.open_for_composition(), &summing_trait("Second"), plan).unwrap();

    assert!(second.has("sum"));
    assert!(second.has("sum_again"));
    assert_eq!(
        second
            .invoke("sum_again", &[Value::Seq(vec![Value::Int(4)])])
            .unwrap(),
        Value::Int(4)
    );
}

#[test]
fn aliasing_a_missing_capability_fails() {
    let target = Surface::builder("Host").build().open_for_composition();
    let plan = CompositionPlan::new().alias("no_such", "other");
    let err = compose(&target, &summing_trait("Sums"), plan).unwrap_err();
    assert!(matches!(
        err,
        ContractError::AliasTargetMissing { ref name, .. } if name == "no_such"
    ));
}

#[test]
fn suppressing_then_aliasing_the_same_name_fails() {
    let target = Surface::builder("Host").build().open_for_composition();
    let plan = CompositionPlan::new().suppress("sum").alias("sum", "other");
    let err = compose(&target, &summing_trait("Sums"), plan).unwrap_err();
    assert!(matches!(err, ContractError::AliasTargetMissing { .. }));
}

#[test]
fn required_interface_gates_the_merge() {
    let has_car = InterfaceSpec::builder("HasCar")
        .private_visible(["car"])
        .build()
        .unwrap();
    let driver = TraitBundle::builder("Driver")
        .func("drive", 0, |surface, _| surface.invoke_local("car", &[]))
        .requires_interface(&has_car)
        .build();

    let carless = Surface::builder("Pedestrian").build().open_for_composition();
    let err = compose(&carless, &driver, CompositionPlan::new()).unwrap_err();
    assert!(matches!(
        err,
        ContractError::PrivateCapabilityMissing { ref name, .. } if name == "car"
    ));

    let person = Surface::builder("Person")
        .private_fn("car", 0, |_, _| Ok(Value::from("vroom")))
        .build()
        .open_for_composition();
    let racer = compose(&person, &driver, CompositionPlan::new()).unwrap();
    assert_eq!(racer.invoke("drive", &[]).unwrap(), Value::from("vroom"));
}

#[test]
fn adoption_record_short_circuits_required_interface() {
    let spec = InterfaceSpec::builder("Marker")
        .public_visible(["ping"])
        .build()
        .unwrap();
    let mut target = Surface::builder("T")
        .public_fn("ping", 0, |_, _| Ok(Value::Nil))
        .build();
    adopt(&mut target, &spec, AdoptOptions::default()).unwrap();

    let bundle = TraitBundle::builder("Needy")
        .func("extra", 0, |_, _| Ok(Value::Nil))
        .requires_interface(&spec)
        .build();
    let composed = compose(
        &target.open_for_composition(),
        &bundle,
        CompositionPlan::new(),
    )
    .unwrap();
    assert!(composed.has("extra"));
}
