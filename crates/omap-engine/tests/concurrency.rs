//! Map calls racing binds of other (and the same) pairs

use omap_engine::prelude::*;
use omap_test_utils::{node_chain, people_catalog, sample_person};
use std::sync::Arc;
use std::thread;

#[test]
fn maps_proceed_while_other_pairs_bind() {
    let mapper = Arc::new(ObjectMapper::new(Arc::new(people_catalog())));
    let (person, dto) = (Ty::object("Person"), Ty::object("PersonDto"));
    mapper.bind(person.clone(), dto.clone(), None).unwrap();

    let mut handles = Vec::new();
    for worker in 0..4_i32 {
        let mapper = Arc::clone(&mapper);
        let (person, dto) = (person.clone(), dto.clone());
        handles.push(thread::spawn(move || {
            for i in 0..200_i32 {
                let source = Value::Object(sample_person().with("Age", worker * 1000 + i));
                let mapped = mapper.map(&person, &dto, source, None).unwrap();
                assert_eq!(
                    mapped.field("Age"),
                    Some(&Value::Int(i64::from(worker * 1000 + i)))
                );
            }
        }));
    }

    let binder = {
        let mapper = Arc::clone(&mapper);
        thread::spawn(move || {
            for _ in 0..20 {
                mapper
                    .bind(Ty::object("Node"), Ty::object("NodeDto"), None)
                    .unwrap();
                mapper
                    .bind(Ty::object("Person"), Ty::object("PersonDto"), None)
                    .unwrap();
            }
        })
    };

    for handle in handles {
        handle.join().unwrap();
    }
    binder.join().unwrap();

    let mapped = mapper
        .map(&Ty::object("Node"), &Ty::object("NodeDto"), node_chain(3), None)
        .unwrap();
    assert_eq!(mapped.field("Id"), Some(&Value::Int(2)));
}

#[test]
fn concurrent_binds_of_one_pair_all_succeed() {
    let mapper = Arc::new(ObjectMapper::new(Arc::new(people_catalog())));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mapper = Arc::clone(&mapper);
            thread::spawn(move || {
                mapper
                    .bind(Ty::object("Node"), Ty::object("NodeDto"), None)
                    .unwrap()
            })
        })
        .collect();
    let bound: Vec<Mapper> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(bound.iter().all(|m| m.len() == 2));

    // exactly one of them is the one left in the registry
    let current = mapper
        .mapper(&TypePair::new(Ty::object("Node"), Ty::object("NodeDto")))
        .unwrap();
    assert_eq!(bound.iter().filter(|m| m.same_graph(&current)).count(), 1);
}

#[test]
fn reject_policy_admits_exactly_one_bind() {
    let mapper = Arc::new(
        ObjectMapper::builder(Arc::new(people_catalog()))
            .with_config(MapperConfig::new().with_rebind(RebindPolicy::Reject))
            .build(),
    );
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let mapper = Arc::clone(&mapper);
            thread::spawn(move || {
                mapper
                    .bind(Ty::object("Person"), Ty::object("PersonDto"), None)
                    .is_ok()
            })
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
}
