//! Proxy Generation Tests
//!
//! End-to-end tests for the definition model, generation engine, and
//! dispatch runtime:
//! - Interface, class, and callable definitions
//! - Constructor replay and exact-match selection
//! - Interception filter routing
//! - Fault propagation and identity

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use veil_core::{
    handler_fn, CallableDecl, ClassDecl, ContractDecl, Fault, MethodSig, PassthroughHandler,
    ProxyError, ProxyRepository, TargetType, TypeTag, Value,
};

fn greeter_contract() -> Arc<ContractDecl> {
    ContractDecl::builder("Greeter")
        .method(MethodSig::new("greet", vec![TypeTag::Str], TypeTag::Str))
        .build()
        .unwrap()
}

fn account_class() -> Arc<ClassDecl> {
    // fields: [owner: string, balance: int]
    ClassDecl::builder("Account")
        .fields(2)
        .constructor(
            vec![TypeTag::Str],
            Arc::new(|args| Ok(vec![args[0].clone(), Value::Int(0)])),
        )
        .constructor(
            vec![TypeTag::Str, TypeTag::Int],
            Arc::new(|args| Ok(vec![args[0].clone(), args[1].clone()])),
        )
        .virtual_method(
            MethodSig::new("deposit", vec![TypeTag::Int], TypeTag::Int),
            Arc::new(|fields, args| {
                let balance = fields[1].as_int().unwrap() + args[0].as_int().unwrap();
                fields[1] = Value::Int(balance);
                Ok(Value::Int(balance))
            }),
        )
        .virtual_method(
            MethodSig::new("balance", vec![], TypeTag::Int),
            Arc::new(|fields, _args| Ok(fields[1].clone())),
        )
        .final_method(
            MethodSig::new("owner", vec![], TypeTag::Str),
            Arc::new(|fields, _args| Ok(fields[0].clone())),
        )
        .build()
        .unwrap()
}

// ===== Interface definitions =====

#[test]
fn test_interface_member_forwards_once_with_token_and_args() {
    let repository = ProxyRepository::new();
    let calls: Arc<Mutex<Vec<(String, Vec<Value>)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = calls.clone();

    let proxy = repository
        .create_proxy(
            TargetType::Contract(greeter_contract()),
            &[],
            handler_fn(move |inv| {
                seen.lock()
                    .push((inv.token().to_string(), inv.args().to_vec()));
                Ok(Value::str("ok"))
            }),
            &[],
        )
        .unwrap();

    let result = proxy.invoke("greet", &[Value::str("veil")]);
    assert_eq!(result, Ok(Value::str("ok")));

    let calls = calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "greet(string) -> string");
    assert_eq!(calls[0].1, vec![Value::str("veil")]);
}

#[test]
fn test_proxy_satisfies_every_requested_contract() {
    let repository = ProxyRepository::new();
    let base = greeter_contract();
    let extra = ContractDecl::builder("Closeable")
        .method(MethodSig::new("close", vec![], TypeTag::Void))
        .build()
        .unwrap();

    let factory = repository
        .get_factory(TargetType::Contract(base.clone()), &[extra.clone()])
        .unwrap();
    let proxy = factory
        .instantiate(handler_fn(|_| Ok(Value::Null)), &[])
        .unwrap();

    assert!(factory.implements(&base));
    assert!(factory.implements(&extra));
    assert!(proxy.satisfies(&base));
    assert!(proxy.satisfies(&extra));

    let stranger = ContractDecl::builder("Stranger")
        .method(MethodSig::new("wander", vec![], TypeTag::Void))
        .build()
        .unwrap();
    assert!(!proxy.satisfies(&stranger));
}

#[test]
fn test_factory_identity_is_stable_across_contract_order() {
    let repository = ProxyRepository::new();
    let base = greeter_contract();
    let c1 = ContractDecl::builder("A")
        .method(MethodSig::new("a", vec![], TypeTag::Void))
        .build()
        .unwrap();
    let c2 = ContractDecl::builder("B")
        .method(MethodSig::new("b", vec![], TypeTag::Void))
        .build()
        .unwrap();

    let forward = repository
        .get_factory(TargetType::Contract(base.clone()), &[c1.clone(), c2.clone()])
        .unwrap();
    let backward = repository
        .get_factory(TargetType::Contract(base), &[c2, c1])
        .unwrap();

    assert!(Arc::ptr_eq(&forward, &backward));
    assert_eq!(repository.cached_definitions(), 1);
}

#[test]
fn test_property_and_event_members_dispatch_by_kind() {
    let repository = ProxyRepository::new();
    let contract = ContractDecl::builder("Gauge")
        .writable_property("level", TypeTag::Int)
        .event("changed")
        .build()
        .unwrap();

    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = log.clone();
    let proxy = repository
        .create_proxy(
            TargetType::Contract(contract),
            &[],
            handler_fn(move |inv| {
                seen.lock().push(inv.token().to_string());
                match inv.token().ret() {
                    TypeTag::Int => Ok(Value::Int(5)),
                    _ => Ok(Value::Null),
                }
            }),
            &[],
        )
        .unwrap();

    assert_eq!(proxy.get("level"), Ok(Value::Int(5)));
    assert_eq!(proxy.set("level", Value::Int(9)), Ok(Value::Null));
    let listener = Value::opaque(());
    assert_eq!(proxy.add_listener("changed", listener.clone()), Ok(Value::Null));
    assert_eq!(proxy.remove_listener("changed", listener), Ok(Value::Null));

    assert_eq!(
        *log.lock(),
        vec![
            "get level: int",
            "set level: int",
            "add changed",
            "remove changed"
        ]
    );
}

#[test]
fn test_contract_default_body_reachable_via_proceed() {
    let repository = ProxyRepository::new();
    let contract = ContractDecl::builder("Clock")
        .default_method(
            MethodSig::new("hour", vec![], TypeTag::Int),
            Arc::new(|_fields, _args| Ok(Value::Int(12))),
        )
        .build()
        .unwrap();

    // Forwarded member: the default body is not replayed unless the
    // handler proceeds to it.
    let proxy = repository
        .create_proxy(
            TargetType::Contract(contract.clone()),
            &[],
            handler_fn(|inv| {
                assert!(inv.has_base());
                let base = inv.proceed()?;
                Ok(Value::Int(base.as_int().unwrap() + 1))
            }),
            &[],
        )
        .unwrap();
    assert_eq!(proxy.invoke("hour", &[]), Ok(Value::Int(13)));

    // Passthrough handler: default body result observed unchanged.
    let passthrough = repository
        .create_proxy(
            TargetType::Contract(contract),
            &[],
            Arc::new(PassthroughHandler),
            &[],
        )
        .unwrap();
    assert_eq!(passthrough.invoke("hour", &[]), Ok(Value::Int(12)));
}

// ===== Class definitions =====

#[test]
fn test_class_constructors_replay_exactly() {
    let repository = ProxyRepository::new();
    let factory = repository
        .get_factory(TargetType::Class(account_class()), &[])
        .unwrap();
    let handler = Arc::new(PassthroughHandler);

    // One-argument constructor
    let a = factory
        .instantiate(handler.clone(), &[Value::str("ada")])
        .unwrap();
    assert_eq!(a.invoke("balance", &[]), Ok(Value::Int(0)));
    assert_eq!(a.invoke("owner", &[]), Ok(Value::str("ada")));

    // Two-argument constructor
    let b = factory
        .instantiate(handler.clone(), &[Value::str("bob"), Value::Int(50)])
        .unwrap();
    assert_eq!(b.invoke("balance", &[]), Ok(Value::Int(50)));
    assert_eq!(b.invoke("deposit", &[Value::Int(25)]), Ok(Value::Int(75)));

    // Everything else is rejected
    for args in [
        vec![],
        vec![Value::Int(1)],
        vec![Value::str("x"), Value::Float(1.0)],
        vec![Value::str("x"), Value::Int(1), Value::Int(2)],
    ] {
        assert!(matches!(
            factory.instantiate(handler.clone(), &args),
            Err(ProxyError::ConstructorNotFound { .. })
        ));
    }
}

#[test]
fn test_final_members_pass_through_without_handler() {
    let repository = ProxyRepository::new();
    let consulted = Arc::new(AtomicUsize::new(0));
    let seen = consulted.clone();

    let proxy = repository
        .create_proxy(
            TargetType::Class(account_class()),
            &[],
            handler_fn(move |inv| {
                seen.fetch_add(1, Ordering::SeqCst);
                inv.proceed()
            }),
            &[Value::str("ada"), Value::Int(10)],
        )
        .unwrap();

    // `owner` is final: dispatch runs the base body directly
    assert_eq!(proxy.invoke("owner", &[]), Ok(Value::str("ada")));
    assert_eq!(consulted.load(Ordering::SeqCst), 0);

    // `balance` is virtual: the handler sees it
    assert_eq!(proxy.invoke("balance", &[]), Ok(Value::Int(10)));
    assert_eq!(consulted.load(Ordering::SeqCst), 1);
}

#[test]
fn test_filtered_member_calls_base_and_skips_handler() {
    let handler_calls = Arc::new(AtomicUsize::new(0));
    let seen = handler_calls.clone();

    let repository = ProxyRepository::with_filter(Arc::new(
        |token: &veil_core::MemberToken| token.name() != "balance",
    ));
    let proxy = repository
        .create_proxy(
            TargetType::Class(account_class()),
            &[],
            handler_fn(move |inv| {
                seen.fetch_add(1, Ordering::SeqCst);
                inv.proceed()
            }),
            &[Value::str("ada"), Value::Int(30)],
        )
        .unwrap();

    // Excluded member: base implementation, handler never consulted
    assert_eq!(proxy.invoke("balance", &[]), Ok(Value::Int(30)));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 0);

    // Included member still forwards
    assert_eq!(proxy.invoke("deposit", &[Value::Int(5)]), Ok(Value::Int(35)));
    assert_eq!(handler_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_handler_result_replaces_base_behavior() {
    let repository = ProxyRepository::new();
    let proxy = repository
        .create_proxy(
            TargetType::Class(account_class()),
            &[],
            handler_fn(|_inv| Ok(Value::Int(-1))),
            &[Value::str("ada"), Value::Int(100)],
        )
        .unwrap();

    // The base body never runs; the handler's value is observed unchanged
    assert_eq!(proxy.invoke("balance", &[]), Ok(Value::Int(-1)));
}

#[test]
fn test_sealed_class_with_contracts_forwards_contract_members() {
    let sealed = ClassDecl::builder("Locked")
        .sealed()
        .fields(0)
        .virtual_method(
            MethodSig::new("tick", vec![], TypeTag::Int),
            Arc::new(|_f, _a| Ok(Value::Int(1))),
        )
        .build()
        .unwrap();
    let contract = greeter_contract();

    let repository = ProxyRepository::new();
    let proxy = repository
        .create_proxy(
            TargetType::Class(sealed),
            &[contract],
            handler_fn(|_inv| Ok(Value::str("intercepted"))),
            &[],
        )
        .unwrap();

    // Sealing keeps the base member on its original body
    assert_eq!(proxy.invoke("tick", &[]), Ok(Value::Int(1)));
    // The contract member forwards
    assert_eq!(
        proxy.invoke("greet", &[Value::str("x")]),
        Ok(Value::str("intercepted"))
    );
}

#[test]
fn test_sealed_class_without_contracts_is_not_proxyable() {
    let sealed = ClassDecl::builder("Dead")
        .sealed()
        .virtual_method(
            MethodSig::new("tick", vec![], TypeTag::Void),
            Arc::new(|_f, _a| Ok(Value::Null)),
        )
        .build()
        .unwrap();

    let repository = ProxyRepository::new();
    let result = repository.get_factory(TargetType::Class(sealed), &[]);
    assert!(matches!(result, Err(ProxyError::NotProxyable { .. })));
}

// ===== Callable definitions =====

#[test]
fn test_callable_degenerates_to_one_member() {
    let repository = ProxyRepository::new();
    let callable = CallableDecl::new("Doubler", vec![TypeTag::Int], TypeTag::Int);

    let factory = repository
        .get_factory(TargetType::Callable(callable), &[])
        .unwrap();
    assert_eq!(factory.member_tokens().len(), 1);

    let proxy = factory
        .instantiate(
            handler_fn(|inv| Ok(Value::Int(inv.args()[0].as_int().unwrap() * 2))),
            &[],
        )
        .unwrap();
    assert_eq!(proxy.invoke("invoke", &[Value::Int(21)]), Ok(Value::Int(42)));
}

#[test]
fn test_callable_rejects_additional_contracts() {
    let repository = ProxyRepository::new();
    let callable = CallableDecl::new("F", vec![], TypeTag::Void);

    let result = repository.get_factory(TargetType::Callable(callable), &[greeter_contract()]);
    assert!(matches!(result, Err(ProxyError::InvalidArgument(_))));
}

// ===== Conflicts and unsupported shapes =====

#[test]
fn test_incompatible_contract_signatures_conflict() {
    let repository = ProxyRepository::new();
    let base = ContractDecl::builder("Base")
        .method(MethodSig::new("id", vec![], TypeTag::Int))
        .build()
        .unwrap();
    let clashing = ContractDecl::builder("Clash")
        .method(MethodSig::new("id", vec![], TypeTag::Str))
        .build()
        .unwrap();

    let result = repository.get_factory(TargetType::Contract(base), &[clashing]);
    match result {
        Err(ProxyError::Conflict { member, .. }) => assert_eq!(member, "id"),
        other => panic!("expected Conflict, got {:?}", other.err()),
    }
}

#[test]
fn test_generic_member_is_unsupported_and_cached() {
    let repository = ProxyRepository::new();
    let contract = ContractDecl::builder("Mapper")
        .method(MethodSig::new("map", vec![TypeTag::Any], TypeTag::Any).with_generic_arity(1))
        .build()
        .unwrap();

    let first = repository.get_factory(TargetType::Contract(contract.clone()), &[]);
    let second = repository.get_factory(TargetType::Contract(contract), &[]);

    match (&first, &second) {
        (
            Err(ProxyError::UnsupportedMember { token: a }),
            Err(ProxyError::UnsupportedMember { token: b }),
        ) => {
            assert_eq!(a.name(), "map");
            assert_eq!(a, b);
        }
        _ => panic!("expected UnsupportedMember from both calls"),
    }
}

// ===== Fault propagation =====

#[test]
fn test_handler_fault_propagates_unchanged() {
    let repository = ProxyRepository::new();
    let payload = Value::list(vec![Value::Int(401)]);
    let fault = Fault::raised_with("denied", payload);
    let thrown = fault.clone();

    let proxy = repository
        .create_proxy(
            TargetType::Contract(greeter_contract()),
            &[],
            handler_fn(move |_inv| Err(thrown.clone())),
            &[],
        )
        .unwrap();

    assert_eq!(proxy.invoke("greet", &[Value::str("x")]), Err(fault));
}

#[test]
fn test_base_body_fault_propagates_through_proceed() {
    let repository = ProxyRepository::new();
    let class = ClassDecl::builder("Fragile")
        .virtual_method(
            MethodSig::new("snap", vec![], TypeTag::Void),
            Arc::new(|_f, _a| Err(Fault::raised("snapped"))),
        )
        .build()
        .unwrap();

    let proxy = repository
        .create_proxy(
            TargetType::Class(class),
            &[],
            Arc::new(PassthroughHandler),
            &[],
        )
        .unwrap();

    assert_eq!(proxy.invoke("snap", &[]), Err(Fault::raised("snapped")));
}

#[test]
fn test_constructor_fault_propagates_unchanged() {
    let repository = ProxyRepository::new();
    let class = ClassDecl::builder("Picky")
        .fields(1)
        .constructor(
            vec![TypeTag::Int],
            Arc::new(|args| {
                if args[0].as_int() == Some(0) {
                    Err(Fault::raised("zero is not allowed"))
                } else {
                    Ok(vec![args[0].clone()])
                }
            }),
        )
        .virtual_method(
            MethodSig::new("value", vec![], TypeTag::Int),
            Arc::new(|fields, _args| Ok(fields[0].clone())),
        )
        .build()
        .unwrap();

    let factory = repository
        .get_factory(TargetType::Class(class), &[])
        .unwrap();

    let ok = factory.instantiate(Arc::new(PassthroughHandler), &[Value::Int(3)]);
    assert!(ok.is_ok());

    let err = factory.instantiate(Arc::new(PassthroughHandler), &[Value::Int(0)]);
    assert_eq!(
        err.err(),
        Some(ProxyError::Fault(Fault::raised("zero is not allowed")))
    );
}
