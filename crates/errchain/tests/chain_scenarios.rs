use errchain::{AllocError, BudgetAllocator, BudgetConfig, ErrorChain, SystemAllocator};

#[test]
fn two_frame_scenario() {
    let alloc = SystemAllocator::new();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");

    chain
        .push_last(1, "f.c", 10, "main", &[])
        .expect("first push should succeed");
    chain
        .push_last(2, "f.c", 20, "g", &[0xAA])
        .expect("second push should succeed");

    assert_eq!(chain.size(), 2);
    assert_eq!(chain.peek_first().expect("chain is not empty").code(), 1);

    let last = chain.peek_last().expect("chain is not empty");
    assert_eq!(last.code(), 2);
    assert_eq!(last.opaque(), &[0xAA]);

    chain.discard_first();
    assert_eq!(chain.size(), 1);
    assert_eq!(chain.peek_first().expect("chain is not empty").code(), 2);
}

#[test]
fn push_first_goes_in_front_of_existing_frames() {
    let alloc = SystemAllocator::new();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");

    chain.push_last(1, "a.rs", 1, "a", b"A").expect("push A");
    chain.push_last(2, "b.rs", 2, "b", b"B").expect("push B");
    assert_eq!(chain.peek_first().expect("first").opaque(), b"A");
    assert_eq!(chain.peek_last().expect("last").opaque(), b"B");

    chain.push_first(3, "c.rs", 3, "c", b"C").expect("push C");
    assert_eq!(chain.peek_first().expect("first").opaque(), b"C");
    assert_eq!(chain.peek_last().expect("last").opaque(), b"B");
}

#[test]
fn fifo_with_discard_first_lifo_with_discard_last() {
    let alloc = SystemAllocator::new();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");

    for code in 0..6 {
        chain.push_last(code, "q.rs", 1, "q", &[]).expect("push");
    }
    let mut fifo = Vec::new();
    while let Some(frame) = chain.peek_first() {
        fifo.push(frame.code());
        chain.discard_first();
    }
    assert_eq!(fifo, vec![0, 1, 2, 3, 4, 5]);

    for code in 0..6 {
        chain.push_last(code, "q.rs", 1, "q", &[]).expect("push");
    }
    let mut lifo = Vec::new();
    while let Some(frame) = chain.peek_last() {
        lifo.push(frame.code());
        chain.discard_last();
    }
    assert_eq!(lifo, vec![5, 4, 3, 2, 1, 0]);
}

#[test]
fn round_trip_all_fields() {
    let alloc = SystemAllocator::new();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");
    let payload: Vec<u8> = (0..=255).collect();

    chain
        .push_last(i64::MIN, "src/deep/module.rs", u64::MAX, "module::op", &payload)
        .expect("push");

    let frame = chain.peek_last().expect("frame");
    assert_eq!(frame.code(), i64::MIN);
    assert_eq!(frame.file(), "src/deep/module.rs");
    assert_eq!(frame.line(), u64::MAX);
    assert_eq!(frame.function(), "module::op");
    assert_eq!(frame.opaque(), payload.as_slice());
}

#[test]
fn source_strings_are_copied() {
    let alloc = SystemAllocator::new();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");

    {
        let file = format!("generated_{}.rs", 42);
        let function = String::from("generated::run");
        chain
            .push_last(5, &file, 9, &function, &[])
            .expect("push");
    }

    let frame = chain.peek_last().expect("frame");
    assert_eq!(frame.file(), "generated_42.rs");
    assert_eq!(frame.function(), "generated::run");
    assert_eq!(frame.file_cstr().to_str().expect("utf-8"), "generated_42.rs");
}

#[test]
fn injected_failure_leaves_chain_unchanged() {
    let alloc = BudgetAllocator::unlimited();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");
    chain.push_last(1, "a.rs", 1, "a", b"one").expect("push");
    chain.push_last(2, "b.rs", 2, "b", b"two").expect("push");

    alloc.fail_next();
    let err = chain
        .push_last(3, "c.rs", 3, "c", b"three")
        .expect_err("push should fail");
    assert!(matches!(err, AllocError::Injected { .. }));
    assert_eq!(err.status(), errchain::alloc::STATUS_INJECTED_FAILURE);

    alloc.fail_next();
    chain
        .push_first(4, "d.rs", 4, "d", b"four")
        .expect_err("push should fail");

    assert_eq!(chain.size(), 2);
    let seen: Vec<(i64, Vec<u8>)> = chain
        .frames()
        .map(|f| (f.code(), f.opaque().to_vec()))
        .collect();
    assert_eq!(seen, vec![(1, b"one".to_vec()), (2, b"two".to_vec())]);

    let stats = alloc.stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.live_blocks, 3);
}

#[test]
fn byte_budget_is_reported_as_allocator_error() {
    let alloc = BudgetAllocator::new(BudgetConfig::unlimited().with_max_bytes(256));
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");

    let err = chain
        .push_last(1, "a.rs", 1, "a", &[0u8; 512])
        .expect_err("frame should exceed the budget");
    assert!(matches!(err, AllocError::BudgetExhausted { .. }));
    assert!(chain.is_empty());
}

#[test]
fn destruct_releases_every_allocation() {
    const K: u64 = 10;

    let alloc = BudgetAllocator::unlimited();
    let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");
    for code in 0..K as i64 {
        if code % 3 == 0 {
            chain.push_first(code, "a.rs", 1, "a", &[1; 16]).expect("push");
        } else {
            chain.push_last(code, "a.rs", 1, "a", &[]).expect("push");
        }
    }
    chain.discard_last();

    chain.destruct();

    let stats = alloc.stats();
    assert_eq!(stats.allocations, K + 1);
    assert_eq!(stats.releases, K + 1);
    assert_eq!(stats.live_bytes, 0);
    assert!(stats.is_balanced());
}

#[test]
fn drop_releases_like_destruct() {
    let alloc = BudgetAllocator::unlimited();
    {
        let mut chain = ErrorChain::construct(&alloc).expect("chain should construct");
        chain.push_last(1, "a.rs", 1, "a", &[]).expect("push");
    }
    assert!(alloc.stats().is_balanced());
}

#[test]
fn chains_share_one_allocator() {
    let alloc = BudgetAllocator::unlimited();
    let mut outer = ErrorChain::construct(&alloc).expect("outer");
    let mut inner = ErrorChain::construct(&alloc).expect("inner");

    inner.push_last(1, "inner.rs", 1, "inner", &[]).expect("push");
    outer.push_last(2, "outer.rs", 2, "outer", &[]).expect("push");
    inner.destruct();

    assert_eq!(alloc.stats().live_blocks, 2);
    assert_eq!(outer.peek_first().expect("frame").file(), "outer.rs");
}
