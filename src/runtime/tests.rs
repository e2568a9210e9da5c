use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::*;

#[test]
fn run_returns_the_result() {
    let rt = Runtime::new();
    let out = rt.run(async { 1 + 2 });
    assert_eq!(out, 3);
}

#[test]
fn spawned_tasks_interleave_in_insertion_order() {
    let rt = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let out = {
        let log = log.clone();
        rt.run(async move {
            let a = {
                let log = log.clone();
                spawn(async move {
                    log.borrow_mut().push("a1");
                    suspend_until(|| true).await;
                    log.borrow_mut().push("a2");
                    1
                })
            };
            let b = {
                let log = log.clone();
                spawn(async move {
                    log.borrow_mut().push("b1");
                    suspend_until(|| true).await;
                    log.borrow_mut().push("b2");
                    2
                })
            };
            batch(vec![a, b]).await
        })
    };

    assert_eq!(out, vec![1, 2]);
    assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn suspend_until_waits_for_the_predicate() {
    let rt = Runtime::new();
    let flag = Rc::new(RefCell::new(false));

    let waiter = {
        let flag = flag.clone();
        rt.spawn(async move {
            suspend_until(move || *flag.borrow()).await;
            "resumed"
        })
    };
    let setter = {
        let flag = flag.clone();
        rt.spawn(async move {
            suspend_until(|| true).await;
            *flag.borrow_mut() = true;
        })
    };

    let out = rt.run(async move {
        setter.await;
        waiter.await
    });
    assert_eq!(out, "resumed");
}

#[test]
fn awaiting_a_task_chains() {
    let rt = Runtime::new();
    let out = rt.run(async {
        let inner = spawn(async { 21 });
        inner.await * 2
    });
    assert_eq!(out, 42);
}

#[test]
fn sleep_is_real_without_an_observer() {
    let rt = Runtime::new();
    let start = Instant::now();
    rt.run(async {
        sleep(Duration::from_millis(20)).await.unwrap();
    });
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[test]
fn batch_collects_everything() {
    let rt = Runtime::new();
    let out = rt.run(async {
        let tasks = (0..10).map(|i| spawn(async move { i * i })).collect();
        batch(tasks).await
    });
    assert_eq!(out, (0..10).map(|i| i * i).collect::<Vec<_>>());
}

#[test]
fn tasks_spawned_before_run_also_complete() {
    let rt = Runtime::new();
    let side = rt.spawn(async { "side" });
    let out = rt.run(async move { side.await });
    assert_eq!(out, "side");
}
