use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pickvisor::{
    BackpressurePolicy, BoxTask, Channel, Cleanup, CountSpread, Engine, EngineConfig, Execute,
    Initialize, KindFn, Outcome, RuntimeError, Spread, Stage, TaskContext, TaskError, TaskFn,
    TaskState,
};
use tokio::time::sleep;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Fast-cycling config: fixed 10ms delay, one admission per cycle, slow health/tick.
fn config(name: &str) -> EngineConfig {
    EngineConfig {
        name: name.to_string(),
        delay: Spread::fixed(ms(10)),
        pickup_count: CountSpread::fixed(1),
        check_interval: Duration::from_secs(3600),
        tick_interval: Duration::from_secs(3600),
        ..EngineConfig::default()
    }
}

fn sleeper(d: Duration) -> BoxTask {
    TaskFn::boxed(move |_ctx: TaskContext| async move {
        sleep(d).await;
        Ok::<_, TaskError>(())
    })
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_holds() {
    let mut cfg = config("ceiling");
    cfg.max_concurrent = 2;
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(ms(100))))
        .build()
        .unwrap();

    engine.start();
    for _ in 0..25 {
        sleep(ms(10)).await;
        assert!(engine.alive().len() <= 2);
        assert!(engine.stats().alive <= 2);
    }

    let s = engine.stats();
    assert!(s.total >= 2, "total = {}", s.total);
    assert_eq!(s.ok, s.settled());
    assert_eq!(s.ok as usize, engine.results(usize::MAX).len());
    assert_eq!(s.total - s.settled(), s.alive as u64);
    assert!(engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_failing_tasks_never_stop_the_loop() {
    let engine = Engine::builder(KindFn::arc(config("boom"), || {
        TaskFn::boxed(|_ctx: TaskContext| async { Err(TaskError::error("boom")) })
    }))
    .build()
    .unwrap();

    engine.start();
    sleep(ms(200)).await;
    assert!(engine.is_running());

    engine.pause();
    sleep(ms(10)).await;

    let s = engine.stats();
    assert!(s.total >= 3);
    assert_eq!(s.err, s.total);
    assert_eq!(s.ok + s.fail, 0);

    let last = engine.errors(1);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].outcome, Outcome::Err(TaskError::error("boom")));
    assert_eq!(last[0].stage, Stage::Execute);
    assert_eq!(last[0].task.state, TaskState::Ended);
}

#[tokio::test(start_paused = true)]
async fn test_result_cache_keeps_last_entries() {
    let mut cfg = config("cache");
    cfg.max_result_cache = 3;
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(Duration::ZERO)))
        .build()
        .unwrap();

    engine.start();
    while engine.stats().ok < 5 {
        sleep(ms(10)).await;
    }
    engine.pause();

    let kept = engine.results(10);
    assert_eq!(kept.len(), 3);
    let ids: Vec<u64> = kept.iter().map(|f| f.task.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ids = {ids:?}");
    assert_eq!(engine.results(1)[0].task.id, ids[2]);
}

#[tokio::test(start_paused = true)]
async fn test_used_time_covers_execute() {
    let engine = Engine::builder(KindFn::arc(config("used"), || sleeper(ms(100))))
        .build()
        .unwrap();

    engine.start();
    sleep(ms(300)).await;
    engine.pause();

    let last = engine.results(1);
    assert_eq!(last.len(), 1);
    let used = last[0].task.used;
    assert!(used >= ms(100), "used = {used:?}");
    assert!(used < ms(150), "used = {used:?}");
}

#[tokio::test(start_paused = true)]
async fn test_pause_lets_running_tasks_finish() {
    let mut cfg = config("pause");
    cfg.max_concurrent = 4;
    cfg.pickup_count = CountSpread::fixed(4);
    cfg.delay = Spread::fixed(Duration::from_secs(1));
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(ms(100))))
        .build()
        .unwrap();

    engine.start();
    engine.start();
    sleep(ms(10)).await;
    assert_eq!(engine.stats().total, 4);

    engine.pause();
    engine.pause();
    assert!(!engine.is_running());
    assert_eq!(engine.alive().len(), 4);

    sleep(ms(200)).await;
    let s = engine.stats();
    assert_eq!((s.total, s.ok, s.alive), (4, 4, 0));

    // restart picks up again
    engine.start();
    sleep(ms(10)).await;
    assert!(engine.stats().total > 4);
}

#[tokio::test(start_paused = true)]
async fn test_zero_ceiling_is_paused_but_alive() {
    let mut cfg = config("zero");
    cfg.max_concurrent = 0;
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(ms(5))))
        .build()
        .unwrap();

    engine.start();
    sleep(ms(100)).await;
    assert!(engine.is_running());
    assert_eq!(engine.stats().total, 0);

    engine.set_max_concurrent(1);
    sleep(ms(100)).await;
    assert!(engine.stats().total > 0);
    assert!(engine.alive().len() <= 1);
}

#[tokio::test(start_paused = true)]
async fn test_soft_failures_go_to_results() {
    let engine = Engine::builder(KindFn::arc(config("soft"), || {
        TaskFn::boxed(|_ctx: TaskContext| async { Err(TaskError::fail("status 503")) })
    }))
    .build()
    .unwrap();

    engine.start();
    sleep(ms(50)).await;
    engine.shutdown(Duration::from_secs(1)).await.unwrap();

    let s = engine.stats();
    assert!(s.fail > 0);
    assert_eq!(s.fail, s.total);
    assert_eq!(s.err, 0);
    assert!(engine.errors(10).is_empty());
    assert!(matches!(engine.results(1)[0].outcome, Outcome::Fail(_)));
}

struct BadInit {
    cleanups: Arc<AtomicUsize>,
}

#[async_trait]
impl Initialize for BadInit {
    async fn initialize(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
        Err(TaskError::error("no props"))
    }
}

#[async_trait]
impl Execute for BadInit {
    async fn execute(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
        panic!("must not run");
    }
}

#[async_trait]
impl Cleanup for BadInit {
    async fn cleanup(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_init_failure_is_admission_err() {
    let cleanups = Arc::new(AtomicUsize::new(0));
    let c = cleanups.clone();
    let engine = Engine::builder(KindFn::arc(config("badinit"), move || {
        Box::new(BadInit { cleanups: c.clone() }) as BoxTask
    }))
    .build()
    .unwrap();

    let popups = Arc::new(AtomicUsize::new(0));
    let p = popups.clone();
    engine.subscribe(Channel::Popup, move |_ev| {
        p.fetch_add(1, Ordering::SeqCst);
    });

    engine.start();
    sleep(ms(50)).await;
    engine.shutdown(Duration::from_secs(1)).await.unwrap();

    let s = engine.stats();
    assert!(s.total > 0);
    assert_eq!(s.err, s.total);
    assert_eq!(cleanups.load(Ordering::SeqCst), 0);
    assert_eq!(popups.load(Ordering::SeqCst) as u64, s.total);

    let last = &engine.errors(1)[0];
    assert_eq!(last.stage, Stage::Initialize);
    assert!(last.task.started_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_one_pickup_and_one_popup_per_task() {
    let engine = Engine::builder(KindFn::arc(config("events"), || sleeper(ms(30))))
        .build()
        .unwrap();

    let seen: Arc<Mutex<Vec<(Channel, u64, u64)>>> = Arc::default();
    for channel in [Channel::Pickup, Channel::Popup] {
        let seen = seen.clone();
        engine.subscribe(channel, move |ev| {
            let id = ev.task().map(|t| t.id).unwrap_or(0);
            seen.lock().push((ev.channel(), id, ev.seq));
        });
    }

    engine.start();
    sleep(ms(100)).await;
    engine.shutdown(Duration::from_secs(1)).await.unwrap();

    let s = engine.stats();
    let seen = seen.lock();
    let pickups: Vec<_> = seen.iter().filter(|e| e.0 == Channel::Pickup).collect();
    let popups: Vec<_> = seen.iter().filter(|e| e.0 == Channel::Popup).collect();
    assert_eq!(pickups.len() as u64, s.total);
    assert_eq!(popups.len() as u64, s.total);

    for pick in &pickups {
        let pops: Vec<_> = popups.iter().filter(|p| p.1 == pick.1).collect();
        assert_eq!(pops.len(), 1, "task {} popped {} times", pick.1, pops.len());
        assert!(pops[0].2 > pick.2, "popup before pickup for task {}", pick.1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cache_is_updated_before_popup() {
    let engine = Engine::builder(KindFn::arc(config("order"), || sleeper(ms(20))))
        .build()
        .unwrap();

    let missing = Arc::new(AtomicUsize::new(0));
    let checked = Arc::new(AtomicUsize::new(0));
    let (m, c, e) = (missing.clone(), checked.clone(), Arc::downgrade(&engine));
    engine.subscribe(Channel::Popup, move |ev| {
        let (Some(engine), Some(done)) = (e.upgrade(), ev.finished()) else {
            return;
        };
        c.fetch_add(1, Ordering::SeqCst);
        let cached = engine.results(usize::MAX).iter().any(|f| f.task.id == done.task.id);
        let live = engine.alive().iter().any(|t| t.id == done.task.id);
        if !cached || live {
            m.fetch_add(1, Ordering::SeqCst);
        }
    });

    engine.start();
    sleep(ms(100)).await;
    engine.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(checked.load(Ordering::SeqCst) > 0);
    assert_eq!(missing.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_subscriber_is_isolated() {
    let engine = Engine::builder(KindFn::arc(config("isolated"), || sleeper(ms(5))))
        .build()
        .unwrap();

    engine.subscribe(Channel::Pickup, |_ev| panic!("renderer bug"));
    let popups = Arc::new(AtomicUsize::new(0));
    let p = popups.clone();
    engine.subscribe(Channel::Popup, move |_ev| {
        p.fetch_add(1, Ordering::SeqCst);
    });

    engine.start();
    sleep(ms(100)).await;
    assert!(engine.is_running());
    engine.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(popups.load(Ordering::SeqCst) > 0);
    assert_eq!(popups.load(Ordering::SeqCst) as u64, engine.stats().total);
}

#[tokio::test(start_paused = true)]
async fn test_health_history_retention_and_events() {
    let calls = Arc::new(AtomicU64::new(0));
    let c = calls.clone();
    let mut cfg = config("health");
    cfg.check_interval = ms(50);
    cfg.max_health_history = 3;
    let kind = KindFn::new(cfg, || sleeper(ms(5))).with_check(move |input| {
        assert!(input.history.len() <= 3);
        c.fetch_add(1, Ordering::SeqCst) as f64
    });
    let engine = Engine::builder(Arc::new(kind)).build().unwrap();
    let mut rx = engine.bus().subscribe();

    engine.start();
    sleep(ms(275)).await;
    engine.pause();

    let n = calls.load(Ordering::SeqCst);
    assert_eq!(n, 5);
    assert_eq!(engine.health_history(), vec![2.0, 3.0, 4.0]);

    let mut scores = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        if let Some(score) = ev.score() {
            scores.push(score);
        }
    }
    assert_eq!(scores, vec![0.0, 1.0, 2.0, 3.0, 4.0]);

    // pause stops the monitor
    sleep(ms(200)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_negative_health_holds_admission() {
    let mut cfg = config("held");
    cfg.backpressure = BackpressurePolicy::HoldOnNegative {
        unit: ms(500),
        max: Duration::from_secs(1),
    };
    let kind = KindFn::new(cfg, || sleeper(ms(5))).with_check(|_| -2.0);
    let engine = Engine::builder(Arc::new(kind)).build().unwrap();
    let mut rx = engine.bus().subscribe();

    assert_eq!(engine.check_now(), -2.0);
    assert!(engine.is_held());

    engine.start();
    sleep(ms(500)).await;
    assert_eq!(engine.stats().total, 0);
    assert!(engine.heartbeat().held);

    // hold is capped at 1s
    sleep(ms(600)).await;
    assert!(!engine.is_held());
    assert!(engine.stats().total > 0);

    let echoed = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|ev| ev.text().map(str::to_owned))
        .collect::<Vec<_>>();
    assert_eq!(echoed, vec!["health -2.00: admission held for 1000ms".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_observe_policy_never_holds() {
    let kind = KindFn::new(config("observe"), || sleeper(ms(5))).with_check(|_| -5.0);
    let engine = Engine::builder(Arc::new(kind)).build().unwrap();

    engine.check_now();
    assert!(!engine.is_held());
    assert_eq!(engine.health_history(), vec![-5.0]);
}

#[tokio::test(start_paused = true)]
async fn test_tick_heartbeat() {
    let mut cfg = config("tick");
    cfg.tick_interval = ms(100);
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(ms(5))))
        .build()
        .unwrap();
    let mut rx = engine.bus().subscribe();

    engine.start();
    sleep(ms(350)).await;
    engine.pause();

    let beats: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|ev| ev.channel() == Channel::Tick)
        .collect();
    assert_eq!(beats.len(), 3);
    let pickvisor::Payload::Tick(beat) = &beats[2].payload else {
        panic!("not a tick");
    };
    assert!(beat.running);
    assert!(beat.uptime >= ms(300));
}

#[tokio::test(start_paused = true)]
async fn test_progress_and_echo_from_tasks() {
    let engine = Engine::builder(KindFn::arc(config("chatty"), || {
        TaskFn::boxed(|ctx: TaskContext| async move {
            ctx.set_title(format!("chatty #{}", ctx.id()));
            ctx.progress(1, 2);
            ctx.echo("halfway");
            ctx.progress(2, 2);
            ctx.set_note("done");
            Ok::<_, TaskError>(())
        })
    }))
    .build()
    .unwrap();
    let mut rx = engine.bus().subscribe();

    engine.start();
    sleep(ms(5)).await;
    engine.pause();
    sleep(ms(5)).await;

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let progress = events.iter().filter(|e| e.channel() == Channel::Progress).count();
    assert_eq!(progress, 2);
    assert!(events.iter().any(|e| e.text() == Some("halfway")));

    let done = &engine.results(1)[0];
    assert_eq!(done.task.title, format!("chatty #{}", done.task.id));
    assert_eq!(done.task.note, "done");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_reports_stuck_tasks() {
    let mut cfg = config("stuck");
    cfg.max_concurrent = 2;
    let engine = Engine::builder(KindFn::arc(cfg, || sleeper(Duration::from_secs(60))))
        .build()
        .unwrap();

    engine.start();
    sleep(ms(50)).await;

    let err = engine.shutdown(ms(100)).await.unwrap_err();
    match err {
        RuntimeError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, ms(100));
            assert_eq!(stuck.len(), 2);
            assert!(stuck.iter().all(|t| t.starts_with("stuck ")));
        }
        other => panic!("unexpected {other:?}"),
    }

    // shut down for good
    engine.start();
    assert!(!engine.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_in_flight() {
    let engine = Engine::builder(KindFn::arc(config("drain"), || sleeper(ms(300))))
        .build()
        .unwrap();

    engine.start();
    sleep(ms(50)).await;
    let before = engine.stats();
    assert!(before.alive > 0);

    engine.shutdown(Duration::from_secs(1)).await.unwrap();
    let after = engine.stats();
    assert_eq!(after.alive, 0);
    assert_eq!(after.ok, before.total);
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let res = Engine::builder(KindFn::arc(EngineConfig::named(""), || sleeper(ms(1)))).build();
    assert!(matches!(res, Err(RuntimeError::InvalidConfig(_))));

    let mut cfg = EngineConfig::named("ok");
    cfg.check_interval = Duration::ZERO;
    let res = Engine::builder(KindFn::arc(EngineConfig::named("kind"), || sleeper(ms(1))))
        .with_config(cfg)
        .build();
    assert!(res.is_err());
}

#[tokio::test]
async fn test_explicit_config_replaces_kind_config() {
    let mut kind_cfg = EngineConfig::named("from_kind");
    kind_cfg.max_concurrent = 3;
    let engine = Engine::builder(KindFn::arc(kind_cfg, || sleeper(ms(1))))
        .with_config(EngineConfig::named("explicit"))
        .build()
        .unwrap();

    assert_eq!(engine.config().name, "explicit");
    assert_eq!(engine.max_concurrent(), 16);
}
