use futures::future::FutureExt;
use futures::StreamExt;
use std::future::ready;
use std::time::Duration;
use typed_actors::{
    actor_stream, mailbox, receive, receive_message, same, setup, stopped, stopped_with,
    try_setup_tracing, ActorContext, ActorError, ActorRef, ActorSystem, AskError, Behavior,
    SystemConfig,
};

// --- Helpers ---

fn init_tracing() {
    // Another test may have installed the subscriber already.
    let _ = try_setup_tracing();
}

/// Polls `check` until it holds or two seconds have passed.
async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

// --- Test Actors ---

struct Ping {
    reply_to: ActorRef<&'static str>,
}

fn ponger() -> Behavior<Ping> {
    receive_message(|Ping { reply_to }: Ping| {
        reply_to.tell("pong").ok();
        ready(same())
    })
}

enum Collect {
    Item(u32),
    Report(ActorRef<Vec<u32>>),
}

fn collector(seen: Vec<u32>) -> Behavior<Collect> {
    receive_message(move |msg: Collect| {
        let next = match msg {
            Collect::Item(n) => {
                let mut seen = seen.clone();
                seen.push(n);
                collector(seen)
            }
            Collect::Report(reply_to) => {
                reply_to.tell(seen.clone()).ok();
                same()
            }
        };
        ready(next)
    })
}

enum Switch {
    Toggle,
    Query(ActorRef<&'static str>),
}

fn switched(state: &'static str) -> Behavior<Switch> {
    receive_message(move |msg: Switch| {
        let next = match msg {
            Switch::Toggle if state == "off" => switched("on"),
            Switch::Toggle => switched("off"),
            Switch::Query(reply_to) => {
                reply_to.tell(state).ok();
                same()
            }
        };
        ready(next)
    })
}

/// Never answers, but keeps every reply reference so that asks can only time out.
enum Silent {
    Hold(ActorRef<u32>),
}

fn silent(parked: Vec<ActorRef<u32>>) -> Behavior<Silent> {
    receive_message(move |Silent::Hold(reply_to): Silent| {
        let mut parked = parked.clone();
        parked.push(reply_to);
        ready(silent(parked))
    })
}

enum Adder {
    Add(u32, u32, ActorRef<u32>),
}

fn adder() -> Behavior<Adder> {
    receive_message(|Adder::Add(a, b, reply_to): Adder| {
        reply_to.tell(a + b).ok();
        ready(same())
    })
}

enum AskerMsg {
    Run(ActorRef<Result<u32, AskError>>),
    Answered(Result<u32, AskError>, ActorRef<Result<u32, AskError>>),
    Ping(ActorRef<&'static str>),
}

const SHORT_ASK: Duration = Duration::from_millis(50);

/// Asks `target` from inside an actor and reports the adapted outcome.
fn asker<Req: Send + 'static>(
    target: ActorRef<Req>,
    request: fn(ActorRef<u32>) -> Req,
    timeout: Duration,
) -> Behavior<AskerMsg> {
    receive(move |ctx: ActorContext<AskerMsg>, msg: AskerMsg| {
        match msg {
            AskerMsg::Run(report_to) => {
                ctx.ask(&target, timeout, request, move |outcome| {
                    AskerMsg::Answered(outcome, report_to)
                });
            }
            AskerMsg::Answered(outcome, report_to) => {
                report_to.tell(outcome).ok();
            }
            AskerMsg::Ping(reply_to) => {
                reply_to.tell("alive").ok();
            }
        }
        ready(same())
    })
}

type Sighting = (String, ActorRef<u32>);

/// Spawns `depth` nested children; every level reports its path and reference to `probe`.
/// A `0` stops the receiving level.
fn chain(depth: usize, probe: ActorRef<Sighting>) -> Behavior<u32> {
    setup(move |ctx: ActorContext<u32>| {
        probe.tell((ctx.path(), ctx.self_ref().clone())).ok();
        if depth > 0 {
            ctx.spawn(chain(depth - 1, probe.clone()), format!("level-{depth}"));
        }
        ready(receive_message(|cmd: u32| {
            ready(if cmd == 0 { stopped() } else { same() })
        }))
    })
}

async fn sightings(inbox: &mut typed_actors::Mailbox<Sighting>, n: usize) -> Vec<Sighting> {
    let mut seen = Vec::with_capacity(n);
    for _ in 0..n {
        let sighting = tokio::time::timeout(Duration::from_secs(1), inbox.recv())
            .await
            .expect("actor did not report in time")
            .expect("probe closed");
        seen.push(sighting);
    }
    seen
}

// --- Messaging ---

#[tokio::test]
async fn test_ping_gets_exactly_one_pong() {
    init_tracing();
    let (system, ponger_ref) = ActorSystem::new(ponger(), "ponger");
    let (mut inbox, probe) = mailbox::<&'static str>("probe");

    ponger_ref.tell(Ping { reply_to: probe }).unwrap();

    assert_eq!(inbox.recv().await, Some("pong"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(inbox.try_recv(), None);

    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_messages_from_one_sender_keep_their_order() {
    init_tracing();
    let (system, collector_ref) = ActorSystem::new(collector(Vec::new()), "collector");

    for n in 0..100 {
        collector_ref.tell(Collect::Item(n)).unwrap();
    }
    let seen = system.ask(Collect::Report).await.unwrap();

    assert_eq!(seen, (0..100).collect::<Vec<_>>());
    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_returned_behavior_handles_the_next_message() {
    init_tracing();
    let (system, switch) = ActorSystem::new(switched("off"), "switch");

    assert_eq!(system.ask(Switch::Query).await, Ok("off"));
    switch.tell(Switch::Toggle).unwrap();
    assert_eq!(system.ask(Switch::Query).await, Ok("on"));
    // `same()` from a query keeps the switched behavior.
    assert_eq!(system.ask(Switch::Query).await, Ok("on"));
    switch.tell(Switch::Toggle).unwrap();
    assert_eq!(system.ask(Switch::Query).await, Ok("off"));

    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_narrowed_reference_reaches_the_same_actor() {
    init_tracing();

    enum Wide {
        Text(String),
        Report(ActorRef<Vec<String>>),
    }
    impl From<String> for Wide {
        fn from(text: String) -> Self {
            Wide::Text(text)
        }
    }
    fn wide(log: Vec<String>) -> Behavior<Wide> {
        receive_message(move |msg: Wide| {
            let next = match msg {
                Wide::Text(text) => {
                    let mut log = log.clone();
                    log.push(text);
                    wide(log)
                }
                Wide::Report(reply_to) => {
                    reply_to.tell(log.clone()).ok();
                    same()
                }
            };
            ready(next)
        })
    }

    let (system, wide_ref) = ActorSystem::new(wide(Vec::new()), "wide");
    let text_ref: ActorRef<String> = wide_ref.narrow();

    assert_eq!(text_ref.mailbox_id(), wide_ref.mailbox_id());
    assert_eq!(text_ref.name(), "wide");
    text_ref.tell("narrow".to_string()).unwrap();

    assert_eq!(system.ask(Wide::Report).await, Ok(vec!["narrow".to_string()]));
    system.terminate().await.unwrap();
    assert!(text_ref.is_closed());
}

// --- Ask ---

#[tokio::test]
async fn test_ask_from_an_actor_pipes_the_reply_back() {
    init_tracing();
    let (adder_system, adder_ref) = ActorSystem::new(adder(), "adder");
    let (system, _) = ActorSystem::new(asker(adder_ref, |r| Adder::Add(2, 3, r), SHORT_ASK), "asker");

    assert_eq!(system.ask(AskerMsg::Run).await, Ok(Ok(5)));

    system.terminate().await.unwrap();
    adder_system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_ask_timeout_does_not_stop_the_asker() {
    init_tracing();
    let (silent_system, silent_ref) = ActorSystem::new(silent(Vec::new()), "silent");
    let (system, asker_ref) = ActorSystem::new(asker(silent_ref, Silent::Hold, SHORT_ASK), "asker");

    let outcome = system.ask(AskerMsg::Run).await.unwrap();
    assert_eq!(outcome, Err(AskError::Timeout(SHORT_ASK)));
    assert!(outcome.unwrap_err().is_timeout());

    assert_eq!(system.ask(AskerMsg::Ping).await, Ok("alive"));
    assert!(!asker_ref.is_closed());

    system.terminate().await.unwrap();
    silent_system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_ask_to_a_stopped_actor_is_reported_to_the_asker() {
    init_tracing();
    let (adder_system, adder_ref) = ActorSystem::new(adder(), "adder");
    adder_system.terminate().await.unwrap();

    let (system, _) = ActorSystem::new(
        asker(adder_ref, |r| Adder::Add(1, 1, r), SHORT_ASK),
        "asker",
    );
    assert_eq!(
        system.ask(AskerMsg::Run).await,
        Ok(Err(AskError::TargetStopped("adder".to_string())))
    );
    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_pending_ask_does_not_delay_stopping_the_asker() {
    init_tracing();
    let (silent_system, silent_ref) = ActorSystem::new(silent(Vec::new()), "silent");
    let (system, asker_ref) = ActorSystem::new(
        asker(silent_ref, Silent::Hold, Duration::from_secs(30)),
        "asker",
    );
    let (mut outcomes, report_to) = mailbox::<Result<u32, AskError>>("outcomes");

    asker_ref.tell(AskerMsg::Run(report_to)).unwrap();
    // Handled after `Run`, so the ask is in flight from here on.
    assert_eq!(system.ask(AskerMsg::Ping).await, Ok("alive"));

    let started = tokio::time::Instant::now();
    tokio::time::timeout(Duration::from_secs(2), system.terminate())
        .await
        .expect("terminate waited for the pending ask")
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(system.live_actors(), 0);

    // The ask was dropped: no outcome is ever delivered.
    let outcome = tokio::time::timeout(Duration::from_secs(1), outcomes.recv())
        .await
        .expect("outcome mailbox still held open");
    assert!(outcome.is_none());

    silent_system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_system_ask_uses_the_configured_timeout() {
    init_tracing();
    let config = SystemConfig::new("patient").with_ask_timeout(Duration::from_millis(30));
    let (system, _) = ActorSystem::with_config(silent(Vec::new()), config);

    assert_eq!(system.name(), "patient");
    assert_eq!(
        system.ask(Silent::Hold).await,
        Err(AskError::Timeout(Duration::from_millis(30)))
    );
    system.terminate().await.unwrap();
}

// --- Lifecycle ---

#[tokio::test]
async fn test_stopped_actor_rejects_further_messages() {
    init_tracing();
    let one_shot = receive_message(|_: u32| ready(stopped()));
    let (system, one_shot_ref) = ActorSystem::new(one_shot, "one-shot");

    one_shot_ref.tell(1).unwrap();
    system.when_terminated().await.unwrap();

    assert!(one_shot_ref.is_closed());
    assert_eq!(
        one_shot_ref.tell(2),
        Err(ActorError::MailboxClosed("one-shot".to_string()))
    );
    assert_eq!(system.live_actors(), 0);
}

#[tokio::test]
async fn test_stopping_an_actor_stops_its_whole_subtree() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let (system, root) = ActorSystem::new(chain(2, probe), "root");

    let seen = sightings(&mut inbox, 3).await;
    let paths: Vec<&str> = seen.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(paths, vec!["root", "root/level-2", "root/level-2/level-1"]);
    assert_eq!(system.live_actors(), 3);

    root.tell(0).unwrap();
    system.when_terminated().await.unwrap();

    assert!(seen.iter().all(|(_, actor)| actor.is_closed()));
    assert_eq!(system.live_actors(), 0);
}

#[tokio::test]
async fn test_stopping_a_child_leaves_the_parent_running() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let (system, root) = ActorSystem::new(chain(2, probe), "root");

    let seen = sightings(&mut inbox, 3).await;
    let (_, middle) = &seen[1];
    let (_, leaf) = &seen[2];
    middle.tell(0).unwrap();

    assert!(eventually(|| leaf.is_closed() && middle.is_closed()).await);
    assert!(eventually(|| system.live_actors() == 1).await);
    assert!(!root.is_closed());

    system.terminate().await.unwrap();
    assert!(root.is_closed());
}

#[tokio::test]
async fn test_terminate_stops_every_actor() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let (system, _) = ActorSystem::new(chain(3, probe), "root");
    let seen = sightings(&mut inbox, 4).await;

    system.terminate().await.unwrap();

    assert!(seen.iter().all(|(_, actor)| actor.is_closed()));
    assert_eq!(system.live_actors(), 0);
    // Terminating twice is harmless.
    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_abandoned_wait_does_not_cut_terminate_short() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let (system, _) = ActorSystem::new(chain(2, probe), "root");
    let seen = sightings(&mut inbox, 3).await;

    // Nothing stops the guardian, so this wait is given up.
    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), system.when_terminated()).await;
    assert!(abandoned.is_err());
    assert_eq!(system.live_actors(), 3);

    system.terminate().await.unwrap();

    assert!(seen.iter().all(|(_, actor)| actor.is_closed()));
    assert_eq!(system.live_actors(), 0);
    assert_eq!(system.when_terminated().await, Ok(()));
}

#[tokio::test]
async fn test_anonymous_children_get_generated_names() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<String>("probe");
    let parent = setup(move |ctx: ActorContext<u32>| {
        let child = setup(move |ctx: ActorContext<u32>| {
            probe.tell(ctx.path()).ok();
            ready(receive_message(|_: u32| ready(same())))
        });
        ctx.spawn_anonymous(child);
        ready(receive_message(|_: u32| ready(same())))
    });
    let (system, _) = ActorSystem::new(parent, "parent");

    let path = inbox.recv().await.unwrap();
    assert!(path.starts_with("parent/$actor-"), "{path}");
    system.terminate().await.unwrap();
}

#[tokio::test]
async fn test_finalizer_runs_when_the_actor_stops() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<&'static str>("probe");
    let closing = receive_message(move |_: u32| {
        let probe = probe.clone();
        ready(stopped_with(move |_ctx: ActorContext<u32>| {
            probe.tell("cleaned up").ok();
            ready(())
        }))
    });
    let (system, closing_ref) = ActorSystem::new(closing, "closing");

    closing_ref.tell(1).unwrap();
    system.when_terminated().await.unwrap();

    assert_eq!(inbox.recv().await, Some("cleaned up"));
    assert!(closing_ref.is_closed());
}

#[tokio::test]
async fn test_finalizer_cannot_revive_the_actor() {
    init_tracing();
    let reviving = receive_message(|_: u32| {
        ready(Behavior::StoppedWithEffect(Box::new(|_ctx: ActorContext<u32>| {
            async { receive_message(|_: u32| ready(same())) }.boxed()
        })))
    });
    let (system, reviving_ref) = ActorSystem::new(reviving, "reviving");

    reviving_ref.tell(1).unwrap();
    tokio::time::timeout(Duration::from_secs(1), system.when_terminated())
        .await
        .expect("actor kept running after its finalizer")
        .unwrap();
    assert!(reviving_ref.is_closed());
}

#[tokio::test]
async fn test_panicking_actor_cancels_its_children() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let fragile = setup(move |ctx: ActorContext<u32>| {
        ctx.spawn(chain(0, probe), "child");
        ready(receive_message(|n: u32| {
            if n > 0 {
                panic!("boom");
            }
            ready(same())
        }))
    });
    let (system, fragile_ref) = ActorSystem::new(fragile, "fragile");
    let seen = sightings(&mut inbox, 1).await;

    fragile_ref.tell(1).unwrap();

    assert_eq!(
        system.when_terminated().await,
        Err(ActorError::Failed {
            actor: "fragile".to_string(),
            reason: "boom".to_string(),
        })
    );
    let (_, child) = &seen[0];
    assert!(eventually(|| child.is_closed()).await);
    assert!(eventually(|| system.live_actors() == 0).await);
}

#[tokio::test]
async fn test_child_failure_stops_its_ancestors_and_the_system() {
    init_tracing();
    let (mut inbox, probe) = mailbox::<Sighting>("probe");
    let fragile_child = setup(move |ctx: ActorContext<u32>| {
        probe.tell((ctx.path(), ctx.self_ref().clone())).ok();
        ready(receive_message(|n: u32| {
            if n > 0 {
                panic!("child boom");
            }
            ready(same())
        }))
    });
    let middle = setup(move |ctx: ActorContext<u32>| {
        ctx.spawn(fragile_child, "fragile");
        ready(receive_message(|_: u32| ready(same())))
    });
    let root = setup(move |ctx: ActorContext<u32>| {
        ctx.spawn(middle, "middle");
        ready(receive_message(|_: u32| ready(same())))
    });
    let (system, root_ref) = ActorSystem::new(root, "root");
    let seen = sightings(&mut inbox, 1).await;
    let (path, fragile) = &seen[0];
    assert_eq!(path, "root/middle/fragile");

    fragile.tell(1).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(1), system.when_terminated())
        .await
        .expect("failure did not reach the system");
    assert_eq!(
        outcome,
        Err(ActorError::Failed {
            actor: "fragile".to_string(),
            reason: "child boom".to_string(),
        })
    );
    assert!(fragile.is_closed());
    assert!(root_ref.is_closed());
    assert_eq!(system.live_actors(), 0);
}

#[tokio::test]
async fn test_setup_returning_same_fails_the_actor() {
    init_tracing();
    let confused = setup(|_ctx: ActorContext<u32>| ready(same()));
    let (system, confused_ref) = ActorSystem::new(confused, "confused");

    match system.when_terminated().await {
        Err(ActorError::Failed { actor, reason }) => {
            assert_eq!(actor, "confused");
            assert!(reason.contains("same()"), "{reason}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert!(confused_ref.is_closed());
}

#[tokio::test]
async fn test_same_as_initial_behavior_fails_the_actor() {
    init_tracing();
    let (system, _) = ActorSystem::new(same::<u32>(), "lazy");

    match system.when_terminated().await {
        Err(ActorError::Failed { actor, reason }) => {
            assert_eq!(actor, "lazy");
            assert!(reason.contains("same()"), "{reason}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(system.live_actors(), 0);
}

// --- Stream Bridge ---

#[tokio::test]
async fn test_stream_yields_replies_then_ends() {
    init_tracing();
    let guardian = receive(|ctx: ActorContext<ActorRef<u32>>, sink: ActorRef<u32>| {
        let worker = setup(move |_ctx: ActorContext<()>| {
            for n in 1..=3 {
                sink.tell(n).ok();
            }
            ready(stopped())
        });
        ctx.spawn(worker, "worker");
        ready(same())
    });

    let stream = actor_stream(guardian, |sink| sink).unwrap();
    let system = stream.system().clone();

    let numbers: Vec<u32> = tokio::time::timeout(Duration::from_secs(1), stream.collect())
        .await
        .expect("stream did not end");
    assert_eq!(numbers, vec![1, 2, 3]);

    system.terminate().await.unwrap();
}

enum Feed {
    Attach(ActorRef<u32>),
    Tick(ActorRef<bool>),
}

fn feed(sink: Option<ActorRef<u32>>) -> Behavior<Feed> {
    receive_message(move |msg: Feed| {
        let next = match msg {
            Feed::Attach(sink) => feed(Some(sink)),
            Feed::Tick(reply_to) => {
                let delivered = sink.as_ref().is_some_and(|sink| sink.tell(7).is_ok());
                reply_to.tell(delivered).ok();
                same()
            }
        };
        ready(next)
    })
}

#[tokio::test]
async fn test_dropping_the_stream_closes_the_reply_mailbox() {
    init_tracing();
    let mut stream = actor_stream(feed(None), Feed::Attach).unwrap();
    let system = stream.system().clone();

    assert_eq!(system.ask(Feed::Tick).await, Ok(true));
    assert_eq!(stream.next().await, Some(7));

    drop(stream);
    assert_eq!(system.ask(Feed::Tick).await, Ok(false));

    system.terminate().await.unwrap();
}
