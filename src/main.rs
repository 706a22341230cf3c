use aop_monitor::{
    AopMonitor, ChannelSink, Class, Emission, MonitorConfig, Object, Prototype, Receiver, Sink,
    TracingSink, Value, WatchSpec,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    tracing::info!("aop-monitor demo starting");

    // Records go to a background task; the sink itself never waits.
    let (sink, mut rx) = ChannelSink::<Value>::channel(64);
    let drain = tokio::spawn(async move {
        let out = TracingSink::new("demo");
        let mut seen = 0usize;
        while let Some(record) = rx.recv().await {
            if let Err(e) = out.send(record) {
                tracing::warn!("Failed to log record: {}", e);
            }
            seen += 1;
        }
        seen
    });

    let monitor = AopMonitor::build(sink).register_extractor("deposit_event", |recv, args| {
        Ok(Emission::One(json!({
            "event": "deposit",
            "amount": args.first().cloned().unwrap_or(Value::Null),
            "balance": recv.get("balance").cloned().unwrap_or(Value::Null),
        })))
    });

    // Watch list from a config file when one is given, inline otherwise.
    let config = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::from_json_file(path)?,
        None => MonitorConfig::from_json_str(r#"{ "watch": { "deposit": "deposit_event" } }"#)?,
    };

    let account = Class::new(
        "Account",
        Prototype::new().with_method("deposit", |recv, args| {
            let amount = args.first().and_then(Value::as_i64).unwrap_or(0);
            let balance = recv.get("balance").and_then(Value::as_i64).unwrap_or(0) + amount;
            recv.set("balance", balance);
            Ok(json!(balance))
        }),
    );
    let account = monitor.configure_from(&config).apply(account)?;

    let mut alice = account.instantiate(Receiver::new().with("balance", 10));
    let balance = alice.call("deposit", &[json!(5)])?;
    tracing::info!(%balance, "deposit returned");

    let greeter = Object::new(
        "greeter",
        Prototype::new().with_method("greet", |_, args| {
            let name = args.first().and_then(Value::as_str).unwrap_or("there");
            Ok(json!(format!("hi {}", name)))
        }),
    );
    let mut greeter = monitor
        .configure(WatchSpec::new().watch("greet", |_, args| {
            Ok(Emission::Many(
                args.iter()
                    .map(|name| json!({ "event": "greet", "name": name }))
                    .collect(),
            ))
        }))
        .apply(greeter)?;
    let greeting = greeter.call("greet", &[json!("Ann")])?;
    tracing::info!(%greeting, "greet returned");

    // Dropping the monitor and targets closes the channel.
    let stats = monitor.stats();
    drop(monitor);
    drop(account);
    drop(alice);
    drop(greeter);

    let seen = drain.await?;
    tracing::info!(seen, ?stats, "aop-monitor demo finished");
    Ok(())
}
