use realtime_dispatch::{
    PostgresChangeEvent, PostgresChangesFilter, RealtimeConfig, RealtimeSession, Subscription,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Reads SUPABASE_* variables, loading .env if present
    let config = RealtimeConfig::from_env();
    println!("📡 Connecting to: {}\n", config.websocket_url()?);

    let session = RealtimeSession::builder(config)
        .subscribe(Subscription::broadcast("chat", "chat-room", |event, payload| {
            println!("💬 [{}] {}", event, String::from_utf8_lossy(payload));
            Ok(())
        }))
        .subscribe(Subscription::presence("lobby", "lobby", |event, payload| {
            println!("👥 [{}] {}", event, String::from_utf8_lossy(payload));
            Ok(())
        }))
        .subscribe(Subscription::postgres_changes(
            "users",
            PostgresChangesFilter::table("public", "users").event(PostgresChangeEvent::Insert),
            |event, payload| {
                let change: serde_json::Value = serde_json::from_slice(payload)?;
                println!("🗄️  [{}] {}", event, change["data"]["record"]);
                Ok(())
            },
        ))
        .build()?;

    session.start().await?;
    println!("✅ Listening, press Ctrl+C to stop\n");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        result = session.wait() => result?,
    }

    println!("Disconnecting...");
    session.stop().await?;
    println!("Disconnected!");

    Ok(())
}
