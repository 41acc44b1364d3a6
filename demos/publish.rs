use realtime_dispatch::{ChannelOptions, RealtimeConfig, RealtimeSession, Subscription};
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🦀 Broadcast round trip\n");

    // Subscribe to our own topic so the echo shows up; the server only
    // returns our broadcasts if `self` is enabled on the channel.
    let session = RealtimeSession::builder(RealtimeConfig::from_env())
        .subscribe(
            Subscription::broadcast("echo", "chat-room", |event, payload| {
                println!("📨 [{}] {}", event, String::from_utf8_lossy(payload));
                Ok(())
            })
            .with_options(ChannelOptions {
                broadcast_self: true,
                ..Default::default()
            }),
        )
        .build()?;

    session.start().await?;
    println!("✅ Connected!\n");

    let publisher = session.publisher();
    for n in 1..=3 {
        let message = json!({ "text": format!("hello #{}", n) });
        publisher
            .publish("chat-room", message.to_string().as_bytes())
            .await?;
        println!("📤 Sent {}", message);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    // Plain text is wrapped as {"data": "..."}
    publisher.publish("chat-room", b"plain text").await?;

    tokio::time::sleep(Duration::from_secs(2)).await;
    session.stop().await?;
    println!("\n✅ Done");

    Ok(())
}
