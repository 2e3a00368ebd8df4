use anyhow::Result;
use common::testutils::RecordingDiagnostics;
use remote::{Connected, Endpoint, Listening};

#[tokio::test]
async fn test_pump_over_loopback_session() -> Result<()> {
    // Bind on an ephemeral port and learn it through the diagnostics channel
    let (recorder, listening) = RecordingDiagnostics::with_listening_channel();
    let listener = Listening::bind(&Endpoint::new("127.0.0.1", "0"), &recorder).await?;
    let port = listening.await?.port();

    let payload: Vec<u8> = (0..300_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let expected = payload.clone();

    let receiver = tokio::spawn(async move {
        let diagnostics = common::NoDiagnostics;
        let mut connected = listener.accept(&diagnostics).await?;
        let mut received = Vec::new();
        let bytes =
            remote::streams::copy_counted(connected.stream_mut(), &mut received, 4096).await?;
        connected.close(&diagnostics).await;
        anyhow::Ok((bytes, received))
    });

    let diagnostics = common::NoDiagnostics;
    let mut sender = Connected::dial(&Endpoint::new("127.0.0.1", port.to_string()), &diagnostics).await?;
    let mut source = payload.as_slice();
    let sent = remote::streams::copy_counted(&mut source, sender.stream_mut(), 1500).await?;
    let closed = sender.close(&diagnostics).await;
    assert!(closed.completed);

    let (received_bytes, received) = receiver.await??;
    assert_eq!(sent, expected.len() as u64);
    assert_eq!(received_bytes, sent);
    assert_eq!(received, expected);
    Ok(())
}

#[tokio::test]
async fn test_ipv6_loopback_when_available() -> Result<()> {
    // Not every CI host has IPv6 configured
    let listener = match Listening::bind(&Endpoint::new("::1", "0"), &common::NoDiagnostics).await {
        Ok(listener) => listener,
        Err(error) => {
            println!("skipping, IPv6 loopback unavailable: {error}");
            return Ok(());
        }
    };
    let addr = listener.local_addr();
    assert!(addr.is_ipv6());
    let accept = tokio::spawn(async move { listener.accept(&common::NoDiagnostics).await });
    let sender = Connected::dial(
        &Endpoint::new("::1", addr.port().to_string()),
        &common::NoDiagnostics,
    )
    .await?;
    sender.close(&common::NoDiagnostics).await;
    let connected = accept.await??;
    assert!(connected.peer_addr().is_ipv6());
    Ok(())
}
