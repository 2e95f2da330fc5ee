use std::net::Ipv4Addr;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

pub const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// TEST-NET-1: never routed, so connects there hang until the deadline.
pub const BLACKHOLE: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

/// A loopback listener that greets every connection with `banner`.
pub async fn banner_listener(banner: &'static [u8]) -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket.write_all(banner).await;
        }
    });
    port
}

/// A loopback port that was bound and released, so connecting to it is refused.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}
