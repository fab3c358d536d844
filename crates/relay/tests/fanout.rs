use std::net::SocketAddr;
use std::time::Duration;

use arcana_relay::{Relay, RelayConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl Peer {
    async fn connect(addr: SocketAddr) -> Self {
        let (read, write) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(read).lines(),
            write,
        }
    }

    async fn send(&mut self, line: &str) {
        self.write.write_all(line.as_bytes()).await.unwrap();
        self.write.write_all(b"\n").await.unwrap();
    }

    async fn next(&mut self) -> Option<String> {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("relay answered in time")
            .unwrap()
    }
}

async fn start(config: RelayConfig) -> SocketAddr {
    let relay = Relay::bind(config).await.unwrap();
    let addr = relay.local_addr();
    tokio::spawn(relay.run());
    addr
}

#[tokio::test]
async fn every_client_sees_one_order() {
    let addr = start(RelayConfig::new("127.0.0.1:0")).await;
    let mut ana = Peer::connect(addr).await;
    assert_eq!(ana.next().await.as_deref(), Some("S|1|welcome|$"));
    let mut bo = Peer::connect(addr).await;
    assert_eq!(bo.next().await.as_deref(), Some("S|2|welcome|$"));

    for round in 0..10 {
        ana.send(&format!("C|0|next_round|{round}$")).await;
        bo.send(&format!("C|2|vote_next_round|seat#1#seat1;{round}$")).await;
    }

    let mut seen_by_ana = Vec::new();
    let mut seen_by_bo = Vec::new();
    for _ in 0..20 {
        seen_by_ana.push(ana.next().await.unwrap());
        seen_by_bo.push(bo.next().await.unwrap());
    }
    assert_eq!(seen_by_ana, seen_by_bo);
    assert_eq!(
        seen_by_ana.iter().filter(|line| line.starts_with("C|1|")).count(),
        10
    );
    assert!(seen_by_ana.contains(&"C|1|next_round|9$".to_string()));
}

#[tokio::test]
async fn server_lines_from_clients_are_dropped() {
    let addr = start(RelayConfig::new("127.0.0.1:0")).await;
    let mut ana = Peer::connect(addr).await;
    ana.next().await;

    ana.send("S|1|left|$").await;
    ana.send("garbage").await;
    ana.send("C|1|game_start|$").await;
    assert_eq!(ana.next().await.as_deref(), Some("C|1|game_start|$"));
}

#[tokio::test]
async fn closing_a_connection_is_announced() {
    let addr = start(RelayConfig::new("127.0.0.1:0")).await;
    let mut ana = Peer::connect(addr).await;
    ana.next().await;
    let mut bo = Peer::connect(addr).await;
    bo.next().await;

    drop(bo);
    assert_eq!(ana.next().await.as_deref(), Some("S|2|left|$"));
}

#[tokio::test]
async fn connections_past_the_limit_are_closed() {
    let mut config = RelayConfig::new("127.0.0.1:0");
    config.max_clients = 1;
    let addr = start(config).await;
    let mut ana = Peer::connect(addr).await;
    ana.next().await;

    let mut bo = Peer::connect(addr).await;
    assert_eq!(bo.next().await, None);
}
