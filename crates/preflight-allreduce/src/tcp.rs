use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::collective::Collective;

/// How long a non-root rank keeps retrying the master before giving up.
/// Launchers start ranks in arbitrary order, so the listener may come up
/// after the first connection attempts.
const CONNECT_ATTEMPTS: u32 = 120;
const CONNECT_RETRY: Duration = Duration::from_millis(500);

const SYNC_TOKEN: u8 = 0x5A;

#[derive(Debug)]
enum Role {
    /// Rank 0: holds one stream per peer, sorted by rank.
    Root { peers: Vec<(u32, TcpStream)> },
    Member { root: TcpStream },
}

/// Baseline TCP transport behind the `Collective` seam: rank 0 listens on
/// the launcher's master address, every other rank connects to it, and an
/// all-reduce is a reduce-to-root followed by a broadcast. This is a
/// stand-in for an accelerator-native backend, not a performance path.
#[derive(Debug)]
pub struct TcpCollective {
    rank: u32,
    world_size: u32,
    role: Role,
}

impl TcpCollective {
    pub async fn connect(
        master_addr: &str,
        master_port: u16,
        rank: u32,
        world_size: u32,
    ) -> Result<Self> {
        if world_size == 0 {
            bail!("world size must be at least 1");
        }
        if rank >= world_size {
            bail!("rank {rank} out of range for world size {world_size}");
        }

        let role = if rank == 0 {
            let listener = TcpListener::bind(("0.0.0.0", master_port))
                .await
                .with_context(|| format!("failed to bind rendezvous port {master_port}"))?;
            tracing::info!(port = master_port, world_size, "waiting for peers");

            let mut peers: Vec<(u32, TcpStream)> = Vec::with_capacity(world_size as usize - 1);
            while peers.len() + 1 < world_size as usize {
                let (mut stream, addr) = listener.accept().await?;
                stream.set_nodelay(true)?;
                let peer_rank = stream.read_u32().await?;
                if peer_rank == 0 || peer_rank >= world_size {
                    bail!("peer at {addr} announced invalid rank {peer_rank}");
                }
                if peers.iter().any(|(r, _)| *r == peer_rank) {
                    bail!("peer at {addr} announced duplicate rank {peer_rank}");
                }
                tracing::debug!(peer_rank, %addr, "peer joined");
                peers.push((peer_rank, stream));
            }
            peers.sort_by_key(|(r, _)| *r);
            Role::Root { peers }
        } else {
            let target = format!("{master_addr}:{master_port}");
            let mut stream = connect_with_retry(&target).await?;
            stream.set_nodelay(true)?;
            stream.write_u32(rank).await?;
            Role::Member { root: stream }
        };

        tracing::info!(rank, world_size, "collective group established");
        Ok(Self {
            rank,
            world_size,
            role,
        })
    }
}

async fn connect_with_retry(target: &str) -> Result<TcpStream> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        match TcpStream::connect(target).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!(error = %e, attempt, target, "master not reachable yet");
                tokio::time::sleep(CONNECT_RETRY).await;
            }
        }
    }
    bail!("could not reach master at {target} after {CONNECT_ATTEMPTS} attempts")
}

fn to_bytes(buf: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buf.len() * 4);
    for v in buf {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn add_from_bytes(acc: &mut [f32], bytes: &[u8]) {
    for (slot, chunk) in acc.iter_mut().zip(bytes.chunks_exact(4)) {
        *slot += f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

fn copy_from_bytes(dst: &mut [f32], bytes: &[u8]) {
    for (slot, chunk) in dst.iter_mut().zip(bytes.chunks_exact(4)) {
        *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}

#[async_trait]
impl Collective for TcpCollective {
    async fn all_reduce(&mut self, buf: &mut [f32]) -> Result<()> {
        match &mut self.role {
            Role::Root { peers } => {
                let mut scratch = vec![0u8; buf.len() * 4];
                for (peer_rank, stream) in peers.iter_mut() {
                    stream
                        .read_exact(&mut scratch)
                        .await
                        .with_context(|| format!("reduce read from rank {peer_rank}"))?;
                    add_from_bytes(buf, &scratch);
                }
                let combined = to_bytes(buf);
                for (peer_rank, stream) in peers.iter_mut() {
                    stream
                        .write_all(&combined)
                        .await
                        .with_context(|| format!("broadcast write to rank {peer_rank}"))?;
                }
            }
            Role::Member { root } => {
                let local = to_bytes(buf);
                root.write_all(&local).await.context("reduce write to root")?;
                let mut scratch = vec![0u8; buf.len() * 4];
                root.read_exact(&mut scratch)
                    .await
                    .context("broadcast read from root")?;
                copy_from_bytes(buf, &scratch);
            }
        }
        Ok(())
    }

    async fn synchronize(&mut self) -> Result<()> {
        match &mut self.role {
            Role::Root { peers } => {
                for (_, stream) in peers.iter_mut() {
                    let token = stream.read_u8().await?;
                    if token != SYNC_TOKEN {
                        bail!("unexpected barrier token {token:#x}");
                    }
                }
                for (_, stream) in peers.iter_mut() {
                    stream.write_u8(SYNC_TOKEN).await?;
                }
            }
            Role::Member { root } => {
                root.write_u8(SYNC_TOKEN).await?;
                let token = root.read_u8().await?;
                if token != SYNC_TOKEN {
                    bail!("unexpected barrier token {token:#x}");
                }
            }
        }
        Ok(())
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    async fn reduce_as(rank: u32, world_size: u32, port: u16, data: Vec<f32>) -> Vec<f32> {
        let mut c = TcpCollective::connect("127.0.0.1", port, rank, world_size)
            .await
            .unwrap();
        let mut buf = data;
        c.all_reduce(&mut buf).await.unwrap();
        c.synchronize().await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_all_reduce_sums_across_three_ranks() {
        let port = free_port();
        let (a, b, c) = tokio::join!(
            reduce_as(0, 3, port, vec![1.0, 2.0]),
            reduce_as(1, 3, port, vec![10.0, 20.0]),
            reduce_as(2, 3, port, vec![100.0, 200.0]),
        );
        assert_eq!(a, vec![111.0, 222.0]);
        assert_eq!(b, a);
        assert_eq!(c, a);
    }

    #[tokio::test]
    async fn test_repeated_all_reduce_keeps_ranks_in_step() {
        let port = free_port();

        async fn run(rank: u32, port: u16) -> Vec<f32> {
            let mut c = TcpCollective::connect("127.0.0.1", port, rank, 2).await.unwrap();
            let mut buf = vec![1.0f32; 8];
            for _ in 0..3 {
                c.all_reduce(&mut buf).await.unwrap();
            }
            c.synchronize().await.unwrap();
            buf
        }

        let (a, b) = tokio::join!(run(0, port), run(1, port));
        // 1 -> 2 -> 4 -> 8 after three doublings
        assert_eq!(a, vec![8.0f32; 8]);
        assert_eq!(b, a);
    }

    #[tokio::test]
    async fn test_single_rank_group_is_a_no_op() {
        let port = free_port();
        let mut c = TcpCollective::connect("127.0.0.1", port, 0, 1).await.unwrap();
        let mut buf = vec![3.0, 4.0];
        c.all_reduce(&mut buf).await.unwrap();
        c.synchronize().await.unwrap();
        assert_eq!(buf, vec![3.0, 4.0]);
    }

    #[tokio::test]
    async fn test_rank_out_of_range_is_rejected() {
        let err = TcpCollective::connect("127.0.0.1", free_port(), 5, 2)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_byte_round_trip() {
        let src = vec![0.5f32, -1.25, 3.0];
        let bytes = to_bytes(&src);
        let mut dst = vec![0.0f32; 3];
        copy_from_bytes(&mut dst, &bytes);
        assert_eq!(dst, src);

        let mut acc = vec![1.0f32, 1.0, 1.0];
        add_from_bytes(&mut acc, &bytes);
        assert_eq!(acc, vec![1.5, -0.25, 4.0]);
    }
}
