//! # Chain Scenarios
//!
//! - a claim is mined by another node and adopted everywhere
//! - a subscriber downloads what a followed artist publishes
//! - a node joining later fetches the whole chain from its neighbor
//! - partitioned miners fork, then converge on the longest chain

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rm_01_peer_routing::PeerRoutingApi;
    use shared_crypto::testing::fixture_keypair;
    use shared_types::{DataRequest, FileRecord, GossipPacket, ZERO_HASH};

    use tracing_test::traced_test;

    use crate::harness::{eventually, Mesh, TestNode};

    const WAIT: Duration = Duration::from_secs(20);

    fn share(node: &TestNode, name: &str, data: &[u8]) {
        node.store.put_shared(name, data.to_vec());
        node.client()
            .dispatch(GossipPacket::DataRequest(DataRequest {
                origin: name.into(),
                destination: String::new(),
                hop_limit: 0,
                hash_value: ZERO_HASH,
            }))
            .unwrap();
    }

    fn claims(node: &TestNode) -> Vec<FileRecord> {
        node.container
            .chain
            .chain()
            .active_transactions()
            .into_iter()
            .map(|tx| tx.file)
            .collect()
    }

    fn claimed(node: &TestNode, name: &str) -> bool {
        claims(node).iter().any(|file| file.name == name)
    }

    fn same_head(mesh: &Mesh) -> bool {
        let heads: Vec<_> = mesh.nodes().iter().map(|n| n.container.chain.head_hash()).collect();
        heads[0].is_some() && heads.iter().all(|h| *h == heads[0])
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[traced_test]
    async fn test_claim_mined_by_neighbor_reaches_everyone() {
        // only B mines
        let mesh = Mesh::line_with(&["A", "B", "C"], |i, config| config.chain.mining = i == 1);
        share(mesh.node(0), "poem.txt", b"roses are red");
        assert!(logs_contain("INDEXED file poem.txt"));

        assert!(eventually(WAIT, || mesh.nodes().iter().all(|n| claimed(n, "poem.txt"))).await);
        assert!(eventually(WAIT, || same_head(&mesh)).await);
        assert_eq!(mesh.node(2).chain_length(), 1);

        // the name is now taken for everyone else
        share(mesh.node(2), "poem.txt", b"violets are blue");
        assert!(logs_contain("claim on poem.txt not published"));
        tokio::time::sleep(Duration::from_millis(500)).await;
        let owners: Vec<_> = claims(mesh.node(1))
            .into_iter()
            .filter(|file| file.name == "poem.txt")
            .collect();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].size, 13);
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subscriber_fetches_published_file() {
        let artist_key = fixture_keypair(2).public_key_der().to_vec();
        let mesh = Mesh::line_with(&["A", "B", "C"], |i, config| {
            config.chain.mining = i == 1;
            if i == 0 {
                config.chain.subscriptions = vec![("C".into(), artist_key.clone())];
            }
        });
        let a = mesh.node(0);
        assert!(eventually(WAIT, || a.container.network.target("C").is_some()).await);

        let album: Vec<u8> = (0..12_000u32).map(|i| (i % 251) as u8).collect();
        share(mesh.node(2), "album.flac", &album);

        assert!(eventually(WAIT, || a.store.download("album.flac").as_deref() == Some(&album[..])).await);
        // B follows nobody
        assert!(mesh.node(1).store.download("album.flac").is_none());
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_late_joiner_fetches_chain() {
        let mut mesh = Mesh::line_with(&["A", "B"], |i, config| config.chain.mining = i == 1);
        share(mesh.node(0), "one.txt", b"1");
        assert!(eventually(WAIT, || mesh.node(1).chain_length() >= 1).await);
        share(mesh.node(0), "two.txt", b"22");
        assert!(eventually(WAIT, || mesh.node(1).chain_length() >= 2).await);
        share(mesh.node(0), "three.txt", b"333");
        assert!(eventually(WAIT, || mesh.node(1).chain_length() >= 3).await);

        let late = mesh.add_node("C", &[1], |config| config.chain.mining = false);
        let expected = mesh.node(1).chain_length();
        assert!(eventually(WAIT, || mesh.node(late).chain_length() == expected).await);
        assert_eq!(
            mesh.node(late).container.chain.head_hash(),
            mesh.node(1).container.chain.head_hash()
        );
        for name in ["one.txt", "two.txt", "three.txt"] {
            assert!(claimed(mesh.node(late), name));
        }
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partitioned_miners_converge() {
        let mesh = Mesh::line(&["A", "B"]);
        mesh.cut(0, 1);

        share(mesh.node(0), "a1.txt", b"from a");
        share(mesh.node(1), "b1.txt", b"from b");
        assert!(eventually(WAIT, || mesh.node(0).chain_length() == 1).await);
        assert!(eventually(WAIT, || mesh.node(1).chain_length() == 1).await);
        share(mesh.node(0), "a2.txt", b"more from a");
        assert!(eventually(WAIT, || mesh.node(0).chain_length() == 2).await);
        assert_ne!(
            mesh.node(0).container.chain.head_hash(),
            mesh.node(1).container.chain.head_hash()
        );

        mesh.heal();
        // the next block carries A's longer branch across
        share(mesh.node(0), "a3.txt", b"after the heal");

        assert!(eventually(WAIT, || same_head(&mesh)).await, "heads never converged");
        // B's rewound claim is mined again on the winning branch
        assert!(
            eventually(WAIT, || mesh.nodes().iter().all(|n| claimed(n, "b1.txt")) && same_head(&mesh))
                .await
        );
        for name in ["a1.txt", "a2.txt", "a3.txt"] {
            assert!(claimed(mesh.node(1), name));
        }
        mesh.shutdown().await;
    }
}
