//! # File Scenarios
//!
//! - a routed mono-source download across a relay
//! - an expanding search followed by a multi-source download

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rm_01_peer_routing::PeerRoutingApi;
    use rm_03_file_sharing::FileState;
    use shared_bus::FrontendUpdate;
    use shared_types::{hash_to_hex, DataRequest, GossipPacket, Hash, ZERO_HASH};

    use crate::harness::{eventually, within, Mesh, TestNode};

    const WAIT: Duration = Duration::from_secs(15);

    fn content(len: usize, seed: u8) -> Vec<u8> {
        (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
    }

    /// Put `data` in the node's shared directory and index it through the
    /// client port.
    fn share(node: &TestNode, name: &str, data: &[u8]) -> Hash {
        node.store.put_shared(name, data.to_vec());
        node.client()
            .dispatch(GossipPacket::DataRequest(DataRequest {
                origin: name.into(),
                destination: String::new(),
                hop_limit: 0,
                hash_value: ZERO_HASH,
            }))
            .unwrap();
        node.frontend
            .snapshot()
            .iter()
            .find_map(|update| match update {
                FrontendUpdate::IndexedFile { filename, metahash } if filename == name => {
                    shared_types::hash_from_hex(metahash)
                }
                _ => None,
            })
            .unwrap()
    }

    fn request(name: &str, destination: &str, hash: Hash) -> GossipPacket {
        GossipPacket::DataRequest(DataRequest {
            origin: name.into(),
            destination: destination.into(),
            hop_limit: 0,
            hash_value: hash,
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_download_through_relay() {
        let mesh = Mesh::line_with(&["A", "B", "C"], |_, config| config.chain.mining = false);
        let data = content(20_000, 7);
        let metahash = share(mesh.node(2), "song.mp3", &data);

        let a = mesh.node(0);
        assert!(eventually(WAIT, || a.container.network.target("C").is_some()).await);
        a.client().dispatch(request("copy.mp3", "C", metahash)).unwrap();

        assert!(eventually(WAIT, || a.store.download("copy.mp3").as_deref() == Some(&data[..])).await);
        assert!(eventually(WAIT, || a.container.files.file_state(&metahash)
            == Some(FileState::Reconstructed))
        .await);
        assert!(a.frontend.snapshot().iter().any(|update| matches!(
            update,
            FrontendUpdate::ReconstructedFile { filename, metahash: hex }
                if filename == "copy.mp3" && *hex == hash_to_hex(&metahash)
        )));
        // the relay only forwarded
        assert!(mesh.node(1).store.download("copy.mp3").is_none());
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_search_then_multi_source_download() {
        let mesh = Mesh::line_with(&["A", "B", "C", "D"], |_, config| config.chain.mining = false);
        let data = content(30_000, 3);
        let metahash = share(mesh.node(2), "song_live.mp3", &data);
        assert_eq!(share(mesh.node(3), "song_live.mp3", &data), metahash);
        share(mesh.node(3), "song_demo.mp3", &content(5_000, 9));

        let a = mesh.node(0);
        let search = a.container.files.search(vec!["song".into()], 0);
        let finished = within(WAIT, search).await.expect("search timed out").unwrap();
        assert!(finished);
        assert_eq!(
            a.container.files.file_state(&metahash),
            Some(FileState::CompleteMatch)
        );
        assert!(a.frontend.snapshot().iter().any(|update| matches!(
            update,
            FrontendUpdate::AvailableFile { filename, .. } if filename == "song_live.mp3"
        )));

        a.client().dispatch(request("live.mp3", "", metahash)).unwrap();
        assert!(eventually(WAIT, || a.store.download("live.mp3").as_deref() == Some(&data[..])).await);
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_download_from_unknown_peer_fails_cleanly() {
        let mesh = Mesh::line_with(&["A", "B"], |_, config| config.chain.mining = false);
        let a = mesh.node(0);
        let hash = [0x42; 32];
        a.client().dispatch(request("ghost.bin", "Nobody", hash)).unwrap();
        // no route: the download is abandoned and may be retried
        assert!(eventually(WAIT, || a.container.files.file_state(&hash).is_none()).await);
        assert!(a.client().dispatch(request("ghost.bin", "Nobody", hash)).is_ok());
        mesh.shutdown().await;
    }
}
