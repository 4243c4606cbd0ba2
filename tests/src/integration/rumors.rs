//! # Rumor Scenarios
//!
//! - a client rumor crosses a line of four nodes
//! - a private message follows routes learned from route rumors
//! - a node joining later catches up through anti-entropy

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rm_01_peer_routing::PeerRoutingApi;
    use shared_bus::FrontendUpdate;
    use shared_types::{GossipPacket, PrivateMessage, RumorMessage};

    use tracing_test::traced_test;

    use crate::harness::{eventually, Mesh};

    const WAIT: Duration = Duration::from_secs(10);

    fn no_mining(mesh_names: &[&str]) -> Mesh {
        Mesh::line_with(mesh_names, |_, config| config.chain.mining = false)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[traced_test]
    async fn test_rumor_crosses_the_line() {
        let mesh = no_mining(&["A", "B", "C", "D"]);
        mesh.node(0)
            .client()
            .dispatch(GossipPacket::Rumor(RumorMessage::new("", 0, "hello mesh")))
            .unwrap();
        assert!(logs_contain("CLIENT MESSAGE hello mesh"));

        let last = &mesh.node(3).container;
        assert!(
            eventually(WAIT, || last
                .rumors
                .rumors_from("A")
                .iter()
                .any(|r| r.text == "hello mesh"))
            .await,
            "rumor never reached D"
        );
        assert!(mesh.node(3).frontend.snapshot().iter().any(|update| matches!(
            update,
            FrontendUpdate::Rumor { origin, text, .. } if origin == "A" && text == "hello mesh"
        )));
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_private_message_follows_routes() {
        let mesh = no_mining(&["A", "B", "C", "D"]);
        let first = &mesh.node(0).container;
        assert!(eventually(WAIT, || first.network.target("D").is_some()).await);
        // D is two hops away, reached through B
        assert_eq!(first.network.target("D"), Some(mesh.node(1).addr));

        mesh.node(0)
            .client()
            .dispatch(GossipPacket::Private(PrivateMessage {
                origin: String::new(),
                id: 0,
                text: "for D only".into(),
                destination: "D".into(),
                hop_limit: 0,
            }))
            .unwrap();

        let last = &mesh.node(3).container;
        assert!(
            eventually(WAIT, || last
                .rumors
                .private_messages_from("A")
                .iter()
                .any(|m| m.text == "for D only"))
            .await
        );
        // relays do not keep it
        assert!(mesh.node(1).container.rumors.private_messages_from("A").is_empty());
        mesh.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_late_node_catches_up_by_anti_entropy() {
        let mut mesh = no_mining(&["A", "B"]);
        for text in ["one", "two", "three"] {
            mesh.node(0)
                .client()
                .dispatch(GossipPacket::Rumor(RumorMessage::new("", 0, text)))
                .unwrap();
        }
        let b = &mesh.node(1).container;
        assert!(eventually(WAIT, || b.rumors.rumors_from("A").iter().any(|r| r.text == "three")).await);

        let late = mesh.add_node("C", &[1], |config| config.chain.mining = false);
        let c = mesh.node(late).container.clone();
        assert!(
            eventually(WAIT, || {
                let texts: Vec<String> = c.rumors.rumors_from("A").into_iter().map(|r| r.text).collect();
                ["one", "two", "three"].iter().all(|t| texts.iter().any(|x| x == t))
            })
            .await
        );
        // B heard from C and added it as a neighbor
        assert!(mesh.node(1).container.network.peers().contains(&mesh.node(late).addr));
        mesh.shutdown().await;
    }
}
