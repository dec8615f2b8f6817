#[cfg(test)]
mod test_network_store {
    use beliefnet::network::{InferenceConfig, InferenceMode, NetDocument};
    use beliefnet::scenarios::{grass_wetness, scenario_by_name, SCENARIO_NAMES};
    use beliefnet::{Event, NetworkStore};
    use std::path::Path;

    fn demo_path() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/grass_wetness.json")
    }

    #[test]
    fn test_demo_document_matches_scenario() {
        let loaded = NetDocument::load(demo_path()).unwrap().into_net().unwrap();
        let built = grass_wetness::build().unwrap();

        assert_eq!(loaded.title(), built.title());
        assert_eq!(loaded.len(), built.len());
        for (_, node) in built.nodes() {
            let twin = loaded.node_by_name(node.name()).unwrap();
            assert_eq!(twin.states(), node.states());
            assert_eq!(twin.probabilities(), node.probabilities());
            let parents: Vec<&str> = twin.parents().iter().map(|id| loaded.node(*id).name()).collect();
            let expected: Vec<&str> = node.parents().iter().map(|id| built.node(*id).name()).collect();
            assert_eq!(parents, expected);
        }
        assert_eq!(loaded.evidence().as_str(), "Rain = T, Sprinkler = F");
    }

    #[test]
    fn test_stored_networks_answer_like_the_built_ones() {
        let store = NetworkStore::new_in_memory().unwrap();
        for name in SCENARIO_NAMES {
            let mut net = scenario_by_name(name).unwrap();
            net.set_config(InferenceConfig::default().with_seed(17));
            store.save_net(&net).unwrap();

            let stored = store.load_net(net.title()).unwrap().unwrap();
            for (_, node) in net.nodes() {
                assert_eq!(
                    stored.query_node(node.name()).unwrap(),
                    net.query_node(node.name()).unwrap(),
                    "{} / {}",
                    name,
                    node.name()
                );
            }
        }
        assert_eq!(store.list_titles().unwrap().len(), SCENARIO_NAMES.len());
    }

    #[test]
    fn test_query_log_keeps_evidence_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nets.db");
        let store = NetworkStore::new(db_path.to_str().unwrap()).unwrap();

        let mut net = NetDocument::load(demo_path()).unwrap().into_net().unwrap();
        net.set_config(
            InferenceConfig::default()
                .with_mode(InferenceMode::LikelihoodWeighting)
                .with_seed(8),
        );
        store.save_net(&net).unwrap();

        let result = net.query_node("GrassWet").unwrap();
        store.record_query(&net, "GrassWet", &result).unwrap();

        net.set_evidence(Event::new());
        let prior = net.query_node("GrassWet").unwrap();
        store.record_query(&net, "GrassWet", &prior).unwrap();

        let logged = store.queries_for(net.title()).unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].evidence.as_str(), "Rain = T, Sprinkler = F");
        assert_eq!(logged[0].mode, InferenceMode::LikelihoodWeighting);
        assert_eq!(logged[0].result, result);
        assert!(logged[1].evidence.is_empty());
        assert_eq!(logged[1].result, prior);
    }
}
