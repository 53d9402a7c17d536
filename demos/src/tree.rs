use std::thread;

use concurrent_bst::{BuildConfig, NodeId, NodePool, Origin, OwnershipTag, Tree};

#[test]
fn single_threaded() {
    let tree: Tree = Tree::build_sequential(NodePool::from_keys([50, 30, 70, 20, 40])).unwrap();
    let keys: Vec<i64> = tree.iter().map(|(_, node)| node.key()).collect();
    assert_eq!(keys, [20, 30, 40, 50, 70]);
    assert_eq!(tree.height(), 3);
    assert!(tree.validate().is_ok());
}

#[test]
fn multi_threaded() {
    let workload_size = 256;
    let keys = std::iter::once(0).chain((1..workload_size).flat_map(|i| [i, -i]));
    let tree: Tree = Tree::new(NodePool::from_keys(keys)).unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            for id in tree.pool().ids().skip(1).step_by(2) {
                tree.insert(id);
            }
        });
        s.spawn(|| {
            for id in tree.pool().ids().skip(2).step_by(2) {
                tree.insert_from(id, Origin::Device);
            }
        });
    });

    assert!(tree.validate().is_ok());
    assert!(tree
        .iter()
        .map(|(_, node)| node.key())
        .eq(-workload_size + 1..workload_size));
    assert_eq!(tree[NodeId::new(1)].ownership_tag(), OwnershipTag::HostOnly);
}

#[test]
fn with_builder() {
    let pool: NodePool = NodePool::with_random_keys(4096, 7);
    let config = BuildConfig::with_host_agents(2).device_agents(2);
    let tree = Tree::build_concurrent(pool, config).unwrap();
    assert_eq!(tree.len(), 4096);
    assert!(tree.validate().is_ok());
}
