//! Traversal.
//!
//! Traversals only read the tree. Nothing here locks it, and the borrow
//! checker keeps a `&Tree` or `Arc<Tree>` from being edited while a
//! traversal holds it.

use std::{future::Future, sync::mpsc::SyncSender, sync::Arc};

use tokio::{
    sync::{mpsc, Semaphore},
    task::{JoinError, JoinSet},
};
use tracing::{debug, trace};

use crate::{NodeId, NodeRef, Tree};

/// Pre-order, left-to-right walk of a subtree that follows links instead
/// of recursing.
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    tree: &'a Tree,
    top: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.after(current);
        Some(current)
    }
}

impl Preorder<'_> {
    fn after(&self, id: NodeId) -> Option<NodeId> {
        if let Some(first) = self.tree.links(id).first {
            return Some(first);
        }
        let mut cursor = id;
        loop {
            if cursor == self.top {
                return None;
            }
            let links = self.tree.links(cursor);
            if let Some(right) = links.right {
                return Some(right);
            }
            cursor = links.up?;
        }
    }
}

/// Owned handle to a node of a shared tree, given to asynchronous actions.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    tree: Arc<Tree>,
    id: NodeId,
}

impl NodeHandle {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub fn node(&self) -> NodeRef<'_> {
        self.tree.node(self.id)
    }
}

impl Tree {
    pub fn preorder(&self, from: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            top: from,
            next: Some(from),
        }
    }

    /// Calls `action` on `from` and then on every node beneath it, each
    /// node before its children and siblings left to right.
    ///
    /// With `results`, each return value is sent before moving on, which
    /// blocks until the receiver takes it on a zero-capacity channel. If the
    /// receiver hangs up, the remaining values are dropped.
    pub fn visit<A, R>(&self, from: NodeId, mut action: A, results: Option<&SyncSender<R>>)
    where
        A: FnMut(NodeRef<'_>) -> R,
    {
        let mut results = results;
        for id in self.preorder(from) {
            let value = action(self.node(id));
            if let Some(sender) = results {
                if sender.send(value).is_err() {
                    debug!("visit results receiver dropped");
                    results = None;
                }
            }
        }
    }

    /// All nodes of the subtree at `from`, in the order [`Tree::visit`]
    /// reaches them.
    pub fn flatten(&self, from: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        self.visit(from, |node| nodes.push(node.id()), None);
        nodes
    }

    /// Runs `action` on every node of the subtree at `from` as tokio tasks,
    /// with at most `limit` running at once.
    ///
    /// Tasks start in [`Tree::visit`] order but may finish in any order.
    /// With `results`, each task sends its value as it finishes, and the
    /// channel closes once every task is done and the last sender drops.
    /// A panicking action resumes its panic here.
    ///
    /// # Panics
    ///
    /// If `limit` is less than 2.
    #[tracing::instrument(skip_all, fields(from = %from, limit = limit))]
    pub async fn visit_async<A, Fut, R>(
        self: &Arc<Self>,
        from: NodeId,
        action: A,
        limit: usize,
        results: Option<mpsc::Sender<R>>,
    ) where
        A: Fn(NodeHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        assert!(limit >= 2, "limit must be 2 or more");

        let nodes = self.flatten(from);
        debug!(nodes = nodes.len(), "visiting");

        let action = Arc::new(action);
        let slots = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();

        for id in nodes {
            let permit = Arc::clone(&slots)
                .acquire_owned()
                .await
                .expect("visit semaphore is never closed");
            while let Some(joined) = tasks.try_join_next() {
                resume_panic(joined);
            }

            let action = Arc::clone(&action);
            let handle = NodeHandle {
                tree: Arc::clone(self),
                id,
            };
            let results = results.clone();
            trace!(node = %id, "launch");
            tasks.spawn(async move {
                let value = action(handle).await;
                if let Some(results) = results {
                    if results.send(value).await.is_err() {
                        trace!(node = %id, "visit results receiver dropped");
                    }
                }
                drop(permit);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            resume_panic(joined);
        }
        drop(results);
        debug!("visited");
    }
}

fn resume_panic(joined: Result<(), JoinError>) {
    if let Err(error) = joined {
        if error.is_panic() {
            std::panic::resume_unwind(error.into_panic());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            mpsc::sync_channel,
        },
        thread,
        time::Duration,
    };

    use super::*;
    use crate::Seed;

    /// root(A, B(C, D(E)), F)
    fn sample() -> Tree {
        let mut tree = Tree::with_types(["root", "word"]);
        let root = tree.root();
        tree.new_under(root, Seed::typed(2).value("A")).unwrap();
        let b = tree.new_under(root, Seed::typed(1)).unwrap();
        tree.new_under(root, Seed::typed(2).value("F")).unwrap();
        let c = tree.new_under(b, Seed::typed(2).value("C")).unwrap();
        let d = tree.new_right(c, Seed::typed(1)).unwrap();
        tree.new_under(d, Seed::typed(2).value("E")).unwrap();
        tree
    }

    fn wide(count: usize) -> Tree {
        let mut tree = Tree::with_types(["root", "word"]);
        let mut parent = tree.root();
        for index in 1..count {
            let node = tree
                .new_under(parent, Seed::typed(2).value(index.to_string()))
                .unwrap();
            if index % 10 == 0 {
                parent = node;
            }
        }
        tree
    }

    #[test]
    fn visit_is_preorder() {
        let tree = sample();
        let mut seen = Vec::new();
        tree.visit(tree.root(), |node| seen.push(node.value().to_owned()), None);
        assert_eq!(seen, vec!["", "A", "", "C", "", "E", "F"]);
    }

    #[test]
    fn visit_subtree_stops_at_top() {
        let tree = sample();
        let b = tree.flatten(tree.root())[2];
        let types: Vec<_> = tree.preorder(b).map(|id| tree.node(id).type_code()).collect();
        assert_eq!(types, vec![1, 2, 1, 2]);
    }

    #[test]
    fn visit_sends_results_in_order() {
        let tree = Arc::new(sample());
        let (sender, receiver) = sync_channel(0);
        let visiting = Arc::clone(&tree);
        let worker = thread::spawn(move || {
            let root = visiting.root();
            visiting.visit(root, |node| node.type_code(), Some(&sender));
        });
        let codes: Vec<_> = receiver.iter().collect();
        worker.join().unwrap();
        assert_eq!(codes, vec![1, 2, 1, 2, 1, 2, 2]);
    }

    #[test]
    fn visit_survives_dropped_receiver() {
        let tree = sample();
        let (sender, receiver) = sync_channel(1);
        drop(receiver);
        let mut calls = 0;
        tree.visit(tree.root(), |_| calls += 1, Some(&sender));
        assert_eq!(calls, 7);
    }

    #[test]
    fn flatten_matches_manual_order() {
        // wide() allocates ids in pre-order.
        let tree = wide(25);
        let indexes: Vec<_> = tree
            .flatten(tree.root())
            .into_iter()
            .map(|id| id.index())
            .collect();
        assert_eq!(indexes, (0..25).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn visit_async_delivers_every_result() {
        let tree = Arc::new(wide(100));
        let (sender, mut receiver) = mpsc::channel(1);
        let collector = tokio::spawn(async move {
            let mut count = 0;
            while receiver.recv().await.is_some() {
                count += 1;
            }
            count
        });
        tree.visit_async(tree.root(), |_| async {}, 2, Some(sender))
            .await;
        assert_eq!(collector.await.unwrap(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn visit_async_respects_limit() {
        let tree = Arc::new(wide(60));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (sender, mut receiver) = mpsc::channel(64);
        let action = {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            move |handle: NodeHandle| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    handle.node().value().to_owned()
                }
            }
        };
        tree.visit_async(tree.root(), action, 3, Some(sender)).await;

        let mut values = Vec::new();
        while let Some(value) = receiver.recv().await {
            values.push(value);
        }
        values.sort();
        let mut expected: Vec<_> = tree
            .flatten(tree.root())
            .into_iter()
            .map(|id| tree.node(id).value().to_owned())
            .collect();
        expected.sort();
        assert_eq!(values, expected);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn visit_async_without_results() {
        let tree = Arc::new(sample());
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        tree.visit_async(
            tree.root(),
            move |_| {
                let counted = Arc::clone(&counted);
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                }
            },
            2,
            None::<mpsc::Sender<()>>,
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    #[should_panic(expected = "limit must be 2 or more")]
    async fn visit_async_limit_one_panics() {
        let tree = Arc::new(sample());
        tree.visit_async(tree.root(), |_| async {}, 1, None::<mpsc::Sender<()>>)
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[should_panic(expected = "boom")]
    async fn visit_async_resumes_action_panics() {
        let tree = Arc::new(sample());
        tree.visit_async(
            tree.root(),
            |handle: NodeHandle| async move {
                if handle.node().value() == "E" {
                    panic!("boom");
                }
            },
            2,
            None::<mpsc::Sender<()>>,
        )
        .await;
    }
}
