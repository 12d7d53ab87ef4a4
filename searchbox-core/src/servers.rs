// Server list shared by the client and node discovery

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Ordered set of server base URLs with round-robin selection.
///
/// Duplicates collapse onto their first occurrence.
#[derive(Debug, Default)]
pub struct ServerPool {
    servers: RwLock<Vec<String>>,
    cursor: AtomicUsize,
}

impl ServerPool {
    pub fn new<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: RwLock::new(dedup(servers)),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Current servers in insertion order
    pub fn snapshot(&self) -> Vec<String> {
        self.servers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.servers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.read().is_empty()
    }

    /// Next server in round-robin order, `None` when the pool is empty
    pub fn next_server(&self) -> Option<String> {
        let servers = self.servers.read();
        if servers.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % servers.len();
        Some(servers[index].clone())
    }

    /// Replace the whole server list
    pub fn replace<I, S>(&self, servers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let servers = dedup(servers);
        *self.servers.write() = servers;
        self.cursor.store(0, Ordering::Relaxed);
    }
}

fn dedup<I, S>(servers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut unique: Vec<String> = Vec::new();
    for server in servers {
        let server = server.into();
        if !unique.contains(&server) {
            unique.push(server);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse_in_insertion_order() {
        let pool = ServerPool::new(["http://b:9200", "http://a:9200", "http://b:9200"]);
        assert_eq!(pool.snapshot(), vec!["http://b:9200", "http://a:9200"]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_round_robin() {
        let pool = ServerPool::new(["http://a:9200", "http://b:9200"]);
        let picked: Vec<_> = (0..4).filter_map(|_| pool.next_server()).collect();
        assert_eq!(
            picked,
            vec!["http://a:9200", "http://b:9200", "http://a:9200", "http://b:9200"]
        );
    }

    #[test]
    fn test_empty_pool_has_no_next_server() {
        let pool = ServerPool::new(Vec::<String>::new());
        assert!(pool.is_empty());
        assert_eq!(pool.next_server(), None);
    }

    #[test]
    fn test_replace_resets_rotation() {
        let pool = ServerPool::new(["http://a:9200"]);
        pool.next_server();
        pool.replace(["http://c:9200", "http://d:9200"]);
        assert_eq!(pool.next_server().as_deref(), Some("http://c:9200"));
    }
}
