use std::collections::HashMap;
use std::sync::RwLock;

/// Thread-safe trie keyed by `/`-separated paths with MQTT-style wildcards.
///
/// - `+` matches exactly one level (`classes/+` matches `classes/list`)
/// - `#` matches zero or more trailing levels and must be the last segment
///
/// Used for request routing, change subscriptions and cache invalidation.
pub struct Trie<T> {
    root: RwLock<Node<T>>,
}

struct Node<T> {
    children: HashMap<String, Node<T>>,
    single: Option<Box<Node<T>>>,
    multi: Vec<T>,
    values: Vec<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            single: None,
            multi: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone> Trie<T> {
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Node::default()),
        }
    }

    /// Store `value` under `pattern`.
    pub fn insert(&self, pattern: &str, value: T) {
        let mut root = self.root.write().unwrap();
        let mut node = &mut *root;
        for seg in segments(pattern) {
            match seg {
                "#" => {
                    node.multi.push(value);
                    return;
                }
                "+" => node = node.single.get_or_insert_with(Box::default).as_mut(),
                exact => node = node.children.entry(exact.to_string()).or_default(),
            }
        }
        node.values.push(value);
    }

    /// All values whose pattern matches the concrete `topic`.
    pub fn match_topic(&self, topic: &str) -> Vec<T> {
        let root = self.root.read().unwrap();
        let segs: Vec<&str> = segments(topic).collect();
        let mut out = Vec::new();
        root.collect(&segs, &mut out);
        out
    }

    /// Drop values under the exact `pattern` for which `predicate` holds.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove<F>(&self, pattern: &str, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let mut root = self.root.write().unwrap();
        let mut node = &mut *root;
        for seg in segments(pattern) {
            let next = match seg {
                "#" => return retain_not(&mut node.multi, &predicate),
                "+" => node.single.as_deref_mut(),
                exact => node.children.get_mut(exact),
            };
            match next {
                Some(n) => node = n,
                None => return false,
            }
        }
        retain_not(&mut node.values, &predicate)
    }

    /// Whether anything was inserted under the exact `pattern`.
    pub fn has_pattern(&self, pattern: &str) -> bool {
        let root = self.root.read().unwrap();
        let mut node = &*root;
        for seg in segments(pattern) {
            let next = match seg {
                "#" => return !node.multi.is_empty(),
                "+" => node.single.as_deref(),
                exact => node.children.get(exact),
            };
            match next {
                Some(n) => node = n,
                None => return false,
            }
        }
        !node.values.is_empty()
    }
}

impl<T: Clone> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Node<T> {
    fn collect(&self, topic: &[&str], out: &mut Vec<T>) {
        // `#` also covers the parent level itself (`classes/#` ~ `classes`).
        out.extend(self.multi.iter().cloned());
        let Some((first, rest)) = topic.split_first() else {
            out.extend(self.values.iter().cloned());
            return;
        };
        if let Some(child) = self.children.get(*first) {
            child.collect(rest, out);
        }
        if let Some(single) = &self.single {
            single.collect(rest, out);
        }
    }
}

fn retain_not<T, F: Fn(&T) -> bool>(values: &mut Vec<T>, predicate: &F) -> bool {
    let before = values.len();
    values.retain(|v| !predicate(v));
    values.len() < before
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Check a single pattern against a concrete path without building a trie.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pat = segments(pattern);
    let mut top = segments(path);
    loop {
        match (pat.next(), top.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(p), Some(t)) if p == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_paths() {
        let trie = Trie::new();
        trie.insert("classes/list", 1);
        trie.insert("classes/form", 2);

        assert_eq!(trie.match_topic("classes/list"), vec![1]);
        assert_eq!(trie.match_topic("classes/form"), vec![2]);
        assert!(trie.match_topic("classes").is_empty());
        assert!(trie.match_topic("classes/list/extra").is_empty());
    }

    #[test]
    fn single_level_wildcard() {
        let trie = Trie::new();
        trie.insert("+/list", 1);

        assert_eq!(trie.match_topic("sections/list"), vec![1]);
        assert_eq!(trie.match_topic("notices/list"), vec![1]);
        assert!(trie.match_topic("notices/form").is_empty());
        assert!(trie.match_topic("a/b/list").is_empty());
    }

    #[test]
    fn multi_level_wildcard_includes_parent() {
        let trie = Trie::new();
        trie.insert("students/#", 7);

        assert_eq!(trie.match_topic("students"), vec![7]);
        assert_eq!(trie.match_topic("students/upload/confirm"), vec![7]);
        assert!(trie.match_topic("classes/list").is_empty());
    }

    #[test]
    fn root_wildcard_matches_everything() {
        let trie = Trie::new();
        trie.insert("#", 0);
        trie.insert("app/notifications", 1);

        let mut got = trie.match_topic("app/notifications");
        got.sort();
        assert_eq!(got, vec![0, 1]);
        assert_eq!(trie.match_topic("anything/else"), vec![0]);
    }

    #[test]
    fn remove_by_predicate() {
        let trie = Trie::new();
        trie.insert("classes/+", 1);
        trie.insert("classes/+", 2);

        assert!(trie.remove("classes/+", |v| *v == 1));
        assert_eq!(trie.match_topic("classes/list"), vec![2]);
        assert!(!trie.remove("classes/+", |v| *v == 1));
        assert!(!trie.remove("sections/+", |_| true));
    }

    #[test]
    fn has_pattern_is_exact() {
        let trie = Trie::new();
        trie.insert("auth/+", ());
        trie.insert("students/#", ());

        assert!(trie.has_pattern("auth/+"));
        assert!(!trie.has_pattern("auth/permissions"));
        assert!(trie.has_pattern("students/#"));
        assert!(!trie.has_pattern("students"));
    }

    #[test]
    fn free_pattern_matching() {
        assert!(pattern_matches("classes/list", "classes/list"));
        assert!(pattern_matches("+/list", "subjects/list"));
        assert!(pattern_matches("classes/#", "classes/subjects"));
        assert!(pattern_matches("classes/#", "classes"));
        assert!(pattern_matches("#", "a/b/c"));
        assert!(!pattern_matches("classes/list", "classes/form"));
        assert!(!pattern_matches("+/list", "list"));
        assert!(!pattern_matches("classes", "classes/list"));
    }
}
