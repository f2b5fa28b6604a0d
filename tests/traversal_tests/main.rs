//! Traversal tests: directory listings, lookup and file visits
