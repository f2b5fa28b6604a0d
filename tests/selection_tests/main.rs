//! Selection tests: predicates and the selector that applies them

mod predicate_tests;
