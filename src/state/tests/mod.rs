//! Tests for the label graph across whole sessions.

mod proptest_graph_invariants;
