pub mod forked_node;
