pub mod episodes;
pub mod poster;
pub mod search;
pub mod status_bar;
pub mod tree;
