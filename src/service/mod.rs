pub mod archive;
pub mod feed;
pub mod newsletter;
pub mod subscriber;
pub mod topic;
