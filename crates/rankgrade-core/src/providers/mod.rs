pub mod judge;
pub mod network;
