pub mod clients;
pub mod device;
pub mod protocol;
pub mod state;
pub mod storage;
