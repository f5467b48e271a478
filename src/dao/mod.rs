/// Device-local key-value persistence (play counter, lock flag).
pub mod device_store;
/// Storage abstraction layer errors.
pub mod storage;
