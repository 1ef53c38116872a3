pub mod fence;
pub mod semaphore;
