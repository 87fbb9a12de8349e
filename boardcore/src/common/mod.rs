pub mod at8236;
pub mod clock;
pub mod jump;
pub mod pins;
pub mod pool;
