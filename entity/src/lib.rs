pub mod contract;
pub mod installment;
pub mod sessions;
