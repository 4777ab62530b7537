pub mod order_number;
pub mod order_service;
