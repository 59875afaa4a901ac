pub mod arbitration;
