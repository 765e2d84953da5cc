pub mod finnhub;
pub mod fmp;
pub mod http;
