pub mod astronomer_log;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod coords;
pub mod merge;
pub mod night;
pub mod obs_sequence;
pub mod paths;
pub mod products;
pub mod resolve;
pub mod util;
