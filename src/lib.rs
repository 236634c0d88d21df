pub mod config;
pub mod csv_feed;
pub mod form;
pub mod http_client;
pub mod logging;
pub mod low_score;
pub mod markets;
pub mod matches;
pub mod odds;
pub mod result_matrix;
pub mod server;
