pub mod alert_level;
pub mod donki;
pub mod fallback;
pub mod feed;
pub mod shape;
pub mod swpc;
