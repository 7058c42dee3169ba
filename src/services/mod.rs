pub mod alerts;
pub mod astronomy;
pub mod cache;
pub mod consensus;
pub mod dns;
pub mod forecast;
pub mod gateway;
pub mod geocoder;
pub mod outfit;
pub mod units;
pub mod uv;
pub mod wmo;
