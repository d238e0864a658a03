/// IP归属地模块
/// IP geolocation module

pub mod routes;

pub use routes::configure_location_routes;
