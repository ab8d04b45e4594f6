pub mod alert;
pub mod company;
pub mod incident;
pub mod persona;
pub mod rate_limit;
pub mod reaction;
pub mod reflection;
